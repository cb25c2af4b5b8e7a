//! Storing the journal next to the file it belongs to.
//!
//! The log starts with a header that identifies the file by its size and MD5
//! digest, followed by the steps of the history:
//!
//! ```text
//! %!Vellum-Journal-1
//! journal
//! <</FileSize 1234/Fingerprint<...>/HistoryPos 1>>
//! entry
//! (Set title)
//! 3 0 obj
//! <</Title(Old)>>
//! endobj
//! 7 0 newobj
//! endjournal
//! ```
//!
//! Stream data is stored as `stream <len>`, followed by an end-of-line marker,
//! the raw bytes and `endstream`, right before the `endobj` of its object.

use super::snapshot::Snapshot;
use super::{Fragment, Journal, Operation};
use crate::document::{Binding, Document, DocumentWarning};
use crate::error::{ArgumentError, Error, FormatError, Result, bail};
use crate::object::{Dict, Object, PdfString};
use crate::parse::Parser;
use crate::write::Serializer;
use std::rc::Rc;

const MAGIC: &[u8] = b"%!Vellum-Journal-1";

const FILE_SIZE: &[u8] = b"FileSize";
const FINGERPRINT: &[u8] = b"Fingerprint";
const HISTORY_POS: &[u8] = b"HistoryPos";

impl Document {
    /// Serialize the journal.
    ///
    /// The log is only valid for a file that contains the current state of
    /// the document.
    pub fn write_journal(&self) -> Result<Vec<u8>> {
        let (file_size, fingerprint) = self.source_fingerprint();

        let journal = self.0.journal.borrow();
        let journal = journal.as_ref().ok_or(ArgumentError::NotJournaling)?;

        if !journal.pending.is_empty() {
            bail!(ArgumentError::OperationInProgress);
        }

        let header = Dict::new();
        header.put(FILE_SIZE, i64::try_from(file_size).map_err(|_| Error::Limit)?)?;
        header.put(FINGERPRINT, PdfString::new(fingerprint.to_vec()))?;
        header.put(HISTORY_POS, i64::try_from(journal.current).map_err(|_| Error::Limit)?)?;

        let mut s = Serializer::new(true, true);
        s.raw(MAGIC);
        s.raw(b"\njournal\n");
        s.write(&Object::from(header));
        s.raw(b"\n");

        for operation in &journal.history {
            s.raw(b"entry\n");

            match &operation.title {
                Some(title) => s.write(&Object::from(PdfString::from_text(title))),
                None => s.write(&Object::Null),
            }

            s.raw(b"\n");

            for fragment in &operation.fragments {
                write_fragment(&mut s, fragment);
            }
        }

        s.raw(b"endjournal\n");

        ldebug!("wrote journal with {} steps", journal.history.len());

        Ok(s.finish())
    }

    /// Replace the journal with one read from a log.
    ///
    /// Returns `false` if the log was written for a different file, in which
    /// case it is ignored. Enables journaling otherwise.
    pub fn read_journal(&self, data: &[u8]) -> Result<bool> {
        if self
            .0
            .journal
            .borrow()
            .as_ref()
            .is_some_and(|j| !j.pending.is_empty())
        {
            bail!(ArgumentError::OperationInProgress);
        }

        if !data.starts_with(MAGIC) {
            bail!(FormatError::Syntax { offset: 0 });
        }

        let mut p = Parser::new(data).lenient(false);
        p.expect_keyword(b"journal")?;

        let Object::Dict(header) = p.parse_object()? else {
            bail!(syntax_error(&p));
        };

        let (file_size, fingerprint) = self.source_fingerprint();
        let matches = header.get_int(FILE_SIZE).and_then(|s| u64::try_from(s).ok()) == Some(file_size)
            && header
                .get_string(FINGERPRINT)
                .is_some_and(|f| f.as_bytes() == fingerprint);

        if !matches {
            lwarn!("ignoring journal that was written for a different file");
            self.warn(DocumentWarning::StaleJournal);

            return Ok(false);
        }

        let binding = self.binding();
        let mut history: Vec<Operation> = vec![];

        loop {
            match p.peek_keyword() {
                b"entry" => {
                    p.expect_keyword(b"entry")?;

                    let title = match p.parse_object()? {
                        Object::String(s) => Some(s.to_text().to_string()),
                        Object::Null => None,
                        _ => bail!(syntax_error(&p)),
                    };

                    history.push(Operation {
                        title,
                        fragments: vec![],
                    });
                }
                b"endjournal" => break,
                _ => {
                    let fragment = read_fragment(&mut p, &binding)?;

                    let Some(operation) = history.last_mut() else {
                        bail!(syntax_error(&p));
                    };

                    operation.fragments.push(fragment);
                }
            }
        }

        let current = header
            .get_int(HISTORY_POS)
            .and_then(|pos| usize::try_from(pos).ok())
            .filter(|pos| *pos <= history.len())
            .ok_or(syntax_error(&p))?;

        ldebug!("read journal with {} steps at position {current}", history.len());

        *self.0.journal.borrow_mut() = Some(Journal {
            history,
            current,
            pending: vec![],
        });

        Ok(true)
    }
}

fn write_fragment(s: &mut Serializer, fragment: &Fragment) {
    let Some(obj) = fragment.recorded() else {
        s.raw(format!("{} 0 newobj\n", fragment.num).as_bytes());
        return;
    };

    s.raw(format!("{} 0 obj\n", fragment.num).as_bytes());
    s.write(&obj);
    s.raw(b"\n");

    if let Some(data) = &fragment.stream {
        s.raw(format!("stream {}\n", data.len()).as_bytes());
        s.raw(data);
        s.raw(b"\nendstream\n");
    }

    s.raw(b"endobj\n");
}

fn read_fragment(p: &mut Parser<'_>, binding: &Binding) -> Result<Fragment> {
    let num = i32::try_from(p.parse_int()?).map_err(|_| syntax_error(p))?;
    p.parse_int()?;

    if p.peek_keyword() == b"newobj" {
        p.expect_keyword(b"newobj")?;

        return Ok(Fragment {
            num,
            newobj: true,
            inactive: None,
            snapshot: Snapshot::default(),
            stream: None,
        });
    }

    p.expect_keyword(b"obj")?;
    let mut obj = p.parse_object()?;
    obj.adopt(num, binding);

    let stream = if p.peek_keyword() == b"stream" {
        p.expect_keyword(b"stream")?;
        let len = usize::try_from(p.parse_int()?).map_err(|_| syntax_error(p))?;
        let data = Rc::from(p.raw_bytes(len)?);
        p.expect_keyword(b"endstream")?;

        Some(data)
    } else {
        None
    };

    p.expect_keyword(b"endobj")?;

    Ok(Fragment {
        num,
        newobj: false,
        inactive: Some(obj),
        snapshot: Snapshot::default(),
        stream,
    })
}

fn syntax_error(p: &Parser<'_>) -> Error {
    FormatError::Syntax { offset: p.offset() }.into()
}
