//! Sources of indirect objects.

use crate::error::{FormatError, Result};
use crate::object::Object;
use crate::parse::{IndirectObject, Parser};
use crate::trivia::{is_digit, is_regular_character, is_white_space_character};
use rustc_hash::FxHashMap;

/// The kind of an entry in a cross-reference table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// The object number is unused.
    Free,
    /// The object is stored directly in the file.
    InUse,
    /// The object is stored inside an object stream.
    Compressed,
}

/// An entry of the cross-reference table of a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceEntry {
    /// The kind of the entry.
    pub kind: EntryKind,
    /// The generation number of the object.
    pub gen_num: i32,
}

/// Provides the objects of a document as they are stored in a file.
///
/// Objects returned by a source must not belong to any document, they are
/// bound by the document that loads them.
pub trait ObjectSource {
    /// One more than the highest object number.
    fn len(&self) -> usize;

    /// The entry of an object number.
    fn entry(&self, num: i32) -> Option<SourceEntry>;

    /// Load the object with the given number.
    fn load_object(&self, num: i32) -> Result<Object>;

    /// Load the raw data of a stream object. Returns `None` for objects that
    /// aren't streams.
    fn load_stream(&self, num: i32) -> Result<Option<Vec<u8>>>;

    /// Whether the object with the given number is a stream.
    fn is_stream(&self, num: i32) -> bool {
        self.load_stream(num).ok().flatten().is_some()
    }

    /// The size of the underlying file in bytes.
    fn file_size(&self) -> u64;

    /// The MD5 digest of the underlying file.
    fn fingerprint(&self) -> [u8; 16];
}

/// An object source that finds objects by scanning a file for
/// `N G obj` headers.
///
/// Cross-reference tables and trailers are ignored. If an object number
/// appears more than once, the last occurrence wins.
pub struct ScannedSource {
    data: Vec<u8>,
    offsets: FxHashMap<i32, (usize, i32)>,
    len: usize,
    fingerprint: [u8; 16],
    lenient: bool,
}

impl ScannedSource {
    /// Scan `data` for indirect objects.
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        let data = data.into();
        let offsets = scan(&data);
        let len = offsets.keys().max().map_or(1, |max| *max as usize + 1);
        let fingerprint = md5::compute(&data).0;

        ldebug!("found {} objects while scanning", offsets.len());

        Self {
            data,
            offsets,
            len,
            fingerprint,
            lenient: true,
        }
    }

    /// Fail on syntax errors inside objects instead of skipping the affected
    /// tokens.
    pub fn strict(mut self) -> Self {
        self.lenient = false;
        self
    }

    fn parse(&self, num: i32) -> Result<Option<IndirectObject>> {
        let Some((offset, _)) = self.offsets.get(&num) else {
            return Ok(None);
        };

        let indirect = Parser::new(&self.data[*offset..])
            .lenient(self.lenient)
            .parse_indirect()
            .map_err(|e| {
                lwarn!("failed to parse object {num}: {e}");
                FormatError::BrokenObject(num)
            })?;

        if indirect.num != num {
            lwarn!("object at offset {offset} has number {}, expected {num}", indirect.num);
            return Err(FormatError::BrokenObject(num).into());
        }

        Ok(Some(indirect))
    }
}

impl ObjectSource for ScannedSource {
    fn len(&self) -> usize {
        self.len
    }

    fn entry(&self, num: i32) -> Option<SourceEntry> {
        self.offsets.get(&num).map(|(_, gen_num)| SourceEntry {
            kind: EntryKind::InUse,
            gen_num: *gen_num,
        })
    }

    fn load_object(&self, num: i32) -> Result<Object> {
        Ok(self.parse(num)?.map(|i| i.obj).unwrap_or_default())
    }

    fn load_stream(&self, num: i32) -> Result<Option<Vec<u8>>> {
        Ok(self.parse(num)?.and_then(|i| i.stream))
    }

    fn file_size(&self) -> u64 {
        self.data.len() as u64
    }

    fn fingerprint(&self) -> [u8; 16] {
        self.fingerprint
    }
}

/// Find the offsets of all `N G obj` headers.
fn scan(data: &[u8]) -> FxHashMap<i32, (usize, i32)> {
    let mut offsets = FxHashMap::default();

    for pos in memchr::memmem::find_iter(data, b"obj") {
        if data.get(pos + 3).is_some_and(|b| is_regular_character(*b)) {
            continue;
        }

        if let Some((start, num, gen_num)) = header_before(data, pos) {
            offsets.insert(num, (start, gen_num));
        }
    }

    offsets
}

/// Walk backwards from the `obj` keyword at `pos` over the generation and
/// object numbers.
fn header_before(data: &[u8], pos: usize) -> Option<(usize, i32, i32)> {
    let mut i = pos;

    let skip_ws = |mut i: usize, at_least_one: bool| -> Option<usize> {
        let start = i;

        while i > 0 && is_white_space_character(data[i - 1]) {
            i -= 1;
        }

        (!at_least_one || i < start).then_some(i)
    };

    let digits = |mut i: usize| -> Option<(usize, i32)> {
        let end = i;

        while i > 0 && is_digit(data[i - 1]) {
            i -= 1;
        }

        let value = std::str::from_utf8(&data[i..end]).ok()?.parse().ok()?;

        Some((i, value))
    };

    i = skip_ws(i, true)?;
    let (after_gen, gen_num) = digits(i)?;
    i = skip_ws(after_gen, true)?;
    let (start, num) = digits(i)?;

    if start > 0 && is_regular_character(data[start - 1]) {
        return None;
    }

    (num > 0).then_some((start, num, gen_num))
}

#[cfg(test)]
mod tests {
    use super::*;

    const FILE: &[u8] = b"%PDF-1.7\n\
1 0 obj\n<</Type/Catalog/Pages 2 0 R>>\nendobj\n\
2 0 obj\n<</Type/Pages/Kids[]/Count 0>>\nendobj\n\
3 0 obj\n<</Length 4>>\nstream\nabcd\nendstream\nendobj\n\
2 0 obj\n<</Type/Pages/Kids[]/Count 1>>\nendobj\n\
trailer\n<</Root 1 0 R>>\n";

    #[test]
    fn scans_objects() {
        let source = ScannedSource::new(FILE);
        assert_eq!(source.len(), 4);
        assert_eq!(source.entry(1).map(|e| e.kind), Some(EntryKind::InUse));
        assert!(source.entry(4).is_none());
    }

    #[test]
    fn last_definition_wins() {
        let source = ScannedSource::new(FILE);
        let pages = source.load_object(2).unwrap();
        assert_eq!(pages.as_dict().unwrap().get_int(b"Count"), Some(1));
    }

    #[test]
    fn streams() {
        let source = ScannedSource::new(FILE);
        assert!(source.is_stream(3));
        assert!(!source.is_stream(1));
        assert_eq!(source.load_stream(3).unwrap().as_deref(), Some(&b"abcd"[..]));
    }

    #[test]
    fn fingerprint() {
        let source = ScannedSource::new(FILE);
        assert_eq!(source.fingerprint(), md5::compute(FILE).0);
        assert_eq!(source.file_size(), FILE.len() as u64);
    }

    #[test]
    fn broken_object() {
        let source = ScannedSource::new(&b"1 0 obj\n<</A (unterminated>>\nendobj\n"[..]).strict();
        assert_eq!(
            source.load_object(1),
            Err(FormatError::BrokenObject(1).into())
        );
    }
}
