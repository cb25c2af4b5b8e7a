/*!
An editable PDF object model with an undo/redo journal.

This crate models the objects of a PDF file as reference-counted handles that
can be shared and mutated in place. Objects are loaded lazily from an
[`ObjectSource`] and become part of a [`Document`], which resolves indirect
references, tracks which objects were altered and optionally records every
alteration in a journal, so that it can be undone and redone.

The main types are:
- [`Object`], the tagged union of all object kinds, with [`Array`] and [`Dict`]
  as its mutable containers.
- [`Document`], the table of indirect objects.
- [`ScannedSource`], an [`ObjectSource`] that finds the objects of a file by
  scanning it.

Alterations happen through shared handles, so mutating methods take `&self`.
All handles are single-threaded.

## Example
```
use vellum_syntax::{Document, Dict, names};

let doc = Document::new();
doc.enable_journal();

let page = doc.operation("Add page", || {
    let dict = Dict::new();
    dict.put(names::TYPE, names::PAGE)?;
    doc.add_object(dict)
})?;

doc.undo()?;
assert!(page.resolve().is_null());

doc.redo()?;
assert!(page.resolve().is_dict());
# Ok::<(), vellum_syntax::Error>(())
```

## Features
- `logging`: Report recoverable problems, such as skipped garbage or broken
  objects, and journal transitions via the `log` crate.
- `cycle-checks`: Assert in debug builds that no array or dictionary is
  inserted into itself, directly or through nested containers.

## Safety
This crate forbids unsafe code via a crate-level attribute.
*/

#![forbid(unsafe_code)]

#[macro_use]
mod log;

mod document;
pub mod error;
mod journal;
pub mod mark;
pub mod object;
pub mod parse;
pub(crate) mod reader;
pub mod source;
pub(crate) mod trivia;
pub mod write;
mod xref;

pub use document::{ChangeSinkFn, Document, DocumentSettings, DocumentWarning, WarningSinkFn};
pub use error::{ArgumentError, Error, FormatError, Result};
pub use journal::{FragmentInfo, OperationGuard};
pub use object::{Array, Dict, Name, ObjRef, Object, PdfString, names};
pub use source::{EntryKind, ObjectSource, ScannedSource, SourceEntry};
