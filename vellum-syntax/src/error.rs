//! Error types for object and journal operations.

use core::fmt;

/// The main error type of this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The caller passed something it shouldn't have. Usually a programming bug.
    Argument(ArgumentError),
    /// The data of the document is malformed.
    Format(FormatError),
    /// A length exceeded what can be represented or allocated.
    Limit,
}

/// Errors caused by invalid arguments or invalid API usage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgumentError {
    /// An object of the wrong kind was passed.
    WrongKind,
    /// An index was out of bounds.
    IndexOutOfBounds,
    /// A journaled document was modified outside of an operation.
    NoOperation,
    /// An object from one document was inserted into a container of another one.
    ForeignObject,
    /// Undo or redo was requested while an operation is still being built.
    OperationInProgress,
    /// There is no operation that could be undone.
    NothingToUndo,
    /// There is no operation that could be redone.
    NothingToRedo,
    /// A journal operation was requested, but journaling isn't enabled.
    NotJournaling,
    /// The object number doesn't exist in the document.
    InvalidObjectNumber,
    /// A dictionary key wasn't a name.
    KeyNotName,
}

/// Errors caused by malformed document data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatError {
    /// A cycle was detected while walking the object graph.
    Cycle,
    /// The object syntax was invalid at the given byte offset.
    Syntax {
        /// The offset of the offending byte.
        offset: usize,
    },
    /// The object with the given number couldn't be loaded.
    BrokenObject(i32),
    /// A chain of indirect references was too long.
    TooManyIndirections,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Argument(e) => write!(f, "{e}"),
            Self::Format(e) => write!(f, "{e}"),
            Self::Limit => write!(f, "length limit exceeded"),
        }
    }
}

impl fmt::Display for ArgumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WrongKind => write!(f, "object has the wrong kind"),
            Self::IndexOutOfBounds => write!(f, "index out of bounds"),
            Self::NoOperation => write!(f, "attempt to modify a journaled document outside of an operation"),
            Self::ForeignObject => write!(f, "container and item belong to different documents"),
            Self::OperationInProgress => write!(f, "an operation is still in progress"),
            Self::NothingToUndo => write!(f, "no operation to undo"),
            Self::NothingToRedo => write!(f, "no operation to redo"),
            Self::NotJournaling => write!(f, "journaling is not enabled"),
            Self::InvalidObjectNumber => write!(f, "invalid object number"),
            Self::KeyNotName => write!(f, "dictionary key is not a name"),
        }
    }
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cycle => write!(f, "cycle in object graph"),
            Self::Syntax { offset } => write!(f, "syntax error at offset {offset}"),
            Self::BrokenObject(num) => write!(f, "object {num} couldn't be loaded"),
            Self::TooManyIndirections => write!(f, "too many indirections"),
        }
    }
}

impl core::error::Error for Error {}
impl core::error::Error for ArgumentError {}
impl core::error::Error for FormatError {}

impl From<ArgumentError> for Error {
    fn from(e: ArgumentError) -> Self {
        Self::Argument(e)
    }
}

impl From<FormatError> for Error {
    fn from(e: FormatError) -> Self {
        Self::Format(e)
    }
}

impl From<std::collections::TryReserveError> for Error {
    fn from(_: std::collections::TryReserveError) -> Self {
        Self::Limit
    }
}

/// Result type for object and journal operations.
pub type Result<T> = core::result::Result<T, Error>;

macro_rules! bail {
    ($err:expr) => {
        return Err($err.into())
    };
}

pub(crate) use bail;
