use backtrace::Backtrace;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::result::Result;

use crate::common::{atomic, Atomic};

/// Error kinds for lutra operations.
///
/// Each kind describes one category of failure. The taxonomy is deliberately
/// small: absence (of a database, collection, document or index target) is
/// reported through booleans and empty results wherever the API allows it, so
/// `NotFound` only appears where a value has to be produced.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ErrorKind {
    /// The requested resource (database, collection, document, position) is absent.
    NotFound,
    /// A filter document is malformed or uses an unknown operator.
    InvalidFilter,
    /// An update document is malformed or uses an unknown operator.
    InvalidUpdate,
    /// A value has the wrong type for the attempted operation.
    TypeMismatch,
    /// An inserted document's `_id` already exists in the collection.
    DuplicateKey,
    /// Operation on a cursor that has been released.
    CursorClosed,
    /// A document id is not a valid 24-character hex string.
    InvalidId,
    /// SQL text or an aggregation pipeline failed to parse.
    ParseError,
    /// Error while building or maintaining an index.
    IndexingError,
    /// The operation is not valid in the current context.
    InvalidOperation,
    /// Internal error (usually indicates a bug).
    InternalError,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::NotFound => write!(f, "Not found"),
            ErrorKind::InvalidFilter => write!(f, "Invalid filter"),
            ErrorKind::InvalidUpdate => write!(f, "Invalid update"),
            ErrorKind::TypeMismatch => write!(f, "Type mismatch"),
            ErrorKind::DuplicateKey => write!(f, "Duplicate key"),
            ErrorKind::CursorClosed => write!(f, "Cursor closed"),
            ErrorKind::InvalidId => write!(f, "Invalid id"),
            ErrorKind::ParseError => write!(f, "Parse error"),
            ErrorKind::IndexingError => write!(f, "Indexing error"),
            ErrorKind::InvalidOperation => write!(f, "Invalid operation"),
            ErrorKind::InternalError => write!(f, "Internal error"),
        }
    }
}

/// Custom lutra error type.
///
/// `LutraError` carries the error message, its [ErrorKind], an optional cause
/// for error chaining, and a backtrace captured at construction time. The
/// backtrace lives behind [Atomic] so the error stays `Clone`.
#[derive(Clone)]
pub struct LutraError {
    message: String,
    error_kind: ErrorKind,
    cause: Option<Box<LutraError>>,
    backtrace: Atomic<Backtrace>,
}

impl LutraError {
    /// Creates a new `LutraError` with the specified message and error kind.
    pub fn new(message: &str, error_kind: ErrorKind) -> Self {
        LutraError {
            message: message.to_string(),
            error_kind,
            cause: None,
            backtrace: atomic(Backtrace::new()),
        }
    }

    /// Creates a new `LutraError` with an underlying cause attached.
    pub fn new_with_cause(message: &str, error_kind: ErrorKind, cause: LutraError) -> Self {
        LutraError {
            message: message.to_string(),
            error_kind,
            cause: Some(Box::new(cause)),
            backtrace: atomic(Backtrace::new()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.error_kind
    }

    pub fn cause(&self) -> Option<&LutraError> {
        self.cause.as_deref()
    }
}

impl Display for LutraError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Debug for LutraError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // print error message with stack trace followed by cause
        match &self.cause {
            Some(cause) => write!(f, "{}\nCaused by: {:?}", self.message, cause),
            None => write!(f, "{}\n{:?}", self.message, self.backtrace.read()),
        }
    }
}

impl Error for LutraError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.cause {
            Some(cause) => Some(cause.as_ref()),
            None => None,
        }
    }
}

/// A result type alias for lutra operations.
///
/// `LutraResult<T>` is shorthand for `Result<T, LutraError>`. All fallible
/// operations in this crate return it.
pub type LutraResult<T> = Result<T, LutraError>;

impl From<std::io::Error> for LutraError {
    fn from(err: std::io::Error) -> Self {
        LutraError::new(&format!("IO error: {}", err), ErrorKind::InternalError)
    }
}

impl From<std::num::ParseIntError> for LutraError {
    fn from(err: std::num::ParseIntError) -> Self {
        LutraError::new(
            &format!("Integer parsing error: {}", err),
            ErrorKind::TypeMismatch,
        )
    }
}

impl From<std::num::ParseFloatError> for LutraError {
    fn from(err: std::num::ParseFloatError) -> Self {
        LutraError::new(
            &format!("Float parsing error: {}", err),
            ErrorKind::TypeMismatch,
        )
    }
}

impl From<String> for LutraError {
    fn from(msg: String) -> Self {
        LutraError::new(&msg, ErrorKind::InternalError)
    }
}

impl From<&str> for LutraError {
    fn from(msg: &str) -> Self {
        LutraError::new(msg, ErrorKind::InternalError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_new() {
        let err = LutraError::new("collection missing", ErrorKind::NotFound);
        assert_eq!(err.message(), "collection missing");
        assert_eq!(err.kind(), &ErrorKind::NotFound);
        assert!(err.cause().is_none());
    }

    #[test]
    fn test_error_with_cause() {
        let cause = LutraError::new("bad operand", ErrorKind::TypeMismatch);
        let err = LutraError::new_with_cause("update failed", ErrorKind::InvalidUpdate, cause);
        assert_eq!(err.kind(), &ErrorKind::InvalidUpdate);
        assert_eq!(err.cause().unwrap().kind(), &ErrorKind::TypeMismatch);
        assert!(err.source().is_some());
    }

    #[test]
    fn test_display_is_message() {
        let err = LutraError::new("cursor closed", ErrorKind::CursorClosed);
        assert_eq!(format!("{}", err), "cursor closed");
    }

    #[test]
    fn test_from_str() {
        let err: LutraError = "oops".into();
        assert_eq!(err.kind(), &ErrorKind::InternalError);
    }
}
