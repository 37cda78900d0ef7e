//! Error types for compound record operations.

use common::StorageError;

/// Error type for compound record operations.
///
/// The first group of variants are caller errors detected before the store
/// is touched; retrying them cannot succeed. Store failures arrive as
/// [`Error::Storage`] carrying the backend's error unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A full key was requested with zero fields.
    EmptyTuple,

    /// A key segment is longer than the length prefix can express.
    FieldTooLong { len: usize, max: usize },

    /// More prefix fields were supplied than the object type declares.
    PrefixLength { supplied: usize, arity: usize },

    /// No schema is registered for the object type.
    UnknownObjectType(String),

    /// A full-key operation supplied the wrong number of fields.
    ArityMismatch {
        object_type: String,
        expected: usize,
        actual: usize,
    },

    /// A schema definition is malformed or conflicts with another.
    InvalidSchema(String),

    /// Invalid input or parameter errors.
    InvalidInput(String),

    /// Encoding or decoding errors.
    Encoding(String),

    /// Errors from the underlying store, passed through unmodified.
    Storage(StorageError),

    /// Internal errors indicating bugs or invariant violations.
    Internal(String),
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Storage(err) => Some(err),
            _ => None,
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::EmptyTuple => write!(f, "Empty tuple: a key needs at least one field"),
            Error::FieldTooLong { len, max } => {
                write!(f, "Field too long: {} bytes exceeds the {} byte limit", len, max)
            }
            Error::PrefixLength { supplied, arity } => write!(
                f,
                "Invalid prefix length: {} fields supplied for a key of {} fields",
                supplied, arity
            ),
            Error::UnknownObjectType(object_type) => {
                write!(f, "Unknown object type: {}", object_type)
            }
            Error::ArityMismatch {
                object_type,
                expected,
                actual,
            } => write!(
                f,
                "Arity mismatch for {}: expected {} key fields, got {}",
                object_type, expected, actual
            ),
            Error::InvalidSchema(msg) => write!(f, "Invalid schema: {}", msg),
            Error::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            Error::Encoding(msg) => write!(f, "Encoding error: {}", msg),
            Error::Storage(err) => write!(f, "{}", err),
            Error::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl From<StorageError> for Error {
    fn from(err: StorageError) -> Self {
        Error::Storage(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Encoding(format!("json payload: {}", err))
    }
}

/// Result type alias for compound record operations.
pub type Result<T> = std::result::Result<T, Error>;
