//! Error types for cache operations.

use crate::backend::KeyType;
use std::fmt;

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by cache operations.
///
/// Absence is never an error: lookups that find nothing return `Ok(None)`.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// The store is unreachable or rejected a command.
    BackendError(String),

    /// Invalid configuration (bad URL, empty category, ...).
    ConfigError(String),

    /// A value of a type the cache cannot store was handed to a write.
    ///
    /// Raised before any command reaches the store.
    UnsupportedValue(String),

    /// The key holds a shape (list, set, sorted set, ...) the generic read
    /// path does not handle.
    UnhandledType(KeyType),

    /// A scalar value read from the store is not well-formed for the
    /// requested type.
    ParseError(String),

    /// A stored hash could not be turned into the requested entity.
    FieldError { field: String, message: String },
}

impl Error {
    /// Shorthand for `Error::FieldError`, also for use in `HashEntity::validate`.
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::FieldError {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "backend error: {}", msg),
            Error::ConfigError(msg) => write!(f, "configuration error: {}", msg),
            Error::UnsupportedValue(msg) => write!(f, "unsupported value type: {}", msg),
            Error::UnhandledType(kind) => write!(f, "unhandled type: {}", kind),
            Error::ParseError(msg) => write!(f, "parse error: {}", msg),
            Error::FieldError { field, message } => {
                write!(f, "cannot apply field '{}': {}", field, message)
            }
        }
    }
}

impl std::error::Error for Error {}

#[cfg(feature = "redis")]
impl From<redis::RedisError> for Error {
    fn from(e: redis::RedisError) -> Self {
        Error::BackendError(e.to_string())
    }
}
