//! Error types for the asynciter engine

use crate::runtime::Value;
use std::fmt;
use thiserror::Error;

/// Main error type for the engine
///
/// Errors double as JavaScript rejection reasons: a rejected promise stores an
/// `Error` and hands a clone to every reaction, so the type is `Clone`.
#[derive(Error, Debug, Clone, PartialEq)]
#[allow(clippy::enum_variant_names)]
pub enum Error {
    /// Engine-raised error - TypeError, RangeError, etc.
    #[error("{kind}: {message}")]
    RuntimeError { kind: ErrorKind, message: String },

    /// An arbitrary value thrown by user code
    #[error("Uncaught {}", .0.to_js_string())]
    Thrown(Value),

    /// Internal engine error (broken invariant, pending promise in `block_on`)
    #[error("InternalError: {0}")]
    InternalError(String),

    /// Configuration loading/parsing error
    #[error("ConfigError: {0}")]
    ConfigError(String),
}

/// JavaScript error kinds raised by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::enum_variant_names)]
pub enum ErrorKind {
    /// TypeError - wrong type for operation
    TypeError,
    /// RangeError - value out of range
    RangeError,
    /// Generic Error
    GenericError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::TypeError => write!(f, "TypeError"),
            ErrorKind::RangeError => write!(f, "RangeError"),
            ErrorKind::GenericError => write!(f, "Error"),
        }
    }
}

impl Error {
    /// Create a TypeError
    pub fn type_error(message: impl Into<String>) -> Self {
        Error::RuntimeError {
            kind: ErrorKind::TypeError,
            message: message.into(),
        }
    }

    /// Create a RangeError
    pub fn range_error(message: impl Into<String>) -> Self {
        Error::RuntimeError {
            kind: ErrorKind::RangeError,
            message: message.into(),
        }
    }

    /// Create a plain `Error`
    pub fn generic(message: impl Into<String>) -> Self {
        Error::RuntimeError {
            kind: ErrorKind::GenericError,
            message: message.into(),
        }
    }

    /// Wrap a thrown value
    pub fn thrown(value: impl Into<Value>) -> Self {
        Error::Thrown(value.into())
    }

    /// The JavaScript error kind, if this is an engine-raised error
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Error::RuntimeError { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Check if this is a TypeError
    pub fn is_type_error(&self) -> bool {
        self.kind() == Some(ErrorKind::TypeError)
    }

    /// Check if this is a RangeError
    pub fn is_range_error(&self) -> bool {
        self.kind() == Some(ErrorKind::RangeError)
    }
}

/// Result type alias for the engine
pub type Result<T> = std::result::Result<T, Error>;

/// Standardized error message templates
///
/// These constants provide consistent error messages following JavaScript conventions.
pub mod messages {
    pub const NOT_A_FUNCTION: &str = "is not a function";
    pub const NOT_AN_OBJECT: &str = "is not an object";
    pub const NOT_ITERABLE: &str = "is not iterable";

    pub const NAN_NOT_ALLOWED: &str = "NaN is not allowed";
    pub const NEGATIVE_INDEX: &str = "Index must not be negative";
    pub const REDUCE_EMPTY: &str = "Reduce of empty iterator with no initial value";

    /// Format a "X is not a function" error message
    pub fn not_a_function(name: &str) -> String {
        format!("'{}' {}", name, NOT_A_FUNCTION)
    }

    /// Format a "X is not an object" error message
    pub fn not_an_object(name: &str) -> String {
        format!("'{}' {}", name, NOT_AN_OBJECT)
    }

    /// Format a "X is not iterable" error message
    pub fn not_iterable(name: &str) -> String {
        format!("'{}' {}", name, NOT_ITERABLE)
    }

    /// Format the protocol error raised for a malformed iterator result
    pub fn iter_result_not_an_object(value: &str) -> String {
        format!("Iterator result {} {}", value, NOT_AN_OBJECT)
    }
}
