use backtrace::Backtrace;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::result::Result;

use crate::common::{atomic, Atomic};

/// Error kinds for hashstash operations.
///
/// Store-level failures keep the kind the store provider assigned to them;
/// this layer never reclassifies or retries them.
///
/// # Examples
///
/// ```rust,ignore
/// use hashstash::errors::{HashStashError, ErrorKind, HashStashResult};
///
/// fn example() -> HashStashResult<()> {
///     Err(HashStashError::new("store unreachable", ErrorKind::ConnectionError))
/// }
/// ```
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ErrorKind {
    /// The store is unreachable, refused authentication, or the connection is closed
    ConnectionError,
    /// A single store command failed
    IOError,
    /// A flat map or stored value could not be decoded
    EncodingError,
    /// Input failed validation (empty separator, bad option value, ...)
    ValidationError,
    /// The operation is not valid in the current context
    InvalidOperation,
    /// A record key does not belong to the configured namespace
    InvalidKey,
    /// The search index rejected a value or query
    IndexingError,
    /// No store provider has been attached
    StoreNotInitialized,
    /// The store has already been closed
    StoreAlreadyClosed,
    /// Error reported by a store backend
    BackendError,
    /// Error raised by an external store provider.
    /// The String names the provider (e.g., "redis", "sled")
    Extension(String),
    /// Internal error (usually indicates a bug)
    InternalError,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::ConnectionError => write!(f, "Connection error"),
            ErrorKind::IOError => write!(f, "IO error"),
            ErrorKind::EncodingError => write!(f, "Encoding error"),
            ErrorKind::ValidationError => write!(f, "Validation error"),
            ErrorKind::InvalidOperation => write!(f, "Invalid operation"),
            ErrorKind::InvalidKey => write!(f, "Invalid key"),
            ErrorKind::IndexingError => write!(f, "Indexing error"),
            ErrorKind::StoreNotInitialized => write!(f, "Store not initialized"),
            ErrorKind::StoreAlreadyClosed => write!(f, "Store already closed"),
            ErrorKind::BackendError => write!(f, "Backend error"),
            ErrorKind::Extension(name) => write!(f, "{} error", name),
            ErrorKind::InternalError => write!(f, "Internal error"),
        }
    }
}

/// Error type for every fallible hashstash operation.
///
/// Carries a message, an [ErrorKind], an optional cause and the backtrace
/// captured where the error was created.
///
/// ```rust,ignore
/// use hashstash::errors::{HashStashError, ErrorKind};
///
/// let cause = HashStashError::new("broken pipe", ErrorKind::IOError);
/// let err = HashStashError::new_with_cause("HSET failed", ErrorKind::IOError, cause);
/// assert!(err.cause().is_some());
/// ```
#[derive(Clone)]
pub struct HashStashError {
    message: String,
    error_kind: ErrorKind,
    cause: Option<Box<HashStashError>>,
    backtrace: Atomic<Backtrace>,
}

impl HashStashError {
    /// Creates a new error with the given message and kind.
    pub fn new(message: &str, error_kind: ErrorKind) -> Self {
        HashStashError {
            message: message.to_string(),
            error_kind,
            cause: None,
            backtrace: atomic(Backtrace::new()),
        }
    }

    /// Creates a new error wrapping `cause`.
    pub fn new_with_cause(message: &str, error_kind: ErrorKind, cause: HashStashError) -> Self {
        HashStashError {
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

    pub fn cause(&self) -> Option<&HashStashError> {
        self.cause.as_deref()
    }
}

impl Display for HashStashError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Debug for HashStashError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // print error message with stack trace followed by cause
        match &self.cause {
            Some(cause) => write!(f, "{}\nCaused by: {:?}", self.message, cause),
            None => write!(f, "{}\n{:?}", self.message, self.backtrace.read()),
        }
    }
}

impl Error for HashStashError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.cause {
            Some(cause) => Some(cause.as_ref()),
            None => None,
        }
    }
}

/// Shorthand for `Result<T, HashStashError>`.
pub type HashStashResult<T> = Result<T, HashStashError>;

#[cfg(feature = "serde")]
impl serde::de::Error for HashStashError {
    fn custom<T: Display>(msg: T) -> Self {
        HashStashError::new(&msg.to_string(), ErrorKind::EncodingError)
    }
}

#[cfg(feature = "serde")]
impl serde::ser::Error for HashStashError {
    fn custom<T: Display>(msg: T) -> Self {
        HashStashError::new(&msg.to_string(), ErrorKind::EncodingError)
    }
}

impl From<std::io::Error> for HashStashError {
    fn from(err: std::io::Error) -> Self {
        let error_kind = match err.kind() {
            std::io::ErrorKind::ConnectionRefused
            | std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::ConnectionAborted
            | std::io::ErrorKind::NotConnected
            | std::io::ErrorKind::PermissionDenied => ErrorKind::ConnectionError,
            _ => ErrorKind::IOError,
        };
        HashStashError::new(&format!("IO error: {}", err), error_kind)
    }
}

impl From<std::num::ParseIntError> for HashStashError {
    fn from(err: std::num::ParseIntError) -> Self {
        HashStashError::new(
            &format!("Integer parsing error: {}", err),
            ErrorKind::EncodingError,
        )
    }
}

impl From<std::num::ParseFloatError> for HashStashError {
    fn from(err: std::num::ParseFloatError) -> Self {
        HashStashError::new(
            &format!("Float parsing error: {}", err),
            ErrorKind::EncodingError,
        )
    }
}

impl From<regex::Error> for HashStashError {
    fn from(err: regex::Error) -> Self {
        HashStashError::new(
            &format!("Invalid key pattern: {}", err),
            ErrorKind::ValidationError,
        )
    }
}

impl From<String> for HashStashError {
    fn from(msg: String) -> Self {
        HashStashError::new(&msg, ErrorKind::InternalError)
    }
}

impl From<&str> for HashStashError {
    fn from(msg: &str) -> Self {
        HashStashError::new(msg, ErrorKind::InternalError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_new_creates_error() {
        let error = HashStashError::new("An error occurred", ErrorKind::IOError);
        assert_eq!(error.message(), "An error occurred");
        assert_eq!(error.kind(), &ErrorKind::IOError);
        assert!(error.cause().is_none());
    }

    #[test]
    fn error_new_with_cause_keeps_cause() {
        let cause = HashStashError::new("connection reset", ErrorKind::ConnectionError);
        let error = HashStashError::new_with_cause("HGETALL failed", ErrorKind::IOError, cause);
        assert_eq!(error.kind(), &ErrorKind::IOError);
        assert_eq!(error.cause().map(|c| c.kind()), Some(&ErrorKind::ConnectionError));
        assert!(error.source().is_some());
    }

    #[test]
    fn error_display_is_message() {
        let error = HashStashError::new("An error occurred", ErrorKind::IOError);
        assert_eq!(format!("{}", error), "An error occurred");
    }

    #[test]
    fn error_debug_prints_cause_chain() {
        let cause = HashStashError::new("root", ErrorKind::BackendError);
        let error = HashStashError::new_with_cause("top", ErrorKind::IOError, cause);
        let formatted = format!("{:?}", error);
        assert!(formatted.contains("top"));
        assert!(formatted.contains("Caused by:"));
        assert!(formatted.contains("root"));
    }

    #[test]
    fn error_source_none_without_cause() {
        let error = HashStashError::new("An error occurred", ErrorKind::IOError);
        assert!(error.source().is_none());
    }

    #[test]
    fn error_kind_display() {
        assert_eq!(ErrorKind::ConnectionError.to_string(), "Connection error");
        assert_eq!(ErrorKind::EncodingError.to_string(), "Encoding error");
        assert_eq!(ErrorKind::InvalidKey.to_string(), "Invalid key");
        assert_eq!(ErrorKind::Extension("redis".to_string()).to_string(), "redis error");
    }

    #[test]
    fn from_io_error_maps_connection_failures() {
        let err: HashStashError =
            std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused").into();
        assert_eq!(err.kind(), &ErrorKind::ConnectionError);

        let err: HashStashError = std::io::Error::other("disk").into();
        assert_eq!(err.kind(), &ErrorKind::IOError);
        assert!(err.message().contains("IO error"));
    }

    #[test]
    fn from_parse_errors_are_encoding_errors() {
        let err: HashStashError = "x".parse::<i64>().unwrap_err().into();
        assert_eq!(err.kind(), &ErrorKind::EncodingError);

        let err: HashStashError = "x".parse::<f64>().unwrap_err().into();
        assert_eq!(err.kind(), &ErrorKind::EncodingError);
    }

    #[test]
    fn from_regex_error_is_validation_error() {
        let err: HashStashError = regex::Regex::new("(").unwrap_err().into();
        assert_eq!(err.kind(), &ErrorKind::ValidationError);
    }

    #[test]
    fn from_strings_are_internal_errors() {
        let err: HashStashError = "oops".into();
        assert_eq!(err.kind(), &ErrorKind::InternalError);
        let err: HashStashError = String::from("oops").into();
        assert_eq!(err.message(), "oops");
    }

    #[test]
    fn question_mark_converts() {
        fn parse() -> HashStashResult<i64> {
            let n: i64 = "12345".parse()?;
            Ok(n)
        }
        assert_eq!(parse().unwrap(), 12345);
    }
}
