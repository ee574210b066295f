use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Corruption detected: {0}")]
    Corruption(String),

    #[error("Illegal argument: {0}")]
    IllegalArgument(String),

    #[error("Illegal state: {0}")]
    IllegalState(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    FileNotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    InternalServerError(String),

    #[error("Not implemented: {0}")]
    NotImplemented(String),
}

impl Error {
    /// Returns a stable error code for this error variant.
    /// These codes are stable and can be used by clients for error classification.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Io(_) => "IO_ERROR",
            Error::Corruption(_) => "CORRUPTION",
            Error::IllegalArgument(_) => "ILLEGAL_ARGUMENT",
            Error::IllegalState(_) => "ILLEGAL_STATE",
            Error::Conflict(_) => "CONFLICT",
            Error::FileNotFound(_) => "FILE_NOT_FOUND",
            Error::BadRequest(_) => "BAD_REQUEST",
            Error::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
            Error::NotImplemented(_) => "NOT_IMPLEMENTED",
        }
    }

    /// Returns true if this error is potentially retryable.
    ///
    /// Storage failures are transient; caller mistakes (bad arguments, name
    /// collisions, unparseable SQL) will fail the same way every time.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Io(_) => true,
            Error::InternalServerError(_) => true,

            Error::Corruption(_) => false,
            Error::IllegalArgument(_) => false,
            Error::IllegalState(_) => false,
            Error::Conflict(_) => false,
            Error::FileNotFound(_) => false,
            Error::BadRequest(_) => false,
            Error::NotImplemented(_) => false,
        }
    }

    /// True for the "does not exist" family of failures.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::FileNotFound(_))
    }

    /// Adds context to an error by wrapping it in an InternalServerError.
    ///
    /// Used where a lower-level failure (usually a definition file write)
    /// aborts a higher-level operation.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use dxdb_core::Error;
    ///
    /// fn write_definitions() -> Result<(), Error> {
    ///     Err(Error::Io(std::io::Error::new(
    ///         std::io::ErrorKind::PermissionDenied,
    ///         "read-only filesystem"
    ///     )))
    /// }
    ///
    /// fn create_table() -> Result<(), Error> {
    ///     write_definitions().map_err(|e| e.with_context("failed to persist table 'cars'"))
    /// }
    /// ```
    pub fn with_context(self, context: &str) -> Error {
        Error::InternalServerError(format!("{}: {}", context, self))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Corruption(format!("JSON error: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_stable() {
        assert_eq!(Error::IllegalArgument("x".into()).code(), "ILLEGAL_ARGUMENT");
        assert_eq!(Error::Conflict("x".into()).code(), "CONFLICT");
        assert_eq!(Error::FileNotFound("x".into()).code(), "FILE_NOT_FOUND");
        assert_eq!(Error::BadRequest("x".into()).code(), "BAD_REQUEST");
        assert_eq!(
            Error::InternalServerError("x".into()).code(),
            "INTERNAL_SERVER_ERROR"
        );
    }

    #[test]
    fn test_with_context_wraps_as_internal() {
        let err = Error::Io(io::Error::new(io::ErrorKind::Other, "disk full"))
            .with_context("failed to persist sequences");
        assert!(matches!(err, Error::InternalServerError(_)));
        assert!(err.to_string().contains("disk full"));
        assert!(err.to_string().contains("failed to persist sequences"));
    }

    #[test]
    fn test_retryability() {
        assert!(Error::InternalServerError("x".into()).is_retryable());
        assert!(!Error::Conflict("x".into()).is_retryable());
        assert!(!Error::BadRequest("x".into()).is_retryable());
    }
}
