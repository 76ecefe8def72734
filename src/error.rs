//! Error types for geommark library.

use std::io;
use thiserror::Error;

/// Result type alias for geommark operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while processing marker streams and layouts.
///
/// Only whole-input failures reach the caller as an `Error`. A single bad
/// record or an unresolvable group is reported as a
/// [`Diagnostic`](crate::model::Diagnostic) instead.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A whole-document JSON input could not be decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A single position record could not be parsed.
    #[error("Invalid position record: {0}")]
    InvalidRecord(String),

    /// A page dimension such as `pw`/`ph` could not be parsed.
    #[error("Invalid dimension: {0}")]
    InvalidDimension(String),

    /// A page selection string could not be parsed.
    #[error("Invalid page range: {0}")]
    InvalidPageRange(String),

    /// The input contained no usable position data.
    #[error("No position records found in {0}")]
    NoRecords(String),

    /// Error during rendering (JSON, text report).
    #[error("Rendering error: {0}")]
    Render(String),
}

impl From<tempfile::PersistError> for Error {
    fn from(err: tempfile::PersistError) -> Self {
        Error::Io(err.error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidDimension("12furlong".to_string());
        assert_eq!(err.to_string(), "Invalid dimension: 12furlong");

        let err = Error::NoRecords("doc.aux".to_string());
        assert_eq!(err.to_string(), "No position records found in doc.aux");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }
}
