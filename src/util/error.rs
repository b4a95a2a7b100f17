//! Error types for the point-cache codec.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for encode, decode and file conversion.
#[derive(Error, Debug)]
pub enum Error {
    /// Fewer bytes remain than a fixed-width read requires
    #[error("Truncated stream at offset {offset}: needed {needed} byte(s), {available} available")]
    TruncatedStream {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// An expected structural marker is absent at the cursor
    #[error("Malformed stream at offset {offset}: {message}")]
    MalformedStream { offset: usize, message: String },

    /// Header metadata missing or inconsistent, or frame data disagreeing with it
    #[error("Schema violation: {0}")]
    SchemaViolation(String),

    /// Input path has an extension the converter does not handle
    #[error("Unsupported file extension: {0}")]
    UnsupportedExtension(String),

    /// File does not exist or cannot be accessed
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Memory mapping failed
    #[error("Memory mapping failed: {0}")]
    MmapFailed(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// UTF-8 conversion error
    #[error("Invalid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// Textual form could not be parsed or rendered
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a schema violation from a message.
    pub fn schema(msg: impl Into<String>) -> Self {
        Self::SchemaViolation(msg.into())
    }

    /// Create a malformed-stream error at the given offset.
    pub fn malformed(offset: usize, msg: impl Into<String>) -> Self {
        Self::MalformedStream {
            offset,
            message: msg.into(),
        }
    }

    /// True for usage errors that skip a conversion without being fatal.
    pub fn is_usage(&self) -> bool {
        matches!(self, Self::UnsupportedExtension(_))
    }
}

/// Result type alias for codec operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = Error::TruncatedStream { offset: 12, needed: 4, available: 1 };
        let msg = e.to_string();
        assert!(msg.contains("12"));
        assert!(msg.contains("4"));

        let e = Error::malformed(7, "expected array end");
        assert!(e.to_string().contains("offset 7"));
        assert!(e.to_string().contains("array end"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_usage_errors() {
        assert!(Error::UnsupportedExtension(".txt".into()).is_usage());
        assert!(!Error::schema("missing num_points").is_usage());
    }
}
