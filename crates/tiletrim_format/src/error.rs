//! Error types for the container codec.

use std::io;
use thiserror::Error;

/// Result type for codec operations.
pub type FormatResult<T> = Result<T, FormatError>;

/// Errors that can occur while encoding or decoding archive structures.
#[derive(Debug, Error)]
pub enum FormatError {
    /// An I/O error occurred while (de)compressing.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input does not start with the archive magic bytes.
    #[error("not a PMTiles archive")]
    BadMagic,

    /// The archive declares a format version this codec does not speak.
    #[error("unsupported PMTiles version {0}, only v3 is supported")]
    UnsupportedVersion(u8),

    /// The input ended before a complete structure could be read.
    #[error("truncated input while reading {0}")]
    Truncated(&'static str),

    /// A directory block violates the serialized layout.
    #[error("malformed directory: {message}")]
    MalformedDirectory {
        /// Description of the violation.
        message: String,
    },

    /// The archive uses a compression codec this build cannot process.
    #[error("unsupported compression code {0}")]
    UnsupportedCompression(u8),

    /// The metadata block is not a valid JSON document.
    #[error("invalid metadata document: {0}")]
    Metadata(#[from] serde_json::Error),
}

impl FormatError {
    /// Creates a malformed directory error.
    pub fn malformed_directory(message: impl Into<String>) -> Self {
        Self::MalformedDirectory {
            message: message.into(),
        }
    }
}
