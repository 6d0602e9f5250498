//! Error types for MIME operations.

use std::path::PathBuf;

/// Result type alias for MIME operations.
pub type Result<T> = std::result::Result<T, Error>;

/// MIME error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Header is absent or has an empty value.
    #[error("mail: header missing or empty -- {0}")]
    MissingHeader(String),

    /// Address list could not be parsed.
    #[error("Invalid address list: {0}")]
    InvalidAddress(String),

    /// Content-Type value could not be parsed.
    #[error("Invalid content type: {0}")]
    InvalidContentType(String),

    /// Attachment file could not be read.
    #[error("cannot read {}", path.display())]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
}
