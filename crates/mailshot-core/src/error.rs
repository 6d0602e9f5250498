//! Error types for the core library.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading, compiling or sending mail.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error")]
    Io(#[from] std::io::Error),

    /// A YAML file could not be read or parsed.
    #[error("cannot load {}", path.display())]
    Yaml {
        /// File that failed.
        path: PathBuf,
        /// Parse error, with line and column when known.
        source: serde_yaml::Error,
    },

    /// Account not found.
    #[error("account not found: {0}")]
    AccountNotFound(String),

    /// SMTP profile not found.
    #[error("smtp config not found: {0}")]
    SmtpNotFound(String),

    /// Mail definition not found.
    #[error("mail not found: {0}")]
    MailNotFound(String),

    /// Template not found.
    #[error("template not found: {0}")]
    TemplateNotFound(String),

    /// Template expression failed to parse or render.
    #[error("template error in {expression:?}: {message}")]
    Template {
        /// Source text being evaluated.
        expression: String,
        /// Rendered error chain.
        message: String,
    },

    /// Port did not evaluate to a valid port number.
    #[error("invalid port: {0:?}")]
    InvalidPort(String),

    /// Value did not evaluate to a boolean.
    #[error("invalid boolean for {field}: {value:?}")]
    InvalidBool {
        /// Config key being parsed.
        field: &'static str,
        /// Evaluated value.
        value: String,
    },

    /// Required header is absent or empty.
    #[error("mail: header missing or empty -- {0}")]
    MissingHeader(String),

    /// Attachment file could not be read.
    #[error("cannot attach file: {}", path.display())]
    Attach {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// Address header or envelope address rejected.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Message model error.
    #[error(transparent)]
    Mime(#[from] mailshot_mime::Error),

    /// SMTP protocol or connection failure.
    #[error(transparent)]
    Smtp(#[from] mailshot_smtp::Error),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
