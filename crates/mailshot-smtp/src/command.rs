//! SMTP command serialization.

use crate::address::Address;
use crate::extension::AuthMechanism;

/// A client command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// EHLO with the client's hostname
    Ehlo {
        /// Client hostname
        hostname: String,
    },
    /// STARTTLS
    StartTls,
    /// AUTH, optionally with a SASL initial response
    Auth {
        /// SASL mechanism
        mechanism: AuthMechanism,
        /// Base64 initial response
        initial_response: Option<String>,
    },
    /// A bare base64 line answering a 334 challenge
    AuthResponse(String),
    /// MAIL FROM
    MailFrom {
        /// Reverse path
        from: Address,
    },
    /// RCPT TO
    RcptTo {
        /// Forward path
        to: Address,
    },
    /// DATA
    Data,
    /// QUIT
    Quit,
}

impl Command {
    /// Serializes the command, including the trailing CRLF.
    #[must_use]
    pub fn serialize(&self) -> Vec<u8> {
        let mut line = match self {
            Self::Ehlo { hostname } => format!("EHLO {hostname}"),
            Self::StartTls => "STARTTLS".to_string(),
            Self::Auth {
                mechanism,
                initial_response: Some(resp),
            } => format!("AUTH {} {resp}", mechanism.as_str()),
            Self::Auth {
                mechanism,
                initial_response: None,
            } => format!("AUTH {}", mechanism.as_str()),
            Self::AuthResponse(resp) => resp.clone(),
            Self::MailFrom { from } => format!("MAIL FROM:<{from}>"),
            Self::RcptTo { to } => format!("RCPT TO:<{to}>"),
            Self::Data => "DATA".to_string(),
            Self::Quit => "QUIT".to_string(),
        }
        .into_bytes();
        line.extend_from_slice(b"\r\n");
        line
    }

    /// Returns true if the serialized form carries credentials.
    #[must_use]
    pub const fn is_sensitive(&self) -> bool {
        matches!(self, Self::Auth { .. } | Self::AuthResponse(_))
    }
}
