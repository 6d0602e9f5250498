//! SMTP connection management with type-state pattern.

mod client;
mod stream;
mod tls;

pub use client::{
    Authenticated, Client, Connected, Data, MailTransaction, Ready, RecipientAdded,
    SmtpConnection,
};
pub use stream::{SmtpStream, connect, connect_tls};
pub use tls::TlsVerification;

use crate::extension::{AuthMechanism, Extension};
use std::collections::HashSet;

/// Server capabilities from the EHLO reply.
#[derive(Debug, Clone, Default)]
pub struct ServerInfo {
    /// Server hostname from the greeting.
    pub hostname: String,
    /// Advertised extensions.
    pub extensions: HashSet<Extension>,
}

impl ServerInfo {
    /// Checks if the server advertised an extension.
    #[must_use]
    pub fn supports(&self, ext: &Extension) -> bool {
        self.extensions.contains(ext)
    }

    /// Checks if STARTTLS was advertised.
    #[must_use]
    pub fn supports_starttls(&self) -> bool {
        self.supports(&Extension::StartTls)
    }

    /// Returns the advertised SASL mechanisms, empty when AUTH is absent.
    #[must_use]
    pub fn auth_mechanisms(&self) -> Vec<AuthMechanism> {
        self.extensions
            .iter()
            .find_map(|ext| match ext {
                Extension::Auth(mechanisms) => Some(mechanisms.clone()),
                _ => None,
            })
            .unwrap_or_default()
    }
}
