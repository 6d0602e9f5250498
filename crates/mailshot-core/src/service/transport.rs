//! Message delivery.

use crate::compiler::{CompiledMail, CompiledSmtp};
use crate::error::{Error, Result};
use mailshot_smtp::connection::{connect, connect_tls};
use mailshot_smtp::{Address, Client, Ready, SmtpConnection, TlsVerification};
use std::future::Future;
use tracing::{debug, warn};

/// Name sent in EHLO.
const CLIENT_HOSTNAME: &str = "localhost";

/// SMTP envelope: reverse path and forward paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// `MAIL FROM` address.
    pub from: Address,
    /// `RCPT TO` addresses, in order, without duplicates.
    pub recipients: Vec<Address>,
}

/// Something that can deliver a serialized message.
pub trait Transport {
    /// Delivers `message` to every envelope recipient.
    ///
    /// # Errors
    ///
    /// Returns an error if delivery fails for any recipient.
    fn send(&mut self, envelope: &Envelope, message: &[u8]) -> impl Future<Output = Result<()>>;
}

/// Delivers over a fresh SMTP session per message.
///
/// The session is plain TCP upgraded with STARTTLS when `start_tls` is set
/// (and the server offers it), implicit TLS otherwise. Authentication runs
/// only when a login user is configured, and only over TLS unless the host
/// is `localhost`.
#[derive(Clone)]
pub struct SmtpTransport {
    host: String,
    port: u16,
    start_tls: bool,
    verification: TlsVerification,
    login_user: String,
    password: String,
}

impl std::fmt::Debug for SmtpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpTransport")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("start_tls", &self.start_tls)
            .field("verification", &self.verification)
            .field("login_user", &self.login_user)
            .finish_non_exhaustive()
    }
}

impl SmtpTransport {
    /// Creates a transport for a server profile and credentials.
    #[must_use]
    pub fn new(smtp: &CompiledSmtp, login_user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            host: smtp.host.clone(),
            port: smtp.port,
            start_tls: smtp.start_tls,
            verification: if smtp.skip_verify {
                TlsVerification::Insecure
            } else {
                TlsVerification::WebPki
            },
            login_user: login_user.into(),
            password: password.into(),
        }
    }

    /// Creates a transport from a compiled mail's settings.
    #[must_use]
    pub fn from_compiled(mail: &CompiledMail) -> Self {
        Self::new(&mail.smtp, mail.login_user.as_str(), mail.password.as_str())
    }
}

impl Transport for SmtpTransport {
    async fn send(&mut self, envelope: &Envelope, message: &[u8]) -> Result<()> {
        let stream = if self.start_tls {
            connect(&self.host, self.port).await?
        } else {
            connect_tls(&self.host, self.port, self.verification).await?
        };

        let client = Client::from_stream(stream).await?;
        let mut client = client.ehlo(CLIENT_HOSTNAME).await?;

        if self.start_tls {
            if client.server_info().supports_starttls() {
                client = client
                    .starttls(&self.host, CLIENT_HOSTNAME, self.verification)
                    .await?;
            } else {
                warn!(host = %self.host, "server does not offer STARTTLS, continuing unencrypted");
            }
        }

        if self.login_user.is_empty() {
            deliver(client, envelope, message).await
        } else if !client.is_encrypted() && !is_localhost(&self.host) {
            let _ = client.quit().await;
            warn!(host = %self.host, "refusing to send credentials over an unencrypted connection");
            Err(mailshot_smtp::Error::NotSupported("STARTTLS".into()).into())
        } else {
            debug!(user = %self.login_user, "authenticating");
            let client = client.authenticate(&self.login_user, &self.password).await?;
            deliver(client, envelope, message).await
        }
    }
}

/// Hosts that may receive credentials without TLS.
fn is_localhost(host: &str) -> bool {
    matches!(host, "localhost" | "127.0.0.1" | "::1")
}

/// Runs one mail transaction and closes the session.
async fn deliver<S: Ready>(client: Client<S>, envelope: &Envelope, message: &[u8]) -> Result<()> {
    let (first, rest) = envelope
        .recipients
        .split_first()
        .ok_or_else(|| Error::InvalidAddress("no recipients".into()))?;

    let client = client.mail_from(envelope.from.clone()).await?;
    let mut client = client.rcpt_to(first.clone()).await?;
    for recipient in rest {
        client = client.rcpt_to(recipient.clone()).await?;
    }

    let client = client.data().await?.send_message(message).await?;
    client.quit().await?;
    Ok(())
}
