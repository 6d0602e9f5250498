//! Pre-send validation and envelope construction.

use super::transport::{Envelope, Transport};
use crate::error::{Error, Result};
use mailshot_mime::{Message, parse_address_list};
use mailshot_smtp::{Address, contains_line_break};
use tracing::info;

/// Header fields that feed the envelope.
const ADDRESS_FIELDS: [&str; 4] = ["From", "To", "Cc", "Bcc"];

/// Fills `Date` (RFC 5322, local time) and `Mime-Version` when absent.
pub fn apply_defaults(message: &mut Message) {
    message
        .headers
        .set_default("Date", chrono::Local::now().format("%a, %d %b %Y %H:%M:%S %z").to_string());
    message.headers.set_default("Mime-Version", "1.0");
}

/// Validates address headers and derives the SMTP envelope.
///
/// The reverse path is the first `From` mailbox. Recipients are the
/// mailboxes of every `To`, `Cc` and `Bcc` value, in that order, each
/// address once.
///
/// # Errors
///
/// Returns [`Error::MissingHeader`] if `From` or `To` is absent or empty,
/// and [`Error::InvalidAddress`] if any address header contains a line break
/// or does not parse.
pub fn envelope(message: &Message) -> Result<Envelope> {
    for field in ["From", "To"] {
        if message.header(field).is_none_or(|v| v.trim().is_empty()) {
            return Err(Error::MissingHeader(field.to_string()));
        }
    }

    for field in ADDRESS_FIELDS {
        if message.headers.get_all(field).iter().any(|v| contains_line_break(v)) {
            return Err(Error::InvalidAddress(format!("{field} header contains CR or LF")));
        }
    }

    let from = mailboxes(message, "From")?
        .into_iter()
        .next()
        .ok_or_else(|| Error::InvalidAddress("From has no mailbox".into()))?;
    let from = envelope_address(&from)?;

    let mut recipients: Vec<Address> = Vec::new();
    for field in &ADDRESS_FIELDS[1..] {
        for address in mailboxes(message, field)? {
            let address = envelope_address(&address)?;
            if !recipients.contains(&address) {
                recipients.push(address);
            }
        }
    }
    if recipients.is_empty() {
        return Err(Error::InvalidAddress("no recipients".into()));
    }

    Ok(Envelope { from, recipients })
}

/// Bare addresses from every non-blank value of `field`.
fn mailboxes(message: &Message, field: &str) -> Result<Vec<String>> {
    let mut addresses = Vec::new();
    for value in message.headers.get_all(field) {
        if value.trim().is_empty() {
            continue;
        }
        let list = parse_address_list(value)
            .map_err(|e| Error::InvalidAddress(format!("{field}: {e}")))?;
        addresses.extend(list.into_iter().map(|m| m.address));
    }
    Ok(addresses)
}

fn envelope_address(address: &str) -> Result<Address> {
    Address::new(address).map_err(|e| Error::InvalidAddress(e.to_string()))
}

/// A validated message with its envelope and wire bytes.
#[derive(Debug, Clone)]
pub struct Prepared {
    /// Envelope derived from the address headers.
    pub envelope: Envelope,
    /// Serialized message.
    pub bytes: Vec<u8>,
}

/// Validates and serializes a message without touching the network.
///
/// # Errors
///
/// Returns any validation error from [`envelope`].
pub fn prepare(message: &Message) -> Result<Prepared> {
    Ok(Prepared {
        envelope: envelope(message)?,
        bytes: message.to_bytes(),
    })
}

/// Delivers a prepared message.
///
/// # Errors
///
/// Returns the transport's error.
pub async fn send_prepared<T: Transport>(transport: &mut T, prepared: &Prepared) -> Result<()> {
    transport.send(&prepared.envelope, &prepared.bytes).await?;
    info!(
        from = %prepared.envelope.from,
        recipients = prepared.envelope.recipients.len(),
        bytes = prepared.bytes.len(),
        "message sent"
    );
    Ok(())
}

/// Validates, serializes and delivers a message.
///
/// Every check runs before `transport` is touched, so a rejected message
/// never opens a connection.
///
/// # Errors
///
/// Returns any validation error from [`envelope`] or the transport's error.
pub async fn send_message<T: Transport>(transport: &mut T, message: &Message) -> Result<()> {
    send_prepared(transport, &prepare(message)?).await
}
