//! RFC 5322 address-list parsing.
//!
//! Parsing is delegated to [`mailparse`]; groups are flattened into their
//! members and every resulting address is checked for the `local@domain`
//! shape the SMTP envelope needs.

use crate::error::{Error, Result};
use mailparse::{MailAddr, SingleInfo};
use std::fmt;

/// Characters that require a display name to be quoted.
const SPECIALS: &str = "()<>[]:;@\\,.\"";

/// A single mailbox: optional display name plus `local@domain`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mailbox {
    /// Display name, unquoted.
    pub name: Option<String>,
    /// Bare address.
    pub address: String,
}

impl Mailbox {
    /// Creates a mailbox without validating the address.
    #[must_use]
    pub fn new(name: Option<String>, address: impl Into<String>) -> Self {
        Self {
            name,
            address: address.into(),
        }
    }
}

impl fmt::Display for Mailbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => {
                if name.contains(|c: char| SPECIALS.contains(c)) || name.trim() != name {
                    let escaped = name.replace('\\', "\\\\").replace('"', "\\\"");
                    write!(f, "\"{escaped}\" <{}>", self.address)
                } else {
                    write!(f, "{name} <{}>", self.address)
                }
            }
            _ => f.write_str(&self.address),
        }
    }
}

/// Parses a comma-separated address list.
///
/// Accepts `addr@domain`, `Name <addr@domain>` and `"Quoted, Name"
/// <addr@domain>`. Groups (`team: a@x, b@y;`) contribute their members;
/// an empty group contributes nothing.
///
/// # Errors
///
/// Returns [`Error::InvalidAddress`] for blank input, control characters,
/// syntax [`mailparse`] rejects, and addresses that are not `local@domain`.
pub fn parse_address_list(input: &str) -> Result<Vec<Mailbox>> {
    if input.trim().is_empty() {
        return Err(invalid("empty address list", input));
    }
    if input.chars().any(|c| c.is_control() && c != '\t') {
        return Err(invalid("control character in address list", input));
    }

    let list = mailparse::addrparse(input)
        .map_err(|e| Error::InvalidAddress(format!("{e}: {input:?}")))?;

    list.into_inner()
        .into_iter()
        .flat_map(|addr| match addr {
            MailAddr::Group(group) => group.addrs,
            MailAddr::Single(single) => vec![single],
        })
        .map(mailbox)
        .collect()
}

fn invalid(reason: &str, input: &str) -> Error {
    Error::InvalidAddress(format!("{reason}: {input:?}"))
}

fn mailbox(single: SingleInfo) -> Result<Mailbox> {
    check_address(&single.addr)?;
    let name = single
        .display_name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());
    Ok(Mailbox::new(name, single.addr))
}

/// Requires `local@domain` with a non-empty domain free of `@`, whitespace
/// and brackets. The local part may be quoted.
fn check_address(address: &str) -> Result<()> {
    let Some((local, domain)) = address.rsplit_once('@') else {
        return Err(invalid("address must have the form local@domain", address));
    };
    if local.is_empty() || domain.is_empty() {
        return Err(invalid("address must have the form local@domain", address));
    }

    let quoted = local.len() >= 2 && local.starts_with('"') && local.ends_with('"');
    let bad_local = !quoted
        && local
            .chars()
            .any(|c| c.is_whitespace() || "<>,;\"@".contains(c));
    let bad_domain = !domain.starts_with('[')
        && domain
            .chars()
            .any(|c| c.is_whitespace() || "<>,;\"@[]".contains(c));
    if bad_local || bad_domain {
        return Err(invalid("illegal character in address", address));
    }
    Ok(())
}
