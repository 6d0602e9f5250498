//! Envelope addresses.

use crate::error::{Error, Result};

/// Returns true if `s` contains a carriage return or line feed.
///
/// An address with an embedded line break would let a crafted header value
/// inject extra SMTP commands into the session.
#[must_use]
pub fn contains_line_break(s: &str) -> bool {
    s.contains(['\r', '\n'])
}

/// Bare `local@domain` address used in `MAIL FROM` and `RCPT TO`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address(String);

impl Address {
    /// Creates a new envelope address.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAddress`] if the address is empty, contains a
    /// line break, or does not have exactly one `@` with non-empty sides.
    pub fn new(addr: impl Into<String>) -> Result<Self> {
        let addr = addr.into();
        Self::validate(&addr)?;
        Ok(Self(addr))
    }

    /// Returns the address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(addr: &str) -> Result<()> {
        if addr.is_empty() {
            return Err(Error::InvalidAddress("address cannot be empty".into()));
        }

        if contains_line_break(addr) {
            return Err(Error::InvalidAddress(format!(
                "address contains CR or LF: {addr:?}"
            )));
        }

        match addr.split_once('@') {
            Some((local, domain))
                if !local.is_empty() && !domain.is_empty() && !domain.contains('@') =>
            {
                Ok(())
            }
            Some(_) => Err(Error::InvalidAddress(format!(
                "address must have exactly one @ with non-empty local and domain parts: {addr}"
            ))),
            None => Err(Error::InvalidAddress(format!("address must contain @: {addr}"))),
        }
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
