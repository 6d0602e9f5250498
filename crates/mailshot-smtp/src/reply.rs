//! Server replies.

use crate::error::{Error, Result};

/// Three-digit SMTP reply code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ReplyCode(u16);

impl ReplyCode {
    /// 220 Service ready
    pub const SERVICE_READY: Self = Self(220);
    /// 250 Requested mail action okay, completed
    pub const OK: Self = Self(250);
    /// 334 Server challenge during AUTH
    pub const AUTH_CONTINUE: Self = Self(334);
    /// 354 Start mail input
    pub const START_DATA: Self = Self(354);

    /// Creates a reply code.
    #[must_use]
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    /// Returns the numeric code.
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self.0
    }

    /// 2xx
    #[must_use]
    pub const fn is_success(self) -> bool {
        self.0 >= 200 && self.0 < 300
    }
}

impl std::fmt::Display for ReplyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A complete (possibly multi-line) reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Reply code shared by every line.
    pub code: ReplyCode,
    /// Text of each line with the code and separator stripped.
    pub lines: Vec<String>,
}

impl Reply {
    /// Parses the lines of one reply, as collected by [`is_last_line`].
    ///
    /// Multi-line replies look like `250-first`, `250-second`, `250 last`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] if a line is too short, the code is not
    /// numeric, or the lines disagree on the code.
    pub fn parse(raw: &[String]) -> Result<Self> {
        let first = raw
            .first()
            .ok_or_else(|| Error::Protocol("empty reply".into()))?;
        let code = parse_code(first)?;

        let mut lines = Vec::with_capacity(raw.len());
        for line in raw {
            if parse_code(line)? != code {
                return Err(Error::Protocol(format!(
                    "reply code changed mid-reply: {line}"
                )));
            }
            lines.push(line.get(4..).unwrap_or_default().to_string());
        }

        Ok(Self { code, lines })
    }

    /// Returns true for a 2xx reply.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.code.is_success()
    }

    /// Joins all lines with `\n`.
    #[must_use]
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    /// Converts a non-2xx reply into an [`Error::SmtpError`].
    ///
    /// # Errors
    ///
    /// Returns the error when the reply is not a success.
    pub fn into_success(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(self.into_error())
        }
    }

    /// Builds the error carrying this reply's code and text.
    #[must_use]
    pub fn into_error(self) -> Error {
        Error::smtp_error(self.code.as_u16(), self.text())
    }
}

/// Returns true if `line` ends a reply (`NNN ` or bare `NNN`).
#[must_use]
pub fn is_last_line(line: &str) -> bool {
    match line.as_bytes().get(3) {
        None => line.len() == 3,
        Some(sep) => *sep == b' ',
    }
}

fn parse_code(line: &str) -> Result<ReplyCode> {
    let digits = line
        .get(..3)
        .filter(|d| d.bytes().all(|b| b.is_ascii_digit()))
        .ok_or_else(|| Error::Protocol(format!("malformed reply line: {line}")))?;
    match line.as_bytes().get(3) {
        None | Some(b' ' | b'-') => {}
        Some(_) => return Err(Error::Protocol(format!("malformed reply line: {line}"))),
    }
    digits
        .parse()
        .map(ReplyCode::new)
        .map_err(|_| Error::Protocol(format!("invalid reply code: {digits}")))
}
