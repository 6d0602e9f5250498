//! # mailshot-mime
//!
//! Outgoing message model and wire serializer.
//!
//! ## Features
//!
//! - **Header multimap**: case-insensitive field names, canonicalized the MIME
//!   way (`content-type` → `Content-Type`) and kept in sorted order
//! - **Attachments**: ordered list, read fully into memory
//! - **Serialization**: `text/plain` single part, or `multipart/mixed` with a
//!   base64 part per attachment and sniffed content types
//! - **Address lists**: RFC 5322 `To`/`Cc`/`Bcc` parsing for the SMTP envelope
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailshot_mime::{Headers, Message};
//!
//! let mut message = Message::new();
//! message.set_header("from", "sender@example.com");
//! message.set_header("to", "Bob <bob@example.com>, carol@example.com");
//! message.set_header("subject", "Report");
//! message.body = "See attached.".to_string();
//! message.attach_file("report.pdf", "", Headers::new())?;
//!
//! let recipients = message.address_list("to")?;
//! let wire = message.to_bytes();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod address;
mod builder;
mod content_type;
mod error;
mod header;
mod message;

pub mod encoding;

pub use address::{Mailbox, parse_address_list};
pub use builder::MessageBuilder;
pub use content_type::ContentType;
pub use error::{Error, Result};
pub use header::{Headers, canonical_key};
pub use message::{Attachment, Message};
