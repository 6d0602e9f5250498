//! Sending compiled mail.
//!
//! [`send_message`] validates a message, derives its envelope and hands the
//! serialized bytes to a [`Transport`]. [`SmtpTransport`] is the network
//! implementation; tests substitute their own.

mod send;
mod transport;

pub use send::{Prepared, apply_defaults, envelope, prepare, send_message, send_prepared};
pub use transport::{Envelope, SmtpTransport, Transport};
