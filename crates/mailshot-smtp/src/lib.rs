//! # mailshot-smtp
//!
//! A small SMTP submission client implementing the subset of RFC 5321 that a
//! one-shot mail sender needs.
//!
//! ## Features
//!
//! - **Type-state connection management**: invalid command orderings do not
//!   compile
//! - **Protocol support**: EHLO, STARTTLS, AUTH (PLAIN, LOGIN), MAIL FROM,
//!   RCPT TO, DATA, QUIT
//! - **TLS support**: implicit TLS (port 465 style) and STARTTLS, with an
//!   opt-in mode that skips certificate verification
//! - **Command-injection guard**: envelope addresses containing CR or LF are
//!   rejected before anything is written to the wire
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailshot_smtp::{Address, Client, TlsVerification};
//! use mailshot_smtp::connection::connect;
//!
//! #[tokio::main]
//! async fn main() -> mailshot_smtp::Result<()> {
//!     let stream = connect("smtp.example.com", 587).await?;
//!     let client = Client::from_stream(stream).await?;
//!     let client = client.ehlo("localhost").await?;
//!     let client = client
//!         .starttls("smtp.example.com", "localhost", TlsVerification::WebPki)
//!         .await?;
//!     let client = client.auth_plain("user@example.com", "password").await?;
//!
//!     let client = client
//!         .mail_from(Address::new("sender@example.com")?)
//!         .await?;
//!     let client = client
//!         .rcpt_to(Address::new("recipient@example.com")?)
//!         .await?;
//!     let client = client.data().await?;
//!     let client = client
//!         .send_message(b"Subject: Test\r\n\r\nHello, World!\r\n")
//!         .await?;
//!
//!     client.quit().await
//! }
//! ```
//!
//! ## Connection States
//!
//! ```text
//! ┌──────────────┐
//! │  Connected   │ ─── auth_plain()/auth_login() ───→ Authenticated
//! └──────────────┘
//!        │
//!        └─── mail_from() ───→ MailTransaction ───→ RecipientAdded ───→ Data
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod address;
pub mod command;
pub mod connection;
mod error;
mod extension;
pub mod framed;
mod reply;

pub use address::{Address, contains_line_break};
pub use connection::{
    Authenticated, Client, Connected, Data, MailTransaction, Ready, RecipientAdded, ServerInfo,
    SmtpConnection, SmtpStream, TlsVerification,
};
pub use error::{Error, Result};
pub use extension::{AuthMechanism, Extension};
pub use reply::{Reply, ReplyCode};
