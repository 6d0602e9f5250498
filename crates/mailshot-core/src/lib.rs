//! # mailshot-core
//!
//! Everything between the command line and the wire:
//!
//! - **Configuration**: the account file (SMTP profiles, accounts) and
//!   message files (templates, mails), loaded from YAML
//! - **Templating**: every configured string is a tera template, with a
//!   `prompt` function for interactive secrets
//! - **Compilation**: a mail's overrides merged onto its template, with the
//!   account's SMTP settings resolved
//! - **Sending**: envelope validation and SMTP delivery
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailshot_core::config::{CONFIG_FILE, load_config_file, load_message_file};
//! use mailshot_core::service::{SmtpTransport, apply_defaults, send_message};
//! use mailshot_core::{TeraEvaluator, compile_mail};
//!
//! let config = load_config_file(CONFIG_FILE)?;
//! let messages = load_message_file("mails.yaml")?;
//! let mut compiled = compile_mail(&TeraEvaluator::new(), &config, &messages, "a1", "m1")?;
//! apply_defaults(&mut compiled.message);
//!
//! let mut transport = SmtpTransport::from_compiled(&compiled);
//! send_message(&mut transport, &compiled.message).await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod compiler;
pub mod config;
mod error;
pub mod service;
pub mod template;

pub use compiler::{CompiledMail, CompiledSmtp, compile_mail};
pub use error::{Error, Result};
pub use template::{Evaluator, TeraEvaluator};
