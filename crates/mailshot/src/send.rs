//! The `send` subcommand.

use anyhow::{Context, Result};
use mailshot_core::config::{MessageFile, load_config_file, load_message_file};
use mailshot_core::service::{SmtpTransport, Transport, apply_defaults, prepare, send_prepared};
use mailshot_core::{CompiledMail, Evaluator, TeraEvaluator, compile_mail};
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

/// Which mails of the message file to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MailSelection {
    /// Every mail, in file order.
    All,
    /// The named mails, in the given order.
    Named(Vec<String>),
}

impl MailSelection {
    /// Builds a selection from `--mail` values; none means all.
    pub fn from_names(names: Vec<String>) -> Self {
        let names: Vec<String> = names
            .into_iter()
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .collect();
        if names.is_empty() {
            Self::All
        } else {
            Self::Named(names)
        }
    }

    fn resolve<'a>(&'a self, file: &'a MessageFile) -> Vec<&'a str> {
        match self {
            Self::All => file.mail_names(),
            Self::Named(names) => names.iter().map(String::as_str).collect(),
        }
    }
}

/// Everything `send` needs, resolved from the command line.
#[derive(Debug, Clone)]
pub struct SendOptions {
    /// Account name.
    pub account: String,
    /// Account file.
    pub config_file: PathBuf,
    /// Message file.
    pub message_file: PathBuf,
    /// Mails to send.
    pub mails: MailSelection,
    /// Print each message to stdout before sending.
    pub print: bool,
}

/// Sends the selected mails over SMTP, stopping at the first failure.
pub async fn run(options: &SendOptions) -> Result<usize> {
    let evaluator = TeraEvaluator::new();
    let mut stdout = std::io::stdout().lock();
    run_with(options, &evaluator, SmtpTransport::from_compiled, &mut stdout).await
}

/// Returns the number of mails sent.
pub async fn run_with<E, T, W>(
    options: &SendOptions,
    evaluator: &E,
    transport_for: impl Fn(&CompiledMail) -> T,
    out: &mut W,
) -> Result<usize>
where
    E: Evaluator,
    T: Transport,
    W: Write,
{
    let config = load_config_file(&options.config_file).with_context(|| {
        format!("failed to load account file {}", options.config_file.display())
    })?;
    let messages = load_message_file(&options.message_file).with_context(|| {
        format!("failed to load message file {}", options.message_file.display())
    })?;

    let names = options.mails.resolve(&messages);
    if names.is_empty() {
        anyhow::bail!(
            "no mails defined in {}",
            options.message_file.display()
        );
    }

    for name in &names {
        let mut compiled = compile_mail(evaluator, &config, &messages, &options.account, name)
            .with_context(|| format!("cannot compile mail {name}"))?;
        apply_defaults(&mut compiled.message);

        let prepared = prepare(&compiled.message).with_context(|| format!("invalid mail {name}"))?;
        if options.print {
            out.write_all(&prepared.bytes)?;
            writeln!(out)?;
            out.flush()?;
        }

        info!(
            mail = %name,
            host = %compiled.smtp.host,
            port = compiled.smtp.port,
            "sending"
        );
        let mut transport = transport_for(&compiled);
        send_prepared(&mut transport, &prepared)
            .await
            .with_context(|| format!("failed to send mail {name}"))?;
    }

    Ok(names.len())
}
