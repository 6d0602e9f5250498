//! mailshot: send templated mail from YAML definitions.

mod send;

use clap::{Args, Parser, Subcommand};
use mailshot_core::config::CONFIG_FILE;
use send::{MailSelection, SendOptions};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "mailshot", author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile mails from a message file and send them.
    Send(SendArgs),
}

#[derive(Args, Debug)]
struct SendArgs {
    /// Account name in `.sendmail.yaml`.
    #[arg(short = 'a', long)]
    account: String,

    /// Message file with templates and mails.
    #[arg(short = 'f', long = "message-file")]
    message_file: PathBuf,

    /// Mails to send, repeatable or comma-separated. Defaults to all.
    #[arg(
        short = 'm',
        long = "mail",
        visible_alias = "message",
        value_delimiter = ','
    )]
    mail: Vec<String>,

    /// Print each message to stdout before sending.
    #[arg(short = 'p', long)]
    print: bool,
}

impl From<SendArgs> for SendOptions {
    fn from(args: SendArgs) -> Self {
        Self {
            account: args.account,
            config_file: PathBuf::from(CONFIG_FILE),
            message_file: args.message_file,
            mails: MailSelection::from_names(args.mail),
            print: args.print,
        }
    }
}

/// Exit status for a rejected command line: 0 for help and version, 1 otherwise.
fn usage_status(err: &clap::Error) -> u8 {
    u8::from(err.use_stderr())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mailshot=info,mailshot_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return ExitCode::from(usage_status(&e));
        }
    };
    let result = match cli.command {
        Command::Send(args) => send::run(&args.into()).await,
    };

    match result {
        Ok(count) => {
            tracing::debug!(count, "done");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
