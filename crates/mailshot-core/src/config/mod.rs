//! Configuration loading.
//!
//! Two YAML files drive a send: the account file (SMTP profiles and
//! accounts, always [`CONFIG_FILE`] in the working directory) and a message
//! file (templates and mails) named on the command line. Values are kept as
//! template source; nothing is evaluated at load time.

mod account;
mod message;
mod scalar;

pub use account::{AccountConfig, AppConfig, SmtpConfig};
pub use message::{AttachmentConfig, HeaderMap, MailConfig, MessageFile, MessageSpec, MessageTemplate};
pub use scalar::HeaderValues;

use crate::error::{Error, Result};
use std::path::Path;
use tracing::debug;

/// Account file name, resolved against the working directory.
pub const CONFIG_FILE: &str = ".sendmail.yaml";

/// Loads the account file.
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be read and [`Error::Yaml`] if
/// it does not parse.
pub fn load_config_file(path: impl AsRef<Path>) -> Result<AppConfig> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    let config = AppConfig::from_yaml(&text).map_err(|source| Error::Yaml {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(
        path = %path.display(),
        smtp = config.smtp.len(),
        accounts = config.accounts.len(),
        "loaded account file"
    );
    Ok(config)
}

/// Loads a message file.
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be read and [`Error::Yaml`] if
/// it does not parse.
pub fn load_message_file(path: impl AsRef<Path>) -> Result<MessageFile> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    let file = MessageFile::from_yaml(&text).map_err(|source| Error::Yaml {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(
        path = %path.display(),
        templates = file.templates.len(),
        mails = file.mails.len(),
        "loaded message file"
    );
    Ok(file)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "accounts:\n  - name: a1\n    smtpRef: s1\n").unwrap();

        let config = load_config_file(&path).unwrap();
        assert_eq!(config.account("a1").unwrap().smtp_ref, "s1");
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_message_file(dir.path().join("nope.yaml")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn malformed_yaml_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.yaml");
        std::fs::write(&path, "mails: [unclosed\n").unwrap();

        let err = load_message_file(&path).unwrap_err();
        assert!(matches!(err, Error::Yaml { .. }));
        assert!(err.to_string().contains("bad.yaml"));
    }
}
