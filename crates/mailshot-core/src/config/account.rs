//! Account and SMTP profiles (`.sendmail.yaml`).

use super::scalar::scalar;
use serde::Deserialize;
use std::collections::HashMap;

/// SMTP server profile. Every field is template source text.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmtpConfig {
    /// Profile name referenced by accounts.
    #[serde(default, deserialize_with = "scalar")]
    pub name: String,
    /// Server hostname.
    #[serde(default, deserialize_with = "scalar")]
    pub host: String,
    /// Server port.
    #[serde(default, deserialize_with = "scalar")]
    pub port: String,
    /// `true` for STARTTLS on a plain connection, `false` for implicit TLS.
    #[serde(default, deserialize_with = "scalar")]
    pub starttls: String,
    /// Skip server certificate verification.
    #[serde(default = "default_skip_verify", deserialize_with = "scalar")]
    pub skip_verify: String,
}

fn default_skip_verify() -> String {
    "true".to_string()
}

/// Sending account.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountConfig {
    /// Account name selected with `--account`.
    #[serde(default, deserialize_with = "scalar")]
    pub name: String,
    /// Name of the SMTP profile to use.
    #[serde(default, deserialize_with = "scalar")]
    pub smtp_ref: String,
    /// SMTP login; empty disables authentication.
    #[serde(default, deserialize_with = "scalar")]
    pub login_user: String,
    /// SMTP password.
    #[serde(default, deserialize_with = "scalar")]
    pub password: String,
    /// `From` used when the mail does not set one.
    #[serde(default, deserialize_with = "scalar")]
    pub default_from: String,
}

/// Parsed account file with name lookups.
///
/// When two entries share a name the later one wins.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// SMTP profiles in file order.
    #[serde(default)]
    pub smtp: Vec<SmtpConfig>,
    /// Accounts in file order.
    #[serde(default)]
    pub accounts: Vec<AccountConfig>,
    #[serde(skip)]
    smtp_index: HashMap<String, usize>,
    #[serde(skip)]
    account_index: HashMap<String, usize>,
}

impl AppConfig {
    /// Parses account-file YAML.
    ///
    /// # Errors
    ///
    /// Returns the parse error, with location, if the YAML is malformed.
    pub fn from_yaml(yaml: &str) -> serde_yaml::Result<Self> {
        let mut config: Self = serde_yaml::from_str(yaml)?;
        config.reindex();
        Ok(config)
    }

    fn reindex(&mut self) {
        self.smtp_index = self
            .smtp
            .iter()
            .enumerate()
            .map(|(i, s)| (s.name.clone(), i))
            .collect();
        self.account_index = self
            .accounts
            .iter()
            .enumerate()
            .map(|(i, a)| (a.name.clone(), i))
            .collect();
    }

    /// Looks up an SMTP profile by name.
    #[must_use]
    pub fn smtp(&self, name: &str) -> Option<&SmtpConfig> {
        self.smtp_index.get(name).map(|&i| &self.smtp[i])
    }

    /// Looks up an account by name.
    #[must_use]
    pub fn account(&self, name: &str) -> Option<&AccountConfig> {
        self.account_index.get(name).map(|&i| &self.accounts[i])
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const YAML: &str = r#"
smtp:
  - name: s1
    host: smtp.x.com
    port: 587
    starttls: true
  - name: s2
    host: smtp.y.com
    port: "465"
    starttls: "{{ 1 == 2 }}"
    skipVerify: false
accounts:
  - name: a1
    smtpRef: s1
    loginUser: a@x.com
    password: '{{ prompt(label="password:") }}'
    defaultFrom: A <a@x.com>
"#;

    #[test]
    fn parses_and_indexes() {
        let config = AppConfig::from_yaml(YAML).unwrap();

        let s1 = config.smtp("s1").unwrap();
        assert_eq!(s1.host, "smtp.x.com");
        assert_eq!(s1.port, "587");
        assert_eq!(s1.starttls, "true");
        assert_eq!(s1.skip_verify, "true");

        let s2 = config.smtp("s2").unwrap();
        assert_eq!(s2.port, "465");
        assert_eq!(s2.skip_verify, "false");

        let a1 = config.account("a1").unwrap();
        assert_eq!(a1.smtp_ref, "s1");
        assert_eq!(a1.login_user, "a@x.com");
        assert_eq!(a1.password, "{{ prompt(label=\"password:\") }}");
        assert_eq!(a1.default_from, "A <a@x.com>");

        assert!(config.account("missing").is_none());
        assert!(config.smtp("a1").is_none());
    }

    #[test]
    fn later_duplicate_wins() {
        let config = AppConfig::from_yaml(
            "accounts:\n  - name: a\n    loginUser: first\n  - name: a\n    loginUser: second\n",
        )
        .unwrap();
        assert_eq!(config.account("a").unwrap().login_user, "second");
        assert_eq!(config.accounts.len(), 2);
    }

    #[test]
    fn missing_sections_default_empty() {
        let config = AppConfig::from_yaml("smtp: []\n").unwrap();
        assert!(config.accounts.is_empty());
    }
}
