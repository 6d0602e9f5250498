//! Templates and mail definitions (the `--message-file`).

use super::scalar::{HeaderValues, scalar};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};

/// Header field name to one or more template values.
pub type HeaderMap = BTreeMap<String, HeaderValues>;

/// A file to attach.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AttachmentConfig {
    /// Announced file name; empty means the file's own name.
    #[serde(default, deserialize_with = "scalar")]
    pub name: String,
    /// Path to read.
    #[serde(default, deserialize_with = "scalar")]
    pub path: String,
    /// Part headers.
    #[serde(default)]
    pub header: HeaderMap,
}

/// Reusable message skeleton.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MessageTemplate {
    /// Name referenced by mails.
    #[serde(default, deserialize_with = "scalar")]
    pub name: String,
    /// Message headers.
    #[serde(default)]
    pub header: HeaderMap,
    /// Body source.
    #[serde(default, deserialize_with = "scalar")]
    pub body: String,
    /// Attachments, appended after the mail's own.
    #[serde(default)]
    pub attachments: Vec<AttachmentConfig>,
}

/// Per-mail overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MessageSpec {
    /// Headers replacing the template's, key by key.
    #[serde(default)]
    pub header: HeaderMap,
    /// Body source; empty keeps the template body.
    #[serde(default, deserialize_with = "scalar")]
    pub body: String,
    /// Attachments placed before the template's.
    #[serde(default)]
    pub attachments: Vec<AttachmentConfig>,
}

/// A sendable mail: a template plus overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MailConfig {
    /// Name selected with `--mail`.
    #[serde(default, deserialize_with = "scalar")]
    pub name: String,
    /// Template name.
    #[serde(default, deserialize_with = "scalar")]
    pub template: String,
    /// Overrides.
    #[serde(default)]
    pub spec: MessageSpec,
}

/// Parsed message file with name lookups.
///
/// When two entries share a name the later one wins.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageFile {
    /// Templates in file order.
    #[serde(default)]
    pub templates: Vec<MessageTemplate>,
    /// Mails in file order.
    #[serde(default)]
    pub mails: Vec<MailConfig>,
    #[serde(skip)]
    template_index: HashMap<String, usize>,
    #[serde(skip)]
    mail_index: HashMap<String, usize>,
}

impl MessageFile {
    /// Parses message-file YAML.
    ///
    /// # Errors
    ///
    /// Returns the parse error, with location, if the YAML is malformed.
    pub fn from_yaml(yaml: &str) -> serde_yaml::Result<Self> {
        let mut file: Self = serde_yaml::from_str(yaml)?;
        file.template_index = index_by_name(file.templates.iter().map(|t| t.name.as_str()));
        file.mail_index = index_by_name(file.mails.iter().map(|m| m.name.as_str()));
        Ok(file)
    }

    /// Looks up a template by name.
    #[must_use]
    pub fn template(&self, name: &str) -> Option<&MessageTemplate> {
        self.template_index.get(name).map(|&i| &self.templates[i])
    }

    /// Looks up a mail by name.
    #[must_use]
    pub fn mail(&self, name: &str) -> Option<&MailConfig> {
        self.mail_index.get(name).map(|&i| &self.mails[i])
    }

    /// Mail names in file order, duplicates included once.
    #[must_use]
    pub fn mail_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::with_capacity(self.mails.len());
        for mail in &self.mails {
            if !names.contains(&mail.name.as_str()) {
                names.push(&mail.name);
            }
        }
        names
    }
}

fn index_by_name<'a>(names: impl Iterator<Item = &'a str>) -> HashMap<String, usize> {
    names.enumerate().map(|(i, n)| (n.to_string(), i)).collect()
}
