//! Outgoing message model.

use crate::address::{Mailbox, parse_address_list};
use crate::builder::MessageBuilder;
use crate::error::{Error, Result};
use crate::header::Headers;
use std::path::Path;

/// A file carried by a message, fully buffered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attachment {
    /// File name announced in `Content-Disposition`.
    pub name: String,
    /// Raw content.
    pub content: Vec<u8>,
    /// Part headers; builder defaults fill the gaps.
    pub headers: Headers,
}

impl Attachment {
    /// Creates an attachment from in-memory content.
    #[must_use]
    pub fn new(name: impl Into<String>, content: Vec<u8>, headers: Headers) -> Self {
        Self {
            name: name.into(),
            content,
            headers,
        }
    }

    /// Reads `path` into memory.
    ///
    /// An empty `name` falls back to the final path component.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read.
    pub fn from_file(path: impl AsRef<Path>, name: &str, headers: Headers) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let name = if name.is_empty() {
            path.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        } else {
            name.to_string()
        };

        Ok(Self::new(name, content, headers))
    }
}

/// An email ready to be serialized.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    /// Message-level headers.
    pub headers: Headers,
    /// Plain body text.
    pub body: String,
    attachments: Vec<Attachment>,
}

impl Message {
    /// Creates an empty message.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a header value.
    pub fn add_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.add(name, value);
    }

    /// Replaces a header's values.
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.set(name, value);
    }

    /// First value of a header.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// Removes a header.
    pub fn remove_header(&mut self, name: &str) {
        self.headers.remove(name);
    }

    /// Appends an attachment.
    pub fn attach(&mut self, attachment: Attachment) {
        self.attachments.push(attachment);
    }

    /// Reads a file and appends it as an attachment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read.
    pub fn attach_file(&mut self, path: impl AsRef<Path>, name: &str, headers: Headers) -> Result<()> {
        self.attach(Attachment::from_file(path, name, headers)?);
        Ok(())
    }

    /// Removes the attachment at a 1-based position. Out of range is a no-op.
    pub fn remove_attachment_at(&mut self, index: usize) -> Option<Attachment> {
        if index == 0 || index > self.attachments.len() {
            return None;
        }
        Some(self.attachments.remove(index - 1))
    }

    /// Removes the first attachment with the given name.
    pub fn remove_attachment_named(&mut self, name: &str) -> Option<Attachment> {
        let index = self.attachments.iter().position(|a| a.name == name)?;
        Some(self.attachments.remove(index))
    }

    /// Attachments in order.
    #[must_use]
    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    /// Parses the first value of an address header.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingHeader`] if the header is absent, or
    /// [`Error::InvalidAddress`] if it does not parse.
    pub fn address_list(&self, field: &str) -> Result<Vec<Mailbox>> {
        let value = self
            .header(field)
            .ok_or_else(|| Error::MissingHeader(field.to_string()))?;
        parse_address_list(value)
    }

    /// Serializes the message with a fresh boundary.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        MessageBuilder::new().build(self)
    }
}
