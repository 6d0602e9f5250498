//! MIME header handling.

use std::collections::BTreeMap;
use std::fmt;

/// Returns the canonical form of a header field name.
///
/// The first letter and every letter following a hyphen are upper-cased,
/// all other letters lower-cased: `content-TYPE` becomes `Content-Type`.
/// Surrounding whitespace is trimmed. Names containing characters that are
/// not legal in a field name are returned trimmed but otherwise unchanged.
#[must_use]
pub fn canonical_key(name: &str) -> String {
    let name = name.trim();
    if !name.bytes().all(|b| b.is_ascii_graphic() && b != b':') {
        return name.to_string();
    }

    let mut upper = true;
    name.chars()
        .map(|c| {
            let out = if upper {
                c.to_ascii_uppercase()
            } else {
                c.to_ascii_lowercase()
            };
            upper = c == '-';
            out
        })
        .collect()
}

/// Collection of header fields, each with one or more values.
///
/// Field names are stored canonicalized, so lookups are case-insensitive and
/// iteration is in sorted canonical order regardless of insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    fields: BTreeMap<String, Vec<String>>,
}

impl Headers {
    /// Creates a new empty header collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a value, keeping existing values for the field.
    pub fn add(&mut self, name: &str, value: impl Into<String>) {
        self.fields
            .entry(canonical_key(name))
            .or_default()
            .push(value.into());
    }

    /// Replaces all values for the field with a single value.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        self.fields.insert(canonical_key(name), vec![value.into()]);
    }

    /// Sets the field only if it has no non-empty value yet.
    pub fn set_default(&mut self, name: &str, value: impl Into<String>) {
        if self.get(name).is_none_or(str::is_empty) {
            self.set(name, value);
        }
    }

    /// Gets the first value for a field.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .get(&canonical_key(name))
            .and_then(|v| v.first().map(String::as_str))
    }

    /// Gets all values for a field, in insertion order.
    #[must_use]
    pub fn get_all(&self, name: &str) -> &[String] {
        self.fields
            .get(&canonical_key(name))
            .map_or(&[], Vec::as_slice)
    }

    /// Returns true if the field is present (even with an empty value).
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(&canonical_key(name))
    }

    /// Removes all values for a field.
    pub fn remove(&mut self, name: &str) {
        self.fields.remove(&canonical_key(name));
    }

    /// Returns the canonical field names in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Returns `(name, value)` pairs, sorted by name, one per value.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .flat_map(|(name, values)| values.iter().map(move |v| (name.as_str(), v.as_str())))
    }

    /// Number of distinct fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if no field is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Self::new();
        for (name, value) in iter {
            headers.add(name.as_ref(), value);
        }
        headers
    }
}

/// Writes `Name: value\r\n` lines in sorted order.
impl fmt::Display for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in self.iter() {
            write!(f, "{name}: {value}\r\n")?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect
)]
mod tests {
    use super::*;

    #[test]
    fn canonical_forms() {
        assert_eq!(canonical_key("content-type"), "Content-Type");
        assert_eq!(canonical_key("CONTENT-TRANSFER-ENCODING"), "Content-Transfer-Encoding");
        assert_eq!(canonical_key("mime-version"), "Mime-Version");
        assert_eq!(canonical_key(" x-mailer "), "X-Mailer");
        assert_eq!(canonical_key("from"), "From");
        assert_eq!(canonical_key("bad key"), "bad key");
    }

    #[test]
    fn add_get_case_insensitive() {
        let mut headers = Headers::new();
        headers.add("Content-Type", "text/plain");
        assert_eq!(headers.get("Content-Type"), Some("text/plain"));
        assert_eq!(headers.get("content-type"), Some("text/plain"));
        assert_eq!(headers.get("CONTENT-TYPE"), Some("text/plain"));
        assert!(headers.contains("cOnTeNt-TyPe"));
    }

    #[test]
    fn add_keeps_existing_set_replaces() {
        let mut headers = Headers::new();
        headers.add("To", "alice@example.com");
        headers.add("to", "bob@example.com");
        assert_eq!(headers.get_all("TO").len(), 2);
        assert_eq!(headers.get("To"), Some("alice@example.com"));

        headers.set("to", "charlie@example.com");
        assert_eq!(headers.get_all("To"), ["charlie@example.com".to_string()]);
    }

    #[test]
    fn set_default_only_fills_empty() {
        let mut headers = Headers::new();
        headers.set_default("Content-Type", "image/png");
        assert_eq!(headers.get("content-type"), Some("image/png"));

        headers.set_default("Content-Type", "text/plain");
        assert_eq!(headers.get("content-type"), Some("image/png"));

        headers.set("Subject", "");
        headers.set_default("subject", "filled");
        assert_eq!(headers.get("subject"), Some("filled"));
    }

    #[test]
    fn remove_drops_all_values() {
        let mut headers = Headers::new();
        headers.add("Subject", "a");
        headers.add("Subject", "b");
        headers.remove("subject");
        assert!(headers.get("Subject").is_none());
        assert!(headers.get_all("Subject").is_empty());
        assert!(headers.is_empty());
    }

    #[test]
    fn display_is_sorted_and_canonical() {
        let headers: Headers = [
            ("to", "b@x.com"),
            ("subject", "Hi"),
            ("from", "a@x.com"),
            ("cc", "c@x.com"),
            ("to", "d@x.com"),
        ]
        .into_iter()
        .collect();

        assert_eq!(
            headers.to_string(),
            "Cc: c@x.com\r\nFrom: a@x.com\r\nSubject: Hi\r\nTo: b@x.com\r\nTo: d@x.com\r\n"
        );
        assert_eq!(headers.keys().collect::<Vec<_>>(), ["Cc", "From", "Subject", "To"]);
        assert_eq!(headers.len(), 4);
    }
}
