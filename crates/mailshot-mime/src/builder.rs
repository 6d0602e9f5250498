//! Wire serialization of a [`Message`].

use crate::content_type::ContentType;
use crate::encoding::encode_base64_wrapped;
use crate::header::Headers;
use crate::message::{Attachment, Message};

const BOUNDARY_LENGTH: usize = 40;

fn make_boundary() -> String {
    std::iter::repeat_with(fastrand::alphanumeric)
        .take(BOUNDARY_LENGTH)
        .collect()
}

/// Sniffs a MIME type from content bytes.
fn sniff(data: &[u8]) -> &'static str {
    if data.is_empty() {
        "text/plain"
    } else {
        tree_magic_mini::from_u8(data)
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

/// Serializes messages to RFC 5322 / RFC 2046 bytes.
///
/// Message-level headers are written in sorted canonical order. Without
/// attachments the body follows as a single `text/plain` entity; with
/// attachments the message becomes `multipart/mixed` with the body as the
/// first part and one base64 part per attachment.
///
/// A message-level `Content-Type` set by the caller is never written twice:
/// it replaces the `text/plain` default of a single-part message, or becomes
/// the body part's type of a multipart one.
#[derive(Debug, Clone, Default)]
pub struct MessageBuilder {
    boundary: Option<String>,
}

impl MessageBuilder {
    /// Creates a builder that generates a random boundary per message.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses a fixed boundary unless it occurs inside one of the parts.
    #[must_use]
    pub fn with_boundary(mut self, boundary: impl Into<String>) -> Self {
        self.boundary = Some(boundary.into());
        self
    }

    /// Serializes the message. The message itself is not modified.
    #[must_use]
    pub fn build(&self, message: &Message) -> Vec<u8> {
        let mut out = Vec::new();
        for (name, value) in message.headers.iter() {
            if name != "Content-Type" {
                push_field(&mut out, name, value);
            }
        }

        let user_type = message
            .header("Content-Type")
            .filter(|v| !v.is_empty());

        if message.attachments().is_empty() {
            let content_type = user_type.map_or_else(
                || ContentType::text_plain().to_string(),
                str::to_string,
            );
            push_field(&mut out, "Content-Type", &content_type);
            out.extend_from_slice(b"\r\n");
            out.extend_from_slice(message.body.as_bytes());
            return out;
        }

        let mut parts = Vec::with_capacity(message.attachments().len() + 1);
        parts.push(body_part(message, user_type));
        parts.extend(message.attachments().iter().map(attachment_part));

        let boundary = self.boundary_for(&parts);
        push_field(
            &mut out,
            "Content-Type",
            &ContentType::multipart_mixed(boundary.as_str()).to_string(),
        );
        out.extend_from_slice(b"\r\n");

        for (i, part) in parts.iter().enumerate() {
            if i > 0 {
                out.extend_from_slice(b"\r\n");
            }
            out.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
            out.extend_from_slice(part);
        }
        out.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

        out
    }

    fn boundary_for(&self, parts: &[Vec<u8>]) -> String {
        let collides = |b: &str| parts.iter().any(|p| contains(p, b.as_bytes()));

        if let Some(fixed) = self.boundary.as_deref().filter(|b| !b.is_empty() && !collides(b)) {
            return fixed.to_string();
        }
        loop {
            let candidate = make_boundary();
            if !collides(&candidate) {
                return candidate;
            }
        }
    }
}

fn push_field(out: &mut Vec<u8>, name: &str, value: &str) {
    out.extend_from_slice(format!("{name}: {value}\r\n").as_bytes());
}

fn body_part(message: &Message, user_type: Option<&str>) -> Vec<u8> {
    let content_type = user_type.map_or_else(
        || {
            ContentType::parse(sniff(message.body.as_bytes()))
                .unwrap_or_else(|_| ContentType::new("text", "plain"))
                .with_parameter("charset", "utf-8")
                .to_string()
        },
        str::to_string,
    );

    let mut headers = Headers::new();
    headers.set("Content-Type", content_type);

    let mut part = format!("{headers}\r\n").into_bytes();
    part.extend_from_slice(message.body.as_bytes());
    part
}

fn attachment_part(attachment: &Attachment) -> Vec<u8> {
    let mut headers = attachment.headers.clone();
    headers.set_default("Content-Type", sniff(&attachment.content));
    headers.set_default("Content-Transfer-Encoding", "base64");
    headers.set_default(
        "Content-Disposition",
        format!("attachment; filename=\"{}\"", attachment.name),
    );

    let encoded = encode_base64_wrapped(&attachment.content);
    format!("{headers}\r\n{encoded}").into_bytes()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::needless_collect)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const BOUNDARY: &str = "XyZ0123456789abcdefghijklmnopqrstuvwxyzA";

    fn render(message: &Message) -> String {
        String::from_utf8(MessageBuilder::new().with_boundary(BOUNDARY).build(message)).unwrap()
    }

    fn simple() -> Message {
        let mut message = Message::new();
        message.set_header("to", "b@x.com");
        message.set_header("from", "a@x.com");
        message.set_header("subject", "Hello");
        message.body = "Hi there\r\n".to_string();
        message
    }

    #[test]
    fn single_part_layout() {
        let wire = render(&simple());
        assert_eq!(
            wire,
            "From: a@x.com\r\nSubject: Hello\r\nTo: b@x.com\r\n\
             Content-Type: text/plain; charset=utf-8\r\n\r\nHi there\r\n"
        );
        assert_eq!(wire.matches("Content-Type:").count(), 1);
    }

    #[test]
    fn single_part_user_content_type_replaces_default() {
        let mut message = simple();
        message.set_header("content-type", "text/html; charset=utf-8");
        let wire = render(&message);
        assert_eq!(wire.matches("Content-Type:").count(), 1);
        assert!(wire.contains("Content-Type: text/html; charset=utf-8\r\n\r\nHi there"));
    }

    #[test]
    fn multipart_layout() {
        let mut message = simple();
        message.attach(Attachment::new("a.txt", b"alpha".to_vec(), Headers::new()));
        let wire = render(&message);

        let expected = format!(
            "From: a@x.com\r\nSubject: Hello\r\nTo: b@x.com\r\n\
             Content-Type: multipart/mixed; boundary=\"{BOUNDARY}\"\r\n\r\n\
             --{BOUNDARY}\r\nContent-Type: text/plain; charset=utf-8\r\n\r\nHi there\r\n\
             \r\n--{BOUNDARY}\r\n\
             Content-Disposition: attachment; filename=\"a.txt\"\r\n\
             Content-Transfer-Encoding: base64\r\n\
             Content-Type: text/plain\r\n\r\nYWxwaGE=\r\n\
             \r\n--{BOUNDARY}--\r\n"
        );
        assert_eq!(wire, expected);
    }

    #[test]
    fn n_attachments_give_n_plus_one_parts() {
        let mut message = simple();
        for i in 0..3 {
            message.attach(Attachment::new(format!("f{i}.bin"), vec![0, 1, 2, i], Headers::new()));
        }
        let wire = render(&message);

        assert_eq!(wire.matches(&format!("--{BOUNDARY}\r\n")).count(), 4);
        assert_eq!(wire.matches(&format!("--{BOUNDARY}--\r\n")).count(), 1);
        assert!(wire.ends_with(&format!("--{BOUNDARY}--\r\n")));
    }

    #[test]
    fn attachment_headers_only_defaulted_when_unset() {
        let mut headers = Headers::new();
        headers.set("content-type", "application/x-custom");
        headers.set("content-disposition", "inline");

        let mut message = simple();
        message.attach(Attachment::new("data.bin", b"\x89PNG\r\n\x1a\n".to_vec(), headers));
        let wire = render(&message);

        assert!(wire.contains("Content-Type: application/x-custom\r\n"));
        assert!(wire.contains("Content-Disposition: inline\r\n"));
        assert!(!wire.contains("filename=\"data.bin\""));
        assert!(wire.contains("Content-Transfer-Encoding: base64\r\n"));
    }

    #[test]
    fn attachment_type_sniffed() {
        let png = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR\0\0\0\x01\0\0\0\x01\x08\x06\0\0\0\x1f\x15\xc4\x89";
        let mut message = simple();
        message.attach(Attachment::new("pixel.png", png.to_vec(), Headers::new()));
        let wire = render(&message);
        assert!(wire.contains("Content-Type: image/png\r\n"), "{wire}");
    }

    #[test]
    fn multipart_user_content_type_moves_to_body_part() {
        let mut message = simple();
        message.set_header("Content-Type", "text/html; charset=utf-8");
        message.attach(Attachment::new("a.txt", b"alpha".to_vec(), Headers::new()));
        let wire = render(&message);

        assert!(wire.contains(&format!(
            "--{BOUNDARY}\r\nContent-Type: text/html; charset=utf-8\r\n\r\nHi there"
        )));
        assert_eq!(wire.matches("multipart/mixed").count(), 1);
    }

    #[test]
    fn base64_is_wrapped() {
        let mut message = simple();
        message.attach(Attachment::new("big.bin", vec![0xAB; 500], Headers::new()));
        let wire = render(&message);
        let (_, part) = wire.split_once("filename=\"big.bin\"\r\n").unwrap();
        let (_, encoded) = part.split_once("\r\n\r\n").unwrap();
        let lines: Vec<&str> = encoded.split("\r\n").take_while(|l| !l.is_empty()).collect();
        assert_eq!(lines.concat().len(), 668);
        assert!(lines.iter().all(|l| l.len() <= 76));
        assert!(lines.len() > 1);
    }

    #[test]
    fn build_does_not_modify_message() {
        let mut message = simple();
        message.attach(Attachment::new("a.txt", b"alpha".to_vec(), Headers::new()));
        let before = message.clone();
        let _ = MessageBuilder::new().build(&message);
        assert_eq!(message, before);
        assert!(message.attachments()[0].headers.is_empty());
    }

    #[test]
    fn generated_boundary_shape() {
        let mut message = simple();
        message.attach(Attachment::new("a.txt", b"alpha".to_vec(), Headers::new()));
        let wire = String::from_utf8(message.to_bytes()).unwrap();

        let start = wire.find("boundary=\"").unwrap() + "boundary=\"".len();
        let boundary = &wire[start..start + BOUNDARY_LENGTH];
        assert!(boundary.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_eq!(wire.as_bytes()[start + BOUNDARY_LENGTH], b'"');
    }

    #[test]
    fn colliding_fixed_boundary_is_replaced() {
        let mut message = simple();
        message.body = format!("--{BOUNDARY}\r\n");
        message.attach(Attachment::new("a.txt", b"alpha".to_vec(), Headers::new()));
        let wire = render(&message);
        assert!(!wire.contains(&format!("boundary=\"{BOUNDARY}\"")));
    }

    proptest! {
        #[test]
        fn headers_emitted_sorted(fields in proptest::collection::vec(
            ("[a-z]{1,6}(-[a-z]{1,6})?", "[a-zA-Z0-9 ]{0,10}"),
            1..12,
        )) {
            let mut message = Message::new();
            for (name, value) in &fields {
                if name != "content-type" {
                    message.add_header(name, value.clone());
                }
            }
            let wire = String::from_utf8(MessageBuilder::new().build(&message)).unwrap();
            let head = wire.split("\r\n\r\n").next().unwrap();
            let names: Vec<&str> = head
                .split("\r\n")
                .filter_map(|line| line.split_once(": ").map(|(n, _)| n))
                .filter(|n| *n != "Content-Type")
                .collect();
            let mut sorted = names.clone();
            sorted.sort_unstable();
            prop_assert_eq!(names, sorted);
        }
    }
}
