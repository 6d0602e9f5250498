//! Transfer encodings for message parts.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Maximum encoded line length (RFC 2045 section 6.8).
pub const MAX_LINE_LENGTH: usize = 76;

/// Encodes data as Base64 on a single line.
#[must_use]
pub fn encode_base64(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Encodes data as Base64 broken into CRLF-terminated lines of at most
/// [`MAX_LINE_LENGTH`] characters.
///
/// Empty input yields an empty string.
#[must_use]
pub fn encode_base64_wrapped(data: &[u8]) -> String {
    let encoded = STANDARD.encode(data);
    let mut result = String::with_capacity(encoded.len() + encoded.len() / MAX_LINE_LENGTH * 2 + 2);

    let mut rest = encoded.as_str();
    while !rest.is_empty() {
        // Base64 output is ASCII, so byte offsets are char boundaries.
        let (line, tail) = rest.split_at(rest.len().min(MAX_LINE_LENGTH));
        result.push_str(line);
        result.push_str("\r\n");
        rest = tail;
    }

    result
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn base64_single_line() {
        assert_eq!(encode_base64(b"Hello, World!"), "SGVsbG8sIFdvcmxkIQ==");
        assert_eq!(encode_base64(b""), "");
    }

    #[test]
    fn wrapped_short_input() {
        assert_eq!(encode_base64_wrapped(b"abc"), "YWJj\r\n");
        assert_eq!(encode_base64_wrapped(b""), "");
    }

    #[test]
    fn wrapped_exact_boundary() {
        // 57 input bytes encode to exactly 76 characters.
        let wrapped = encode_base64_wrapped(&[0u8; 57]);
        assert_eq!(wrapped.len(), 78);
        assert!(wrapped.ends_with("\r\n"));
        assert_eq!(wrapped.matches("\r\n").count(), 1);
    }

    proptest! {
        #[test]
        fn wrapped_lines_fit_and_concatenate(data in proptest::collection::vec(any::<u8>(), 0..600)) {
            let wrapped = encode_base64_wrapped(&data);
            let lines: Vec<&str> = wrapped.split_terminator("\r\n").collect();
            prop_assert!(lines.iter().all(|l| !l.is_empty() && l.len() <= MAX_LINE_LENGTH));
            prop_assert_eq!(lines.concat(), encode_base64(&data));
        }
    }
}
