//! Latin-1 string rules shared by the encoder and the size calculator
//!
//! File strings are Latin-1 on the wire. The short-string payload rule lives
//! here as a single function so the encoder and the size calculator cannot
//! drift apart on truncation behavior.

use smallvec::SmallVec;

/// Maximum content bytes in a short string, excluding the terminator.
pub const SHORT_STRING_MAX_CONTENT: usize = 254;

/// Encode text as Latin-1. Code points above U+00FF become `'?'`.
pub fn to_latin1(s: &str) -> Vec<u8> {
    s.chars()
        .map(|c| {
            let cp = c as u32;
            if cp <= 0xFF {
                cp as u8
            } else {
                b'?'
            }
        })
        .collect()
}

/// Encoded Latin-1 length of `s` without allocating: one byte per char.
pub fn latin1_len(s: &str) -> usize {
    s.chars().count()
}

/// Decode Latin-1 bytes to text. Every byte maps to the same code point.
pub fn from_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// The wire payload of a short string: content truncated at the first NUL
/// and at [`SHORT_STRING_MAX_CONTENT`] bytes, then exactly one terminator.
///
/// The one-byte length prefix is not included; the caller writes
/// `payload.len() as u8` followed by the payload.
pub fn short_string_payload(s: &str) -> SmallVec<[u8; 256]> {
    let mut bytes: SmallVec<[u8; 256]> = to_latin1(s).into_iter().collect();
    if let Some(nul) = bytes.iter().position(|&b| b == 0) {
        bytes.truncate(nul);
    }
    bytes.truncate(SHORT_STRING_MAX_CONTENT);
    bytes.push(0);
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_latin1_byte_range_roundtrip() {
        let all: Vec<u8> = (0u8..=255).collect();
        assert_eq!(to_latin1(&from_latin1(&all)), all);
    }

    #[test]
    fn test_latin1_replaces_wide_chars() {
        assert_eq!(to_latin1("a\u{2603}b"), b"a?b");
    }

    #[test]
    fn test_short_string_payload_appends_terminator() {
        assert_eq!(short_string_payload("abc").as_slice(), b"abc\0");
        assert_eq!(short_string_payload("").as_slice(), b"\0");
    }

    #[test]
    fn test_short_string_payload_truncates_at_embedded_nul() {
        assert_eq!(short_string_payload("ab\0cd").as_slice(), b"ab\0");
    }

    #[test]
    fn test_short_string_payload_caps_content() {
        let long = "a".repeat(300);
        let payload = short_string_payload(&long);
        assert_eq!(payload.len(), SHORT_STRING_MAX_CONTENT + 1);
        assert_eq!(payload[SHORT_STRING_MAX_CONTENT], 0);
    }

    proptest! {
        #[test]
        fn prop_latin1_len_matches_encoding(s in ".*") {
            prop_assert_eq!(latin1_len(&s), to_latin1(&s).len());
        }

        #[test]
        fn prop_short_string_payload_bounds(s in ".*") {
            let payload = short_string_payload(&s);
            prop_assert!(payload.len() >= 1);
            prop_assert!(payload.len() <= SHORT_STRING_MAX_CONTENT + 1);
            prop_assert_eq!(*payload.last().unwrap(), 0);
            // Exactly one terminator.
            prop_assert_eq!(payload.iter().filter(|&&b| b == 0).count(), 1);
        }
    }
}
