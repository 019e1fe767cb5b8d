//! UTF-8 codec for phone-book body text.
//!
//! OBEX itself treats `Body` as opaque bytes; PBAP phone-book objects are
//! vCard text in UTF-8. Body chunks may split a multi-byte character, so
//! callers should decode the concatenated body, not each chunk.

use crate::error::ParseError;

/// Codec for UTF-8 body text.
pub struct Utf8Codec;

impl Utf8Codec {
    /// Decode a complete body.
    pub fn decode(bytes: &[u8]) -> Result<String, ParseError> {
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|e| ParseError::InvalidText {
                encoding: "UTF-8",
                reason: e.to_string(),
            })
    }

    /// Decode a chunk for display, replacing invalid sequences.
    #[inline]
    pub fn decode_lossy(bytes: &[u8]) -> String {
        String::from_utf8_lossy(bytes).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_vcard() {
        let raw = b"BEGIN:VCARD\r\nFN:Zo\xC3\xAB\r\nEND:VCARD\r\n";
        let text = Utf8Codec::decode(raw).unwrap();
        assert!(text.contains("FN:Zoë"));
    }

    #[test]
    fn test_decode_split_character_is_error() {
        // first half of "ë"
        let err = Utf8Codec::decode(b"Zo\xC3").unwrap_err();
        assert!(matches!(err, ParseError::InvalidText { encoding: "UTF-8", .. }));
    }

    #[test]
    fn test_decode_lossy_never_fails() {
        assert_eq!(Utf8Codec::decode_lossy(b"Zo\xC3"), "Zo\u{FFFD}");
    }
}
