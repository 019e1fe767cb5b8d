//! ASCII codec - null-terminated byte text.
//!
//! Used for the `Type` header (`x-bt/phonebook`), which OBEX carries as a
//! byte sequence with a single `00` terminator.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{EncodingError, ParseError};

/// Codec for null-terminated ASCII text.
pub struct AsciiCodec;

impl AsciiCodec {
    /// Encode ASCII text followed by a single `00`.
    ///
    /// # Errors
    ///
    /// Returns [`EncodingError::NonAsciiText`] if `text` is not pure ASCII.
    pub fn encode(text: &str) -> Result<Bytes, EncodingError> {
        if !text.is_ascii() {
            return Err(EncodingError::NonAsciiText {
                text: text.to_string(),
            });
        }

        let mut buf = BytesMut::with_capacity(text.len() + 1);
        buf.put_slice(text.as_bytes());
        buf.put_u8(0);
        Ok(buf.freeze())
    }

    /// Decode ASCII text, stripping the trailing null terminator if present.
    pub fn decode(bytes: &[u8]) -> Result<String, ParseError> {
        let text = match bytes.split_last() {
            Some((&0, rest)) => rest,
            _ => bytes,
        };
        if !text.is_ascii() {
            return Err(ParseError::InvalidText {
                encoding: "ASCII",
                reason: "byte outside 0x00..=0x7F".to_string(),
            });
        }
        // ASCII is valid UTF-8.
        Ok(String::from_utf8_lossy(text).into_owned())
    }
}
