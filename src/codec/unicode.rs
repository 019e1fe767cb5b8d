//! Unicode codec - null-terminated UTF-16 Big Endian text.
//!
//! OBEX carries `Name` (and other Unicode-class headers) as UTF-16BE code
//! units followed by a two-byte null terminator.
//!
//! # Example
//!
//! ```
//! use obex_pbap::codec::UnicodeCodec;
//!
//! let encoded = UnicodeCodec::encode("pb");
//! assert_eq!(&encoded[..], &[0x00, b'p', 0x00, b'b', 0x00, 0x00]);
//! assert_eq!(UnicodeCodec::decode(&encoded).unwrap(), "pb");
//! ```

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::ParseError;

const ENCODING: &str = "UTF-16BE";

/// Codec for null-terminated UTF-16BE text.
pub struct UnicodeCodec;

impl UnicodeCodec {
    /// Encoded size of `text` in bytes, terminator included.
    #[inline]
    pub fn encoded_len(text: &str) -> usize {
        (text.encode_utf16().count() + 1) * 2
    }

    /// Encode text as UTF-16BE followed by `00 00`.
    pub fn encode(text: &str) -> Bytes {
        let mut buf = BytesMut::with_capacity(Self::encoded_len(text));
        for unit in text.encode_utf16() {
            buf.put_u16(unit);
        }
        buf.put_u16(0);
        buf.freeze()
    }

    /// Decode UTF-16BE text, stripping the trailing null terminator.
    ///
    /// An empty payload decodes to an empty string; some peers send an empty
    /// `Name` header without a terminator.
    pub fn decode(bytes: &[u8]) -> Result<String, ParseError> {
        if bytes.len() % 2 != 0 {
            return Err(ParseError::InvalidText {
                encoding: ENCODING,
                reason: format!("odd byte length {}", bytes.len()),
            });
        }

        let mut units: Vec<u16> = bytes
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        if units.last() == Some(&0) {
            units.pop();
        }

        String::from_utf16(&units).map_err(|e| ParseError::InvalidText {
            encoding: ENCODING,
            reason: e.to_string(),
        })
    }
}
