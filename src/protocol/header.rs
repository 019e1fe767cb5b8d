//! Typed OBEX headers and the header codec.
//!
//! Two on-wire layouts exist:
//! ```text
//! Variable-length                     Fixed-length (ConnectionId)
//! ┌────┬───────────┬──────────┐       ┌──────┬───────────┐
//! │ HI │ Length    │ Payload  │       │ 0xCB │ Value     │
//! │ 1B │ uint16 BE │ Length-3 │       │ 1B   │ uint32 BE │
//! └────┴───────────┴──────────┘       └──────┴───────────┘
//! ```
//!
//! The length field of a variable-length header covers the identifier byte,
//! the length field itself and the payload.
//!
//! # Example
//!
//! ```
//! use obex_pbap::protocol::{decode_next, encode_fixed, Cursor, HeaderId};
//! use bytes::Bytes;
//!
//! let wire = Bytes::from(encode_fixed(HeaderId::ConnectionId, 0x42).unwrap());
//! assert_eq!(&wire[..], &[0xCB, 0x00, 0x00, 0x00, 0x42]);
//!
//! let (header, cursor) = decode_next(&wire, Cursor::start()).unwrap();
//! assert_eq!(header.as_connection_id(), Some(0x42));
//! assert!(cursor.is_at_end(&wire));
//! ```

use bytes::{BufMut, Bytes, BytesMut};

use super::wire_format::VARIABLE_HEADER_PREFIX_SIZE;
use crate::codec::{AsciiCodec, UnicodeCodec};
use crate::error::{EncodingError, ParseError};

/// Largest payload a variable-length header can carry.
pub const MAX_VARIABLE_PAYLOAD: usize = u16::MAX as usize - VARIABLE_HEADER_PREFIX_SIZE;

/// Header identifier (HI).
///
/// The upper two bits of the raw byte select the header encoding; see
/// [`HeaderId::layout`]. Bytes outside the recognised set are kept as
/// `Unknown` so they can still be length-validated and skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeaderId {
    /// Extended application request and response information.
    ApplicationParameters,
    /// Authentication digest response.
    AuthResponse,
    /// A chunk of the object body.
    Body,
    /// Connection multiplexing identifier.
    ConnectionId,
    /// The final chunk of the object body.
    EndOfBody,
    /// Object name, UTF-16BE.
    Name,
    /// Service the operation is aimed at.
    Target,
    /// Object type, ASCII.
    Type,
    /// Identifies the peer application.
    Who,
    /// Any other identifier.
    Unknown(u8),
}

/// How a header's payload is delimited on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderLayout {
    /// Exactly this many payload bytes follow the identifier.
    Fixed(usize),
    /// A 16-bit total length follows the identifier.
    Variable,
}

impl HeaderId {
    /// Raw identifier byte.
    pub fn as_u8(self) -> u8 {
        match self {
            Self::ApplicationParameters => 0x4C,
            Self::AuthResponse => 0x4E,
            Self::Body => 0x48,
            Self::ConnectionId => 0xCB,
            Self::EndOfBody => 0x49,
            Self::Name => 0x01,
            Self::Target => 0x46,
            Self::Type => 0x42,
            Self::Who => 0x4A,
            Self::Unknown(id) => id,
        }
    }

    /// Wire layout of this header.
    ///
    /// Bits 7-6 of the identifier: `00` Unicode text and `01` byte sequence
    /// are length-prefixed, `10` is a 1-byte value, `11` a 4-byte value.
    pub fn layout(self) -> HeaderLayout {
        match self {
            Self::ConnectionId => HeaderLayout::Fixed(4),
            Self::Unknown(id) => match id & 0xC0 {
                0x80 => HeaderLayout::Fixed(1),
                0xC0 => HeaderLayout::Fixed(4),
                _ => HeaderLayout::Variable,
            },
            _ => HeaderLayout::Variable,
        }
    }

    /// Check if this header carries object body data.
    #[inline]
    pub fn is_body(self) -> bool {
        matches!(self, Self::Body | Self::EndOfBody)
    }
}

impl From<u8> for HeaderId {
    fn from(id: u8) -> Self {
        match id {
            0x4C => Self::ApplicationParameters,
            0x4E => Self::AuthResponse,
            0x48 => Self::Body,
            0xCB => Self::ConnectionId,
            0x49 => Self::EndOfBody,
            0x01 => Self::Name,
            0x46 => Self::Target,
            0x42 => Self::Type,
            0x4A => Self::Who,
            other => Self::Unknown(other),
        }
    }
}

impl From<HeaderId> for u8 {
    fn from(id: HeaderId) -> u8 {
        id.as_u8()
    }
}

/// Read position inside a packet's header area.
///
/// Passed by value into [`decode_next`] and handed back advanced, so the
/// position is never shared between callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cursor(usize);

impl Cursor {
    /// Cursor at the start of a buffer.
    #[inline]
    pub fn start() -> Self {
        Self(0)
    }

    /// Cursor at an arbitrary offset.
    #[inline]
    pub fn at(position: usize) -> Self {
        Self(position)
    }

    /// Current byte offset.
    #[inline]
    pub fn position(self) -> usize {
        self.0
    }

    /// Bytes left in `buf` after this cursor.
    #[inline]
    pub fn remaining(self, buf: &[u8]) -> usize {
        buf.len().saturating_sub(self.0)
    }

    /// Check if every byte of `buf` has been consumed.
    #[inline]
    pub fn is_at_end(self, buf: &[u8]) -> bool {
        self.remaining(buf) == 0
    }
}

/// A single decoded or to-be-encoded header.
///
/// Fixed-layout headers always hold exactly their fixed payload size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    id: HeaderId,
    payload: Bytes,
}

impl Header {
    /// Create a header from an identifier and raw payload.
    ///
    /// # Errors
    ///
    /// - [`EncodingError::LayoutMismatch`] if a fixed-layout payload has the
    ///   wrong size.
    /// - [`EncodingError::PayloadTooLarge`] if a variable payload does not fit
    ///   the 16-bit length field.
    pub fn new(id: HeaderId, payload: impl Into<Bytes>) -> Result<Self, EncodingError> {
        let payload = payload.into();
        match id.layout() {
            HeaderLayout::Fixed(size) if payload.len() != size => {
                Err(EncodingError::LayoutMismatch { id: id.as_u8() })
            }
            HeaderLayout::Variable if payload.len() > MAX_VARIABLE_PAYLOAD => {
                Err(EncodingError::PayloadTooLarge {
                    id: id.as_u8(),
                    len: payload.len(),
                })
            }
            _ => Ok(Self { id, payload }),
        }
    }

    /// `ConnectionId` header.
    pub fn connection_id(value: u32) -> Self {
        Self {
            id: HeaderId::ConnectionId,
            payload: Bytes::copy_from_slice(&value.to_be_bytes()),
        }
    }

    /// `Name` header, UTF-16BE with null terminator.
    pub fn name(text: &str) -> Result<Self, EncodingError> {
        Self::new(HeaderId::Name, UnicodeCodec::encode(text))
    }

    /// `Type` header, ASCII with null terminator.
    pub fn mime_type(text: &str) -> Result<Self, EncodingError> {
        Self::new(HeaderId::Type, AsciiCodec::encode(text)?)
    }

    /// `Target` header.
    pub fn target(value: impl Into<Bytes>) -> Result<Self, EncodingError> {
        Self::new(HeaderId::Target, value)
    }

    /// `ApplicationParameters` header.
    pub fn application_parameters(value: impl Into<Bytes>) -> Result<Self, EncodingError> {
        Self::new(HeaderId::ApplicationParameters, value)
    }

    /// `Body` header.
    pub fn body(value: impl Into<Bytes>) -> Result<Self, EncodingError> {
        Self::new(HeaderId::Body, value)
    }

    /// `EndOfBody` header.
    pub fn end_of_body(value: impl Into<Bytes>) -> Result<Self, EncodingError> {
        Self::new(HeaderId::EndOfBody, value)
    }

    /// `Who` header.
    pub fn who(value: impl Into<Bytes>) -> Result<Self, EncodingError> {
        Self::new(HeaderId::Who, value)
    }

    #[inline]
    pub fn id(&self) -> HeaderId {
        self.id
    }

    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Payload as `Bytes` (cheap, zero-copy).
    #[inline]
    pub fn payload_bytes(&self) -> Bytes {
        self.payload.clone()
    }

    /// Value of a 4-byte fixed header.
    pub fn as_u32(&self) -> Option<u32> {
        match self.id.layout() {
            HeaderLayout::Fixed(4) => {
                let raw: [u8; 4] = self.payload[..].try_into().ok()?;
                Some(u32::from_be_bytes(raw))
            }
            _ => None,
        }
    }

    /// Value of a `ConnectionId` header.
    pub fn as_connection_id(&self) -> Option<u32> {
        if self.id == HeaderId::ConnectionId {
            self.as_u32()
        } else {
            None
        }
    }

    /// Number of bytes this header occupies on the wire.
    pub fn encoded_len(&self) -> usize {
        match self.id.layout() {
            HeaderLayout::Fixed(size) => 1 + size,
            HeaderLayout::Variable => VARIABLE_HEADER_PREFIX_SIZE + self.payload.len(),
        }
    }

    /// Append the wire form of this header to `buf`.
    pub fn encode_into(&self, buf: &mut BytesMut) -> Result<(), EncodingError> {
        buf.reserve(self.encoded_len());
        buf.put_u8(self.id.as_u8());
        if self.id.layout() == HeaderLayout::Variable {
            let length = u16::try_from(self.encoded_len()).map_err(|_| {
                EncodingError::PayloadTooLarge {
                    id: self.id.as_u8(),
                    len: self.payload.len(),
                }
            })?;
            buf.put_u16(length);
        }
        buf.put_slice(&self.payload);
        Ok(())
    }

    /// Encode this header into a fresh buffer.
    pub fn encode(&self) -> Result<Bytes, EncodingError> {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        self.encode_into(&mut buf)?;
        Ok(buf.freeze())
    }
}

/// Encode a fixed-length 4-byte header: `[id][u32 BE value]`.
///
/// # Errors
///
/// Returns [`EncodingError::LayoutMismatch`] if `id` is not a 4-byte header.
pub fn encode_fixed(id: HeaderId, value: u32) -> Result<Bytes, EncodingError> {
    if id.layout() != HeaderLayout::Fixed(4) {
        return Err(EncodingError::LayoutMismatch { id: id.as_u8() });
    }
    Header::new(id, Bytes::copy_from_slice(&value.to_be_bytes()))?.encode()
}

/// Encode a length-prefixed header: `[id][u16 BE payload.len()+3][payload]`.
///
/// # Errors
///
/// - [`EncodingError::PayloadTooLarge`] if `payload.len() + 3 > u16::MAX`.
/// - [`EncodingError::LayoutMismatch`] if `id` is a fixed-length header.
pub fn encode_variable(id: HeaderId, payload: &[u8]) -> Result<Bytes, EncodingError> {
    if id.layout() != HeaderLayout::Variable {
        return Err(EncodingError::LayoutMismatch { id: id.as_u8() });
    }
    Header::new(id, Bytes::copy_from_slice(payload))?.encode()
}

/// Decode one header starting at `cursor`.
///
/// Returns the header together with the cursor moved past exactly the bytes
/// it occupied. Never reads beyond the header it decodes.
///
/// # Errors
///
/// - [`ParseError::HeaderLengthUnderflow`] if a length field is below 3.
/// - [`ParseError::Truncated`] if `buf` ends inside the header.
pub fn decode_next(buf: &Bytes, cursor: Cursor) -> Result<(Header, Cursor), ParseError> {
    let start = cursor.position();
    let available = cursor.remaining(buf);
    if available == 0 {
        return Err(ParseError::Truncated {
            needed: 1,
            available,
        });
    }

    let id = HeaderId::from(buf[start]);
    let (payload_start, payload_len) = match id.layout() {
        HeaderLayout::Fixed(size) => (start + 1, size),
        HeaderLayout::Variable => {
            if available < VARIABLE_HEADER_PREFIX_SIZE {
                return Err(ParseError::Truncated {
                    needed: VARIABLE_HEADER_PREFIX_SIZE,
                    available,
                });
            }
            let length = u16::from_be_bytes([buf[start + 1], buf[start + 2]]);
            let payload_len = usize::from(length)
                .checked_sub(VARIABLE_HEADER_PREFIX_SIZE)
                .ok_or(ParseError::HeaderLengthUnderflow {
                    id: id.as_u8(),
                    length,
                })?;
            (start + VARIABLE_HEADER_PREFIX_SIZE, payload_len)
        }
    };

    let end = payload_start + payload_len;
    if end > buf.len() {
        return Err(ParseError::Truncated {
            needed: end - start,
            available,
        });
    }

    tracing::trace!(
        "Decoded header 0x{:02X} ({} payload bytes)",
        id.as_u8(),
        payload_len
    );

    let header = Header {
        id,
        payload: buf.slice(payload_start..end),
    };
    Ok((header, Cursor::at(end)))
}

/// Decode every header in `buf`, in order, consuming it completely.
pub fn decode_all(buf: &Bytes) -> Result<Vec<Header>, ParseError> {
    let mut headers = Vec::new();
    let mut cursor = Cursor::start();
    while !cursor.is_at_end(buf) {
        let (header, next) = decode_next(buf, cursor)?;
        headers.push(header);
        cursor = next;
    }
    Ok(headers)
}
