//! Packet struct and packet codec.
//!
//! A packet is a 3-byte prefix (opcode, total length), an optional fixed
//! prelude, then headers until the declared length is consumed. The prelude
//! is only present on Connect requests and responses.
//!
//! # Example
//!
//! ```
//! use obex_pbap::protocol::{build_request, parse_packet, Header, OpCode};
//!
//! let bytes = build_request(OpCode::Disconnect, &[Header::connection_id(1)]).unwrap();
//! assert_eq!(&bytes[..], &[0x81, 0x00, 0x08, 0xCB, 0x00, 0x00, 0x00, 0x01]);
//!
//! let packet = parse_packet(bytes, 0).unwrap();
//! assert_eq!(packet.opcode(), 0x81);
//! assert_eq!(packet.connection_id(), Some(1));
//! ```

use bytes::{BufMut, Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncWrite};

use super::header::{decode_all, Header, HeaderId};
use super::wire_format::{ResponseCode, MAX_PACKET_SIZE, PACKET_PREFIX_SIZE};
use crate::error::{self, EncodingError, ParseError};
use crate::transport::Channel;

/// A complete decoded packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    opcode: u8,
    total_length: u16,
    prelude: Bytes,
    headers: Vec<Header>,
}

impl Packet {
    /// Raw opcode or response code byte.
    #[inline]
    pub fn opcode(&self) -> u8 {
        self.opcode
    }

    /// Opcode interpreted as a response status.
    #[inline]
    pub fn response_code(&self) -> ResponseCode {
        ResponseCode::from(self.opcode)
    }

    /// Declared packet length, prefix included.
    #[inline]
    pub fn total_length(&self) -> u16 {
        self.total_length
    }

    /// Operation-specific fixed fields.
    #[inline]
    pub fn prelude(&self) -> &[u8] {
        &self.prelude
    }

    /// Headers in wire order.
    #[inline]
    pub fn headers(&self) -> &[Header] {
        &self.headers
    }

    pub fn into_headers(self) -> Vec<Header> {
        self.headers
    }

    /// First header with the given id.
    pub fn find(&self, id: HeaderId) -> Option<&Header> {
        self.headers.iter().find(|h| h.id() == id)
    }

    /// Value of the first `ConnectionId` header, if any.
    pub fn connection_id(&self) -> Option<u32> {
        self.find(HeaderId::ConnectionId)
            .and_then(Header::as_connection_id)
    }
}

/// Build a request packet: `[opcode][u16 BE total][headers in order]`.
///
/// # Errors
///
/// - [`EncodingError::PacketTooLarge`] if the packet exceeds 65535 bytes.
/// - Any header encoding error.
pub fn build_request(opcode: impl Into<u8>, headers: &[Header]) -> Result<Bytes, EncodingError> {
    build_request_with_prelude(opcode, &[], headers)
}

/// Build a request packet with fixed fields between the length and headers.
pub fn build_request_with_prelude(
    opcode: impl Into<u8>,
    prelude: &[u8],
    headers: &[Header],
) -> Result<Bytes, EncodingError> {
    let total = PACKET_PREFIX_SIZE
        + prelude.len()
        + headers.iter().map(Header::encoded_len).sum::<usize>();
    let total_length = u16::try_from(total).map_err(|_| EncodingError::PacketTooLarge {
        len: total,
        max: MAX_PACKET_SIZE,
    })?;

    let opcode = opcode.into();
    let mut buf = BytesMut::with_capacity(total);
    buf.put_u8(opcode);
    buf.put_u16(total_length);
    buf.put_slice(prelude);
    for header in headers {
        header.encode_into(&mut buf)?;
    }
    debug_assert_eq!(buf.len(), total);

    Ok(buf.freeze())
}

/// Parse a complete packet held in memory.
///
/// `prelude_len` is the number of fixed bytes expected after the length
/// field (4 for a Connect response, 0 otherwise).
///
/// # Errors
///
/// - [`ParseError::Truncated`] if `bytes` is shorter than the 3-byte prefix.
/// - [`ParseError::MalformedLength`] if the declared length cannot hold the
///   prefix and prelude.
/// - [`ParseError::LengthMismatch`] if `bytes` is not exactly the declared
///   length.
/// - Any header decoding error.
pub fn parse_packet(bytes: Bytes, prelude_len: usize) -> Result<Packet, ParseError> {
    if bytes.len() < PACKET_PREFIX_SIZE {
        return Err(ParseError::Truncated {
            needed: PACKET_PREFIX_SIZE,
            available: bytes.len(),
        });
    }

    let opcode = bytes[0];
    let total_length = validate_length(u16::from_be_bytes([bytes[1], bytes[2]]), prelude_len)?;
    if bytes.len() != usize::from(total_length) {
        return Err(ParseError::LengthMismatch {
            declared: total_length,
            actual: bytes.len(),
        });
    }

    let headers_start = PACKET_PREFIX_SIZE + prelude_len;
    let prelude = bytes.slice(PACKET_PREFIX_SIZE..headers_start);
    let headers = decode_all(&bytes.slice(headers_start..))?;

    Ok(Packet {
        opcode,
        total_length,
        prelude,
        headers,
    })
}

/// Read one packet from the channel.
///
/// Reads the 3-byte prefix, then exactly the remaining declared bytes. A
/// channel that closes early yields [`crate::IoError::ChannelClosed`]; a
/// partial packet is never returned.
pub async fn read_packet<S>(channel: &mut Channel<S>, prelude_len: usize) -> error::Result<Packet>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let raw = read_raw_packet(channel).await?;
    let packet = parse_packet(raw, prelude_len)?;
    tracing::debug!(
        "Received packet 0x{:02X}, {} bytes, {} headers",
        packet.opcode,
        packet.total_length,
        packet.headers.len()
    );
    Ok(packet)
}

/// Read the bytes of one whole packet without decoding its headers.
///
/// Lets a caller inspect the opcode before choosing a prelude length; the
/// packet is consumed from the channel either way.
pub async fn read_raw_packet<S>(channel: &mut Channel<S>) -> error::Result<Bytes>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut buf = channel.recv_exact(PACKET_PREFIX_SIZE).await?;
    let total_length = validate_length(u16::from_be_bytes([buf[1], buf[2]]), 0)?;

    let rest = channel
        .recv_exact(usize::from(total_length) - PACKET_PREFIX_SIZE)
        .await?;
    buf.unsplit(rest);

    tracing::trace!("Read packet 0x{:02X}, {} bytes", buf[0], total_length);
    Ok(buf.freeze())
}

fn validate_length(length: u16, prelude_len: usize) -> Result<u16, ParseError> {
    let minimum = PACKET_PREFIX_SIZE + prelude_len;
    if usize::from(length) < minimum {
        return Err(ParseError::MalformedLength { length, minimum });
    }
    Ok(length)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{IoError, ObexError};
    use crate::protocol::OpCode;
    use tokio::io::AsyncWriteExt;

    #[test]
    fn test_build_request_empty() {
        let bytes = build_request(OpCode::GetFinal, &[]).unwrap();
        assert_eq!(&bytes[..], &[0x83, 0x00, 0x03]);
    }

    #[test]
    fn test_build_request_length_matches_buffer() {
        let headers = vec![
            Header::name("telecom/pb.vcf").unwrap(),
            Header::mime_type("x-bt/phonebook").unwrap(),
            Header::application_parameters(Bytes::new()).unwrap(),
            Header::connection_id(9),
        ];
        let bytes = build_request(OpCode::GetFinal, &headers).unwrap();
        let declared = u16::from_be_bytes([bytes[1], bytes[2]]) as usize;
        assert_eq!(declared, bytes.len());
        assert_eq!(bytes[0], 0x83);
        // ConnectionId last
        assert_eq!(&bytes[bytes.len() - 5..], &[0xCB, 0, 0, 0, 9]);
    }

    #[test]
    fn test_build_request_with_prelude() {
        let prelude = [0x10, 0x00, 0x0F, 0xA0];
        let target = Header::target(Bytes::from_static(&[0xAA; 16])).unwrap();
        let bytes = build_request_with_prelude(OpCode::Connect, &prelude, &[target]).unwrap();
        assert_eq!(bytes.len(), 3 + 4 + 3 + 16);
        assert_eq!(&bytes[..7], &[0x80, 0x00, 0x1A, 0x10, 0x00, 0x0F, 0xA0]);
        assert_eq!(&bytes[7..10], &[0x46, 0x00, 0x13]);
    }

    #[test]
    fn test_build_request_too_large() {
        let body = Header::body(vec![0u8; 40_000]).unwrap();
        let err = build_request(OpCode::Get, &[body.clone(), body]).unwrap_err();
        assert!(matches!(
            err,
            EncodingError::PacketTooLarge {
                len: 80_009,
                max: MAX_PACKET_SIZE
            }
        ));
    }

    #[test]
    fn test_parse_packet_roundtrip() {
        let headers = vec![Header::body(Bytes::from_static(b"BEGIN")).unwrap()];
        let bytes = build_request(0x90u8, &headers).unwrap();
        let packet = parse_packet(bytes, 0).unwrap();
        assert_eq!(packet.response_code(), ResponseCode::Continue);
        assert_eq!(packet.total_length(), 11);
        assert!(packet.prelude().is_empty());
        assert_eq!(packet.headers(), &headers[..]);
    }

    #[test]
    fn test_parse_packet_with_prelude() {
        let bytes = Bytes::from_static(&[
            0xA0, 0x00, 0x0C, 0x10, 0x00, 0x04, 0x00, 0xCB, 0x00, 0x00, 0x00, 0x01,
        ]);
        let packet = parse_packet(bytes, 4).unwrap();
        assert_eq!(packet.prelude(), &[0x10, 0x00, 0x04, 0x00]);
        assert_eq!(packet.connection_id(), Some(1));
    }

    #[test]
    fn test_parse_packet_malformed_length() {
        let bytes = Bytes::from_static(&[0xA0, 0x00, 0x02]);
        let err = parse_packet(bytes, 0).unwrap_err();
        assert_eq!(
            err,
            ParseError::MalformedLength {
                length: 2,
                minimum: 3
            }
        );

        // length covers the prefix but not the Connect prelude
        let bytes = Bytes::from_static(&[0xA0, 0x00, 0x05, 0x10, 0x00]);
        let err = parse_packet(bytes, 4).unwrap_err();
        assert_eq!(
            err,
            ParseError::MalformedLength {
                length: 5,
                minimum: 7
            }
        );
    }

    #[test]
    fn test_parse_packet_length_mismatch() {
        let bytes = Bytes::from_static(&[0xA0, 0x00, 0x05, 0x00]);
        let err = parse_packet(bytes, 0).unwrap_err();
        assert_eq!(
            err,
            ParseError::LengthMismatch {
                declared: 5,
                actual: 4
            }
        );
    }

    #[test]
    fn test_parse_packet_header_overruns_packet() {
        // Body header claims 6 bytes, packet has room for 4
        let bytes = Bytes::from_static(&[0xA0, 0x00, 0x07, 0x48, 0x00, 0x06, b'a']);
        let err = parse_packet(bytes, 0).unwrap_err();
        assert!(matches!(err, ParseError::Truncated { .. }));
    }

    #[tokio::test]
    async fn test_read_packet() {
        let (a, mut b) = tokio::io::duplex(64);
        let mut channel = Channel::new(a);

        b.write_all(&[0xA0, 0x00, 0x08, 0x49, 0x00, 0x05, b'o', b'k'])
            .await
            .unwrap();

        let packet = read_packet(&mut channel, 0).await.unwrap();
        assert!(packet.response_code().is_success());
        assert_eq!(packet.headers()[0].payload(), b"ok");
    }

    #[tokio::test]
    async fn test_read_packet_closed_mid_packet() {
        let (a, mut b) = tokio::io::duplex(64);
        let mut channel = Channel::new(a);

        b.write_all(&[0xA0, 0x00, 0x10, 0x48, 0x00]).await.unwrap();
        drop(b);

        let err = read_packet(&mut channel, 0).await.unwrap_err();
        assert!(matches!(err, ObexError::Io(IoError::ChannelClosed)));
    }

    #[tokio::test]
    async fn test_read_raw_packet_consumes_exactly_one_packet() {
        let (a, mut b) = tokio::io::duplex(64);
        let mut channel = Channel::new(a);

        b.write_all(&[0xC4, 0x00, 0x03, 0xA0, 0x00, 0x03]).await.unwrap();

        let first = read_raw_packet(&mut channel).await.unwrap();
        assert_eq!(&first[..], &[0xC4, 0x00, 0x03]);
        let second = read_packet(&mut channel, 0).await.unwrap();
        assert!(second.response_code().is_success());
    }

    #[tokio::test]
    async fn test_read_packet_rejects_short_length_before_reading_more() {
        let (a, mut b) = tokio::io::duplex(64);
        let mut channel = Channel::new(a);

        b.write_all(&[0xA0, 0x00, 0x01]).await.unwrap();

        let err = read_packet(&mut channel, 0).await.unwrap_err();
        assert!(matches!(
            err,
            ObexError::Parse(ParseError::MalformedLength { length: 1, .. })
        ));
    }
}
