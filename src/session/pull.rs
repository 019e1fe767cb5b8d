//! Phone-book pull: one request and one response step.
//!
//! The request is a final Get carrying `Name`, `Type`, an empty
//! `ApplicationParameters` and, last, `ConnectionId`. Each response is
//! either `Continue` (more body follows) or `Success` (last chunk).

use bytes::{BufMut, Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncWrite};

use super::{send_request, ConnectionId};
use crate::codec::{AsciiCodec, Utf8Codec};
use crate::error::{EncodingError, ProtocolError, Result};
use crate::protocol::{build_request, read_packet, Header, HeaderId, OpCode, Packet, ResponseCode};
use crate::transport::Channel;

/// One response packet of a pull.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullChunk {
    /// `Continue` or `Success`.
    pub status: ResponseCode,
    pub connection_id: Option<ConnectionId>,
    /// `Body` and `EndOfBody` payloads of this packet, in order.
    pub body: Bytes,
}

impl PullChunk {
    /// Check if the server has no more data.
    #[inline]
    pub fn is_final(&self) -> bool {
        self.status.is_success()
    }

    /// Body of this chunk as text.
    ///
    /// A chunk may end inside a multi-byte character, which is shown as a
    /// replacement character; decode the joined body for exact text.
    pub fn text_chunk(&self) -> String {
        Utf8Codec::decode_lossy(&self.body)
    }
}

/// Encode a phone-book pull request.
pub fn pull_request(
    connection_id: ConnectionId,
    object_name: &str,
    object_type: &str,
) -> std::result::Result<Bytes, EncodingError> {
    let headers = [
        Header::name(object_name)?,
        Header::mime_type(object_type)?,
        Header::application_parameters(Bytes::new())?,
        Header::connection_id(connection_id.get()),
    ];
    build_request(OpCode::GetFinal, &headers)
}

/// Send one pull request.
pub async fn pull_phonebook_request<S>(
    channel: &mut Channel<S>,
    connection_id: ConnectionId,
    object_name: &str,
    object_type: &str,
) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let bytes = pull_request(connection_id, object_name, object_type)?;
    send_request(channel, OpCode::GetFinal, bytes).await
}

/// Interpret one decoded pull response packet.
///
/// Headers other than body and connection id are skipped.
///
/// # Errors
///
/// [`ProtocolError::UnexpectedResponseCode`] for any status but `Continue`
/// or `Success`.
pub fn parse_pull_response(packet: Packet) -> std::result::Result<PullChunk, ProtocolError> {
    let status = packet.response_code();
    if !(status.is_continue() || status.is_success()) {
        return Err(ProtocolError::UnexpectedResponseCode {
            code: status.as_u8(),
        });
    }

    let mut connection_id = None;
    let mut parts: Vec<Bytes> = Vec::new();
    for header in packet.into_headers() {
        match header.id() {
            HeaderId::ConnectionId => {
                connection_id = header.as_connection_id().and_then(ConnectionId::new);
            }
            HeaderId::Body | HeaderId::EndOfBody => parts.push(header.payload_bytes()),
            HeaderId::Type => match AsciiCodec::decode(header.payload()) {
                Ok(object_type) => tracing::trace!("Response object type {}", object_type),
                Err(err) => tracing::trace!("Unreadable Type header: {}", err),
            },
            HeaderId::Unknown(id) => {
                tracing::warn!("Skipping unknown header 0x{:02X} in pull response", id);
            }
            other => {
                tracing::trace!("Ignoring {:?} header in pull response", other);
            }
        }
    }

    Ok(PullChunk {
        status,
        connection_id,
        body: join(parts),
    })
}

/// Read one pull response.
pub async fn pull_phonebook_response<S>(channel: &mut Channel<S>) -> Result<PullChunk>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let packet = read_packet(channel, 0).await?;
    let chunk = parse_pull_response(packet)?;
    tracing::debug!(
        "Pull response {:?}, {} body bytes",
        chunk.status,
        chunk.body.len()
    );
    Ok(chunk)
}

fn join(mut parts: Vec<Bytes>) -> Bytes {
    match parts.len() {
        0 => Bytes::new(),
        1 => parts.swap_remove(0),
        _ => {
            let mut buf = BytesMut::with_capacity(parts.iter().map(Bytes::len).sum());
            for part in &parts {
                buf.put_slice(part);
            }
            buf.freeze()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ObexError;
    use crate::protocol::parse_packet;
    use tokio::io::AsyncWriteExt;

    fn id(raw: u32) -> ConnectionId {
        ConnectionId::new(raw).unwrap()
    }

    fn response(code: u8, headers: &[Header]) -> Packet {
        parse_packet(build_request(code, headers).unwrap(), 0).unwrap()
    }

    #[test]
    fn test_pull_request_header_order() {
        let bytes = pull_request(id(0x42), "telecom/pb.vcf", "x-bt/phonebook").unwrap();
        let packet = parse_packet(bytes, 0).unwrap();

        assert_eq!(packet.opcode(), 0x83);
        let ids: Vec<HeaderId> = packet.headers().iter().map(Header::id).collect();
        assert_eq!(
            ids,
            [
                HeaderId::Name,
                HeaderId::Type,
                HeaderId::ApplicationParameters,
                HeaderId::ConnectionId
            ]
        );
        assert!(packet.headers()[2].payload().is_empty());
        assert_eq!(packet.connection_id(), Some(0x42));
    }

    #[test]
    fn test_pull_request_name_is_utf16() {
        let bytes = pull_request(id(1), "pb", "x-bt/phonebook").unwrap();
        assert_eq!(
            &bytes[3..12],
            &[0x01, 0x00, 0x09, 0x00, b'p', 0x00, b'b', 0x00, 0x00]
        );
    }

    #[test]
    fn test_pull_request_rejects_non_ascii_type() {
        let err = pull_request(id(1), "telecom/pb.vcf", "x-bt/téléphone").unwrap_err();
        assert!(matches!(err, EncodingError::NonAsciiText { .. }));
    }

    #[test]
    fn test_parse_continue_chunk() {
        let packet = response(
            0x90,
            &[
                Header::connection_id(3),
                Header::body(Bytes::from_static(b"BEGIN:VCARD\r\n")).unwrap(),
            ],
        );
        let chunk = parse_pull_response(packet).unwrap();
        assert!(!chunk.is_final());
        assert_eq!(chunk.connection_id, ConnectionId::new(3));
        assert_eq!(chunk.text_chunk(), "BEGIN:VCARD\r\n");
    }

    #[test]
    fn test_parse_success_joins_body_headers() {
        let packet = response(
            0xA0,
            &[
                Header::body(Bytes::from_static(b"FN:A\r\n")).unwrap(),
                Header::new(HeaderId::Unknown(0x05), Bytes::from_static(&[0, 0])).unwrap(),
                Header::end_of_body(Bytes::from_static(b"END:VCARD\r\n")).unwrap(),
            ],
        );
        let chunk = parse_pull_response(packet).unwrap();
        assert!(chunk.is_final());
        assert_eq!(chunk.connection_id, None);
        assert_eq!(&chunk.body[..], b"FN:A\r\nEND:VCARD\r\n");
    }

    #[test]
    fn test_parse_tolerates_type_header() {
        let packet = response(
            0xA0,
            &[
                Header::mime_type("x-bt/phonebook").unwrap(),
                Header::new(HeaderId::Type, Bytes::from_static(&[0xC3, 0xA9, 0x00])).unwrap(),
                Header::end_of_body(Bytes::from_static(b"END:VCARD\r\n")).unwrap(),
            ],
        );
        let chunk = parse_pull_response(packet).unwrap();
        assert_eq!(&chunk.body[..], b"END:VCARD\r\n");
    }

    #[test]
    fn test_parse_success_without_body() {
        let chunk = parse_pull_response(response(0xA0, &[])).unwrap();
        assert!(chunk.body.is_empty());
    }

    #[test]
    fn test_parse_rejects_other_status() {
        let err = parse_pull_response(response(0xC4, &[])).unwrap_err();
        assert_eq!(err, ProtocolError::UnexpectedResponseCode { code: 0xC4 });
    }

    #[tokio::test]
    async fn test_request_and_response_over_channel() {
        let (a, mut peer) = tokio::io::duplex(512);
        let mut channel = Channel::new(a);

        pull_phonebook_request(&mut channel, id(9), "telecom/ich.vcf", "x-bt/phonebook")
            .await
            .unwrap();

        let mut peer_channel = Channel::new(&mut peer);
        let request = read_packet(&mut peer_channel, 0).await.unwrap();
        assert_eq!(request.opcode(), 0x83);

        let body = Header::end_of_body(Bytes::from_static(b"END")).unwrap();
        let reply = build_request(0xA0u8, &[body]).unwrap();
        peer.write_all(&reply).await.unwrap();

        let chunk = pull_phonebook_response(&mut channel).await.unwrap();
        assert!(chunk.is_final());
        assert_eq!(&chunk.body[..], b"END");
    }

    #[tokio::test]
    async fn test_response_truncated_by_peer() {
        let (a, mut peer) = tokio::io::duplex(64);
        let mut channel = Channel::new(a);

        peer.write_all(&[0x90, 0x00, 0x20, 0x48]).await.unwrap();
        drop(peer);

        let err = pull_phonebook_response(&mut channel).await.unwrap_err();
        assert!(err.is_fatal_to_session());
    }

    #[tokio::test]
    async fn test_response_malformed_header_is_parse_error() {
        let (a, mut peer) = tokio::io::duplex(64);
        let mut channel = Channel::new(a);

        // Body header claims length 2
        peer.write_all(&[0x90, 0x00, 0x06, 0x48, 0x00, 0x02]).await.unwrap();

        let err = pull_phonebook_response(&mut channel).await.unwrap_err();
        assert!(matches!(err, ObexError::Parse(_)));
    }
}
