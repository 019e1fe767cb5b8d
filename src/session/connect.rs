//! Connect operation.
//!
//! Request:
//! ```text
//! 0x80 │ len │ version=0x10 │ flags=0x00 │ max packet (u16) │ Target(PBAP UUID)
//! ```
//! The response carries the same 4-byte prelude, followed by headers that
//! usually include `ConnectionId` and `Who`.

use bytes::{BufMut, Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncWrite};

use super::{send_request, ConnectionId};
use crate::error::{EncodingError, ParseError, ProtocolError, Result};
use crate::profile::{CONNECT_FLAGS, DEFAULT_MAX_PACKET_SIZE, OBEX_VERSION, PBAP_TARGET};
use crate::protocol::{
    build_request_with_prelude, parse_packet, read_raw_packet, Header, HeaderId, OpCode, Packet,
    ResponseCode, CONNECT_PRELUDE_SIZE,
};
use crate::transport::Channel;

/// What the client announces when connecting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectParams {
    /// Largest packet the client accepts.
    pub max_packet_size: u16,
    /// Service identity sent in the `Target` header.
    pub target: Bytes,
}

impl Default for ConnectParams {
    fn default() -> Self {
        Self {
            max_packet_size: DEFAULT_MAX_PACKET_SIZE,
            target: Bytes::from_static(&PBAP_TARGET),
        }
    }
}

impl ConnectParams {
    pub fn with_max_packet_size(max_packet_size: u16) -> Self {
        Self {
            max_packet_size,
            ..Self::default()
        }
    }
}

/// Decoded Connect response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectResponse {
    pub version: u8,
    pub flags: u8,
    /// Largest packet the server accepts.
    pub max_packet_size: u16,
    /// `None` if the server sent no id, or sent 0.
    pub connection_id: Option<ConnectionId>,
    /// Server's `Who` header, echoing the target on a directed connection.
    pub who: Option<Bytes>,
}

/// Encode a Connect request.
pub fn connect_request(params: &ConnectParams) -> std::result::Result<Bytes, EncodingError> {
    let mut prelude = BytesMut::with_capacity(CONNECT_PRELUDE_SIZE);
    prelude.put_u8(OBEX_VERSION);
    prelude.put_u8(CONNECT_FLAGS);
    prelude.put_u16(params.max_packet_size);

    let target = Header::target(params.target.clone())?;
    build_request_with_prelude(OpCode::Connect, &prelude, &[target])
}

/// Interpret a decoded Connect response packet.
///
/// # Errors
///
/// - [`ProtocolError::UnexpectedResponseCode`] unless the status is
///   `Success`.
/// - [`ParseError::Truncated`] if the packet was parsed without the 4-byte
///   prelude.
pub fn parse_connect_response(packet: &Packet) -> Result<ConnectResponse> {
    let code = packet.response_code();
    if !code.is_success() {
        return Err(ProtocolError::UnexpectedResponseCode {
            code: code.as_u8(),
        }
        .into());
    }

    let prelude = packet.prelude();
    if prelude.len() < CONNECT_PRELUDE_SIZE {
        return Err(ParseError::Truncated {
            needed: CONNECT_PRELUDE_SIZE,
            available: prelude.len(),
        }
        .into());
    }
    let connection_id = packet.connection_id().and_then(ConnectionId::new);
    let who = packet.find(HeaderId::Who).map(Header::payload_bytes);

    Ok(ConnectResponse {
        version: prelude[0],
        flags: prelude[1],
        max_packet_size: u16::from_be_bytes([prelude[2], prelude[3]]),
        connection_id,
        who,
    })
}

/// Open an OBEX session with the PBAP server.
///
/// A response without a usable `ConnectionId` is not an error here; the
/// caller decides whether that is acceptable.
///
/// # Errors
///
/// - [`ProtocolError::UnexpectedResponseCode`] for any status but `Success`.
///   The refused response is consumed in full.
/// - Parse and I/O errors from reading the response.
pub async fn connect<S>(channel: &mut Channel<S>, params: &ConnectParams) -> Result<ConnectResponse>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    send_request(channel, OpCode::Connect, connect_request(params)?).await?;

    let raw = read_raw_packet(channel).await?;
    let code = ResponseCode::from(raw[0]);
    if !code.is_success() {
        return Err(ProtocolError::UnexpectedResponseCode {
            code: code.as_u8(),
        }
        .into());
    }

    let packet = parse_packet(raw, CONNECT_PRELUDE_SIZE)?;
    let response = parse_connect_response(&packet)?;
    tracing::debug!(
        "Connected: version 0x{:02X}, server max packet {}, connection id {:?}",
        response.version,
        response.max_packet_size,
        response.connection_id.map(ConnectionId::get)
    );
    Ok(response)
}
