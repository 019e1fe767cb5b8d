//! Disconnect operation.

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncWrite};

use super::{send_request, ConnectionId};
use crate::error::{EncodingError, Result};
use crate::protocol::{build_request, Header, OpCode};
use crate::transport::Channel;

/// Encode a Disconnect request carrying only the connection id.
pub fn disconnect_request(
    connection_id: ConnectionId,
) -> std::result::Result<Bytes, EncodingError> {
    build_request(
        OpCode::Disconnect,
        &[Header::connection_id(connection_id.get())],
    )
}

/// Send Disconnect.
///
/// Completes once the request is written. The server's response is not
/// awaited; callers that close the channel right after should give the
/// server a moment to act on the request first.
pub async fn disconnect<S>(channel: &mut Channel<S>, connection_id: ConnectionId) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    send_request(
        channel,
        OpCode::Disconnect,
        disconnect_request(connection_id)?,
    )
    .await
}
