//! Session module - OBEX operations and per-connection state.
//!
//! Each operation is a single request or response step over a [`Channel`];
//! none of them loops. Repeating requests across `Continue` responses is
//! the job of [`crate::PhonebookClient`].
//!
//! ```text
//!                connect()
//! Disconnected ─────────────► Connected ──┐ pull request/response
//!      ▲                          │   ◄────┘ (pull_in_progress set)
//!      └──────────────────────────┘
//!       disconnect() / fatal error
//! ```

mod connect;
mod disconnect;
mod pull;

use std::fmt;
use std::num::NonZeroU32;

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::error::{ProtocolError, Result};
use crate::protocol::OpCode;
use crate::transport::Channel;

pub use connect::{
    connect, connect_request, parse_connect_response, ConnectParams, ConnectResponse,
};
pub use disconnect::{disconnect, disconnect_request};
pub use pull::{
    parse_pull_response, pull_phonebook_request, pull_phonebook_response, pull_request, PullChunk,
};

/// Identifier the server assigns to a session.
///
/// The wire value 0 means "unset" and never becomes a `ConnectionId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(NonZeroU32);

impl ConnectionId {
    /// `None` for the unset value 0.
    pub fn new(raw: u32) -> Option<Self> {
        NonZeroU32::new(raw).map(Self)
    }

    #[inline]
    pub fn get(self) -> u32 {
        self.0.get()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08X}", self.get())
    }
}

/// Whether an OBEX session is open on the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionPhase {
    #[default]
    Disconnected,
    Connected,
}

/// Connection state of one client.
#[derive(Debug, Clone, Default)]
pub struct Session {
    connection_id: Option<ConnectionId>,
    phase: ConnectionPhase,
    pull_in_progress: bool,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn phase(&self) -> ConnectionPhase {
        self.phase
    }

    #[inline]
    pub fn is_connected(&self) -> bool {
        self.phase == ConnectionPhase::Connected
    }

    /// Last connection id received from the server.
    #[inline]
    pub fn connection_id(&self) -> Option<ConnectionId> {
        self.connection_id
    }

    /// Set while a pull request is awaiting its response.
    #[inline]
    pub fn is_pull_in_progress(&self) -> bool {
        self.pull_in_progress
    }

    /// Fail if a previous pull left the channel mid-packet.
    pub fn ensure_idle(&self) -> std::result::Result<(), ProtocolError> {
        if self.pull_in_progress {
            return Err(ProtocolError::PullInProgress);
        }
        Ok(())
    }

    /// Enter `Connected`; an absent id keeps the last known one.
    pub(crate) fn mark_connected(&mut self, connection_id: Option<ConnectionId>) {
        self.phase = ConnectionPhase::Connected;
        self.remember(connection_id);
    }

    /// Keep the newest id; an absent id leaves the last known one in place.
    pub(crate) fn remember(&mut self, connection_id: Option<ConnectionId>) {
        if let Some(id) = connection_id {
            if self.connection_id != Some(id) {
                tracing::debug!("Connection id is now {}", id);
            }
            self.connection_id = Some(id);
        }
    }

    /// Mark a pull request as written but its response not yet read.
    pub(crate) fn begin_pull(&mut self) {
        self.pull_in_progress = true;
    }

    pub(crate) fn end_pull(&mut self) {
        self.pull_in_progress = false;
    }

    /// Drop all session state.
    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }
}

async fn send_request<S>(channel: &mut Channel<S>, opcode: OpCode, bytes: Bytes) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    tracing::debug!("Sending {:?} request, {} bytes", opcode, bytes.len());
    channel.send(&bytes).await?;
    Ok(())
}
