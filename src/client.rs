//! Client builder and retrieval loop.
//!
//! The [`ClientBuilder`] provides a fluent API for configuring limits and
//! policies and wraps a caller-supplied stream. The [`PhonebookClient`]
//! drives the session:
//! 1. `connect()` - open the OBEX session with the PBAP target
//! 2. `pull_phonebook()` - repeat the pull request while the server answers
//!    `Continue`, collecting body chunks until `Success`
//! 3. `disconnect()` - close the session and wait the settle delay
//! 4. `into_inner()` - take the stream back and close it
//!
//! # Example
//!
//! ```ignore
//! use obex_pbap::{Folder, PhonebookClient, PhonebookObject};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let stream = tokio::net::TcpStream::connect("127.0.0.1:6500").await?;
//!     let mut client = PhonebookClient::builder()
//!         .max_continuations(256)
//!         .pull_timeout(std::time::Duration::from_secs(30))
//!         .build(stream);
//!
//!     client.connect().await?;
//!     let vcards = client
//!         .pull_phonebook(&PhonebookObject::phone(Folder::Phonebook))
//!         .await?;
//!     client.disconnect().await?;
//!
//!     println!("{}", vcards);
//!     Ok(())
//! }
//! ```
//!
//! # Failure handling
//!
//! - Parse and I/O errors drop the session; `connect()` must run again.
//! - Protocol errors leave the session as it was.
//! - A pull that is cancelled (its future dropped, or its deadline passing)
//!   between writing a request and reading the response leaves the channel
//!   mid-packet. Every later call then fails with
//!   [`ProtocolError::PullInProgress`]; the stream should be closed.

use std::time::Duration;

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::time::Instant;

use crate::codec::Utf8Codec;
use crate::config::{ClientConfig, ConnectionIdPolicy};
use crate::error::{ContinuationLimit, ObexError, ProtocolError, Result};
use crate::profile::{PhonebookObject, PHONEBOOK_TYPE};
use crate::session::{
    self, pull_phonebook_request, pull_phonebook_response, pull_request, ConnectParams,
    ConnectResponse, ConnectionId, PullChunk, Session,
};
use crate::transport::Channel;

/// Builder for configuring and creating a [`PhonebookClient`].
#[derive(Debug, Clone, Default)]
pub struct ClientBuilder {
    config: ClientConfig,
}

impl ClientBuilder {
    /// Create a builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace all settings at once.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the maximum packet size announced on connect.
    ///
    /// Default: 4000 (0x0FA0)
    pub fn max_packet_size(mut self, size: u16) -> Self {
        self.config.max_packet_size = size;
        self
    }

    /// Set how many `Continue` rounds a pull may take after its first
    /// request.
    ///
    /// Default: 1024
    pub fn max_continuations(mut self, limit: u32) -> Self {
        self.config.max_continuations = limit;
        self
    }

    /// Set an overall deadline for each pull.
    ///
    /// Default: none
    pub fn pull_timeout(mut self, timeout: Duration) -> Self {
        self.config.pull_timeout = Some(timeout);
        self
    }

    /// Set the pause after Disconnect.
    ///
    /// Default: 500 ms
    pub fn settle_delay(mut self, delay: Duration) -> Self {
        self.config.settle_delay = delay;
        self
    }

    /// Set what to do when the server assigns no connection id.
    ///
    /// Default: [`ConnectionIdPolicy::Deferred`]
    pub fn connection_id_policy(mut self, policy: ConnectionIdPolicy) -> Self {
        self.config.connection_id_policy = policy;
        self
    }

    /// Wrap an established stream.
    pub fn build<S>(self, stream: S) -> PhonebookClient<S>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        PhonebookClient {
            channel: Channel::new(stream),
            session: Session::new(),
            config: self.config,
            server_max_packet_size: None,
        }
    }
}

/// A PBAP client bound to one stream.
///
/// Methods take `&mut self`: one request is outstanding at a time.
#[derive(Debug)]
pub struct PhonebookClient<S> {
    channel: Channel<S>,
    session: Session,
    config: ClientConfig,
    server_max_packet_size: Option<u16>,
}

impl PhonebookClient<()> {
    /// Create a new client builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }
}

impl<S> PhonebookClient<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wrap a stream with default settings.
    pub fn new(stream: S) -> Self {
        ClientBuilder::new().build(stream)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    #[inline]
    pub fn is_connected(&self) -> bool {
        self.session.is_connected()
    }

    #[inline]
    pub fn connection_id(&self) -> Option<ConnectionId> {
        self.session.connection_id()
    }

    /// Largest packet the server said it accepts, once connected.
    pub fn server_max_packet_size(&self) -> Option<u16> {
        self.server_max_packet_size
    }

    /// Open the OBEX session.
    ///
    /// # Errors
    ///
    /// - [`ProtocolError::UnexpectedResponseCode`] if the server refuses.
    /// - [`ProtocolError::MissingConnectionId`] if the server assigns no id
    ///   and the policy is [`ConnectionIdPolicy::Strict`].
    pub async fn connect(&mut self) -> Result<ConnectResponse> {
        self.session.ensure_idle()?;

        let params = ConnectParams::with_max_packet_size(self.config.max_packet_size);
        let response = match session::connect(&mut self.channel, &params).await {
            Ok(response) => response,
            Err(err) => return Err(self.fail(err)),
        };

        if response.connection_id.is_none() {
            match self.config.connection_id_policy {
                ConnectionIdPolicy::Strict => {
                    return Err(ProtocolError::MissingConnectionId.into());
                }
                ConnectionIdPolicy::Deferred => {
                    tracing::warn!(
                        "Connect response carried no connection id, keeping {:?}",
                        self.session.connection_id().map(ConnectionId::get)
                    );
                }
            }
        }

        self.session.mark_connected(response.connection_id);
        self.server_max_packet_size = Some(response.max_packet_size);
        Ok(response)
    }

    /// Pull a whole phone-book object as vCard text.
    pub async fn pull_phonebook(&mut self, object: &PhonebookObject) -> Result<String> {
        self.pull(&object.name(), PHONEBOOK_TYPE).await
    }

    /// Pull an object by name and type.
    ///
    /// Returns the joined body of every response once the server answers
    /// `Success`. Nothing is returned on failure; a later call starts over.
    ///
    /// # Errors
    ///
    /// - [`ProtocolError::NotConnected`] before `connect()`.
    /// - [`ProtocolError::MissingConnectionId`] if no id was ever assigned.
    /// - [`ProtocolError::ContinuationLimitExceeded`] when the round bound
    ///   or the pull deadline is hit.
    /// - [`ProtocolError::UnexpectedResponseCode`] for any status but
    ///   `Continue` or `Success`.
    pub async fn pull(&mut self, object_name: &str, object_type: &str) -> Result<String> {
        self.session.ensure_idle()?;
        if !self.session.is_connected() {
            return Err(ProtocolError::NotConnected.into());
        }

        match self.run_pull(object_name, object_type).await {
            Ok(text) => Ok(text),
            Err(err) => Err(self.fail(err)),
        }
    }

    /// Send Disconnect, wait the settle delay and forget the session.
    ///
    /// A client that never connected has nothing to close and returns `Ok`.
    ///
    /// # Errors
    ///
    /// - [`ProtocolError::MissingConnectionId`] if the session is connected
    ///   but the server never assigned an id. The session is left as is.
    pub async fn disconnect(&mut self) -> Result<()> {
        self.session.ensure_idle()?;

        let Some(connection_id) = self.session.connection_id() else {
            if self.session.is_connected() {
                tracing::warn!("Connected without a connection id, cannot send Disconnect");
                return Err(ProtocolError::MissingConnectionId.into());
            }
            tracing::debug!("Not connected, nothing to disconnect");
            return Ok(());
        };

        if let Err(err) = session::disconnect(&mut self.channel, connection_id).await {
            return Err(self.fail(err));
        }

        tokio::time::sleep(self.config.settle_delay).await;
        self.session.reset();
        self.server_max_packet_size = None;
        tracing::debug!("Disconnected {}", connection_id);
        Ok(())
    }

    /// Give the stream back to the caller.
    pub fn into_inner(self) -> S {
        self.channel.into_inner()
    }

    async fn run_pull(&mut self, object_name: &str, object_type: &str) -> Result<String> {
        let started = Instant::now();
        let max_rounds = self.config.max_continuations;
        let pull_timeout = self.config.pull_timeout;

        let connection_id = self.require_connection_id()?;
        // Encoding errors surface before anything is written.
        pull_request(connection_id, object_name, object_type)?;

        let mut body = BytesMut::new();
        let mut continuations: u32 = 0;
        loop {
            let connection_id = self.require_connection_id()?;
            let chunk = match pull_timeout {
                None => {
                    self.round_trip(connection_id, object_name, object_type)
                        .await?
                }
                Some(timeout) => {
                    let round = self.round_trip(connection_id, object_name, object_type);
                    match tokio::time::timeout_at(started + timeout, round).await {
                        Ok(chunk) => chunk?,
                        Err(_) => {
                            tracing::warn!(
                                "Pull of {} passed its {:?} deadline mid-response",
                                object_name,
                                timeout
                            );
                            return Err(ProtocolError::ContinuationLimitExceeded {
                                limit: ContinuationLimit::Deadline(timeout),
                            }
                            .into());
                        }
                    }
                }
            };

            self.session.remember(chunk.connection_id);
            body.extend_from_slice(&chunk.body);
            if chunk.is_final() {
                break;
            }

            continuations += 1;
            if continuations > max_rounds {
                return Err(ProtocolError::ContinuationLimitExceeded {
                    limit: ContinuationLimit::Rounds(max_rounds),
                }
                .into());
            }
        }

        tracing::debug!(
            "Pulled {}: {} bytes in {} responses",
            object_name,
            body.len(),
            continuations + 1
        );
        Ok(Utf8Codec::decode(&body)?)
    }

    /// One request and its response.
    ///
    /// The pull marker stays set if this future is dropped between the two.
    async fn round_trip(
        &mut self,
        connection_id: ConnectionId,
        object_name: &str,
        object_type: &str,
    ) -> Result<PullChunk> {
        self.session.begin_pull();
        pull_phonebook_request(
            &mut self.channel,
            connection_id,
            object_name,
            object_type,
        )
        .await?;
        let chunk = pull_phonebook_response(&mut self.channel).await;
        self.session.end_pull();
        chunk
    }

    fn require_connection_id(&self) -> Result<ConnectionId> {
        self.session
            .connection_id()
            .ok_or_else(|| ProtocolError::MissingConnectionId.into())
    }

    fn fail(&mut self, err: ObexError) -> ObexError {
        if err.is_fatal_to_session() {
            tracing::error!("Dropping session: {}", err);
            self.session.reset();
            self.server_max_packet_size = None;
        }
        err
    }
}
