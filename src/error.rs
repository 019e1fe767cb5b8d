//! Error types for obex-pbap.
//!
//! Errors are split by who is at fault and how far the damage reaches:
//!
//! - [`EncodingError`] - a request could not be represented on the wire.
//!   Fatal to the attempted call only.
//! - [`ParseError`] - the peer sent a malformed or truncated packet. The
//!   session can no longer be trusted, unless only the text was bad.
//! - [`ProtocolError`] - the peer answered with something the operation does
//!   not accept, or the local session is in the wrong state.
//! - [`IoError`] - the byte channel failed or closed.

use thiserror::Error;

/// A request could not be encoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodingError {
    /// Header payload does not fit the 16-bit header length field.
    #[error("header 0x{id:02X} payload of {len} bytes exceeds the 16-bit length field")]
    PayloadTooLarge { id: u8, len: usize },

    /// Whole packet does not fit the 16-bit packet length field.
    #[error("packet length {len} exceeds maximum {max}")]
    PacketTooLarge { len: usize, max: usize },

    /// Fixed-length encoding requested for a length-prefixed header, or the
    /// other way round.
    #[error("header 0x{id:02X} cannot be encoded with this layout")]
    LayoutMismatch { id: u8 },

    /// Text for an ASCII-only header contains non-ASCII characters.
    #[error("text {text:?} is not ASCII")]
    NonAsciiText { text: String },
}

/// A response packet could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Header length field is smaller than the 3 bytes it must cover.
    #[error("header 0x{id:02X} declares length {length}, minimum is 3")]
    HeaderLengthUnderflow { id: u8, length: u16 },

    /// Fewer bytes remain than the header needs.
    #[error("truncated header: need {needed} bytes, have {available}")]
    Truncated { needed: usize, available: usize },

    /// Packet length field is smaller than the fixed packet prefix.
    #[error("packet declares length {length}, minimum is {minimum}")]
    MalformedLength { length: u16, minimum: usize },

    /// In-memory packet buffer does not match its declared length.
    #[error("packet declares length {declared} but buffer holds {actual} bytes")]
    LengthMismatch { declared: u16, actual: usize },

    /// Header text is not valid in its declared encoding.
    #[error("invalid {encoding} text: {reason}")]
    InvalidText {
        encoding: &'static str,
        reason: String,
    },
}

/// The peer or the local session broke the operation's rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// Response opcode is not one the operation accepts.
    #[error("unexpected response code 0x{code:02X}")]
    UnexpectedResponseCode { code: u8 },

    /// No connection id was ever received for this session.
    #[error("no connection id known for this session")]
    MissingConnectionId,

    /// Peer kept answering `Continue` past the configured bound.
    #[error("continuation limit exceeded: {limit}")]
    ContinuationLimitExceeded { limit: ContinuationLimit },

    /// Operation requires a connected session.
    #[error("session is not connected")]
    NotConnected,

    /// A previous pull was abandoned mid-round-trip; the channel is no longer
    /// aligned on a packet boundary.
    #[error("a pull is still in progress on this channel")]
    PullInProgress,
}

/// Which bound stopped a continuation loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContinuationLimit {
    /// Maximum number of `Continue` rounds after the first request.
    Rounds(u32),
    /// Overall deadline for the pull.
    Deadline(std::time::Duration),
}

impl std::fmt::Display for ContinuationLimit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rounds(n) => write!(f, "{} rounds", n),
            Self::Deadline(d) => write!(f, "deadline of {:?}", d),
        }
    }
}

/// The byte channel failed.
#[derive(Debug, Error)]
pub enum IoError {
    /// Channel closed before the requested bytes were transferred.
    #[error("channel closed")]
    ChannelClosed,

    /// Any other transport failure.
    #[error("transport error: {0}")]
    Transport(#[source] std::io::Error),
}

impl From<std::io::Error> for IoError {
    fn from(err: std::io::Error) -> Self {
        use std::io::ErrorKind;

        match err.kind() {
            ErrorKind::UnexpectedEof
            | ErrorKind::BrokenPipe
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::NotConnected
            | ErrorKind::WriteZero => IoError::ChannelClosed,
            _ => IoError::Transport(err),
        }
    }
}

/// Main error type for all obex-pbap operations.
#[derive(Debug, Error)]
pub enum ObexError {
    #[error("Encoding error: {0}")]
    Encoding(#[from] EncodingError),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// Client configuration could not be loaded.
    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),
}

impl From<std::io::Error> for ObexError {
    fn from(err: std::io::Error) -> Self {
        ObexError::Io(err.into())
    }
}

impl ObexError {
    /// Whether the session must be torn down after this error.
    ///
    /// Malformed framing and transport failures leave the channel at an
    /// unknown position in the byte stream. Text that fails to decode was
    /// framed correctly, so the session survives it.
    pub fn is_fatal_to_session(&self) -> bool {
        match self {
            ObexError::Parse(ParseError::InvalidText { .. }) => false,
            ObexError::Parse(_) | ObexError::Io(_) => true,
            _ => false,
        }
    }
}

/// Result type alias using ObexError.
pub type Result<T> = std::result::Result<T, ObexError>;
