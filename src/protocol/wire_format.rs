//! Wire format constants, opcodes and response codes.
//!
//! Every OBEX packet starts with the same 3-byte prefix:
//! ```text
//! ┌────────┬──────────────┬─────────────┬─────────────┐
//! │ Opcode │ Total length │ Prelude     │ Headers ... │
//! │ 1 byte │ uint16 BE    │ Connect only│             │
//! └────────┴──────────────┴─────────────┴─────────────┘
//! ```
//!
//! The total length covers the whole packet, prefix included.
//! All multi-byte integers are Big Endian.

/// Opcode byte plus the 16-bit length field.
pub const PACKET_PREFIX_SIZE: usize = 3;

/// Largest packet the 16-bit length field can describe.
pub const MAX_PACKET_SIZE: usize = u16::MAX as usize;

/// Header id byte plus the 16-bit length field of a variable-length header.
pub const VARIABLE_HEADER_PREFIX_SIZE: usize = 3;

/// Size of the Connect prelude: version, flags, u16 max packet size.
pub const CONNECT_PRELUDE_SIZE: usize = 4;

/// Request opcodes sent by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OpCode {
    /// Open an OBEX session with the target service.
    Connect = 0x80,
    /// Close the OBEX session.
    Disconnect = 0x81,
    /// Get, more request packets follow.
    Get = 0x03,
    /// Get with the final bit set: all request headers have been sent.
    GetFinal = 0x83,
}

impl OpCode {
    /// Raw opcode byte.
    #[inline]
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl From<OpCode> for u8 {
    fn from(op: OpCode) -> u8 {
        op as u8
    }
}

/// Response status codes.
///
/// Only `Continue` and `Success` are accepted by this client; anything else
/// is carried as `Other` so the raw byte stays available for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseCode {
    /// More response data follows; repeat the request to fetch it.
    Continue,
    /// The request completed.
    Success,
    /// Any other status byte.
    Other(u8),
}

impl ResponseCode {
    pub const CONTINUE: u8 = 0x90;
    pub const SUCCESS: u8 = 0xA0;

    /// Raw status byte.
    pub fn as_u8(self) -> u8 {
        match self {
            Self::Continue => Self::CONTINUE,
            Self::Success => Self::SUCCESS,
            Self::Other(code) => code,
        }
    }

    /// Check if this is a final success.
    #[inline]
    pub fn is_success(self) -> bool {
        self == Self::Success
    }

    /// Check if the peer has more data.
    #[inline]
    pub fn is_continue(self) -> bool {
        self == Self::Continue
    }
}

impl From<u8> for ResponseCode {
    fn from(code: u8) -> Self {
        match code {
            Self::CONTINUE => Self::Continue,
            Self::SUCCESS => Self::Success,
            other => Self::Other(other),
        }
    }
}

impl From<ResponseCode> for u8 {
    fn from(code: ResponseCode) -> u8 {
        code.as_u8()
    }
}
