//! Protocol module - OBEX wire format, headers and packets.
//!
//! This module implements the binary framing the session runs on:
//! - Opcodes, response codes and size constants
//! - Typed header encoding/decoding with a by-value cursor
//! - Packet building, parsing and reading from a channel

mod header;
mod packet;
mod wire_format;

pub use header::{
    decode_all, decode_next, encode_fixed, encode_variable, Cursor, Header, HeaderId,
    HeaderLayout, MAX_VARIABLE_PAYLOAD,
};
pub use packet::{
    build_request, build_request_with_prelude, parse_packet, read_packet, read_raw_packet, Packet,
};
pub use wire_format::{
    OpCode, ResponseCode, CONNECT_PRELUDE_SIZE, MAX_PACKET_SIZE, PACKET_PREFIX_SIZE,
    VARIABLE_HEADER_PREFIX_SIZE,
};
