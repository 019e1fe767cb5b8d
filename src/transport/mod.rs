//! Transport module - the duplex byte channel the session runs over.
//!
//! Discovery, pairing and socket setup happen outside this crate; the
//! caller hands in an already-connected stream.

mod channel;

pub use channel::Channel;
