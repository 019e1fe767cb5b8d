//! # obex-pbap
//!
//! Client engine for the Phone Book Access Profile (PBAP) over OBEX.
//!
//! This crate retrieves contact data (vCards, call history) from a phone
//! over an already-established duplex byte stream. Device discovery,
//! pairing and socket setup are left to the caller.
//!
//! ## Architecture
//!
//! - **Protocol** (`protocol`): OBEX packet framing and the typed header codec
//! - **Session** (`session`): Connect, pull and Disconnect request/response steps
//! - **Client** (`PhonebookClient`): connection state and the multi-packet
//!   retrieval loop
//!
//! ## Example
//!
//! ```ignore
//! use obex_pbap::{Folder, PhonebookClient, PhonebookObject};
//!
//! #[tokio::main]
//! async fn main() -> obex_pbap::Result<()> {
//!     let stream = tokio::net::TcpStream::connect("127.0.0.1:6500").await?;
//!     let mut client = PhonebookClient::new(stream);
//!
//!     client.connect().await?;
//!     let calls = client
//!         .pull_phonebook(&PhonebookObject::phone(Folder::MissedCalls))
//!         .await?;
//!     client.disconnect().await?;
//!
//!     print!("{}", calls);
//!     Ok(())
//! }
//! ```

pub mod codec;
pub mod error;
pub mod protocol;
pub mod session;
pub mod transport;

mod client;
mod config;
mod profile;

pub use client::{ClientBuilder, PhonebookClient};
pub use config::{
    ClientConfig, ConnectionIdPolicy, DEFAULT_MAX_CONTINUATIONS, DEFAULT_SETTLE_DELAY,
};
pub use error::{
    ContinuationLimit, EncodingError, IoError, ObexError, ParseError, ProtocolError, Result,
};
pub use profile::{
    Folder, PhonebookObject, Repository, DEFAULT_MAX_PACKET_SIZE, OBEX_VERSION, PBAP_TARGET,
    PHONEBOOK_TYPE,
};
pub use session::{ConnectionId, ConnectionPhase};
