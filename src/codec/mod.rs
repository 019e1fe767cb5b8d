//! Codec module - text encodings carried inside OBEX headers.
//!
//! Text encoding is chosen per header, not per session:
//!
//! - [`UnicodeCodec`] - null-terminated UTF-16BE (`Name`)
//! - [`AsciiCodec`] - null-terminated ASCII (`Type`)
//! - [`Utf8Codec`] - UTF-8 (`Body` / `EndOfBody` for phone-book objects)
//!
//! # Design
//!
//! Codecs are marker structs with static methods rather than trait objects;
//! the header decides the codec at compile time.
//!
//! # Example
//!
//! ```
//! use obex_pbap::codec::{AsciiCodec, UnicodeCodec};
//!
//! let name = UnicodeCodec::encode("telecom/pb.vcf");
//! assert_eq!(UnicodeCodec::decode(&name).unwrap(), "telecom/pb.vcf");
//!
//! let mime = AsciiCodec::encode("x-bt/phonebook").unwrap();
//! assert_eq!(mime.last(), Some(&0));
//! ```

mod ascii;
mod unicode;
mod utf8;

pub use ascii::AsciiCodec;
pub use unicode::UnicodeCodec;
pub use utf8::Utf8Codec;
