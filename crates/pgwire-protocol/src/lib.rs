//! # pgwire-protocol
//!
//! Low-level primitives of the PostgreSQL frontend/backend wire format.
//!
//! This crate holds the stateless pieces every value codec builds on:
//!
//! - [`codec`]: big-endian integers, null-terminated strings, fixed-width
//!   zero-padded strings and host/network byte-order conversion
//! - [`escape`]: the legacy octal-escaped and hex text forms of `bytea`
//! - [`utf8`]: character-boundary detection and pessimistic character counts
//!   for byte runs that may end in the middle of a character
//! - [`format`]: the text/binary format code attached to every value
//!
//! ## Design Philosophy
//!
//! This crate is intentionally IO-agnostic. It contains no buffering or
//! networking logic; `pgwire-codec` owns the staging buffer and the transport
//! seam, and `pgwire-types` drives values through them.
//!
//! ## Example
//!
//! ```rust
//! use bytes::BytesMut;
//! use pgwire_protocol::codec::{read_cstring, write_cstring};
//!
//! let mut buf = BytesMut::new();
//! write_cstring(&mut buf, "client_encoding");
//! assert_eq!(buf.len(), 16);
//!
//! let mut src = buf.freeze();
//! assert_eq!(read_cstring(&mut src).unwrap(), "client_encoding");
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod codec;
pub mod error;
pub mod escape;
pub mod format;
pub mod utf8;

pub use codec::NetworkOrder;
pub use error::ProtocolError;
pub use format::FormatCode;
pub use utf8::{exact_char_count, is_complete_boundary, pessimistic_char_count};
