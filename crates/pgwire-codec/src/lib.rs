//! # pgwire-codec
//!
//! The staging layer between a PostgreSQL transport and the value codecs.
//!
//! A [`Buffer`] is a fixed-capacity byte area with a read cursor and a write
//! cursor. Value codecs only ever touch bytes that are already staged; moving
//! bytes between the buffer and the network happens strictly between codec
//! steps, through a [`Transport`] (blocking) or a [`BufferedStream`] (tokio).
//!
//! ## Architecture
//!
//! ```text
//! socket ⇄ Transport / BufferedStream ⇄ Buffer ⇄ value state machines
//! ```
//!
//! ## Example
//!
//! ```rust
//! use pgwire_codec::Buffer;
//!
//! let mut buf = Buffer::new(16);
//! buf.write_i32(42);
//! buf.write_str("hi");
//! assert_eq!(buf.readable_bytes(), 6);
//!
//! assert_eq!(buf.read_i32(), 42);
//! assert_eq!(buf.read_string(2), "hi");
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod buffer;
pub mod config;
pub mod error;
pub mod stream;
pub mod text;
pub mod transport;

pub use buffer::Buffer;
pub use config::BufferConfig;
pub use error::CodecError;
pub use stream::BufferedStream;
pub use transport::{IoTransport, Transport};
