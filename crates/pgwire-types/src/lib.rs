//! # pgwire-types
//!
//! Resumable, chunked transfer of PostgreSQL values through a fixed-capacity
//! [`Buffer`](pgwire_codec::Buffer).
//!
//! A value's encoded length is always known before its bytes move, but the
//! bytes themselves may arrive or depart in buffer-sized pieces. Every
//! transfer is therefore an explicit state machine that the caller steps,
//! refilling or draining the buffer in between:
//!
//! - [`ChunkedRead`] decodes a value once all of its bytes have been staged,
//!   allocating a dedicated overflow area only for values larger than the
//!   buffer.
//! - [`DirectWrite`] and [`EncodeWrite`] append a value, handing oversized
//!   byte-like values to the transport directly and encoding oversized
//!   character arrays chunk by chunk.
//! - [`CharReader`] serves arbitrary character ranges of a text value.
//!
//! [`Handler`] maps a server type name to the right state machine, and the
//! [`driver`] module loops state machines against a transport.
//!
//! ## Example
//!
//! ```rust
//! use pgwire_codec::{Buffer, IoTransport, Transport};
//! use pgwire_protocol::FormatCode;
//! use pgwire_types::{Handler, LengthCache, WireValue, driver};
//!
//! let mut transport = IoTransport::new(std::io::Cursor::new(Vec::new()));
//! let mut buf = Buffer::new(8);
//! let mut cache = LengthCache::new();
//!
//! let value = WireValue::from("a value longer than the buffer");
//! let handler = Handler::for_type_name("varchar").unwrap();
//! handler
//!     .validate_and_get_length(&value, FormatCode::Text, &mut cache)
//!     .unwrap();
//! let mut op = handler
//!     .prepare_write(value, FormatCode::Text, &mut cache)
//!     .unwrap();
//!
//! driver::drive_write(&mut transport, &mut buf, |b| op.step(b)).unwrap();
//! transport.drain(&mut buf).unwrap();
//! assert_eq!(
//!     transport.get_ref().get_ref(),
//!     b"a value longer than the buffer"
//! );
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod chars;
pub mod driver;
pub mod encoder;
pub mod error;
pub mod handler;
pub mod length_cache;
pub mod read;
pub mod value;
pub mod write;

pub use chars::{CharAccessRead, CharReader};
pub use driver::{Column, RowReader, RowWriter};
pub use encoder::CharEncoder;
pub use error::TypeError;
pub use handler::{Handler, ReadOp, WriteOp};
pub use length_cache::LengthCache;
pub use read::{ChunkedRead, ReadTarget, SkipTransfer};
pub use value::WireValue;
pub use write::{DirectWrite, EncodeWrite, WriteStatus};
