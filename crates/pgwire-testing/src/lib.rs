//! # pgwire-testing
//!
//! Test infrastructure for the pgwire chunked codecs.
//!
//! ## Features
//!
//! - [`ScriptedTransport`]: an in-memory [`Transport`](pgwire_codec::Transport)
//!   with bounded fill sizes and drain/direct-write accounting
//! - [`fixtures`]: text samples that mix one- to four-byte characters
//!
//! ## Example
//!
//! ```rust
//! use pgwire_codec::{Buffer, Transport};
//! use pgwire_testing::ScriptedTransport;
//!
//! let mut out = ScriptedTransport::empty();
//! let mut buf = Buffer::new(8);
//! buf.write_str("hello");
//! out.drain(&mut buf).unwrap();
//!
//! // Feed what was written back, two bytes per fill.
//! let mut input = out.replay().with_max_fill(2);
//! assert_eq!(input.fill(&mut buf).unwrap(), 2);
//! assert_eq!(buf.readable(), b"he");
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod fixtures;
pub mod transport;

pub use transport::ScriptedTransport;
