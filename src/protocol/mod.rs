//! Wire Protocol Implementation
//!
//! This module implements the subset of the RESP protocol the server
//! speaks: array-of-bulk-string requests in, status / bulk / null / error
//! frames out.
//!
//! ## Modules
//!
//! - `types`: the [`Reply`] value and its byte-exact encoding
//! - `parser`: the incremental, resumable command builder
//!
//! ## Example
//!
//! ```
//! use emberkv::protocol::{CommandBuilder, ParseOutcome, Reply};
//! use bytes::BytesMut;
//!
//! let mut buf = BytesMut::from(&b"*1\r\n$4\r\nPING\r\n"[..]);
//! let outcome = CommandBuilder::new().advance(&mut buf).unwrap();
//! assert!(matches!(outcome, ParseOutcome::Complete(_)));
//!
//! assert_eq!(&Reply::pong().encode()[..], b"+PONG\r\n");
//! ```

pub mod parser;
pub mod types;

pub use parser::{CommandBuilder, ParseError, ParseOutcome, Stage, MAX_BULK_SIZE};
pub use types::{Reply, CRLF};
