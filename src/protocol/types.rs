//! Wire Types for the RESP Subset
//!
//! This module defines the reply values the server can produce and their
//! byte-exact wire encodings.
//!
//! ## Protocol Format
//!
//! Each frame starts with a type prefix byte:
//! - `+` Simple status
//! - `-` Error
//! - `$` Bulk string
//! - `*` Array (requests only)
//!
//! All frames are terminated with CRLF (`\r\n`).
//!
//! ## Examples
//!
//! Simple status: `+OK\r\n`
//! Error: `-ERR unknown command\r\n`
//! Bulk string: `$5\r\nhello\r\n`
//! Null bulk string: `$-1\r\n`

use bytes::{Bytes, BytesMut};
use std::fmt;

/// The CRLF terminator used by every frame
pub const CRLF: &[u8] = b"\r\n";

/// Frame type prefixes
pub mod prefix {
    pub const STATUS: u8 = b'+';
    pub const ERROR: u8 = b'-';
    pub const BULK: u8 = b'$';
    pub const ARRAY: u8 = b'*';
}

/// The outcome of executing a command, consumed solely by the encoder.
///
/// This is the server-to-client half of the protocol. Requests arrive as
/// arrays of bulk strings and are handled by the parser; replies leave as
/// one of these four frame shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Non-binary status line, e.g. `+OK\r\n` or `+PONG\r\n`.
    /// Must not contain CRLF characters.
    Status(String),

    /// Binary-safe, length-prefixed string: `$<len>\r\n<data>\r\n`
    Bulk(Bytes),

    /// Absent value, encoded as the null bulk string `$-1\r\n`
    Null,

    /// Error line: `-<message>\r\n`
    Error(String),
}

impl Reply {
    /// The canonical success status.
    pub fn ok() -> Self {
        Reply::Status("OK".to_string())
    }

    /// The reply to PING.
    pub fn pong() -> Self {
        Reply::Status("PONG".to_string())
    }

    /// Creates an error reply.
    pub fn error(msg: impl Into<String>) -> Self {
        Reply::Error(msg.into())
    }

    /// Creates a bulk string reply.
    pub fn bulk(data: impl Into<Bytes>) -> Self {
        Reply::Bulk(data.into())
    }

    /// Encodes this reply into its wire format.
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::new();
        self.encode_into(&mut buf);
        buf.freeze()
    }

    /// Encodes this reply into an existing buffer.
    ///
    /// The declared length of a bulk string is always the exact byte length
    /// of its payload; clients read exactly that many bytes plus the
    /// trailing CRLF.
    pub fn encode_into(&self, buf: &mut BytesMut) {
        match self {
            Reply::Status(s) => {
                buf.extend_from_slice(&[prefix::STATUS]);
                buf.extend_from_slice(s.as_bytes());
                buf.extend_from_slice(CRLF);
            }
            Reply::Bulk(data) => {
                buf.extend_from_slice(&[prefix::BULK]);
                buf.extend_from_slice(data.len().to_string().as_bytes());
                buf.extend_from_slice(CRLF);
                buf.extend_from_slice(data);
                buf.extend_from_slice(CRLF);
            }
            Reply::Null => {
                buf.extend_from_slice(&[prefix::BULK]);
                buf.extend_from_slice(b"-1");
                buf.extend_from_slice(CRLF);
            }
            Reply::Error(s) => {
                buf.extend_from_slice(&[prefix::ERROR]);
                buf.extend_from_slice(s.as_bytes());
                buf.extend_from_slice(CRLF);
            }
        }
    }

    /// Returns true if this reply is an error frame.
    pub fn is_error(&self) -> bool {
        matches!(self, Reply::Error(_))
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Status(s) => write!(f, "{}", s),
            Reply::Bulk(data) => {
                if let Ok(s) = std::str::from_utf8(data) {
                    write!(f, "\"{}\"", s)
                } else {
                    write!(f, "(binary data, {} bytes)", data.len())
                }
            }
            Reply::Null => write!(f, "(nil)"),
            Reply::Error(s) => write!(f, "(error) {}", s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_encoding() {
        assert_eq!(&Reply::ok().encode()[..], b"+OK\r\n");
        assert_eq!(&Reply::pong().encode()[..], b"+PONG\r\n");
    }

    #[test]
    fn error_encoding() {
        let reply = Reply::error("ERR unknown command");
        assert_eq!(&reply.encode()[..], b"-ERR unknown command\r\n");
    }

    #[test]
    fn bulk_encoding() {
        let reply = Reply::bulk(Bytes::from("hello"));
        assert_eq!(&reply.encode()[..], b"$5\r\nhello\r\n");
    }

    #[test]
    fn empty_bulk_encoding() {
        let reply = Reply::bulk(Bytes::new());
        assert_eq!(&reply.encode()[..], b"$0\r\n\r\n");
    }

    #[test]
    fn null_encoding() {
        assert_eq!(&Reply::Null.encode()[..], b"$-1\r\n");
    }

    #[test]
    fn bulk_length_matches_payload_exactly() {
        // Binary-safe: embedded CRLF and NUL bytes must not change the
        // declared length.
        let payload = Bytes::from(&b"a\r\nb\x00c"[..]);
        let encoded = Reply::bulk(payload.clone()).encode();
        assert_eq!(&encoded[..], b"$6\r\na\r\nb\x00c\r\n");
        assert_eq!(payload.len(), 6);
    }

    #[test]
    fn encode_into_appends() {
        let mut buf = BytesMut::new();
        Reply::ok().encode_into(&mut buf);
        Reply::Null.encode_into(&mut buf);
        assert_eq!(&buf[..], b"+OK\r\n$-1\r\n");
    }
}
