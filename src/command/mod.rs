//! Command Layer
//!
//! A [`Command`] is the structured, immutable representation of one decoded
//! request. The parser builds it incrementally; once finalized it is
//! read-only. The [`Executor`] maps a finalized command to a store
//! operation and produces a [`crate::protocol::Reply`].
//!
//! ```text
//! wire bytes ──> CommandBuilder ──> Command ──> Executor ──> Reply
//! ```

pub mod executor;

pub use executor::Executor;

use bytes::Bytes;
use std::time::Duration;

/// A finalized client request.
///
/// Immutable once built: the parser locks it when the declared array has
/// been fully consumed, and the executor only reads it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `PING` (no arguments)
    Ping,

    /// `ECHO message`
    Echo { message: Bytes },

    /// `GET key`
    Get { key: Bytes },

    /// `SET key value [EX seconds | PX milliseconds]`
    Set {
        key: Bytes,
        value: Bytes,
        /// Relative expiry from the recognized option pair, if any
        expiry: Option<Duration>,
    },
}

impl Command {
    /// The wire name of this command.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Ping => "PING",
            Command::Echo { .. } => "ECHO",
            Command::Get { .. } => "GET",
            Command::Set { .. } => "SET",
        }
    }
}
