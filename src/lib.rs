//! # EmberKV - A Single-Threaded, Event-Driven Key-Value Server
//!
//! EmberKV is an in-memory key-value server that speaks a subset of the
//! RESP protocol (PING, ECHO, SET, GET) over TCP. One thread serves every
//! client: a readiness-polling event loop dispatches per-socket work, and
//! an incremental parser reassembles each command across however many
//! partial reads the network delivers.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────────┐
//! │                             EmberKV                                │
//! │                                                                    │
//! │  ┌───────────┐  readiness   ┌─────────────┐   resume   ┌─────────┐ │
//! │  │  Reactor  │─────────────>│ Connection  │───────────>│ Command │ │
//! │  │ (mio poll)│              │ reader +    │            │ Builder │ │
//! │  └───────────┘              │ outbound    │            └────┬────┘ │
//! │        ▲                    └─────────────┘                 │      │
//! │        │ flip interest             ▲                complete│      │
//! │        │ read ⇄ write              │ encoded reply          ▼      │
//! │        │                    ┌─────────────┐            ┌─────────┐ │
//! │        └────────────────────│   Encoder   │<───────────│Executor │ │
//! │                             └─────────────┘            └────┬────┘ │
//! │                                                             ▼      │
//! │                                                        ┌─────────┐ │
//! │                                                        │  Store  │ │
//! │                                                        └─────────┘ │
//! └────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Control flow for one request: the reactor reports a socket readable,
//! the connection drains it into its accumulation buffer, the command
//! builder resumes where it left off, and once a command completes the
//! executor runs it against the store. The encoded reply flips the
//! connection's interest to write; after the flush, interest flips back
//! to read.
//!
//! ## Design Highlights
//!
//! ### Suspension Instead of Blocking
//!
//! A read that would block is not an error and not a busy-wait. The
//! command builder parks its state (down to a half-received bulk-string
//! payload) and the connection simply waits for the next readiness event.
//! Feeding the parser one byte per event produces byte-for-byte the same
//! command as one large read.
//!
//! ### No Locks
//!
//! Exactly one poll call is outstanding and exactly one callback runs at
//! a time, so the store and every connection buffer are accessed from a
//! single thread. There is nothing to synchronize.
//!
//! ### Lazy Expiry
//!
//! `SET` with `EX`/`PX` records an absolute deadline. The deadline is
//! checked when the key is read and the entry evicted at that moment; an
//! expired key is indistinguishable from a missing one.
//!
//! ## Quick Start
//!
//! ```no_run
//! use emberkv::server::Server;
//! use emberkv::storage::Store;
//!
//! let mut server = Server::bind("127.0.0.1:6379".parse().unwrap(), Store::new()).unwrap();
//! server.run_forever().unwrap();
//! ```
//!
//! ## Module Overview
//!
//! - [`protocol`]: command builder state machine and reply encoding
//! - [`command`]: the finalized [`Command`] value and its executor
//! - [`storage`]: the key-value map with lazy expiry and injected clock
//! - [`server`]: reactor, connections, and the event loop

pub mod command;
pub mod protocol;
pub mod server;
pub mod storage;

// Re-export commonly used types for convenience
pub use command::{Command, Executor};
pub use protocol::{CommandBuilder, ParseError, ParseOutcome, Reply};
pub use server::Server;
pub use storage::Store;

/// The default port EmberKV listens on (same as Redis)
pub const DEFAULT_PORT: u16 = 6379;

/// The default host EmberKV binds to
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Version of EmberKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
