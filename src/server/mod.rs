//! Server Module
//!
//! The networking half of the crate: a readiness-polling reactor, the
//! per-connection state it drives, and the event loop tying them to the
//! command executor.
//!
//! ## Modules
//!
//! - `reactor`: mio-backed readiness polling and socket registration
//! - `reader`: bounded non-blocking reads into an accumulation buffer
//! - `conn`: per-client state (buffer, in-progress command, pending reply)
//! - `server`: accept loop, connection registry, and dispatch

pub mod conn;
pub mod reactor;
pub mod reader;
pub mod server;

pub use conn::{Connection, ConnectionError, Phase, Transition};
pub use reactor::{Reactor, Ready};
pub use reader::{ByteReader, FillOutcome, MAX_BUFFER_SIZE};
pub use server::{Server, ServerStats};
