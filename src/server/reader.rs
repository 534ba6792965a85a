//! Byte Reader for Non-Blocking Sockets
//!
//! Presents reads from a non-blocking socket as always non-blocking: each
//! attempt either lands bytes in the accumulation buffer, reports that the
//! socket has nothing right now, or reports end-of-stream. Bytes already
//! buffered are never discarded, so a token split across reads is simply
//! retried on the next readiness event.

use bytes::BytesMut;
use std::io::{self, Read};

/// Bytes read per attempt
const READ_CHUNK: usize = 4096;

/// Initial capacity of the accumulation buffer
const INITIAL_BUFFER_SIZE: usize = 4096;

/// Hard cap on buffered-but-unparsed bytes (64 KB).
///
/// A client that sends this much without completing a command is speaking
/// something other than the protocol.
pub const MAX_BUFFER_SIZE: usize = 64 * 1024;

/// Result of one bounded read attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillOutcome {
    /// New bytes were appended to the buffer.
    ReadBytes(usize),

    /// The read would block; try again on the next readiness event.
    WouldBlock,

    /// The peer closed its end of the stream.
    Eof,
}

/// Accumulates socket bytes for the parser.
#[derive(Debug)]
pub struct ByteReader {
    buf: BytesMut,
}

impl Default for ByteReader {
    fn default() -> Self {
        Self::new()
    }
}

impl ByteReader {
    pub fn new() -> Self {
        Self {
            buf: BytesMut::with_capacity(INITIAL_BUFFER_SIZE),
        }
    }

    /// The accumulated bytes, for the parser to consume from the front.
    pub fn buffer_mut(&mut self) -> &mut BytesMut {
        &mut self.buf
    }

    /// Bytes currently buffered and not yet consumed.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Whether the accumulation buffer has hit its hard cap.
    pub fn is_full(&self) -> bool {
        self.buf.len() >= MAX_BUFFER_SIZE
    }

    /// One bounded read attempt from `stream` into the buffer.
    ///
    /// Interrupted reads are retried immediately; a would-block outcome is
    /// reported to the caller, which waits for the next readiness event.
    pub fn fill_from(&mut self, stream: &mut impl Read) -> io::Result<FillOutcome> {
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            return match stream.read(&mut chunk) {
                Ok(0) => Ok(FillOutcome::Eof),
                Ok(n) => {
                    self.buf.extend_from_slice(&chunk[..n]);
                    Ok(FillOutcome::ReadBytes(n))
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(FillOutcome::WouldBlock),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => Err(e),
            };
        }
    }
}
