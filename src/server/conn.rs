//! Per-Client Connection State
//!
//! A [`Connection`] binds one accepted socket to its byte reader, the
//! command currently being assembled, and the response bytes awaiting
//! flush. The event loop owns every connection and drives it through an
//! explicit phase value rather than stored callbacks, so the resumption
//! point is always inspectable:
//!
//! ```text
//!            readable event                      writable event
//!                 │                                    │
//!                 ▼                                    ▼
//! ┌──────────────────────────────┐     ┌──────────────────────────────┐
//! │ Phase::Reading               │     │ Phase::Writing               │
//! │  fill buffer from socket     │     │  flush outbound bytes        │
//! │  resume command builder      │────>│  then serve any command      │
//! │  execute on completion       │     │  already buffered, or flip   │
//! │  queue reply, flip to write  │<────│  back to read interest       │
//! └──────────────────────────────┘     └──────────────────────────────┘
//! ```
//!
//! Per connection, traffic is strictly sequential: one request, its
//! response, then the next request. Bytes of a following command that
//! arrive early stay in the accumulation buffer and are served after the
//! current response has been flushed.

use crate::command::Executor;
use crate::protocol::{CommandBuilder, ParseError, ParseOutcome, Reply};
use crate::server::reader::{ByteReader, FillOutcome};
use bytes::{Buf, BytesMut};
use mio::net::TcpStream;
use std::io::{self, Write};
use std::net::SocketAddr;
use thiserror::Error;
use tracing::trace;

/// What a connection is waiting for.
///
/// This is the tagged "what to do next" state the event loop dispatches
/// on; exactly one of the two I/O directions is armed at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for request bytes
    Reading,
    /// Waiting for the socket to accept response bytes
    Writing,
}

/// What the event loop should do with the connection after a callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Arm read interest and wait for request bytes
    AwaitRead,
    /// Arm write interest and wait to flush the response
    AwaitWrite,
    /// The peer closed the stream; deregister and drop silently
    Closed,
}

/// Errors that end a connection.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// Socket-level failure
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The client sent bytes that are not the protocol
    #[error("protocol error: {0}")]
    Protocol(#[from] ParseError),

    /// The client buffered a frame larger than the accumulation cap
    #[error("read buffer limit exceeded")]
    BufferFull,
}

impl ConnectionError {
    /// Whether the client should be sent a best-effort error frame before
    /// the connection is dropped.
    pub fn deserves_error_frame(&self) -> bool {
        matches!(self, ConnectionError::Protocol(_) | ConnectionError::BufferFull)
    }

    /// The wire error frame for this failure.
    pub fn to_error_frame(&self) -> Reply {
        Reply::error(format!("ERR {}", self))
    }
}

/// One client connection and everything needed to resume it.
#[derive(Debug)]
pub struct Connection {
    stream: TcpStream,
    addr: SocketAddr,
    reader: ByteReader,
    /// Command under construction; replaced with a fresh builder each time
    /// a command is finalized
    builder: CommandBuilder,
    /// Response bytes not yet accepted by the socket
    outbound: BytesMut,
    phase: Phase,
}

impl Connection {
    pub fn new(stream: TcpStream, addr: SocketAddr) -> io::Result<Self> {
        stream.set_nodelay(true)?;
        Ok(Self {
            stream,
            addr,
            reader: ByteReader::new(),
            builder: CommandBuilder::new(),
            outbound: BytesMut::new(),
            phase: Phase::Reading,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The socket, for registration with the reactor.
    pub fn stream_mut(&mut self) -> &mut TcpStream {
        &mut self.stream
    }

    /// Drives the connection on a readable event: drain the socket, resume
    /// the command builder, and execute any command that completes.
    pub fn on_readable(&mut self, executor: &mut Executor) -> Result<Transition, ConnectionError> {
        loop {
            if self.reader.is_full() {
                return Err(ConnectionError::BufferFull);
            }
            match self.reader.fill_from(&mut self.stream)? {
                FillOutcome::ReadBytes(n) => {
                    trace!(client = %self.addr, bytes = n, "read");
                }
                FillOutcome::WouldBlock => break,
                FillOutcome::Eof => {
                    // Peer closed; any in-progress command is discarded,
                    // never executed.
                    if self.reader.buffered() > 0 {
                        trace!(
                            client = %self.addr,
                            discarded = self.reader.buffered(),
                            "peer closed mid-command"
                        );
                    }
                    return Ok(Transition::Closed);
                }
            }
        }

        self.process_buffered(executor)
    }

    /// Drives the connection on a writable event: flush pending response
    /// bytes, then serve any command that was already fully buffered.
    pub fn on_writable(&mut self, executor: &mut Executor) -> Result<Transition, ConnectionError> {
        while !self.outbound.is_empty() {
            match self.stream.write(&self.outbound) {
                Ok(0) => return Err(io::Error::from(io::ErrorKind::WriteZero).into()),
                Ok(n) => {
                    trace!(client = %self.addr, bytes = n, "wrote");
                    self.outbound.advance(n);
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    return Ok(Transition::AwaitWrite);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }

        self.phase = Phase::Reading;
        self.process_buffered(executor)
    }

    /// Resumes the builder against buffered bytes. At most one command is
    /// executed per call; its reply is queued and the phase flips to
    /// writing.
    fn process_buffered(&mut self, executor: &mut Executor) -> Result<Transition, ConnectionError> {
        match self.builder.advance(self.reader.buffer_mut())? {
            ParseOutcome::Suspended => Ok(Transition::AwaitRead),
            ParseOutcome::Complete(command) => {
                // The finalized command's parser state is done with;
                // the next command starts from a fresh builder.
                self.builder = CommandBuilder::new();
                trace!(client = %self.addr, command = command.name(), "dispatch");

                let reply = executor.execute(command);
                reply.encode_into(&mut self.outbound);
                self.phase = Phase::Writing;
                Ok(Transition::AwaitWrite)
            }
        }
    }

    /// Best-effort single attempt to put an error frame on the wire before
    /// the connection is dropped. Failure here is ignored; the connection
    /// is closing either way.
    pub fn send_error_frame(&mut self, error: &ConnectionError) {
        let frame = error.to_error_frame().encode();
        let _ = self.stream.write(&frame);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_errors_deserve_an_error_frame() {
        let err = ConnectionError::Protocol(ParseError::InvalidArrayLength(0));
        assert!(err.deserves_error_frame());
        assert_eq!(
            &err.to_error_frame().encode()[..],
            b"-ERR protocol error: invalid array length: 0\r\n"
        );
    }

    #[test]
    fn io_errors_close_silently() {
        let err = ConnectionError::Io(io::Error::from(io::ErrorKind::ConnectionReset));
        assert!(!err.deserves_error_frame());
    }

    #[test]
    fn buffer_overflow_deserves_an_error_frame() {
        assert!(ConnectionError::BufferFull.deserves_error_frame());
    }
}
