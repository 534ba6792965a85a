//! The Event-Loop Server
//!
//! One thread, one poll call outstanding at a time, one callback per ready
//! socket per cycle. The server owns the listening socket, the registry of
//! live connections keyed by token, and the command executor (which in turn
//! owns the store). Nothing in the data path is shared across threads, so
//! nothing is locked.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        run_forever                          │
//! │                                                             │
//! │   poll ──> ready sockets ──┬─> LISTENER: accept, register   │
//! │     ▲                      │                                │
//! │     │                      └─> token: drive connection      │
//! │     │                            │                          │
//! │     └────────────────────────────┘                          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! A failure while driving one connection closes that connection only;
//! the loop keeps serving everyone else. A poll failure other than an
//! interruption terminates `run_forever`, since the reactor itself is
//! broken at that point.

use crate::command::Executor;
use crate::server::conn::{Connection, ConnectionError, Phase, Transition};
use crate::server::reactor::{Reactor, Ready};
use crate::storage::Store;
use mio::net::TcpListener;
use mio::{Interest, Token};
use std::collections::HashMap;
use std::io;
use std::net::SocketAddr;
use tracing::{debug, error, info, warn};

/// Token reserved for the listening socket
const LISTENER: Token = Token(0);

/// Counters for server activity. Single-threaded, so plain integers.
#[derive(Debug, Default)]
pub struct ServerStats {
    pub connections_accepted: u64,
    pub active_connections: u64,
}

/// A single-threaded key-value server.
///
/// # Example
///
/// ```no_run
/// use emberkv::server::Server;
/// use emberkv::storage::Store;
///
/// let mut server = Server::bind("127.0.0.1:6379".parse().unwrap(), Store::new()).unwrap();
/// server.run_forever().unwrap();
/// ```
#[derive(Debug)]
pub struct Server {
    listener: TcpListener,
    local_addr: SocketAddr,
    reactor: Reactor,
    connections: HashMap<Token, Connection>,
    executor: Executor,
    next_token: usize,
    stats: ServerStats,
}

impl Server {
    /// Binds the listening socket and registers it with a fresh reactor.
    ///
    /// The store is owned by this instance; independent servers in one
    /// process (useful in tests) never share state.
    pub fn bind(addr: SocketAddr, store: Store) -> io::Result<Self> {
        let mut listener = TcpListener::bind(addr)?;
        let local_addr = listener.local_addr()?;
        let reactor = Reactor::new()?;
        reactor.register(&mut listener, LISTENER, Interest::READABLE)?;

        Ok(Self {
            listener,
            local_addr,
            reactor,
            connections: HashMap::new(),
            executor: Executor::new(store),
            next_token: 1,
            stats: ServerStats::default(),
        })
    }

    /// The address the listener actually bound (relevant when binding
    /// port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn stats(&self) -> &ServerStats {
        &self.stats
    }

    /// Runs the event loop until a fatal reactor error.
    ///
    /// Blocks only inside the readiness poll. Within one cycle, each ready
    /// socket's callback runs at most once; invocation order across
    /// distinct sockets is unspecified.
    pub fn run_forever(&mut self) -> io::Result<()> {
        info!(addr = %self.local_addr, "listening");

        loop {
            let ready = self.reactor.poll_ready(None)?;
            for r in ready {
                match r.token {
                    LISTENER => self.accept_ready(),
                    token => self.drive_connection(token, r),
                }
            }
        }
    }

    /// Accepts every connection currently queued on the listener.
    fn accept_ready(&mut self) {
        loop {
            match self.listener.accept() {
                Ok((stream, addr)) => {
                    if let Err(e) = self.register_connection(stream, addr) {
                        warn!(client = %addr, error = %e, "failed to register connection");
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    error!(error = %e, "accept failed");
                    break;
                }
            }
        }
    }

    fn register_connection(&mut self, stream: mio::net::TcpStream, addr: SocketAddr) -> io::Result<()> {
        let token = Token(self.next_token);
        self.next_token += 1;

        let mut conn = Connection::new(stream, addr)?;
        self.reactor
            .register(conn.stream_mut(), token, Interest::READABLE)?;
        self.connections.insert(token, conn);

        self.stats.connections_accepted += 1;
        self.stats.active_connections += 1;
        debug!(client = %addr, token = token.0, "client connected");
        Ok(())
    }

    /// Invokes the one callback this connection's phase and the event's
    /// readiness agree on.
    fn drive_connection(&mut self, token: Token, ready: Ready) {
        // A token may surface after its connection was closed earlier in
        // the same cycle.
        let Some(conn) = self.connections.get_mut(&token) else {
            return;
        };

        let result = match conn.phase() {
            Phase::Reading if ready.readable => conn.on_readable(&mut self.executor),
            Phase::Writing if ready.writable => conn.on_writable(&mut self.executor),
            // Readiness for an interest we no longer hold; ignore.
            _ => return,
        };

        match result {
            Ok(Transition::AwaitRead) => self.rearm(token, Interest::READABLE),
            Ok(Transition::AwaitWrite) => self.rearm(token, Interest::WRITABLE),
            Ok(Transition::Closed) => self.close_connection(token, None),
            Err(e) => self.close_connection(token, Some(e)),
        }
    }

    fn rearm(&mut self, token: Token, interest: Interest) {
        let Some(conn) = self.connections.get_mut(&token) else {
            return;
        };
        if let Err(e) = self.reactor.reregister(conn.stream_mut(), token, interest) {
            warn!(client = %conn.addr(), error = %e, "reregister failed");
            self.close_connection(token, Some(e.into()));
        }
    }

    /// Deregisters and drops one connection. An error here never touches
    /// any other connection or the loop itself.
    fn close_connection(&mut self, token: Token, error: Option<ConnectionError>) {
        let Some(mut conn) = self.connections.remove(&token) else {
            return;
        };

        match &error {
            None => debug!(client = %conn.addr(), "client disconnected"),
            Some(e) if e.deserves_error_frame() => {
                warn!(client = %conn.addr(), error = %e, "closing connection after protocol error");
                conn.send_error_frame(e);
            }
            Some(ConnectionError::Io(io_err))
                if matches!(
                    io_err.kind(),
                    io::ErrorKind::ConnectionReset
                        | io::ErrorKind::ConnectionAborted
                        | io::ErrorKind::BrokenPipe
                ) =>
            {
                debug!(client = %conn.addr(), "connection reset by client");
            }
            Some(e) => warn!(client = %conn.addr(), error = %e, "connection error"),
        }

        if let Err(e) = self.reactor.deregister(conn.stream_mut()) {
            warn!(client = %conn.addr(), error = %e, "deregister failed");
        }
        self.stats.active_connections = self.stats.active_connections.saturating_sub(1);
        debug!(
            commands = self.executor.commands_executed(),
            active = self.stats.active_connections,
            "connection closed"
        );
    }
}
