//! Readiness-Polling Reactor
//!
//! A thin wrapper over `mio::Poll` that owns the event buffer and the
//! registry of monitored sockets. The server blocks only inside
//! [`Reactor::poll_ready`]; everything else runs to completion between
//! polls.
//!
//! Interrupted polls are retried transparently. Any other poll failure is
//! returned to the caller and is fatal to the event loop, since it means
//! the reactor itself is unusable.

use mio::event::Source;
use mio::{Events, Interest, Poll, Token};
use std::io;
use std::time::Duration;

/// Default capacity of the readiness event buffer
const EVENT_CAPACITY: usize = 1024;

/// One socket's readiness, as reported by a poll cycle.
#[derive(Debug, Clone, Copy)]
pub struct Ready {
    pub token: Token,
    pub readable: bool,
    pub writable: bool,
}

/// Multiplexes an unbounded number of sockets on one thread.
pub struct Reactor {
    poll: Poll,
    events: Events,
}

impl std::fmt::Debug for Reactor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reactor").finish_non_exhaustive()
    }
}

impl Reactor {
    pub fn new() -> io::Result<Self> {
        Ok(Self {
            poll: Poll::new()?,
            events: Events::with_capacity(EVENT_CAPACITY),
        })
    }

    /// Starts monitoring a socket for the given interest.
    pub fn register(
        &self,
        source: &mut impl Source,
        token: Token,
        interest: Interest,
    ) -> io::Result<()> {
        self.poll.registry().register(source, token, interest)
    }

    /// Changes the interest of an already-registered socket.
    pub fn reregister(
        &self,
        source: &mut impl Source,
        token: Token,
        interest: Interest,
    ) -> io::Result<()> {
        self.poll.registry().reregister(source, token, interest)
    }

    /// Stops monitoring a socket.
    pub fn deregister(&self, source: &mut impl Source) -> io::Result<()> {
        self.poll.registry().deregister(source)
    }

    /// Blocks until at least one registered socket is ready (or the timeout
    /// elapses) and returns the ready subset.
    ///
    /// Each returned entry corresponds to one socket; the caller invokes at
    /// most one callback per entry per cycle.
    pub fn poll_ready(&mut self, timeout: Option<Duration>) -> io::Result<Vec<Ready>> {
        loop {
            match self.poll.poll(&mut self.events, timeout) {
                Ok(()) => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }

        Ok(self
            .events
            .iter()
            .map(|event| Ready {
                token: event.token(),
                readable: event.is_readable(),
                writable: event.is_writable(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mio::net::TcpListener;
    use std::net::TcpStream;

    #[test]
    fn listener_becomes_readable_on_connect() {
        let mut reactor = Reactor::new().unwrap();
        let mut listener = TcpListener::bind("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();

        reactor
            .register(&mut listener, Token(7), Interest::READABLE)
            .unwrap();

        let _client = TcpStream::connect(addr).unwrap();

        // Poll until the accept readiness shows up.
        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        loop {
            let ready = reactor
                .poll_ready(Some(Duration::from_millis(100)))
                .unwrap();
            if ready.iter().any(|r| r.token == Token(7) && r.readable) {
                break;
            }
            assert!(std::time::Instant::now() < deadline, "no readiness event");
        }
    }

    #[test]
    fn timeout_returns_empty_set() {
        let mut reactor = Reactor::new().unwrap();
        let ready = reactor.poll_ready(Some(Duration::from_millis(10))).unwrap();
        assert!(ready.is_empty());
    }

    #[test]
    fn deregistered_socket_reports_nothing() {
        let mut reactor = Reactor::new().unwrap();
        let mut listener = TcpListener::bind("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();

        reactor
            .register(&mut listener, Token(1), Interest::READABLE)
            .unwrap();
        reactor.deregister(&mut listener).unwrap();

        let _client = TcpStream::connect(addr).unwrap();
        let ready = reactor.poll_ready(Some(Duration::from_millis(50))).unwrap();
        assert!(ready.iter().all(|r| r.token != Token(1)));
    }
}
