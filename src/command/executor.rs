//! Command Executor
//!
//! The executor is the sole writer of store state. It deterministically
//! maps a finalized [`Command`] to a store operation and a [`Reply`]:
//!
//! | Command | Effect                                   | Reply              |
//! |---------|------------------------------------------|--------------------|
//! | PING    | none                                     | `+PONG`            |
//! | ECHO    | none                                     | bulk message       |
//! | SET     | upsert, with absolute expiry if declared | `+OK`              |
//! | GET     | lazily evict if expired                  | bulk value or null |
//!
//! The executor owns its [`Store`]; the store's lifetime is scoped to the
//! server instance it was built for, so independent servers in the same
//! process never share state.

use crate::command::Command;
use crate::protocol::Reply;
use crate::storage::Store;
use tracing::trace;

/// Executes commands against an owned store.
#[derive(Debug)]
pub struct Executor {
    store: Store,
    commands_executed: u64,
}

impl Executor {
    /// Creates an executor around the given store.
    pub fn new(store: Store) -> Self {
        Self {
            store,
            commands_executed: 0,
        }
    }

    /// Runs one command to completion and returns its reply.
    pub fn execute(&mut self, command: Command) -> Reply {
        self.commands_executed += 1;
        trace!(command = command.name(), "executing");

        match command {
            Command::Ping => Reply::pong(),
            Command::Echo { message } => Reply::Bulk(message),
            Command::Set { key, value, expiry } => {
                match expiry {
                    Some(ttl) => self.store.set_with_ttl(key, value, ttl),
                    None => self.store.set(key, value),
                }
                Reply::ok()
            }
            Command::Get { key } => match self.store.get(&key) {
                Some(value) => Reply::Bulk(value),
                None => Reply::Null,
            },
        }
    }

    /// Total commands executed over the lifetime of this executor.
    pub fn commands_executed(&self) -> u64 {
        self.commands_executed
    }

    /// The underlying store.
    pub fn store(&self) -> &Store {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{ManualClock, Store};
    use bytes::Bytes;
    use std::time::Duration;

    fn executor() -> Executor {
        Executor::new(Store::new())
    }

    #[test]
    fn ping_returns_pong() {
        assert_eq!(executor().execute(Command::Ping), Reply::pong());
    }

    #[test]
    fn echo_returns_message_as_bulk() {
        let reply = executor().execute(Command::Echo {
            message: Bytes::from("hello"),
        });
        assert_eq!(reply, Reply::Bulk(Bytes::from("hello")));
    }

    #[test]
    fn set_then_get_returns_value() {
        let mut exec = executor();
        let reply = exec.execute(Command::Set {
            key: Bytes::from("name"),
            value: Bytes::from("Ariz"),
            expiry: None,
        });
        assert_eq!(reply, Reply::ok());

        let reply = exec.execute(Command::Get {
            key: Bytes::from("name"),
        });
        assert_eq!(reply, Reply::Bulk(Bytes::from("Ariz")));
    }

    #[test]
    fn get_missing_key_returns_null() {
        let reply = executor().execute(Command::Get {
            key: Bytes::from("missing"),
        });
        assert_eq!(reply, Reply::Null);
    }

    #[test]
    fn set_overwrites_existing_value() {
        let mut exec = executor();
        exec.execute(Command::Set {
            key: Bytes::from("k"),
            value: Bytes::from("one"),
            expiry: None,
        });
        exec.execute(Command::Set {
            key: Bytes::from("k"),
            value: Bytes::from("two"),
            expiry: None,
        });
        assert_eq!(
            exec.execute(Command::Get {
                key: Bytes::from("k")
            }),
            Reply::Bulk(Bytes::from("two"))
        );
    }

    #[test]
    fn get_before_and_after_expiry() {
        let clock = ManualClock::new();
        let mut exec = Executor::new(Store::with_clock(clock.clone()));

        exec.execute(Command::Set {
            key: Bytes::from("session"),
            value: Bytes::from("token"),
            expiry: Some(Duration::from_millis(100)),
        });

        // Before the deadline the value is visible.
        clock.advance(Duration::from_millis(99));
        assert_eq!(
            exec.execute(Command::Get {
                key: Bytes::from("session")
            }),
            Reply::Bulk(Bytes::from("token"))
        );

        // At the deadline it reads as absent.
        clock.advance(Duration::from_millis(1));
        assert_eq!(
            exec.execute(Command::Get {
                key: Bytes::from("session")
            }),
            Reply::Null
        );
    }

    #[test]
    fn command_counter_increments() {
        let mut exec = executor();
        assert_eq!(exec.commands_executed(), 0);
        exec.execute(Command::Ping);
        exec.execute(Command::Ping);
        assert_eq!(exec.commands_executed(), 2);
    }

    #[test]
    fn independent_executors_do_not_share_state() {
        let mut a = executor();
        let mut b = executor();
        a.execute(Command::Set {
            key: Bytes::from("k"),
            value: Bytes::from("v"),
            expiry: None,
        });
        assert_eq!(
            b.execute(Command::Get {
                key: Bytes::from("k")
            }),
            Reply::Null
        );
    }
}
