//! In-Memory Store with Lazy Expiry
//!
//! The store is a plain map from key to value with an optional absolute
//! expiry deadline per entry. The event loop is single-threaded and the
//! executor is the store's only writer, so there is no locking anywhere in
//! the data path.
//!
//! ## Expiry
//!
//! Expiry is lazy: a deadline is checked when the key is read, and an
//! expired entry is removed at that moment. There is no background sweep.
//! A read of an expired entry is indistinguishable from a read of an
//! absent one.

use crate::storage::clock::{Clock, MonotonicClock};
use bytes::Bytes;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// A stored value with an optional expiry deadline.
#[derive(Debug, Clone)]
pub struct Entry {
    /// The stored value
    pub value: Bytes,
    /// Absolute deadline after which the entry reads as absent
    pub expires_at: Option<Instant>,
}

impl Entry {
    /// Creates an entry that never expires.
    pub fn new(value: Bytes) -> Self {
        Self {
            value,
            expires_at: None,
        }
    }

    /// Creates an entry with an absolute expiry deadline.
    pub fn with_deadline(value: Bytes, deadline: Instant) -> Self {
        Self {
            value,
            expires_at: Some(deadline),
        }
    }

    /// Whether the entry is expired at the given moment.
    #[inline]
    pub fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.map(|at| now >= at).unwrap_or(false)
    }
}

/// The key-value map behind the executor.
///
/// Constructed per server instance and owned by that instance's executor.
///
/// # Example
///
/// ```
/// use emberkv::storage::Store;
/// use bytes::Bytes;
/// use std::time::Duration;
///
/// let mut store = Store::new();
/// store.set(Bytes::from("name"), Bytes::from("Ariz"));
/// assert_eq!(store.get(&Bytes::from("name")), Some(Bytes::from("Ariz")));
///
/// store.set_with_ttl(Bytes::from("session"), Bytes::from("token"), Duration::from_secs(60));
/// ```
pub struct Store {
    data: HashMap<Bytes, Entry>,
    clock: Box<dyn Clock>,
    /// Keys removed after their deadline was observed on a read
    expired_observed: u64,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("keys", &self.data.len())
            .field("expired_observed", &self.expired_observed)
            .finish()
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    /// Creates a store backed by the real monotonic clock.
    pub fn new() -> Self {
        Self::with_clock(MonotonicClock)
    }

    /// Creates a store backed by the given clock.
    pub fn with_clock(clock: impl Clock + 'static) -> Self {
        Self {
            data: HashMap::new(),
            clock: Box::new(clock),
            expired_observed: 0,
        }
    }

    /// Upserts a key with no expiry.
    ///
    /// Overwriting an entry that had a deadline clears the deadline.
    pub fn set(&mut self, key: Bytes, value: Bytes) {
        self.data.insert(key, Entry::new(value));
    }

    /// Upserts a key whose entry expires `ttl` from now.
    pub fn set_with_ttl(&mut self, key: Bytes, value: Bytes, ttl: Duration) {
        let deadline = self.clock.now() + ttl;
        self.data.insert(key, Entry::with_deadline(value, deadline));
    }

    /// Reads a key, lazily evicting it when its deadline has passed.
    pub fn get(&mut self, key: &Bytes) -> Option<Bytes> {
        let now = self.clock.now();
        match self.data.get(key) {
            Some(entry) if entry.is_expired(now) => {
                self.data.remove(key);
                self.expired_observed += 1;
                None
            }
            Some(entry) => Some(entry.value.clone()),
            None => None,
        }
    }

    /// Number of keys currently held, expired-but-unobserved ones included.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Keys evicted so far because a read observed their deadline.
    pub fn expired_observed(&self) -> u64 {
        self.expired_observed
    }
}
