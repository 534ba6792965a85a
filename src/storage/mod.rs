//! Storage Module
//!
//! An in-memory key-value map with per-key expiry, owned by the command
//! executor of one server instance.
//!
//! ## Design
//!
//! - **Single writer**: only the executor touches the map, and only from
//!   the event-loop thread, so no locks guard the data path.
//! - **Lazy expiry**: deadlines are checked when a key is read; an expired
//!   entry is evicted at that moment. No background sweep runs.
//! - **Injected clock**: the time source is a constructor argument, so
//!   expiry behavior is tested with a hand-advanced clock instead of
//!   sleeps.

pub mod clock;
pub mod store;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use store::{Entry, Store};
