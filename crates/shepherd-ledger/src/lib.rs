//! Event ledger for the Shepherd log monitor.
//!
//! Two pieces live here:
//!
//! - [`classify`], a pure function that pulls a status code out of a raw log
//!   line and assigns a [`Level`](shepherd_types::Level).
//! - [`EventStore`], the in-process, insertion-ordered ledger of every event
//!   seen since startup. Events are created once, may be acknowledged, and
//!   are never removed.
//!
//! # Usage
//!
//! ```rust
//! use shepherd_ledger::{classify, EventStore};
//!
//! let store = EventStore::new();
//! let class = classify("GET /health 503 upstream timeout");
//! let event = store.create("GET /health 503 upstream timeout", class.status_code, class.level)?;
//! assert!(!event.acknowledged);
//!
//! let acked = store.acknowledge(&event.id)?;
//! assert!(acked.acknowledged);
//! # Ok::<(), shepherd_ledger::LedgerError>(())
//! ```
//!
//! The ledger is volatile: it is rebuilt empty on each start and grows
//! without bound for the life of the process.

mod classify;
mod error;
mod store;

pub use classify::{classify, Classification};
pub use error::LedgerError;
pub use store::EventStore;
