//! In-memory, insertion-ordered event ledger.
//!
//! All access goes through a single mutex so that an insert, an
//! acknowledge flag flip, and a listing snapshot are each atomic with
//! respect to one another. Lock acquisitions are short map operations that
//! never span an `.await`, so a synchronous lock is used.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use indexmap::{map::Entry, IndexMap};
use shepherd_types::{Event, EventId, Level};

use crate::error::LedgerError;

/// Shared handle to the event ledger. Clones refer to the same ledger.
#[derive(Debug, Clone, Default)]
pub struct EventStore {
    events: Arc<Mutex<IndexMap<EventId, Event>>>,
}

impl EventStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, IndexMap<EventId, Event>>, LedgerError> {
        self.events.lock().map_err(|_| {
            tracing::error!("event ledger lock poisoned");
            LedgerError::Poisoned
        })
    }

    /// Creates and stores a new, unacknowledged event stamped with the
    /// current time, returning a copy of what was stored.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::DuplicateId`] if the generated id is already
    /// taken, or [`LedgerError::Poisoned`] if the lock is unusable.
    pub fn create(
        &self,
        raw: impl Into<String>,
        status_code: u16,
        level: Level,
    ) -> Result<Event, LedgerError> {
        self.insert(Event {
            id: EventId::new_v4(),
            raw: raw.into(),
            status_code,
            level,
            acknowledged: false,
            timestamp: Utc::now(),
        })
    }

    /// Inserts a fully formed event, refusing to overwrite an existing id.
    pub(crate) fn insert(&self, event: Event) -> Result<Event, LedgerError> {
        let mut events = self.lock()?;
        match events.entry(event.id) {
            Entry::Occupied(_) => {
                tracing::error!(event_id = %event.id, "refusing to overwrite event with duplicate id");
                Err(LedgerError::DuplicateId(event.id))
            }
            Entry::Vacant(slot) => Ok(slot.insert(event).clone()),
        }
    }

    /// Marks an event as acknowledged and returns its updated state.
    ///
    /// Acknowledging an event twice is allowed and leaves it unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NotFound`] if no such event exists; the ledger
    /// is not modified in that case.
    pub fn acknowledge(&self, id: &EventId) -> Result<Event, LedgerError> {
        let mut events = self.lock()?;
        let event = events.get_mut(id).ok_or(LedgerError::NotFound(*id))?;
        event.acknowledged = true;
        Ok(event.clone())
    }

    /// Returns a snapshot of all events in insertion order.
    pub fn list(&self) -> Result<Vec<Event>, LedgerError> {
        Ok(self.lock()?.values().cloned().collect())
    }

    /// Looks up a single event.
    pub fn get(&self, id: &EventId) -> Result<Option<Event>, LedgerError> {
        Ok(self.lock()?.get(id).cloned())
    }

    /// Number of stored events.
    pub fn len(&self) -> Result<usize, LedgerError> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, LedgerError> {
        Ok(self.lock()?.is_empty())
    }
}
