//! Error types for ledger operations.

use shepherd_types::EventId;

/// Errors that can occur during event store operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// No event with this id exists.
    #[error("event not found: {0}")]
    NotFound(EventId),

    /// A freshly generated id collided with a stored one. The create was
    /// rejected and the existing event left untouched.
    #[error("duplicate event id generated: {0}")]
    DuplicateId(EventId),

    /// A thread panicked while holding the ledger lock.
    #[error("event ledger lock poisoned")]
    Poisoned,
}
