//! Sequenced access to the event ledger and the subscriber registry.
//!
//! Every ledger mutation that is followed by a broadcast, and every new
//! subscriber attach, runs inside one sequencing critical section. This
//! gives all subscribers the same total order of frames, guarantees a
//! broadcast never references state the ledger has not committed, and
//! makes the init snapshot line up exactly with the live stream that
//! follows it: no event is both in the snapshot and broadcast live, and no
//! event falls between the two.

use std::sync::{Arc, Mutex, MutexGuard};

use shepherd_fanout::{
    ChannelSubscriber, Deliver, DeliveryFailure, SubscriberId, SubscriberRegistry, Subscription,
};
use shepherd_ledger::{classify, EventStore, LedgerError};
use shepherd_types::{BroadcastMessage, Event, EventId};

/// Errors raised while operating on the hub.
#[derive(Debug, thiserror::Error)]
pub enum HubError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("failed to serialize frame: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("failed to queue init frame: {0}")]
    Delivery(#[from] DeliveryFailure),
}

/// The event ledger plus its live audience. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct Hub {
    store: EventStore,
    registry: SubscriberRegistry,
    sequencer: Arc<Mutex<()>>,
}

impl Hub {
    pub fn new() -> Self {
        Self::default()
    }

    fn sequence(&self) -> MutexGuard<'_, ()> {
        // The guarded value is `()`: a poisoned lock protects nothing broken.
        self.sequencer.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn store(&self) -> &EventStore {
        &self.store
    }

    pub fn registry(&self) -> &SubscriberRegistry {
        &self.registry
    }

    /// Classifies and stores one raw line, then broadcasts it as `log_event`.
    ///
    /// The content of `raw` never causes a failure.
    pub fn ingest(&self, raw: &str) -> Result<Event, HubError> {
        let class = classify(raw);

        let _order = self.sequence();
        let event = self.store.create(raw, class.status_code, class.level)?;
        let report = self.registry.broadcast(&BroadcastMessage::LogEvent {
            event: event.clone(),
        });

        tracing::info!(
            event_id = %event.id,
            status_code = event.status_code,
            level = %event.level,
            delivered = report.delivered,
            dropped = report.dropped,
            "ingested log line"
        );
        Ok(event)
    }

    /// Marks an event acknowledged and broadcasts an `ack` carrying its id.
    ///
    /// Repeated acknowledges succeed and broadcast again.
    ///
    /// # Errors
    ///
    /// [`LedgerError::NotFound`] (wrapped in [`HubError::Ledger`]) when the
    /// id is unknown; nothing is broadcast in that case.
    pub fn acknowledge(&self, id: &EventId) -> Result<Event, HubError> {
        let _order = self.sequence();
        let event = self.store.acknowledge(id)?;
        let report = self.registry.broadcast(&BroadcastMessage::Ack { id: event.id });

        tracing::info!(
            event_id = %event.id,
            delivered = report.delivered,
            dropped = report.dropped,
            "acknowledged event"
        );
        Ok(event)
    }

    /// Snapshot of every event in ingestion order.
    pub fn events(&self) -> Result<Vec<Event>, HubError> {
        Ok(self.store.list()?)
    }

    /// Registers a new channel subscriber whose first frame is the `init`
    /// snapshot of the ledger.
    pub fn attach(&self, capacity: usize) -> Result<Subscription, HubError> {
        let _order = self.sequence();
        let events = self.store.list()?;
        let snapshot_len = events.len();
        let init = serde_json::to_string(&BroadcastMessage::Init { events })?;

        let (subscriber, receiver) = ChannelSubscriber::channel(capacity);
        subscriber.deliver(&init)?;
        let id = self.registry.register(Arc::new(subscriber));

        tracing::debug!(subscriber_id = %id, snapshot_len, "attached subscriber with init snapshot");
        Ok(Subscription { id, receiver })
    }

    /// Removes a subscriber. Safe to call more than once.
    pub fn detach(&self, id: SubscriberId) -> bool {
        self.registry.unregister(id)
    }
}
