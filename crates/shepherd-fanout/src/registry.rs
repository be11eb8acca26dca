//! Registry of live subscribers.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use shepherd_types::BroadcastMessage;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::subscriber::{ChannelSubscriber, Deliver};

/// Identifier of one registered subscriber.
pub type SubscriberId = Uuid;

type SubscriberMap = HashMap<SubscriberId, Arc<dyn Deliver>>;

/// A registered channel subscriber, as held by its connection task.
///
/// `receiver.recv()` returning `None` means the subscriber was removed from
/// the registry (for example after a failed delivery).
#[derive(Debug)]
pub struct Subscription {
    pub id: SubscriberId,
    pub receiver: mpsc::Receiver<String>,
}

/// Outcome of a single broadcast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Subscribers the frame was handed to.
    pub delivered: usize,
    /// Subscribers that failed delivery and were unregistered.
    pub dropped: usize,
}

/// Shared handle to the set of live subscribers. Clones refer to the same set.
///
/// Lock acquisitions are brief map operations and never span an `.await`.
/// Deliveries happen outside the lock on a snapshot of the set, so
/// subscribers may join or leave while a broadcast is in flight.
#[derive(Clone, Default)]
pub struct SubscriberRegistry {
    subscribers: Arc<Mutex<SubscriberMap>>,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, SubscriberMap> {
        // A panic while holding this lock cannot leave the map half-updated,
        // so recover the guard instead of failing every later call.
        self.subscribers.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Adds a subscriber and returns its id.
    pub fn register(&self, subscriber: Arc<dyn Deliver>) -> SubscriberId {
        let id = Uuid::new_v4();
        let total = {
            let mut subscribers = self.lock();
            subscribers.insert(id, subscriber);
            subscribers.len()
        };
        tracing::info!(subscriber_id = %id, total, "subscriber registered");
        id
    }

    /// Allocates a channel of `capacity` frames and registers it.
    pub fn subscribe(&self, capacity: usize) -> Subscription {
        let (subscriber, receiver) = ChannelSubscriber::channel(capacity);
        let id = self.register(Arc::new(subscriber));
        Subscription { id, receiver }
    }

    /// Removes a subscriber. Returns `false` if it was already gone.
    pub fn unregister(&self, id: SubscriberId) -> bool {
        let (removed, total) = {
            let mut subscribers = self.lock();
            let removed = subscribers.remove(&id).is_some();
            (removed, subscribers.len())
        };
        if removed {
            tracing::info!(subscriber_id = %id, total, "subscriber unregistered");
        }
        removed
    }

    pub fn contains(&self, id: SubscriberId) -> bool {
        self.lock().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Serialises `message` once and delivers it to every subscriber.
    ///
    /// A serialisation failure is logged and nothing is delivered.
    pub fn broadcast(&self, message: &BroadcastMessage) -> BroadcastReport {
        match serde_json::to_string(message) {
            Ok(frame) => self.broadcast_frame(&frame),
            Err(e) => {
                tracing::error!(kind = message.kind(), "failed to serialize broadcast message: {}", e);
                BroadcastReport::default()
            }
        }
    }

    /// Delivers a pre-serialised frame to every subscriber, unregistering
    /// each one whose delivery fails.
    pub fn broadcast_frame(&self, frame: &str) -> BroadcastReport {
        let targets: Vec<(SubscriberId, Arc<dyn Deliver>)> = self
            .lock()
            .iter()
            .map(|(id, subscriber)| (*id, Arc::clone(subscriber)))
            .collect();

        let mut report = BroadcastReport::default();
        let mut failed = Vec::new();
        for (id, subscriber) in targets {
            match subscriber.deliver(frame) {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    tracing::warn!(subscriber_id = %id, "dropping subscriber after failed delivery: {}", e);
                    failed.push(id);
                }
            }
        }

        for id in failed {
            if self.unregister(id) {
                report.dropped += 1;
            }
        }
        report
    }
}

impl std::fmt::Debug for SubscriberRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriberRegistry")
            .field("subscribers", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subscriber::DeliveryFailure;
    use shepherd_types::{Event, EventId, Level};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts deliveries and never fails.
    #[derive(Default)]
    struct Counting(AtomicUsize);

    impl Deliver for Counting {
        fn deliver(&self, _frame: &str) -> Result<(), DeliveryFailure> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    /// Always fails, like a peer whose socket already went away.
    struct Broken;

    impl Deliver for Broken {
        fn deliver(&self, _frame: &str) -> Result<(), DeliveryFailure> {
            Err(DeliveryFailure::Transport("connection reset".to_string()))
        }
    }

    fn log_event() -> BroadcastMessage {
        BroadcastMessage::LogEvent {
            event: Event {
                id: EventId::new_v4(),
                raw: "GET /x 500 error".to_string(),
                status_code: 500,
                level: Level::Error,
                acknowledged: false,
                timestamp: chrono::Utc::now(),
            },
        }
    }

    #[tokio::test]
    async fn broadcast_reaches_every_subscriber_in_order() {
        let registry = SubscriberRegistry::new();
        let mut a = registry.subscribe(8);
        let mut b = registry.subscribe(8);

        let first = log_event();
        let second = BroadcastMessage::Ack {
            id: EventId::new_v4(),
        };
        assert_eq!(registry.broadcast(&first).delivered, 2);
        assert_eq!(registry.broadcast(&second).delivered, 2);

        for sub in [&mut a, &mut b] {
            let got: BroadcastMessage =
                serde_json::from_str(&sub.receiver.recv().await.unwrap()).unwrap();
            assert_eq!(got, first);
            let got: BroadcastMessage =
                serde_json::from_str(&sub.receiver.recv().await.unwrap()).unwrap();
            assert_eq!(got, second);
        }
    }

    #[tokio::test]
    async fn pre_closed_subscriber_is_isolated_and_removed() {
        let registry = SubscriberRegistry::new();
        let mut live: Vec<Subscription> = (0..4).map(|_| registry.subscribe(8)).collect();
        let closed = registry.subscribe(8);
        let closed_id = closed.id;
        drop(closed.receiver);
        assert_eq!(registry.len(), 5);

        let report = registry.broadcast(&log_event());

        assert_eq!(report, BroadcastReport { delivered: 4, dropped: 1 });
        assert_eq!(registry.len(), 4);
        assert!(!registry.contains(closed_id));
        for sub in &mut live {
            assert!(sub.receiver.try_recv().is_ok(), "live subscriber missed the frame");
        }
    }

    #[test]
    fn failing_capability_does_not_abort_delivery() {
        let registry = SubscriberRegistry::new();
        let counter = Arc::new(Counting::default());
        registry.register(Arc::new(Broken));
        registry.register(counter.clone());
        registry.register(Arc::new(Broken));

        let report = registry.broadcast_frame("{}");

        assert_eq!(report.delivered, 1);
        assert_eq!(report.dropped, 2);
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn slow_subscriber_is_dropped_when_buffer_fills() {
        let registry = SubscriberRegistry::new();
        let slow = registry.subscribe(1);

        assert_eq!(registry.broadcast_frame("a").delivered, 1);
        let report = registry.broadcast_frame("b");
        assert_eq!(report.dropped, 1);
        assert!(!registry.contains(slow.id));
    }

    #[tokio::test]
    async fn removal_closes_the_receiver() {
        let registry = SubscriberRegistry::new();
        let mut sub = registry.subscribe(4);

        assert!(registry.unregister(sub.id));
        assert_eq!(sub.receiver.recv().await, None);
    }

    #[test]
    fn unregister_is_idempotent() {
        let registry = SubscriberRegistry::new();
        let sub = registry.subscribe(4);

        assert!(registry.unregister(sub.id));
        assert!(!registry.unregister(sub.id));
        assert!(registry.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn broadcast_tolerates_concurrent_membership_changes() {
        let registry = SubscriberRegistry::new();
        let mut handles = Vec::new();

        for _ in 0..20 {
            let registry = registry.clone();
            handles.push(tokio::spawn(async move {
                for _ in 0..25 {
                    let sub = registry.subscribe(64);
                    tokio::task::yield_now().await;
                    registry.unregister(sub.id);
                }
            }));
        }
        for _ in 0..20 {
            let registry = registry.clone();
            handles.push(tokio::spawn(async move {
                for _ in 0..25 {
                    registry.broadcast_frame(r#"{"type":"ack","id":"x"}"#);
                    tokio::task::yield_now().await;
                }
            }));
        }

        for handle in handles {
            handle.await.expect("task should not panic");
        }
        assert!(registry.is_empty());
    }
}
