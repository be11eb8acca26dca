//! The delivery capability and its channel-backed implementation.

use tokio::sync::mpsc::{self, error::TrySendError};

/// Why a frame could not be handed to a subscriber.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryFailure {
    /// The receiving side is gone.
    #[error("subscriber closed")]
    Closed,

    /// The subscriber's buffer is full; it is not keeping up.
    #[error("subscriber buffer full")]
    Full,

    /// Transport-specific send error.
    #[error("transport error: {0}")]
    Transport(String),
}

/// Something a serialised broadcast frame can be delivered to.
///
/// Implementations must not block: the registry calls `deliver` for every
/// subscriber in turn on the broadcasting task.
pub trait Deliver: Send + Sync {
    fn deliver(&self, frame: &str) -> Result<(), DeliveryFailure>;
}

/// A subscriber backed by a bounded `mpsc` channel.
///
/// The connection task owns the matching receiver and forwards frames to
/// its peer. When the registry drops this sender, the receiver observes the
/// channel closing.
#[derive(Debug, Clone)]
pub struct ChannelSubscriber {
    sender: mpsc::Sender<String>,
}

impl ChannelSubscriber {
    /// Creates a subscriber and the receiver its frames arrive on.
    ///
    /// A `capacity` of zero is treated as one.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<String>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }
}

impl Deliver for ChannelSubscriber {
    fn deliver(&self, frame: &str) -> Result<(), DeliveryFailure> {
        self.sender
            .try_send(frame.to_owned())
            .map_err(|e| match e {
                TrySendError::Closed(_) => DeliveryFailure::Closed,
                TrySendError::Full(_) => DeliveryFailure::Full,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn channel_subscriber_forwards_frames() {
        let (subscriber, mut rx) = ChannelSubscriber::channel(4);
        subscriber.deliver("one").unwrap();
        subscriber.deliver("two").unwrap();
        assert_eq!(rx.recv().await.as_deref(), Some("one"));
        assert_eq!(rx.recv().await.as_deref(), Some("two"));
    }

    #[test]
    fn channel_subscriber_reports_full_and_closed() {
        let (subscriber, rx) = ChannelSubscriber::channel(1);
        subscriber.deliver("fits").unwrap();
        assert_eq!(subscriber.deliver("overflow"), Err(DeliveryFailure::Full));

        drop(rx);
        assert_eq!(subscriber.deliver("late"), Err(DeliveryFailure::Closed));
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let (subscriber, _rx) = ChannelSubscriber::channel(0);
        assert!(subscriber.deliver("frame").is_ok());
    }
}
