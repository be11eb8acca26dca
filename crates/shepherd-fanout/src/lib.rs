//! Fan-out of broadcast frames to live subscribers.
//!
//! The [`SubscriberRegistry`] tracks every connected viewer and delivers
//! each broadcast to all of them. It only knows subscribers through the
//! [`Deliver`] capability, so transports (WebSocket, SSE, test doubles)
//! plug in without the registry knowing about them.
//!
//! Delivery is best-effort and isolated per subscriber: a subscriber whose
//! delivery fails is dropped from the registry and everyone else still gets
//! the frame. There is no retry or redelivery beyond the subscriber's own
//! buffer.

mod registry;
mod subscriber;

pub use registry::{BroadcastReport, SubscriberId, SubscriberRegistry, Subscription};
pub use subscriber::{ChannelSubscriber, Deliver, DeliveryFailure};
