//! Same-process publish/subscribe for change notifications.
//!
//! The bus is injected into the sync controller as an `Arc<dyn MessageBus>`.
//! Handles are used asymmetrically:
//! - publishing opens a channel, publishes once and closes it
//! - subscribing turns a channel into a [`Subscription`] that listens until
//!   it is dropped
//!
//! Delivery is asynchronous and at most once per listener. There is no
//! ordering between independent publishers and no backpressure: a listener
//! that falls behind skips the messages it missed.

pub mod local;
pub mod subscription;

use std::sync::Arc;

use uuid::Uuid;

use crate::error::Result;

pub use local::LocalBus;
pub use subscription::Subscription;

/// A change notification in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// Channel the payload was published on (the effective storage key)
    pub channel: String,

    /// Encoded payload, exactly as written to the store
    pub payload: Vec<u8>,

    /// Handle that published the payload
    pub sender: Uuid,
}

/// Callback run for every envelope delivered to a subscription.
pub type MessageHandler = Arc<dyn Fn(Envelope) + Send + Sync>;

/// Factory for named channels.
pub trait MessageBus: Send + Sync {
    /// Open a handle on the channel called `name`.
    ///
    /// # Errors
    ///
    /// Returns `KeystashError::Channel` if the bus cannot provide a handle.
    fn open_channel(&self, name: &str) -> Result<Box<dyn Channel>>;
}

/// One handle on a named channel.
pub trait Channel: Send {
    fn name(&self) -> &str;

    /// Unique id of this handle, carried as [`Envelope::sender`].
    fn id(&self) -> Uuid;

    /// Deliver `payload` to every current listener of the channel.
    ///
    /// Publishing with no listeners succeeds and delivers nothing.
    fn publish(&self, payload: &[u8]) -> Result<()>;

    /// Turn this handle into a listener.
    ///
    /// `handler` runs for every later publish on the channel, including
    /// publishes from handles owned by the same consumer. Dropping the
    /// returned [`Subscription`] closes the handle.
    ///
    /// # Errors
    ///
    /// Returns `KeystashError::Channel` if delivery cannot be scheduled.
    fn on_message(self: Box<Self>, handler: MessageHandler) -> Result<Subscription>;

    /// Release the handle without listening.
    fn close(self: Box<Self>);
}
