//! In-process message bus.
//!
//! Each channel name maps to one `tokio::sync::broadcast` sender. Listening
//! handles run a spawned task per subscription, so [`Channel::on_message`]
//! must be called from inside a tokio runtime. Publishing needs no runtime.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use uuid::Uuid;

use super::{Channel, Envelope, MessageBus, MessageHandler, Subscription};
use crate::error::{KeystashError, Result};

/// Messages buffered per channel before slow listeners start skipping.
pub const DEFAULT_CAPACITY: usize = 64;

/// Sender and listener count for a channel with at least one listener.
struct Topic {
    sender: broadcast::Sender<Envelope>,
    listeners: usize,
}

type Topics = HashMap<String, Topic>;

fn lock_topics(topics: &Mutex<Topics>) -> Result<MutexGuard<'_, Topics>> {
    topics
        .lock()
        .map_err(|_| KeystashError::Channel("Bus registry poisoned".to_string()))
}

/// Drop one listener from `name`, forgetting the channel once it is idle.
fn release_listener(topics: &Mutex<Topics>, name: &str) {
    let mut topics = topics.lock().unwrap_or_else(PoisonError::into_inner);
    let idle = match topics.get_mut(name) {
        Some(topic) => {
            topic.listeners = topic.listeners.saturating_sub(1);
            topic.listeners == 0
        }
        None => false,
    };
    if idle {
        topics.remove(name);
    }
}

/// Same-process broadcast bus.
///
/// Cloning is cheap; clones share the same channels. A channel only holds
/// a sender while something listens on it.
#[derive(Clone)]
pub struct LocalBus {
    topics: Arc<Mutex<Topics>>,
    capacity: usize,
}

impl LocalBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a bus buffering `capacity` messages per channel.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            topics: Arc::new(Mutex::new(HashMap::new())),
            capacity: capacity.max(1),
        }
    }

    /// Number of active listeners on `name`.
    pub fn listener_count(&self, name: &str) -> usize {
        match lock_topics(&self.topics) {
            Ok(topics) => topics.get(name).map(|topic| topic.listeners).unwrap_or(0),
            Err(_) => 0,
        }
    }

    /// Number of channels that currently have listeners.
    pub fn channel_count(&self) -> usize {
        lock_topics(&self.topics).map(|topics| topics.len()).unwrap_or(0)
    }
}

impl Default for LocalBus {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageBus for LocalBus {
    fn open_channel(&self, name: &str) -> Result<Box<dyn Channel>> {
        Ok(Box::new(LocalChannel {
            id: Uuid::new_v4(),
            name: name.to_string(),
            topics: Arc::clone(&self.topics),
            capacity: self.capacity,
        }))
    }
}

struct LocalChannel {
    id: Uuid,
    name: String,
    topics: Arc<Mutex<Topics>>,
    capacity: usize,
}

impl Channel for LocalChannel {
    fn name(&self) -> &str {
        &self.name
    }

    fn id(&self) -> Uuid {
        self.id
    }

    fn publish(&self, payload: &[u8]) -> Result<()> {
        let sender = lock_topics(&self.topics)?
            .get(&self.name)
            .map(|topic| topic.sender.clone());
        let Some(sender) = sender else {
            tracing::trace!(channel = %self.name, "no listeners for change notification");
            return Ok(());
        };

        let envelope = Envelope {
            channel: self.name.clone(),
            payload: payload.to_vec(),
            sender: self.id,
        };
        // An error only means the last listener just left.
        let delivered = sender.send(envelope).unwrap_or(0);
        tracing::trace!(channel = %self.name, delivered, "published change notification");
        Ok(())
    }

    fn on_message(self: Box<Self>, handler: MessageHandler) -> Result<Subscription> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|e| {
            KeystashError::Channel(format!(
                "Listening on channel {} requires a tokio runtime: {}",
                self.name, e
            ))
        })?;

        let mut receiver = {
            let mut topics = lock_topics(&self.topics)?;
            let topic = topics.entry(self.name.clone()).or_insert_with(|| Topic {
                sender: broadcast::channel(self.capacity).0,
                listeners: 0,
            });
            topic.listeners += 1;
            topic.sender.subscribe()
        };

        // Cleared on release so a message already dequeued is not handled.
        let active = Arc::new(AtomicBool::new(true));
        let listening = Arc::clone(&active);
        let channel = self.name.clone();
        let task = runtime.spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(envelope) => {
                        if !listening.load(Ordering::Acquire) {
                            break;
                        }
                        handler(envelope);
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::debug!(channel = %channel, skipped, "listener fell behind");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });

        let topics = Arc::clone(&self.topics);
        let name = self.name.clone();
        Ok(Subscription::new(self.name, move || {
            active.store(false, Ordering::Release);
            task.abort();
            release_listener(&topics, &name);
        }))
    }

    fn close(self: Box<Self>) {}
}
