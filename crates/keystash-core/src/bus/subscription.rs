//! Scoped ownership of a listening channel.

use std::fmt;

use uuid::Uuid;

type Release = Box<dyn FnOnce() + Send>;

/// Guard for a listening channel handle.
///
/// The handle is released exactly once: on [`Subscription::unsubscribe`]
/// or when the guard is dropped, whichever comes first.
pub struct Subscription {
    id: Uuid,
    channel: String,
    release: Option<Release>,
}

impl Subscription {
    /// Wrap a release action for the listener on `channel`.
    pub fn new(channel: impl Into<String>, release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            id: Uuid::new_v4(),
            channel: channel.into(),
            release: Some(Box::new(release)),
        }
    }

    /// A subscription that listens to nothing, used when broadcasting is off.
    pub fn inert() -> Self {
        Self {
            id: Uuid::nil(),
            channel: String::new(),
            release: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Whether the subscription still holds a listening handle.
    pub fn is_active(&self) -> bool {
        self.release.is_some()
    }

    /// Stop listening now.
    pub fn unsubscribe(mut self) {
        self.release_now();
    }

    fn release_now(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release_now();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("channel", &self.channel)
            .field("active", &self.is_active())
            .finish()
    }
}
