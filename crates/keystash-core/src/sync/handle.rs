//! Stateful per-key handle.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::controller::{SyncController, Update};
use crate::bus::Subscription;
use crate::config::SyncConfig;
use crate::error::Result;
use crate::schema::Typed;

/// Where a [`SyncedKey`] is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncState {
    /// Not yet loaded from the store
    #[default]
    Uninitialized,
    /// Holding the value read at open time
    Loaded,
    /// Last change came from this handle
    Updated,
    /// Last change arrived over the bus
    RemoteUpdated,
}

struct Shared<T> {
    value: T,
    state: SyncState,
}

fn lock<T>(shared: &Mutex<Shared<T>>) -> MutexGuard<'_, Shared<T>> {
    // Writers only assign fields, so a poisoned guard still holds a whole value.
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One consumer's view of a synchronized key.
///
/// Opening loads the current value and starts listening for changes made
/// elsewhere. Dropping the handle stops listening.
pub struct SyncedKey<T> {
    controller: SyncController,
    key: String,
    schema: Typed<T>,
    config: SyncConfig,
    shared: Arc<Mutex<Shared<T>>>,
    subscription: Subscription,
}

impl<T> SyncedKey<T>
where
    T: Serialize + DeserializeOwned + Clone + Send + 'static,
{
    /// Load `key` and subscribe to its changes.
    ///
    /// # Errors
    ///
    /// Returns the load error when `restore_on_error` is off, or a channel
    /// error if broadcasting is on and no tokio runtime is running.
    pub fn open(
        controller: &SyncController,
        key: impl Into<String>,
        schema: Typed<T>,
        initial: T,
        config: SyncConfig,
    ) -> Result<Self> {
        let key = key.into();
        let value = controller.load(&key, &schema, initial, &config)?;
        let shared = Arc::new(Mutex::new(Shared {
            value,
            state: SyncState::Loaded,
        }));

        let remote = Arc::clone(&shared);
        let subscription = controller.subscribe(&key, &schema, &config, move |value: T| {
            let mut guard = lock(&remote);
            guard.value = value;
            guard.state = SyncState::RemoteUpdated;
        })?;

        Ok(Self {
            controller: controller.clone(),
            key,
            schema,
            config,
            shared,
            subscription,
        })
    }

    pub fn get(&self) -> T {
        lock(&self.shared).value.clone()
    }

    /// Apply a change through the controller.
    ///
    /// Returns `false` if the change was rejected; the held value is then
    /// left untouched.
    pub fn set(&self, change: impl Into<Update<T>>) -> bool {
        let current = self.get();
        match self
            .controller
            .update(&self.key, &self.schema, &self.config, &current, change.into())
        {
            Some(value) => {
                let mut guard = lock(&self.shared);
                guard.value = value;
                guard.state = SyncState::Updated;
                true
            }
            None => false,
        }
    }

    pub fn state(&self) -> SyncState {
        lock(&self.shared).state
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Whether remote changes are still being applied.
    pub fn is_listening(&self) -> bool {
        self.subscription.is_active()
    }
}

impl<T> fmt::Debug for SyncedKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncedKey")
            .field("key", &self.key)
            .field("state", &lock(&self.shared).state)
            .field("subscription", &self.subscription)
            .finish()
    }
}
