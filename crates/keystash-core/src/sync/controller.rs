//! Load, update and subscribe against injected store and bus.

use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::payload::{decode_record, serialize_value};
use crate::bus::{Envelope, LocalBus, MessageBus, MessageHandler, Subscription};
use crate::config::SyncConfig;
use crate::error::{KeystashError, Result};
use crate::schema::Typed;
use crate::store::{ByteStore, MemoryStore};

/// A change requested by the caller.
pub enum Update<T> {
    /// Replace the current value
    Value(T),
    /// Compute the new value from the current one
    With(Box<dyn FnOnce(&T) -> T>),
}

impl<T> Update<T> {
    pub fn with(f: impl FnOnce(&T) -> T + 'static) -> Self {
        Update::With(Box::new(f))
    }

    fn resolve(self, current: &T) -> T {
        match self {
            Update::Value(value) => value,
            Update::With(f) => f(current),
        }
    }
}

impl<T> From<T> for Update<T> {
    fn from(value: T) -> Self {
        Update::Value(value)
    }
}

/// Persistence-and-sync controller.
///
/// Holds no per-key state; everything a call needs arrives through its
/// arguments. Cloning shares the store and bus.
#[derive(Clone)]
pub struct SyncController {
    store: Arc<dyn ByteStore>,
    bus: Arc<dyn MessageBus>,
}

impl SyncController {
    pub fn new(store: Arc<dyn ByteStore>, bus: Arc<dyn MessageBus>) -> Self {
        Self { store, bus }
    }

    /// Controller over a fresh [`MemoryStore`] and [`LocalBus`].
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::default()), Arc::new(LocalBus::new()))
    }

    pub fn store(&self) -> &Arc<dyn ByteStore> {
        &self.store
    }

    pub fn bus(&self) -> &Arc<dyn MessageBus> {
        &self.bus
    }

    /// Read and validate the value stored under `key`.
    ///
    /// An absent record yields `initial`, which is also written back when
    /// `write_initial` is set.
    ///
    /// # Errors
    ///
    /// Errors are handed to `on_error` and `initial` is returned instead.
    /// Only when `restore_on_error` is off is the error returned.
    pub fn load<T>(&self, key: &str, schema: &Typed<T>, initial: T, config: &SyncConfig) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
    {
        let storage_key = config.storage_key(key);
        let loaded = self.store.get(&storage_key).and_then(|raw| match raw {
            Some(bytes) => decode_record(&bytes, schema, config).map(Some),
            None => Ok(None),
        });

        match loaded {
            Ok(Some(value)) => {
                if config.debug {
                    tracing::debug!(key, "loaded stored value");
                }
                Ok(value)
            }
            Ok(None) => {
                if config.debug {
                    tracing::debug!(key, "no stored value, using initial");
                }
                if config.write_initial {
                    if let Err(err) = self.write_initial(&storage_key, &initial, config) {
                        config.report(&err);
                    }
                }
                Ok(initial)
            }
            Err(err) => {
                config.report(&err);
                if config.restore_on_error {
                    Ok(initial)
                } else {
                    Err(err)
                }
            }
        }
    }

    fn write_initial<T: Serialize>(&self, storage_key: &str, initial: &T, config: &SyncConfig) -> Result<()> {
        let value = serde_json::to_value(initial)?;
        let payload = config.encode_value(&serialize_value(&value)?);
        self.store.set(storage_key, payload.as_bytes())
    }

    /// Validate, persist and broadcast a change to `key`.
    ///
    /// # Returns
    ///
    /// The accepted value, or `None` if the change was rejected. Rejections
    /// go to `on_error` and, with `backup_on_error`, leave the candidate in
    /// a timestamped backup record.
    pub fn update<T>(
        &self,
        key: &str,
        schema: &Typed<T>,
        config: &SyncConfig,
        current: &T,
        change: Update<T>,
    ) -> Option<T>
    where
        T: Serialize + DeserializeOwned,
    {
        let candidate = change.resolve(current);
        match self.commit(key, schema, config, current, &candidate) {
            Ok(value) => Some(value),
            Err(err) => {
                config.report(&err);
                if config.backup_on_error {
                    self.backup(key, config, &candidate);
                }
                None
            }
        }
    }

    fn commit<T>(
        &self,
        key: &str,
        schema: &Typed<T>,
        config: &SyncConfig,
        current: &T,
        candidate: &T,
    ) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
    {
        let old = serde_json::to_value(current)?;
        let proposed = serde_json::to_value(candidate)?;
        if let Some(hook) = &config.on_change_before_validation {
            hook(&old, &proposed);
        }

        let validated = schema.parse_value(Some(&proposed))?;
        if let Some(hook) = &config.on_change_after_validation {
            hook(&old, &validated);
        }

        let payload = config.encode_value(&serialize_value(&validated)?);
        let value = Typed::<T>::convert(validated)?;

        let storage_key = config.storage_key(key);
        self.store.set(&storage_key, payload.as_bytes())?;
        if config.debug {
            tracing::debug!(key, bytes = payload.len(), "stored update");
        }

        if config.use_broadcast_channel {
            // The write already happened; a lost notification is not a failed update.
            if let Err(err) = self.publish(&storage_key, payload.as_bytes()) {
                config.report(&err);
            }
        }
        Ok(value)
    }

    fn publish(&self, channel: &str, payload: &[u8]) -> Result<()> {
        let handle = self.bus.open_channel(channel)?;
        let published = handle.publish(payload);
        handle.close();
        published
    }

    fn backup<T: Serialize>(&self, key: &str, config: &SyncConfig, candidate: &T) {
        let stamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let backup_key = config.storage_key(&format!("{}_{}", key, stamp));
        let written = serde_json::to_string(candidate)
            .map_err(KeystashError::from)
            .and_then(|json| self.store.set(&backup_key, json.as_bytes()));
        match written {
            Ok(()) => {
                if config.debug {
                    tracing::debug!(key, backup = %backup_key, "wrote backup of rejected value");
                }
            }
            Err(err) => {
                if config.debug {
                    tracing::warn!(key, error = %err, "failed to write backup");
                }
            }
        }
    }

    /// Listen for changes to `key` published by any controller on the bus.
    ///
    /// Each payload goes through the same decode pipeline as [`load`];
    /// accepted values are passed to `on_remote`, failures to `on_error`.
    /// With broadcasting disabled an inert subscription is returned.
    ///
    /// # Errors
    ///
    /// Returns `KeystashError::Channel` if the bus cannot listen, for
    /// example outside a tokio runtime.
    ///
    /// [`load`]: SyncController::load
    pub fn subscribe<T, F>(
        &self,
        key: &str,
        schema: &Typed<T>,
        config: &SyncConfig,
        on_remote: F,
    ) -> Result<Subscription>
    where
        T: DeserializeOwned + 'static,
        F: Fn(T) + Send + Sync + 'static,
    {
        if !config.use_broadcast_channel {
            return Ok(Subscription::inert());
        }

        let storage_key = config.storage_key(key);
        let channel = self.bus.open_channel(&storage_key)?;
        let schema = schema.clone();
        let config = config.clone();
        let logical_key = key.to_string();
        let handler: MessageHandler = Arc::new(move |envelope: Envelope| {
            match decode_record(&envelope.payload, &schema, &config) {
                Ok(value) => {
                    if config.debug {
                        tracing::debug!(key = %logical_key, sender = %envelope.sender, "applied remote update");
                    }
                    on_remote(value);
                }
                Err(err) => config.report(&err),
            }
        });
        channel.on_message(handler)
    }

    /// Delete the record for `key`.
    pub fn remove(&self, key: &str, config: &SyncConfig) -> Result<()> {
        self.store.delete(&config.storage_key(key))
    }
}
