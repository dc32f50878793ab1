//! Per-call options for the sync controller.
//!
//! [`SyncConfig`] is built once, with defaults filled in, and then only
//! read. Callbacks live here next to the plain flags; the flags alone are
//! also available as [`SyncSettings`], which deserializes from a config
//! file.

use std::fmt;
use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{KeystashError, Result};
use crate::obfuscation;

/// Phrase used when obfuscation is enabled without one.
pub const DEFAULT_PHRASE: &str = "default_phrase";

/// Receives every domain error the controller swallows.
pub type ErrorCallback = Arc<dyn Fn(&KeystashError) + Send + Sync>;

/// Observes a change as `(old, new)`; cannot alter it.
pub type ChangeHook = Arc<dyn Fn(&Value, &Value) + Send + Sync>;

/// Obfuscation options as written in a config file.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EncryptSettings {
    /// Obfuscate the storage key
    pub key: bool,

    /// Obfuscate the stored payload
    pub value: bool,

    /// Phrase the obfuscation key is derived from
    pub phrase: Option<String>,
}

impl fmt::Debug for EncryptSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptSettings")
            .field("key", &self.key)
            .field("value", &self.value)
            .field("phrase", &self.phrase.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// The plain-data part of [`SyncConfig`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    pub restore_on_error: bool,
    pub use_broadcast_channel: bool,
    pub backup_on_error: bool,
    pub debug: bool,
    pub write_initial: bool,
    pub encrypt: Option<EncryptSettings>,
}

impl SyncSettings {
    /// Reject settings no controller can honour.
    ///
    /// # Errors
    ///
    /// Returns `KeystashError::Config` for an empty obfuscation phrase.
    pub fn validate(&self) -> Result<()> {
        if let Some(encrypt) = &self.encrypt {
            if matches!(encrypt.phrase.as_deref(), Some("")) {
                return Err(KeystashError::Config(
                    "encrypt.phrase must not be empty".to_string(),
                ));
            }
        }
        Ok(())
    }
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            restore_on_error: true,
            use_broadcast_channel: true,
            backup_on_error: false,
            debug: false,
            write_initial: false,
            encrypt: None,
        }
    }
}

/// Obfuscation switches plus the phrase.
#[derive(Clone)]
pub struct EncryptConfig {
    pub key: bool,
    pub value: bool,
    phrase: Arc<SecretString>,
}

impl EncryptConfig {
    /// Obfuscation under `phrase`, with both switches off.
    pub fn new(phrase: impl Into<String>) -> Self {
        Self {
            key: false,
            value: false,
            phrase: Arc::new(SecretString::from(phrase.into())),
        }
    }

    pub fn key(mut self, enabled: bool) -> Self {
        self.key = enabled;
        self
    }

    pub fn value(mut self, enabled: bool) -> Self {
        self.value = enabled;
        self
    }

    pub fn phrase(&self) -> &str {
        self.phrase.expose_secret()
    }
}

impl Default for EncryptConfig {
    fn default() -> Self {
        Self::new(DEFAULT_PHRASE)
    }
}

impl From<&EncryptSettings> for EncryptConfig {
    fn from(settings: &EncryptSettings) -> Self {
        let phrase = settings.phrase.as_deref().unwrap_or(DEFAULT_PHRASE);
        Self::new(phrase).key(settings.key).value(settings.value)
    }
}

impl fmt::Debug for EncryptConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptConfig")
            .field("key", &self.key)
            .field("value", &self.value)
            .field("phrase", &"[REDACTED]")
            .finish()
    }
}

/// Options for one load/update/subscribe call.
#[derive(Clone)]
pub struct SyncConfig {
    pub on_error: Option<ErrorCallback>,
    pub restore_on_error: bool,
    pub use_broadcast_channel: bool,
    pub encrypt: Option<EncryptConfig>,
    pub backup_on_error: bool,
    pub debug: bool,
    pub write_initial: bool,
    pub on_change_before_validation: Option<ChangeHook>,
    pub on_change_after_validation: Option<ChangeHook>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::from_settings(&SyncSettings::default())
    }
}

impl SyncConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_settings(settings: &SyncSettings) -> Self {
        Self {
            on_error: None,
            restore_on_error: settings.restore_on_error,
            use_broadcast_channel: settings.use_broadcast_channel,
            encrypt: settings.encrypt.as_ref().map(EncryptConfig::from),
            backup_on_error: settings.backup_on_error,
            debug: settings.debug,
            write_initial: settings.write_initial,
            on_change_before_validation: None,
            on_change_after_validation: None,
        }
    }

    pub fn on_error(mut self, callback: impl Fn(&KeystashError) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(callback));
        self
    }

    pub fn restore_on_error(mut self, enabled: bool) -> Self {
        self.restore_on_error = enabled;
        self
    }

    pub fn use_broadcast_channel(mut self, enabled: bool) -> Self {
        self.use_broadcast_channel = enabled;
        self
    }

    pub fn encrypt(mut self, encrypt: EncryptConfig) -> Self {
        self.encrypt = Some(encrypt);
        self
    }

    pub fn backup_on_error(mut self, enabled: bool) -> Self {
        self.backup_on_error = enabled;
        self
    }

    pub fn debug(mut self, enabled: bool) -> Self {
        self.debug = enabled;
        self
    }

    pub fn write_initial(mut self, enabled: bool) -> Self {
        self.write_initial = enabled;
        self
    }

    pub fn on_change_before_validation(
        mut self,
        hook: impl Fn(&Value, &Value) + Send + Sync + 'static,
    ) -> Self {
        self.on_change_before_validation = Some(Arc::new(hook));
        self
    }

    pub fn on_change_after_validation(
        mut self,
        hook: impl Fn(&Value, &Value) + Send + Sync + 'static,
    ) -> Self {
        self.on_change_after_validation = Some(Arc::new(hook));
        self
    }

    /// Key actually used against the byte store for `key`.
    pub fn storage_key(&self, key: &str) -> String {
        match &self.encrypt {
            Some(encrypt) if encrypt.key => obfuscation::encode(encrypt.phrase(), key),
            _ => key.to_string(),
        }
    }

    /// Obfuscate a serialized payload if value obfuscation is on.
    pub fn encode_value(&self, payload: &str) -> String {
        match &self.encrypt {
            Some(encrypt) if encrypt.value => obfuscation::encode(encrypt.phrase(), payload),
            _ => payload.to_string(),
        }
    }

    /// Undo [`SyncConfig::encode_value`].
    ///
    /// # Errors
    ///
    /// Returns `KeystashError::Decode` if the payload is corrupt or was
    /// obfuscated under a different phrase.
    pub fn decode_value(&self, payload: &str) -> Result<String> {
        match &self.encrypt {
            Some(encrypt) if encrypt.value => obfuscation::try_decode(encrypt.phrase(), payload)
                .map_err(|e| KeystashError::Decode(format!("Cannot recover obfuscated payload: {}", e))),
            _ => Ok(payload.to_string()),
        }
    }

    /// Hand an error to the caller's callback, logging it in debug mode.
    pub fn report(&self, err: &KeystashError) {
        if self.debug {
            tracing::warn!(error = %err, "keystash operation failed");
        }
        if let Some(callback) = &self.on_error {
            callback(err);
        }
    }
}

impl fmt::Debug for SyncConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncConfig")
            .field("on_error", &self.on_error.is_some())
            .field("restore_on_error", &self.restore_on_error)
            .field("use_broadcast_channel", &self.use_broadcast_channel)
            .field("encrypt", &self.encrypt)
            .field("backup_on_error", &self.backup_on_error)
            .field("debug", &self.debug)
            .field("write_initial", &self.write_initial)
            .field(
                "on_change_before_validation",
                &self.on_change_before_validation.is_some(),
            )
            .field(
                "on_change_after_validation",
                &self.on_change_after_validation.is_some(),
            )
            .finish()
    }
}
