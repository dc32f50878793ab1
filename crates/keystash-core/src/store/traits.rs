//! Byte store trait definition.

use crate::error::Result;

/// Key/value byte store consumed by the sync controller.
///
/// All implementations must ensure:
/// - A single `get`/`set`/`delete` is atomic
/// - `get` after a successful `set` returns the written bytes
/// - Keys are compared as exact strings (no normalization)
pub trait ByteStore: Send + Sync {
    /// Read the bytes stored under `key`.
    ///
    /// # Returns
    ///
    /// Returns `Ok(Some(bytes))` if present, `Ok(None)` if absent.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns `KeystashError::Store` (or a backend-specific variant) if
    /// the write cannot be completed.
    fn set(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Remove `key`. Removing an absent key is not an error.
    fn delete(&self, key: &str) -> Result<()>;

    /// Remove every key.
    fn clear(&self) -> Result<()>;
}
