//! SQLite-backed byte store.
//!
//! Values live in a single `entries(key TEXT PRIMARY KEY, value BLOB)`
//! table. Each operation is one statement, which gives the single-key
//! atomicity the sync controller relies on.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{KeystashError, Result};
use crate::store::traits::ByteStore;

/// Schema version stored in `PRAGMA user_version`.
const FORMAT_VERSION: i32 = 1;

/// SQLite byte store.
pub struct SqliteStore {
    path: Option<PathBuf>,
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (creating if needed) a store at `path`.
    ///
    /// Missing parent directories are created.
    ///
    /// # Errors
    ///
    /// Returns `KeystashError::Store` if the directory cannot be created,
    /// or a SQLite error if the file is not a compatible database.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    KeystashError::Store(format!(
                        "Failed to create store directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }
        let conn = Connection::open(path)?;
        Self::init(conn, Some(path.to_path_buf()))
    }

    /// Open a private in-memory store.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn, None)
    }

    fn init(conn: Connection, path: Option<PathBuf>) -> Result<Self> {
        let version: i32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
        if version > FORMAT_VERSION {
            return Err(KeystashError::Store(format!(
                "Unsupported store format version {} (max {})",
                version, FORMAT_VERSION
            )));
        }

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS entries (
                key TEXT PRIMARY KEY NOT NULL,
                value BLOB NOT NULL
            );",
        )?;
        conn.pragma_update(None, "user_version", FORMAT_VERSION)?;

        Ok(Self {
            path,
            conn: Mutex::new(conn),
        })
    }

    /// Lock the database connection, returning an error if the mutex is poisoned.
    fn lock_conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| KeystashError::Store("SQLite connection poisoned".to_string()))
    }

    /// Location of the database file, `None` for in-memory stores.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// All stored keys, sorted.
    pub fn keys(&self) -> Result<Vec<String>> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare("SELECT key FROM entries ORDER BY key")?;
        let keys = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(keys)
    }
}

impl ByteStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let conn = self.lock_conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM entries WHERE key = ?1",
                params![key],
                |row| row.get::<_, Vec<u8>>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        let conn = self.lock_conn()?;
        conn.execute(
            "INSERT INTO entries (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        let conn = self.lock_conn()?;
        conn.execute("DELETE FROM entries WHERE key = ?1", params![key])?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let conn = self.lock_conn()?;
        conn.execute("DELETE FROM entries", [])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_round_trip() {
        let store = SqliteStore::in_memory().unwrap();
        assert!(store.path().is_none());
        assert_eq!(store.get("user").unwrap(), None);

        store.set("user", b"{\"name\":\"Jane\"}").unwrap();
        assert_eq!(
            store.get("user").unwrap(),
            Some(b"{\"name\":\"Jane\"}".to_vec())
        );
    }

    #[test]
    fn test_overwrite_is_last_write_wins() {
        let store = SqliteStore::in_memory().unwrap();
        store.set("k", b"first").unwrap();
        store.set("k", b"second").unwrap();
        assert_eq!(store.get("k").unwrap(), Some(b"second".to_vec()));
        assert_eq!(store.keys().unwrap(), vec!["k".to_string()]);
    }

    #[test]
    fn test_delete_and_clear() {
        let store = SqliteStore::in_memory().unwrap();
        store.set("a", b"1").unwrap();
        store.set("b", b"2").unwrap();

        store.delete("a").unwrap();
        store.delete("missing").unwrap();
        assert_eq!(store.keys().unwrap(), vec!["b".to_string()]);

        store.clear().unwrap();
        assert!(store.keys().unwrap().is_empty());
    }

    #[test]
    fn test_binary_values_preserved() {
        let store = SqliteStore::in_memory().unwrap();
        let bytes = [0u8, 159, 146, 150, 255];
        store.set("bin", &bytes).unwrap();
        assert_eq!(store.get("bin").unwrap(), Some(bytes.to_vec()));
    }
}
