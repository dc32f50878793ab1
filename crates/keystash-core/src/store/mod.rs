//! Byte store abstraction for Keystash.
//!
//! The sync controller never touches a storage backend directly; it is
//! handed an `Arc<dyn ByteStore>`. Stores only promise atomic single-key
//! operations. There are no cross-key transactions, and concurrent writers
//! to one key resolve last-write-wins.
//!
//! Backends:
//! - [`MemoryStore`]: process-local map, the default for tests
//! - [`SqliteStore`]: single-table SQLite database, file-backed or in memory

pub mod memory;
pub mod sqlite;
pub mod traits;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::ByteStore;
