//! # Keystash Core
//!
//! Typed, validated, optionally obfuscated persistence of structured values
//! into a key/value byte store, with change notification to every consumer
//! of the same key.
//!
//! ## Architecture
//!
//! - **obfuscation**: Reversible phrase-keyed string codec
//! - **schema**: Composable validators producing typed values
//! - **store**: Byte store trait plus in-memory and SQLite backends
//! - **bus**: Same-process publish/subscribe for change notifications
//! - **config**: Per-call sync options
//! - **sync**: Load/update/subscribe controller and per-key handles
//!
//! ## Example
//!
//! ```
//! use keystash_core::schema::string;
//! use keystash_core::{SyncConfig, SyncController, Update};
//!
//! let controller = SyncController::in_memory();
//! let config = SyncConfig::new().use_broadcast_channel(false);
//! let schema = string().min(1);
//!
//! let greeting = controller
//!     .load("greeting", &schema, "hello".to_string(), &config)
//!     .unwrap();
//! let updated = controller.update("greeting", &schema, &config, &greeting, Update::Value("hi".to_string()));
//! assert_eq!(updated.as_deref(), Some("hi"));
//! ```

pub mod bus;
pub mod config;
pub mod error;
pub mod obfuscation;
pub mod schema;
pub mod store;
pub mod sync;

pub use bus::{LocalBus, MessageBus, Subscription};
pub use config::{EncryptConfig, SyncConfig, SyncSettings};
pub use error::{KeystashError, Result};
pub use schema::{Schema, Typed, ValidationError};
pub use store::{ByteStore, MemoryStore, SqliteStore};
pub use sync::{SyncController, SyncState, SyncedKey, Update};

/// Core version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
