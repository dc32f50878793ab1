use std::sync::Arc;

use keystash_core::schema::{array, string};
use keystash_core::{ByteStore, EncryptConfig, LocalBus, SqliteStore, SyncConfig, SyncController, Update};
use tempfile::TempDir;

#[test]
fn test_file_store_persists_across_reopen() {
    let dir = TempDir::new().expect("tempdir should be created");
    let path = dir.path().join("nested").join("store.db");

    {
        let store = SqliteStore::open(&path).expect("open should succeed");
        assert_eq!(store.path(), Some(path.as_path()));
        store.set("a", b"1").expect("set should succeed");
    }
    assert!(path.exists());

    let store = SqliteStore::open(&path).expect("reopen should succeed");
    assert_eq!(store.get("a").unwrap(), Some(b"1".to_vec()));
}

#[test]
fn test_sync_over_sqlite() {
    let dir = TempDir::new().expect("tempdir should be created");
    let path = dir.path().join("store.db");
    let config = SyncConfig::new()
        .use_broadcast_channel(false)
        .encrypt(EncryptConfig::new("secret-phrase").key(true).value(true));
    let schema = array(string().min(1)).max(5);
    let tags = vec!["rust".to_string(), "sqlite".to_string()];

    {
        let store = Arc::new(SqliteStore::open(&path).expect("open should succeed"));
        let controller = SyncController::new(store, Arc::new(LocalBus::new()));
        let stored = controller.update("tags", &schema, &config, &Vec::new(), Update::Value(tags.clone()));
        assert_eq!(stored, Some(tags.clone()));
    }

    let store = Arc::new(SqliteStore::open(&path).expect("reopen should succeed"));
    let keys = store.keys().unwrap();
    assert_eq!(keys, vec![config.storage_key("tags")]);

    let controller = SyncController::new(store, Arc::new(LocalBus::new()));
    let loaded = controller
        .load("tags", &schema, Vec::new(), &config)
        .expect("load should succeed");
    assert_eq!(loaded, tags);
}

#[test]
fn test_open_rejects_non_database_file() {
    let dir = TempDir::new().expect("tempdir should be created");
    let path = dir.path().join("not-a-db");
    std::fs::write(&path, b"definitely not sqlite, just some plain text padding out the header").unwrap();

    assert!(SqliteStore::open(&path).is_err());
}
