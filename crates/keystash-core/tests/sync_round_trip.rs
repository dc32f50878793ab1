use std::sync::{Arc, Mutex};
use std::time::Duration;

use keystash_core::bus::MessageBus;
use keystash_core::obfuscation;
use keystash_core::schema::{number, object, string, Typed};
use keystash_core::{
    ByteStore, EncryptConfig, KeystashError, LocalBus, MemoryStore, SyncConfig, SyncController,
    SyncState, SyncedKey, Update,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct User {
    name: String,
    age: u32,
}

fn user_schema() -> Typed<User> {
    object([
        ("name", string().required().into()),
        ("age", number().min(0.0).into()),
    ])
}

fn anonymous() -> User {
    User {
        name: "Anonymous".to_string(),
        age: 0,
    }
}

struct Harness {
    store: Arc<MemoryStore>,
    bus: Arc<LocalBus>,
    controller: SyncController,
}

impl Harness {
    fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let bus = Arc::new(LocalBus::new());
        let controller = SyncController::new(store.clone(), bus.clone());
        Self {
            store,
            bus,
            controller,
        }
    }

    /// Fresh controller over the same store and bus.
    fn reopen(&self) -> SyncController {
        SyncController::new(self.store.clone(), self.bus.clone())
    }
}

fn error_sink() -> (Arc<Mutex<Vec<String>>>, SyncConfig) {
    let errors = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&errors);
    let config = SyncConfig::new().on_error(move |err: &KeystashError| {
        sink.lock().unwrap().push(err.to_string());
    });
    (errors, config)
}

async fn eventually(mut check: impl FnMut() -> bool) -> bool {
    for _ in 0..100 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

#[test]
fn test_obfuscated_round_trip() {
    let harness = Harness::new();
    let config = SyncConfig::new()
        .use_broadcast_channel(false)
        .encrypt(EncryptConfig::new("secret-phrase").key(true).value(true));
    let bob = User {
        name: "Bob".to_string(),
        age: 40,
    };

    let stored = harness.controller.update(
        "user",
        &user_schema(),
        &config,
        &anonymous(),
        Update::Value(bob.clone()),
    );
    assert_eq!(stored, Some(bob.clone()));

    let keys = harness.store.keys().expect("keys should list");
    assert_eq!(keys.len(), 1);
    assert_ne!(keys[0], "user");

    let bytes = harness
        .store
        .get(&keys[0])
        .expect("get should succeed")
        .expect("record should exist");
    let plain = serde_json::to_vec(&serde_json::to_value(&bob).unwrap()).unwrap();
    assert_ne!(bytes, plain);
    assert!(serde_json::from_slice::<Value>(&bytes).is_err());

    let loaded = harness
        .reopen()
        .load("user", &user_schema(), anonymous(), &config)
        .expect("load should succeed");
    assert_eq!(loaded, bob);
}

#[test]
fn test_wrong_phrase_restores_initial() {
    let harness = Harness::new();
    let writer = SyncConfig::new()
        .use_broadcast_channel(false)
        .encrypt(EncryptConfig::new("secret-phrase").value(true));
    let bob = User {
        name: "Bob".to_string(),
        age: 40,
    };
    harness
        .controller
        .update("user", &user_schema(), &writer, &anonymous(), bob.into());

    let (errors, reader) = error_sink();
    let reader = reader.encrypt(EncryptConfig::new("other-phrase").value(true));
    let loaded = harness
        .controller
        .load("user", &user_schema(), anonymous(), &reader)
        .expect("load should restore");
    assert_eq!(loaded, anonymous());
    assert_eq!(errors.lock().unwrap().len(), 1);
}

#[test]
fn test_empty_store_returns_initial() {
    let harness = Harness::new();
    let config = SyncConfig::new();

    let value = harness
        .controller
        .load("k", &string(), "hello world".to_string(), &config)
        .expect("load should succeed");
    assert_eq!(value, "hello world");
    assert!(harness.store.is_empty().unwrap());

    let config = config.write_initial(true);
    harness
        .controller
        .load("k", &string(), "hello world".to_string(), &config)
        .expect("load should succeed");
    assert_eq!(
        harness.store.get("k").unwrap(),
        Some(b"hello world".to_vec())
    );

    let reloaded = harness
        .controller
        .load("k", &string(), String::new(), &SyncConfig::new())
        .expect("load should succeed");
    assert_eq!(reloaded, "hello world");
}

#[test]
fn test_loads_plain_json_record() {
    let harness = Harness::new();
    harness
        .store
        .set("user", br#"{"name":"Jane","age":25}"#)
        .unwrap();

    let loaded = harness
        .controller
        .load("user", &user_schema(), anonymous(), &SyncConfig::new())
        .expect("load should succeed");
    assert_eq!(
        loaded,
        User {
            name: "Jane".to_string(),
            age: 25
        }
    );
}

#[test]
fn test_invalid_record_reports_and_restores() {
    let harness = Harness::new();
    harness.store.set("user", br#"{"age":25}"#).unwrap();
    let (errors, config) = error_sink();

    let loaded = harness
        .controller
        .load("user", &user_schema(), anonymous(), &config)
        .expect("load should restore");
    assert_eq!(loaded, anonymous());

    let errors = errors.lock().unwrap();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("name: Required string missing"));
}

#[test]
fn test_invalid_record_without_restore_fails() {
    let harness = Harness::new();
    harness.store.set("user", b"not json at all").unwrap();
    let (errors, config) = error_sink();
    let config = config.restore_on_error(false);

    let err = harness
        .controller
        .load("user", &user_schema(), anonymous(), &config)
        .unwrap_err();
    assert!(err.is_validation());
    assert_eq!(errors.lock().unwrap().len(), 1);
}

#[test]
fn test_rejected_update_writes_backup() {
    let harness = Harness::new();
    let (errors, config) = error_sink();
    let config = config.use_broadcast_channel(false).backup_on_error(true);
    let schema = string().max(3);

    let result = harness.controller.update(
        "code",
        &schema,
        &config,
        &String::new(),
        Update::Value("too long".to_string()),
    );
    assert!(result.is_none());
    assert_eq!(errors.lock().unwrap().len(), 1);

    let keys = harness.store.keys().unwrap();
    assert_eq!(keys.len(), 1);
    let backup_key = &keys[0];
    assert!(backup_key.starts_with("code_"));
    let stamp = backup_key.trim_start_matches("code_");
    assert!(chrono::DateTime::parse_from_rfc3339(stamp).is_ok());
    assert_eq!(
        harness.store.get(backup_key).unwrap(),
        Some(b"\"too long\"".to_vec())
    );
}

#[test]
fn test_backup_key_is_obfuscated_like_primary_key() {
    let harness = Harness::new();
    let (errors, config) = error_sink();
    let config = config
        .use_broadcast_channel(false)
        .backup_on_error(true)
        .encrypt(EncryptConfig::new("secret-phrase").key(true).value(true));

    let result = harness.controller.update(
        "code",
        &string().max(3),
        &config,
        &String::new(),
        Update::Value("too long".to_string()),
    );
    assert!(result.is_none());
    assert_eq!(errors.lock().unwrap().len(), 1);

    let keys = harness.store.keys().unwrap();
    assert_eq!(keys.len(), 1);
    let logical = obfuscation::decode("secret-phrase", &keys[0]);
    assert!(logical.starts_with("code_"), "decoded backup key: {}", logical);
    let stamp = logical.trim_start_matches("code_");
    assert!(chrono::DateTime::parse_from_rfc3339(stamp).is_ok());

    // The candidate is kept as plain JSON even with value obfuscation on.
    assert_eq!(
        harness.store.get(&keys[0]).unwrap(),
        Some(b"\"too long\"".to_vec())
    );
}

#[test]
fn test_change_hooks_see_old_and_new() {
    let harness = Harness::new();
    let seen: Arc<Mutex<Vec<(&'static str, Value, Value)>>> = Arc::new(Mutex::new(Vec::new()));
    let before = Arc::clone(&seen);
    let after = Arc::clone(&seen);
    let config = SyncConfig::new()
        .use_broadcast_channel(false)
        .on_change_before_validation(move |old, new| {
            before
                .lock()
                .unwrap()
                .push(("before", old.clone(), new.clone()));
        })
        .on_change_after_validation(move |old, new| {
            after
                .lock()
                .unwrap()
                .push(("after", old.clone(), new.clone()));
        });

    let result = harness.controller.update(
        "n",
        &number(),
        &config,
        &1.0,
        Update::with(|n: &f64| n * 3.0),
    );
    assert_eq!(result, Some(3.0));

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0].0, "before");
    assert_eq!(seen[1].0, "after");
    assert_eq!(seen[1].1, serde_json::json!(1.0));
    assert_eq!(seen[1].2, serde_json::json!(3.0));
}

#[test]
fn test_verbatim_string_round_trip() {
    let harness = Harness::new();
    let config = SyncConfig::new().use_broadcast_channel(false);
    harness.controller.update(
        "pin",
        &string(),
        &config,
        &String::new(),
        "42".to_string().into(),
    );
    assert_eq!(harness.store.get("pin").unwrap(), Some(b"42".to_vec()));

    let loaded = harness
        .controller
        .load("pin", &string(), String::new(), &config)
        .unwrap();
    assert_eq!(loaded, "42");
}

#[test]
fn test_json_looking_strings_round_trip() {
    let harness = Harness::new();
    let (errors, config) = error_sink();
    let config = config.use_broadcast_channel(false);

    for text in ["null", "\"hi\"", "true"] {
        let written = harness.controller.update(
            "k",
            &string(),
            &config,
            &String::new(),
            Update::Value(text.to_string()),
        );
        assert_eq!(written.as_deref(), Some(text));

        let loaded = harness
            .reopen()
            .load("k", &string(), "initial".to_string(), &config)
            .unwrap();
        assert_eq!(loaded, text);
    }
    assert!(errors.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_remote_string_arrives_verbatim() {
    let harness = Harness::new();
    let config = SyncConfig::new();
    let received = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&received);
    let _subscription = harness
        .controller
        .subscribe("k", &string(), &config, move |value: String| {
            sink.lock().unwrap().push(value);
        })
        .expect("subscribe should succeed");

    harness
        .reopen()
        .update("k", &string(), &config, &String::new(), "null".to_string().into());
    assert!(eventually(|| received.lock().unwrap().len() == 1).await);
    assert_eq!(*received.lock().unwrap(), vec!["null".to_string()]);
}

#[tokio::test]
async fn test_broadcast_reaches_other_handle() {
    let harness = Harness::new();
    let config = SyncConfig::new().encrypt(EncryptConfig::new("secret-phrase").key(true).value(true));

    let first = SyncedKey::open(
        &harness.controller,
        "user",
        user_schema(),
        anonymous(),
        config.clone(),
    )
    .expect("open should succeed");
    let second = SyncedKey::open(&harness.reopen(), "user", user_schema(), anonymous(), config)
        .expect("open should succeed");
    assert!(second.is_listening());

    let bob = User {
        name: "Bob".to_string(),
        age: 40,
    };
    assert!(first.set(bob.clone()));

    assert!(eventually(|| second.get() == bob).await);
    assert_eq!(second.state(), SyncState::RemoteUpdated);
}

#[tokio::test]
async fn test_bad_remote_payload_keeps_value() {
    let harness = Harness::new();
    let (errors, config) = error_sink();
    let handle = SyncedKey::open(&harness.controller, "user", user_schema(), anonymous(), config)
        .expect("open should succeed");

    let channel = harness.bus.open_channel("user").unwrap();
    channel.publish(b"{\"name\": 7}").unwrap();
    channel.close();

    assert!(eventually(|| !errors.lock().unwrap().is_empty()).await);
    assert_eq!(handle.get(), anonymous());
    assert_eq!(handle.state(), SyncState::Loaded);
}

#[tokio::test]
async fn test_dropping_handle_stops_listening() {
    let harness = Harness::new();
    let handle = SyncedKey::open(
        &harness.controller,
        "k",
        string(),
        String::new(),
        SyncConfig::new(),
    )
    .expect("open should succeed");
    assert_eq!(harness.bus.listener_count("k"), 1);

    drop(handle);
    assert_eq!(harness.bus.listener_count("k"), 0);
}

#[tokio::test]
async fn test_subscription_unsubscribe() {
    let harness = Harness::new();
    let received = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&received);
    let config = SyncConfig::new();

    let subscription = harness
        .controller
        .subscribe("k", &string(), &config, move |value: String| {
            sink.lock().unwrap().push(value);
        })
        .expect("subscribe should succeed");

    harness
        .controller
        .update("k", &string(), &config, &String::new(), "one".to_string().into());
    assert!(eventually(|| received.lock().unwrap().len() == 1).await);

    subscription.unsubscribe();
    assert_eq!(harness.bus.listener_count("k"), 0);

    harness
        .controller
        .update("k", &string(), &config, &String::new(), "two".to_string().into());
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(*received.lock().unwrap(), vec!["one".to_string()]);
}

#[test]
fn test_subscribe_outside_runtime_fails() {
    let harness = Harness::new();
    let err = harness
        .controller
        .subscribe("k", &string(), &SyncConfig::new(), |_: String| {})
        .unwrap_err();
    assert!(matches!(err, KeystashError::Channel(_)));
}
