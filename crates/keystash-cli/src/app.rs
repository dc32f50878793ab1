//! Per-invocation context: resolved paths, config and store access.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use keystash_core::config::DEFAULT_PHRASE;
use keystash_core::schema::{Schema, SchemaKind};
use keystash_core::{EncryptConfig, LocalBus, SqliteStore, SyncConfig, SyncController};
use serde_json::Value;

use crate::cli::Cli;
use crate::config::{default_config_path, default_store_path, load_config, KeystashConfig};
use crate::errors::CliError;

/// Errors collected from the sync controller during one command.
pub type ErrorLog = Arc<Mutex<Vec<String>>>;

pub struct AppContext {
    config_path: PathBuf,
    config: KeystashConfig,
    store_override: Option<PathBuf>,
    verbose: bool,
    quiet: bool,
}

impl AppContext {
    pub fn new(cli: &Cli) -> anyhow::Result<Self> {
        let config_path = match &cli.config {
            Some(path) => PathBuf::from(path),
            None => default_config_path()?,
        };
        let config = load_config(&config_path)?;
        Ok(Self {
            config_path,
            config,
            store_override: cli.store.as_ref().map(PathBuf::from),
            verbose: cli.verbose,
            quiet: cli.quiet,
        })
    }

    pub fn quiet(&self) -> bool {
        self.quiet
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Store path: `--store`, then the config file, then the XDG data dir.
    pub fn store_path(&self) -> anyhow::Result<PathBuf> {
        if let Some(path) = &self.store_override {
            return Ok(path.clone());
        }
        if let Some(path) = &self.config.store.path {
            return Ok(PathBuf::from(path));
        }
        default_store_path()
    }

    pub fn open_store(&self) -> anyhow::Result<Arc<SqliteStore>> {
        let path = self.store_path()?;
        tracing::debug!(path = %path.display(), "opening store");
        Ok(Arc::new(SqliteStore::open(&path)?))
    }

    pub fn controller(&self) -> anyhow::Result<SyncController> {
        Ok(SyncController::new(self.open_store()?, Arc::new(LocalBus::new())))
    }

    /// Phrase for the codec: `$KEYSTASH_PHRASE`, then the config file.
    pub fn phrase(&self) -> String {
        if let Ok(value) = std::env::var("KEYSTASH_PHRASE") {
            if !value.is_empty() {
                return value;
            }
        }
        self.config
            .sync
            .encrypt
            .as_ref()
            .and_then(|encrypt| encrypt.phrase.clone())
            .unwrap_or_else(|| DEFAULT_PHRASE.to_string())
    }

    /// Sync options from the config file, recording reported errors.
    pub fn sync_config(&self) -> (SyncConfig, ErrorLog) {
        let errors: ErrorLog = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&errors);

        let mut config = SyncConfig::from_settings(&self.config.sync)
            .debug(self.config.sync.debug || self.verbose)
            .on_error(move |err| {
                if let Ok(mut errors) = sink.lock() {
                    errors.push(err.to_string());
                }
            });
        if let Some(encrypt) = &config.encrypt {
            let (key, value) = (encrypt.key, encrypt.value);
            config = config.encrypt(EncryptConfig::new(self.phrase()).key(key).value(value));
        }
        (config, errors)
    }
}

/// Drain collected errors.
pub fn take_errors(log: &ErrorLog) -> Vec<String> {
    match log.lock() {
        Ok(mut errors) => std::mem::take(&mut *errors),
        Err(_) => Vec::new(),
    }
}

/// Parse a `--schema` argument: inline JSON or a path to a JSON file.
pub fn load_schema(arg: &str) -> anyhow::Result<Schema> {
    let trimmed = arg.trim_start();
    let source = if trimmed.starts_with('{') {
        arg.to_string()
    } else {
        std::fs::read_to_string(arg).map_err(|e| {
            CliError::invalid_input_with_hint(
                format!("Failed to read schema {}: {}", arg, e),
                "Pass a JSON schema definition inline or a path to a file containing one.",
            )
        })?
    };
    let definition: Value = serde_json::from_str(&source)
        .map_err(|e| CliError::invalid_input(format!("Schema is not valid JSON: {}", e)))?;
    Schema::from_definition(&definition).map_err(|e| CliError::invalid_input(e.to_string()).into())
}

/// Parse a value argument as JSON, taking anything else as a plain string.
///
/// For string schemas only a quoted JSON string is decoded; `42` stays the
/// text `"42"`.
pub fn parse_value_arg(arg: &str, schema: &Schema) -> Value {
    match serde_json::from_str::<Value>(arg) {
        Ok(Value::String(text)) => Value::String(text),
        Ok(value) if !matches!(schema.kind(), SchemaKind::String) => value,
        _ => Value::String(arg.to_string()),
    }
}
