use std::path::{Path, PathBuf};

use keystash_core::SyncSettings;
use serde::{Deserialize, Serialize};

use crate::constants::{CONFIG_FILE_NAME, STORE_FILE_NAME};

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KeystashConfig {
    pub store: StoreSection,
    pub sync: SyncSettings,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSection {
    pub path: Option<String>,
}

pub fn default_config_path() -> anyhow::Result<PathBuf> {
    Ok(xdg_config_dir()?.join(CONFIG_FILE_NAME))
}

pub fn default_store_path() -> anyhow::Result<PathBuf> {
    Ok(xdg_data_dir()?.join(STORE_FILE_NAME))
}

pub fn read_config(path: &Path) -> anyhow::Result<KeystashConfig> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read config {}: {}", path.display(), e))?;
    let config = parse_config(&contents)
        .map_err(|e| anyhow::anyhow!("Failed to parse config {}: {}", path.display(), e))?;
    config
        .sync
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid config {}: {}", path.display(), e))?;
    Ok(config)
}

/// Read the config at `path`, falling back to defaults when it does not exist.
pub fn load_config(path: &Path) -> anyhow::Result<KeystashConfig> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        return Ok(KeystashConfig::default());
    }
    read_config(path)
}

fn parse_config(contents: &str) -> Result<KeystashConfig, toml::de::Error> {
    toml::from_str(contents)
}

pub fn xdg_config_dir() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("XDG_CONFIG_HOME") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value).join("keystash"));
        }
    }
    Ok(home_dir()?.join(".config").join("keystash"))
}

pub fn xdg_data_dir() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("XDG_DATA_HOME") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value).join("keystash"));
        }
    }
    Ok(home_dir()?.join(".local").join("share").join("keystash"))
}

fn home_dir() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME")
        .map_err(|_| anyhow::anyhow!("HOME is not set; cannot resolve default paths"))?;
    Ok(PathBuf::from(home))
}
