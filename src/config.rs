//! Settings for the platform backends.
//!
//! Layered from defaults, then `~/.config/credstore/config.json` (or the
//! platform equivalent), then the `CREDSTORE_*` environment variables.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_COLLECTION: &str = "login";
pub const DEFAULT_SECURITY_BIN: &str = "/usr/bin/security";

const ENV_COLLECTION: &str = "CREDSTORE_COLLECTION";
const ENV_SECURITY_BIN: &str = "CREDSTORE_SECURITY_BIN";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Secret Service collection to operate in. `"default"` selects the
    /// service's default alias.
    pub collection: String,
    /// Path of the macOS `security` tool.
    pub security_bin: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            collection: DEFAULT_COLLECTION.to_string(),
            security_bin: PathBuf::from(DEFAULT_SECURITY_BIN),
        }
    }
}

impl Settings {
    /// Resolve settings from every source. Never fails: an unreadable or
    /// malformed config file is reported and skipped.
    pub fn load() -> Self {
        let mut settings = match Self::config_path() {
            Some(path) if path.exists() => Self::from_json_file(&path).unwrap_or_else(|e| {
                log::warn!("ignoring config file {}: {e}", path.display());
                Self::default()
            }),
            _ => Self::default(),
        };
        settings.apply_env(|key| std::env::var(key).ok());
        settings
    }

    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("credstore").join("config.json"))
    }

    pub fn from_json_file(path: &Path) -> Result<Self, String> {
        let raw = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
        serde_json::from_str(&raw).map_err(|e| format!("Failed to parse {}: {e}", path.display()))
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(collection) = lookup(ENV_COLLECTION).filter(|v| !v.is_empty()) {
            self.collection = collection;
        }
        if let Some(bin) = lookup(ENV_SECURITY_BIN).filter(|v| !v.is_empty()) {
            self.security_bin = PathBuf::from(bin);
        }
    }
}
