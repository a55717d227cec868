// ScriptForge Connectivity Registry
// Copyright (c) 2026 Xing_The_Creator | ScriptForge
//
// Tracks which engines are usable. The key check is a length heuristic
// driven by configuration; it says nothing about whether a key is genuine.

use crate::agent::engine_router::{BackendConnectivity, ConnectionStatus, Engine};
use crate::agent::error::{DispatchError, DispatchResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::RwLock;
use tracing::{info, warn};

pub const DEFAULT_MIN_KEY_LEN: usize = 10;

/// Non-blank and longer than `min_len` characters.
pub fn key_looks_usable(key: &str, min_len: usize) -> bool {
    !key.trim().is_empty() && key.chars().count() > min_len
}

fn key_prefix(key: &str) -> String {
    key.chars().take(5).collect()
}

pub struct ConnectivityRegistry {
    statuses: RwLock<BackendConnectivity>,
    min_key_len: usize,
}

impl Default for ConnectivityRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_KEY_LEN)
    }
}

impl ConnectivityRegistry {
    pub fn new(min_key_len: usize) -> Self {
        Self {
            statuses: RwLock::new(BackendConnectivity::default()),
            min_key_len,
        }
    }

    pub fn snapshot(&self) -> BackendConnectivity {
        *self.statuses.read().unwrap_or_else(|e| e.into_inner())
    }

    pub fn set(&self, engine: Engine, status: ConnectionStatus) {
        self.statuses
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .set(engine, status);
    }

    /// Test `key` for `engine` and record the outcome. A missing key marks
    /// the engine disconnected straight away.
    pub fn probe(&self, engine: Engine, key: &str) -> bool {
        if key.is_empty() {
            self.set(engine, ConnectionStatus::Disconnected);
            return false;
        }

        self.set(engine, ConnectionStatus::Pending);
        info!("[CONNECT] Testing {} engine key {}...", engine, key_prefix(key));

        let ok = key_looks_usable(key, self.min_key_len);
        let status = if ok {
            ConnectionStatus::Connected
        } else {
            ConnectionStatus::Disconnected
        };
        self.set(engine, status);

        if ok {
            info!("[CONNECT] ✅ {} engine connected", engine);
        } else {
            warn!("[CONNECT] ❌ {} engine key rejected", engine);
        }
        ok
    }

    pub fn probe_all(&self, keys: &ApiKeys) -> BackendConnectivity {
        self.probe(Engine::Fast, &keys.fast_api_key);
        self.probe(Engine::Precise, &keys.precise_api_key);
        self.snapshot()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiKeys {
    pub fast_api_key: String,
    pub precise_api_key: String,
}

impl ApiKeys {
    pub fn key_for(&self, engine: Engine) -> &str {
        match engine {
            Engine::Fast => &self.fast_api_key,
            Engine::Precise => &self.precise_api_key,
        }
    }
}

/// Save/load port for API key material.
pub trait KeyStore: Send + Sync {
    fn load(&self) -> DispatchResult<ApiKeys>;
    fn save(&self, keys: &ApiKeys) -> DispatchResult<()>;
}

pub struct JsonFileKeys {
    path: PathBuf,
}

impl JsonFileKeys {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl KeyStore for JsonFileKeys {
    fn load(&self) -> DispatchResult<ApiKeys> {
        if !self.path.exists() {
            info!("[KEYS] No saved keys found.");
            return Ok(ApiKeys::default());
        }
        let data = fs::read_to_string(&self.path)?;
        serde_json::from_str(&data).map_err(|e| DispatchError::Persistence(e.to_string()))
    }

    fn save(&self, keys: &ApiKeys) -> DispatchResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let data = serde_json::to_string_pretty(keys)
            .map_err(|e| DispatchError::Persistence(e.to_string()))?;
        fs::write(&self.path, data)?;
        info!("[KEYS] Keys saved.");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_threshold() {
        assert!(!key_looks_usable("", 10));
        assert!(!key_looks_usable("            ", 10));
        assert!(!key_looks_usable("0123456789", 10));
        assert!(key_looks_usable("0123456789a", 10));
        assert!(key_looks_usable("abcd", 3));
    }

    #[test]
    fn test_probe_updates_status() {
        let registry = ConnectivityRegistry::default();
        assert_eq!(registry.snapshot().fast, ConnectionStatus::Disconnected);

        assert!(registry.probe(Engine::Fast, "sk-live-0123456789"));
        assert_eq!(registry.snapshot().fast, ConnectionStatus::Connected);
        assert_eq!(registry.snapshot().precise, ConnectionStatus::Disconnected);

        assert!(!registry.probe(Engine::Fast, "short"));
        assert_eq!(registry.snapshot().fast, ConnectionStatus::Disconnected);
    }

    #[test]
    fn test_probe_all() {
        let registry = ConnectivityRegistry::new(4);
        let keys = ApiKeys {
            fast_api_key: "abcdef".to_string(),
            precise_api_key: String::new(),
        };
        let statuses = registry.probe_all(&keys);
        assert!(statuses.is_connected(Engine::Fast));
        assert!(!statuses.is_connected(Engine::Precise));
    }

    #[test]
    fn test_key_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileKeys::new(dir.path().join("nested").join("keys.json"));
        assert_eq!(store.load().unwrap(), ApiKeys::default());

        let keys = ApiKeys {
            fast_api_key: "fast-key-123456".to_string(),
            precise_api_key: "precise-key-123456".to_string(),
        };
        store.save(&keys).unwrap();
        assert_eq!(store.load().unwrap(), keys);
        assert_eq!(keys.key_for(Engine::Precise), "precise-key-123456");
    }
}
