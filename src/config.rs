// ScriptForge Configuration
// Copyright (c) 2026 Xing_The_Creator | ScriptForge
//
// Everything comes from the environment (a `.env` file is loaded by the
// binary first). Keys saved through the connection test fill any key the
// environment leaves unset.

use crate::agent::connectivity::{ApiKeys, DEFAULT_MIN_KEY_LEN};
use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::warn;

pub const DEFAULT_FAST_API_URL: &str = "https://api.anthropic.com/v1";
pub const DEFAULT_FAST_MODEL: &str = "claude-3-5-haiku-latest";
pub const DEFAULT_PRECISE_API_URL: &str = "http://localhost:11434/v1";
pub const DEFAULT_PRECISE_MODEL: &str = "llama3:latest";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub fast_api_url: String,
    pub fast_model: String,
    pub precise_api_url: String,
    pub precise_model: String,
    /// Keys from the environment; saved keys fill in whatever is unset.
    pub keys: ApiKeys,
    pub data_dir: PathBuf,
    pub min_key_len: usize,
    /// Shared secret for the HTTP API. Unset means no auth.
    pub server_api_key: Option<String>,
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn check_url(name: &str, raw: &str) -> Result<()> {
    url::Url::parse(raw).with_context(|| format!("{} is not a valid URL: {}", name, raw))?;
    Ok(())
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("scriptforge")
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let fast_api_url = env_or("SCRIPTFORGE_FAST_API_URL", DEFAULT_FAST_API_URL);
        let precise_api_url = env_or("SCRIPTFORGE_PRECISE_API_URL", DEFAULT_PRECISE_API_URL);
        check_url("SCRIPTFORGE_FAST_API_URL", &fast_api_url)?;
        check_url("SCRIPTFORGE_PRECISE_API_URL", &precise_api_url)?;

        let min_key_len = match std::env::var("SCRIPTFORGE_MIN_KEY_LEN") {
            Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
                warn!(
                    "[CONFIG] Ignoring invalid SCRIPTFORGE_MIN_KEY_LEN '{}', using {}",
                    raw, DEFAULT_MIN_KEY_LEN
                );
                DEFAULT_MIN_KEY_LEN
            }),
            Err(_) => DEFAULT_MIN_KEY_LEN,
        };

        let data_dir = std::env::var("SCRIPTFORGE_DATA_DIR")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_data_dir);

        Ok(Self {
            fast_api_url,
            fast_model: env_or("SCRIPTFORGE_FAST_MODEL", DEFAULT_FAST_MODEL),
            precise_api_url,
            precise_model: env_or("SCRIPTFORGE_PRECISE_MODEL", DEFAULT_PRECISE_MODEL),
            keys: ApiKeys {
                fast_api_key: env_or("SCRIPTFORGE_FAST_API_KEY", ""),
                precise_api_key: env_or("SCRIPTFORGE_PRECISE_API_KEY", ""),
            },
            data_dir,
            min_key_len,
            server_api_key: std::env::var("SCRIPTFORGE_API_KEY")
                .ok()
                .filter(|v| !v.is_empty()),
        })
    }

    pub fn styles_path(&self) -> PathBuf {
        self.data_dir.join("styles.json")
    }

    pub fn keys_path(&self) -> PathBuf {
        self.data_dir.join("api_keys.json")
    }

    /// Environment keys win; saved keys fill the gaps.
    pub fn merge_saved_keys(&mut self, saved: &ApiKeys) {
        if self.keys.fast_api_key.is_empty() {
            self.keys.fast_api_key = saved.fast_api_key.clone();
        }
        if self.keys.precise_api_key.is_empty() {
            self.keys.precise_api_key = saved.precise_api_key.clone();
        }
    }
}
