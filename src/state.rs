use serde::Serialize;
use std::sync::{Arc, RwLock};

use crate::agent::connectivity::{ApiKeys, ConnectivityRegistry, KeyStore};
use crate::agent::core::ScriptCore;
use crate::agent::engine_router::BackendConnectivity;
use crate::agent::error::DispatchResult;
use crate::agent::style_store::StyleStore;
use crate::config::AppConfig;

pub struct AppState {
    core: RwLock<ScriptCore>,
    pub styles: tokio::sync::RwLock<StyleStore>,
    pub connectivity: Arc<ConnectivityRegistry>,
    config: RwLock<AppConfig>,
    key_store: Box<dyn KeyStore>,
}

impl AppState {
    pub fn new(
        core: ScriptCore,
        styles: StyleStore,
        config: AppConfig,
        key_store: Box<dyn KeyStore>,
    ) -> Self {
        Self {
            connectivity: core.connectivity.clone(),
            core: RwLock::new(core),
            styles: tokio::sync::RwLock::new(styles),
            config: RwLock::new(config),
            key_store,
        }
    }

    /// Cheap handle to the current core; clones share backends and logs.
    pub fn core(&self) -> ScriptCore {
        self.core.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn server_api_key(&self) -> Option<String> {
        self.config
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .server_api_key
            .clone()
    }

    /// Persist new keys, re-probe both engines and rebuild the HTTP clients
    /// so the next request uses the new credentials. The activity log carries over.
    pub fn apply_keys(&self, keys: ApiKeys) -> DispatchResult<BackendConnectivity> {
        self.key_store.save(&keys)?;
        let statuses = self.connectivity.probe_all(&keys);

        let config = {
            let mut config = self.config.write().unwrap_or_else(|e| e.into_inner());
            config.keys = keys;
            config.clone()
        };
        let mut core = self.core.write().unwrap_or_else(|e| e.into_inner());
        let rebuilt = core.reconfigured(&config);
        *core = rebuilt;
        core.log("[SERVER] API keys updated, engine clients rebuilt");
        Ok(statuses)
    }
}

#[derive(Serialize)]
pub struct DashboardStatus {
    pub status: String,
    pub connectivity: BackendConnectivity,
    pub styles: usize,
    pub recent_logs: Vec<String>,
}
