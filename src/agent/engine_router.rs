// ScriptForge Engine Router
// Copyright (c) 2026 Xing_The_Creator | ScriptForge
//
// Decides which backend serves a request. The fast engine only handles
// transformations of user-supplied text, for trained styles, once its
// connection has been verified. Everything else goes to the precise engine.

use crate::agent::training::TrainingProfile;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    /// Quick, high-fidelity reformatting of source text
    Fast,
    /// General-purpose generation, research and fact-checking
    Precise,
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Engine::Fast => write!(f, "fast"),
            Engine::Precise => write!(f, "precise"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Connected,
    #[default]
    Disconnected,
    Pending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BackendConnectivity {
    pub fast: ConnectionStatus,
    pub precise: ConnectionStatus,
}

impl BackendConnectivity {
    pub fn status(&self, engine: Engine) -> ConnectionStatus {
        match engine {
            Engine::Fast => self.fast,
            Engine::Precise => self.precise,
        }
    }

    pub fn set(&mut self, engine: Engine, status: ConnectionStatus) {
        match engine {
            Engine::Fast => self.fast = status,
            Engine::Precise => self.precise = status,
        }
    }

    pub fn is_connected(&self, engine: Engine) -> bool {
        self.status(engine) == ConnectionStatus::Connected
    }
}

/// Pick the backend for a request.
///
/// 1. No source text: precise (generation from title only).
/// 2. Source text, fast connected, trained profile: fast.
/// 3. Anything else: precise.
pub fn select_engine(
    connectivity: &BackendConnectivity,
    profile: &TrainingProfile,
    source_text: &str,
) -> Engine {
    if source_text.trim().is_empty() {
        return Engine::Precise;
    }
    if connectivity.is_connected(Engine::Fast) && profile.is_trained() {
        Engine::Fast
    } else {
        Engine::Precise
    }
}
