// ScriptForge Core - The Dispatcher
// Copyright (c) 2026 Xing_The_Creator | ScriptForge
//
// Central logic shared by the CLI and the HTTP API. Each call picks an
// engine, builds the payload, waits on the backend and normalizes the
// reply. Calls are independent of each other; the only shared state is the
// connectivity registry and the activity log.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tracing::info;

use crate::agent::backends::{FastEngineClient, GenerationBackend, PreciseEngineClient};
use crate::agent::connectivity::ConnectivityRegistry;
use crate::agent::engine_router::{select_engine, Engine};
use crate::agent::error::DispatchResult;
use crate::agent::fact_check::{fact_check_result, split_ideas, FactCheckResult};
use crate::agent::normalizer::{normalize, CanonicalScript, Source};
use crate::agent::prompt_builder::{
    build_fact_check_request, build_ideas_request, build_request, build_research_request,
    RequestPayload, ScriptRequest, TaskKind,
};
use crate::agent::style_store::Style;
use crate::config::AppConfig;

/// Oldest activity lines are dropped past this many.
pub const MAX_LOG_LINES: usize = 200;

/// A normalized script and how it was produced.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ScriptOutcome {
    pub engine: Engine,
    pub task: TaskKind,
    pub script: CanonicalScript,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ResearchReport {
    pub research: String,
    pub sources: Vec<Source>,
}

impl ResearchReport {
    /// Report text followed by the sources as Markdown links.
    pub fn to_markdown(&self) -> String {
        if self.sources.is_empty() {
            return self.research.clone();
        }
        let links = self
            .sources
            .iter()
            .map(|s| format!("[{}]({})", s.name, s.url))
            .collect::<Vec<_>>()
            .join("\n");
        format!("{}\n\n**Sources:**\n{}", self.research, links)
    }
}

#[derive(Clone)]
pub struct ScriptCore {
    fast: Arc<dyn GenerationBackend>,
    precise: Arc<dyn GenerationBackend>,
    pub connectivity: Arc<ConnectivityRegistry>,
    // Observability State
    pub status: Arc<Mutex<String>>,
    pub logs: Arc<Mutex<VecDeque<String>>>,
}

impl ScriptCore {
    pub fn new(
        fast: Arc<dyn GenerationBackend>,
        precise: Arc<dyn GenerationBackend>,
        connectivity: Arc<ConnectivityRegistry>,
    ) -> Self {
        Self {
            fast,
            precise,
            connectivity,
            status: Arc::new(Mutex::new("⚡ System Ready".to_string())),
            logs: Arc::new(Mutex::new(VecDeque::from([
                "[SYSTEM] ScriptForge Core initialized.".to_string()
            ]))),
        }
    }

    /// Wire both HTTP clients from configuration.
    pub fn from_config(config: &AppConfig, connectivity: Arc<ConnectivityRegistry>) -> Self {
        let fast = FastEngineClient::new(
            &config.fast_api_url,
            &config.keys.fast_api_key,
            &config.fast_model,
        );
        let precise = PreciseEngineClient::new(
            &config.precise_api_url,
            &config.keys.precise_api_key,
            &config.precise_model,
        );
        Self::new(Arc::new(fast), Arc::new(precise), connectivity)
    }

    /// Same core with clients rebuilt from `config`. Status, log and
    /// connectivity stay shared with `self`.
    pub fn reconfigured(&self, config: &AppConfig) -> Self {
        let fresh = Self::from_config(config, self.connectivity.clone());
        Self {
            status: self.status.clone(),
            logs: self.logs.clone(),
            ..fresh
        }
    }

    fn backend(&self, engine: Engine) -> &Arc<dyn GenerationBackend> {
        match engine {
            Engine::Fast => &self.fast,
            Engine::Precise => &self.precise,
        }
    }

    // --- State Helpers ---

    pub fn set_status(&self, msg: &str) {
        if let Ok(mut status) = self.status.lock() {
            *status = msg.to_string();
        }
    }

    pub fn log(&self, msg: &str) {
        info!("{}", msg);
        if let Ok(mut logs) = self.logs.lock() {
            if logs.len() >= MAX_LOG_LINES {
                logs.pop_front();
            }
            logs.push_back(msg.to_string());
        }
    }

    pub fn get_status(&self) -> String {
        self.status
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn get_logs(&self) -> Vec<String> {
        self.logs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .cloned()
            .collect()
    }

    // --- Core Logic Methods ---

    /// Transform `request.source_text` in the voice of `style`.
    pub async fn transform(
        &self,
        style: &Style,
        request: &ScriptRequest,
    ) -> DispatchResult<ScriptOutcome> {
        let engine = select_engine(
            &self.connectivity.snapshot(),
            &style.training,
            &request.source_text,
        );
        self.run_script(engine, style, request).await
    }

    /// Generate from the title alone. Always served by the precise engine.
    pub async fn generate_from_title(
        &self,
        style: &Style,
        request: &ScriptRequest,
    ) -> DispatchResult<ScriptOutcome> {
        let title_only = ScriptRequest {
            source_text: String::new(),
            ..request.clone()
        };
        self.run_script(Engine::Precise, style, &title_only).await
    }

    async fn run_script(
        &self,
        engine: Engine,
        style: &Style,
        request: &ScriptRequest,
    ) -> DispatchResult<ScriptOutcome> {
        let payload = build_request(engine, &style.name, request, &style.training);
        self.set_status(&format!("🧠 {:?} via {} engine", payload.task, engine));
        self.log(&format!(
            "[DISPATCH] '{}' ({}) -> {} engine, task {:?}",
            request.title,
            style.id,
            engine,
            payload.task
        ));

        match self.call_and_normalize(engine, &payload).await {
            Ok(script) => {
                self.log(&format!(
                    "[DISPATCH] ✅ Script ready: {} scenes",
                    script.scenes.len()
                ));
                self.set_status("⚡ System Ready");
                Ok(ScriptOutcome {
                    engine,
                    task: payload.task,
                    script,
                })
            }
            Err(e) => {
                self.log(&format!("[DISPATCH] ❌ {}", e));
                self.set_status("⚠️ Last request failed");
                Err(e)
            }
        }
    }

    async fn call_and_normalize(
        &self,
        engine: Engine,
        payload: &RequestPayload,
    ) -> DispatchResult<CanonicalScript> {
        let reply = self.backend(engine).generate(payload).await?;
        normalize(&reply.text)
    }

    pub async fn fact_check(&self, script_content: &str) -> DispatchResult<FactCheckResult> {
        self.log("[DISPATCH] Fact-checking script content");
        let payload = build_fact_check_request(script_content);
        let reply = self.precise.generate(&payload).await?;
        let result = fact_check_result(&reply.text);
        self.log(&format!("[DISPATCH] Accuracy estimate: {}%", result.accuracy));
        Ok(result)
    }

    pub async fn generate_ideas(&self, style_name: &str) -> DispatchResult<Vec<String>> {
        self.log(&format!("[DISPATCH] Brainstorming ideas for '{}'", style_name));
        let payload = build_ideas_request(style_name);
        let reply = self.precise.generate(&payload).await?;
        Ok(split_ideas(&reply.text))
    }

    pub async fn deep_research(&self, topic: &str) -> DispatchResult<ResearchReport> {
        self.log(&format!("[DISPATCH] Researching '{}'", topic));
        let payload = build_research_request(topic);
        let reply = self.precise.generate(&payload).await?;
        Ok(ResearchReport {
            research: reply.text,
            sources: reply.citations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::backends::BackendReply;
    use crate::agent::connectivity::ApiKeys;
    use crate::agent::error::DispatchError;
    use crate::config::{DEFAULT_FAST_API_URL, DEFAULT_PRECISE_API_URL};
    use async_trait::async_trait;

    struct Idle(Engine);

    #[async_trait]
    impl GenerationBackend for Idle {
        fn engine(&self) -> Engine {
            self.0
        }

        async fn generate(&self, _payload: &RequestPayload) -> Result<BackendReply, DispatchError> {
            Ok(BackendReply::text("1. idea"))
        }
    }

    fn idle_core() -> ScriptCore {
        ScriptCore::new(
            Arc::new(Idle(Engine::Fast)),
            Arc::new(Idle(Engine::Precise)),
            Arc::new(ConnectivityRegistry::default()),
        )
    }

    #[test]
    fn test_log_is_bounded() {
        let core = idle_core();
        for i in 0..MAX_LOG_LINES + 25 {
            core.log(&format!("line {}", i));
        }
        let logs = core.get_logs();
        assert_eq!(logs.len(), MAX_LOG_LINES);
        assert_eq!(logs.last().map(String::as_str), Some("line 224"));
        assert_eq!(logs[0], "line 25");
    }

    #[test]
    fn test_reconfigured_core_keeps_activity() {
        let core = idle_core();
        core.log("[DISPATCH] before key change");
        core.set_status("busy");

        let config = AppConfig {
            fast_api_url: DEFAULT_FAST_API_URL.to_string(),
            fast_model: "fast".to_string(),
            precise_api_url: DEFAULT_PRECISE_API_URL.to_string(),
            precise_model: "precise".to_string(),
            keys: ApiKeys::default(),
            data_dir: std::path::PathBuf::from("/tmp/scriptforge"),
            min_key_len: 10,
            server_api_key: None,
        };
        let rebuilt = core.reconfigured(&config);
        rebuilt.log("[DISPATCH] after key change");

        assert_eq!(rebuilt.get_status(), "busy");
        let logs = core.get_logs();
        assert!(logs.iter().any(|l| l.contains("before key change")));
        assert!(logs.iter().any(|l| l.contains("after key change")));
        assert!(Arc::ptr_eq(&rebuilt.connectivity, &core.connectivity));
    }
}
