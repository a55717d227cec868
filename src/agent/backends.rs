// ScriptForge Generation Backends
// Copyright (c) 2026 Xing_The_Creator | ScriptForge
//
// The two engines behind one interface. The fast engine speaks an
// Anthropic-style Messages API; the precise engine speaks the
// OpenAI-compatible Chat Completions API with structured output.

use crate::agent::engine_router::Engine;
use crate::agent::error::DispatchError;
use crate::agent::normalizer::Source;
use crate::agent::prompt_builder::RequestPayload;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{error, info};

const REQUEST_TIMEOUT_SECS: u64 = 120;
const FAST_MAX_TOKENS: u32 = 8192;
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Raw text from a backend, plus any web citations it attached.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BackendReply {
    pub text: String,
    pub citations: Vec<Source>,
}

impl BackendReply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            citations: Vec::new(),
        }
    }
}

#[async_trait]
pub trait GenerationBackend: Send + Sync {
    fn engine(&self) -> Engine;

    async fn generate(&self, payload: &RequestPayload) -> Result<BackendReply, DispatchError>;
}

fn http_client() -> Client {
    Client::builder()
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()
        .unwrap_or_default()
}

/// Turn a bare citation URL into a named source.
fn citation_source(raw: &str) -> Source {
    let name = url::Url::parse(raw)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| raw.to_string());
    Source {
        name,
        url: raw.to_string(),
        reliability: None,
    }
}

// --- Fast Engine ---

pub struct FastEngineClient {
    client: Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl FastEngineClient {
    pub fn new(api_url: &str, api_key: &str, model: &str) -> Self {
        Self {
            client: http_client(),
            api_url: api_url.to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        }
    }

    /// Messages API has no schema field, so the schema rides in the system
    /// prompt.
    pub fn request_body(&self, payload: &RequestPayload) -> Value {
        let system = match &payload.output_schema {
            Some(schema) => format!(
                "{}\n\nJSON schema the reply must satisfy:\n{}",
                payload.system_instruction, schema
            ),
            None => payload.system_instruction.clone(),
        };

        json!({
            "model": self.model,
            "max_tokens": FAST_MAX_TOKENS,
            "system": system,
            "messages": [
                { "role": "user", "content": payload.prompt }
            ]
        })
    }

    fn reply_text(json: &Value) -> String {
        json["content"]
            .as_array()
            .map(|blocks| {
                blocks
                    .iter()
                    .filter_map(|b| b["text"].as_str())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl GenerationBackend for FastEngineClient {
    fn engine(&self) -> Engine {
        Engine::Fast
    }

    async fn generate(&self, payload: &RequestPayload) -> Result<BackendReply, DispatchError> {
        info!("[FAST] {:?} request with {}", payload.task, self.model);

        let endpoint = format!("{}/messages", self.api_url.trim_end_matches('/'));
        let resp = self
            .client
            .post(&endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&self.request_body(payload))
            .send()
            .await
            .map_err(|e| {
                error!("[FAST] Connection failed: {}", e);
                DispatchError::backend(Engine::Fast, e.to_string())
            })?;

        if !resp.status().is_success() {
            return Err(DispatchError::backend(
                Engine::Fast,
                format!("API Error: {}", resp.status()),
            ));
        }

        let json: Value = resp
            .json()
            .await
            .map_err(|e| DispatchError::backend(Engine::Fast, e.to_string()))?;
        Ok(BackendReply::text(Self::reply_text(&json)))
    }
}

// --- Precise Engine ---

pub struct PreciseEngineClient {
    client: Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl PreciseEngineClient {
    pub fn new(api_url: &str, api_key: &str, model: &str) -> Self {
        Self {
            client: http_client(),
            api_url: api_url.to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        }
    }

    pub fn request_body(&self, payload: &RequestPayload) -> Value {
        let mut body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": payload.system_instruction },
                { "role": "user", "content": payload.prompt }
            ],
            "temperature": 0.7
        });

        if let Some(schema) = &payload.output_schema {
            body["response_format"] = json!({
                "type": "json_schema",
                "json_schema": { "name": "canonical_script", "schema": schema }
            });
        }
        body
    }

    fn reply(json: &Value) -> BackendReply {
        let text = json["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or_default()
            .to_string();
        let citations = json["citations"]
            .as_array()
            .map(|urls| {
                urls.iter()
                    .filter_map(Value::as_str)
                    .map(citation_source)
                    .collect()
            })
            .unwrap_or_default();
        BackendReply { text, citations }
    }
}

#[async_trait]
impl GenerationBackend for PreciseEngineClient {
    fn engine(&self) -> Engine {
        Engine::Precise
    }

    async fn generate(&self, payload: &RequestPayload) -> Result<BackendReply, DispatchError> {
        info!("[PRECISE] {:?} request with {}", payload.task, self.model);

        let endpoint = format!("{}/chat/completions", self.api_url.trim_end_matches('/'));
        let mut request = self.client.post(&endpoint).json(&self.request_body(payload));
        if !self.api_key.trim().is_empty() {
            request = request.bearer_auth(&self.api_key);
        }

        let resp = request.send().await.map_err(|e| {
            error!("[PRECISE] Connection failed: {}", e);
            DispatchError::backend(Engine::Precise, e.to_string())
        })?;

        if !resp.status().is_success() {
            return Err(DispatchError::backend(
                Engine::Precise,
                format!("API Error: {}", resp.status()),
            ));
        }

        let json: Value = resp
            .json()
            .await
            .map_err(|e| DispatchError::backend(Engine::Precise, e.to_string()))?;
        Ok(Self::reply(&json))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::prompt_builder::{build_fact_check_request, TaskKind};

    fn script_payload(engine: Engine) -> RequestPayload {
        RequestPayload {
            engine,
            task: TaskKind::StrictTransform,
            system_instruction: "SYSTEM".to_string(),
            prompt: "PROMPT".to_string(),
            output_schema: Some(json!({ "type": "object" })),
        }
    }

    #[test]
    fn test_fast_body_embeds_schema_in_system() {
        let client = FastEngineClient::new("http://localhost", "key", "fast-model");
        let body = client.request_body(&script_payload(Engine::Fast));
        assert_eq!(body["model"], "fast-model");
        assert!(body["system"].as_str().unwrap().starts_with("SYSTEM"));
        assert!(body["system"].as_str().unwrap().contains("\"type\":\"object\""));
        assert_eq!(body["messages"][0]["content"], "PROMPT");
    }

    #[test]
    fn test_precise_body_uses_structured_output_only_with_schema() {
        let client = PreciseEngineClient::new("http://localhost", "", "precise-model");
        let body = client.request_body(&script_payload(Engine::Precise));
        assert_eq!(body["response_format"]["type"], "json_schema");
        assert_eq!(body["messages"][0]["role"], "system");

        let body = client.request_body(&build_fact_check_request("text"));
        assert!(body.get("response_format").is_none());
    }

    #[test]
    fn test_reply_parsing() {
        let fast = json!({ "content": [ { "type": "text", "text": "{\"a\":" }, { "type": "text", "text": "1}" } ] });
        assert_eq!(FastEngineClient::reply_text(&fast), "{\"a\":1}");

        let precise = json!({
            "choices": [ { "message": { "content": "Accuracy 80%" } } ],
            "citations": ["https://www.britannica.com/topic/x", "not a url"]
        });
        let reply = PreciseEngineClient::reply(&precise);
        assert_eq!(reply.text, "Accuracy 80%");
        assert_eq!(reply.citations[0].name, "www.britannica.com");
        assert_eq!(reply.citations[1].name, "not a url");
    }
}
