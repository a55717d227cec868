use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use scriptforge_core::agent::backends::{BackendReply, GenerationBackend};
use scriptforge_core::agent::connectivity::{ApiKeys, ConnectivityRegistry};
use scriptforge_core::agent::core::ScriptCore;
use scriptforge_core::agent::engine_router::Engine;
use scriptforge_core::agent::error::DispatchError;
use scriptforge_core::agent::normalizer::Source;
use scriptforge_core::agent::prompt_builder::{
    RequestPayload, ScriptRequest, TaskKind, FAST_ENGINE_PREAMBLE, NON_FABRICATION_CLAUSE,
};
use scriptforge_core::agent::style_store::Style;
use scriptforge_core::agent::training::TrainingProfile;

/// Replays a fixed reply and remembers every payload it was handed.
struct ScriptedBackend {
    engine: Engine,
    reply: BackendReply,
    calls: Mutex<Vec<RequestPayload>>,
}

impl ScriptedBackend {
    fn new(engine: Engine, reply: BackendReply) -> Arc<Self> {
        Arc::new(Self {
            engine,
            reply,
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<RequestPayload> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationBackend for ScriptedBackend {
    fn engine(&self) -> Engine {
        self.engine
    }

    async fn generate(&self, payload: &RequestPayload) -> Result<BackendReply, DispatchError> {
        self.calls.lock().unwrap().push(payload.clone());
        Ok(self.reply.clone())
    }
}

const SCRIPT_JSON: &str = r#"{
    "title": "أسرار الأهرامات",
    "style": "وثائقي",
    "duration": "22 minutes",
    "content": "بُنيت الأهرامات / قبل آلاف السنين.",
    "scenes": [
        {"time": "00:00", "description": "افتتاح", "visuals": "لقطة جوية للأهرامات"}
    ],
    "sources": []
}"#;

fn example_style() -> Style {
    let mut style = Style::new("وثائقي", "📜");
    style.training = TrainingProfile::default().with_added_example("نص طويل.", "نص / قصير.");
    style
}

fn arabic_request(source_text: &str) -> ScriptRequest {
    ScriptRequest {
        title: "أسرار الأهرامات".to_string(),
        duration_minutes: 22,
        language: "ar".to_string(),
        source_text: source_text.to_string(),
    }
}

fn core_with(
    fast_key: &str,
    fast_reply: &str,
    precise_reply: BackendReply,
) -> (ScriptCore, Arc<ScriptedBackend>, Arc<ScriptedBackend>) {
    let fast = ScriptedBackend::new(Engine::Fast, BackendReply::text(fast_reply));
    let precise = ScriptedBackend::new(Engine::Precise, precise_reply);
    let connectivity = Arc::new(ConnectivityRegistry::default());
    connectivity.probe_all(&ApiKeys {
        fast_api_key: fast_key.to_string(),
        precise_api_key: String::new(),
    });
    let core = ScriptCore::new(fast.clone(), precise.clone(), connectivity);
    (core, fast, precise)
}

#[tokio::test]
async fn test_trained_style_uses_fast_engine_when_connected() {
    let (core, fast, precise) = core_with("sk-fast-0123456789", SCRIPT_JSON, BackendReply::default());

    let outcome = core
        .transform(&example_style(), &arabic_request("بُنيت الأهرامات قبل آلاف السنين."))
        .await
        .unwrap();

    assert_eq!(outcome.engine, Engine::Fast);
    assert_eq!(outcome.task, TaskKind::StrictTransform);
    assert_eq!(outcome.script.scenes.len(), 1);
    assert!(precise.calls().is_empty());

    let calls = fast.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].prompt.contains("--- EXAMPLE 1 ---"));
    assert!(calls[0].prompt.contains("نص / قصير."));
    assert!(calls[0].system_instruction.contains(NON_FABRICATION_CLAUSE));
    assert!(calls[0].system_instruction.starts_with(FAST_ENGINE_PREAMBLE));
}

#[tokio::test]
async fn test_disconnected_fast_engine_falls_back_to_precise() {
    let (core, fast, precise) = core_with("short", "", BackendReply::text(SCRIPT_JSON));

    let outcome = core
        .transform(&example_style(), &arabic_request("بُنيت الأهرامات قبل آلاف السنين."))
        .await
        .unwrap();

    assert_eq!(outcome.engine, Engine::Precise);
    assert!(fast.calls().is_empty());

    let calls = precise.calls();
    assert_eq!(calls.len(), 1);
    assert!(!calls[0].system_instruction.contains(FAST_ENGINE_PREAMBLE));
    assert!(calls[0].system_instruction.contains(NON_FABRICATION_CLAUSE));
    assert!(calls[0].output_schema.is_some());
}

#[tokio::test]
async fn test_untrained_style_goes_to_precise() {
    let (core, fast, _precise) = core_with("sk-fast-0123456789", "", BackendReply::text(SCRIPT_JSON));
    let style = Style::new("Blank", "🎬");

    let outcome = core
        .transform(&style, &arabic_request("some source text"))
        .await
        .unwrap();

    assert_eq!(outcome.engine, Engine::Precise);
    assert_eq!(outcome.task, TaskKind::StyledTransform);
    assert!(fast.calls().is_empty());
}

#[tokio::test]
async fn test_generate_from_title_ignores_source_text() {
    let (core, fast, precise) = core_with("sk-fast-0123456789", "", BackendReply::text(SCRIPT_JSON));

    let outcome = core
        .generate_from_title(&example_style(), &arabic_request("ignored source"))
        .await
        .unwrap();

    assert_eq!(outcome.engine, Engine::Precise);
    assert_eq!(outcome.task, TaskKind::GenerateFromTitle);
    assert!(fast.calls().is_empty());
    assert!(!precise.calls()[0].prompt.contains("ignored source"));
}

#[tokio::test]
async fn test_malformed_reply_is_reported() {
    let (core, _fast, _precise) = core_with("", "", BackendReply::text("Sorry, I cannot help with that."));

    let err = core
        .transform(&example_style(), &arabic_request("نص المصدر"))
        .await
        .unwrap_err();

    assert!(matches!(err, DispatchError::MalformedResponse(_)));
    assert_eq!(core.get_status(), "⚠️ Last request failed");
}

#[tokio::test]
async fn test_fact_check_reads_first_percentage() {
    let (core, _fast, precise) = core_with("", "", BackendReply::text("النتيجة 72% دقيقة، مع تحفظ على 10% من الادعاءات."));

    let result = core.fact_check("نص السكربت").await.unwrap();

    assert_eq!(result.accuracy, 72);
    assert_eq!(precise.calls()[0].task, TaskKind::FactCheck);
}

#[tokio::test]
async fn test_fact_check_defaults_without_percentage() {
    let (core, _fast, _precise) = core_with("", "", BackendReply::text("Mostly accurate."));

    let result = core.fact_check("script").await.unwrap();

    assert_eq!(result.accuracy, 85);
    assert_eq!(result.details, "Mostly accurate.");
}

#[tokio::test]
async fn test_ideas_are_split_per_line() {
    let (core, _fast, _precise) = core_with("", "", BackendReply::text("\nFirst idea\n\n  Second idea  \n"));

    let ideas = core.generate_ideas("Nature Series").await.unwrap();

    assert_eq!(ideas, vec!["First idea".to_string(), "Second idea".to_string()]);
}

#[tokio::test]
async fn test_research_keeps_citations() {
    let reply = BackendReply {
        text: "Findings".to_string(),
        citations: vec![Source {
            name: "example.org".to_string(),
            url: "https://example.org/a".to_string(),
            reliability: None,
        }],
    };
    let (core, _fast, _precise) = core_with("", "", reply);

    let report = core.deep_research("Pyramids").await.unwrap();

    assert_eq!(report.sources.len(), 1);
    assert!(report.to_markdown().contains("[example.org](https://example.org/a)"));
}
