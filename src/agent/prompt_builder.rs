// ScriptForge Prompt Builder
// Copyright (c) 2026 Xing_The_Creator | ScriptForge
//
// Turns a style's training profile and the request metadata into the payload
// a backend receives. Script payloads always carry the canonical output
// schema so the normalizer knows what shape to expect back.

use crate::agent::engine_router::Engine;
use crate::agent::training::{Example, StyleGuide, TrainingProfile};
use serde::Serialize;
use serde_json::{json, Value};

/// Hard rule shared by every strict transformation.
pub const NON_FABRICATION_CLAUSE: &str = "It is strictly forbidden to add any information, word, or sentence that is not present in the original SOURCE TEXT. You may only re-organize and re-phrase the existing content.";

pub const STYLE_PATTERN_CLAUSE: &str = "Infer only the structural and stylistic patterns shown in the BEFORE/AFTER examples (sentence length, paragraph delimiters such as '/' and '///', use of lists and on-screen graphic cues) and apply them precisely to the SOURCE TEXT.";

pub const JSON_ONLY_CLAUSE: &str = "The final output must be a single valid JSON object that strictly follows the provided schema. Do not include any text or markdown markers outside the JSON object.";

/// Extra line the fast engine gets; it is tuned for reformatting, not writing.
pub const FAST_ENGINE_PREAMBLE: &str = "You are running in fast transformation mode: restructure the given text, do not research or expand it.";

/// Everything the caller knows about the script being requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptRequest {
    pub title: String,
    pub duration_minutes: u32,
    pub language: String,
    pub source_text: String,
}

impl ScriptRequest {
    pub fn has_source_text(&self) -> bool {
        !self.source_text.trim().is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// Example-driven reformatting with the non-fabrication contract
    StrictTransform,
    /// Transformation guided by instructions, a corpus, or nothing at all
    StyledTransform,
    GenerateFromTitle,
    FactCheck,
    Ideas,
    Research,
}

/// The backend-bound request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestPayload {
    pub engine: Engine,
    pub task: TaskKind,
    pub system_instruction: String,
    pub prompt: String,
    /// Present for every script payload; free-text tasks leave it empty.
    pub output_schema: Option<Value>,
}

/// JSON schema of the canonical script.
pub fn script_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "title": { "type": "string", "description": "The title of the episode." },
            "style": { "type": "string", "description": "The name of the style for the script." },
            "duration": { "type": "string", "description": "The duration of the episode in minutes." },
            "content": { "type": "string", "description": "The full script in the requested language, including narrator dialogue and scene descriptions." },
            "scenes": {
                "type": "array",
                "description": "A breakdown of the episode into major scenes.",
                "items": {
                    "type": "object",
                    "properties": {
                        "time": { "type": "string", "description": "The time code for the scene (e.g., 00:00-05:30)." },
                        "description": { "type": "string", "description": "A brief description of the scene and its content." },
                        "visuals": { "type": "string", "description": "Suggestions for visual elements (archival footage, animations, etc.)." }
                    },
                    "required": ["time", "description", "visuals"]
                }
            },
            "sources": {
                "type": "array",
                "description": "Suggested sources that can be used for fact-checking.",
                "items": {
                    "type": "object",
                    "properties": {
                        "name": { "type": "string", "description": "The name of the source." },
                        "url": { "type": "string", "description": "The URL of the source." },
                        "reliability": { "type": "number", "description": "Optional reliability estimate from 0 to 100." }
                    },
                    "required": ["name", "url"]
                }
            }
        },
        "required": ["title", "style", "duration", "content", "scenes", "sources"]
    })
}

/// Build the script payload for `engine`. Never fails: degenerate profiles
/// fall through to the generic directive.
pub fn build_request(
    engine: Engine,
    style_name: &str,
    request: &ScriptRequest,
    profile: &TrainingProfile,
) -> RequestPayload {
    if !request.has_source_text() {
        return generate_from_title(engine, style_name, request, profile);
    }

    let examples = profile.complete_examples();
    if !examples.is_empty() {
        return strict_transform(engine, style_name, request, &examples);
    }

    styled_transform(engine, style_name, request, profile)
}

fn with_engine_preamble(engine: Engine, system: String) -> String {
    match engine {
        Engine::Fast => format!("{}\n{}", FAST_ENGINE_PREAMBLE, system),
        Engine::Precise => system,
    }
}

fn serialize_examples(examples: &[&Example]) -> String {
    examples
        .iter()
        .enumerate()
        .map(|(i, ex)| {
            format!(
                "--- EXAMPLE {} ---\n### BEFORE (Original Text):\n{}\n\n### AFTER (Transformed Text):\n{}",
                i + 1,
                ex.before,
                ex.after
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn strict_transform(
    engine: Engine,
    style_name: &str,
    request: &ScriptRequest,
    examples: &[&Example],
) -> RequestPayload {
    let system = format!(
        "You are an expert text formatter. Your SOLE task is to reformat and restructure the provided SOURCE TEXT. {} {} {}",
        NON_FABRICATION_CLAUSE, STYLE_PATTERN_CLAUSE, JSON_ONLY_CLAUSE
    );

    let prompt = format!(
        "**STYLE EXAMPLES:**\n{examples}\n\n---\n\n**INPUT DATA:**\n\n**SOURCE TEXT TO TRANSFORM:**\n\"\"\"\n{source}\n\"\"\"\n\n**METADATA:**\n- title: \"{title}\"\n- duration: \"{duration} minutes\"\n- language: \"{language}\"\n- style: \"{style}\"\n\n---\n\n**TASK:**\nBased on the STYLE EXAMPLES, transform the SOURCE TEXT. Return a single JSON object containing the transformed text in \"content\" and all METADATA, strictly adhering to the schema.",
        examples = serialize_examples(examples),
        source = request.source_text,
        title = request.title,
        duration = request.duration_minutes,
        language = request.language,
        style = style_name,
    );

    RequestPayload {
        engine,
        task: TaskKind::StrictTransform,
        system_instruction: with_engine_preamble(engine, system),
        prompt,
        output_schema: Some(script_schema()),
    }
}

/// Style guidance for the non-strict paths. Empty when the profile teaches
/// nothing usable.
fn style_directive(profile: &TrainingProfile) -> String {
    match profile.guide() {
        StyleGuide::Instructions(instructions) if !instructions.trim().is_empty() => {
            format!("Follow these specific style guidelines: \"{}\"", instructions)
        }
        StyleGuide::Bulk(corpus) if !corpus.trim().is_empty() => format!(
            "Analyze the following collection of texts to understand the writing style, tone, and structure. Apply this learned style to the new script you generate. Texts: \"\"\"{}\"\"\"",
            corpus
        ),
        StyleGuide::Examples(_) => {
            "The user has provided examples of a style. Your generation should try to match it."
                .to_string()
        }
        _ => String::new(),
    }
}

fn scriptwriter_system(profile: &TrainingProfile) -> String {
    let base = "You are a professional scriptwriter. Your task is to produce a complete script based on the user's request.";
    let directive = style_directive(profile);
    if directive.is_empty() {
        base.to_string()
    } else {
        format!("{} {}", base, directive)
    }
}

fn styled_transform(
    engine: Engine,
    style_name: &str,
    request: &ScriptRequest,
    profile: &TrainingProfile,
) -> RequestPayload {
    let system = scriptwriter_system(profile);

    let prompt = format!(
        "Your primary task is to TRANSFORM the following source text into a compelling documentary script.\n\nStyle: \"{style}\"\nEpisode Title: \"{title}\"\nTarget Duration: {duration} minutes\nLanguage: {language}\n\nSource Text to Transform:\n\"\"\"\n{source}\n\"\"\"\n\nInstructions:\n1. Do NOT just summarize the text. Adapt it into a full script format.\n2. Adhere STRICTLY to the system instructions which define the style.\n3. {json_only}",
        style = style_name,
        title = request.title,
        duration = request.duration_minutes,
        language = request.language,
        source = request.source_text,
        json_only = JSON_ONLY_CLAUSE,
    );

    RequestPayload {
        engine,
        task: TaskKind::StyledTransform,
        system_instruction: with_engine_preamble(engine, system),
        prompt,
        output_schema: Some(script_schema()),
    }
}

/// Metadata plus the style directive. Source text and examples stay out.
fn generate_from_title(
    engine: Engine,
    style_name: &str,
    request: &ScriptRequest,
    profile: &TrainingProfile,
) -> RequestPayload {
    let prompt = format!(
        "Generate a script for the style \"{}\", titled \"{}\". The episode duration should be {} minutes. The script must be in {}. {}",
        style_name, request.title, request.duration_minutes, request.language, JSON_ONLY_CLAUSE
    );

    RequestPayload {
        engine,
        task: TaskKind::GenerateFromTitle,
        system_instruction: scriptwriter_system(profile),
        prompt,
        output_schema: Some(script_schema()),
    }
}

pub fn build_fact_check_request(script_content: &str) -> RequestPayload {
    RequestPayload {
        engine: Engine::Precise,
        task: TaskKind::FactCheck,
        system_instruction: "You are a meticulous fact-checker for documentary scripts.".to_string(),
        prompt: format!(
            "Please fact-check the following script content. Assess the overall accuracy as a percentage and provide a detailed summary of any inaccurate or questionable information with suggested corrections. Script: \"\"\"{}\"\"\"",
            script_content
        ),
        output_schema: None,
    }
}

pub fn build_ideas_request(style_name: &str) -> RequestPayload {
    RequestPayload {
        engine: Engine::Precise,
        task: TaskKind::Ideas,
        system_instruction: "You are a creative producer for documentary series.".to_string(),
        prompt: format!(
            "Suggest 5 new and creative episode ideas for the creative style titled \"{}\". Provide the ideas as a simple list, one per line.",
            style_name
        ),
        output_schema: None,
    }
}

pub fn build_research_request(topic: &str) -> RequestPayload {
    RequestPayload {
        engine: Engine::Precise,
        task: TaskKind::Research,
        system_instruction: "You are a research assistant preparing background material for a documentary.".to_string(),
        prompt: format!(
            "Conduct in-depth research on the topic: \"{}\". Provide a detailed report including key facts, historical context, important figures, and the latest developments. Cite the sources you rely on.",
            topic
        ),
        output_schema: None,
    }
}
