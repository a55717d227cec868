// ScriptForge Training Profiles
// Copyright (c) 2026 Xing_The_Creator | ScriptForge
//
// A style's voice is taught one of four ways. The profile keeps whatever the
// user saved; the active method picks which part of it guides generation.

use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrainingMethod {
    Instructions,
    Example,
    Bulk,
    Policy,
}

impl TrainingMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrainingMethod::Instructions => "instructions",
            TrainingMethod::Example => "example",
            TrainingMethod::Bulk => "bulk",
            TrainingMethod::Policy => "policy",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "instructions" => Some(TrainingMethod::Instructions),
            "example" => Some(TrainingMethod::Example),
            "bulk" => Some(TrainingMethod::Bulk),
            "policy" => Some(TrainingMethod::Policy),
            _ => None,
        }
    }
}

/// A worked before/after pair showing the target style.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Example {
    pub id: u64,
    pub before: String,
    pub after: String,
}

impl Example {
    /// Both sides carry text once trimmed.
    pub fn is_complete(&self) -> bool {
        !self.before.trim().is_empty() && !self.after.trim().is_empty()
    }
}

/// Everything a style has been taught. Text saved under one method survives a
/// switch to another; only [`TrainingProfile::guide`] decides what the prompt
/// builder sees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "TrainingRecord", into = "TrainingRecord")]
pub struct TrainingProfile {
    pub method: TrainingMethod,
    /// Style guidelines, or the pasted corpus for `bulk`.
    pub instructions: String,
    pub examples: Vec<Example>,
    pub policy_url: String,
    pub policy_text: String,
}

/// The payload authoritative for the active method, borrowed from a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleGuide<'a> {
    Instructions(&'a str),
    Examples(&'a [Example]),
    Bulk(&'a str),
    Policy { url: &'a str, text: &'a str },
}

impl Default for TrainingProfile {
    fn default() -> Self {
        Self::with_method(TrainingMethod::Instructions)
    }
}

impl TrainingProfile {
    fn with_method(method: TrainingMethod) -> Self {
        Self {
            method,
            instructions: String::new(),
            examples: Vec::new(),
            policy_url: String::new(),
            policy_text: String::new(),
        }
    }

    pub fn instructions(text: impl Into<String>) -> Self {
        Self {
            instructions: text.into(),
            ..Self::with_method(TrainingMethod::Instructions)
        }
    }

    pub fn bulk(corpus: impl Into<String>) -> Self {
        Self {
            instructions: corpus.into(),
            ..Self::with_method(TrainingMethod::Bulk)
        }
    }

    pub fn examples(examples: Vec<Example>) -> Self {
        Self {
            examples,
            ..Self::with_method(TrainingMethod::Example)
        }
    }

    pub fn policy(url: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            policy_url: url.into(),
            policy_text: text.into(),
            ..Self::with_method(TrainingMethod::Policy)
        }
    }

    pub fn active_method(&self) -> TrainingMethod {
        self.method
    }

    pub fn guide(&self) -> StyleGuide<'_> {
        match self.method {
            TrainingMethod::Instructions => StyleGuide::Instructions(&self.instructions),
            TrainingMethod::Example => StyleGuide::Examples(&self.examples),
            TrainingMethod::Bulk => StyleGuide::Bulk(&self.instructions),
            TrainingMethod::Policy => StyleGuide::Policy {
                url: &self.policy_url,
                text: &self.policy_text,
            },
        }
    }

    /// Whether the style has an established voice: non-blank instruction
    /// text or at least one complete example, whichever method is active.
    pub fn is_trained(&self) -> bool {
        !self.instructions.trim().is_empty() || self.examples.iter().any(Example::is_complete)
    }

    /// Complete examples in their original order, when `example` is the
    /// active method. Empty otherwise.
    pub fn complete_examples(&self) -> Vec<&Example> {
        match self.guide() {
            StyleGuide::Examples(examples) => examples.iter().filter(|ex| ex.is_complete()).collect(),
            _ => Vec::new(),
        }
    }

    /// Appends a before/after pair and makes `example` the active method.
    /// Existing examples and instruction text are kept.
    pub fn with_added_example(mut self, before: &str, after: &str) -> Self {
        let id = self.examples.iter().map(|ex| ex.id).max().map_or(1, |max| max + 1);
        self.examples.push(Example {
            id,
            before: before.to_string(),
            after: after.to_string(),
        });
        self.method = TrainingMethod::Example;
        self
    }
}

/// Flat wire shape with the method as free text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct TrainingRecord {
    method: String,
    instructions: String,
    examples: Vec<Example>,
    policy_url: String,
    policy_text: String,
}

impl From<TrainingRecord> for TrainingProfile {
    fn from(record: TrainingRecord) -> Self {
        match TrainingMethod::parse(&record.method) {
            Some(method) => TrainingProfile {
                method,
                instructions: record.instructions,
                examples: record.examples,
                policy_url: record.policy_url,
                policy_text: record.policy_text,
            },
            None => {
                warn!(
                    "[TRAINING] Unknown training method '{}'. Treating profile as untrained.",
                    record.method
                );
                TrainingProfile::policy(record.policy_url, record.policy_text)
            }
        }
    }
}

impl From<TrainingProfile> for TrainingRecord {
    fn from(profile: TrainingProfile) -> Self {
        TrainingRecord {
            method: profile.method.as_str().to_string(),
            instructions: profile.instructions,
            examples: profile.examples,
            policy_url: profile.policy_url,
            policy_text: profile.policy_text,
        }
    }
}
