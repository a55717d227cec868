// ScriptForge Fact-Check Scoring
// Copyright (c) 2026 Xing_The_Creator | ScriptForge

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Score reported when the prose carries no percentage at all.
pub const DEFAULT_ACCURACY: u32 = 85;

// ASCII digits only; Unicode digit classes would pull in Arabic-Indic numerals.
static PERCENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"([0-9]+)%").expect("valid regex"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactCheckResult {
    pub accuracy: u32,
    pub details: String,
}

/// First `<digits>%` anywhere in the text, or [`DEFAULT_ACCURACY`].
///
/// The value is not clamped. A digit run too long for `u32` saturates.
pub fn extract_accuracy(text: &str) -> u32 {
    match PERCENT_RE.captures(text).and_then(|caps| caps.get(1)) {
        Some(digits) => digits.as_str().parse().unwrap_or(u32::MAX),
        None => DEFAULT_ACCURACY,
    }
}

pub fn fact_check_result(text: &str) -> FactCheckResult {
    FactCheckResult {
        accuracy: extract_accuracy(text),
        details: text.to_string(),
    }
}

/// One idea per non-blank line, trimmed.
pub fn split_ideas(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
