// ScriptForge Result Normalizer
// Copyright (c) 2026 Xing_The_Creator | ScriptForge
//
// Reshapes whatever a backend returned into the canonical script. Only
// structure is checked here; the content itself is taken as given.

use crate::agent::error::DispatchError;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub time: String,
    pub description: String,
    pub visuals: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub name: String,
    pub url: String,
    /// 0-100 when the backend provides an estimate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reliability: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalScript {
    pub title: String,
    pub style: String,
    pub duration: String,
    pub content: String,
    pub scenes: Vec<Scene>,
    pub sources: Vec<Source>,
}

/// Chat backends like to wrap JSON in a Markdown fence. Peel one off.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    if !trimmed.starts_with("```") {
        return trimmed;
    }
    trimmed
        .trim_start_matches("```json")
        .trim_start_matches("```JSON")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

/// Parse a raw backend reply into a [`CanonicalScript`].
///
/// All-or-nothing: any missing, null or mistyped required field fails the
/// whole reply with [`DispatchError::MalformedResponse`].
pub fn normalize(raw: &str) -> Result<CanonicalScript, DispatchError> {
    let body = strip_code_fence(raw);
    if body.is_empty() {
        warn!("[NORMALIZER] Backend returned an empty body");
        return Err(DispatchError::MalformedResponse(
            "empty response body".to_string(),
        ));
    }

    match serde_json::from_str::<CanonicalScript>(body) {
        Ok(script) => {
            debug!(
                "[NORMALIZER] Script '{}' accepted ({} scenes, {} sources)",
                script.title,
                script.scenes.len(),
                script.sources.len()
            );
            Ok(script)
        }
        Err(e) => {
            warn!("[NORMALIZER] Rejected backend payload: {}", e);
            Err(DispatchError::MalformedResponse(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn well_formed() -> serde_json::Value {
        json!({
            "title": "الحلقة الأولى",
            "style": "وثائقي",
            "duration": "22",
            "content": "نص / قصير.",
            "scenes": [
                { "time": "00:00-01:00", "description": "مقدمة", "visuals": "لقطات أرشيفية" },
                { "time": "01:00-05:00", "description": "عرض", "visuals": "رسوم بيانية" }
            ],
            "sources": [
                { "name": "Archive", "url": "https://example.org", "reliability": 90 },
                { "name": "User text", "url": "#" }
            ]
        })
    }

    #[test]
    fn test_accepts_and_preserves_order() {
        let script = normalize(&well_formed().to_string()).unwrap();
        assert_eq!(script.scenes[0].time, "00:00-01:00");
        assert_eq!(script.scenes[1].time, "01:00-05:00");
        assert_eq!(script.sources[0].reliability, Some(90.0));
        assert_eq!(script.sources[1].reliability, None);
    }

    #[test]
    fn test_idempotent_on_well_formed_input() {
        let first = normalize(&well_formed().to_string()).unwrap();
        let again = normalize(&serde_json::to_string(&first).unwrap()).unwrap();
        assert_eq!(first, again);
    }

    #[test]
    fn test_strips_markdown_fence() {
        let fenced = format!("```json\n{}\n```", well_formed());
        assert!(normalize(&fenced).is_ok());
    }

    #[test]
    fn test_rejects_non_json() {
        let err = normalize("Sorry, I cannot help with that.").unwrap_err();
        assert!(matches!(err, DispatchError::MalformedResponse(_)));
        assert!(matches!(normalize(""), Err(DispatchError::MalformedResponse(_))));
    }

    #[test]
    fn test_rejects_missing_scenes() {
        let mut value = well_formed();
        value.as_object_mut().unwrap().remove("scenes");
        assert!(matches!(
            normalize(&value.to_string()),
            Err(DispatchError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_rejects_scene_without_time() {
        let mut value = well_formed();
        value["scenes"][1].as_object_mut().unwrap().remove("time");
        assert!(matches!(
            normalize(&value.to_string()),
            Err(DispatchError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_rejects_null_and_wrong_shapes() {
        let mut null_title = well_formed();
        null_title["title"] = json!(null);
        assert!(normalize(&null_title.to_string()).is_err());

        let mut scenes_object = well_formed();
        scenes_object["scenes"] = json!({ "time": "00:00" });
        assert!(normalize(&scenes_object.to_string()).is_err());

        let mut source_without_url = well_formed();
        source_without_url["sources"][0].as_object_mut().unwrap().remove("url");
        assert!(normalize(&source_without_url.to_string()).is_err());
    }

    #[test]
    fn test_null_reliability_is_absent() {
        let mut value = well_formed();
        value["sources"][0]["reliability"] = json!(null);
        let script = normalize(&value.to_string()).unwrap();
        assert_eq!(script.sources[0].reliability, None);
    }
}
