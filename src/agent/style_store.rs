// ScriptForge Style Store
// Copyright (c) 2026 Xing_The_Creator | ScriptForge
//
// Owns the user's styles and writes every change through a persistence
// port, so the dispatcher never touches storage directly.

use crate::agent::error::{DispatchError, DispatchResult};
use crate::agent::training::TrainingProfile;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Style {
    pub id: String,
    pub name: String,
    pub icon: String,
    pub script_count: u32,
    #[serde(rename = "trainingData")]
    pub training: TrainingProfile,
}

impl Style {
    pub fn new(name: &str, icon: &str) -> Self {
        Self {
            id: slugify(name),
            name: name.trim().to_string(),
            icon: icon.to_string(),
            script_count: 0,
            training: TrainingProfile::default(),
        }
    }
}

/// Lower-cased name with every whitespace run collapsed to a single `-`.
pub fn slugify(name: &str) -> String {
    name.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

/// Styles offered before the user has saved anything.
pub fn default_styles() -> Vec<Style> {
    vec![
        Style::new("Historical Documentary", "📜"),
        Style::new("Investigative Report", "🔎"),
        Style::new("Nature Series", "🌿"),
    ]
}

/// Save/load port for the style list.
pub trait StylePersistence: Send + Sync {
    /// `Ok(None)` when nothing has been stored yet.
    fn load(&self) -> DispatchResult<Option<Vec<Style>>>;
    fn save(&self, styles: &[Style]) -> DispatchResult<()>;
}

/// Pretty-printed JSON file on disk.
pub struct JsonFileStyles {
    path: PathBuf,
}

impl JsonFileStyles {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StylePersistence for JsonFileStyles {
    fn load(&self) -> DispatchResult<Option<Vec<Style>>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let data = fs::read_to_string(&self.path)?;
        let styles = serde_json::from_str(&data)
            .map_err(|e| DispatchError::Persistence(format!("{:?}: {}", self.path, e)))?;
        Ok(Some(styles))
    }

    fn save(&self, styles: &[Style]) -> DispatchResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let data = serde_json::to_string_pretty(styles)
            .map_err(|e| DispatchError::Persistence(e.to_string()))?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}

/// In-process storage, handy for tests and one-shot runs.
#[derive(Default)]
pub struct MemoryStyles {
    saved: Mutex<Option<Vec<Style>>>,
}

impl MemoryStyles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_styles(styles: Vec<Style>) -> Self {
        Self {
            saved: Mutex::new(Some(styles)),
        }
    }

    pub fn snapshot(&self) -> Option<Vec<Style>> {
        self.saved.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl StylePersistence for MemoryStyles {
    fn load(&self) -> DispatchResult<Option<Vec<Style>>> {
        Ok(self.snapshot())
    }

    fn save(&self, styles: &[Style]) -> DispatchResult<()> {
        *self.saved.lock().unwrap_or_else(|e| e.into_inner()) = Some(styles.to_vec());
        Ok(())
    }
}

pub struct StyleStore {
    styles: Vec<Style>,
    persistence: Box<dyn StylePersistence>,
}

impl StyleStore {
    /// Load stored styles, or start from the defaults when storage is empty
    /// or unreadable.
    pub fn open(persistence: Box<dyn StylePersistence>) -> Self {
        let styles = match persistence.load() {
            Ok(Some(styles)) if !styles.is_empty() => {
                info!("[STORE] Loaded {} styles", styles.len());
                styles
            }
            Ok(_) => {
                info!("[STORE] No saved styles. Starting from defaults.");
                default_styles()
            }
            Err(e) => {
                warn!("[STORE] Failed to load styles ({}). Starting from defaults.", e);
                default_styles()
            }
        };

        Self {
            styles,
            persistence,
        }
    }

    pub fn styles(&self) -> &[Style] {
        &self.styles
    }

    pub fn get(&self, id: &str) -> Option<&Style> {
        self.styles.iter().find(|s| s.id == id)
    }

    fn get_mut(&mut self, id: &str) -> DispatchResult<&mut Style> {
        self.styles
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| DispatchError::StyleNotFound(id.to_string()))
    }

    fn persist(&self) -> DispatchResult<()> {
        self.persistence.save(&self.styles)
    }

    pub fn add_style(&mut self, name: &str, icon: &str) -> DispatchResult<Style> {
        if name.trim().is_empty() {
            return Err(DispatchError::InvalidStyleName);
        }
        let style = Style::new(name, icon);
        if self.get(&style.id).is_some() {
            return Err(DispatchError::DuplicateStyle(style.id));
        }

        info!("[STORE] Added style '{}' ({})", style.name, style.id);
        self.styles.push(style.clone());
        self.persist()?;
        Ok(style)
    }

    pub fn update_training(&mut self, id: &str, profile: TrainingProfile) -> DispatchResult<()> {
        let style = self.get_mut(id)?;
        info!(
            "[STORE] Training for '{}' set to method '{}'",
            id,
            profile.active_method().as_str()
        );
        style.training = profile;
        self.persist()
    }

    /// Append an edited script as a before/after example. The style switches
    /// to example-based training.
    pub fn add_training_example(&mut self, id: &str, before: &str, after: &str) -> DispatchResult<()> {
        let style = self.get_mut(id)?;
        let profile = std::mem::take(&mut style.training);
        style.training = profile.with_added_example(before, after);
        info!("[STORE] Example added to '{}'", id);
        self.persist()
    }

    pub fn record_script(&mut self, id: &str) -> DispatchResult<()> {
        let style = self.get_mut(id)?;
        style.script_count += 1;
        self.persist()
    }
}
