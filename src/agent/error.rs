// ScriptForge Dispatch Errors
// Copyright (c) 2026 Xing_The_Creator | ScriptForge

use crate::agent::engine_router::Engine;
use thiserror::Error;

/// Result type alias for dispatcher operations
pub type DispatchResult<T> = Result<T, DispatchError>;

/// Errors that can surface from the dispatch core and its ports
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Malformed backend response: {0}")]
    MalformedResponse(String),

    #[error("{engine} engine request failed: {message}")]
    Backend { engine: Engine, message: String },

    #[error("Style not found: {0}")]
    StyleNotFound(String),

    #[error("A style with id '{0}' already exists")]
    DuplicateStyle(String),

    #[error("Style name must not be empty")]
    InvalidStyleName,

    #[error("Persistence error: {0}")]
    Persistence(String),
}

impl DispatchError {
    pub fn backend(engine: Engine, message: impl Into<String>) -> Self {
        DispatchError::Backend {
            engine,
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for DispatchError {
    fn from(err: std::io::Error) -> Self {
        DispatchError::Persistence(err.to_string())
    }
}
