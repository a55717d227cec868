// ScriptForge Agent Modules
// Copyright (c) 2026 Xing_The_Creator | ScriptForge

pub mod backends;
pub mod connectivity;
pub mod engine_router;
pub mod error;
pub mod fact_check;
pub mod normalizer;
pub mod prompt_builder;
pub mod style_store;
pub mod training;

pub mod core; // Exposed Core Logic
