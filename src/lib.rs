// ScriptForge Library Root
// Copyright (c) 2026 Xing_The_Creator | ScriptForge

pub mod agent;
pub mod config;
pub mod server;
pub mod state;
