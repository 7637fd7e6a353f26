//! Configuration management for scandeval-openai
//!
//! Settings are layered:
//! 1. Built-in defaults
//! 2. Global settings file (`<config_dir>/scandeval/openai.json`)
//! 3. `.env` file and `OPENAI_*` environment variables
//! 4. CLI parameters (highest priority)

pub mod benchmark;
pub mod models;
pub mod settings;

use std::path::PathBuf;

pub use self::{
    benchmark::{BenchmarkConfig, DatasetConfig},
    models::{BackendKind, ModelConfig, ReferenceConfig, INVALID_TOKEN_ID},
    settings::{RetrySettings, Settings, DEFAULT_BASE_URL},
};

/// Get the configuration directory path
#[must_use]
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("scandeval")
}

/// Get the global settings file path
#[must_use]
pub fn settings_path() -> PathBuf {
    config_dir().join("openai.json")
}
