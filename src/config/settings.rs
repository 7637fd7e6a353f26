//! API client settings (stored in `<config_dir>/scandeval/openai.json`)

use std::{
    collections::HashMap,
    fs,
    path::Path,
    time::Duration,
};

use serde::{Deserialize, Serialize};

use super::BackendKind;
use crate::error::{BenchError, Result};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Settings for talking to the OpenAI API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// API key; `OPENAI_API_KEY` wins over the file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// API endpoint
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Organization header
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Backoff for rate limits and server errors
    #[serde(default)]
    pub retry: RetrySettings,

    /// Explicit backend per model ID, consulted before the built-in table
    #[serde(default)]
    pub backends: HashMap<String, BackendKind>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            organization: None,
            timeout_secs: default_timeout_secs(),
            retry: RetrySettings::default(),
            backends: HashMap::new(),
        }
    }
}

/// Retry budget for transient API failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Retries after the first attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay before the first retry
    #[serde(default = "default_base_delay_secs")]
    pub base_delay_secs: u64,

    /// Upper bound on any single delay
    #[serde(default = "default_max_delay_secs")]
    pub max_delay_secs: u64,
}

fn default_max_retries() -> u32 {
    8
}

fn default_base_delay_secs() -> u64 {
    10
}

fn default_max_delay_secs() -> u64 {
    60
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_secs: default_base_delay_secs(),
            max_delay_secs: default_max_delay_secs(),
        }
    }
}

impl Settings {
    /// Load settings from the global file, then apply the environment
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed
    pub fn load() -> Result<Self> {
        let path = super::settings_path();
        let mut settings = Self::load_from_path(&path)?;
        settings.apply_env();
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a specific path, falling back to defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).map_err(|e| BenchError::ConfigParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let settings: Self =
            serde_json::from_str(&contents).map_err(|e| BenchError::ConfigParse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Override file values with `OPENAI_*` environment variables
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    /// Same as [`Settings::apply_env`] with a custom variable lookup
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(key) = non_empty("OPENAI_API_KEY") {
            self.api_key = Some(key);
        }
        if let Some(url) = non_empty("OPENAI_BASE_URL").or_else(|| non_empty("OPENAI_API_BASE")) {
            self.base_url = url;
        }
        if let Some(org) = non_empty("OPENAI_ORGANIZATION") {
            self.organization = Some(org);
        }
    }

    /// Check invariants the client relies on
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid field
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(BenchError::ConfigValidation("base_url is empty".into()));
        }
        if self.timeout_secs == 0 {
            return Err(BenchError::ConfigValidation(
                "timeout_secs must be positive".into(),
            ));
        }
        if self.retry.max_delay_secs < self.retry.base_delay_secs {
            return Err(BenchError::ConfigValidation(
                "retry.max_delay_secs must not be below retry.base_delay_secs".into(),
            ));
        }
        Ok(())
    }

    /// The API key, or an error naming the provider
    ///
    /// # Errors
    ///
    /// Returns [`BenchError::MissingApiKey`] when no key is configured
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| BenchError::MissingApiKey {
                provider: "openai".to_string(),
            })
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Backend explicitly configured for this model, if any
    #[must_use]
    pub fn backend_override(&self, model_id: &str) -> Option<BackendKind> {
        self.backends.get(model_id).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_settings_default() {
        let settings = Settings::default();
        assert_eq!(settings.base_url, DEFAULT_BASE_URL);
        assert_eq!(settings.retry.base_delay_secs, 10);
        assert!(settings.api_key.is_none());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let loaded = Settings::load_from_path(&temp_dir.path().join("nope.json")).unwrap();
        assert_eq!(loaded, Settings::default());
    }

    #[test]
    fn test_load_written_settings() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("scandeval").join("openai.json");

        let mut settings = Settings::default();
        settings.api_key = Some("sk-test".into());
        settings.retry.max_retries = 2;
        settings
            .backends
            .insert("my-finetune".into(), BackendKind::Chat);

        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, serde_json::to_string_pretty(&settings).unwrap()).unwrap();

        let loaded = Settings::load_from_path(&path).unwrap();
        assert_eq!(loaded, settings);
        assert_eq!(loaded.backend_override("my-finetune"), Some(BackendKind::Chat));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("openai.json");
        fs::write(&path, r#"{"retry": {"max_retries": 1}}"#).unwrap();

        let loaded = Settings::load_from_path(&path).unwrap();
        assert_eq!(loaded.retry.max_retries, 1);
        assert_eq!(loaded.retry.base_delay_secs, 10);
        assert_eq!(loaded.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("openai.json");
        fs::write(&path, "{ not json").unwrap();

        let err = Settings::load_from_path(&path).unwrap_err();
        assert!(matches!(err, BenchError::ConfigParse { .. }));
    }

    #[test]
    fn test_env_overrides_file() {
        let mut settings = Settings {
            api_key: Some("from-file".into()),
            ..Default::default()
        };
        settings.apply_env_with(|key| match key {
            "OPENAI_API_KEY" => Some("from-env".into()),
            "OPENAI_API_BASE" => Some("http://localhost:8080/v1".into()),
            "OPENAI_ORGANIZATION" => Some("   ".into()),
            _ => None,
        });
        assert_eq!(settings.api_key.as_deref(), Some("from-env"));
        assert_eq!(settings.base_url, "http://localhost:8080/v1");
        assert!(settings.organization.is_none());
    }

    #[test]
    fn test_validation() {
        let mut settings = Settings::default();
        settings.retry.max_delay_secs = 1;
        assert!(matches!(
            settings.validate(),
            Err(BenchError::ConfigValidation(_))
        ));

        let settings = Settings::default();
        assert!(matches!(
            settings.require_api_key(),
            Err(BenchError::MissingApiKey { .. })
        ));
    }
}
