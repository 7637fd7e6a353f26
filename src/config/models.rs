//! Model configuration and backend capabilities

use serde::{Deserialize, Serialize};

/// Sentinel used when a special token has no ID
pub const INVALID_TOKEN_ID: i64 = -1;

/// Which OpenAI endpoint a model must be called through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// `/completions`: raw prompt in, continuation out
    Completion,
    /// `/chat/completions`: role-tagged messages in
    Chat,
}

/// Known model families, checked in order so that more specific prefixes win
const KNOWN_BACKENDS: &[(&str, BackendKind)] = &[
    ("gpt-3.5-turbo-instruct", BackendKind::Completion),
    ("gpt-3.5-turbo", BackendKind::Chat),
    ("gpt-4", BackendKind::Chat),
    ("gpt-5", BackendKind::Chat),
    ("chatgpt-", BackendKind::Chat),
    ("o1", BackendKind::Chat),
    ("o3", BackendKind::Chat),
    ("o4", BackendKind::Chat),
    ("text-davinci-", BackendKind::Completion),
    ("text-curie-", BackendKind::Completion),
    ("text-babbage-", BackendKind::Completion),
    ("text-ada-", BackendKind::Completion),
    ("code-davinci-", BackendKind::Completion),
    ("davinci", BackendKind::Completion),
    ("curie", BackendKind::Completion),
    ("babbage", BackendKind::Completion),
    ("ada", BackendKind::Completion),
];

impl BackendKind {
    /// Look up the backend of a well-known model family
    #[must_use]
    pub fn for_known_model(model_id: &str) -> Option<Self> {
        let model_lower = model_id.to_lowercase();
        KNOWN_BACKENDS
            .iter()
            .find(|(prefix, _)| model_lower.starts_with(prefix))
            .map(|(_, kind)| *kind)
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Completion => write!(f, "completion"),
            Self::Chat => write!(f, "chat"),
        }
    }
}

impl std::str::FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "completion" => Ok(Self::Completion),
            "chat" => Ok(Self::Chat),
            _ => Err(format!("Invalid backend kind: {s}")),
        }
    }
}

/// Identifies the model under benchmark
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model identifier, e.g. `gpt-3.5-turbo`
    pub model_id: String,

    /// Model revision
    #[serde(default = "default_revision")]
    pub revision: String,

    /// Framework the model runs on
    #[serde(default = "default_framework")]
    pub framework: String,
}

fn default_revision() -> String {
    "main".to_string()
}

fn default_framework() -> String {
    "api".to_string()
}

impl ModelConfig {
    /// Create a config for an API model
    #[must_use]
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
            revision: default_revision(),
            framework: default_framework(),
        }
    }
}

/// Special token IDs a local model would carry in its own config
///
/// `cls` and `sep` fall back to `bos` and `eos`; anything missing resolves
/// to [`INVALID_TOKEN_ID`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bos_token_id: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eos_token_id: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cls_token_id: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sep_token_id: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pad_token_id: Option<i64>,
}

impl ReferenceConfig {
    #[must_use]
    pub fn bos(&self) -> i64 {
        self.bos_token_id.unwrap_or(INVALID_TOKEN_ID)
    }

    #[must_use]
    pub fn eos(&self) -> i64 {
        self.eos_token_id.unwrap_or(INVALID_TOKEN_ID)
    }

    #[must_use]
    pub fn cls(&self) -> i64 {
        self.cls_token_id.unwrap_or_else(|| self.bos())
    }

    #[must_use]
    pub fn sep(&self) -> i64 {
        self.sep_token_id.unwrap_or_else(|| self.eos())
    }

    #[must_use]
    pub fn pad(&self) -> i64 {
        self.pad_token_id.unwrap_or(INVALID_TOKEN_ID)
    }
}
