//! Error types for scandeval-openai

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using [`BenchError`]
pub type Result<T> = std::result::Result<T, BenchError>;

/// Substrings the OpenAI API uses when a chat model is sent to `/completions`
const CHAT_MODEL_MARKERS: &[&str] = &["This is a chat model", "v1/chat/completions"];

/// Main error type for scandeval-openai
#[derive(Debug, Error)]
pub enum BenchError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration parse error
    #[error("Failed to parse config at {path}: {message}")]
    ConfigParse { path: PathBuf, message: String },

    /// Configuration validation error
    #[error("Invalid configuration: {0}")]
    ConfigValidation(String),

    /// No API key in settings or environment
    #[error("Missing API key for provider: {provider}")]
    MissingApiKey { provider: String },

    /// HTTP request error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The API rejected the request because of rate limiting
    #[error("Rate limit exceeded: {message}")]
    RateLimited { message: String },

    /// Server-side API failure (5xx and friends)
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// The API rejected the request as malformed or unsupported
    #[error("Invalid request (HTTP {status}): {message}")]
    InvalidRequest { status: u16, message: String },

    /// Bad or missing credentials
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// The API answered without any choices
    #[error("No choices in response from {0}")]
    EmptyResponse(String),

    /// Transient failures kept happening until the retry budget ran out
    #[error("Giving up after {attempts} attempts: {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: Box<BenchError>,
    },

    /// Tokenizer construction or decoding failure
    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    /// Token ID outside the vocabulary range
    #[error("Invalid token id: {0}")]
    InvalidTokenId(i64),

    /// Choice count does not match prompts times `n`
    #[error("Expected {expected} choices from {model}, got {got}")]
    ChoiceCountMismatch {
        model: String,
        expected: usize,
        got: usize,
    },
}

impl BenchError {
    /// Whether the failure is worth retrying after a delay
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::Api { .. })
    }

    /// Whether the API told us the model only speaks the chat endpoint
    #[must_use]
    pub fn is_chat_model_signal(&self) -> bool {
        match self {
            Self::InvalidRequest { message, .. } => {
                CHAT_MODEL_MARKERS.iter().any(|marker| message.contains(marker))
            }
            _ => false,
        }
    }
}
