//! Service layer for the remote OpenAI API
//!
//! [`CompletionBackend`] abstracts over the two endpoint shapes the model
//! adapter needs:
//! - `/completions` for completion-style models
//! - `/chat/completions` for chat-style models

pub mod openai;
pub mod retry;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{config::BackendKind, error::Result, generation::GenerationConfig};

/// Prompt for the completion endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Prompt {
    /// Plain text
    Text(String),
    /// One token-ID sequence per prompt
    Tokens(Vec<Vec<u32>>),
}

/// Sampling parameters shared by both endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplingParams {
    pub max_tokens: u32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,

    /// Number of choices per prompt
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f32>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub stop: Vec<String>,
}

impl SamplingParams {
    /// Map a generation config onto the API's parameters
    #[must_use]
    pub fn from_generation(config: &GenerationConfig, stop: Vec<String>) -> Self {
        Self {
            max_tokens: config.max_length,
            temperature: Some(config.temperature),
            top_p: Some(config.top_p),
            n: Some(config.num_return_sequences),
            frequency_penalty: Some(config.frequency_penalty()),
            stop,
        }
    }

    /// Bare parameters for a short capability probe
    #[must_use]
    pub fn probe() -> Self {
        Self {
            max_tokens: 10,
            temperature: None,
            top_p: None,
            n: None,
            frequency_penalty: None,
            stop: Vec::new(),
        }
    }
}

/// Request for the completion endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub model: String,
    pub prompt: Prompt,
    #[serde(flatten)]
    pub params: SamplingParams,
}

/// Message role; prompts are always sent as the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
}

/// One chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Request for the chat endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(flatten)]
    pub params: SamplingParams,
}

/// Core trait for remote completion backends
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Get the provider name (e.g., "openai")
    fn provider(&self) -> &str;

    /// Call the completion endpoint; returns choice texts ordered by index
    async fn complete(&self, request: CompletionRequest) -> Result<Vec<String>>;

    /// Call the chat endpoint; returns choice contents ordered by index
    async fn chat(&self, request: ChatRequest) -> Result<Vec<String>>;

    /// Find out which endpoint a model needs by sending it a tiny completion
    ///
    /// A chat-model rejection means chat-style; any other error is returned.
    async fn probe(&self, model_id: &str) -> Result<BackendKind> {
        let request = CompletionRequest {
            model: model_id.to_string(),
            prompt: Prompt::Text("Test".to_string()),
            params: SamplingParams::probe(),
        };
        match self.complete(request).await {
            Ok(_) => Ok(BackendKind::Completion),
            Err(e) if e.is_chat_model_signal() => Ok(BackendKind::Chat),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BenchError;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_completion_request_body() {
        let config = GenerationConfig {
            max_length: 32,
            repetition_penalty: 1.5,
            ..Default::default()
        };
        let request = CompletionRequest {
            model: "text-davinci-003".into(),
            prompt: Prompt::Tokens(vec![vec![1, 2], vec![3]]),
            params: SamplingParams::from_generation(&config, vec!["\n\n".into()]),
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "model": "text-davinci-003",
                "prompt": [[1, 2], [3]],
                "max_tokens": 32,
                "temperature": 1.0,
                "top_p": 1.0,
                "n": 1,
                "frequency_penalty": 0.5,
                "stop": ["\n\n"],
            })
        );
    }

    #[test]
    fn test_probe_request_is_minimal() {
        let request = CompletionRequest {
            model: "gpt-4".into(),
            prompt: Prompt::Text("Test".into()),
            params: SamplingParams::probe(),
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"model": "gpt-4", "prompt": "Test", "max_tokens": 10})
        );
    }

    struct Rejecting(fn() -> BenchError);

    #[async_trait]
    impl CompletionBackend for Rejecting {
        fn provider(&self) -> &str {
            "test"
        }

        async fn complete(&self, _request: CompletionRequest) -> Result<Vec<String>> {
            Err((self.0)())
        }

        async fn chat(&self, _request: ChatRequest) -> Result<Vec<String>> {
            Ok(vec![String::new()])
        }
    }

    #[tokio::test]
    async fn test_probe_classifies_chat_rejection() {
        let backend = Rejecting(|| BenchError::InvalidRequest {
            status: 404,
            message: "This is a chat model and not supported in the v1/completions endpoint."
                .into(),
        });
        assert_eq!(backend.probe("gpt-4").await.unwrap(), BackendKind::Chat);
    }

    #[tokio::test]
    async fn test_probe_propagates_other_errors() {
        let backend = Rejecting(|| BenchError::Authentication("bad key".into()));
        let err = backend.probe("gpt-4").await.unwrap_err();
        assert!(matches!(err, BenchError::Authentication(_)));
    }
}
