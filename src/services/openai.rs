//! OpenAI API client
//!
//! Supports:
//! - OpenAI official API (`/completions` and `/chat/completions`)
//! - OpenAI-compatible endpoints via a custom base URL

use async_trait::async_trait;
use reqwest::{header, Client, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use crate::{
    config::Settings,
    error::{BenchError, Result},
};

use super::{ChatRequest, CompletionBackend, CompletionRequest};

/// HTTP client for the OpenAI API
pub struct OpenAIClient {
    client: Client,
    base_url: String,
}

impl OpenAIClient {
    /// Create a new client from settings
    ///
    /// # Errors
    ///
    /// Returns an error if no API key is configured or the HTTP client
    /// cannot be built
    pub fn new(settings: &Settings) -> Result<Self> {
        let api_key = settings.require_api_key()?;

        let client = Client::builder()
            .default_headers({
                let mut headers = header::HeaderMap::new();
                headers.insert(
                    header::AUTHORIZATION,
                    header::HeaderValue::from_str(&format!("Bearer {api_key}")).map_err(|_| {
                        BenchError::ConfigValidation("Invalid API key format".to_string())
                    })?,
                );
                if let Some(org) = &settings.organization {
                    headers.insert(
                        "openai-organization",
                        header::HeaderValue::from_str(org).map_err(|_| {
                            BenchError::ConfigValidation("Invalid organization format".to_string())
                        })?,
                    );
                }
                headers
            })
            .timeout(settings.timeout())
            .build()?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + Sync,
        R: DeserializeOwned + Send,
    {
        let url = format!("{}/{path}", self.base_url);
        debug!(%url, "POST");

        let response = self.client.post(&url).json(body).send().await?;
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl CompletionBackend for OpenAIClient {
    fn provider(&self) -> &str {
        "openai"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<Vec<String>> {
        let mut response: OpenAICompletionResponse = self.post("completions", &request).await?;
        if response.choices.is_empty() {
            return Err(BenchError::EmptyResponse(request.model));
        }
        response.choices.sort_by_key(|choice| choice.index);
        Ok(response
            .choices
            .into_iter()
            .map(|choice| choice.text)
            .collect())
    }

    async fn chat(&self, request: ChatRequest) -> Result<Vec<String>> {
        let mut response: OpenAIChatResponse = self.post("chat/completions", &request).await?;
        if response.choices.is_empty() {
            return Err(BenchError::EmptyResponse(request.model));
        }
        response.choices.sort_by_key(|choice| choice.index);
        Ok(response
            .choices
            .into_iter()
            .map(|choice| choice.message.content.unwrap_or_default())
            .collect())
    }
}

/// Turn a non-success response into the matching error variant
async fn error_from_response(response: Response) -> BenchError {
    let status = response.status();
    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => return BenchError::Http(e),
    };
    classify_status(status, error_message(&body))
}

fn classify_status(status: StatusCode, message: String) -> BenchError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => BenchError::RateLimited { message },
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => BenchError::Authentication(message),
        StatusCode::REQUEST_TIMEOUT | StatusCode::CONFLICT => BenchError::Api {
            status: status.as_u16(),
            message,
        },
        s if s.is_server_error() => BenchError::Api {
            status: s.as_u16(),
            message,
        },
        s => BenchError::InvalidRequest {
            status: s.as_u16(),
            message,
        },
    }
}

/// The `error.message` of an OpenAI error envelope, or the raw body
fn error_message(body: &str) -> String {
    serde_json::from_str::<OpenAIErrorEnvelope>(body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|_| body.to_string())
}

// OpenAI API types

#[derive(Debug, Clone, Deserialize)]
struct OpenAICompletionResponse {
    choices: Vec<OpenAICompletionChoice>,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAICompletionChoice {
    #[serde(default)]
    index: u32,
    text: String,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAIChatResponse {
    choices: Vec<OpenAIChatChoice>,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAIChatChoice {
    #[serde(default)]
    index: u32,
    message: OpenAIChatMessage,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAIChatMessage {
    content: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAIErrorEnvelope {
    error: OpenAIErrorBody,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAIErrorBody {
    message: String,
}
