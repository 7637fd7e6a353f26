//! Model adapter for OpenAI models
//!
//! [`OpenAIModel`] exposes the remote API through the same `generate`
//! contract as a local model: padded token tensors in, padded token tensors
//! out. Internally it strips padding, picks the endpoint the model needs,
//! sends the prompts, re-tokenizes the answers and pads them back up.

use std::sync::Arc;

use indicatif::ProgressBar;
use tokio::sync::OnceCell;
use tracing::debug;

use crate::{
    config::{BackendKind, BenchmarkConfig, DatasetConfig, ModelConfig, ReferenceConfig, Settings},
    error::{BenchError, Result},
    generation::{GenerationConfig, GenerationOverrides},
    services::{
        openai::OpenAIClient,
        retry::{RetryDecision, RetryPolicy},
        ChatMessage, ChatRequest, CompletionBackend, CompletionRequest, Prompt, SamplingParams,
    },
    tensor::{pad_sequences, TokenTensor},
    tokenizer::OpenAITokenizer,
};

/// Where generation runs; API models never use local compute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Device {
    Cpu,
}

impl std::fmt::Display for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cpu => write!(f, "cpu"),
        }
    }
}

/// An OpenAI model behind a local-model `generate` interface
pub struct OpenAIModel {
    model_config: ModelConfig,
    config: ReferenceConfig,
    dataset_config: DatasetConfig,
    benchmark_config: BenchmarkConfig,
    tokenizer: OpenAITokenizer,
    backend: Arc<dyn CompletionBackend>,
    retry: RetryPolicy,
    backend_kind: OnceCell<BackendKind>,
}

impl OpenAIModel {
    /// Create a model adapter over an arbitrary backend
    #[must_use]
    pub fn new(
        model_config: ModelConfig,
        config: ReferenceConfig,
        dataset_config: DatasetConfig,
        benchmark_config: BenchmarkConfig,
        tokenizer: OpenAITokenizer,
        backend: Arc<dyn CompletionBackend>,
    ) -> Self {
        Self {
            model_config,
            config,
            dataset_config,
            benchmark_config,
            tokenizer,
            backend,
            retry: RetryPolicy::default(),
            backend_kind: OnceCell::new(),
        }
    }

    /// Create a model adapter talking to the OpenAI API
    ///
    /// Retry budget and backend overrides are taken from `settings`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built
    pub fn from_settings(
        settings: &Settings,
        model_config: ModelConfig,
        config: ReferenceConfig,
        dataset_config: DatasetConfig,
        benchmark_config: BenchmarkConfig,
        tokenizer: OpenAITokenizer,
    ) -> Result<Self> {
        let backend = Arc::new(OpenAIClient::new(settings)?);
        let backend_kind = settings.backend_override(&model_config.model_id);
        Ok(Self::new(
            model_config,
            config,
            dataset_config,
            benchmark_config,
            tokenizer,
            backend,
        )
        .with_retry_policy(RetryPolicy::from(&settings.retry))
        .with_backend_kind(backend_kind))
    }

    /// Replace the default retry budget
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Pin the backend instead of looking it up; `None` keeps the lookup
    #[must_use]
    pub fn with_backend_kind(mut self, kind: Option<BackendKind>) -> Self {
        self.backend_kind = OnceCell::new_with(kind);
        self
    }

    #[must_use]
    pub fn model_config(&self) -> &ModelConfig {
        &self.model_config
    }

    #[must_use]
    pub fn config(&self) -> &ReferenceConfig {
        &self.config
    }

    #[must_use]
    pub fn dataset_config(&self) -> &DatasetConfig {
        &self.dataset_config
    }

    #[must_use]
    pub fn benchmark_config(&self) -> &BenchmarkConfig {
        &self.benchmark_config
    }

    #[must_use]
    pub fn tokenizer(&self) -> &OpenAITokenizer {
        &self.tokenizer
    }

    #[must_use]
    pub fn device(&self) -> Device {
        Device::Cpu
    }

    /// Which endpoint this model needs
    ///
    /// Resolved once, from the known-model table or else a probe request,
    /// and cached for the lifetime of the adapter.
    ///
    /// # Errors
    ///
    /// Returns the probe's error if it fails for any reason other than the
    /// model being a chat model
    pub async fn backend_kind(&self) -> Result<BackendKind> {
        self.backend_kind
            .get_or_try_init(|| self.lookup_backend_kind())
            .await
            .copied()
    }

    async fn lookup_backend_kind(&self) -> Result<BackendKind> {
        let model_id = &self.model_config.model_id;
        if let Some(kind) = BackendKind::for_known_model(model_id) {
            debug!(model = %model_id, backend = %kind, "Backend from known models");
            return Ok(kind);
        }
        let kind = self.backend.probe(model_id).await?;
        debug!(
            provider = self.backend.provider(),
            model = %model_id,
            backend = %kind,
            "Backend from probe"
        );
        Ok(kind)
    }

    /// Generate continuations for padded input IDs
    ///
    /// A [`TokenTensor::Batch`] yields a batch padded with the tokenizer's
    /// pad ID; a [`TokenTensor::Single`] yields the single unpadded output.
    /// Rate limits and server errors are retried with exponential backoff
    /// until the retry budget is spent.
    ///
    /// # Errors
    ///
    /// Returns [`BenchError::RetriesExhausted`] when transient failures
    /// outlast the retry budget, and any other error unchanged
    pub async fn generate(
        &self,
        inputs: &TokenTensor,
        generation_config: Option<&GenerationConfig>,
        overrides: &GenerationOverrides,
    ) -> Result<TokenTensor> {
        let config = GenerationConfig::resolve(generation_config, overrides);
        let pad_token_id = self.tokenizer.pad_token_id();
        let sequences = inputs.unpadded(pad_token_id);

        if sequences.is_empty() {
            return Ok(TokenTensor::Batch(Vec::new()));
        }

        let mut failures = 0;
        let completions = loop {
            match self.generate_once(&sequences, &config).await {
                Ok(completions) => break completions,
                Err(e) if e.is_transient() => {
                    failures += 1;
                    match self.retry.should_retry(failures) {
                        RetryDecision::Retry { delay } => {
                            debug!(
                                provider = self.backend.provider(),
                                error = %e,
                                attempt = failures,
                                delay_secs = delay.as_secs_f32(),
                                "Transient OpenAI API error, trying again"
                            );
                            tokio::time::sleep(delay).await;
                        }
                        RetryDecision::Abort => {
                            return Err(BenchError::RetriesExhausted {
                                attempts: failures,
                                source: Box::new(e),
                            });
                        }
                    }
                }
                Err(e) => return Err(e),
            }
        };

        Ok(match inputs {
            TokenTensor::Single(_) => {
                TokenTensor::Single(completions.into_iter().next().unwrap_or_default())
            }
            TokenTensor::Batch(_) => TokenTensor::Batch(pad_sequences(completions, pad_token_id)),
        })
    }

    async fn generate_once(
        &self,
        sequences: &[Vec<i64>],
        config: &GenerationConfig,
    ) -> Result<Vec<Vec<i64>>> {
        let params = SamplingParams::from_generation(config, self.stop_sequences());
        match self.backend_kind().await? {
            BackendKind::Completion => {
                let expected = sequences.len() * config.num_return_sequences as usize;
                self.generate_completion(sequences, params, expected).await
            }
            BackendKind::Chat => self.generate_chat(sequences, params).await,
        }
    }

    /// All prompts in one request; choices come back in prompt order
    async fn generate_completion(
        &self,
        sequences: &[Vec<i64>],
        params: SamplingParams,
        expected: usize,
    ) -> Result<Vec<Vec<i64>>> {
        let prompt = sequences
            .iter()
            .map(|ids| to_ranks(ids))
            .collect::<Result<Vec<_>>>()?;
        let request = CompletionRequest {
            model: self.model_config.model_id.clone(),
            prompt: Prompt::Tokens(prompt),
            params,
        };

        let texts = self.backend.complete(request).await?;
        if texts.len() != expected {
            return Err(BenchError::ChoiceCountMismatch {
                model: self.model_config.model_id.clone(),
                expected,
                got: texts.len(),
            });
        }
        Ok(texts
            .iter()
            .map(|text| self.tokenizer.encode_one(text.trim()))
            .collect())
    }

    /// One request per prompt, sent one after the other
    async fn generate_chat(
        &self,
        sequences: &[Vec<i64>],
        params: SamplingParams,
    ) -> Result<Vec<Vec<i64>>> {
        let progress_bar = if self.benchmark_config.progress_bar {
            ProgressBar::new(sequences.len() as u64)
        } else {
            ProgressBar::hidden()
        };

        let mut completions = Vec::with_capacity(sequences.len());
        for ids in sequences {
            let request = ChatRequest {
                model: self.model_config.model_id.clone(),
                messages: vec![ChatMessage::user(self.tokenizer.decode(ids)?)],
                params: params.clone(),
            };
            let content = self
                .backend
                .chat(request)
                .await?
                .into_iter()
                .next()
                .ok_or_else(|| BenchError::EmptyResponse(self.model_config.model_id.clone()))?;
            completions.push(self.tokenizer.encode_one(content.trim()));
            progress_bar.inc(1);
        }
        progress_bar.finish_and_clear();

        Ok(completions)
    }

    /// Paragraph break, end-of-sequence and padding, without empty entries
    fn stop_sequences(&self) -> Vec<String> {
        let mut stop: Vec<String> = Vec::with_capacity(3);
        for candidate in ["\n\n", self.tokenizer.eos_token(), self.tokenizer.pad_token()] {
            if !candidate.is_empty() && !stop.iter().any(|s| s == candidate) {
                stop.push(candidate.to_string());
            }
        }
        stop
    }
}

fn to_ranks(ids: &[i64]) -> Result<Vec<u32>> {
    ids.iter()
        .map(|&id| u32::try_from(id).map_err(|_| BenchError::InvalidTokenId(id)))
        .collect()
}
