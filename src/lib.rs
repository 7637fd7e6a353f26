//! scandeval-openai: OpenAI models behind a local-model interface
//!
//! The ScandEval benchmark loop drives models through a tokenizer that
//! batch-encodes text into padded ID matrices and a model whose `generate`
//! maps token tensors to token tensors. This crate provides both for the
//! OpenAI API, so the loop can treat API models and local models alike.

#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions, clippy::too_many_lines)]

pub mod cli;
pub mod config;
pub mod error;
pub mod generation;
pub mod model;
pub mod services;
pub mod tensor;
pub mod tokenizer;

// Re-exports for convenience
pub use error::{BenchError, Result};
pub use generation::{GenerationConfig, GenerationOverrides};
pub use model::{Device, OpenAIModel};
pub use tensor::TokenTensor;
pub use tokenizer::OpenAITokenizer;
