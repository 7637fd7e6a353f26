//! CLI argument parsing and command routing

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::{config::ReferenceConfig, generation::GenerationOverrides};

/// Run OpenAI models through the ScandEval tokenizer and model adapters
#[derive(Debug, Parser)]
#[command(name = "scandeval-openai")]
#[command(about = "OpenAI model adapters for the ScandEval benchmark", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// OpenAI model identifier
    #[arg(short, long, global = true, default_value = "gpt-3.5-turbo")]
    pub model: String,

    /// Settings file to use instead of the global one
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// API endpoint, overriding settings and environment
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    #[command(flatten)]
    pub tokens: TokenArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Special token IDs
#[derive(Debug, Clone, Default, Args)]
pub struct TokenArgs {
    /// Beginning-of-sequence token ID
    #[arg(long, global = true, allow_negative_numbers = true)]
    pub bos_token_id: Option<i64>,

    /// End-of-sequence token ID
    #[arg(long, global = true, allow_negative_numbers = true)]
    pub eos_token_id: Option<i64>,

    /// Padding token ID
    #[arg(long, global = true, allow_negative_numbers = true)]
    pub pad_token_id: Option<i64>,
}

impl From<&TokenArgs> for ReferenceConfig {
    fn from(args: &TokenArgs) -> Self {
        Self {
            bos_token_id: args.bos_token_id,
            eos_token_id: args.eos_token_id,
            pad_token_id: args.pad_token_id,
            ..Default::default()
        }
    }
}

/// Sampling flags for `generate`
#[derive(Debug, Clone, Default, Args)]
pub struct GenerationArgs {
    /// Maximum number of generated tokens
    #[arg(long)]
    pub max_length: Option<u32>,

    #[arg(long)]
    pub temperature: Option<f32>,

    #[arg(long)]
    pub top_p: Option<f32>,

    /// 1.0 disables the penalty
    #[arg(long)]
    pub repetition_penalty: Option<f32>,

    #[arg(long)]
    pub num_return_sequences: Option<u32>,
}

impl From<&GenerationArgs> for GenerationOverrides {
    fn from(args: &GenerationArgs) -> Self {
        Self {
            max_length: args.max_length,
            temperature: args.temperature,
            top_p: args.top_p,
            repetition_penalty: args.repetition_penalty,
            num_return_sequences: args.num_return_sequences,
        }
    }
}

/// Available commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Encode texts into a padded batch of token IDs
    Tokenize {
        /// Texts to encode
        #[arg(required = true)]
        texts: Vec<String>,
    },

    /// Decode token IDs back into text
    Decode {
        /// Token IDs to decode
        #[arg(required = true, allow_negative_numbers = true)]
        ids: Vec<i64>,
    },

    /// Generate continuations for one or more prompts
    Generate {
        /// Prompts to complete
        #[arg(required = true)]
        prompts: Vec<String>,

        #[command(flatten)]
        generation: GenerationArgs,
    },

    /// Show whether the model uses the completion or chat endpoint
    Backend,

    /// Show version information
    Version,
}

impl Cli {
    /// Parse CLI arguments from environment
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
