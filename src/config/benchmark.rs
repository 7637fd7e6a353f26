//! Dataset and benchmark parameter bags
//!
//! The adapters only carry these around so the surrounding benchmark loop can
//! hand the same values to local and API models alike.

use std::{collections::BTreeMap, path::PathBuf};

use serde::{Deserialize, Serialize};

/// Describes the dataset being benchmarked
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// Short dataset name
    pub name: String,

    /// Human readable name
    #[serde(default)]
    pub pretty_name: String,

    /// Dataset identifier on the Hugging Face Hub
    #[serde(default)]
    pub huggingface_id: String,

    /// Label names keyed by label ID
    #[serde(default)]
    pub id2label: BTreeMap<usize, String>,

    /// Anything else the benchmark loop needs
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl DatasetConfig {
    #[must_use]
    pub fn num_labels(&self) -> usize {
        self.id2label.len()
    }
}

/// Run-wide benchmark options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkConfig {
    /// Show progress bars for long-running loops
    #[serde(default = "default_true")]
    pub progress_bar: bool,

    /// Cache directory for models and datasets
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,

    /// Reduced iteration counts for test runs
    #[serde(default)]
    pub testing: bool,

    /// Verbose logging
    #[serde(default)]
    pub verbose: bool,

    /// Also evaluate on the training split
    #[serde(default)]
    pub evaluate_train: bool,
}

fn default_true() -> bool {
    true
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from(".scandeval_cache")
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            progress_bar: true,
            cache_dir: default_cache_dir(),
            testing: false,
            verbose: false,
            evaluate_train: false,
        }
    }
}
