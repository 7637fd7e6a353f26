//! Sampling parameters for `generate`

use serde::{Deserialize, Serialize};

/// Sampling parameters, defaulting to the Hugging Face generation defaults
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Maximum number of tokens to generate
    #[serde(default = "default_max_length")]
    pub max_length: u32,

    #[serde(default = "default_one")]
    pub temperature: f32,

    #[serde(default = "default_one")]
    pub top_p: f32,

    /// 1.0 means no penalty
    #[serde(default = "default_one")]
    pub repetition_penalty: f32,

    #[serde(default = "default_num_return_sequences")]
    pub num_return_sequences: u32,
}

fn default_max_length() -> u32 {
    20
}

fn default_one() -> f32 {
    1.0
}

fn default_num_return_sequences() -> u32 {
    1
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_length: default_max_length(),
            temperature: default_one(),
            top_p: default_one(),
            repetition_penalty: default_one(),
            num_return_sequences: default_num_return_sequences(),
        }
    }
}

impl GenerationConfig {
    /// Merge a base config with per-call overrides
    ///
    /// Without a base config the defaults are used. Every `Some` override
    /// replaces the base value.
    #[must_use]
    pub fn resolve(base: Option<&GenerationConfig>, overrides: &GenerationOverrides) -> Self {
        let mut config = base.copied().unwrap_or_default();
        overrides.apply_to(&mut config);
        config
    }

    /// OpenAI's frequency penalty is additive, with 0.0 meaning none
    #[must_use]
    pub fn frequency_penalty(&self) -> f32 {
        self.repetition_penalty - 1.0
    }
}

/// Per-call overrides for [`GenerationConfig`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repetition_penalty: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_return_sequences: Option<u32>,
}

impl GenerationOverrides {
    /// Write every set field into `config`
    pub fn apply_to(&self, config: &mut GenerationConfig) {
        if let Some(max_length) = self.max_length {
            config.max_length = max_length;
        }
        if let Some(temperature) = self.temperature {
            config.temperature = temperature;
        }
        if let Some(top_p) = self.top_p {
            config.top_p = top_p;
        }
        if let Some(repetition_penalty) = self.repetition_penalty {
            config.repetition_penalty = repetition_penalty;
        }
        if let Some(num_return_sequences) = self.num_return_sequences {
            config.num_return_sequences = num_return_sequences;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_without_base_uses_defaults() {
        let overrides = GenerationOverrides {
            max_length: Some(5),
            ..Default::default()
        };
        let config = GenerationConfig::resolve(None, &overrides);
        assert_eq!(config.max_length, 5);
        assert_eq!(config.temperature, 1.0);
        assert_eq!(config.num_return_sequences, 1);
    }

    #[test]
    fn test_overrides_beat_base() {
        let base = GenerationConfig {
            max_length: 100,
            temperature: 0.0,
            ..Default::default()
        };
        let overrides = GenerationOverrides {
            temperature: Some(0.7),
            repetition_penalty: Some(1.2),
            ..Default::default()
        };
        let config = GenerationConfig::resolve(Some(&base), &overrides);
        assert_eq!(config.max_length, 100);
        assert_eq!(config.temperature, 0.7);
        assert!((config.frequency_penalty() - 0.2).abs() < 1e-6);
        // the base config is left alone
        assert_eq!(base.temperature, 0.0);
    }

    #[test]
    fn test_empty_overrides() {
        let base = GenerationConfig {
            top_p: 0.9,
            ..Default::default()
        };
        assert_eq!(
            GenerationConfig::resolve(Some(&base), &GenerationOverrides::default()),
            base
        );
    }
}
