//! Tokenizer adapter for OpenAI models
//!
//! Wraps a tiktoken BPE encoding behind the interface the benchmark loop
//! expects from a local tokenizer: batch encoding into a right-padded ID
//! matrix, pad-aware decoding and named special tokens.

use std::{collections::HashSet, sync::Arc};

use tiktoken_rs::{CoreBPE, Rank};

use crate::{
    config::{ModelConfig, ReferenceConfig},
    error::{BenchError, Result},
    tensor::{pad_sequences, strip_padding, TokenTensor},
};

/// Literal text of the padding token
pub const PAD_TOKEN: &str = "<pad>";

/// BPE tokenizer for an OpenAI model
#[derive(Clone)]
pub struct OpenAITokenizer {
    model_config: ModelConfig,
    reference: ReferenceConfig,
    encoding: Arc<CoreBPE>,
    bos_token: String,
    eos_token: String,
    allowed_special: HashSet<String>,
}

impl std::fmt::Debug for OpenAITokenizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAITokenizer")
            .field("model_id", &self.model_config.model_id)
            .field("reference", &self.reference)
            .field("bos_token", &self.bos_token)
            .field("eos_token", &self.eos_token)
            .finish_non_exhaustive()
    }
}

impl OpenAITokenizer {
    /// Create the tokenizer for the encoding used by `model_config.model_id`
    ///
    /// # Errors
    ///
    /// Returns an error if no encoding is known for the model
    pub fn new(model_config: ModelConfig, reference: ReferenceConfig) -> Result<Self> {
        let encoding = tiktoken_rs::get_bpe_from_model(&model_config.model_id).map_err(|e| {
            BenchError::Tokenizer(format!(
                "no encoding for model {}: {e}",
                model_config.model_id
            ))
        })?;
        Ok(Self::with_encoding(model_config, reference, Arc::new(encoding)))
    }

    /// Create a tokenizer around an already loaded encoding
    #[must_use]
    pub fn with_encoding(
        model_config: ModelConfig,
        reference: ReferenceConfig,
        encoding: Arc<CoreBPE>,
    ) -> Self {
        let bos_token = token_text(&encoding, reference.bos());
        let eos_token = token_text(&encoding, reference.eos());
        let allowed_special = [bos_token.as_str(), eos_token.as_str(), PAD_TOKEN]
            .into_iter()
            .filter(|token| !token.is_empty())
            .map(str::to_string)
            .collect();
        Self {
            model_config,
            reference,
            encoding,
            bos_token,
            eos_token,
            allowed_special,
        }
    }

    /// Model this tokenizer belongs to
    #[must_use]
    pub fn model_config(&self) -> &ModelConfig {
        &self.model_config
    }

    /// Beginning-of-sequence ID, `-1` when unset
    #[must_use]
    pub fn bos_token_id(&self) -> i64 {
        self.reference.bos()
    }

    /// Same ID as bos
    #[must_use]
    pub fn cls_token_id(&self) -> i64 {
        self.reference.cls()
    }

    /// End-of-sequence ID, `-1` when unset
    #[must_use]
    pub fn eos_token_id(&self) -> i64 {
        self.reference.eos()
    }

    /// Same ID as eos
    #[must_use]
    pub fn sep_token_id(&self) -> i64 {
        self.reference.sep()
    }

    /// ID used to right-pad batches and skipped by `decode`
    #[must_use]
    pub fn pad_token_id(&self) -> i64 {
        self.reference.pad()
    }

    /// Text of the beginning-of-sequence token, empty when it has no ID
    #[must_use]
    pub fn bos_token(&self) -> &str {
        &self.bos_token
    }

    /// Alias of `bos_token`
    #[must_use]
    pub fn cls_token(&self) -> &str {
        &self.bos_token
    }

    /// Text of the end-of-sequence token, empty when it has no ID
    #[must_use]
    pub fn eos_token(&self) -> &str {
        &self.eos_token
    }

    /// Alias of `eos_token`
    #[must_use]
    pub fn sep_token(&self) -> &str {
        &self.eos_token
    }

    /// Always `<pad>`
    #[must_use]
    pub fn pad_token(&self) -> &str {
        PAD_TOKEN
    }

    /// Token IDs of one string, no padding
    ///
    /// Only this tokenizer's own bos, eos and pad texts are read as special
    /// tokens. Any other special-token text is encoded as plain text.
    #[must_use]
    pub fn encode_one(&self, text: &str) -> Vec<i64> {
        let allowed: HashSet<&str> = self.allowed_special.iter().map(String::as_str).collect();
        let (ids, _) = self.encoding.encode(text, &allowed);
        ids.into_iter().map(i64::from).collect()
    }

    /// Encode a single string as a batch of one
    #[must_use]
    pub fn encode(&self, text: &str) -> TokenTensor {
        self.encode_batch(&[text])
    }

    /// Encode every string and right-pad the rows with the pad token ID
    #[must_use]
    pub fn encode_batch<S: AsRef<str>>(&self, texts: &[S]) -> TokenTensor {
        let rows = texts
            .iter()
            .map(|text| self.encode_one(text.as_ref()))
            .collect();
        TokenTensor::Batch(pad_sequences(rows, self.pad_token_id()))
    }

    /// Decode token IDs to text, skipping pad tokens only
    ///
    /// # Errors
    ///
    /// Returns an error if a remaining ID is negative or unknown to the encoding
    pub fn decode(&self, token_ids: &[i64]) -> Result<String> {
        let ranks = strip_padding(token_ids, self.pad_token_id())
            .into_iter()
            .map(|id| Rank::try_from(id).map_err(|_| BenchError::InvalidTokenId(id)))
            .collect::<Result<Vec<_>>>()?;
        self.encoding
            .decode(ranks)
            .map_err(|e| BenchError::Tokenizer(e.to_string()))
    }
}

/// Decoded text of a single special token, or empty when unavailable
fn token_text(encoding: &CoreBPE, token_id: i64) -> String {
    Rank::try_from(token_id)
        .ok()
        .and_then(|rank| encoding.decode(vec![rank]).ok())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::INVALID_TOKEN_ID;
    use pretty_assertions::assert_eq;

    const ENDOFTEXT: i64 = 100_257;

    fn tokenizer(pad: Option<i64>) -> OpenAITokenizer {
        let reference = ReferenceConfig {
            bos_token_id: Some(ENDOFTEXT),
            eos_token_id: Some(ENDOFTEXT),
            pad_token_id: pad,
            ..Default::default()
        };
        OpenAITokenizer::new(ModelConfig::new("gpt-3.5-turbo"), reference).unwrap()
    }

    #[test]
    fn test_special_tokens() {
        let tok = tokenizer(None);
        assert_eq!(tok.eos_token(), "<|endoftext|>");
        assert_eq!(tok.sep_token(), tok.eos_token());
        assert_eq!(tok.cls_token_id(), ENDOFTEXT);
        assert_eq!(tok.pad_token(), "<pad>");
        assert_eq!(tok.pad_token_id(), INVALID_TOKEN_ID);
    }

    #[test]
    fn test_missing_special_ids_give_empty_text() {
        let tok =
            OpenAITokenizer::new(ModelConfig::new("gpt-4"), ReferenceConfig::default()).unwrap();
        assert_eq!(tok.bos_token(), "");
        assert_eq!(tok.eos_token(), "");
        assert_eq!(tok.bos_token_id(), INVALID_TOKEN_ID);
    }

    #[test]
    fn test_unknown_model() {
        let err = OpenAITokenizer::new(
            ModelConfig::new("definitely-not-a-model"),
            ReferenceConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, BenchError::Tokenizer(_)));
    }

    #[test]
    fn test_batch_rows_have_equal_length() {
        let tok = tokenizer(Some(ENDOFTEXT + 1000));
        let TokenTensor::Batch(rows) =
            tok.encode_batch(&["Hej", "Det her er en noget længere sætning.", ""])
        else {
            panic!("expected a batch");
        };

        let width = rows[1].len();
        let short_len = tok.encode_one("Hej").len();
        assert!(short_len < width);
        assert!(rows.iter().all(|row| row.len() == width));
        assert!(rows[0][short_len..].iter().all(|&id| id == tok.pad_token_id()));
        assert!(rows[2].iter().all(|&id| id == tok.pad_token_id()));
    }

    #[test]
    fn test_decode_after_encode_is_lossless() {
        let pad = 0;
        let tok = tokenizer(Some(pad));
        let texts = ["short", "a considerably longer piece of text", "ÆØÅ æøå"];
        let TokenTensor::Batch(rows) = tok.encode_batch(&texts) else {
            panic!("expected a batch");
        };
        // token 0 is "!" in cl100k, so keep inputs free of it
        for (row, text) in rows.iter().zip(texts) {
            assert_eq!(tok.decode(row).unwrap(), text);
        }
    }

    #[test]
    fn test_special_tokens_pass_through_literally() {
        let tok = tokenizer(None);
        let ids = tok.encode_one("Svar:<|endoftext|>");
        assert_eq!(ids.last(), Some(&ENDOFTEXT));
        assert_eq!(tok.decode(&ids).unwrap(), "Svar:<|endoftext|>");
    }

    #[test]
    fn test_unlisted_special_tokens_stay_plain_text() {
        const FIM_PREFIX: i64 = 100_258;

        let tok =
            OpenAITokenizer::new(ModelConfig::new("gpt-3.5-turbo"), ReferenceConfig::default())
                .unwrap();
        let ids = tok.encode_one("a<|fim_prefix|>b");
        assert!(!ids.contains(&FIM_PREFIX));
        assert_eq!(tok.decode(&ids).unwrap(), "a<|fim_prefix|>b");

        // endoftext is not allowed either when eos has no ID
        let ids = tok.encode_one("<|endoftext|>");
        assert!(!ids.contains(&ENDOFTEXT));
    }

    #[test]
    fn test_decode_rejects_negative_ids() {
        let tok = tokenizer(Some(0));
        let err = tok.decode(&[-5]).unwrap_err();
        assert!(matches!(err, BenchError::InvalidTokenId(-5)));
        // the sentinel pad is dropped before conversion
        let tok = tokenizer(None);
        assert_eq!(tok.decode(&[INVALID_TOKEN_ID]).unwrap(), "");
    }
}
