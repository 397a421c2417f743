//! Adapter over the external tokenization capability.

use thiserror::Error;
use tokenizers::Tokenizer;

use crate::types::EncodedInput;

/// Fallback cap on encoded input length when the tokenizer carries no
/// truncation parameters of its own.
const DEFAULT_MAX_INPUT_LENGTH: usize = 1024;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum PaddingPolicy {
    /// Pad to the longest sequence in the batch. A no-op for a single input,
    /// but still requires the tokenizer to have a pad token configured.
    #[default]
    Longest,
    None,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct EncodePolicy {
    pub truncation: bool,
    pub padding: PaddingPolicy,
}

impl Default for EncodePolicy {
    fn default() -> Self {
        Self {
            truncation: true,
            padding: PaddingPolicy::Longest,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct DecodeOptions {
    pub skip_special_tokens: bool,
}

impl DecodeOptions {
    pub fn skipping_special_tokens() -> Self {
        Self {
            skip_special_tokens: true,
        }
    }
}

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("cannot encode empty input text")]
    EmptyInput,
    #[error("`longest` padding requested but the tokenizer has no pad token configured")]
    MissingPadToken,
    #[error("tokenizer error: `{0}`")]
    Tokenizer(String),
}

/// Text to token ids and back. Decoding must be deterministic for identical
/// ids and options.
pub trait TokenCodec: Send + Sync {
    fn encode(&self, text: &str, policy: &EncodePolicy) -> Result<EncodedInput, CodecError>;

    fn decode(&self, ids: &[u32], options: &DecodeOptions) -> Result<String, CodecError>;
}

/// [`TokenCodec`] backed by a Hugging Face `tokenizers` tokenizer file.
pub struct HfTokenCodec {
    tokenizer: Tokenizer,
    max_input_length: usize,
}

impl HfTokenCodec {
    pub fn new(tokenizer: Tokenizer) -> Self {
        Self {
            tokenizer,
            max_input_length: DEFAULT_MAX_INPUT_LENGTH,
        }
    }

    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, CodecError> {
        let tokenizer =
            Tokenizer::from_file(path).map_err(|e| CodecError::Tokenizer(e.to_string()))?;
        Ok(Self::new(tokenizer))
    }

    pub fn with_max_input_length(mut self, max_input_length: usize) -> Self {
        self.max_input_length = max_input_length;
        self
    }

    fn has_pad_token(&self) -> bool {
        self.tokenizer.get_padding().is_some() || self.tokenizer.token_to_id("<pad>").is_some()
    }
}

impl TokenCodec for HfTokenCodec {
    fn encode(&self, text: &str, policy: &EncodePolicy) -> Result<EncodedInput, CodecError> {
        if text.trim().is_empty() {
            return Err(CodecError::EmptyInput);
        }
        if policy.padding == PaddingPolicy::Longest && !self.has_pad_token() {
            return Err(CodecError::MissingPadToken);
        }

        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| CodecError::Tokenizer(e.to_string()))?;
        let mut ids = encoding.get_ids().to_vec();
        let mut attention_mask = encoding.get_attention_mask().to_vec();
        if policy.truncation && ids.len() > self.max_input_length {
            ids.truncate(self.max_input_length);
            attention_mask.truncate(self.max_input_length);
        }

        Ok(EncodedInput::new(ids, attention_mask))
    }

    fn decode(&self, ids: &[u32], options: &DecodeOptions) -> Result<String, CodecError> {
        self.tokenizer
            .decode(ids, options.skip_special_tokens)
            .map_err(|e| CodecError::Tokenizer(e.to_string()))
    }
}
