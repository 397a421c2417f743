use thiserror::Error;

use crate::{
    tokenizer::{CodecError, TokenCodec},
    types::{CancelToken, EncodedInput, GenerationParams, ModelId},
};

pub mod candle;

/// The opaque generation capability behind a loaded model.
///
/// `generate` is the token-level entry used by the direct invocation path:
/// it receives encoded input, forwards the generation parameters unchanged,
/// and returns the token ids of the best hypothesis. `generate_text` is the
/// pipeline entry: the backend owns encoding and decoding defaults and
/// returns plain text in one call.
pub trait GenerativeModel: Send + Sync {
    fn model_id(&self) -> ModelId;

    fn generate(
        &self,
        input: &EncodedInput,
        params: &GenerationParams,
        cancel: &CancelToken,
    ) -> Result<Vec<u32>, ModelError>;

    fn generate_text(
        &self,
        text: &str,
        codec: &dyn TokenCodec,
        params: &GenerationParams,
        cancel: &CancelToken,
    ) -> Result<String, ModelError>;
}

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("api error: `{0}`")]
    Api(#[from] hf_hub::api::sync::ApiError),
    #[error("candle error: `{0}`")]
    Candle(#[from] ::candle::Error),
    #[error("i/o error: `{0}`")]
    Io(#[from] std::io::Error),
    #[error("deserialize error: `{0}`")]
    Deserialize(#[from] serde_json::Error),
    #[error("codec error: `{0}`")]
    Codec(#[from] CodecError),
    #[error("generation cancelled before completion")]
    Cancelled,
    #[error("generation failed: `{0}`")]
    Generation(String),
}
