//! The two invocation paths over a loaded strategy.

use thiserror::Error;
use tracing::debug;

use crate::{
    models::{GenerativeModel, ModelError},
    tokenizer::{CodecError, DecodeOptions, EncodePolicy, TokenCodec},
    types::{CancelToken, GenerationParams},
};

#[derive(Debug, Error)]
pub enum InvokeError {
    #[error("encoding failed: {0}")]
    Encoding(#[source] CodecError),
    #[error("generation failed: {0}")]
    Generation(#[source] ModelError),
    #[error("decoding failed: {0}")]
    Decoding(#[source] CodecError),
}

/// Encode, generate, decode as three explicit steps through the harness.
pub fn invoke_direct(
    model: &dyn GenerativeModel,
    codec: &dyn TokenCodec,
    text: &str,
    params: &GenerationParams,
    cancel: &CancelToken,
) -> Result<String, InvokeError> {
    let encoded = codec
        .encode(text, &EncodePolicy::default())
        .map_err(InvokeError::Encoding)?;
    debug!(input_tokens = encoded.len(), "encoded input");

    let token_ids = model
        .generate(&encoded, params, cancel)
        .map_err(InvokeError::Generation)?;
    debug!(output_tokens = token_ids.len(), "generation finished");

    codec
        .decode(&token_ids, &DecodeOptions::skipping_special_tokens())
        .map_err(InvokeError::Decoding)
}

/// One call into the backend's own encode/generate/decode bundle. For the
/// same strategy and parameters this is semantically equivalent to
/// [`invoke_direct`], though the backend owns the defaults, so outputs need
/// not be byte-identical.
pub fn invoke_pipeline(
    model: &dyn GenerativeModel,
    codec: &dyn TokenCodec,
    text: &str,
    params: &GenerationParams,
    cancel: &CancelToken,
) -> Result<String, InvokeError> {
    model
        .generate_text(text, codec, params, cancel)
        .map_err(InvokeError::Generation)
}
