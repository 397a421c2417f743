//! The facade callers interact with.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::{
    cache::ModelCache,
    invoker::{invoke_direct, invoke_pipeline, InvokeError},
    models::ModelError,
    registry::{StrategyRegistry, UnknownModelError},
    types::{CancelToken, ConfigError, GenerationParams, ModelId, Summary, SummaryPath},
};

#[derive(Debug, Error)]
pub enum SummarizeError {
    #[error(transparent)]
    UnknownModel(#[from] UnknownModelError),
    #[error("invalid generation parameters: {0}")]
    InvalidParams(#[from] ConfigError),
    #[error("failed to load model `{model_id}`: {source}")]
    Load {
        model_id: ModelId,
        #[source]
        source: ModelError,
    },
    #[error("`{path}` invocation failed for model `{model_id}`: {source}")]
    Invocation {
        model_id: ModelId,
        path: SummaryPath,
        #[source]
        source: InvokeError,
    },
}

/// Resolves a strategy, loads it through the cache and dispatches to the
/// requested invocation path.
pub struct Summarizer {
    registry: StrategyRegistry,
    cache: Arc<ModelCache>,
}

impl Summarizer {
    pub fn new(registry: StrategyRegistry) -> Self {
        Self::with_cache(registry, Arc::new(ModelCache::new()))
    }

    /// Shares an existing cache, so several facades can reuse one set of
    /// loaded models.
    pub fn with_cache(registry: StrategyRegistry, cache: Arc<ModelCache>) -> Self {
        Self { registry, cache }
    }

    pub fn registry(&self) -> &StrategyRegistry {
        &self.registry
    }

    pub fn cache(&self) -> &Arc<ModelCache> {
        &self.cache
    }

    pub fn summarize(
        &self,
        text: &str,
        model_id: &str,
        path: SummaryPath,
        params: &GenerationParams,
    ) -> Result<Summary, SummarizeError> {
        self.summarize_with_cancel(text, model_id, path, params, &CancelToken::new())
    }

    pub fn summarize_with_cancel(
        &self,
        text: &str,
        model_id: &str,
        path: SummaryPath,
        params: &GenerationParams,
        cancel: &CancelToken,
    ) -> Result<Summary, SummarizeError> {
        params.validate()?;
        let entry = self.registry.resolve(model_id)?;

        let loaded = self
            .cache
            .get_or_load(model_id, entry)
            .map_err(|source| SummarizeError::Load {
                model_id: model_id.to_string(),
                source,
            })?;

        let prompt = match loaded.prompt_prefix.as_deref() {
            Some(prefix) => format!("{prefix}{text}"),
            None => text.to_string(),
        };

        info!(%model_id, %path, "dispatching summarization");
        let text = match path {
            SummaryPath::Direct => {
                invoke_direct(loaded.model.as_ref(), loaded.codec.as_ref(), &prompt, params, cancel)
            }
            SummaryPath::Pipeline => {
                invoke_pipeline(loaded.model.as_ref(), loaded.codec.as_ref(), &prompt, params, cancel)
            }
        }
        .map_err(|source| SummarizeError::Invocation {
            model_id: model_id.to_string(),
            path,
            source,
        })?;

        Ok(Summary {
            text,
            model_id: model_id.to_string(),
            path,
        })
    }
}
