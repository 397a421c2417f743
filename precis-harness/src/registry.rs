//! Maps model identifiers to loadable summarization strategies.

use std::{collections::HashMap, fmt, sync::Arc};

use thiserror::Error;

use crate::{
    models::{GenerativeModel, ModelError},
    tokenizer::TokenCodec,
    types::ModelId,
};

pub type ModelLoader =
    Arc<dyn Fn() -> Result<Arc<dyn GenerativeModel>, ModelError> + Send + Sync>;
pub type CodecLoader = Arc<dyn Fn() -> Result<Arc<dyn TokenCodec>, ModelError> + Send + Sync>;

/// A model-loader capability paired with a tokenizer-loader capability.
/// Built once at registry-construction time, never mutated afterwards.
#[derive(Clone)]
pub struct StrategyEntry {
    model_loader: ModelLoader,
    codec_loader: CodecLoader,
    prompt_prefix: Option<String>,
}

impl StrategyEntry {
    pub fn new<M, C>(model_loader: M, codec_loader: C) -> Self
    where
        M: Fn() -> Result<Arc<dyn GenerativeModel>, ModelError> + Send + Sync + 'static,
        C: Fn() -> Result<Arc<dyn TokenCodec>, ModelError> + Send + Sync + 'static,
    {
        Self {
            model_loader: Arc::new(model_loader),
            codec_loader: Arc::new(codec_loader),
            prompt_prefix: None,
        }
    }

    /// Task prefix prepended to the input before encoding. T5-family models
    /// expect `"summarize: "`.
    pub fn with_prompt_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prompt_prefix = Some(prefix.into());
        self
    }

    pub fn load_model(&self) -> Result<Arc<dyn GenerativeModel>, ModelError> {
        (self.model_loader)()
    }

    pub fn load_codec(&self) -> Result<Arc<dyn TokenCodec>, ModelError> {
        (self.codec_loader)()
    }

    pub fn prompt_prefix(&self) -> Option<&str> {
        self.prompt_prefix.as_deref()
    }
}

impl fmt::Debug for StrategyEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StrategyEntry")
            .field("prompt_prefix", &self.prompt_prefix)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Error)]
#[error("model `{0}` is not registered")]
pub struct UnknownModelError(pub ModelId);

/// In-memory strategy table. Multiple identifiers may be registered and
/// resolved independently; nothing assumes a single active model.
#[derive(Debug, Default)]
pub struct StrategyRegistry {
    entries: HashMap<ModelId, StrategyEntry>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, model_id: impl Into<ModelId>, entry: StrategyEntry) {
        self.entries.insert(model_id.into(), entry);
    }

    pub fn resolve(&self, model_id: &str) -> Result<&StrategyEntry, UnknownModelError> {
        self.entries
            .get(model_id)
            .ok_or_else(|| UnknownModelError(model_id.to_string()))
    }

    pub fn contains(&self, model_id: &str) -> bool {
        self.entries.contains_key(model_id)
    }

    pub fn model_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::stubs::echo_entry;
    use std::sync::{atomic::AtomicUsize, Arc};

    #[test]
    fn test_resolve_unregistered_fails() {
        let registry = StrategyRegistry::new();
        let err = registry.resolve("no-such-model").unwrap_err();
        assert_eq!(err.0, "no-such-model");
        assert!(err.to_string().contains("no-such-model"));
    }

    #[test]
    fn test_multiple_models_resolve_independently() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut registry = StrategyRegistry::new();
        registry.register("pegasus-demo", echo_entry("pegasus-demo", counter.clone()));
        registry.register("bart-demo", echo_entry("bart-demo", counter.clone()));

        assert!(registry.resolve("pegasus-demo").is_ok());
        assert!(registry.resolve("bart-demo").is_ok());
        assert_eq!(registry.model_ids(), vec!["bart-demo", "pegasus-demo"]);
    }

    #[test]
    fn test_prompt_prefix_round_trips() {
        let counter = Arc::new(AtomicUsize::new(0));
        let entry = echo_entry("t5-demo", counter).with_prompt_prefix("summarize: ");
        assert_eq!(entry.prompt_prefix(), Some("summarize: "));
    }
}
