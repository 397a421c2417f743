//! Summarization invocation harness.
//!
//! Callers register summarization strategies (a model loader paired with a
//! tokenizer loader) under a model identifier, then ask the [`Summarizer`]
//! facade for a summary over either the direct (encode, generate, decode)
//! path or the pipeline path. Loaded resources are shared through an
//! explicit [`ModelCache`].

pub mod cache;
pub mod config;
pub mod facade;
pub mod invoker;
pub mod models;
pub mod registry;
pub mod tokenizer;
pub mod types;

#[cfg(test)]
mod tests;

pub use cache::{LoadedStrategy, ModelCache};
pub use facade::{SummarizeError, Summarizer};
pub use registry::{StrategyEntry, StrategyRegistry, UnknownModelError};
pub use types::{CancelToken, ConfigError, GenerationParams, Summary, SummaryPath};
