use std::{
    fmt::Display,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Instant,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type ModelId = String;

/// Parameters forwarded unchanged to the generation capability.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct GenerationParams {
    pub max_length: usize,
    pub min_length: usize,
    pub length_penalty: f32,
    pub num_beams: usize,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_length: 250,
            min_length: 150,
            length_penalty: 2.0,
            num_beams: 4,
        }
    }
}

impl GenerationParams {
    pub fn new(
        max_length: usize,
        min_length: usize,
        length_penalty: f32,
        num_beams: usize,
    ) -> Self {
        Self {
            max_length,
            min_length,
            length_penalty,
            num_beams,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_length == 0 {
            return Err(ConfigError::ZeroMaxLength);
        }
        if self.min_length > self.max_length {
            return Err(ConfigError::MinExceedsMax {
                min: self.min_length,
                max: self.max_length,
            });
        }
        if self.num_beams == 0 {
            return Err(ConfigError::ZeroBeams);
        }
        Ok(())
    }
}

#[derive(Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    #[error("max_length must be strictly positive")]
    ZeroMaxLength,
    #[error("min_length `{min}` exceeds max_length `{max}`")]
    MinExceedsMax { min: usize, max: usize },
    #[error("num_beams must be at least 1")]
    ZeroBeams,
}

/// Token ids plus an attention mask of equal length.
#[derive(Clone, Debug)]
pub struct EncodedInput {
    pub ids: Vec<u32>,
    pub attention_mask: Vec<u32>,
}

impl EncodedInput {
    pub fn new(ids: Vec<u32>, attention_mask: Vec<u32>) -> Self {
        debug_assert_eq!(ids.len(), attention_mask.len());
        Self {
            ids,
            attention_mask,
        }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Which invocation path produced a summary.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SummaryPath {
    Direct,
    Pipeline,
}

impl Display for SummaryPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Direct => write!(f, "direct"),
            Self::Pipeline => write!(f, "pipeline"),
        }
    }
}

/// The harness's sole externally visible artifact.
#[derive(Clone, Debug)]
pub struct Summary {
    pub text: String,
    pub model_id: ModelId,
    pub path: SummaryPath,
}

/// Caller-supplied cancellation flag with an optional deadline, checked at
/// the invoker boundary and between decode steps of long-running backends.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            deadline: Some(deadline),
        }
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed) || self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}
