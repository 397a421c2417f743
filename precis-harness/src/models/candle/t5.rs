//! Seq2seq summarization backend over T5-family checkpoints.

use std::{cmp::Ordering, path::PathBuf, sync::Mutex, time::Instant};

use candle::{DType, Device, Tensor, D};
use candle_nn::{ops::log_softmax, VarBuilder};
use candle_transformers::models::t5::{self, T5ForConditionalGeneration};
use hf_hub::{api::sync::ApiBuilder, Repo, RepoType};
use tracing::{debug, info};

use crate::{
    models::{GenerativeModel, ModelError},
    registry::StrategyEntry,
    tokenizer::{DecodeOptions, EncodePolicy, HfTokenCodec, TokenCodec},
    types::{CancelToken, EncodedInput, GenerationParams, ModelId},
};

#[derive(Debug)]
pub struct T5LoadData {
    pub device: Device,
    pub dtype: DType,
    pub config_path: PathBuf,
    pub tokenizer_path: PathBuf,
    pub weights_paths: Vec<PathBuf>,
}

/// A partial output sequence tracked during beam decoding. `tokens` always
/// starts with the decoder start token.
#[derive(Clone, Debug)]
struct BeamHypothesis {
    tokens: Vec<u32>,
    score: f32,
    finished: bool,
}

impl BeamHypothesis {
    fn normalized_score(&self, length_penalty: f32) -> f32 {
        let generated = self.tokens.len().saturating_sub(1) as f32;
        if generated > 0.0 {
            self.score / generated.powf(length_penalty)
        } else {
            self.score
        }
    }
}

pub struct CandleT5Summarizer {
    model: Mutex<T5ForConditionalGeneration>,
    config: t5::Config,
    device: Device,
    model_id: ModelId,
}

impl CandleT5Summarizer {
    /// Resolves the checkpoint files through the Hugging Face hub cache.
    pub fn fetch(
        api_key: Option<String>,
        cache_dir: PathBuf,
        model_id: &str,
        revision: &str,
    ) -> Result<T5LoadData, ModelError> {
        let device = super::device(0)?;

        let api = ApiBuilder::new()
            .with_progress(true)
            .with_token(api_key)
            .with_cache_dir(cache_dir)
            .build()?;
        let repo = api.repo(Repo::with_revision(
            model_id.to_string(),
            RepoType::Model,
            revision.to_string(),
        ));

        let config_path = repo.get("config.json")?;
        let tokenizer_path = repo.get("tokenizer.json")?;
        let weights_path = repo.get("model.safetensors")?;

        Ok(T5LoadData {
            device,
            dtype: DType::F32,
            config_path,
            tokenizer_path,
            weights_paths: vec![weights_path],
        })
    }

    pub fn load(model_id: &str, load_data: T5LoadData) -> Result<Self, ModelError> {
        info!("Loading T5 model ...");
        let start = Instant::now();

        let config: t5::Config =
            serde_json::from_str(&std::fs::read_to_string(&load_data.config_path)?)?;
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(
                &load_data.weights_paths,
                load_data.dtype,
                &load_data.device,
            )?
        };
        let model = T5ForConditionalGeneration::load(vb, &config)?;
        info!("Loaded T5 model in {:?}", start.elapsed());

        Ok(Self {
            model: Mutex::new(model),
            config,
            device: load_data.device,
            model_id: model_id.to_string(),
        })
    }

    /// Builds a registry entry whose loaders lazily fetch and load this
    /// checkpoint on first use.
    pub fn hub_entry(
        model_id: &str,
        revision: &str,
        api_key: Option<String>,
        cache_dir: PathBuf,
        prompt_prefix: Option<String>,
    ) -> StrategyEntry {
        let model_loader = {
            let model_id = model_id.to_string();
            let revision = revision.to_string();
            let api_key = api_key.clone();
            let cache_dir = cache_dir.clone();
            move || {
                let load_data =
                    Self::fetch(api_key.clone(), cache_dir.clone(), &model_id, &revision)?;
                Ok(std::sync::Arc::new(Self::load(&model_id, load_data)?)
                    as std::sync::Arc<dyn GenerativeModel>)
            }
        };
        let codec_loader = {
            let model_id = model_id.to_string();
            let revision = revision.to_string();
            move || {
                let load_data =
                    Self::fetch(api_key.clone(), cache_dir.clone(), &model_id, &revision)?;
                Ok(std::sync::Arc::new(HfTokenCodec::from_file(
                    load_data.tokenizer_path,
                )?) as std::sync::Arc<dyn TokenCodec>)
            }
        };

        let entry = StrategyEntry::new(model_loader, codec_loader);
        match prompt_prefix {
            Some(prefix) => entry.with_prompt_prefix(prefix),
            None => entry,
        }
    }

    /// Log-probabilities over the vocabulary for the next token of `tokens`.
    /// The decoder cache is cleared and the full prefix re-fed on every step
    /// so that hypotheses can be decoded in any order.
    fn decode_step(
        &self,
        model: &mut T5ForConditionalGeneration,
        tokens: &[u32],
        encoder_output: &Tensor,
    ) -> Result<Vec<f32>, ModelError> {
        model.clear_kv_cache();
        let input = Tensor::new(tokens, &self.device)?.unsqueeze(0)?;
        let logits = model.decode(&input, encoder_output)?.squeeze(0)?;
        let log_probs = log_softmax(&logits.to_dtype(DType::F32)?, D::Minus1)?;
        Ok(log_probs.to_vec1::<f32>()?)
    }

    fn generate_ids(
        &self,
        input_ids: &[u32],
        params: &GenerationParams,
        cancel: &CancelToken,
    ) -> Result<Vec<u32>, ModelError> {
        let mut model = self.model.lock().expect("t5 model mutex poisoned");

        let input = Tensor::new(input_ids, &self.device)?.unsqueeze(0)?;
        let encoder_output = model.encode(&input)?;

        let start_token = self
            .config
            .decoder_start_token_id
            .unwrap_or(self.config.pad_token_id) as u32;
        let eos_token = self.config.eos_token_id as u32;

        let mut beams = vec![BeamHypothesis {
            tokens: vec![start_token],
            score: 0.0,
            finished: false,
        }];

        let start = Instant::now();
        for step in 0..params.max_length {
            if cancel.is_cancelled() {
                return Err(ModelError::Cancelled);
            }
            if beams.iter().all(|b| b.finished) {
                break;
            }

            let mut candidates = Vec::with_capacity(beams.len() * params.num_beams);
            for beam in &beams {
                if beam.finished {
                    candidates.push(beam.clone());
                    continue;
                }

                let mut log_probs =
                    self.decode_step(&mut model, &beam.tokens, &encoder_output)?;
                // EOS is not an option until the minimum length is reached.
                if beam.tokens.len() - 1 < params.min_length {
                    if let Some(p) = log_probs.get_mut(eos_token as usize) {
                        *p = f32::NEG_INFINITY;
                    }
                }

                for (token, log_prob) in top_k(&log_probs, params.num_beams) {
                    let mut tokens = beam.tokens.clone();
                    tokens.push(token);
                    candidates.push(BeamHypothesis {
                        tokens,
                        score: beam.score + log_prob,
                        finished: token == eos_token,
                    });
                }
            }

            candidates.sort_by(|a, b| {
                b.normalized_score(params.length_penalty)
                    .partial_cmp(&a.normalized_score(params.length_penalty))
                    .unwrap_or(Ordering::Equal)
            });
            candidates.truncate(params.num_beams);
            beams = candidates;
            debug!(step, live_beams = beams.iter().filter(|b| !b.finished).count());
        }

        let Some(best) = beams.into_iter().max_by(|a, b| {
            a.normalized_score(params.length_penalty)
                .partial_cmp(&b.normalized_score(params.length_penalty))
                .unwrap_or(Ordering::Equal)
        }) else {
            return Err(ModelError::Generation(
                "no beam hypotheses produced".to_string(),
            ));
        };

        let mut tokens = best.tokens;
        tokens.remove(0);
        if tokens.last() == Some(&eos_token) {
            tokens.pop();
        }

        info!(
            "{} tokens generated in {:?}",
            tokens.len(),
            start.elapsed()
        );
        Ok(tokens)
    }
}

impl GenerativeModel for CandleT5Summarizer {
    fn model_id(&self) -> ModelId {
        self.model_id.clone()
    }

    fn generate(
        &self,
        input: &EncodedInput,
        params: &GenerationParams,
        cancel: &CancelToken,
    ) -> Result<Vec<u32>, ModelError> {
        self.generate_ids(&input.ids, params, cancel)
    }

    fn generate_text(
        &self,
        text: &str,
        codec: &dyn TokenCodec,
        params: &GenerationParams,
        cancel: &CancelToken,
    ) -> Result<String, ModelError> {
        let encoded = codec.encode(text, &EncodePolicy::default())?;
        let ids = self.generate_ids(&encoded.ids, params, cancel)?;
        Ok(codec.decode(&ids, &DecodeOptions::skipping_special_tokens())?)
    }
}

fn top_k(log_probs: &[f32], k: usize) -> Vec<(u32, f32)> {
    let mut indexed: Vec<(u32, f32)> = log_probs
        .iter()
        .enumerate()
        .map(|(i, &p)| (i as u32, p))
        .collect();
    indexed.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    indexed.truncate(k);
    indexed
}
