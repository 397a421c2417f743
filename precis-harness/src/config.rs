use std::path::PathBuf;

use config::Config;
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};

use crate::types::ModelId;

/// One model to register at startup.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ModelSpec {
    model_id: ModelId,
    revision: String,
    prompt_prefix: Option<String>,
}

impl ModelSpec {
    pub fn new(model_id: ModelId, revision: String, prompt_prefix: Option<String>) -> Self {
        Self {
            model_id,
            revision,
            prompt_prefix,
        }
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub fn revision(&self) -> &str {
        &self.revision
    }

    pub fn prompt_prefix(&self) -> Option<String> {
        self.prompt_prefix.clone()
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct HarnessConfig {
    api_key: Option<String>,
    cache_dir: PathBuf,
    tracing: bool,
    models: Vec<ModelSpec>,
}

impl HarnessConfig {
    pub fn new(
        api_key: Option<String>,
        cache_dir: PathBuf,
        tracing: bool,
        models: Vec<ModelSpec>,
    ) -> Self {
        Self {
            api_key,
            cache_dir,
            tracing,
            models,
        }
    }

    pub fn api_key(&self) -> Option<String> {
        self.api_key.clone()
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.cache_dir.clone()
    }

    pub fn tracing(&self) -> bool {
        self.tracing
    }

    pub fn models(&self) -> Vec<ModelSpec> {
        self.models.clone()
    }

    pub fn from_file_path(config_file_path: PathBuf) -> Self {
        let builder = Config::builder().add_source(config::File::with_name(
            config_file_path.to_str().as_ref().unwrap(),
        ));
        let config = builder
            .build()
            .expect("Failed to read harness configuration file");
        config
            .try_deserialize::<Self>()
            .expect("Failed to deserialize harness configuration")
    }

    pub fn from_env_file() -> Self {
        dotenv().ok();

        let api_key = std::env::var("API_KEY").ok();
        let cache_dir = std::env::var("CACHE_DIR")
            .expect("Failed to retrieve cache dir, from .env file")
            .parse()
            .unwrap();
        let tracing = std::env::var("TRACING")
            .unwrap_or_default()
            .parse()
            .unwrap_or(false);
        let models = serde_json::from_str(
            &std::env::var("MODELS").expect("Failed to retrieve models metadata, from .env file"),
        )
        .expect("Failed to parse models metadata");

        Self {
            api_key,
            cache_dir,
            tracing,
            models,
        }
    }
}
