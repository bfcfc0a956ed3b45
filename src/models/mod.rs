// Model providers behind the `generate` and `embed` SQL functions
// Built-in offline models plus an optional Ollama HTTP backend

pub mod hashing;
pub mod markov;
pub mod ollama;


use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::config::Config;

pub use hashing::HashingModel;
pub use markov::MarkovModel;
pub use ollama::{OllamaClient, OllamaModel};

/// A text-to-text model reachable through `generate(...)`.
pub trait GenerativeModel: Send + Sync {
    fn model_id(&self) -> &str;

    fn prompt(&self, text: &str) -> Result<String>;
}

/// A text-to-vector model reachable through `embed(...)`.
pub trait EmbeddingModel: Send + Sync {
    fn model_id(&self) -> &str;

    /// Fixed output dimensionality, when the model declares one
    fn dimensions(&self) -> Option<usize>;

    fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Unknown model: {0}")]
    UnknownModel(String),
    #[error("Unknown embedding model: {0}")]
    UnknownEmbeddingModel(String),
    #[error("Embedding model {model} returned {actual} dimensions, expected {expected}")]
    DimensionMismatch {
        model: String,
        expected: usize,
        actual: usize,
    },
}

/// Name-to-model lookup shared by every SQL function binding of a session.
pub struct ModelRegistry {
    generative: BTreeMap<String, Arc<dyn GenerativeModel>>,
    embedding: BTreeMap<String, Arc<dyn EmbeddingModel>>,
    ollama: Option<Arc<OllamaClient>>,
    ollama_embedding_dimension: Option<usize>,
    default_model: String,
    default_embedding_model: String,
}

impl ModelRegistry {
    /// Registry with only the offline models, configured from `config`
    #[inline]
    pub fn builtin(config: &Config) -> Self {
        let mut registry = Self {
            generative: BTreeMap::new(),
            embedding: BTreeMap::new(),
            ollama: None,
            ollama_embedding_dimension: None,
            default_model: config.models.default_model.clone(),
            default_embedding_model: config.models.default_embedding_model.clone(),
        };
        registry.register_model(Arc::new(MarkovModel::new(config.markov.length)));
        registry.register_embedding_model(Arc::new(HashingModel::new(config.hashing.dimension)));
        registry
    }

    #[inline]
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut registry = Self::builtin(config);

        if config.ollama.enabled {
            let client = OllamaClient::new(&config.ollama)
                .context("Failed to create Ollama client from config")?;
            debug!("Ollama provider enabled at {}", client.base_url());
            registry.ollama = Some(Arc::new(client));
            registry.ollama_embedding_dimension = config.ollama.embedding_dimension;
        }

        Ok(registry)
    }

    #[inline]
    pub fn register_model(&mut self, model: Arc<dyn GenerativeModel>) {
        self.generative.insert(model.model_id().to_string(), model);
    }

    #[inline]
    pub fn register_embedding_model(&mut self, model: Arc<dyn EmbeddingModel>) {
        self.embedding.insert(model.model_id().to_string(), model);
    }

    #[inline]
    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    #[inline]
    pub fn default_embedding_model(&self) -> &str {
        &self.default_embedding_model
    }

    #[inline]
    pub fn has_remote_provider(&self) -> bool {
        self.ollama.is_some()
    }

    /// Names of the models registered locally, generative first
    #[inline]
    pub fn model_names(&self) -> (Vec<&str>, Vec<&str>) {
        (
            self.generative.keys().map(String::as_str).collect(),
            self.embedding.keys().map(String::as_str).collect(),
        )
    }

    #[inline]
    pub fn get_model(&self, name: &str) -> Result<Arc<dyn GenerativeModel>, ModelError> {
        if let Some(model) = self.generative.get(name) {
            return Ok(Arc::clone(model));
        }

        match &self.ollama {
            Some(client) => Ok(Arc::new(OllamaModel::new(Arc::clone(client), name, None))),
            None => Err(ModelError::UnknownModel(name.to_string())),
        }
    }

    #[inline]
    pub fn get_embedding_model(&self, name: &str) -> Result<Arc<dyn EmbeddingModel>, ModelError> {
        if let Some(model) = self.embedding.get(name) {
            return Ok(Arc::clone(model));
        }

        match &self.ollama {
            Some(client) => Ok(Arc::new(OllamaModel::new(
                Arc::clone(client),
                name,
                self.ollama_embedding_dimension,
            ))),
            None => Err(ModelError::UnknownEmbeddingModel(name.to_string())),
        }
    }

    #[inline]
    pub fn generate(&self, prompt: &str, model: &str) -> Result<String> {
        debug!("Prompting model {} (prompt length: {})", model, prompt.len());
        let model = self.get_model(model)?;
        model.prompt(prompt)
    }

    /// Embed `text`, enforcing the model's declared dimensionality
    #[inline]
    pub fn embed(&self, text: &str, model: &str) -> Result<Vec<f32>> {
        debug!("Embedding with model {} (text length: {})", model, text.len());
        let model = self.get_embedding_model(model)?;
        let embedding = model.embed(text)?;

        if let Some(expected) = model.dimensions() {
            if embedding.len() != expected {
                return Err(ModelError::DimensionMismatch {
                    model: model.model_id().to_string(),
                    expected,
                    actual: embedding.len(),
                }
                .into());
            }
        }

        Ok(embedding)
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::builtin(&Config::default())
    }
}

impl fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (generative, embedding) = self.model_names();
        f.debug_struct("ModelRegistry")
            .field("generative", &generative)
            .field("embedding", &embedding)
            .field("ollama", &self.ollama.as_ref().map(|c| c.base_url().as_str()))
            .field("default_model", &self.default_model)
            .field("default_embedding_model", &self.default_embedding_model)
            .finish()
    }
}
