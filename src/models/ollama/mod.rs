
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};
use url::Url;

use crate::config::OllamaConfig;
use crate::models::{EmbeddingModel, GenerativeModel};

const EXPONENTIAL_BACKOFF_BASE: u64 = 2;

#[derive(Debug, Clone)]
pub struct OllamaClient {
    base_url: Url,
    agent: ureq::Agent,
    retry_attempts: u32,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

impl OllamaClient {
    #[inline]
    pub fn new(config: &OllamaConfig) -> Result<Self> {
        let base_url = config
            .ollama_url()
            .context("Failed to generate Ollama URL from config")?;

        Ok(Self {
            base_url,
            agent: build_agent(Duration::from_secs(config.timeout_seconds)),
            retry_attempts: config.retry_attempts.max(1),
        })
    }

    #[inline]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.agent = build_agent(timeout);
        self
    }

    #[inline]
    pub fn with_retry_attempts(mut self, attempts: u32) -> Self {
        self.retry_attempts = attempts.max(1);
        self
    }

    #[inline]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Run a non-streaming completion and return the generated text
    #[inline]
    pub fn generate(&self, model: &str, prompt: &str) -> Result<String> {
        debug!(
            "Generating with Ollama model {} (prompt length: {})",
            model,
            prompt.len()
        );

        let request = GenerateRequest {
            model,
            prompt,
            stream: false,
        };
        let request_json =
            serde_json::to_string(&request).context("Failed to serialize generate request")?;

        let url = self
            .base_url
            .join("/api/generate")
            .context("Failed to build generate URL")?;

        let response_text = self
            .post_json(&url, &request_json)
            .with_context(|| format!("Failed to generate text with model {model}"))?;

        let response: GenerateResponse =
            serde_json::from_str(&response_text).context("Failed to parse generate response")?;

        Ok(response.response)
    }

    /// Generate the embedding for a single text input
    #[inline]
    pub fn embed(&self, model: &str, text: &str) -> Result<Vec<f32>> {
        debug!(
            "Embedding with Ollama model {} (text length: {})",
            model,
            text.len()
        );

        let request = EmbedRequest { model, input: text };
        let request_json =
            serde_json::to_string(&request).context("Failed to serialize embedding request")?;

        let url = self
            .base_url
            .join("/api/embed")
            .context("Failed to build embedding URL")?;

        let response_text = self
            .post_json(&url, &request_json)
            .with_context(|| format!("Failed to generate embedding with model {model}"))?;

        let response: EmbedResponse =
            serde_json::from_str(&response_text).context("Failed to parse embedding response")?;

        let embedding = response
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("Embedding response contained no vectors"))?;

        debug!("Generated embedding with {} dimensions", embedding.len());
        Ok(embedding)
    }

    fn post_json(&self, url: &Url, body: &str) -> Result<String> {
        self.make_request_with_retry(|| {
            self.agent
                .post(url.as_str())
                .header("Content-Type", "application/json")
                .send(body)
                .and_then(|mut resp| resp.body_mut().read_to_string())
        })
    }

    fn make_request_with_retry<F>(&self, mut request_fn: F) -> Result<String>
    where
        F: FnMut() -> Result<String, ureq::Error>,
    {
        let mut last_error = None;

        for attempt in 1..=self.retry_attempts {
            debug!("HTTP request attempt {}/{}", attempt, self.retry_attempts);

            match request_fn() {
                Ok(response_text) => {
                    debug!("Request succeeded on attempt {}", attempt);
                    return Ok(response_text);
                }
                Err(error) => {
                    let should_retry = match &error {
                        ureq::Error::StatusCode(status) => {
                            if *status >= 500 {
                                warn!(
                                    "Server error (status {}), attempt {}/{}",
                                    status, attempt, self.retry_attempts
                                );
                                true
                            } else {
                                warn!("Client error (status {}), not retrying", status);
                                return Err(anyhow::anyhow!("Client error: HTTP {}", status));
                            }
                        }
                        ureq::Error::ConnectionFailed
                        | ureq::Error::HostNotFound
                        | ureq::Error::Timeout(_)
                        | ureq::Error::Io(_) => {
                            warn!(
                                "Transport error: {}, attempt {}/{}",
                                error, attempt, self.retry_attempts
                            );
                            true
                        }
                        _ => {
                            warn!("Non-retryable error: {}", error);
                            false
                        }
                    };

                    if !should_retry {
                        return Err(anyhow::anyhow!("Non-retryable error: {}", error));
                    }

                    last_error = Some(anyhow::anyhow!("Request error: {}", error));

                    if attempt < self.retry_attempts {
                        let delay_ms = EXPONENTIAL_BACKOFF_BASE.pow(attempt - 1) * 1000;
                        let delay = Duration::from_millis(delay_ms);
                        debug!("Waiting {:?} before retry", delay);
                        std::thread::sleep(delay);
                    }
                }
            }
        }

        error!("All retry attempts failed for request to {}", self.base_url);

        Err(last_error.unwrap_or_else(|| anyhow::anyhow!("Request failed after retries")))
    }
}

fn build_agent(timeout: Duration) -> ureq::Agent {
    ureq::Agent::config_builder()
        .timeout_global(Some(timeout))
        .build()
        .into()
}

/// A named model served by an Ollama instance
#[derive(Debug, Clone)]
pub struct OllamaModel {
    client: Arc<OllamaClient>,
    name: String,
    dimension: Option<usize>,
}

impl OllamaModel {
    #[inline]
    pub fn new(client: Arc<OllamaClient>, name: &str, dimension: Option<usize>) -> Self {
        Self {
            client,
            name: name.to_string(),
            dimension,
        }
    }
}

impl GenerativeModel for OllamaModel {
    fn model_id(&self) -> &str {
        &self.name
    }

    fn prompt(&self, text: &str) -> Result<String> {
        self.client.generate(&self.name, text)
    }
}

impl EmbeddingModel for OllamaModel {
    fn model_id(&self) -> &str {
        &self.name
    }

    fn dimensions(&self) -> Option<usize> {
        self.dimension
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.client.embed(&self.name, text)
    }
}
