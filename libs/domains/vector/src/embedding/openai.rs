use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};

use super::EmbeddingProvider;
use crate::error::{VectorError, VectorResult};
use crate::retry::{RetryConfig, retry_with_backoff};

pub const DEFAULT_MODEL: &str = "text-embedding-3-small";
pub const DEFAULT_DIMENSION: usize = 1536;

/// OpenAI-compatible embedding provider configuration
#[derive(Clone)]
pub struct OpenAIConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub dimension: usize,
    pub timeout: Duration,
    pub retry: RetryConfig,
}

impl OpenAIConfig {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: DEFAULT_MODEL.to_string(),
            dimension: DEFAULT_DIMENSION,
            timeout: Duration::from_secs(30),
            retry: RetryConfig::default(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>, dimension: usize) -> Self {
        self.model = model.into();
        self.dimension = dimension;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }
}

impl std::fmt::Debug for OpenAIConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("dimension", &self.dimension)
            .field("timeout", &self.timeout)
            .field("retry", &self.retry)
            .finish()
    }
}

/// OpenAI embeddings provider (`POST {base_url}/embeddings`)
pub struct OpenAIProvider {
    client: Client,
    config: OpenAIConfig,
}

impl OpenAIProvider {
    pub fn new(config: OpenAIConfig) -> VectorResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| VectorError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    async fn request(&self, texts: &[String]) -> VectorResult<Vec<Vec<f32>>> {
        let request = EmbeddingRequest {
            model: &self.config.model,
            input: texts,
        };

        let response = self
            .client
            .post(format!("{}/embeddings", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!(status = %status, "Embedding API error: {}", error_text);
            return Err(VectorError::Upstream {
                status: status.as_u16(),
                message: error_text,
            });
        }

        let embedding_response: EmbeddingResponse = response.json().await?;

        if let Some(usage) = &embedding_response.usage {
            debug!(
                prompt_tokens = usage.prompt_tokens,
                total_tokens = usage.total_tokens,
                "Embedding usage"
            );
        }

        order_by_index(embedding_response.data, texts.len())
    }

    fn check_shape(&self, expected: usize, vectors: &[Vec<f32>]) -> VectorResult<()> {
        if vectors.len() != expected {
            return Err(VectorError::Embedding(format!(
                "Expected {} embeddings, provider returned {}",
                expected,
                vectors.len()
            )));
        }
        if let Some(bad) = vectors.iter().find(|v| v.len() != self.config.dimension) {
            return Err(VectorError::Embedding(format!(
                "Expected dimension {}, provider returned {}",
                self.config.dimension,
                bad.len()
            )));
        }
        Ok(())
    }
}

/// Places each vector at the input position the provider reported for it.
/// Every position in `0..expected` must be filled exactly once.
fn order_by_index(data: Vec<EmbeddingData>, expected: usize) -> VectorResult<Vec<Vec<f32>>> {
    if data.len() != expected {
        return Err(VectorError::Embedding(format!(
            "Expected {} embeddings, provider returned {}",
            expected,
            data.len()
        )));
    }

    let mut slots: Vec<Option<Vec<f32>>> = vec![None; expected];
    for item in data {
        let slot = slots.get_mut(item.index).ok_or_else(|| {
            VectorError::Embedding(format!(
                "Provider returned index {} for a batch of {}",
                item.index, expected
            ))
        })?;
        if slot.replace(item.embedding).is_some() {
            return Err(VectorError::Embedding(format!(
                "Provider returned index {} more than once",
                item.index
            )));
        }
    }

    slots
        .into_iter()
        .enumerate()
        .map(|(i, slot)| {
            slot.ok_or_else(|| VectorError::Embedding(format!("No embedding for input {}", i)))
        })
        .collect()
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
    #[serde(default)]
    usage: Option<EmbeddingUsage>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

#[derive(Debug, Deserialize)]
struct EmbeddingUsage {
    prompt_tokens: u32,
    total_tokens: u32,
}

#[async_trait]
impl EmbeddingProvider for OpenAIProvider {
    fn dimension(&self) -> usize {
        self.config.dimension
    }

    async fn embed(&self, text: &str) -> VectorResult<Vec<f32>> {
        let results = self.embed_batch(&[text.to_string()]).await?;
        results
            .into_iter()
            .next()
            .ok_or_else(|| VectorError::Embedding("No embedding returned".to_string()))
    }

    async fn embed_batch(&self, texts: &[String]) -> VectorResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let vectors = retry_with_backoff(
            || self.request(texts),
            &self.config.retry,
            VectorError::is_transient,
        )
        .await
        .map_err(|e| match e {
            VectorError::Embedding(_) => e,
            other => VectorError::Embedding(other.to_string()),
        })?;

        self.check_shape(texts.len(), &vectors)?;
        Ok(vectors)
    }
}
