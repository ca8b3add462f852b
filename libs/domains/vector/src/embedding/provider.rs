use async_trait::async_trait;

use crate::error::VectorResult;

/// Trait for embedding generation providers
///
/// Every vector returned has exactly [`dimension`](Self::dimension) components,
/// and a batch yields one vector per input in input order.
#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Output width of the configured model
    fn dimension(&self) -> usize;

    /// Generate embedding for a single text
    async fn embed(&self, text: &str) -> VectorResult<Vec<f32>>;

    /// Generate embeddings for multiple texts in batch
    async fn embed_batch(&self, texts: &[String]) -> VectorResult<Vec<Vec<f32>>>;
}
