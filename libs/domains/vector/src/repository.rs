use async_trait::async_trait;

use crate::error::VectorResult;
use crate::models::{CollectionSchema, CollectionStats, IndexParams, NewEntity, SearchParams};

/// A raw row as returned by the index: output fields keyed by name, plus
/// `distance` for search hits. Converted to typed values in
/// [`crate::conversions`].
pub type RawRow = serde_json::Map<String, serde_json::Value>;

/// Vector index abstraction
///
/// Collections hold `(id, vector, text)` entities and one similarity index over
/// the vector field. Implemented over the Milvus REST API and in memory.
#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait VectorIndex: Send + Sync {
    // ===== Collection Management =====

    async fn list_collections(&self) -> VectorResult<Vec<String>>;

    async fn has_collection(&self, collection: &str) -> VectorResult<bool>;

    /// Create an empty collection; fails with `AlreadyExists` if present
    async fn create_collection(
        &self,
        collection: &str,
        schema: &CollectionSchema,
    ) -> VectorResult<()>;

    /// Build the vector index over the `embeddings` field
    async fn create_index(&self, collection: &str, params: &IndexParams) -> VectorResult<()>;

    /// Persist pending writes
    async fn flush(&self, collection: &str) -> VectorResult<()>;

    /// Make the collection searchable
    async fn load_collection(&self, collection: &str) -> VectorResult<()>;

    async fn drop_collection(&self, collection: &str) -> VectorResult<()>;

    async fn collection_stats(&self, collection: &str) -> VectorResult<CollectionStats>;

    // ===== Entity Operations =====

    /// Insert entities; returns the number written
    async fn insert(&self, collection: &str, entities: Vec<NewEntity>) -> VectorResult<u64>;

    /// Point lookup by primary key; missing ids are absent from the result
    async fn get(
        &self,
        collection: &str,
        ids: &[i64],
        output_fields: &[String],
    ) -> VectorResult<Vec<RawRow>>;

    /// ANN search for one query vector, hits ordered by the metric convention
    async fn search(
        &self,
        collection: &str,
        vector: Vec<f32>,
        limit: u32,
        params: &SearchParams,
        output_fields: &[String],
    ) -> VectorResult<Vec<RawRow>>;

    // ===== Lifecycle =====

    /// Connectivity probe.
    ///
    /// Returns the server version when the backend exposes one, otherwise an
    /// identifier of the API it speaks (`rest-v2` for Milvus REST).
    async fn server_version(&self) -> VectorResult<String>;

    async fn close(&self);
}
