//! Vector Domain Library
//!
//! Semantic search over a data dictionary stored in a vector index.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌───────────────────┐
//! │  SearchService  │     │ IngestionPipeline │
//! └────────┬────────┘     └─────────┬─────────┘
//!          │                        │
//! ┌────────▼────────┐     ┌─────────▼─────────┐
//! │   VectorIndex   │     │ EmbeddingProvider │
//! │     (trait)     │     │      (trait)      │
//! └────────┬────────┘     └─────────┬─────────┘
//!          │                        │
//! ┌────────▼────────┐     ┌─────────▼─────────┐
//! │   MilvusIndex   │     │  OpenAIProvider   │
//! │   MemoryIndex   │     └───────────────────┘
//! └─────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use domain_vector::{
//!     MilvusConfig, MilvusIndex, OpenAIConfig, OpenAIProvider, SearchQuery, SearchService,
//! };
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let index = MilvusIndex::new(MilvusConfig::new("http://localhost:19530", "default"))?;
//! let embedder = OpenAIProvider::new(OpenAIConfig::new("sk-...", "https://api.openai.com/v1"))?;
//!
//! let service = SearchService::new(Arc::new(index), Arc::new(embedder), "data_dictionary");
//! let hits = service.search(&SearchQuery::new("order number").with_top_k(5)).await?;
//! for hit in hits {
//!     println!("{} {:.3} {:?}", hit.id, hit.distance, hit.text());
//! }
//! # Ok(())
//! # }
//! ```

#[cfg(feature = "config")]
pub mod config;
pub mod conversions;
pub mod embedding;
pub mod error;
pub mod handlers;
pub mod ingest;
pub mod memory;
pub mod milvus;
pub mod models;
pub mod repository;
pub mod retry;
pub mod service;

// Re-export commonly used types
#[cfg(feature = "config")]
pub use config::VectorDbSettings;
pub use embedding::{EmbeddingProvider, OpenAIConfig, OpenAIProvider};
pub use error::{VectorError, VectorResult};
pub use handlers::{VectorApiDoc, router};
pub use ingest::{
    DataDictionaryDocument, DocumentSource, FsDocumentSource, GcsConfig, GcsDocumentSource,
    IngestOptions, IngestionPipeline,
};
pub use memory::MemoryIndex;
pub use milvus::{MilvusConfig, MilvusIndex};
pub use models::{
    CollectionSchema, CollectionStats, Entity, IndexParams, IndexType, IngestReport, MetricType,
    SearchHit, SearchParams, SearchQuery,
};
pub use repository::VectorIndex;
pub use retry::RetryConfig;
pub use service::SearchService;

#[cfg(any(test, feature = "mocks"))]
pub use embedding::MockEmbeddingProvider;
#[cfg(any(test, feature = "mocks"))]
pub use repository::MockVectorIndex;
