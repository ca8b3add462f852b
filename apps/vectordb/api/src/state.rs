//! Application state management.
//!
//! Built once at start-up and shared by every handler: configuration plus
//! the search service holding the Milvus and OpenAI clients.

use domain_vector::retry::{RetryConfig, retry_with_backoff};
use domain_vector::{MilvusIndex, OpenAIProvider, SearchService, VectorError, VectorIndex};
use eyre::WrapErr;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::Config;

/// Shared application state (cheap to clone, everything behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub service: Arc<SearchService<MilvusIndex>>,
}

impl AppState {
    pub fn new(config: Config, service: SearchService<MilvusIndex>) -> Self {
        Self {
            config: Arc::new(config),
            service: Arc::new(service),
        }
    }

    /// Build the clients and verify Milvus answers before serving.
    ///
    /// Transient failures are retried with backoff; anything else aborts
    /// start-up.
    pub async fn connect(config: Config) -> eyre::Result<Self> {
        let settings = &config.vectordb;

        info!(
            uri = %settings.milvus.uri,
            database = %settings.milvus.database,
            "Connecting to Milvus"
        );
        let index = MilvusIndex::new(settings.milvus.clone())?;

        let version = retry_with_backoff(
            || index.server_version(),
            &RetryConfig::default(),
            VectorError::is_transient,
        )
        .await
        .wrap_err_with(|| format!("Milvus at {} is unreachable", settings.milvus.uri))?;
        info!(version = %version, "Milvus connected successfully");

        if !index.has_collection(&settings.collection).await? {
            warn!(
                collection = %settings.collection,
                "Configured collection does not exist yet; searches will fail until it is ingested"
            );
        }

        let embedder = OpenAIProvider::new(settings.openai.clone())?;
        info!(model = %embedder.model(), "Embedding provider configured");

        let service = SearchService::new(
            Arc::new(index),
            Arc::new(embedder),
            settings.collection.clone(),
        )
        .with_metric(settings.metric);

        Ok(Self::new(config, service))
    }

    pub async fn close(&self) {
        info!("Shutting down: closing Milvus client");
        self.service.close().await;
    }
}
