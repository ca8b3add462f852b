use std::sync::Arc;

use tracing::{instrument, warn};
use validator::Validate;

use crate::conversions::{entity_from_row, hit_from_row};
use crate::embedding::EmbeddingProvider;
use crate::error::{VectorError, VectorResult};
use crate::models::{
    CollectionStats, Entity, MetricType, SearchHit, SearchParams, SearchQuery, TEXT_FIELD,
};
use crate::repository::VectorIndex;

/// Semantic search over one configured collection
///
/// Query text is embedded with the provider, searched in the index and the
/// raw hits converted to [`SearchHit`]s in the index's order.
pub struct SearchService<I: VectorIndex> {
    index: Arc<I>,
    embedder: Arc<dyn EmbeddingProvider>,
    collection: String,
    metric: MetricType,
}

fn as_search_error(err: VectorError) -> VectorError {
    match err {
        VectorError::Search(_) | VectorError::Validation(_) => err,
        other => VectorError::Search(other.to_string()),
    }
}

fn as_unavailable(err: VectorError) -> VectorError {
    match err {
        VectorError::IndexUnavailable(_) => err,
        other => VectorError::IndexUnavailable(other.to_string()),
    }
}

impl<I: VectorIndex> SearchService<I> {
    pub fn new(
        index: Arc<I>,
        embedder: Arc<dyn EmbeddingProvider>,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            index,
            embedder,
            collection: collection.into(),
            metric: MetricType::default(),
        }
    }

    /// Metric the collection's index was built with
    pub fn with_metric(mut self, metric: MetricType) -> Self {
        self.metric = metric;
        self
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn metric(&self) -> MetricType {
        self.metric
    }

    pub fn index(&self) -> &Arc<I> {
        &self.index
    }

    // ===== Search =====

    /// Embed `query.query` and return up to `query.top_k` nearest hits.
    ///
    /// Input is validated before any outbound call. An empty result means the
    /// collection had no matches; failures are always errors.
    #[instrument(skip(self, query), fields(query = %query.query, top_k = query.top_k, nprobe = query.nprobe))]
    pub async fn search(&self, query: &SearchQuery) -> VectorResult<Vec<SearchHit>> {
        query
            .validate()
            .map_err(|e| VectorError::Validation(e.to_string()))?;

        let vector = self.embedder.embed(&query.query).await.map_err(|e| match e {
            VectorError::Embedding(_) => e,
            other => VectorError::Embedding(other.to_string()),
        })?;
        if vector.is_empty() {
            return Err(VectorError::Embedding(
                "Provider returned an empty vector".to_string(),
            ));
        }

        let params = SearchParams::new(self.metric, query.nprobe);
        let output_fields = vec![TEXT_FIELD.to_string()];

        let rows = self
            .index
            .search(
                &self.collection,
                vector,
                query.top_k,
                &params,
                &output_fields,
            )
            .await
            .map_err(as_search_error)?;

        let mut hits = rows
            .iter()
            .map(|row| hit_from_row(row, &output_fields))
            .collect::<VectorResult<Vec<_>>>()
            .map_err(as_search_error)?;

        hits.truncate(query.top_k as usize);

        let distances: Vec<f32> = hits.iter().map(|h| h.distance).collect();
        if !self.metric.is_ordered(&distances) {
            warn!(
                metric = %self.metric,
                "Index returned hits out of {} order",
                if self.metric.higher_is_closer() { "descending" } else { "ascending" }
            );
        }

        Ok(hits)
    }

    // ===== Point Lookup =====

    /// Fetch one entity by id; `None` when absent.
    #[instrument(skip(self), fields(entity_id = id))]
    pub async fn get_entity(&self, id: i64) -> VectorResult<Option<Entity>> {
        let rows = self
            .index
            .get(&self.collection, &[id], &[TEXT_FIELD.to_string()])
            .await
            .map_err(as_unavailable)?;

        rows.first()
            .map(entity_from_row)
            .transpose()
            .map_err(as_unavailable)
    }

    // ===== Introspection =====

    #[instrument(skip(self))]
    pub async fn list_collections(&self) -> VectorResult<Vec<String>> {
        self.index.list_collections().await.map_err(as_unavailable)
    }

    #[instrument(skip(self), fields(collection = %self.collection))]
    pub async fn collection_stats(&self) -> VectorResult<CollectionStats> {
        self.index
            .collection_stats(&self.collection)
            .await
            .map_err(as_unavailable)
    }

    pub async fn server_version(&self) -> VectorResult<String> {
        self.index.server_version().await.map_err(as_unavailable)
    }

    pub async fn close(&self) {
        self.index.close().await;
    }
}
