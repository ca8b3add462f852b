//! In-process [`VectorIndex`] with exact (brute-force) search.
//!
//! Mirrors the server's contract closely enough to stand in for it in tests
//! and dry runs: fixed dimension per collection, unique ids, explicit index
//! creation and loading before search.

use async_trait::async_trait;
use serde_json::{Value, json};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;
use tracing::debug;

use crate::conversions::DISTANCE_FIELD;
use crate::error::{VectorError, VectorResult};
use crate::models::{
    CollectionSchema, CollectionStats, ID_FIELD, IndexParams, MetricType, NewEntity, SearchParams,
    TEXT_FIELD, VECTOR_FIELD,
};
use crate::repository::{RawRow, VectorIndex};

#[derive(Debug)]
struct Collection {
    dimension: usize,
    entities: BTreeMap<i64, (Vec<f32>, String)>,
    index: Option<IndexParams>,
    loaded: bool,
}

#[derive(Debug, Default)]
pub struct MemoryIndex {
    collections: RwLock<HashMap<String, Collection>>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Score `candidate` against `query` under `metric`. L2 is squared Euclidean.
pub(crate) fn score(metric: MetricType, query: &[f32], candidate: &[f32]) -> f32 {
    match metric {
        MetricType::Ip => dot(query, candidate),
        MetricType::Cosine => {
            let norms = dot(query, query).sqrt() * dot(candidate, candidate).sqrt();
            if norms == 0.0 {
                0.0
            } else {
                dot(query, candidate) / norms
            }
        }
        MetricType::L2 => query
            .iter()
            .zip(candidate)
            .map(|(x, y)| (x - y) * (x - y))
            .sum(),
    }
}

fn project(id: i64, vector: &[f32], text: &str, output_fields: &[String]) -> RawRow {
    let mut row = RawRow::new();
    row.insert(ID_FIELD.to_string(), json!(id));
    for field in output_fields {
        match field.as_str() {
            TEXT_FIELD => {
                row.insert(TEXT_FIELD.to_string(), json!(text));
            }
            VECTOR_FIELD => {
                row.insert(VECTOR_FIELD.to_string(), json!(vector));
            }
            _ => {}
        }
    }
    row
}

fn not_found(collection: &str) -> VectorError {
    VectorError::CollectionNotFound(collection.to_string())
}

#[async_trait]
impl VectorIndex for MemoryIndex {
    async fn list_collections(&self) -> VectorResult<Vec<String>> {
        let collections = self.collections.read().await;
        let mut names: Vec<String> = collections.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn has_collection(&self, collection: &str) -> VectorResult<bool> {
        Ok(self.collections.read().await.contains_key(collection))
    }

    async fn create_collection(
        &self,
        collection: &str,
        schema: &CollectionSchema,
    ) -> VectorResult<()> {
        if schema.dimension == 0 {
            return Err(VectorError::Validation(
                "Vector dimension must be positive".to_string(),
            ));
        }

        let mut collections = self.collections.write().await;
        if collections.contains_key(collection) {
            return Err(VectorError::AlreadyExists(collection.to_string()));
        }

        collections.insert(
            collection.to_string(),
            Collection {
                dimension: schema.dimension,
                entities: BTreeMap::new(),
                index: None,
                loaded: false,
            },
        );
        Ok(())
    }

    async fn create_index(&self, collection: &str, params: &IndexParams) -> VectorResult<()> {
        let mut collections = self.collections.write().await;
        let entry = collections
            .get_mut(collection)
            .ok_or_else(|| not_found(collection))?;
        entry.index = Some(params.clone());
        Ok(())
    }

    async fn flush(&self, collection: &str) -> VectorResult<()> {
        if !self.has_collection(collection).await? {
            return Err(not_found(collection));
        }
        Ok(())
    }

    async fn load_collection(&self, collection: &str) -> VectorResult<()> {
        let mut collections = self.collections.write().await;
        let entry = collections
            .get_mut(collection)
            .ok_or_else(|| not_found(collection))?;
        if entry.index.is_none() {
            return Err(VectorError::IndexUnavailable(format!(
                "Collection {} has no index to load",
                collection
            )));
        }
        entry.loaded = true;
        Ok(())
    }

    async fn drop_collection(&self, collection: &str) -> VectorResult<()> {
        self.collections.write().await.remove(collection);
        Ok(())
    }

    async fn collection_stats(&self, collection: &str) -> VectorResult<CollectionStats> {
        let collections = self.collections.read().await;
        let entry = collections
            .get(collection)
            .ok_or_else(|| not_found(collection))?;
        Ok(CollectionStats {
            row_count: entry.entities.len() as u64,
        })
    }

    async fn insert(&self, collection: &str, entities: Vec<NewEntity>) -> VectorResult<u64> {
        let mut collections = self.collections.write().await;
        let entry = collections
            .get_mut(collection)
            .ok_or_else(|| not_found(collection))?;

        // Validate the whole batch before writing any of it.
        let mut seen = std::collections::HashSet::new();
        for entity in &entities {
            if entity.vector.len() != entry.dimension {
                return Err(VectorError::Validation(format!(
                    "Entity {} has dimension {}, collection expects {}",
                    entity.id,
                    entity.vector.len(),
                    entry.dimension
                )));
            }
            if entry.entities.contains_key(&entity.id) || !seen.insert(entity.id) {
                return Err(VectorError::Validation(format!(
                    "Duplicate entity id {}",
                    entity.id
                )));
            }
        }

        let written = entities.len() as u64;
        for entity in entities {
            entry
                .entities
                .insert(entity.id, (entity.vector, entity.text));
        }
        debug!(collection, written, "Inserted entities in memory");
        Ok(written)
    }

    async fn get(
        &self,
        collection: &str,
        ids: &[i64],
        output_fields: &[String],
    ) -> VectorResult<Vec<RawRow>> {
        let collections = self.collections.read().await;
        let entry = collections
            .get(collection)
            .ok_or_else(|| not_found(collection))?;

        Ok(ids
            .iter()
            .filter_map(|id| {
                entry
                    .entities
                    .get(id)
                    .map(|(vector, text)| project(*id, vector, text, output_fields))
            })
            .collect())
    }

    async fn search(
        &self,
        collection: &str,
        vector: Vec<f32>,
        limit: u32,
        params: &SearchParams,
        output_fields: &[String],
    ) -> VectorResult<Vec<RawRow>> {
        let collections = self.collections.read().await;
        let entry = collections
            .get(collection)
            .ok_or_else(|| not_found(collection))?;

        if !entry.loaded {
            return Err(VectorError::Search(format!(
                "Collection {} is not loaded",
                collection
            )));
        }
        let index_metric = entry.index.as_ref().map(|index| index.metric_type);
        if index_metric.is_some_and(|m| m != params.metric_type) {
            return Err(VectorError::Search(format!(
                "Metric {} does not match the collection's index",
                params.metric_type
            )));
        }
        if vector.len() != entry.dimension {
            return Err(VectorError::Search(format!(
                "Query has dimension {}, collection expects {}",
                vector.len(),
                entry.dimension
            )));
        }

        let metric = params.metric_type;
        let mut scored: Vec<(i64, f32)> = entry
            .entities
            .iter()
            .map(|(id, (candidate, _))| (*id, score(metric, &vector, candidate)))
            .collect();

        scored.sort_by(|(id_a, a), (id_b, b)| {
            let by_score = if metric.higher_is_closer() {
                b.partial_cmp(a)
            } else {
                a.partial_cmp(b)
            };
            by_score.unwrap_or(Ordering::Equal).then(id_a.cmp(id_b))
        });
        scored.truncate(limit as usize);

        Ok(scored
            .into_iter()
            .map(|(id, distance)| {
                let (candidate, text) = &entry.entities[&id];
                let mut row = project(id, candidate, text, output_fields);
                row.insert(DISTANCE_FIELD.to_string(), Value::from(distance as f64));
                row
            })
            .collect())
    }

    async fn server_version(&self) -> VectorResult<String> {
        Ok(format!("memory-{}", env!("CARGO_PKG_VERSION")))
    }

    async fn close(&self) {}
}
