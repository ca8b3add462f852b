use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, error, info};

use super::MilvusConfig;
use crate::conversions::row_from_entity;
use crate::error::{VectorError, VectorResult};
use crate::models::{
    CollectionSchema, CollectionStats, ID_FIELD, IndexParams, NewEntity, SearchParams, TEXT_FIELD,
    TEXT_MAX_LENGTH, VECTOR_FIELD, VECTOR_INDEX_NAME,
};
use crate::repository::{RawRow, VectorIndex};

/// REST API generation spoken by this client
const API_VERSION: &str = "rest-v2";

/// Milvus REST API response wrapper
#[derive(Debug, Deserialize)]
struct MilvusResponse<T> {
    code: i32,
    data: Option<T>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HasData {
    has: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatsData {
    row_count: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InsertData {
    insert_count: u64,
}

/// Milvus-backed implementation of [`VectorIndex`] over the REST API v2.
pub struct MilvusIndex {
    client: Client,
    config: MilvusConfig,
}

impl MilvusIndex {
    pub fn new(config: MilvusConfig) -> VectorResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| VectorError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &MilvusConfig {
        &self.config
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}/vectordb/{}", self.config.uri, API_VERSION, endpoint)
    }

    /// POST `body` (plus `dbName`) to `endpoint`, unwrapping the `{code, data,
    /// message}` envelope.
    async fn call<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        mut body: Value,
    ) -> VectorResult<Option<T>> {
        if let Value::Object(map) = &mut body {
            map.insert("dbName".to_string(), json!(self.config.database));
        }

        let mut request = self.client.post(self.url(endpoint)).json(&body);
        if let Some(token) = &self.config.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!(endpoint, status = %status, "Milvus HTTP error: {}", error_text);
            return Err(VectorError::Upstream {
                status: status.as_u16(),
                message: error_text,
            });
        }

        let milvus_response: MilvusResponse<T> = response.json().await?;

        if milvus_response.code != 0 {
            let message = milvus_response
                .message
                .unwrap_or_else(|| "Unknown error".to_string());
            error!(endpoint, code = milvus_response.code, "Milvus error: {}", message);
            return Err(VectorError::IndexUnavailable(format!(
                "Milvus {} failed with code {}: {}",
                endpoint, milvus_response.code, message
            )));
        }

        Ok(milvus_response.data)
    }

    fn schema_body(collection: &str, schema: &CollectionSchema) -> Value {
        json!({
            "collectionName": collection,
            "schema": {
                "autoId": false,
                "enableDynamicField": true,
                "fields": [
                    {
                        "fieldName": ID_FIELD,
                        "dataType": "Int64",
                        "isPrimary": true
                    },
                    {
                        "fieldName": VECTOR_FIELD,
                        "dataType": "FloatVector",
                        "elementTypeParams": { "dim": schema.dimension.to_string() }
                    },
                    {
                        "fieldName": TEXT_FIELD,
                        "dataType": "VarChar",
                        "elementTypeParams": { "max_length": TEXT_MAX_LENGTH.to_string() }
                    }
                ]
            }
        })
    }
}

#[async_trait]
impl VectorIndex for MilvusIndex {
    async fn list_collections(&self) -> VectorResult<Vec<String>> {
        let names: Option<Vec<String>> = self.call("collections/list", json!({})).await?;
        Ok(names.unwrap_or_default())
    }

    async fn has_collection(&self, collection: &str) -> VectorResult<bool> {
        let data: Option<HasData> = self
            .call("collections/has", json!({ "collectionName": collection }))
            .await?;
        Ok(data.is_some_and(|d| d.has))
    }

    async fn create_collection(
        &self,
        collection: &str,
        schema: &CollectionSchema,
    ) -> VectorResult<()> {
        // Milvus accepts re-creating an identical schema; treat it as a conflict.
        if self.has_collection(collection).await? {
            return Err(VectorError::AlreadyExists(collection.to_string()));
        }

        self.call::<Value>("collections/create", Self::schema_body(collection, schema))
            .await?;
        info!(collection, dimension = schema.dimension, "Created collection");
        Ok(())
    }

    async fn create_index(&self, collection: &str, params: &IndexParams) -> VectorResult<()> {
        let body = json!({
            "collectionName": collection,
            "indexParams": [{
                "fieldName": VECTOR_FIELD,
                "indexName": VECTOR_INDEX_NAME,
                "metricType": params.metric_type,
                "indexType": params.index_type,
                "params": params.params,
            }]
        });

        self.call::<Value>("indexes/create", body).await?;
        info!(
            collection,
            metric = %params.metric_type,
            index_type = %params.index_type,
            "Created vector index"
        );
        Ok(())
    }

    async fn flush(&self, collection: &str) -> VectorResult<()> {
        self.call::<Value>("collections/flush", json!({ "collectionName": collection }))
            .await?;
        Ok(())
    }

    async fn load_collection(&self, collection: &str) -> VectorResult<()> {
        self.call::<Value>("collections/load", json!({ "collectionName": collection }))
            .await?;
        Ok(())
    }

    async fn drop_collection(&self, collection: &str) -> VectorResult<()> {
        self.call::<Value>("collections/drop", json!({ "collectionName": collection }))
            .await?;
        info!(collection, "Dropped collection");
        Ok(())
    }

    async fn collection_stats(&self, collection: &str) -> VectorResult<CollectionStats> {
        let data: Option<StatsData> = self
            .call("collections/get_stats", json!({ "collectionName": collection }))
            .await?;
        Ok(CollectionStats {
            row_count: data.map(|d| d.row_count).unwrap_or_default(),
        })
    }

    async fn insert(&self, collection: &str, entities: Vec<NewEntity>) -> VectorResult<u64> {
        if entities.is_empty() {
            return Ok(0);
        }

        let rows: Vec<Value> = entities.iter().map(row_from_entity).collect();
        let data: Option<InsertData> = self
            .call(
                "entities/insert",
                json!({ "collectionName": collection, "data": rows }),
            )
            .await?;

        let written = data.map(|d| d.insert_count).unwrap_or(rows.len() as u64);
        debug!(collection, written, "Inserted entities");
        Ok(written)
    }

    async fn get(
        &self,
        collection: &str,
        ids: &[i64],
        output_fields: &[String],
    ) -> VectorResult<Vec<RawRow>> {
        let body = json!({
            "collectionName": collection,
            "id": ids,
            "outputFields": output_fields,
        });

        let rows: Option<Vec<RawRow>> = self.call("entities/get", body).await?;
        Ok(rows.unwrap_or_default())
    }

    async fn search(
        &self,
        collection: &str,
        vector: Vec<f32>,
        limit: u32,
        params: &SearchParams,
        output_fields: &[String],
    ) -> VectorResult<Vec<RawRow>> {
        let body = json!({
            "collectionName": collection,
            "data": [vector],
            "annsField": VECTOR_FIELD,
            "limit": limit,
            "outputFields": output_fields,
            "searchParams": {
                "metricType": params.metric_type,
                "params": { "nprobe": params.nprobe }
            }
        });

        let rows: Option<Vec<RawRow>> = self.call("entities/search", body).await?;
        Ok(rows.unwrap_or_default())
    }

    async fn server_version(&self) -> VectorResult<String> {
        // No version endpoint over REST; report the API generation instead.
        self.list_collections().await?;
        Ok(API_VERSION.to_string())
    }

    async fn close(&self) {
        debug!(uri = %self.config.uri, "Closing Milvus client");
    }
}
