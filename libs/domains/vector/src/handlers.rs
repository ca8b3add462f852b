//! REST handlers for the semantic search API

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use axum_helpers::ValidatedJson;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::{OpenApi, ToSchema};
use validator::Validate;

use crate::error::VectorResult;
use crate::models::{CollectionStats, Entity, SearchHit, SearchQuery};
use crate::repository::VectorIndex;
use crate::service::SearchService;

pub const HEALTH_MESSAGE: &str = "Hello from vectordb router";

// ===== Request/Response DTOs =====

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub msg: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CollectionsResponse {
    pub collections: Vec<String>,
}

/// Point lookup by primary key
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct GetEntityRequest {
    pub id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SearchResponse {
    /// Matches, closest first
    pub responses: Vec<SearchHit>,
}

// ===== Handlers =====

/// Router liveness
#[utoipa::path(
    get,
    path = "/health",
    tag = "vectordb",
    responses(
        (status = 200, description = "Router is up", body = HealthResponse)
    )
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        msg: HEALTH_MESSAGE.to_string(),
    })
}

/// List collection names
#[utoipa::path(
    get,
    path = "/collections",
    tag = "vectordb",
    responses(
        (status = 200, description = "Collection names", body = CollectionsResponse),
        (status = 500, description = "Vector index unavailable", body = axum_helpers::ErrorResponse)
    )
)]
pub async fn list_collections<I: VectorIndex>(
    State(service): State<Arc<SearchService<I>>>,
) -> VectorResult<Json<CollectionsResponse>> {
    let collections = service
        .list_collections()
        .await
        .inspect_err(|e| error!("list_collections failed: {}", e))?;
    Ok(Json(CollectionsResponse { collections }))
}

/// Entity count of the configured collection
#[utoipa::path(
    get,
    path = "/collection_dimension",
    tag = "vectordb",
    responses(
        (status = 200, description = "Collection statistics", body = CollectionStats),
        (status = 500, description = "Vector index unavailable", body = axum_helpers::ErrorResponse)
    )
)]
pub async fn collection_dimension<I: VectorIndex>(
    State(service): State<Arc<SearchService<I>>>,
) -> VectorResult<Json<CollectionStats>> {
    let stats = service.collection_stats().await.inspect_err(|e| {
        error!(collection = %service.collection(), "collection_stats failed: {}", e)
    })?;
    Ok(Json(stats))
}

/// Fetch one entity by id
///
/// Returns an empty list when the id does not exist.
#[utoipa::path(
    post,
    path = "/get_entity",
    tag = "vectordb",
    request_body = GetEntityRequest,
    responses(
        (status = 200, description = "Matching entity, or empty", body = Vec<Entity>),
        (status = 422, description = "Malformed request body", body = axum_helpers::ErrorResponse),
        (status = 500, description = "Lookup failed", body = axum_helpers::ErrorResponse)
    )
)]
pub async fn get_entity<I: VectorIndex>(
    State(service): State<Arc<SearchService<I>>>,
    ValidatedJson(request): ValidatedJson<GetEntityRequest>,
) -> VectorResult<Json<Vec<Entity>>> {
    let entity = service
        .get_entity(request.id)
        .await
        .inspect_err(|e| error!(entity_id = request.id, "get_entity failed: {}", e))?;
    Ok(Json(entity.into_iter().collect()))
}

/// Semantic search over the configured collection
#[utoipa::path(
    post,
    path = "/search_doc",
    tag = "vectordb",
    request_body = SearchQuery,
    responses(
        (status = 200, description = "Nearest matches", body = SearchResponse),
        (status = 400, description = "Invalid query or top_k", body = axum_helpers::ErrorResponse),
        (status = 500, description = "Embedding or search failed", body = axum_helpers::ErrorResponse)
    )
)]
pub async fn search_doc<I: VectorIndex>(
    State(service): State<Arc<SearchService<I>>>,
    ValidatedJson(query): ValidatedJson<SearchQuery>,
) -> VectorResult<Json<SearchResponse>> {
    let responses = service.search(&query).await.inspect_err(|e| {
        error!(
            query = %query.query,
            top_k = query.top_k,
            "search_doc failed: {}",
            e
        )
    })?;
    Ok(Json(SearchResponse { responses }))
}

// ===== Router =====

#[derive(OpenApi)]
#[openapi(
    paths(health, list_collections, collection_dimension, get_entity, search_doc),
    components(schemas(
        HealthResponse,
        CollectionsResponse,
        GetEntityRequest,
        SearchResponse,
        SearchQuery,
        SearchHit,
        Entity,
        CollectionStats,
    )),
    tags((name = "vectordb", description = "Semantic search over the data dictionary"))
)]
pub struct VectorApiDoc;

/// Routes with state applied, ready to nest under `/vectordb`.
pub fn router<I: VectorIndex + 'static>(service: Arc<SearchService<I>>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/collections", get(list_collections::<I>))
        .route("/collection_dimension", get(collection_dimension::<I>))
        .route("/get_entity", post(get_entity::<I>))
        .route("/search_doc", post(search_doc::<I>))
        .with_state(service)
}
