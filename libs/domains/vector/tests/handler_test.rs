//! HTTP-level tests for the vectordb router, backed by the in-memory index.

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use domain_vector::{
    CollectionSchema, IndexParams, MemoryIndex, MockEmbeddingProvider, SearchService, VectorError,
    VectorIndex, models::NewEntity, router,
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

const COLLECTION: &str = "data_dictionary";

/// Three unit vectors; "order" queries point at entity 0.
async fn seeded_index() -> MemoryIndex {
    let index = MemoryIndex::new();
    index
        .create_collection(COLLECTION, &CollectionSchema::new(2))
        .await
        .unwrap();
    index
        .create_index(COLLECTION, &IndexParams::default())
        .await
        .unwrap();
    index
        .insert(
            COLLECTION,
            vec![
                NewEntity {
                    id: 0,
                    vector: vec![1.0, 0.0],
                    text: "name: OrderNbr".into(),
                },
                NewEntity {
                    id: 1,
                    vector: vec![0.8, 0.6],
                    text: "name: OrderDate".into(),
                },
                NewEntity {
                    id: 2,
                    vector: vec![0.0, 1.0],
                    text: "name: CustomerName".into(),
                },
            ],
        )
        .await
        .unwrap();
    index.flush(COLLECTION).await.unwrap();
    index.load_collection(COLLECTION).await.unwrap();
    index
}

fn order_embedder() -> MockEmbeddingProvider {
    let mut embedder = MockEmbeddingProvider::new();
    embedder.expect_embed().returning(|_| Ok(vec![1.0, 0.0]));
    embedder
}

async fn app(embedder: MockEmbeddingProvider) -> Router {
    let service = SearchService::new(
        Arc::new(seeded_index().await),
        Arc::new(embedder),
        COLLECTION,
    );
    Router::new().nest("/vectordb", router(Arc::new(service)))
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health() {
    let (status, body) = send(
        app(MockEmbeddingProvider::new()).await,
        get("/vectordb/health"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "msg": "Hello from vectordb router" }));
}

#[tokio::test]
async fn test_search_doc_returns_ranked_hits() {
    let (status, body) = send(
        app(order_embedder()).await,
        post_json("/vectordb/search_doc", json!({ "query": "OrderNbr", "top_k": 2 })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let responses = body["responses"].as_array().unwrap();
    assert_eq!(responses.len(), 2);
    assert_eq!(responses[0]["id"], 0);
    assert_eq!(responses[0]["entity"]["text"], "name: OrderNbr");
    assert_eq!(responses[1]["id"], 1);

    let first = responses[0]["distance"].as_f64().unwrap();
    let second = responses[1]["distance"].as_f64().unwrap();
    assert!(first >= second);
}

#[tokio::test]
async fn test_search_doc_defaults_top_k() {
    let (status, body) = send(
        app(order_embedder()).await,
        post_json("/vectordb/search_doc", json!({ "query": "OrderNbr" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["responses"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_search_doc_rejects_out_of_range_top_k() {
    for top_k in [0, 11] {
        let mut embedder = MockEmbeddingProvider::new();
        embedder.expect_embed().never();

        let (status, body) = send(
            app(embedder).await,
            post_json(
                "/vectordb/search_doc",
                json!({ "query": "OrderNbr", "top_k": top_k }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST, "top_k {}", top_k);
        assert_eq!(body["error"], "VALIDATION_ERROR");
    }
}

#[tokio::test]
async fn test_search_doc_rejects_missing_query() {
    let (status, _) = send(
        app(MockEmbeddingProvider::new()).await,
        post_json("/vectordb/search_doc", json!({ "top_k": 3 })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_search_doc_provider_failure_is_500() {
    let mut embedder = MockEmbeddingProvider::new();
    embedder
        .expect_embed()
        .returning(|_| Err(VectorError::Connection("connection refused".into())));

    let (status, body) = send(
        app(embedder).await,
        post_json("/vectordb/search_doc", json!({ "query": "OrderNbr" })),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "EMBEDDING_FAILED");
    assert!(!body["message"].as_str().unwrap().contains("refused"));
}

#[tokio::test]
async fn test_get_entity_hit_and_miss() {
    let app = app(MockEmbeddingProvider::new()).await;

    let (status, body) = send(
        app.clone(),
        post_json("/vectordb/get_entity", json!({ "id": 2 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([{ "id": 2, "text": "name: CustomerName" }]));

    let (status, body) = send(app, post_json("/vectordb/get_entity", json!({ "id": 42 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_get_entity_on_missing_collection_is_500() {
    let service = SearchService::new(
        Arc::new(MemoryIndex::new()),
        Arc::new(MockEmbeddingProvider::new()),
        "absent",
    );
    let app = Router::new().nest("/vectordb", router(Arc::new(service)));

    let (status, body) = send(app, post_json("/vectordb/get_entity", json!({ "id": 1 }))).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "INDEX_UNAVAILABLE");
    assert_eq!(body["message"], "Vector index is unavailable");
    assert!(!body["message"].as_str().unwrap().contains("absent"));
}

#[tokio::test]
async fn test_get_entity_malformed_body_is_json_error() {
    let (status, body) = send(
        app(MockEmbeddingProvider::new()).await,
        post_json("/vectordb/get_entity", json!({ "id": "two" })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "JSON_EXTRACTION");
}

#[tokio::test]
async fn test_collections_and_stats() {
    let app = app(MockEmbeddingProvider::new()).await;

    let (status, body) = send(app.clone(), get("/vectordb/collections")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "collections": [COLLECTION] }));

    let (status, body) = send(app, get("/vectordb/collection_dimension")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "row_count": 3 }));
}

#[tokio::test]
async fn test_stats_for_missing_collection_is_500() {
    let service = SearchService::new(
        Arc::new(MemoryIndex::new()),
        Arc::new(MockEmbeddingProvider::new()),
        "absent",
    );
    let app = Router::new().nest("/vectordb", router(Arc::new(service)));

    let (status, body) = send(app, get("/vectordb/collection_dimension")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "INDEX_UNAVAILABLE");
}
