//! Directory → ingestion → search, end to end against the in-memory index.

use domain_vector::{
    DocumentSource, FsDocumentSource, IngestOptions, IngestionPipeline, MemoryIndex,
    MockEmbeddingProvider, SearchQuery, SearchService, VectorIndex,
};
use serde_json::json;
use std::sync::Arc;

const COLLECTION: &str = "data_dictionary_columns";

fn keyword_vector(text: &str) -> Vec<f32> {
    if text.contains("OrderNbr") {
        vec![1.0, 0.0]
    } else {
        vec![0.0, 1.0]
    }
}

fn embedder() -> MockEmbeddingProvider {
    let mut embedder = MockEmbeddingProvider::new();
    embedder.expect_dimension().return_const(2usize);
    embedder
        .expect_embed_batch()
        .returning(|texts| Ok(texts.iter().map(|t| keyword_vector(t)).collect()));
    embedder.expect_embed().returning(|text| Ok(keyword_vector(text)));
    embedder
}

fn column(name: &str, description: &str) -> serde_json::Value {
    json!({
        "column_name": name,
        "column_type": "bigint",
        "description": description,
        "number_of_rows": 100,
        "null_rows": 0,
        "distinct_rows": 100,
        "examples": [1, 2]
    })
}

#[tokio::test]
async fn test_ingest_directory_then_search() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("orders.json"),
        json!({
            "catalog": "sales",
            "schema": "silver",
            "table": "orders",
            "columns": [
                column("OrderNbr", "Order number"),
                column("OrderDate", "Date of the order"),
                column("Amount", "Order amount"),
            ]
        })
        .to_string(),
    )
    .unwrap();
    std::fs::write(
        dir.path().join("customers.json"),
        json!([{
            "catalog": "sales",
            "schema": "silver",
            "table": "customers",
            "columns": [
                column("CustomerId", "Customer key"),
                column("Name", "Customer name"),
            ]
        }])
        .to_string(),
    )
    .unwrap();

    let documents = FsDocumentSource::new(dir.path()).fetch().await.unwrap();
    assert_eq!(documents.len(), 2);

    let index = Arc::new(MemoryIndex::new());
    let embedder = Arc::new(embedder());

    let report = IngestionPipeline::new(
        index.clone(),
        embedder.clone(),
        IngestOptions::new(COLLECTION).with_batch_size(2),
    )
    .ingest(&documents)
    .await
    .unwrap();
    assert_eq!(report.entities_written, 5);

    let service = SearchService::new(index.clone(), embedder, COLLECTION);
    let hits = service
        .search(&SearchQuery::new("OrderNbr").with_top_k(2))
        .await
        .unwrap();

    assert_eq!(hits.len(), 2);
    let text = hits[0].text().unwrap();
    assert!(text.starts_with("name: OrderNbr"), "{}", text);
    assert!(text.contains("from table: sales.silver.orders"));
    assert!(hits[0].distance >= hits[1].distance);

    // A second run into the same collection is refused and leaves it intact.
    let err = IngestionPipeline::new(
        index.clone(),
        Arc::new(embedder_never()),
        IngestOptions::new(COLLECTION),
    )
    .ingest(&documents)
    .await
    .unwrap_err();
    assert!(matches!(err, domain_vector::VectorError::AlreadyExists(_)));
    assert_eq!(index.collection_stats(COLLECTION).await.unwrap().row_count, 5);
}

fn embedder_never() -> MockEmbeddingProvider {
    let mut embedder = MockEmbeddingProvider::new();
    embedder.expect_embed_batch().never();
    embedder
}
