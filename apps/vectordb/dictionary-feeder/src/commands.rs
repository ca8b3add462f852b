//! Ingest and search commands

use domain_vector::retry::{RetryConfig, retry_with_backoff};
use domain_vector::{
    DocumentSource, EmbeddingProvider, FsDocumentSource, GcsConfig, GcsDocumentSource,
    IndexParams, IndexType, IngestOptions, IngestReport, IngestionPipeline, MemoryIndex,
    MetricType, MilvusIndex, OpenAIProvider, SearchHit, SearchQuery, SearchService, VectorError,
    VectorIndex,
};
use eyre::WrapErr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::config::Config;

/// Where documents are read from
#[derive(Debug, Clone)]
pub enum Source {
    Dir(PathBuf),
    Gcs { bucket: String, prefix: String },
}

#[derive(Debug, Clone)]
pub struct IngestPlan {
    pub source: Source,
    pub collection: String,
    pub metric: MetricType,
    pub index_type: IndexType,
    pub nlist: Option<u32>,
    pub batch_size: usize,
    /// Query run against the fresh collection; `None` skips the check
    pub smoke_query: Option<SearchQuery>,
    /// Load into an in-memory index instead of Milvus
    pub dry_run: bool,
}

impl IngestPlan {
    pub fn index_params(&self) -> IndexParams {
        let params = IndexParams::new(self.metric, self.index_type);
        match self.nlist {
            Some(nlist) => params.with_nlist(nlist),
            None => params,
        }
    }
}

fn document_source(config: &Config, source: &Source) -> eyre::Result<Box<dyn DocumentSource>> {
    let source: Box<dyn DocumentSource> = match source {
        Source::Dir(dir) => Box::new(FsDocumentSource::new(dir.clone())),
        Source::Gcs { bucket, prefix } => {
            let mut gcs = GcsConfig::new(bucket.clone(), prefix.clone())
                .with_access_token(config.gcs_access_token.clone());
            if let Some(endpoint) = &config.gcs_endpoint {
                gcs = gcs.with_endpoint(endpoint.clone());
            }
            Box::new(GcsDocumentSource::new(gcs)?)
        }
    };
    Ok(source)
}

/// Milvus client, checked with a retried round trip.
pub async fn connect_milvus(config: &Config) -> eyre::Result<MilvusIndex> {
    let milvus = &config.vectordb.milvus;
    info!(uri = %milvus.uri, database = %milvus.database, "Connecting to Milvus");

    let index = MilvusIndex::new(milvus.clone())?;
    let collections = retry_with_backoff(
        || index.list_collections(),
        &RetryConfig::default(),
        VectorError::is_transient,
    )
    .await
    .wrap_err_with(|| format!("Milvus at {} is unreachable", milvus.uri))?;

    info!(?collections, "Connected to Milvus");
    Ok(index)
}

fn embedder(config: &Config) -> eyre::Result<Arc<dyn EmbeddingProvider>> {
    Ok(Arc::new(OpenAIProvider::new(config.vectordb.openai.clone())?))
}

pub async fn ingest(config: &Config, plan: &IngestPlan) -> eyre::Result<IngestReport> {
    let documents = document_source(config, &plan.source)?
        .fetch()
        .await
        .wrap_err("Failed to load data dictionaries")?;
    info!(documents = documents.len(), "Loaded data dictionaries");

    let embedder = embedder(config)?;

    if plan.dry_run {
        info!("Dry run: loading into an in-memory index");
        run_ingest(Arc::new(MemoryIndex::new()), embedder, plan, &documents).await
    } else {
        let index = connect_milvus(config).await?;
        run_ingest(Arc::new(index), embedder, plan, &documents).await
    }
}

async fn run_ingest<I: VectorIndex + 'static>(
    index: Arc<I>,
    embedder: Arc<dyn EmbeddingProvider>,
    plan: &IngestPlan,
    documents: &[domain_vector::DataDictionaryDocument],
) -> eyre::Result<IngestReport> {
    let options = IngestOptions::new(plan.collection.clone())
        .with_index_params(plan.index_params())
        .with_batch_size(plan.batch_size);

    let report = IngestionPipeline::new(index.clone(), embedder.clone(), options)
        .ingest(documents)
        .await
        .wrap_err_with(|| format!("Ingestion into {} failed", plan.collection))?;

    info!(
        collection = %report.collection,
        entities = report.entities_written,
        "Collection loaded"
    );

    if let Some(query) = &plan.smoke_query {
        let service = SearchService::new(index, embedder, plan.collection.clone())
            .with_metric(plan.metric);
        let hits = service
            .search(query)
            .await
            .wrap_err("Smoke search against the new collection failed")?;
        print_hits(&hits)?;
    }

    Ok(report)
}

pub async fn search(config: &Config, collection: &str, query: &SearchQuery) -> eyre::Result<()> {
    let index = connect_milvus(config).await?;
    let service = SearchService::new(Arc::new(index), embedder(config)?, collection)
        .with_metric(config.vectordb.metric);

    let hits = service.search(query).await?;
    print_hits(&hits)?;
    service.close().await;
    Ok(())
}

fn print_hits(hits: &[SearchHit]) -> eyre::Result<()> {
    println!("{}", serde_json::to_string_pretty(hits)?);
    Ok(())
}
