use std::sync::Arc;

use tracing::{error, info, instrument, warn};

use super::dictionary::DataDictionaryDocument;
use super::flatten::column_blocks;
use crate::embedding::EmbeddingProvider;
use crate::error::{VectorError, VectorResult};
use crate::models::{
    CollectionSchema, EmbeddedBlock, IndexParams, IngestReport, NewEntity, TextBlock,
};
use crate::repository::VectorIndex;

pub const DEFAULT_BATCH_SIZE: usize = 64;

#[derive(Debug, Clone)]
pub struct IngestOptions {
    /// Collection to create; must not exist yet
    pub collection: String,
    pub index_params: IndexParams,
    /// Blocks per embedding request and per insert request
    pub batch_size: usize,
}

impl IngestOptions {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            index_params: IndexParams::default(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_index_params(mut self, params: IndexParams) -> Self {
        self.index_params = params;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }
}

/// Documents → column blocks → embeddings → a freshly created, indexed and
/// loaded collection.
///
/// All or nothing: when any step after collection creation fails, the
/// collection is dropped again.
pub struct IngestionPipeline<I: VectorIndex> {
    index: Arc<I>,
    embedder: Arc<dyn EmbeddingProvider>,
    options: IngestOptions,
}

impl<I: VectorIndex> IngestionPipeline<I> {
    pub fn new(
        index: Arc<I>,
        embedder: Arc<dyn EmbeddingProvider>,
        options: IngestOptions,
    ) -> Self {
        Self {
            index,
            embedder,
            options,
        }
    }

    pub fn options(&self) -> &IngestOptions {
        &self.options
    }

    /// Embed blocks batch by batch, pairing each block with its vector.
    pub async fn embed_blocks(&self, blocks: Vec<TextBlock>) -> VectorResult<Vec<EmbeddedBlock>> {
        let dimension = self.embedder.dimension();
        let mut embedded = Vec::with_capacity(blocks.len());

        for batch in blocks.chunks(self.options.batch_size) {
            let texts: Vec<String> = batch.iter().map(|b| b.text.clone()).collect();
            let vectors = self.embedder.embed_batch(&texts).await?;

            if vectors.len() != batch.len() {
                return Err(VectorError::Embedding(format!(
                    "Requested {} embeddings, received {}",
                    batch.len(),
                    vectors.len()
                )));
            }

            for (block, vector) in batch.iter().zip(vectors) {
                if vector.len() != dimension {
                    return Err(VectorError::Embedding(format!(
                        "Block {} embedded with dimension {}, expected {}",
                        block.id,
                        vector.len(),
                        dimension
                    )));
                }
                embedded.push(EmbeddedBlock {
                    block: block.clone(),
                    vector,
                });
            }

            info!(embedded = embedded.len(), total = blocks.len(), "Embedded batch");
        }

        Ok(embedded)
    }

    #[instrument(skip(self, documents), fields(collection = %self.options.collection, documents = documents.len()))]
    pub async fn ingest(&self, documents: &[DataDictionaryDocument]) -> VectorResult<IngestReport> {
        let collection = &self.options.collection;

        let blocks = column_blocks(documents);
        if blocks.is_empty() {
            return Err(VectorError::Validation(
                "Documents contain no columns to ingest".to_string(),
            ));
        }
        info!(blocks = blocks.len(), "Flattened data dictionaries");

        // Fail before spending embedding calls.
        if self.index.has_collection(collection).await? {
            return Err(VectorError::AlreadyExists(collection.clone()));
        }

        let embedded = self.embed_blocks(blocks).await?;

        self.index
            .create_collection(collection, &CollectionSchema::new(self.embedder.dimension()))
            .await?;

        match self.load(embedded).await {
            Ok(entities_written) => {
                info!(entities_written, "Ingestion complete");
                Ok(IngestReport {
                    collection: collection.clone(),
                    entities_written,
                })
            }
            Err(e) => {
                error!("Ingestion failed, dropping collection: {}", e);
                if let Err(drop_err) = self.index.drop_collection(collection).await {
                    warn!("Failed to drop partially loaded collection: {}", drop_err);
                }
                Err(e)
            }
        }
    }

    async fn load(&self, embedded: Vec<EmbeddedBlock>) -> VectorResult<u64> {
        let collection = &self.options.collection;

        self.index
            .create_index(collection, &self.options.index_params)
            .await?;

        let entities: Vec<NewEntity> = embedded.into_iter().map(NewEntity::from).collect();
        let mut written = 0;
        for batch in entities.chunks(self.options.batch_size) {
            written += self.index.insert(collection, batch.to_vec()).await?;
        }

        self.index.flush(collection).await?;
        self.index.load_collection(collection).await?;
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::MockEmbeddingProvider;
    use crate::ingest::dictionary::ColumnDescriptor;
    use crate::memory::MemoryIndex;
    use crate::models::{ID_FIELD, TEXT_FIELD};
    use crate::repository::MockVectorIndex;

    const COLLECTION: &str = "data_dictionary_columns";

    fn document(table: &str, columns: &[&str]) -> DataDictionaryDocument {
        DataDictionaryDocument {
            catalog: "sales".into(),
            schema: "silver".into(),
            table: table.into(),
            columns: columns
                .iter()
                .map(|name| ColumnDescriptor {
                    column_name: name.to_string(),
                    column_type: "string".into(),
                    description: None,
                    number_of_rows: 1,
                    null_rows: 0,
                    distinct_rows: 1,
                    examples: vec![],
                })
                .collect(),
        }
    }

    /// First component carries the text length.
    fn embedder(dimension: usize) -> MockEmbeddingProvider {
        let mut embedder = MockEmbeddingProvider::new();
        embedder.expect_dimension().return_const(dimension);
        embedder.expect_embed_batch().returning(move |texts| {
            Ok(texts
                .iter()
                .map(|t| {
                    let mut v = vec![0.0; dimension];
                    v[0] = t.len() as f32;
                    v
                })
                .collect())
        });
        embedder
    }

    fn pipeline(
        index: Arc<MemoryIndex>,
        embedder: MockEmbeddingProvider,
        batch_size: usize,
    ) -> IngestionPipeline<MemoryIndex> {
        IngestionPipeline::new(
            index,
            Arc::new(embedder),
            IngestOptions::new(COLLECTION).with_batch_size(batch_size),
        )
    }

    #[tokio::test]
    async fn test_two_documents_five_blocks() {
        let index = Arc::new(MemoryIndex::new());
        let docs = vec![
            document("orders", &["a", "b", "c"]),
            document("customers", &["d", "e"]),
        ];

        let report = pipeline(index.clone(), embedder(4), 2)
            .ingest(&docs)
            .await
            .unwrap();

        assert_eq!(report.collection, COLLECTION);
        assert_eq!(report.entities_written, 5);
        assert_eq!(index.collection_stats(COLLECTION).await.unwrap().row_count, 5);

        let rows = index
            .get(COLLECTION, &[0, 1, 2, 3, 4], &[TEXT_FIELD.to_string()])
            .await
            .unwrap();
        let names: Vec<String> = rows
            .iter()
            .map(|r| {
                assert!(r[ID_FIELD].is_i64());
                r[TEXT_FIELD].as_str().unwrap().lines().next().unwrap().to_string()
            })
            .collect();
        assert_eq!(
            names,
            vec!["name: a", "name: b", "name: c", "name: d", "name: e"]
        );
    }

    #[tokio::test]
    async fn test_existing_collection_fails_without_embedding() {
        let index = Arc::new(MemoryIndex::new());
        index
            .create_collection(COLLECTION, &CollectionSchema::new(4))
            .await
            .unwrap();

        let mut embedder = MockEmbeddingProvider::new();
        embedder.expect_embed_batch().never();

        let err = pipeline(index, embedder, 64)
            .ingest(&[document("orders", &["a"])])
            .await
            .unwrap_err();
        assert!(matches!(err, VectorError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn test_failed_insert_drops_collection() {
        let mut index = MockVectorIndex::new();
        index.expect_has_collection().returning(|_| Ok(false));
        index.expect_create_collection().times(1).returning(|_, _| Ok(()));
        index.expect_create_index().times(1).returning(|_, _| Ok(()));
        index
            .expect_insert()
            .returning(|_, _| Err(VectorError::Connection("connection reset".into())));
        index.expect_flush().never();
        index
            .expect_drop_collection()
            .withf(|collection| collection == COLLECTION)
            .times(1)
            .returning(|_| Ok(()));

        let pipeline = IngestionPipeline::new(
            Arc::new(index),
            Arc::new(embedder(4)),
            IngestOptions::new(COLLECTION),
        );

        let err = pipeline
            .ingest(&[document("orders", &["a", "b"])])
            .await
            .unwrap_err();
        assert!(matches!(err, VectorError::Connection(_)));
    }

    #[tokio::test]
    async fn test_count_mismatch_aborts_before_create() {
        let index = Arc::new(MemoryIndex::new());
        let mut embedder = MockEmbeddingProvider::new();
        embedder.expect_dimension().return_const(4usize);
        embedder
            .expect_embed_batch()
            .returning(|_| Ok(vec![vec![0.0; 4]]));

        let err = pipeline(index.clone(), embedder, 64)
            .ingest(&[document("orders", &["a", "b"])])
            .await
            .unwrap_err();

        assert!(matches!(err, VectorError::Embedding(_)));
        assert!(index.list_collections().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_documents_rejected() {
        let index = Arc::new(MemoryIndex::new());
        let err = pipeline(index, MockEmbeddingProvider::new(), 64)
            .ingest(&[document("orders", &[])])
            .await
            .unwrap_err();
        assert!(matches!(err, VectorError::Validation(_)));
    }
}
