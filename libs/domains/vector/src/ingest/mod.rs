//! Offline ingestion of data-dictionary documents into a new collection.

pub mod dictionary;
pub mod flatten;
pub mod pipeline;
pub mod source;

pub use dictionary::{ColumnDescriptor, DataDictionaryDocument, parse_documents};
pub use flatten::column_blocks;
pub use pipeline::{DEFAULT_BATCH_SIZE, IngestOptions, IngestionPipeline};
pub use source::{DocumentSource, FsDocumentSource, GcsConfig, GcsDocumentSource};
