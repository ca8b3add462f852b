use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

/// Primary key field of every collection
pub const ID_FIELD: &str = "id";
/// Float vector field searched by ANN queries
pub const VECTOR_FIELD: &str = "embeddings";
/// Raw text stored alongside the vector
pub const TEXT_FIELD: &str = "text";
/// Maximum VARCHAR length of [`TEXT_FIELD`]
pub const TEXT_MAX_LENGTH: u32 = 65535;
/// Name given to the single vector index
pub const VECTOR_INDEX_NAME: &str = "vector_index";

pub const DEFAULT_TOP_K: u32 = 3;
pub const MAX_TOP_K: u32 = 10;
pub const DEFAULT_NPROBE: u32 = 10;
pub const DEFAULT_NLIST: u32 = 128;

/// Similarity metric of a collection's vector index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
pub enum MetricType {
    #[default]
    #[serde(rename = "COSINE")]
    Cosine,
    #[serde(rename = "IP")]
    Ip,
    #[serde(rename = "L2")]
    L2,
}

impl MetricType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricType::Cosine => "COSINE",
            MetricType::Ip => "IP",
            MetricType::L2 => "L2",
        }
    }

    /// COSINE and IP report similarity (larger is closer); L2 reports a
    /// distance (smaller is closer).
    pub fn higher_is_closer(&self) -> bool {
        matches!(self, MetricType::Cosine | MetricType::Ip)
    }

    /// Whether `a` ranks at least as close as `b`.
    pub fn ranks_before(&self, a: f32, b: f32) -> bool {
        if self.higher_is_closer() { a >= b } else { a <= b }
    }

    /// Whether the distances follow this metric's ordering convention.
    pub fn is_ordered(&self, distances: &[f32]) -> bool {
        distances.windows(2).all(|w| self.ranks_before(w[0], w[1]))
    }
}

impl fmt::Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "COSINE" => Ok(MetricType::Cosine),
            "IP" => Ok(MetricType::Ip),
            "L2" => Ok(MetricType::L2),
            other => Err(format!(
                "unknown metric type '{}', expected COSINE, IP or L2",
                other
            )),
        }
    }
}

/// Vector index algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
pub enum IndexType {
    #[default]
    #[serde(rename = "IVF_FLAT")]
    IvfFlat,
    #[serde(rename = "FLAT")]
    Flat,
    #[serde(rename = "HNSW")]
    Hnsw,
}

impl IndexType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexType::IvfFlat => "IVF_FLAT",
            IndexType::Flat => "FLAT",
            IndexType::Hnsw => "HNSW",
        }
    }
}

impl fmt::Display for IndexType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IndexType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "IVF_FLAT" => Ok(IndexType::IvfFlat),
            "FLAT" => Ok(IndexType::Flat),
            "HNSW" => Ok(IndexType::Hnsw),
            other => Err(format!(
                "unknown index type '{}', expected IVF_FLAT, FLAT or HNSW",
                other
            )),
        }
    }
}

/// Build parameters for the vector index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexParams {
    pub metric_type: MetricType,
    pub index_type: IndexType,
    /// Engine-specific build parameters (e.g. `{"nlist": 128}`)
    pub params: serde_json::Map<String, serde_json::Value>,
}

impl IndexParams {
    /// Index with the default build parameters for `index_type`.
    pub fn new(metric_type: MetricType, index_type: IndexType) -> Self {
        let mut params = serde_json::Map::new();
        match index_type {
            IndexType::IvfFlat => {
                params.insert("nlist".into(), DEFAULT_NLIST.into());
            }
            IndexType::Hnsw => {
                params.insert("M".into(), 16.into());
                params.insert("efConstruction".into(), 200.into());
            }
            IndexType::Flat => {}
        }
        Self {
            metric_type,
            index_type,
            params,
        }
    }

    pub fn with_nlist(mut self, nlist: u32) -> Self {
        self.params.insert("nlist".into(), nlist.into());
        self
    }
}

impl Default for IndexParams {
    fn default() -> Self {
        Self::new(MetricType::default(), IndexType::default())
    }
}

/// Per-query search parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchParams {
    pub metric_type: MetricType,
    pub nprobe: u32,
}

impl SearchParams {
    pub fn new(metric_type: MetricType, nprobe: u32) -> Self {
        Self {
            metric_type,
            nprobe,
        }
    }
}

/// Schema of a collection: `id` INT64 primary key, `embeddings`
/// FLOAT_VECTOR(dimension), `text` VARCHAR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionSchema {
    pub dimension: usize,
}

impl CollectionSchema {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
pub struct CollectionStats {
    /// Number of entities in the collection
    pub row_count: u64,
}

/// A stored entity as returned by point lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Entity {
    pub id: i64,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector: Option<Vec<f32>>,
}

/// An entity to be inserted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEntity {
    pub id: i64,
    pub vector: Vec<f32>,
    pub text: String,
}

impl From<EmbeddedBlock> for NewEntity {
    fn from(embedded: EmbeddedBlock) -> Self {
        Self {
            id: embedded.block.id,
            vector: embedded.vector,
            text: embedded.block.text,
        }
    }
}

/// One nearest-neighbour match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SearchHit {
    pub id: i64,
    /// Similarity or distance, per the collection's metric
    pub distance: f32,
    /// Requested output fields (`text`)
    pub entity: BTreeMap<String, String>,
}

impl SearchHit {
    pub fn text(&self) -> Option<&str> {
        self.entity.get(TEXT_FIELD).map(String::as_str)
    }
}

/// Semantic search request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct SearchQuery {
    /// Free text to search for
    #[validate(custom(function = "non_blank"))]
    pub query: String,
    /// Maximum number of matches (1..=10)
    #[serde(default = "default_top_k")]
    #[validate(range(min = 1, max = 10))]
    #[schema(default = 3, minimum = 1, maximum = 10)]
    pub top_k: u32,
    /// IVF partitions to probe
    #[serde(default = "default_nprobe")]
    #[validate(range(min = 1))]
    #[schema(default = 10, minimum = 1)]
    pub nprobe: u32,
}

impl SearchQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            top_k: DEFAULT_TOP_K,
            nprobe: DEFAULT_NPROBE,
        }
    }

    pub fn with_top_k(mut self, top_k: u32) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_nprobe(mut self, nprobe: u32) -> Self {
        self.nprobe = nprobe;
        self
    }
}

fn default_top_k() -> u32 {
    DEFAULT_TOP_K
}

fn default_nprobe() -> u32 {
    DEFAULT_NPROBE
}

fn non_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("query must not be empty".into());
        return Err(err);
    }
    Ok(())
}

/// One flattened data-dictionary column ready to embed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextBlock {
    pub id: i64,
    pub text: String,
}

/// A block paired with its embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedBlock {
    pub block: TextBlock,
    pub vector: Vec<f32>,
}

/// Outcome of a completed ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    pub collection: String,
    pub entities_written: u64,
}
