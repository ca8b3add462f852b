//! Environment-sourced settings shared by the API server and the feeder.

use core_config::{
    ConfigError, FromEnv, env_optional, env_or_default, env_parse_or, env_required_all,
};
use std::time::Duration;

use crate::embedding::{DEFAULT_DIMENSION, DEFAULT_MODEL, OpenAIConfig};
use crate::milvus::MilvusConfig;
use crate::models::MetricType;

pub const MILVUS_CLIENT_URL: &str = "MILVUS_CLIENT_URL";
pub const MILVUS_CLIENT_DATABASE: &str = "MILVUS_CLIENT_DATABASE";
pub const MILVUS_CLIENT_COLLECTION: &str = "MILVUS_CLIENT_COLLECTION";
pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const OPENAI_BASE_URL: &str = "OPENAI_BASE_URL";

const REQUIRED: [&str; 5] = [
    MILVUS_CLIENT_URL,
    MILVUS_CLIENT_DATABASE,
    MILVUS_CLIENT_COLLECTION,
    OPENAI_API_KEY,
    OPENAI_BASE_URL,
];

/// Vector index and embedding provider settings
#[derive(Clone, Debug)]
pub struct VectorDbSettings {
    pub milvus: MilvusConfig,
    pub openai: OpenAIConfig,
    /// Collection searched by the API
    pub collection: String,
    /// Metric the collection's index was built with
    pub metric: MetricType,
}

impl FromEnv for VectorDbSettings {
    /// Required: `MILVUS_CLIENT_URL`, `MILVUS_CLIENT_DATABASE`,
    /// `MILVUS_CLIENT_COLLECTION`, `OPENAI_API_KEY`, `OPENAI_BASE_URL`.
    /// Every missing one is reported in a single error.
    fn from_env() -> Result<Self, ConfigError> {
        // Values come back in REQUIRED order.
        let mut values = env_required_all(&REQUIRED)?.into_iter();
        let mut next = || values.next().unwrap_or_default();
        let (uri, database, collection, api_key, base_url) =
            (next(), next(), next(), next(), next());

        let model = env_or_default("OPENAI_MODEL_LARGE", DEFAULT_MODEL);
        let dimension = env_parse_or("EMBEDDING_DIMENSION", DEFAULT_DIMENSION)?;
        if dimension == 0 {
            return Err(ConfigError::ParseError {
                key: "EMBEDDING_DIMENSION".to_string(),
                details: "must be positive".to_string(),
            });
        }

        let metric = env_parse_or("MILVUS_METRIC_TYPE", MetricType::default())?;
        let timeout = Duration::from_secs(env_parse_or("MILVUS_TIMEOUT_SECS", 30u64)?);

        Ok(Self {
            milvus: MilvusConfig::new(uri, database)
                .with_token(env_optional("MILVUS_TOKEN"))
                .with_timeout(timeout),
            openai: OpenAIConfig::new(api_key, base_url).with_model(model, dimension),
            collection,
            metric,
        })
    }
}
