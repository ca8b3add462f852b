//! Configuration for the dictionary feeder

use core_config::{Environment, FromEnv, env_optional};
use domain_vector::VectorDbSettings;

#[derive(Clone, Debug)]
pub struct Config {
    pub environment: Environment,
    pub log_level: Option<String>,
    /// Same Milvus / OpenAI settings the API reads
    pub vectordb: VectorDbSettings,
    /// OAuth2 token for the GCS source; public buckets need none
    pub gcs_access_token: Option<String>,
    /// Alternative GCS endpoint (emulators)
    pub gcs_endpoint: Option<String>,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        Ok(Self {
            environment: Environment::from_env(),
            log_level: env_optional("LOG_LEVEL"),
            vectordb: VectorDbSettings::from_env()?,
            gcs_access_token: env_optional("GCS_ACCESS_TOKEN"),
            gcs_endpoint: env_optional("GCS_ENDPOINT"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gcs_settings_are_optional() {
        temp_env::with_vars(
            [
                ("MILVUS_CLIENT_URL", Some("http://localhost:19530")),
                ("MILVUS_CLIENT_DATABASE", Some("default")),
                ("MILVUS_CLIENT_COLLECTION", Some("data_dictionary_columns")),
                ("OPENAI_API_KEY", Some("sk-test")),
                ("OPENAI_BASE_URL", Some("https://api.openai.com/v1")),
                ("GCS_ACCESS_TOKEN", Some("")),
                ("GCS_ENDPOINT", None),
            ],
            || {
                let config = Config::from_env().unwrap();
                assert!(config.gcs_access_token.is_none());
                assert!(config.gcs_endpoint.is_none());
                assert_eq!(config.vectordb.collection, "data_dictionary_columns");
            },
        );
    }

    #[test]
    fn test_missing_openai_key_is_reported() {
        temp_env::with_vars(
            [
                ("MILVUS_CLIENT_URL", Some("http://localhost:19530")),
                ("MILVUS_CLIENT_DATABASE", Some("default")),
                ("MILVUS_CLIENT_COLLECTION", Some("data_dictionary_columns")),
                ("OPENAI_API_KEY", None),
                ("OPENAI_BASE_URL", Some("https://api.openai.com/v1")),
            ],
            || {
                let err = Config::from_env().unwrap_err();
                assert!(err.to_string().contains("OPENAI_API_KEY"));
            },
        );
    }
}
