use std::time::Duration;

/// Milvus REST connection configuration
#[derive(Clone)]
pub struct MilvusConfig {
    /// Server URI, e.g. `http://localhost:19530`
    pub uri: String,
    pub database: String,
    /// Bearer token (`user:password` or an API key)
    pub token: Option<String>,
    pub timeout: Duration,
}

impl MilvusConfig {
    pub fn new(uri: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            uri: uri.into().trim_end_matches('/').to_string(),
            database: database.into(),
            token: None,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.is_empty());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl std::fmt::Debug for MilvusConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MilvusConfig")
            .field("uri", &self.uri)
            .field("database", &self.database)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Default for MilvusConfig {
    fn default() -> Self {
        Self::new("http://localhost:19530", "default")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uri_trailing_slash_trimmed() {
        let config = MilvusConfig::new("http://milvus:19530/", "db");
        assert_eq!(config.uri, "http://milvus:19530");
    }

    #[test]
    fn test_empty_token_is_none() {
        let config = MilvusConfig::default().with_token(Some(String::new()));
        assert!(config.token.is_none());

        let config = MilvusConfig::default().with_token(Some("root:Milvus".into()));
        assert_eq!(config.token.as_deref(), Some("root:Milvus"));
        assert!(!format!("{:?}", config).contains("root:Milvus"));
    }
}
