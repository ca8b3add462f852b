//! Where data-dictionary documents come from: a local directory or a GCS
//! bucket prefix.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

use super::dictionary::{DataDictionaryDocument, parse_documents};
use crate::error::{VectorError, VectorResult};

#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Load every document the source holds.
    async fn fetch(&self) -> VectorResult<Vec<DataDictionaryDocument>>;
}

// ===== Local directory =====

/// Every `*.json` file directly under `dir`, read in path order.
pub struct FsDocumentSource {
    dir: PathBuf,
}

impl FsDocumentSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl DocumentSource for FsDocumentSource {
    async fn fetch(&self) -> VectorResult<Vec<DataDictionaryDocument>> {
        let mut entries = tokio::fs::read_dir(&self.dir).await.map_err(|e| {
            VectorError::Config(format!("Cannot read {}: {}", self.dir.display(), e))
        })?;

        let mut paths = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| VectorError::Internal(e.to_string()))?
        {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut documents = Vec::new();
        for path in &paths {
            let bytes = tokio::fs::read(path).await.map_err(|e| {
                VectorError::Internal(format!("Cannot read {}: {}", path.display(), e))
            })?;
            let parsed = parse_documents(&bytes).map_err(|e| {
                VectorError::Validation(format!("{}: {}", path.display(), e))
            })?;
            documents.extend(parsed);
        }

        info!(
            dir = %self.dir.display(),
            files = paths.len(),
            documents = documents.len(),
            "Loaded data dictionaries"
        );
        Ok(documents)
    }
}

// ===== Google Cloud Storage =====

pub const GCS_ENDPOINT: &str = "https://storage.googleapis.com";

#[derive(Debug, Clone)]
pub struct GcsConfig {
    pub bucket: String,
    pub prefix: String,
    /// OAuth2 access token; public buckets need none
    pub access_token: Option<String>,
    pub endpoint: String,
    pub timeout: Duration,
}

impl GcsConfig {
    pub fn new(bucket: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            prefix: prefix.into(),
            access_token: None,
            endpoint: GCS_ENDPOINT.to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_access_token(mut self, token: Option<String>) -> Self {
        self.access_token = token.filter(|t| !t.is_empty());
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectList {
    #[serde(default)]
    items: Vec<ObjectItem>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ObjectItem {
    name: String,
}

/// Documents stored as objects under a bucket prefix (GCS JSON API).
///
/// Listing failures are fatal. An object that cannot be downloaded or parsed
/// is logged and skipped.
pub struct GcsDocumentSource {
    client: Client,
    config: GcsConfig,
}

impl GcsDocumentSource {
    pub fn new(config: GcsConfig) -> VectorResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| VectorError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn list_objects(&self) -> VectorResult<Vec<String>> {
        let url = format!("{}/storage/v1/b/{}/o", self.config.endpoint, self.config.bucket);
        let mut names = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = vec![("prefix", self.config.prefix.clone())];
            if let Some(token) = &page_token {
                query.push(("pageToken", token.clone()));
            }

            let response = self
                .authorized(self.client.get(&url).query(&query))
                .send()
                .await?;

            if !response.status().is_success() {
                let status = response.status();
                let message = response.text().await.unwrap_or_default();
                return Err(VectorError::Upstream {
                    status: status.as_u16(),
                    message,
                });
            }

            let page: ObjectList = response.json().await?;
            names.extend(
                page.items
                    .into_iter()
                    .map(|item| item.name)
                    .filter(|name| !name.ends_with('/')),
            );

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(names)
    }

    async fn download(&self, name: &str) -> VectorResult<Vec<DataDictionaryDocument>> {
        let url = format!(
            "{}/storage/v1/b/{}/o/{}",
            self.config.endpoint,
            self.config.bucket,
            urlencoding::encode(name)
        );

        let response = self
            .authorized(self.client.get(&url).query(&[("alt", "media")]))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(VectorError::Upstream {
                status: status.as_u16(),
                message: format!("download of {} failed", name),
            });
        }

        let bytes = response.bytes().await?;
        parse_documents(&bytes)
    }
}

#[async_trait]
impl DocumentSource for GcsDocumentSource {
    async fn fetch(&self) -> VectorResult<Vec<DataDictionaryDocument>> {
        let names = self.list_objects().await?;
        info!(
            bucket = %self.config.bucket,
            prefix = %self.config.prefix,
            objects = names.len(),
            "Listed data dictionary objects"
        );

        let mut documents = Vec::new();
        for name in &names {
            match self.download(name).await {
                Ok(parsed) => documents.extend(parsed),
                Err(e) => warn!(object = %name, "Skipping object: {}", e),
            }
        }

        Ok(documents)
    }
}
