//! HTTP document fetcher backed by reqwest.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use serde_json::Value;
use tracing::{debug, warn};

use crate::domain::errors::FetchError;
use crate::domain::ports::DocumentFetcher;

/// Configuration for the HTTP fetcher.
#[derive(Debug, Clone)]
pub struct HttpFetcherConfig {
    /// Per-request timeout. Registry and config documents are small; a
    /// slow host must not stall resolution past this bound.
    pub timeout: Duration,
}

impl Default for HttpFetcherConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
        }
    }
}

/// Fetches remote JSON/text documents with a bounded timeout.
///
/// The underlying reqwest client is built once and reused for connection
/// pooling. No retries happen here; the resolver and its callers own
/// retry policy.
pub struct HttpDocumentFetcher {
    http_client: ReqwestClient,
}

impl HttpDocumentFetcher {
    pub fn new() -> Result<Self> {
        Self::with_config(HttpFetcherConfig::default())
    }

    pub fn with_config(config: HttpFetcherConfig) -> Result<Self> {
        let http_client = ReqwestClient::builder()
            .timeout(config.timeout)
            .pool_max_idle_per_host(10)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { http_client })
    }

    async fn get_body(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|err| FetchError::Network {
                url: url.to_string(),
                message: err.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(url, status = status.as_u16(), "document fetch returned non-success status");
            return Err(FetchError::Http {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|err| FetchError::Network {
            url: url.to_string(),
            message: err.to_string(),
        })
    }
}

#[async_trait]
impl DocumentFetcher for HttpDocumentFetcher {
    async fn fetch_json(&self, url: &str) -> Result<Value, FetchError> {
        let body = self.get_body(url).await?;
        debug!(url, bytes = body.len(), "fetched JSON document");
        serde_json::from_str(&body).map_err(|err| FetchError::Parse {
            url: url.to_string(),
            message: err.to_string(),
        })
    }

    async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        let body = self.get_body(url).await?;
        debug!(url, bytes = body.len(), "fetched text document");
        Ok(body)
    }
}
