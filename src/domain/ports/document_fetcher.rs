//! Remote document fetch port.

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::errors::FetchError;

/// Fetches remote documents from the document host.
///
/// Implementations perform a GET with a bounded timeout and no automatic
/// retries; retry policy, if any, belongs to the caller.
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    /// GET `url` and parse the body as JSON.
    async fn fetch_json(&self, url: &str) -> Result<Value, FetchError>;

    /// GET `url` and return the body as plain text (prompt-only endpoints).
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError>;
}
