/// Integration tests for the configuration resolution chain
///
/// These tests run the real HTTP fetcher and CSV registry against a mock
/// HTTP server and verify the full resolution order: cache, registry,
/// remote fetch, fallback.

use std::sync::Arc;

use chrono::{Duration, Utc};
use conflux::adapters::http::{CsvRegistryStore, HttpDocumentFetcher, HttpFetcherConfig};
use conflux::adapters::memory::InMemoryConfigCache;
use conflux::domain::errors::{DomainError, DomainResult};
use conflux::domain::models::{AgentConfiguration, AgentKey, ConfigSource};
use conflux::domain::ports::{CacheEntry, ConfigCache};
use conflux::services::ConfigResolver;
use mockito::{Server, ServerGuard};

const REGISTRY_PATH: &str = "/registry/agents.csv";
const CONFIG_PATH: &str = "/agents/agent_001/config.json";

fn registry_csv(server: &ServerGuard) -> String {
    format!(
        "workflow_id,project_id,agent_id,agent_type,description,prompt_url,status\n\
         work-1001,project_001,agent_001,enhanced_research,Market research,{}{CONFIG_PATH},active\n",
        server.url()
    )
}

fn config_document() -> String {
    serde_json::json!({
        "agent_id": "agent_001",
        "agent_type": "enhanced_research",
        "system_message": "You research Brazilian fintech markets.",
        "mcp_endpoints": [
            {"type": "search", "name": "bright_data", "url": "https://mcp.brightdata.com/sse"}
        ]
    })
    .to_string()
}

fn test_key() -> AgentKey {
    AgentKey::new("work-1001", "project_001", "agent_001")
}

fn resolver_for(server: &ServerGuard, cache: Arc<dyn ConfigCache>) -> ConfigResolver {
    let fetcher = Arc::new(
        HttpDocumentFetcher::with_config(HttpFetcherConfig {
            timeout: std::time::Duration::from_secs(2),
        })
        .expect("failed to build fetcher"),
    );
    let registry = Arc::new(CsvRegistryStore::new(
        fetcher.clone(),
        format!("{}{REGISTRY_PATH}", server.url()),
    ));
    ConfigResolver::new(registry, fetcher, cache)
}

#[tokio::test]
async fn resolves_from_remote_then_serves_from_cache() {
    let mut server = Server::new_async().await;
    let registry_mock = server
        .mock("GET", REGISTRY_PATH)
        .with_status(200)
        .with_body(registry_csv(&server))
        .expect(1)
        .create_async()
        .await;
    let config_mock = server
        .mock("GET", CONFIG_PATH)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(config_document())
        .expect(1)
        .create_async()
        .await;

    let cache = Arc::new(InMemoryConfigCache::new());
    let resolver = resolver_for(&server, cache.clone());

    let first = resolver.resolve(&test_key()).await;
    assert_eq!(first.config.config_source, ConfigSource::Github);
    assert_eq!(
        first.config.system_message,
        "You research Brazilian fintech markets."
    );
    assert_eq!(cache.len().await, 1);

    // Second resolve is answered entirely from cache; the expect(1) mocks
    // verify no further HTTP traffic happened.
    let second = resolver.resolve(&test_key()).await;
    assert_eq!(second.config.config_source, ConfigSource::Cache);
    assert_eq!(second.config.system_message, first.config.system_message);

    registry_mock.assert_async().await;
    config_mock.assert_async().await;
}

#[tokio::test]
async fn remote_document_failure_degrades_to_fallback() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", REGISTRY_PATH)
        .with_status(200)
        .with_body(registry_csv(&server))
        .create_async()
        .await;
    server
        .mock("GET", CONFIG_PATH)
        .with_status(404)
        .create_async()
        .await;

    let resolver = resolver_for(&server, Arc::new(InMemoryConfigCache::new()));
    let resolution = resolver.resolve(&test_key()).await;

    assert_eq!(resolution.config.config_source, ConfigSource::Fallback);
    assert_eq!(resolution.config.agent_id, "agent_001");
    assert!(resolution.config.mcp_endpoints.is_empty());
    // The trail records the http classification of the failed fetch.
    assert!(resolution
        .trail
        .iter()
        .any(|event| event.outcome.contains("http error")));
}

#[tokio::test]
async fn registry_unavailable_degrades_to_fallback() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", REGISTRY_PATH)
        .with_status(500)
        .create_async()
        .await;

    let resolver = resolver_for(&server, Arc::new(InMemoryConfigCache::new()));
    let resolution = resolver.resolve(&test_key()).await;

    assert_eq!(resolution.config.config_source, ConfigSource::Fallback);
    assert!(!resolution.config.system_message.is_empty());
}

#[tokio::test]
async fn unknown_agent_degrades_without_remote_fetch() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", REGISTRY_PATH)
        .with_status(200)
        .with_body(registry_csv(&server))
        .create_async()
        .await;
    let config_mock = server
        .mock("GET", CONFIG_PATH)
        .expect(0)
        .create_async()
        .await;

    let resolver = resolver_for(&server, Arc::new(InMemoryConfigCache::new()));
    let key = AgentKey::new("work-1001", "project_001", "agent_999");
    let resolution = resolver.resolve(&key).await;

    assert_eq!(resolution.config.config_source, ConfigSource::Fallback);
    assert_eq!(resolution.config.agent_id, "agent_999");
    config_mock.assert_async().await;
}

#[tokio::test]
async fn zero_ttl_disables_caching() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", REGISTRY_PATH)
        .with_status(200)
        .with_body(registry_csv(&server))
        .expect(2)
        .create_async()
        .await;
    let config_mock = server
        .mock("GET", CONFIG_PATH)
        .with_status(200)
        .with_body(config_document())
        .expect(2)
        .create_async()
        .await;

    let cache = Arc::new(InMemoryConfigCache::new());
    let resolver = resolver_for(&server, cache).with_ttl(0);

    let first = resolver.resolve(&test_key()).await;
    let second = resolver.resolve(&test_key()).await;

    // Both resolutions went to the remote document.
    assert_eq!(first.config.config_source, ConfigSource::Github);
    assert_eq!(second.config.config_source, ConfigSource::Github);
    config_mock.assert_async().await;
}

/// Cache whose entries are always older than any positive TTL.
struct StaleCache {
    inner: InMemoryConfigCache,
}

#[async_trait::async_trait]
impl ConfigCache for StaleCache {
    async fn get(&self, key: &str) -> DomainResult<Option<CacheEntry>> {
        Ok(self.inner.get(key).await?.map(|entry| CacheEntry {
            fetched_at: Utc::now() - Duration::days(1),
            ..entry
        }))
    }

    async fn put(&self, key: &str, data: AgentConfiguration) -> DomainResult<()> {
        self.inner.put(key, data).await
    }
}

#[tokio::test]
async fn expired_entries_are_refetched_and_overwritten() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", REGISTRY_PATH)
        .with_status(200)
        .with_body(registry_csv(&server))
        .expect(2)
        .create_async()
        .await;
    let config_mock = server
        .mock("GET", CONFIG_PATH)
        .with_status(200)
        .with_body(config_document())
        .expect(2)
        .create_async()
        .await;

    let cache = Arc::new(StaleCache {
        inner: InMemoryConfigCache::new(),
    });
    let resolver = resolver_for(&server, cache);

    let first = resolver.resolve(&test_key()).await;
    // The entry written by the first resolve reads back a day old, so the
    // second resolve re-runs the full chain.
    let second = resolver.resolve(&test_key()).await;

    assert_eq!(first.config.config_source, ConfigSource::Github);
    assert_eq!(second.config.config_source, ConfigSource::Github);
    config_mock.assert_async().await;
}

/// Cache backend that fails every call.
struct FailingCache;

#[async_trait::async_trait]
impl ConfigCache for FailingCache {
    async fn get(&self, _key: &str) -> DomainResult<Option<CacheEntry>> {
        Err(DomainError::CacheBackend("connection refused".to_string()))
    }

    async fn put(&self, _key: &str, _data: AgentConfiguration) -> DomainResult<()> {
        Err(DomainError::CacheBackend("connection refused".to_string()))
    }
}

#[tokio::test]
async fn broken_cache_backend_is_treated_as_a_miss() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", REGISTRY_PATH)
        .with_status(200)
        .with_body(registry_csv(&server))
        .create_async()
        .await;
    server
        .mock("GET", CONFIG_PATH)
        .with_status(200)
        .with_body(config_document())
        .create_async()
        .await;

    let resolver = resolver_for(&server, Arc::new(FailingCache));
    let resolution = resolver.resolve(&test_key()).await;

    // Neither the failed get nor the failed put stops resolution.
    assert_eq!(resolution.config.config_source, ConfigSource::Github);
}

#[tokio::test]
async fn duplicate_registry_rows_resolve_to_the_first() {
    let mut server = Server::new_async().await;
    let csv = format!(
        "workflow_id,project_id,agent_id,agent_type,prompt_url,status\n\
         work-1001,project_001,agent_001,first_match,{url}{CONFIG_PATH},active\n\
         work-1001,project_001,agent_001,second_match,{url}/agents/other.json,active\n",
        url = server.url()
    );
    server
        .mock("GET", REGISTRY_PATH)
        .with_status(200)
        .with_body(csv)
        .create_async()
        .await;
    server
        .mock("GET", CONFIG_PATH)
        .with_status(200)
        .with_body(serde_json::json!({"agent_type": "first_match"}).to_string())
        .create_async()
        .await;

    let resolver = resolver_for(&server, Arc::new(InMemoryConfigCache::new()));
    let resolution = resolver.resolve(&test_key()).await;

    assert_eq!(resolution.config.config_source, ConfigSource::Github);
    assert_eq!(resolution.config.agent_type, "first_match");
}
