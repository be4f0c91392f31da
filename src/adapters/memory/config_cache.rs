//! In-memory configuration cache.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::errors::DomainResult;
use crate::domain::models::AgentConfiguration;
use crate::domain::ports::{CacheEntry, ConfigCache};

/// Process-local cache keyed by `AgentKey::cache_key`.
///
/// Safe under concurrent readers and writers; two requests racing on the
/// same missing key both fetch upstream and the last `put` wins, which is
/// acceptable because fetches are idempotent.
#[derive(Debug, Default)]
pub struct InMemoryConfigCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl InMemoryConfigCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl ConfigCache for InMemoryConfigCache {
    async fn get(&self, key: &str) -> DomainResult<Option<CacheEntry>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, data: AgentConfiguration) -> DomainResult<()> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), CacheEntry::new(data));
        Ok(())
    }
}
