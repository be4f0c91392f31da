//! Configuration cache port.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainResult;
use crate::domain::models::AgentConfiguration;

/// A cached configuration stamped with its fetch time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub data: AgentConfiguration,
    pub fetched_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(data: AgentConfiguration) -> Self {
        Self {
            data,
            fetched_at: Utc::now(),
        }
    }

    /// An entry is valid while younger than `ttl_ms`. A zero or negative
    /// TTL disables caching entirely. An expired entry is treated exactly
    /// as absent by callers; it is never served degraded.
    pub fn is_valid(&self, ttl_ms: i64, now: DateTime<Utc>) -> bool {
        ttl_ms > 0 && self.age_ms(now) < ttl_ms
    }

    pub fn age_ms(&self, now: DateTime<Utc>) -> i64 {
        (now - self.fetched_at).num_milliseconds()
    }
}

/// Key-value store of previously resolved configurations.
///
/// Backend failures are recoverable: the resolver treats an erroring cache
/// exactly like a cache miss. Same-key races between concurrent requests
/// are tolerated; the last `put` wins.
#[async_trait]
pub trait ConfigCache: Send + Sync {
    /// Entry for `key`, valid or not. Expiry is the caller's judgement.
    async fn get(&self, key: &str) -> DomainResult<Option<CacheEntry>>;

    /// Overwrite any entry for `key` with a fresh fetch timestamp.
    async fn put(&self, key: &str, data: AgentConfiguration) -> DomainResult<()>;
}

/// No-op cache used when no storage backend is configured for the
/// execution context. Behaves as a permanent miss.
#[derive(Debug, Clone, Default)]
pub struct NullConfigCache;

impl NullConfigCache {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ConfigCache for NullConfigCache {
    async fn get(&self, _key: &str) -> DomainResult<Option<CacheEntry>> {
        Ok(None)
    }

    async fn put(&self, _key: &str, _data: AgentConfiguration) -> DomainResult<()> {
        Ok(())
    }
}
