//! Configuration resolution state machine.
//!
//! Resolution walks a strict order - cache check, registry lookup, remote
//! fetch, local fallback - attempting each step only when the previous one
//! yielded nothing. The machine is total: every backend failure is caught
//! at its step boundary and degrades to the next step, so the caller
//! always receives a usable configuration even under total backend
//! failure.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::domain::models::{AgentConfiguration, AgentKey, ConfigSource, RegistryRow};
use crate::domain::ports::{ConfigCache, DocumentFetcher, RegistryStore};

/// Default cache TTL: five minutes.
pub const DEFAULT_CACHE_TTL_MS: i64 = 300_000;

/// Steps of the resolution state machine, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionStep {
    CacheCheck,
    RegistryLookup,
    RemoteFetch,
    Fallback,
}

/// One entry of the resolution audit trail.
///
/// The pipeline appends these to the envelope's observability log, which
/// is how operators see why a degraded path was taken.
#[derive(Debug, Clone, Serialize)]
pub struct ResolutionEvent {
    pub at: DateTime<Utc>,
    pub step: ResolutionStep,
    pub outcome: String,
}

/// A completed resolution: the configuration plus its audit trail.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub config: AgentConfiguration,
    pub trail: Vec<ResolutionEvent>,
}

/// Orchestrates registry lookup, cache, remote fetch, and fallback into a
/// single `resolve` that never fails.
pub struct ConfigResolver {
    registry: Arc<dyn RegistryStore>,
    fetcher: Arc<dyn DocumentFetcher>,
    cache: Arc<dyn ConfigCache>,
    ttl_ms: i64,
}

impl ConfigResolver {
    pub fn new(
        registry: Arc<dyn RegistryStore>,
        fetcher: Arc<dyn DocumentFetcher>,
        cache: Arc<dyn ConfigCache>,
    ) -> Self {
        Self {
            registry,
            fetcher,
            cache,
            ttl_ms: DEFAULT_CACHE_TTL_MS,
        }
    }

    /// Override the cache TTL. Zero or negative disables caching.
    pub fn with_ttl(mut self, ttl_ms: i64) -> Self {
        self.ttl_ms = ttl_ms;
        self
    }

    /// Resolve `key` into a ready-to-use configuration.
    ///
    /// Never fails: the terminal fallback step is pure local construction.
    #[instrument(skip(self), fields(key = %key))]
    pub async fn resolve(&self, key: &AgentKey) -> Resolution {
        let mut trail = Vec::new();

        if let Some(config) = self.check_cache(key, &mut trail).await {
            return Resolution { config, trail };
        }

        if let Some(row) = self.lookup_registry(key, &mut trail).await {
            if let Some(config) = self.fetch_remote(key, &row, &mut trail).await {
                return Resolution { config, trail };
            }
        }

        // Terminal state: cannot fail.
        let config = AgentConfiguration::fallback(&key.agent_id);
        push(
            &mut trail,
            ResolutionStep::Fallback,
            "synthesized local fallback configuration",
        );
        info!("configuration resolved from local fallback");
        Resolution { config, trail }
    }

    async fn check_cache(
        &self,
        key: &AgentKey,
        trail: &mut Vec<ResolutionEvent>,
    ) -> Option<AgentConfiguration> {
        let now = Utc::now();
        match self.cache.get(&key.cache_key()).await {
            Ok(Some(entry)) if entry.is_valid(self.ttl_ms, now) => {
                let age_ms = entry.age_ms(now);
                debug!(age_ms, "cache hit");
                push(
                    trail,
                    ResolutionStep::CacheCheck,
                    format!("hit (age {age_ms}ms)"),
                );
                Some(entry.data.with_source(ConfigSource::Cache))
            }
            Ok(Some(entry)) => {
                // Expired is treated exactly as absent: resolution re-runs
                // fully and overwrites the entry on success.
                let age_ms = entry.age_ms(now);
                debug!(age_ms, ttl_ms = self.ttl_ms, "cache entry expired");
                push(
                    trail,
                    ResolutionStep::CacheCheck,
                    format!("expired (age {age_ms}ms), treated as absent"),
                );
                None
            }
            Ok(None) => {
                push(trail, ResolutionStep::CacheCheck, "miss");
                None
            }
            Err(err) => {
                // An unavailable cache backend degrades to a plain miss.
                warn!(error = %err, "config cache unavailable; treating as miss");
                push(
                    trail,
                    ResolutionStep::CacheCheck,
                    format!("backend unavailable: {err}"),
                );
                None
            }
        }
    }

    async fn lookup_registry(
        &self,
        key: &AgentKey,
        trail: &mut Vec<ResolutionEvent>,
    ) -> Option<RegistryRow> {
        match self.registry.lookup(key).await {
            Ok(row) => {
                debug!(agent_type = %row.agent_type, "registry row matched");
                push(
                    trail,
                    ResolutionStep::RegistryLookup,
                    format!("matched row (agent_type={})", row.agent_type),
                );
                Some(row)
            }
            Err(err) => {
                // No registry row means no remote URL to fetch; skip
                // straight to fallback.
                warn!(error = %err, "registry lookup failed; skipping remote fetch");
                push(trail, ResolutionStep::RegistryLookup, err.to_string());
                None
            }
        }
    }

    async fn fetch_remote(
        &self,
        key: &AgentKey,
        row: &RegistryRow,
        trail: &mut Vec<ResolutionEvent>,
    ) -> Option<AgentConfiguration> {
        let Some(url) = row.config_url() else {
            push(
                trail,
                ResolutionStep::RemoteFetch,
                "registry row carries no config url",
            );
            return None;
        };

        let document = match self.fetcher.fetch_json(url).await {
            Ok(document) => document,
            Err(err) => {
                warn!(url, kind = err.kind(), error = %err, "remote fetch failed");
                push(
                    trail,
                    ResolutionStep::RemoteFetch,
                    format!("{} error fetching {url}: {err}", err.kind()),
                );
                return None;
            }
        };

        match AgentConfiguration::from_document(&document, &key.agent_id, ConfigSource::Github) {
            Ok(config) => {
                if let Err(err) = self.cache.put(&key.cache_key(), config.clone()).await {
                    // A failed cache write is not a resolution failure.
                    warn!(error = %err, "failed to cache configuration");
                }
                info!(url, "configuration loaded from remote document");
                push(trail, ResolutionStep::RemoteFetch, format!("loaded {url}"));
                Some(config)
            }
            Err(err) => {
                warn!(url, error = %err, "remote config document has unexpected shape");
                push(
                    trail,
                    ResolutionStep::RemoteFetch,
                    format!("parse error in {url}: {err}"),
                );
                None
            }
        }
    }
}

fn push(trail: &mut Vec<ResolutionEvent>, step: ResolutionStep, outcome: impl Into<String>) {
    trail.push(ResolutionEvent {
        at: Utc::now(),
        step,
        outcome: outcome.into(),
    });
}
