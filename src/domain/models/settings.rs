//! Runtime settings for the resolver pipeline.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::models::agent::AgentKey;

/// Main configuration structure for Conflux.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Settings {
    /// URL of the registry CSV document.
    #[serde(default = "default_registry_url")]
    pub registry_url: String,

    /// Base URL for per-agent documents (config.json, prompt.json).
    #[serde(default = "default_document_base_url")]
    pub document_base_url: String,

    /// Workflow assumed when the inbound request carries none.
    #[serde(default = "default_workflow_id")]
    pub default_workflow_id: String,

    /// Project used when building ad-hoc keys outside the webhook path.
    #[serde(default = "default_project_id")]
    pub default_project_id: String,

    /// Agent used when building ad-hoc keys outside the webhook path.
    #[serde(default = "default_agent_id")]
    pub default_agent_id: String,

    /// TTL of cached configurations, in milliseconds. Zero or negative
    /// disables caching entirely.
    #[serde(default = "default_cache_ttl_ms")]
    pub cache_ttl_ms: i64,

    /// HTTP client configuration.
    #[serde(default)]
    pub http: HttpConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_registry_url() -> String {
    format!("{}/registry/agents.csv", default_document_base_url())
}

fn default_document_base_url() -> String {
    "https://raw.githubusercontent.com/example/research-agents/main".to_string()
}

fn default_workflow_id() -> String {
    "work-1001".to_string()
}

fn default_project_id() -> String {
    "project_001".to_string()
}

fn default_agent_id() -> String {
    "agent_001".to_string()
}

const fn default_cache_ttl_ms() -> i64 {
    300_000
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            registry_url: default_registry_url(),
            document_base_url: default_document_base_url(),
            default_workflow_id: default_workflow_id(),
            default_project_id: default_project_id(),
            default_agent_id: default_agent_id(),
            cache_ttl_ms: default_cache_ttl_ms(),
            http: HttpConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Settings {
    /// Key built entirely from configured defaults. Used by operational
    /// tooling and tests; the webhook path always builds its key from the
    /// validated request instead.
    pub fn default_key(&self) -> AgentKey {
        AgentKey::new(
            self.default_workflow_id.clone(),
            self.default_project_id.clone(),
            self.default_agent_id.clone(),
        )
    }

    /// URL of a per-agent configuration document under the document base.
    pub fn agent_config_url(&self, agent_id: &str) -> String {
        format!(
            "{}/agents/{agent_id}/config.json",
            self.document_base_url.trim_end_matches('/')
        )
    }
}

/// HTTP client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct HttpConfig {
    /// Per-request timeout in seconds for registry and config documents.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

const fn default_timeout_secs() -> u64 {
    10
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for log files (optional; stdout-only when unset).
    pub log_dir: Option<PathBuf>,

    /// Enable stdout logging.
    #[serde(default = "default_true")]
    pub enable_stdout: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

const fn default_true() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            enable_stdout: default_true(),
        }
    }
}
