//! Agent identity, registry rows, and resolved configurations.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// System message used when every remote configuration source failed.
const FALLBACK_SYSTEM_MESSAGE: &str = "You are a helpful research assistant. \
    Use your available tools proactively to help users find information and \
    create documents.";

/// Identifies one configuration row in the registry.
///
/// Immutable once constructed. The `workflow_id` defaults to the configured
/// default workflow when the inbound request omits it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentKey {
    pub workflow_id: String,
    pub project_id: String,
    pub agent_id: String,
}

impl AgentKey {
    pub fn new(
        workflow_id: impl Into<String>,
        project_id: impl Into<String>,
        agent_id: impl Into<String>,
    ) -> Self {
        Self {
            workflow_id: workflow_id.into(),
            project_id: project_id.into(),
            agent_id: agent_id.into(),
        }
    }

    /// Deterministic cache key. The workflow is part of the key so agents
    /// shared across workflows never collide in cache.
    pub fn cache_key(&self) -> String {
        format!(
            "config/{}/{}/{}",
            self.workflow_id, self.project_id, self.agent_id
        )
    }
}

impl fmt::Display for AgentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.workflow_id, self.project_id, self.agent_id
        )
    }
}

/// One parsed row of the registry CSV. Never mutated after parse.
///
/// `status` and `version` are `None` when the registry document does not
/// carry those columns at all; a registry without a status column treats
/// every row as active.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryRow {
    pub workflow_id: String,
    pub project_id: String,
    pub agent_id: String,
    pub agent_type: String,
    pub description: String,
    pub prompt_url: String,
    pub processor_url: String,
    pub mcp_endpoint: String,
    pub tools_config_url: String,
    pub status: Option<String>,
    pub version: Option<String>,
}

impl RegistryRow {
    /// A row is selectable only while marked active.
    pub fn is_active(&self) -> bool {
        self.status.as_deref().is_none_or(|status| status == "active")
    }

    /// Whether this row matches `key` and may be selected.
    pub fn matches(&self, key: &AgentKey) -> bool {
        self.workflow_id == key.workflow_id
            && self.project_id == key.project_id
            && self.agent_id == key.agent_id
            && self.is_active()
    }

    /// URL of the per-agent configuration document, if the row carries one.
    pub fn config_url(&self) -> Option<&str> {
        let url = self.prompt_url.trim();
        (!url.is_empty()).then_some(url)
    }
}

/// How a resolved configuration was obtained.
///
/// This tag is always present on a resolved configuration and is the
/// primary signal consumers use to judge trust level: operators tell a
/// degraded-but-successful run from a healthy one by inspecting it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    /// Fetched from the remote configuration document.
    Github,
    /// Served from a still-valid cache entry.
    Cache,
    /// Synthesized locally after every remote source failed.
    Fallback,
    /// Supplied verbatim by the client, bypassing resolution.
    Frontend,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Github => "github",
            Self::Cache => "cache",
            Self::Fallback => "fallback",
            Self::Frontend => "frontend",
        };
        f.write_str(label)
    }
}

/// An external tool/service endpoint the resolved configuration designates
/// for the LLM to call. Opaque data from the resolver's perspective.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct McpEndpoint {
    #[serde(rename = "type")]
    pub endpoint_type: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub url: String,
}

/// Provider family behind an MCP endpoint URL.
///
/// Pure data classification; no remote code is ever fetched or executed to
/// decide downstream behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum McpProvider {
    BrightData,
    Composio,
    Custom,
    None,
}

impl McpProvider {
    pub fn classify(endpoint: Option<&str>) -> Self {
        match endpoint {
            None | Some("") => Self::None,
            Some(url) if url.contains("mcp.brightdata.com") => Self::BrightData,
            Some(url) if url.contains("composio") || url.contains("apollo") => Self::Composio,
            Some(_) => Self::Custom,
        }
    }
}

/// Tool invocation limits carried alongside the endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Per-tool-call timeout in milliseconds.
    #[serde(rename = "timeout", default = "default_tool_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_tool_max_retries")]
    pub max_retries: u32,
}

const fn default_tool_timeout_ms() -> u64 {
    60_000
}

const fn default_tool_max_retries() -> u32 {
    3
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_tool_timeout_ms(),
            max_retries: default_tool_max_retries(),
        }
    }
}

/// The resolved, ready-to-use agent configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfiguration {
    pub agent_id: String,
    pub agent_type: String,
    #[serde(default)]
    pub description: String,
    pub system_message: String,
    #[serde(default)]
    pub mcp_endpoints: Vec<McpEndpoint>,
    #[serde(default)]
    pub tools_config: ToolsConfig,
    pub config_source: ConfigSource,
}

/// Shape of a remote agent-config document. `config_source` is never part
/// of the wire format; the resolution path stamps it.
#[derive(Debug, Deserialize)]
struct RemoteConfigDoc {
    agent_id: Option<String>,
    agent_type: Option<String>,
    description: Option<String>,
    #[serde(alias = "prompt")]
    system_message: Option<String>,
    #[serde(default)]
    mcp_endpoints: Vec<McpEndpoint>,
    tools_config: Option<ToolsConfig>,
}

impl AgentConfiguration {
    /// Minimal local configuration used when every remote source failed.
    ///
    /// Pure construction: this is the terminal state of resolution and
    /// cannot fail. The endpoint list is deliberately empty; a fallback
    /// run must not call tools nobody configured.
    pub fn fallback(agent_id: &str) -> Self {
        Self {
            agent_id: agent_id.to_string(),
            agent_type: "enhanced_research".to_string(),
            description: "Research assistant running on the built-in fallback configuration"
                .to_string(),
            system_message: FALLBACK_SYSTEM_MESSAGE.to_string(),
            mcp_endpoints: Vec::new(),
            tools_config: ToolsConfig::default(),
            config_source: ConfigSource::Fallback,
        }
    }

    /// Normalize a remote config document into a configuration.
    ///
    /// Missing fields get defaults derived from the requesting key;
    /// `config_source` is stamped from the resolution path, never trusted
    /// from the document itself.
    pub fn from_document(
        doc: &Value,
        fallback_agent_id: &str,
        source: ConfigSource,
    ) -> Result<Self, serde_json::Error> {
        let parsed: RemoteConfigDoc = serde_json::from_value(doc.clone())?;
        Ok(Self {
            agent_id: parsed
                .agent_id
                .unwrap_or_else(|| fallback_agent_id.to_string()),
            agent_type: parsed
                .agent_type
                .unwrap_or_else(|| "enhanced_research".to_string()),
            description: parsed.description.unwrap_or_default(),
            system_message: parsed
                .system_message
                .unwrap_or_else(|| FALLBACK_SYSTEM_MESSAGE.to_string()),
            mcp_endpoints: parsed.mcp_endpoints,
            tools_config: parsed.tools_config.unwrap_or_default(),
            config_source: source,
        })
    }

    /// Retag a configuration with the path it was actually served from.
    pub fn with_source(mut self, source: ConfigSource) -> Self {
        self.config_source = source;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn cache_key_includes_workflow() {
        let a = AgentKey::new("work-1001", "project_001", "agent_001");
        let b = AgentKey::new("work-2002", "project_001", "agent_001");
        assert_ne!(a.cache_key(), b.cache_key());
    }

    #[test]
    fn row_without_status_column_is_active() {
        let row = RegistryRow::default();
        assert!(row.is_active());
    }

    #[test]
    fn row_with_inactive_status_never_matches() {
        let key = AgentKey::new("w", "p", "a");
        let row = RegistryRow {
            workflow_id: "w".into(),
            project_id: "p".into(),
            agent_id: "a".into(),
            status: Some("deprecated".into()),
            ..Default::default()
        };
        assert!(!row.matches(&key));
    }

    #[test]
    fn from_document_defaults_missing_fields() {
        let doc = json!({
            "agent_type": "fiscal_research",
            "system_message": "You answer Brazilian tax questions.",
            "mcp_endpoints": [
                {"type": "search", "name": "bright_data", "url": "https://mcp.brightdata.com/sse"}
            ]
        });
        let config =
            AgentConfiguration::from_document(&doc, "agent_002", ConfigSource::Github).unwrap();
        assert_eq!(config.agent_id, "agent_002");
        assert_eq!(config.agent_type, "fiscal_research");
        assert_eq!(config.tools_config, ToolsConfig::default());
        assert_eq!(config.config_source, ConfigSource::Github);
    }

    #[test]
    fn from_document_rejects_wrong_shapes() {
        let doc = json!({"mcp_endpoints": "not-a-list"});
        assert!(AgentConfiguration::from_document(&doc, "a", ConfigSource::Github).is_err());
    }

    #[test]
    fn document_cannot_smuggle_config_source() {
        let doc = json!({"agent_id": "a", "config_source": "github"});
        let config =
            AgentConfiguration::from_document(&doc, "a", ConfigSource::Frontend).unwrap();
        assert_eq!(config.config_source, ConfigSource::Frontend);
    }

    #[test]
    fn provider_classification() {
        assert_eq!(McpProvider::classify(None), McpProvider::None);
        assert_eq!(
            McpProvider::classify(Some("https://mcp.brightdata.com/sse?token=x")),
            McpProvider::BrightData
        );
        assert_eq!(
            McpProvider::classify(Some("https://apollo-xyz-composio.vercel.app/v3/mcp")),
            McpProvider::Composio
        );
        assert_eq!(
            McpProvider::classify(Some("https://tools.internal/mcp")),
            McpProvider::Custom
        );
    }
}
