//! LLM substrate port - the opaque `invoke(prompt, tools) -> text`
//! capability the pipeline delegates to.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::McpEndpoint;

/// Everything the substrate needs for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvokeRequest {
    pub system_message: String,
    pub query: String,
    pub mcp_endpoints: Vec<McpEndpoint>,
}

/// Trait for LLM backends.
///
/// The pipeline treats invocation as opaque: any provider-specific
/// protocol, streaming, or tool-calling detail lives behind this seam.
#[async_trait]
pub trait LlmSubstrate: Send + Sync {
    /// Get the substrate type name.
    fn name(&self) -> &'static str;

    /// Run one invocation to completion and return the output text.
    async fn invoke(&self, request: InvokeRequest) -> DomainResult<String>;
}
