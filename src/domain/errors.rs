//! Domain errors for the Conflux resolver.

use thiserror::Error;

/// Classified failure fetching a remote document.
///
/// Every variant is recoverable from the resolver's perspective: a failed
/// fetch triggers the next fallback step, never a process failure.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network error fetching {url}: {message}")]
    Network { url: String, message: String },

    #[error("HTTP {status} fetching {url}")]
    Http { url: String, status: u16 },

    #[error("Failed to parse document at {url}: {message}")]
    Parse { url: String, message: String },
}

impl FetchError {
    /// Short classification label used in logs and resolution trails.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Network { .. } => "network",
            Self::Http { .. } => "http",
            Self::Parse { .. } => "parse",
        }
    }

    /// The URL the failed fetch was issued against.
    pub fn url(&self) -> &str {
        match self {
            Self::Network { url, .. } | Self::Http { url, .. } | Self::Parse { url, .. } => url,
        }
    }
}

/// Failure looking up a key in the registry document.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Registry document unavailable: {0}")]
    DocumentUnavailable(#[from] FetchError),

    #[error("No active registry row for workflow={workflow_id} project={project_id} agent={agent_id}")]
    NoMatch {
        workflow_id: String,
        project_id: String,
        agent_id: String,
    },

    #[error("Malformed registry document: {0}")]
    MalformedDocument(String),
}

/// Domain-level errors shared across ports and services.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Missing required input field: {0}")]
    MissingInput(&'static str),

    #[error("Cache backend error: {0}")]
    CacheBackend(String),

    #[error("Variable store error: {0}")]
    VariableStore(String),

    #[error("Variable not found: {0}")]
    VariableNotFound(String),

    #[error("Substrate invocation failed: {0}")]
    SubstrateFailed(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::Serialization(err.to_string())
    }
}
