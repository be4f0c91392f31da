//! Registry lookup port.

use async_trait::async_trait;

use crate::domain::errors::RegistryError;
use crate::domain::models::{AgentKey, RegistryRow};

/// Read-only access to the tabular registry mapping
/// `(workflow_id, project_id, agent_id)` to agent metadata.
#[async_trait]
pub trait RegistryStore: Send + Sync {
    /// Find the active row matching `key`.
    ///
    /// When multiple rows match, the first in document order is returned
    /// and the duplicates are reported as a data-integrity warning, not an
    /// error. Implementations must not retry internally; the caller owns
    /// retry policy.
    async fn lookup(&self, key: &AgentKey) -> Result<RegistryRow, RegistryError>;
}
