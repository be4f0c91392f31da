//! Scoped variables and precedence metadata.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Variable scopes ordered most to least specific.
///
/// A variable set at a narrower scope shadows the same name at any broader
/// scope, and broader scopes carry none of the narrower identifiers so a
/// workflow-scoped variable can never match a webhook-scoped query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableScope {
    Execution,
    Webhook,
    Workflow,
    Project,
}

impl VariableScope {
    /// All scopes, most specific first.
    pub const IN_PRECEDENCE_ORDER: [Self; 4] =
        [Self::Execution, Self::Webhook, Self::Workflow, Self::Project];

    /// Precedence level, 1 (most specific) to 4 (least).
    pub fn precedence_level(self) -> u8 {
        match self {
            Self::Execution => 1,
            Self::Webhook => 2,
            Self::Workflow => 3,
            Self::Project => 4,
        }
    }
}

/// A stored variable bound to exactly one scope.
///
/// The identifier columns follow the scope invariant: only the scope's own
/// identifier and the broader ones may be set, narrower ones are always
/// `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    pub id: Uuid,
    pub name: String,
    pub value: Value,
    pub scope: VariableScope,
    pub project_id: Option<String>,
    pub workflow_id: Option<String>,
    pub webhook_id: Option<String>,
    pub execution_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Variable {
    /// The identifier value belonging to this variable's own scope.
    pub fn scope_id(&self) -> Option<&str> {
        match self.scope {
            VariableScope::Execution => self.execution_id.as_deref(),
            VariableScope::Webhook => self.webhook_id.as_deref(),
            VariableScope::Workflow => self.workflow_id.as_deref(),
            VariableScope::Project => self.project_id.as_deref(),
        }
    }
}

/// Identifiers describing where a request is executing.
///
/// Levels whose identifier is absent are skipped entirely during
/// precedence resolution; they are never queried with a null filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableContext {
    pub execution_id: Option<String>,
    pub webhook_id: Option<String>,
    pub workflow_id: Option<String>,
    pub project_id: Option<String>,
}

impl VariableContext {
    /// The context identifier for `scope`, if supplied.
    pub fn scope_id(&self, scope: VariableScope) -> Option<&str> {
        match scope {
            VariableScope::Execution => self.execution_id.as_deref(),
            VariableScope::Webhook => self.webhook_id.as_deref(),
            VariableScope::Workflow => self.workflow_id.as_deref(),
            VariableScope::Project => self.project_id.as_deref(),
        }
    }
}

/// A variable returned by precedence resolution, annotated with the scope
/// that supplied it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedVariable {
    #[serde(flatten)]
    pub variable: Variable,
    pub resolved_from: VariableScope,
    pub precedence_level: u8,
}
