//! Scoped-variable storage port.

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Variable, VariableScope};

/// Tri-state match on an identifier column.
///
/// Absent from the filter means "don't care"; `Null` requires the column
/// to be unset; `Equals` requires an exact value. Explicit null matching
/// is what keeps broader-scope variables invisible to narrower-scope
/// queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdMatch {
    Null,
    Equals(String),
}

impl IdMatch {
    pub fn accepts(&self, value: Option<&str>) -> bool {
        match self {
            Self::Null => value.is_none(),
            Self::Equals(expected) => value == Some(expected.as_str()),
        }
    }

    /// Filter that requires the column to equal `value` when set, or be
    /// null when absent.
    pub fn from_option(value: Option<&str>) -> Self {
        value.map_or(Self::Null, |id| Self::Equals(id.to_string()))
    }
}

/// Conjunctive filter over stored variables.
#[derive(Debug, Clone, Default)]
pub struct VariableFilter {
    pub name: Option<String>,
    pub scope: Option<VariableScope>,
    pub project_id: Option<IdMatch>,
    pub workflow_id: Option<IdMatch>,
    pub webhook_id: Option<IdMatch>,
    pub execution_id: Option<IdMatch>,
}

impl VariableFilter {
    pub fn matches(&self, variable: &Variable) -> bool {
        if let Some(name) = &self.name {
            if &variable.name != name {
                return false;
            }
        }
        if let Some(scope) = self.scope {
            if variable.scope != scope {
                return false;
            }
        }
        let columns = [
            (&self.project_id, variable.project_id.as_deref()),
            (&self.workflow_id, variable.workflow_id.as_deref()),
            (&self.webhook_id, variable.webhook_id.as_deref()),
            (&self.execution_id, variable.execution_id.as_deref()),
        ];
        columns
            .iter()
            .all(|(constraint, value)| constraint.as_ref().is_none_or(|m| m.accepts(*value)))
    }
}

/// Storage for scoped variables.
///
/// Uniqueness per `(name, scope, scope identifiers)` is enforced by the
/// resolver's upsert, not by the store.
#[async_trait]
pub trait VariableStore: Send + Sync {
    async fn query(&self, filter: &VariableFilter) -> DomainResult<Vec<Variable>>;

    async fn insert(&self, variable: Variable) -> DomainResult<Variable>;

    async fn update_value(&self, id: Uuid, value: Value) -> DomainResult<()>;

    /// Delete everything matching `filter`; returns the removed count.
    async fn delete(&self, filter: &VariableFilter) -> DomainResult<u64>;
}
