//! Variable precedence resolution across execution, webhook, workflow,
//! and project scopes.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{ResolvedVariable, Variable, VariableContext, VariableScope};
use crate::domain::ports::{IdMatch, VariableFilter, VariableStore};

/// Resolves named variables by walking scopes most-specific-first.
pub struct VariablePrecedenceResolver {
    store: Arc<dyn VariableStore>,
}

impl VariablePrecedenceResolver {
    pub fn new(store: Arc<dyn VariableStore>) -> Self {
        Self { store }
    }

    /// Most specific value of `name` visible to `context`, or `None`.
    ///
    /// Walks execution, webhook, workflow, project and stops at the first
    /// scope that yields a match. Scopes whose identifier is absent from
    /// the context are skipped without querying.
    pub async fn resolve(
        &self,
        name: &str,
        context: &VariableContext,
    ) -> DomainResult<Option<ResolvedVariable>> {
        for scope in VariableScope::IN_PRECEDENCE_ORDER {
            let Some(filter) = scope_filter(name, scope, context) else {
                continue;
            };
            if let Some(variable) = self.store.query(&filter).await?.into_iter().next() {
                debug!(name, scope = ?scope, "variable resolved");
                return Ok(Some(ResolvedVariable {
                    resolved_from: scope,
                    precedence_level: scope.precedence_level(),
                    variable,
                }));
            }
        }
        Ok(None)
    }

    /// Resolve several names independently; no cross-name interaction.
    pub async fn resolve_all(
        &self,
        names: &[&str],
        context: &VariableContext,
    ) -> DomainResult<HashMap<String, Option<ResolvedVariable>>> {
        let mut results = HashMap::with_capacity(names.len());
        for name in names {
            results.insert((*name).to_string(), self.resolve(name, context).await?);
        }
        Ok(results)
    }

    /// Every variable visible to `context`, one entry per name, each at
    /// its highest-precedence scope.
    ///
    /// Single pass over the store; produces exactly what calling `resolve`
    /// for each distinct stored name would.
    pub async fn list_available(
        &self,
        context: &VariableContext,
    ) -> DomainResult<Vec<ResolvedVariable>> {
        let rows = self.store.query(&VariableFilter::default()).await?;

        let mut best: HashMap<String, ResolvedVariable> = HashMap::new();
        for variable in rows {
            // Visible only when the context carries the variable's own
            // scope identifier and it matches.
            let visible = context.scope_id(variable.scope).is_some()
                && context.scope_id(variable.scope) == variable.scope_id();
            if !visible {
                continue;
            }
            let level = variable.scope.precedence_level();
            let candidate = ResolvedVariable {
                resolved_from: variable.scope,
                precedence_level: level,
                variable,
            };
            match best.get(&candidate.variable.name) {
                Some(current) if current.precedence_level <= level => {}
                _ => {
                    best.insert(candidate.variable.name.clone(), candidate);
                }
            }
        }

        let mut available: Vec<ResolvedVariable> = best.into_values().collect();
        available.sort_by(|a, b| a.variable.name.cmp(&b.variable.name));
        Ok(available)
    }

    /// Upsert `name` at `scope`.
    ///
    /// The scope decides which identifiers the stored row keeps: broader
    /// scopes null out the narrower identifiers so a workflow-scoped
    /// variable can never match a webhook-scoped query. The uniqueness of
    /// `(name, scope, identifiers)` is enforced here via check-then-update.
    pub async fn set_variable(
        &self,
        name: &str,
        value: Value,
        scope: VariableScope,
        context: &VariableContext,
    ) -> DomainResult<Variable> {
        if context.scope_id(scope).is_none() {
            return Err(DomainError::MissingInput(match scope {
                VariableScope::Execution => "execution_id",
                VariableScope::Webhook => "webhook_id",
                VariableScope::Workflow => "workflow_id",
                VariableScope::Project => "project_id",
            }));
        }

        let project_id = context.project_id.clone();
        let workflow_id = match scope {
            VariableScope::Project => None,
            _ => context.workflow_id.clone(),
        };
        let webhook_id = match scope {
            VariableScope::Project | VariableScope::Workflow => None,
            _ => context.webhook_id.clone(),
        };
        let execution_id = match scope {
            VariableScope::Execution => context.execution_id.clone(),
            _ => None,
        };

        let filter = VariableFilter {
            name: Some(name.to_string()),
            scope: Some(scope),
            project_id: Some(IdMatch::from_option(project_id.as_deref())),
            workflow_id: Some(IdMatch::from_option(workflow_id.as_deref())),
            webhook_id: Some(IdMatch::from_option(webhook_id.as_deref())),
            execution_id: Some(IdMatch::from_option(execution_id.as_deref())),
        };

        if let Some(existing) = self.store.query(&filter).await?.into_iter().next() {
            self.store.update_value(existing.id, value.clone()).await?;
            debug!(name, scope = ?scope, "variable updated");
            return Ok(Variable {
                value,
                updated_at: Utc::now(),
                ..existing
            });
        }

        let now = Utc::now();
        let variable = Variable {
            id: Uuid::new_v4(),
            name: name.to_string(),
            value,
            scope,
            project_id,
            workflow_id,
            webhook_id,
            execution_id,
            created_at: now,
            updated_at: now,
        };
        debug!(name, scope = ?scope, "variable inserted");
        self.store.insert(variable).await
    }

    /// Remove `name` at exactly `scope`; returns the removed count.
    pub async fn delete_variable(
        &self,
        name: &str,
        scope: VariableScope,
        context: &VariableContext,
    ) -> DomainResult<u64> {
        let workflow_id = match scope {
            VariableScope::Project => None,
            _ => context.workflow_id.clone(),
        };
        let webhook_id = match scope {
            VariableScope::Project | VariableScope::Workflow => None,
            _ => context.webhook_id.clone(),
        };
        let execution_id = match scope {
            VariableScope::Execution => context.execution_id.clone(),
            _ => None,
        };

        let filter = VariableFilter {
            name: Some(name.to_string()),
            scope: Some(scope),
            project_id: Some(IdMatch::from_option(context.project_id.as_deref())),
            workflow_id: Some(IdMatch::from_option(workflow_id.as_deref())),
            webhook_id: Some(IdMatch::from_option(webhook_id.as_deref())),
            execution_id: Some(IdMatch::from_option(execution_id.as_deref())),
        };
        self.store.delete(&filter).await
    }
}

/// Filter for `name` at one precedence level, or `None` when the context
/// lacks that level's identifier (the level is skipped, never queried with
/// a null filter).
fn scope_filter(
    name: &str,
    scope: VariableScope,
    context: &VariableContext,
) -> Option<VariableFilter> {
    let id = context.scope_id(scope)?.to_string();
    let mut filter = VariableFilter {
        name: Some(name.to_string()),
        scope: Some(scope),
        ..Default::default()
    };
    let constraint = Some(IdMatch::Equals(id));
    match scope {
        VariableScope::Execution => filter.execution_id = constraint,
        VariableScope::Webhook => filter.webhook_id = constraint,
        VariableScope::Workflow => filter.workflow_id = constraint,
        VariableScope::Project => filter.project_id = constraint,
    }
    Some(filter)
}
