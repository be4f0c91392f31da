//! In-memory scoped-variable store.
//!
//! A flat table of rows filtered with explicit-null identifier matching,
//! the same shape the precedence resolver expects from any tabular
//! backend.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::Variable;
use crate::domain::ports::{VariableFilter, VariableStore};

#[derive(Debug, Default)]
pub struct InMemoryVariableStore {
    rows: RwLock<Vec<Variable>>,
}

impl InMemoryVariableStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }
}

#[async_trait]
impl VariableStore for InMemoryVariableStore {
    async fn query(&self, filter: &VariableFilter) -> DomainResult<Vec<Variable>> {
        Ok(self
            .rows
            .read()
            .await
            .iter()
            .filter(|row| filter.matches(row))
            .cloned()
            .collect())
    }

    async fn insert(&self, variable: Variable) -> DomainResult<Variable> {
        self.rows.write().await.push(variable.clone());
        Ok(variable)
    }

    async fn update_value(&self, id: Uuid, value: Value) -> DomainResult<()> {
        let mut rows = self.rows.write().await;
        let row = rows
            .iter_mut()
            .find(|row| row.id == id)
            .ok_or_else(|| DomainError::VariableNotFound(id.to_string()))?;
        row.value = value;
        row.updated_at = Utc::now();
        Ok(())
    }

    async fn delete(&self, filter: &VariableFilter) -> DomainResult<u64> {
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|row| !filter.matches(row));
        Ok((before - rows.len()) as u64)
    }
}
