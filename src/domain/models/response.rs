//! Outbound response contract.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;
use crate::domain::models::agent::ConfigSource;
use crate::domain::models::envelope::FlowStep;

/// Metadata attached to every successful response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseMetadata {
    pub session_id: String,
    pub trace_id: String,
    pub timestamp: DateTime<Utc>,
    pub config_source: ConfigSource,
    pub mcps_available: Vec<String>,
    pub duration_ms: i64,
    pub flow_steps: Vec<FlowStep>,
}

/// The outward-facing response for a handled request.
///
/// `success` is true for every request that passed input validation, even
/// when resolution degraded to a fallback configuration; trust level is
/// read from `metadata.config_source`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentResponse {
    pub success: bool,
    pub agent: String,
    pub agent_id: String,
    pub query: String,
    pub result: String,
    pub metadata: ResponseMetadata,
}

/// Structured error returned for invalid input; the only non-success
/// outward shape the pipeline produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub missing_field: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ErrorResponse {
    pub fn for_input(err: &DomainError) -> Self {
        let missing_field = match err {
            DomainError::MissingInput(field) => Some((*field).to_string()),
            _ => None,
        };
        Self {
            success: false,
            error: err.to_string(),
            missing_field,
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_error_names_the_missing_field() {
        let response = ErrorResponse::for_input(&DomainError::MissingInput("agent_id"));
        assert!(!response.success);
        assert_eq!(response.missing_field.as_deref(), Some("agent_id"));
    }
}
