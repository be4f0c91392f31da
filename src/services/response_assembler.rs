//! Assembles the outward response from a finished envelope.

use chrono::Utc;

use crate::domain::models::{AgentResponse, ConfigSource, Envelope, ResponseMetadata};

/// Pure projection of an envelope into the response contract. Reads the
/// envelope, never mutates it.
pub struct ResponseAssembler;

impl ResponseAssembler {
    pub fn assemble(envelope: &Envelope) -> AgentResponse {
        let config = envelope.agent_config.as_ref();
        let now = Utc::now();

        AgentResponse {
            success: true,
            agent: config
                .map(|c| c.agent_type.clone())
                .unwrap_or_else(|| "enhanced_research".to_string()),
            agent_id: envelope.webhook_data.agent_id.clone(),
            query: envelope.webhook_data.query.clone(),
            result: envelope
                .session_state
                .llm_output
                .clone()
                .unwrap_or_else(|| "No response generated".to_string()),
            metadata: ResponseMetadata {
                session_id: envelope.metadata.tracking.session_id.clone(),
                trace_id: envelope.metadata.tracking.trace_id.clone(),
                timestamp: now,
                config_source: config
                    .map(|c| c.config_source)
                    .unwrap_or(ConfigSource::Fallback),
                mcps_available: config
                    .map(|c| {
                        c.mcp_endpoints
                            .iter()
                            .map(|endpoint| endpoint.name.clone())
                            .collect()
                    })
                    .unwrap_or_default(),
                duration_ms: (now - envelope.metadata.created_at).num_milliseconds(),
                flow_steps: envelope.session_state.steps_completed.clone(),
            },
        }
    }
}
