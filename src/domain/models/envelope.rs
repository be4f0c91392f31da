//! The request-scoped envelope threaded through every pipeline stage.
//!
//! The envelope is created once per request, enriched by every stage, and
//! discarded after the response is emitted. Fields are only ever added or
//! (for `flow_step` / `last_updated`) refreshed, never removed, so any
//! later stage can see what earlier stages observed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::models::agent::{AgentConfiguration, AgentKey, McpProvider};

/// Envelope schema version stamped into the metadata.
pub const ENVELOPE_VERSION: &str = "3.0";

/// Pipeline stages in execution order.
///
/// Stages must never read a field that a later stage creates; a stage that
/// cannot find an expected field logs and substitutes a safe default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowStep {
    Intake,
    Resolve,
    Prepare,
    Invoke,
    Respond,
}

/// Per-request identifiers seeded at intake, unique per request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingIds {
    pub session_id: String,
    pub execution_id: String,
    pub trace_id: String,
    pub workflow_id: String,
}

impl TrackingIds {
    /// Derive ids from the request identifiers, the clock, and a random
    /// nonce so two requests for the same agent in the same millisecond
    /// still differ.
    pub fn seed(project_id: &str, agent_id: &str, workflow_id: &str, now: DateTime<Utc>) -> Self {
        let stamp = now.timestamp_millis();
        let nonce = Uuid::new_v4().simple().to_string();
        Self {
            session_id: format!("session_{project_id}_{agent_id}_{stamp}"),
            execution_id: format!("exec_{agent_id}_{}_{nonce}", now.format("%Y%m%d_%H%M%S")),
            trace_id: format!("trace_{stamp}_{nonce}"),
            workflow_id: workflow_id.to_string(),
        }
    }
}

/// Positional metadata every stage refreshes as it runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvelopeMetadata {
    pub version: String,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    pub flow_step: FlowStep,
    pub tracking: TrackingIds,
}

/// Validated webhook input.
///
/// `extra` keeps the raw inbound body so later stages still see fields
/// this pipeline does not model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookData {
    pub project_id: String,
    pub agent_id: String,
    pub query: String,
    pub workflow_id: Option<String>,
    /// Client-supplied configuration override. When present and non-empty
    /// it bypasses registry/remote resolution entirely.
    pub agent_config: Option<Value>,
    #[serde(default)]
    pub extra: Value,
}

impl WebhookData {
    /// Parse an inbound request body.
    ///
    /// Accepts the shapes observed from the transport: a flat object, a
    /// `body`-wrapped one, a `webhook_data`-nested one, and `ID_workflow`
    /// as a workflow alias. Missing `project_id` or `agent_id` is an input
    /// error; resolution must not be attempted for such a request.
    pub fn parse(raw: &Value) -> Result<Self, DomainError> {
        let body = raw.get("body").unwrap_or(raw);
        let nested = body.get("webhook_data");
        let field = |name: &str| {
            body.get(name)
                .or_else(|| nested.and_then(|inner| inner.get(name)))
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|value| !value.is_empty())
        };

        let project_id = field("project_id").ok_or(DomainError::MissingInput("project_id"))?;
        let agent_id = field("agent_id").ok_or(DomainError::MissingInput("agent_id"))?;
        let workflow_id = field("workflow_id").or_else(|| field("ID_workflow"));
        let query = field("query").unwrap_or_default();

        let agent_config = body
            .get("agent_config")
            .or_else(|| nested.and_then(|inner| inner.get("agent_config")))
            .filter(|config| config.as_object().is_some_and(|map| !map.is_empty()))
            .cloned();

        Ok(Self {
            project_id: project_id.to_string(),
            agent_id: agent_id.to_string(),
            query: query.to_string(),
            workflow_id: workflow_id.map(str::to_string),
            agent_config,
            extra: body.clone(),
        })
    }
}

/// One line of the envelope's observability trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrailEntry {
    pub at: DateTime<Utc>,
    pub step: FlowStep,
    pub message: String,
}

/// Logs, errors, and metrics accumulated while the request runs.
///
/// Operators distinguish degraded-but-successful runs from true failures
/// by inspecting this trail, not the response's success flag.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Observability {
    pub logs: Vec<TrailEntry>,
    pub errors: Vec<TrailEntry>,
    pub metrics: serde_json::Map<String, Value>,
}

/// Facts stages accumulate for the stages after them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionState {
    pub mcp_provider: Option<McpProvider>,
    pub system_prompt: Option<String>,
    pub llm_output: Option<String>,
    /// Stages visited so far, in order.
    pub steps_completed: Vec<FlowStep>,
}

/// The unit of work passed between pipeline stages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub metadata: EnvelopeMetadata,
    pub webhook_data: WebhookData,
    pub agent_config: Option<AgentConfiguration>,
    pub session_state: SessionState,
    pub observability: Observability,
}

impl Envelope {
    /// Create the envelope at the pipeline's entry point.
    ///
    /// Seeds the tracking ids and empty observability containers; the
    /// workflow falls back to `default_workflow_id` when the request
    /// carried none.
    pub fn new(webhook_data: WebhookData, default_workflow_id: &str) -> Self {
        let now = Utc::now();
        let workflow_id = webhook_data
            .workflow_id
            .as_deref()
            .unwrap_or(default_workflow_id);
        let tracking = TrackingIds::seed(
            &webhook_data.project_id,
            &webhook_data.agent_id,
            workflow_id,
            now,
        );
        let mut envelope = Self {
            metadata: EnvelopeMetadata {
                version: ENVELOPE_VERSION.to_string(),
                created_at: now,
                last_updated: now,
                flow_step: FlowStep::Intake,
                tracking,
            },
            webhook_data,
            agent_config: None,
            session_state: SessionState::default(),
            observability: Observability::default(),
        };
        envelope.session_state.steps_completed.push(FlowStep::Intake);
        envelope.log("envelope created");
        envelope
    }

    /// The registry key this request resolves against.
    pub fn agent_key(&self) -> AgentKey {
        AgentKey::new(
            self.metadata.tracking.workflow_id.clone(),
            self.webhook_data.project_id.clone(),
            self.webhook_data.agent_id.clone(),
        )
    }

    /// Move the envelope to `step`, refreshing the positional metadata.
    /// The one sanctioned overwrite: everything else is append-only.
    pub fn advance(&mut self, step: FlowStep) {
        self.metadata.flow_step = step;
        self.metadata.last_updated = Utc::now();
        self.session_state.steps_completed.push(step);
    }

    pub fn log(&mut self, message: impl Into<String>) {
        self.observability.logs.push(TrailEntry {
            at: Utc::now(),
            step: self.metadata.flow_step,
            message: message.into(),
        });
    }

    pub fn record_error(&mut self, message: impl Into<String>) {
        self.observability.errors.push(TrailEntry {
            at: Utc::now(),
            step: self.metadata.flow_step,
            message: message.into(),
        });
    }

    pub fn record_metric(&mut self, key: impl Into<String>, value: Value) {
        self.observability.metrics.insert(key.into(), value);
    }
}
