//! Domain models.

pub mod agent;
pub mod envelope;
pub mod response;
pub mod settings;
pub mod variable;

pub use agent::{
    AgentConfiguration, AgentKey, ConfigSource, McpEndpoint, McpProvider, RegistryRow, ToolsConfig,
};
pub use envelope::{
    Envelope, EnvelopeMetadata, FlowStep, Observability, SessionState, TrackingIds, TrailEntry,
    WebhookData, ENVELOPE_VERSION,
};
pub use response::{AgentResponse, ErrorResponse, ResponseMetadata};
pub use settings::{HttpConfig, LoggingConfig, Settings};
pub use variable::{ResolvedVariable, Variable, VariableContext, VariableScope};
