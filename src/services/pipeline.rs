//! The request pipeline: intake, resolve, prepare, invoke, respond.
//!
//! Each stage consumes the envelope, enriches it, and hands it to the
//! next. After intake succeeds the pipeline cannot fail: resolution
//! degrades to fallback, substrate failures degrade to a notice in the
//! result, and the response stage is pure assembly.

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{info, instrument, warn};

use crate::domain::models::{
    AgentConfiguration, AgentResponse, ConfigSource, Envelope, ErrorResponse, FlowStep,
    McpProvider, WebhookData,
};
use crate::domain::ports::{InvokeRequest, LlmSubstrate};
use crate::services::config_resolver::ConfigResolver;
use crate::services::response_assembler::ResponseAssembler;

/// What the pipeline hands back to the transport.
#[derive(Debug, Clone)]
pub enum PipelineOutput {
    Response(AgentResponse),
    /// Input validation failed; nothing past intake ran.
    InputError(ErrorResponse),
}

/// Drives one request end to end through the five pipeline stages.
pub struct RequestPipeline {
    resolver: ConfigResolver,
    substrate: Arc<dyn LlmSubstrate>,
    default_workflow_id: String,
}

impl RequestPipeline {
    pub fn new(
        resolver: ConfigResolver,
        substrate: Arc<dyn LlmSubstrate>,
        default_workflow_id: impl Into<String>,
    ) -> Self {
        Self {
            resolver,
            substrate,
            default_workflow_id: default_workflow_id.into(),
        }
    }

    /// Handle one inbound request body.
    ///
    /// Invalid input is the only path that short-circuits; every later
    /// failure degrades inside its stage and the request still produces a
    /// success response.
    #[instrument(skip_all)]
    pub async fn handle(&self, raw: &Value) -> PipelineOutput {
        let webhook_data = match WebhookData::parse(raw) {
            Ok(data) => data,
            Err(err) => {
                warn!(error = %err, "request rejected at intake");
                return PipelineOutput::InputError(ErrorResponse::for_input(&err));
            }
        };

        let mut envelope = Envelope::new(webhook_data, &self.default_workflow_id);
        self.resolve_config(&mut envelope).await;
        self.prepare_prompt(&mut envelope);
        self.invoke_substrate(&mut envelope).await;

        envelope.advance(FlowStep::Respond);
        PipelineOutput::Response(ResponseAssembler::assemble(&envelope))
    }

    /// Resolve the agent configuration into the envelope.
    ///
    /// A well-formed client-supplied `agent_config` bypasses resolution
    /// entirely and is tagged `frontend`; a malformed one is logged and
    /// resolution proceeds as if it were absent.
    pub async fn resolve_config(&self, envelope: &mut Envelope) {
        envelope.advance(FlowStep::Resolve);

        if let Some(config) = self.frontend_override(envelope) {
            envelope.log("using client-supplied configuration override");
            envelope.record_metric("config_source", json!(config.config_source.to_string()));
            envelope.agent_config = Some(config);
            return;
        }

        let resolution = self.resolver.resolve(&envelope.agent_key()).await;
        for event in &resolution.trail {
            envelope.log(format!("{:?}: {}", event.step, event.outcome));
        }
        envelope.record_metric(
            "config_source",
            json!(resolution.config.config_source.to_string()),
        );
        info!(source = %resolution.config.config_source, "configuration resolved");
        envelope.agent_config = Some(resolution.config);
    }

    fn frontend_override(&self, envelope: &mut Envelope) -> Option<AgentConfiguration> {
        let doc = envelope.webhook_data.agent_config.clone()?;
        match AgentConfiguration::from_document(
            &doc,
            &envelope.webhook_data.agent_id,
            ConfigSource::Frontend,
        ) {
            Ok(config) => Some(config),
            Err(err) => {
                warn!(error = %err, "client configuration override is malformed");
                envelope.record_error(format!("malformed agent_config override: {err}"));
                None
            }
        }
    }

    /// Classify the MCP provider and compose the system prompt.
    ///
    /// If an earlier stage somehow left no configuration behind, the
    /// fallback configuration is substituted here rather than failing.
    pub fn prepare_prompt(&self, envelope: &mut Envelope) {
        envelope.advance(FlowStep::Prepare);

        let config = match envelope.agent_config.clone() {
            Some(config) => config,
            None => {
                envelope.record_error("configuration missing at prepare; substituting fallback");
                let fallback = AgentConfiguration::fallback(&envelope.webhook_data.agent_id);
                envelope.agent_config = Some(fallback.clone());
                fallback
            }
        };

        let provider = McpProvider::classify(
            config
                .mcp_endpoints
                .first()
                .map(|endpoint| endpoint.url.as_str()),
        );
        envelope.session_state.mcp_provider = Some(provider);
        envelope.record_metric("mcp_provider", json!(provider));

        let tracking = &envelope.metadata.tracking;
        let prompt = format!(
            "{}\n\n[Session Context]\nsession_id: {}\nexecution_id: {}\ntrace_id: {}\nworkflow_id: {}",
            config.system_message,
            tracking.session_id,
            tracking.execution_id,
            tracking.trace_id,
            tracking.workflow_id,
        );
        envelope.session_state.system_prompt = Some(prompt);
        envelope.log("system prompt prepared");
    }

    /// Run the LLM substrate.
    ///
    /// A substrate failure is recorded in the envelope and the result is
    /// replaced with a degraded notice; the request still succeeds.
    pub async fn invoke_substrate(&self, envelope: &mut Envelope) {
        envelope.advance(FlowStep::Invoke);

        let config = envelope
            .agent_config
            .clone()
            .unwrap_or_else(|| AgentConfiguration::fallback(&envelope.webhook_data.agent_id));
        let request = InvokeRequest {
            system_message: envelope
                .session_state
                .system_prompt
                .clone()
                .unwrap_or_else(|| config.system_message.clone()),
            query: envelope.webhook_data.query.clone(),
            mcp_endpoints: config.mcp_endpoints,
        };

        match self.substrate.invoke(request).await {
            Ok(output) => {
                envelope.log(format!("substrate {} answered", self.substrate.name()));
                envelope.session_state.llm_output = Some(output);
            }
            Err(err) => {
                warn!(error = %err, substrate = self.substrate.name(), "substrate invocation failed");
                envelope.record_error(format!("substrate failed: {err}"));
                envelope.session_state.llm_output = Some(
                    "The assistant could not be reached; please retry shortly.".to_string(),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::http::CsvRegistryStore;
    use crate::adapters::memory::InMemoryConfigCache;
    use crate::adapters::substrates::MockSubstrate;
    use crate::domain::errors::FetchError;
    use crate::domain::ports::DocumentFetcher;
    use async_trait::async_trait;

    struct UnreachableFetcher;

    #[async_trait]
    impl DocumentFetcher for UnreachableFetcher {
        async fn fetch_json(&self, url: &str) -> Result<Value, FetchError> {
            Err(FetchError::Network {
                url: url.to_string(),
                message: "connection refused".to_string(),
            })
        }

        async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
            Err(FetchError::Network {
                url: url.to_string(),
                message: "connection refused".to_string(),
            })
        }
    }

    fn offline_pipeline(substrate: Arc<MockSubstrate>) -> RequestPipeline {
        let fetcher = Arc::new(UnreachableFetcher);
        let registry = Arc::new(CsvRegistryStore::new(
            fetcher.clone(),
            "https://registry.invalid/agents.csv",
        ));
        let resolver =
            ConfigResolver::new(registry, fetcher, Arc::new(InMemoryConfigCache::new()));
        RequestPipeline::new(resolver, substrate, "work-1001")
    }

    #[tokio::test]
    async fn missing_agent_id_short_circuits_before_invocation() {
        let substrate = Arc::new(MockSubstrate::new());
        let pipeline = offline_pipeline(substrate.clone());

        let output = pipeline
            .handle(&json!({"project_id": "p1", "query": "q"}))
            .await;

        match output {
            PipelineOutput::InputError(err) => {
                assert_eq!(err.missing_field.as_deref(), Some("agent_id"));
            }
            PipelineOutput::Response(_) => panic!("expected an input error"),
        }
        assert!(substrate.calls().await.is_empty());
    }

    #[tokio::test]
    async fn total_backend_failure_still_yields_a_success_response() {
        let substrate = Arc::new(MockSubstrate::with_reply("done"));
        let pipeline = offline_pipeline(substrate);

        let output = pipeline
            .handle(&json!({
                "project_id": "project_001",
                "agent_id": "agent_001",
                "query": "fintech news"
            }))
            .await;

        let PipelineOutput::Response(response) = output else {
            panic!("expected a response");
        };
        assert!(response.success);
        assert_eq!(response.metadata.config_source, ConfigSource::Fallback);
        assert_eq!(response.result, "done");
    }

    #[tokio::test]
    async fn frontend_override_bypasses_resolution() {
        let substrate = Arc::new(MockSubstrate::with_reply("ok"));
        let pipeline = offline_pipeline(substrate.clone());

        let output = pipeline
            .handle(&json!({
                "project_id": "p1",
                "agent_id": "a1",
                "query": "q",
                "agent_config": {
                    "agent_type": "fiscal_research",
                    "system_message": "You answer tax questions."
                }
            }))
            .await;

        let PipelineOutput::Response(response) = output else {
            panic!("expected a response");
        };
        assert_eq!(response.metadata.config_source, ConfigSource::Frontend);
        assert_eq!(response.agent, "fiscal_research");

        let calls = substrate.calls().await;
        assert_eq!(calls.len(), 1);
        assert!(calls[0].system_message.starts_with("You answer tax questions."));
    }

    #[tokio::test]
    async fn substrate_failure_degrades_without_failing_the_request() {
        let substrate = Arc::new(MockSubstrate::new());
        substrate.push_failure("upstream timed out").await;
        let pipeline = offline_pipeline(substrate);

        let output = pipeline
            .handle(&json!({"project_id": "p1", "agent_id": "a1", "query": "q"}))
            .await;

        let PipelineOutput::Response(response) = output else {
            panic!("expected a response");
        };
        assert!(response.success);
        assert!(response.result.contains("could not be reached"));
    }

    #[tokio::test]
    async fn envelope_trail_is_append_only_across_stages() {
        let substrate = Arc::new(MockSubstrate::with_reply("ok"));
        let pipeline = offline_pipeline(substrate);

        let webhook = WebhookData::parse(&json!({
            "project_id": "p1",
            "agent_id": "a1",
            "query": "q"
        }))
        .unwrap();
        let mut envelope = Envelope::new(webhook, "work-1001");

        let mut log_len = envelope.observability.logs.len();
        pipeline.resolve_config(&mut envelope).await;
        assert!(envelope.observability.logs.len() > log_len);
        log_len = envelope.observability.logs.len();

        pipeline.prepare_prompt(&mut envelope);
        assert!(envelope.observability.logs.len() > log_len);
        assert!(envelope.session_state.system_prompt.is_some());

        pipeline.invoke_substrate(&mut envelope).await;
        assert_eq!(
            envelope.session_state.steps_completed,
            vec![
                FlowStep::Intake,
                FlowStep::Resolve,
                FlowStep::Prepare,
                FlowStep::Invoke
            ]
        );
    }
}
