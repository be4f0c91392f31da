//! Conflux - Envelope-based agent configuration resolver
//!
//! Conflux resolves a complete agent configuration for an inbound AI
//! request by layering a CSV registry lookup, a remote JSON config fetch,
//! a TTL-bounded cache, and a local fallback, while threading an
//! accumulating envelope of state, metrics, and audit data through each
//! pipeline stage.
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): Models, errors, and port definitions
//! - **Service Layer** (`services`): The resolver state machine, variable
//!   precedence resolution, and the request pipeline
//! - **Adapters** (`adapters`): HTTP and in-memory port implementations
//! - **Infrastructure Layer** (`infrastructure`): Settings loading and
//!   logging initialization
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use conflux::adapters::http::{CsvRegistryStore, HttpDocumentFetcher};
//! use conflux::adapters::memory::InMemoryConfigCache;
//! use conflux::services::ConfigResolver;
//! use conflux::domain::models::AgentKey;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let fetcher = Arc::new(HttpDocumentFetcher::new()?);
//!     let registry = Arc::new(CsvRegistryStore::new(
//!         fetcher.clone(),
//!         "https://example.com/registry/agents.csv",
//!     ));
//!     let cache = Arc::new(InMemoryConfigCache::new());
//!     let resolver = ConfigResolver::new(registry, fetcher, cache);
//!
//!     let key = AgentKey::new("work-1001", "project_001", "agent_001");
//!     let resolution = resolver.resolve(&key).await;
//!     println!("{:?}", resolution.config.config_source);
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::errors::{DomainError, DomainResult, FetchError, RegistryError};
pub use domain::models::{
    AgentConfiguration, AgentKey, AgentResponse, ConfigSource, Envelope, FlowStep, RegistryRow,
    Settings, Variable, VariableContext, VariableScope,
};
pub use domain::ports::{
    ConfigCache, DocumentFetcher, LlmSubstrate, RegistryStore, VariableStore,
};
pub use infrastructure::config::{SettingsError, SettingsLoader};
pub use services::{
    ConfigResolver, PipelineOutput, RequestPipeline, Resolution, ResponseAssembler,
    VariablePrecedenceResolver,
};
