//! Port definitions (trait seams) for the backends the resolver uses.

pub mod config_cache;
pub mod document_fetcher;
pub mod llm_substrate;
pub mod registry_store;
pub mod variable_store;

pub use config_cache::{CacheEntry, ConfigCache, NullConfigCache};
pub use document_fetcher::DocumentFetcher;
pub use llm_substrate::{InvokeRequest, LlmSubstrate};
pub use registry_store::RegistryStore;
pub use variable_store::{IdMatch, VariableFilter, VariableStore};
