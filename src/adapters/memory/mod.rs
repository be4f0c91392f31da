//! In-memory port implementations.

pub mod config_cache;
pub mod variable_store;

pub use config_cache::InMemoryConfigCache;
pub use variable_store::InMemoryVariableStore;
