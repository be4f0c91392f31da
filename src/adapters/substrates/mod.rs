//! LLM substrate implementations.

pub mod mock;

pub use mock::MockSubstrate;
