//! HTTP-backed port implementations.

pub mod csv_registry;
pub mod document_client;

pub use csv_registry::CsvRegistryStore;
pub use document_client::{HttpDocumentFetcher, HttpFetcherConfig};
