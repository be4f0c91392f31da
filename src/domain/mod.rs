//! Domain layer: models, errors, and port definitions.

pub mod errors;
pub mod models;
pub mod ports;
