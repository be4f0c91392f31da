//! Infrastructure: settings loading and logging.

pub mod config;
pub mod logging;
