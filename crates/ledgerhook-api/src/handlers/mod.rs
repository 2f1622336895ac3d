//! HTTP request handlers.

pub mod health;
pub mod ingest;

pub use health::{health_check, liveness_check};
pub use ingest::ingest_webhook;
