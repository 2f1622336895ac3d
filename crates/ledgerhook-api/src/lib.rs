//! Ledgerhook HTTP API.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod server;
pub mod store;

pub use config::Config;
pub use error::IngestError;
pub use server::{create_router, start_server, AppState};
