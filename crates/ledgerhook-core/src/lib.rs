//! Core domain types and normalization logic.
//!
//! Provides the canonical transaction model, the per-source payload
//! normalizers, the transactions repository, and the clock abstraction
//! used to default event timestamps deterministically in tests.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod models;
pub mod normalize;
pub mod storage;
pub mod time;

pub use error::{CoreError, Result};
pub use models::{NewTransaction, Source, TransactionId, TransactionKind};
pub use normalize::{normalize, Envelope, NormalizeError};
pub use time::{Clock, RealClock, TestClock};
