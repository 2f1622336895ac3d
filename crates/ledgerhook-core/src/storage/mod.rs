//! Database access layer for canonical transactions.
//!
//! Repositories translate between domain models and the database schema.
//! All SQL lives in this module; handlers and normalizers never touch the
//! pool directly.

use std::sync::Arc;

use sqlx::PgPool;

pub mod transactions;

use crate::error::Result;

/// Container for repository instances sharing one connection pool.
#[derive(Clone)]
pub struct Storage {
    /// Repository for canonical transaction rows.
    pub transactions: Arc<transactions::Repository>,
}

impl Storage {
    /// Creates a new storage instance with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        let pool = Arc::new(pool);

        Self { transactions: Arc::new(transactions::Repository::new(pool)) }
    }

    /// Performs a health check on the database connection.
    ///
    /// Executes a trivial query to verify connectivity; used by the
    /// `/health` probe.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Database` if the connection is unhealthy.
    pub async fn health_check(&self) -> Result<()> {
        let _: (i32,) = sqlx::query_as("SELECT 1").fetch_one(&*self.transactions.pool()).await?;

        Ok(())
    }
}
