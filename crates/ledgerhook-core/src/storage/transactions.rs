//! Repository for canonical transaction rows.

use std::sync::Arc;

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    error::Result,
    models::{NewTransaction, TransactionId},
};

/// Repository for transaction inserts and dedup lookups.
///
/// The insert is the service's only durable effect: exactly zero or one
/// row per ingested webhook, enforced by the dedup unique constraint.
pub struct Repository {
    pool: Arc<PgPool>,
}

impl Repository {
    /// Creates a new repository instance.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Returns a reference to the database pool.
    pub fn pool(&self) -> Arc<PgPool> {
        self.pool.clone()
    }

    /// Inserts a canonical transaction, ignoring duplicates.
    ///
    /// Returns the new row's id, or `None` when a row with the same
    /// dedup key already exists. The conflict check and insert are one
    /// atomic statement, so concurrent redelivery cannot produce two
    /// rows.
    ///
    /// # Errors
    ///
    /// Returns error if the insert fails for any reason other than the
    /// dedup conflict.
    pub async fn insert(&self, tx: &NewTransaction) -> Result<Option<TransactionId>> {
        let id: Option<Uuid> = sqlx::query_scalar(
            r#"
            INSERT INTO transactions (
                id, user_id, amount, type, description, date,
                source, dedup_key, received_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (dedup_key) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(TransactionId::new().0)
        .bind(&tx.user_id)
        .bind(tx.amount)
        .bind(tx.kind.to_string())
        .bind(&tx.description)
        .bind(tx.date)
        .bind(tx.source.to_string())
        .bind(&tx.dedup_key)
        .bind(Utc::now())
        .fetch_optional(&*self.pool)
        .await?;

        Ok(id.map(TransactionId::from))
    }

    /// Finds the id of the transaction holding the given dedup key.
    ///
    /// Used after a suppressed duplicate insert to return the original
    /// row's id to the sender.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    pub async fn find_by_dedup_key(&self, dedup_key: &str) -> Result<Option<TransactionId>> {
        let id: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM transactions WHERE dedup_key = $1")
                .bind(dedup_key)
                .fetch_optional(&*self.pool)
                .await?;

        Ok(id.map(TransactionId::from))
    }
}
