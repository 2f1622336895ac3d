//! Storage abstraction for the ingest handler.
//!
//! The handler only needs "insert one canonical row, dedup-aware" and a
//! connectivity probe, so those two operations are the whole trait.
//! Production uses the PostgreSQL repositories from `ledgerhook-core`;
//! tests inject an in-memory recording store to assert that rejected
//! requests never reach persistence.

use std::{future::Future, pin::Pin, sync::Arc};

use ledgerhook_core::{error::Result, NewTransaction, TransactionId};

/// Outcome of a dedup-aware insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// A new row was written.
    Inserted(TransactionId),
    /// A row with the same dedup key already existed; nothing was
    /// written and this is its id.
    Duplicate(TransactionId),
}

impl InsertOutcome {
    /// The transaction id regardless of whether the row was new.
    pub const fn id(self) -> TransactionId {
        match self {
            Self::Inserted(id) | Self::Duplicate(id) => id,
        }
    }
}

/// Persistence operations required by the ingest flow.
pub trait TransactionStore: Send + Sync + 'static {
    /// Inserts a canonical transaction, suppressing duplicates.
    ///
    /// Exactly zero or one row is written per call.
    fn insert(
        &self,
        tx: NewTransaction,
    ) -> Pin<Box<dyn Future<Output = Result<InsertOutcome>> + Send + '_>>;

    /// Verifies the store is reachable. Used by the health probe.
    fn health_check(&self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Production store backed by PostgreSQL.
pub struct PostgresTransactionStore {
    storage: Arc<ledgerhook_core::storage::Storage>,
}

impl PostgresTransactionStore {
    /// Creates a new PostgreSQL store adapter.
    pub fn new(storage: Arc<ledgerhook_core::storage::Storage>) -> Self {
        Self { storage }
    }
}

impl TransactionStore for PostgresTransactionStore {
    fn insert(
        &self,
        tx: NewTransaction,
    ) -> Pin<Box<dyn Future<Output = Result<InsertOutcome>> + Send + '_>> {
        let storage = self.storage.clone();
        Box::pin(async move {
            if let Some(id) = storage.transactions.insert(&tx).await? {
                return Ok(InsertOutcome::Inserted(id));
            }

            // The insert was suppressed by the dedup constraint, so the
            // original row must exist; a miss here means it was deleted
            // out from under us between the two statements.
            let id = storage.transactions.find_by_dedup_key(&tx.dedup_key).await?.ok_or_else(
                || {
                    ledgerhook_core::CoreError::Database(format!(
                        "duplicate row for dedup key {} disappeared during lookup",
                        tx.dedup_key
                    ))
                },
            )?;
            Ok(InsertOutcome::Duplicate(id))
        })
    }

    fn health_check(&self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let storage = self.storage.clone();
        Box::pin(async move { storage.health_check().await })
    }
}

pub mod mock {
    //! In-memory recording store for handler tests.
    //!
    //! Counts every insert attempt so tests can assert the persistence
    //! collaborator was never invoked on rejected requests, and mirrors
    //! the dedup semantics of the real repository.

    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use ledgerhook_core::CoreError;
    use tokio::sync::RwLock;

    use super::{
        Arc, Future, InsertOutcome, NewTransaction, Pin, Result, TransactionId, TransactionStore,
    };

    /// Recording in-memory transaction store.
    pub struct RecordingStore {
        rows: Arc<RwLock<Vec<(TransactionId, NewTransaction)>>>,
        insert_calls: Arc<AtomicUsize>,
        fail_next_insert: Arc<RwLock<Option<String>>>,
        healthy: Arc<AtomicBool>,
    }

    impl RecordingStore {
        /// Creates an empty recording store.
        pub fn new() -> Self {
            Self {
                rows: Arc::new(RwLock::new(Vec::new())),
                insert_calls: Arc::new(AtomicUsize::new(0)),
                fail_next_insert: Arc::new(RwLock::new(None)),
                healthy: Arc::new(AtomicBool::new(true)),
            }
        }

        /// Number of times `insert` was invoked, including failed calls.
        pub fn insert_calls(&self) -> usize {
            self.insert_calls.load(Ordering::SeqCst)
        }

        /// Snapshot of the persisted rows.
        pub async fn rows(&self) -> Vec<NewTransaction> {
            self.rows.read().await.iter().map(|(_, tx)| tx.clone()).collect()
        }

        /// Makes the next insert fail with a database error.
        pub async fn fail_next_insert(&self, message: impl Into<String>) {
            *self.fail_next_insert.write().await = Some(message.into());
        }

        /// Marks the store unhealthy for the health probe.
        pub fn set_unhealthy(&self) {
            self.healthy.store(false, Ordering::SeqCst);
        }
    }

    impl Default for RecordingStore {
        fn default() -> Self {
            Self::new()
        }
    }

    impl TransactionStore for RecordingStore {
        fn insert(
            &self,
            tx: NewTransaction,
        ) -> Pin<Box<dyn Future<Output = Result<InsertOutcome>> + Send + '_>> {
            let rows = self.rows.clone();
            let calls = self.insert_calls.clone();
            let fail_next = self.fail_next_insert.clone();

            Box::pin(async move {
                calls.fetch_add(1, Ordering::SeqCst);

                if let Some(message) = fail_next.write().await.take() {
                    return Err(CoreError::Database(message));
                }

                let mut rows = rows.write().await;
                if let Some((id, _)) =
                    rows.iter().find(|(_, existing)| existing.dedup_key == tx.dedup_key)
                {
                    return Ok(InsertOutcome::Duplicate(*id));
                }

                let id = TransactionId::new();
                rows.push((id, tx));
                Ok(InsertOutcome::Inserted(id))
            })
        }

        fn health_check(&self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
            let healthy = self.healthy.load(Ordering::SeqCst);
            Box::pin(async move {
                if healthy {
                    Ok(())
                } else {
                    Err(CoreError::Database("store marked unhealthy".to_string()))
                }
            })
        }
    }
}
