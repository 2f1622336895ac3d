//! Ledgerhook webhook ingestion service.
//!
//! Main entry point for the ledgerhook server. Initializes all
//! subsystems and coordinates graceful startup and shutdown.

use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use ledgerhook_api::{middleware::auth::SharedSecret, server::AppState, Config};
use ledgerhook_core::{storage::Storage, RealClock};
use sqlx::postgres::PgPoolOptions;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Configuration is loaded before tracing so a missing webhook
    // secret fails the process immediately.
    let config = Config::load()?;

    init_tracing(&config.rust_log)?;

    info!("Starting ledgerhook webhook ingestion service");
    info!(
        database_url = %config.database_url_masked(),
        host = %config.host,
        port = config.port,
        max_connections = config.database_max_connections,
        "Configuration loaded"
    );

    let db_pool = create_database_pool(&config).await?;
    info!("Database connection pool established");

    run_migrations(&db_pool).await?;
    info!("Database migrations completed");

    let storage = Arc::new(Storage::new(db_pool.clone()));
    let store = Arc::new(ledgerhook_api::store::PostgresTransactionStore::new(storage));
    let state = AppState::new(
        store,
        SharedSecret::new(config.webhook_secret.clone()),
        Arc::new(RealClock),
    );

    let addr = config.parse_server_addr()?;
    let request_timeout = Duration::from_secs(config.request_timeout);

    info!(addr = %addr, "Ledgerhook is ready to receive webhooks");

    ledgerhook_api::start_server(state, addr, request_timeout)
        .await
        .context("HTTP server failed")?;

    db_pool.close().await;
    info!("Database connections closed");

    info!("Ledgerhook shutdown complete");
    Ok(())
}

/// Initializes tracing with the configured filter directive.
fn init_tracing(directive: &str) -> Result<()> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_new(directive)
        .or_else(|_| EnvFilter::try_new("info,ledgerhook=debug,tower_http=debug"))
        .context("Invalid log filter directive")?;

    let fmt_layer = fmt::layer().with_target(true).with_file(true).with_line_number(true);

    tracing_subscriber::registry().with(filter).with(fmt_layer).init();
    Ok(())
}

/// Creates the database connection pool with retry logic.
async fn create_database_pool(config: &Config) -> Result<sqlx::PgPool> {
    let mut retries = 0;
    const MAX_RETRIES: u32 = 5;
    const RETRY_DELAY: Duration = Duration::from_secs(2);

    loop {
        match PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(Duration::from_secs(config.database_connection_timeout))
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(1800))
            .connect(&config.database_url)
            .await
        {
            Ok(pool) => {
                // Verify connection works
                sqlx::query("SELECT 1")
                    .fetch_one(&pool)
                    .await
                    .context("Failed to verify database connection")?;

                return Ok(pool);
            },
            Err(_e) if retries < MAX_RETRIES => {
                retries += 1;
                info!(
                    attempt = retries,
                    max_retries = MAX_RETRIES,
                    "Database connection failed, retrying..."
                );
                tokio::time::sleep(RETRY_DELAY).await;
            },
            Err(e) => {
                return Err(e).context("Failed to create database connection pool after retries");
            },
        }
    }
}

/// Runs database migrations.
async fn run_migrations(pool: &sqlx::PgPool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS transactions (
            id UUID PRIMARY KEY,
            user_id TEXT NOT NULL,
            amount DOUBLE PRECISION NOT NULL,
            type TEXT NOT NULL CHECK (type IN ('income', 'expense')),
            description TEXT NOT NULL,
            date TIMESTAMPTZ NOT NULL,
            source TEXT NOT NULL,
            dedup_key TEXT NOT NULL,
            received_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            UNIQUE (dedup_key)
        )
        "#,
    )
    .execute(pool)
    .await
    .context("Failed to create transactions table")?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_transactions_user
        ON transactions(user_id, date DESC)
        "#,
    )
    .execute(pool)
    .await
    .context("Failed to create transactions user index")?;

    Ok(())
}
