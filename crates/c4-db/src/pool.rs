//! # Database Handle
//!
//! One SQLite file shared by the HTTP handlers and the seed binary.
//!
//! ## Write Contention
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                  Who waits where                                        │
//! │                                                                         │
//! │  POST /payment/success ──┐                                              │
//! │  POST /api/orders ───────┼──► SqlitePool (max_connections)              │
//! │  GET  /api/payments ─────┘        │                                     │
//! │                                   │ no free connection within           │
//! │                                   │ acquire_timeout ⇒ PoolExhausted     │
//! │                                   ▼                                     │
//! │                            SQLite (WAL)                                 │
//! │                                   │ writer lock held longer than        │
//! │                                   │ acquire_timeout ⇒ QueryFailed       │
//! │                                   ▼                                     │
//! │                     both are retryable: the gateway redelivers          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Readers never block the single writer under WAL, so dashboards stay
//! responsive while callbacks are being reconciled.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::order::OrderRepository;
use crate::repository::payment::PaymentRepository;
use crate::repository::report::ReportRepository;
use crate::repository::service::ServiceRepository;
use crate::repository::transaction::TransactionRepository;
use crate::repository::user::UserRepository;
use c4_core::DEFAULT_ORDER_PREFIX;

// =============================================================================
// Configuration
// =============================================================================

/// Where the store lives and how long callers may wait on it.
///
/// ```rust,ignore
/// let config = DbConfig::new("./c4.db")
///     .max_connections(5)
///     .acquire_timeout(Duration::from_secs(5))
///     .order_prefix("ORDER");
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub database_path: PathBuf,

    pub max_connections: u32,

    /// Upper bound on waiting for a pooled connection and on SQLite's busy
    /// handler. A stalled store therefore fails fast instead of holding a
    /// gateway callback open.
    pub acquire_timeout: Duration,

    /// Apply embedded migrations while opening.
    pub run_migrations: bool,

    /// Prefix of generated order ids (`ORDER-20250101120000-0001`).
    pub order_prefix: String,
}

impl DbConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            acquire_timeout: Duration::from_secs(5),
            run_migrations: true,
            order_prefix: DEFAULT_ORDER_PREFIX.to_string(),
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    pub fn order_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.order_prefix = prefix.into();
        self
    }

    /// A private, empty store for tests.
    ///
    /// Each `:memory:` connection is its own database, so the pool is
    /// pinned to one connection.
    pub fn in_memory() -> Self {
        DbConfig::new(":memory:").max_connections(1)
    }
}

// =============================================================================
// Database
// =============================================================================

/// Handle to the store; clones share one pool.
///
/// Repositories are built on demand and hold nothing but a pool clone.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
    order_prefix: String,
}

impl Database {
    /// Opens (creating if needed) the SQLite file and brings the schema up
    /// to date.
    ///
    /// ## Errors
    /// - `DbError::ConnectionFailed` if the file cannot be opened
    /// - `DbError::MigrationFailed` if the schema cannot be applied
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        let connect_url = format!("sqlite://{}?mode=rwc", config.database_path.display());

        let connect_options = SqliteConnectOptions::from_str(&connect_url)
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            // orders → services, payments → orders/users
            .foreign_keys(true)
            .busy_timeout(config.acquire_timeout)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(1)
            .acquire_timeout(config.acquire_timeout)
            .connect_with(connect_options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        info!(
            path = %config.database_path.display(),
            max_connections = config.max_connections,
            acquire_timeout_ms = config.acquire_timeout.as_millis() as u64,
            "Database pool created"
        );

        if config.run_migrations {
            migrations::run_migrations(&pool).await?;
        }

        Ok(Database {
            pool,
            order_prefix: config.order_prefix,
        })
    }

    /// Raw pool, for test fixtures that need statements no repository covers.
    #[cfg(test)]
    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn services(&self) -> ServiceRepository {
        ServiceRepository::new(self.pool.clone())
    }

    pub fn orders(&self) -> OrderRepository {
        OrderRepository::new(self.pool.clone(), self.order_prefix.clone())
    }

    pub fn payments(&self) -> PaymentRepository {
        PaymentRepository::new(self.pool.clone())
    }

    /// Callback ingestion and the audit trail.
    pub fn transactions(&self) -> TransactionRepository {
        TransactionRepository::new(self.pool.clone())
    }

    pub fn users(&self) -> UserRepository {
        UserRepository::new(self.pool.clone())
    }

    pub fn reports(&self) -> ReportRepository {
        ReportRepository::new(self.pool.clone())
    }

    /// Waits for in-flight queries, then closes every connection.
    pub async fn close(&self) {
        info!("Closing database pool");
        self.pool.close().await;
    }

    /// True when a trivial query round-trips (used by `GET /api/health`).
    pub async fn health_check(&self) -> bool {
        sqlx::query_scalar::<_, i64>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .is_ok()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
