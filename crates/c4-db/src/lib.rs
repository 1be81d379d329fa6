//! # c4-db: Database Layer for C4 Commerce
//!
//! This crate provides persistence for the commerce service: the catalog,
//! the order/payment/transaction ledgers, and the reconciliation of gateway
//! callbacks against them.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        C4 Commerce Data Flow                            │
//! │                                                                         │
//! │  HTTP handler (POST /payment/success)                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐    │
//! │  │                     c4-db (THIS CRATE)                          │    │
//! │  │                                                                 │    │
//! │  │   ┌───────────────┐    ┌────────────────┐   ┌──────────────┐    │    │
//! │  │   │   Database    │    │  Repositories  │   │  Migrations  │    │    │
//! │  │   │   (pool.rs)   │    │                │   │  (embedded)  │    │    │
//! │  │   │               │    │ ServiceRepo    │   │ 001_init.sql │    │    │
//! │  │   │ SqlitePool    │◄───│ OrderRepo      │   │              │    │    │
//! │  │   │ Connection    │    │ PaymentRepo    │   │              │    │    │
//! │  │   │ Management    │    │ TransactionRepo│   │              │    │    │
//! │  │   │               │    │ UserRepo       │   │              │    │    │
//! │  │   │               │    │ ReportRepo     │   │              │    │    │
//! │  │   └───────────────┘    └────────────────┘   └──────────────┘    │    │
//! │  │                                                                 │    │
//! │  └─────────────────────────────────────────────────────────────────┘    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐    │
//! │  │                     SQLite Database (c4.db)                     │    │
//! │  └─────────────────────────────────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use c4_db::{Database, DbConfig};
//! use serde_json::json;
//!
//! let db = Database::new(DbConfig::new("c4.db")).await?;
//!
//! let order = db.orders().create(1, &json!(2), &json!({"name": "Ana"})).await?;
//! let txn = db
//!     .transactions()
//!     .ingest(json!({"order_id": order.id, "amount": "19.98"}).as_object().unwrap())
//!     .await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::order::OrderRepository;
pub use repository::payment::PaymentRepository;
pub use repository::report::ReportRepository;
pub use repository::service::{normalize_image_name, ServiceRepository};
pub use repository::transaction::TransactionRepository;
pub use repository::user::UserRepository;
