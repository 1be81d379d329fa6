//! # Repository Module
//!
//! Database repository implementations for C4 Commerce.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Who Writes What                                      │
//! │                                                                         │
//! │  ServiceRepository      services       (seed + admin correction)        │
//! │  OrderRepository        orders         (create, status, customer)       │
//! │                         counters       (order sequence)                 │
//! │  TransactionRepository  transactions   (append-only)                    │
//! │                         orders.status  (callback sync)                  │
//! │                         payments       (callback upsert)                │
//! │  PaymentRepository      payments       (manual record, reads)           │
//! │  UserRepository         users          (create-or-get)                  │
//! │  ReportRepository       reports                                         │
//! │                                                                         │
//! │  Nothing but OrderRepository writes orders.amount / unit_price.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ServiceRepository`](service::ServiceRepository) - Catalog lookup and seeding
//! - [`OrderRepository`](order::OrderRepository) - Order ledger
//! - [`PaymentRepository`](payment::PaymentRepository) - Payment ledger and summary
//! - [`TransactionRepository`](transaction::TransactionRepository) - Callback reconciliation
//! - [`UserRepository`](user::UserRepository) - User directory
//! - [`ReportRepository`](report::ReportRepository) - Support tickets

pub mod order;
pub mod payment;
pub mod report;
pub mod service;
pub mod transaction;
pub mod user;
