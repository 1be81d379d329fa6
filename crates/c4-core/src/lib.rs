//! # c4-core: Pure Business Logic for C4 Commerce
//!
//! This crate is the **heart** of the commerce service. It contains the
//! pricing, signing and callback-normalization rules as pure functions with
//! zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        C4 Commerce Architecture                         │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐    │
//! │  │                    HTTP API (apps/api, axum)                    │    │
//! │  │    /orders ──► /payments/aba/checkout ──► /payment/success      │    │
//! │  └─────────────────────────────┬───────────────────────────────────┘    │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐    │
//! │  │               ★ c4-core (THIS CRATE) ★                          │    │
//! │  │                                                                 │    │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐    │    │
//! │  │   │   types   │  │   money   │  │ checkout  │  │ callback  │    │    │
//! │  │   │  Order    │  │   Money   │  │  Signer   │  │  aliases  │    │    │
//! │  │   │  Payment  │  │  parse    │  │ HMAC-512  │  │  parsing  │    │    │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘    │    │
//! │  │                                                                 │    │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS            │    │
//! │  └─────────────────────────────────────────────────────────────────┘    │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐    │
//! │  │                    c4-db (Database Layer)                       │    │
//! │  │        SQLite ledgers, reconciliation engine, migrations        │    │
//! │  └─────────────────────────────────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Service, Order, Payment, Transaction, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`error`] - Domain error types
//! - [`validation`] - Input coercion and validation rules
//! - [`order_id`] - Order identifier formatting
//! - [`checkout`] - Hosted-checkout payload assembly and signing
//! - [`callback`] - Gateway callback field resolution
//!
//! ## Example Usage
//!
//! ```rust
//! use c4_core::money::Money;
//!
//! let unit_price = Money::parse("9.99").unwrap();
//! let amount = unit_price.multiply_quantity(2).unwrap();
//!
//! assert_eq!(amount.cents(), 1998);
//! assert_eq!(amount.to_decimal_string(), "19.98");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod callback;
pub mod checkout;
pub mod error;
pub mod money;
pub mod order_id;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use callback::{FieldValue, GatewayCallback};
pub use checkout::{Checkout, CheckoutCustomer, CheckoutPayload, CheckoutSigner, PaywayConfig};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Currency used when neither the caller nor the gateway names one.
pub const DEFAULT_CURRENCY: &str = "USD";

/// Prefix of generated order identifiers (`ORDER-20250101120000-0001`).
pub const DEFAULT_ORDER_PREFIX: &str = "ORDER";

/// Payment method recorded for payments captured through the hosted checkout.
pub const GATEWAY_METHOD: &str = "ABA PayWay";

/// Customer name used when the customer details carry no usable name.
pub const GUEST_CUSTOMER_NAME: &str = "Guest";
