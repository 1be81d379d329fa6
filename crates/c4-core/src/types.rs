//! # Domain Types
//!
//! Core domain types used throughout C4 Commerce.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐        │
//! │  │    Service      │   │      Order      │   │    Payment      │        │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │        │
//! │  │  id (int)       │◄──│  service_id     │◄──│  order_id (FK)  │        │
//! │  │  name (unique)  │   │  id (ORDER-..)  │   │  gateway_ref    │        │
//! │  │  price          │   │  amount, status │   │  (unique)       │        │
//! │  └─────────────────┘   └────────▲────────┘   └─────────────────┘        │
//! │                                 │ optional                              │
//! │  ┌─────────────────┐   ┌────────┴────────┐   ┌─────────────────┐        │
//! │  │      User       │   │   Transaction   │   │     Report      │        │
//! │  │  email (unique) │   │  tran_id (uniq) │   │  support ticket │        │
//! │  │                 │   │  raw_payload    │   │                 │        │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! - Orders use a human-readable string id (`ORDER-20250101120000-0001`).
//! - Everything else uses an autoincrement integer id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;
use crate::money::Money;
use crate::GUEST_CUSTOMER_NAME;

// =============================================================================
// Service
// =============================================================================

/// A sellable service from the catalog.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Service {
    pub id: i64,

    /// Unique display name.
    pub name: String,

    /// Non-negative unit price.
    pub price: Money,

    /// Static asset file name, already normalized.
    pub image: Option<String>,

    pub description: Option<String>,
    pub long_description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data for inserting or correcting a catalog entry.
#[derive(Debug, Clone)]
pub struct NewService {
    pub name: String,
    pub price: Money,
    pub image: Option<String>,
    pub description: Option<String>,
    pub long_description: Option<String>,
}

// =============================================================================
// Order Status
// =============================================================================

/// Lifecycle status of an order.
///
/// ## Status Flow
/// ```text
/// ┌─────────┐   checkout   ┌────────────┐   callback   ┌────────┐
/// │ Pending │ ───────────► │ Processing │ ───────────► │  Paid  │
/// └─────────┘              └────────────┘              └────────┘
///      │                                                   │
///      └──► Cancelled / Failed                 Refunded ◄──┘
/// ```
///
/// The flow above is the usual path, not an enforced graph: an operator may
/// move an order between any two statuses.
///
/// `Other` carries whatever status a gateway callback reported when it is not
/// one of the known values. Clients can never set it through the API
/// ([`OrderStatus::from_str`] rejects unknown values).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Paid,
    Cancelled,
    Refunded,
    Failed,
    Other(String),
}

impl OrderStatus {
    /// Statuses a client may request, in sorted order.
    pub const ALLOWED: [&'static str; 6] = [
        "cancelled",
        "failed",
        "paid",
        "pending",
        "processing",
        "refunded",
    ];

    /// Wire representation.
    pub fn as_str(&self) -> &str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Paid => "paid",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Refunded => "refunded",
            OrderStatus::Failed => "failed",
            OrderStatus::Other(s) => s.as_str(),
        }
    }

    /// Maps a normalized gateway status onto an order status.
    ///
    /// `success` means the order is paid. Anything else is copied verbatim,
    /// so `"failed"` becomes [`OrderStatus::Failed`] and `"declined"` becomes
    /// `Other("declined")`.
    pub fn from_gateway(status: &str) -> Self {
        if status == "success" {
            return OrderStatus::Paid;
        }
        OrderStatus::from_str(status).unwrap_or_else(|_| OrderStatus::Other(status.to_string()))
    }

    /// Reads a stored status. Never fails: unknown text becomes `Other`.
    pub fn from_stored(status: &str) -> Self {
        OrderStatus::from_str(status).unwrap_or_else(|_| OrderStatus::Other(status.to_string()))
    }
}

impl FromStr for OrderStatus {
    type Err = ValidationError;

    /// Case-insensitive parse of a client-supplied status.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(OrderStatus::Pending),
            "processing" => Ok(OrderStatus::Processing),
            "paid" => Ok(OrderStatus::Paid),
            "cancelled" => Ok(OrderStatus::Cancelled),
            "refunded" => Ok(OrderStatus::Refunded),
            "failed" => Ok(OrderStatus::Failed),
            _ => Err(ValidationError::NotAllowed {
                field: "status".to_string(),
                allowed: OrderStatus::ALLOWED.iter().map(|s| s.to_string()).collect(),
            }),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for OrderStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

// =============================================================================
// Customer Details
// =============================================================================

/// Customer information attached to an order.
///
/// Clients send a loose JSON object. Known keys are lifted into typed fields
/// through a fixed alias table; everything else is kept in `extra` so nothing
/// the client sent is lost.
///
/// | Field       | Accepted keys            |
/// |-------------|--------------------------|
/// | `full_name` | `full_name`, `fullName`  |
/// | `name`      | `name`                   |
/// | `email`     | `email`                  |
/// | `phone`     | `phone`                  |
/// | `company`   | `company`                |
/// | `user_id`   | `userId`, `user_id`      |
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CustomerDetails {
    pub name: Option<String>,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub user_id: Option<i64>,
    pub extra: Map<String, Value>,
}

const FULL_NAME_KEYS: &[&str] = &["full_name", "fullName"];
const USER_ID_KEYS: &[&str] = &["userId", "user_id"];

impl CustomerDetails {
    /// Builds customer details from an arbitrary JSON value.
    ///
    /// Anything that is not an object yields empty details. A bare string is
    /// taken as the customer's name.
    pub fn from_value(value: &Value) -> Self {
        let object = match value {
            Value::Object(map) => map,
            Value::String(s) if !s.trim().is_empty() => {
                return CustomerDetails {
                    name: Some(s.trim().to_string()),
                    ..Default::default()
                }
            }
            _ => return CustomerDetails::default(),
        };

        let mut extra = object.clone();
        let mut take_text = |keys: &[&str]| -> Option<String> {
            let mut found = None;
            for key in keys {
                if let Some(v) = extra.remove(*key) {
                    if found.is_none() {
                        found = text_of(&v);
                    }
                }
            }
            found
        };

        let full_name = take_text(FULL_NAME_KEYS);
        let name = take_text(&["name"]);
        let email = take_text(&["email"]);
        let phone = take_text(&["phone"]);
        let company = take_text(&["company"]);
        let user_id = take_text(USER_ID_KEYS).and_then(|s| s.parse().ok());

        CustomerDetails {
            name,
            full_name,
            email,
            phone,
            company,
            user_id,
            extra,
        }
    }

    /// Display name for the order: full name, then name, then `"Guest"`.
    pub fn display_name(&self) -> String {
        self.full_name
            .as_deref()
            .or(self.name.as_deref())
            .unwrap_or(GUEST_CUSTOMER_NAME)
            .to_string()
    }

    /// Renders the details back to JSON with camelCase keys.
    pub fn to_value(&self) -> Value {
        let mut map = self.extra.clone();
        let mut put = |key: &str, value: &Option<String>| {
            if let Some(v) = value {
                map.insert(key.to_string(), Value::String(v.clone()));
            }
        };
        put("name", &self.name);
        put("fullName", &self.full_name);
        put("email", &self.email);
        put("phone", &self.phone);
        put("company", &self.company);
        if let Some(id) = self.user_id {
            map.insert("userId".to_string(), Value::from(id));
        }
        Value::Object(map)
    }
}

impl Serialize for CustomerDetails {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

/// Stringifies a scalar, treating blanks and non-scalars as absent.
fn text_of(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

// =============================================================================
// Order
// =============================================================================

/// A purchase of one service, priced at creation time.
///
/// `amount` is always `unit_price * quantity` and is only ever written when
/// the order is created.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: String,
    pub service_id: i64,
    pub unit_price: Money,
    pub quantity: i64,
    pub amount: Money,
    pub customer_name: String,
    pub customer_details: CustomerDetails,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Payment
// =============================================================================

/// A captured (or attempted) payment for an order.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Payment {
    pub id: i64,
    pub order_id: String,
    pub user_id: Option<i64>,
    pub amount: Money,
    pub currency: String,
    pub method: Option<String>,
    pub status: String,

    /// Gateway-side identifier. At most one payment per reference.
    pub gateway_reference: Option<String>,

    pub processed_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Data for recording a payment.
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub order_id: String,
    pub user_id: Option<i64>,
    pub amount: Money,
    pub currency: String,
    pub method: Option<String>,
    pub status: String,
    pub gateway_reference: Option<String>,
}

// =============================================================================
// Transaction
// =============================================================================

/// One inbound gateway callback, kept verbatim for audit.
#[derive(Debug, Clone, Serialize)]
pub struct Transaction {
    pub id: i64,

    /// Set even when the order does not exist (orphaned callback).
    pub order_id: Option<String>,

    pub tran_id: Option<String>,
    pub amount: Money,
    pub currency: String,
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub raw_payload: Value,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// User
// =============================================================================

/// A customer account, keyed by lower-cased email.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct User {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data for registering a user.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
}

// =============================================================================
// Report
// =============================================================================

/// A support or audit ticket.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Report {
    pub id: i64,
    pub user_id: Option<i64>,
    pub title: String,
    pub category: Option<String>,
    pub summary: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

/// Data for filing a report.
#[derive(Debug, Clone)]
pub struct NewReport {
    pub user_id: Option<i64>,
    pub title: String,
    pub category: Option<String>,
    pub summary: Option<String>,
    pub status: String,
}

// =============================================================================
// Summary
// =============================================================================

/// Count and total over a set of payments or transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub count: i64,
    pub total_amount: Money,
}

// =============================================================================
// Unit Tests
// =============================================================================
