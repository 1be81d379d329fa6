//! # Gateway Callback Normalization
//!
//! Turns the loose key/value payload the payment gateway posts back into a
//! typed [`GatewayCallback`].
//!
//! ## Resolution Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  raw payload (form or JSON)                                             │
//! │        │                                                                │
//! │        ├── status    → lower-cased, "success" when absent               │
//! │        ├── order id  → order_id | orderId | orderID                     │
//! │        ├── tran id   → tran_id | transaction_id | transactionId |       │
//! │        │               trans_id, else the order id                      │
//! │        ├── currency  → as sent, "USD" when absent                       │
//! │        ├── amount    → Parsed | Missing | Invalid(raw)                  │
//! │        └── timestamp → Parsed | Missing | Invalid(raw)                  │
//! │                                                                         │
//! │  Aliases are exact, case-sensitive keys. First non-blank match wins.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing in here fails. Amount and timestamp keep the distinction between
//! "absent" and "present but unparsable" so the caller can log the raw value
//! before falling back to a default.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Map, Value};

use crate::money::Money;
use crate::types::OrderStatus;
use crate::DEFAULT_CURRENCY;

/// Keys that may carry the order id.
pub const ORDER_ID_ALIASES: &[&str] = &["order_id", "orderId", "orderID"];

/// Keys that may carry the gateway's transaction id.
pub const TRAN_ID_ALIASES: &[&str] = &["tran_id", "transaction_id", "transactionId", "trans_id"];

/// Gateway status meaning the payment went through.
pub const STATUS_SUCCESS: &str = "success";

/// Payment status recorded for a successful capture.
pub const PAYMENT_CAPTURED: &str = "captured";

// =============================================================================
// FieldValue
// =============================================================================

/// Outcome of reading an optional, typed field from an untrusted payload.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue<T> {
    Parsed(T),
    Missing,
    /// Present but unparsable; holds the raw text.
    Invalid(String),
}

impl<T> FieldValue<T> {
    /// The parsed value, or `fallback()` when missing or invalid.
    pub fn unwrap_or_else(self, fallback: impl FnOnce() -> T) -> T {
        match self {
            FieldValue::Parsed(v) => v,
            FieldValue::Missing | FieldValue::Invalid(_) => fallback(),
        }
    }

    /// Raw text of an invalid value.
    pub fn invalid_raw(&self) -> Option<&str> {
        match self {
            FieldValue::Invalid(raw) => Some(raw),
            _ => None,
        }
    }

    fn from_text(text: Option<String>, parse: impl FnOnce(&str) -> Option<T>) -> Self {
        match text {
            None => FieldValue::Missing,
            Some(raw) => match parse(&raw) {
                Some(v) => FieldValue::Parsed(v),
                None => FieldValue::Invalid(raw),
            },
        }
    }
}

// =============================================================================
// GatewayCallback
// =============================================================================

/// A normalized gateway callback.
#[derive(Debug, Clone)]
pub struct GatewayCallback {
    pub order_id: Option<String>,

    /// Gateway transaction id, falling back to the order id.
    pub tran_id: Option<String>,

    /// Lower-cased status.
    pub status: String,

    pub currency: String,
    pub amount: FieldValue<Money>,
    pub timestamp: FieldValue<DateTime<Utc>>,

    /// The payload exactly as received.
    pub raw: Map<String, Value>,
}

impl GatewayCallback {
    /// Normalizes a raw payload.
    ///
    /// ## Example
    /// ```rust
    /// use c4_core::callback::GatewayCallback;
    /// use serde_json::json;
    ///
    /// let payload = json!({"orderID": "ORDER-1", "amount": "9.99"});
    /// let cb = GatewayCallback::from_payload(payload.as_object().unwrap());
    ///
    /// assert_eq!(cb.order_id.as_deref(), Some("ORDER-1"));
    /// assert_eq!(cb.tran_id.as_deref(), Some("ORDER-1"));
    /// assert_eq!(cb.status, "success");
    /// assert_eq!(cb.currency, "USD");
    /// ```
    pub fn from_payload(payload: &Map<String, Value>) -> Self {
        let order_id = first_text(payload, ORDER_ID_ALIASES);
        let tran_id = first_text(payload, TRAN_ID_ALIASES).or_else(|| order_id.clone());

        let status = first_text(payload, &["status"])
            .map(|s| s.to_lowercase())
            .unwrap_or_else(|| STATUS_SUCCESS.to_string());

        let currency =
            first_text(payload, &["currency"]).unwrap_or_else(|| DEFAULT_CURRENCY.to_string());

        let amount = FieldValue::from_text(first_text(payload, &["amount"]), |raw| {
            Money::parse(raw).ok()
        });
        let timestamp = FieldValue::from_text(first_text(payload, &["timestamp"]), parse_timestamp);

        GatewayCallback {
            order_id,
            tran_id,
            status,
            currency,
            amount,
            timestamp,
            raw: payload.clone(),
        }
    }

    /// The idempotency key for the payment upsert.
    pub fn gateway_reference(&self) -> Option<&str> {
        self.tran_id.as_deref()
    }

    /// Whether the callback reports a settled payment.
    pub fn is_settled(&self) -> bool {
        self.status == STATUS_SUCCESS || self.status == "paid"
    }

    /// Order status this callback implies.
    pub fn order_status(&self) -> OrderStatus {
        OrderStatus::from_gateway(&self.status)
    }

    /// Payment status this callback implies.
    pub fn payment_status(&self) -> String {
        if self.status == STATUS_SUCCESS {
            PAYMENT_CAPTURED.to_string()
        } else {
            self.status.clone()
        }
    }
}

/// Text of the first alias with a non-blank scalar value.
fn first_text(payload: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| {
        let text = match payload.get(*key)? {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => return None,
        };
        (!text.is_empty()).then_some(text)
    })
}

/// Parses an ISO-8601 timestamp. Offset-less values are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

// =============================================================================
// Unit Tests
// =============================================================================
