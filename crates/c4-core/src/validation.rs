//! # Validation Module
//!
//! Input coercion and validation rules for C4 Commerce.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP handler (apps/api)                                       │
//! │  ├── JSON shape (is `serviceId` an integer?)                            │
//! │  └── Required fields present                                            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                   │
//! │  ├── Lenient coercion (quantity never rejected, falls back to 1)        │
//! │  └── Strict rules (email shape, non-negative prices, titles)            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                             │
//! │  ├── UNIQUE (services.name, users.email, payments.gateway_reference,    │
//! │  │          transactions.tran_id)                                       │
//! │  └── Foreign key constraints                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde_json::Value;

use crate::error::ValidationError;
use crate::money::Money;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest title accepted for a support report.
pub const MAX_TITLE_LENGTH: usize = 255;

// =============================================================================
// Coercion
// =============================================================================

/// Coerces a client-supplied quantity into a positive integer.
///
/// Never fails. Anything that is not a positive integer (or a string holding
/// one) becomes `1`.
///
/// ## Example
/// ```rust
/// use c4_core::validation::coerce_quantity;
/// use serde_json::json;
///
/// assert_eq!(coerce_quantity(&json!(3)), 3);
/// assert_eq!(coerce_quantity(&json!("4")), 4);
/// assert_eq!(coerce_quantity(&json!(0)), 1);
/// assert_eq!(coerce_quantity(&json!("two")), 1);
/// ```
pub fn coerce_quantity(raw: &Value) -> i64 {
    let parsed = match raw {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };

    match parsed {
        Some(q) if q > 0 => q,
        _ => 1,
    }
}

/// Trims and lower-cases an email so lookups are case-insensitive.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

// =============================================================================
// Validators
// =============================================================================

/// Validates and normalizes an email address.
///
/// ## Rules
/// - Must not be empty
/// - Must contain exactly one `@` with text on both sides
pub fn validate_email(email: &str) -> ValidationResult<String> {
    let normalized = normalize_email(email);

    if normalized.is_empty() {
        return Err(ValidationError::required("email"));
    }

    let mut parts = normalized.split('@');
    let valid = matches!(
        (parts.next(), parts.next(), parts.next()),
        (Some(local), Some(domain), None) if !local.is_empty() && !domain.is_empty()
    );
    if !valid {
        return Err(ValidationError::invalid("email", "expected name@domain"));
    }

    Ok(normalized)
}

/// Validates that a field holds non-blank text, returning it trimmed.
pub fn validate_required(field: &str, value: Option<&str>) -> ValidationResult<String> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(ValidationError::required(field)),
    }
}

/// Validates a report title.
pub fn validate_title(title: Option<&str>) -> ValidationResult<String> {
    let title = validate_required("title", title)?;
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(ValidationError::TooLong {
            field: "title".to_string(),
            max: MAX_TITLE_LENGTH,
        });
    }
    Ok(title)
}

/// Validates a catalog price.
pub fn validate_price(price: Money) -> ValidationResult<()> {
    if price.is_negative() {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }
    Ok(())
}

/// Parses a client-supplied amount, accepting JSON numbers or strings.
///
/// Unlike callback amounts, client amounts are strict: anything
/// non-numeric is a validation error.
pub fn parse_amount(raw: &Value) -> ValidationResult<Money> {
    match raw {
        Value::Number(n) => Money::parse(&n.to_string()),
        Value::String(s) => Money::parse(s),
        Value::Null => Err(ValidationError::required("amount")),
        _ => Err(ValidationError::invalid("amount", "must be numeric")),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
