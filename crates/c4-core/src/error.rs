//! # Error Types
//!
//! Domain-specific error types for c4-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  c4-core errors (this file)                                             │
//! │  ├── CoreError        - Gateway misconfiguration                        │
//! │  └── ValidationError  - Input validation failures                       │
//! │                                                                         │
//! │  c4-db errors (separate crate)                                          │
//! │  └── DbError          - Persistence failures                            │
//! │                                                                         │
//! │  HTTP errors (apps/api)                                                 │
//! │  └── ApiError         - What the client sees ({code, description})      │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Client        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Gateway credentials or URLs are absent or still placeholders.
    ///
    /// ## When This Occurs
    /// - `ABA_PAYWAY_MERCHANT_ID` left at `YOUR_MERCHANT_ID`
    /// - `ABA_PAYWAY_API_KEY` empty
    /// - Return or cancel URL missing or pointing at localhost
    ///
    /// This is an operator problem, not a client one: the API reports it as
    /// a gateway failure (502).
    #[error("Payment gateway misconfigured: {0}")]
    Configuration(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when client input doesn't meet requirements.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Invalid format (e.g., non-numeric amount, malformed email).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {}", allowed.join(", "))]
    NotAllowed { field: String, allowed: Vec<String> },
}

impl ValidationError {
    /// Shorthand for a missing field.
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }

    /// Shorthand for a malformed field.
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::Configuration("merchant id has not been configured".into());
        assert_eq!(
            err.to_string(),
            "Payment gateway misconfigured: merchant id has not been configured"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::required("serviceId");
        assert_eq!(err.to_string(), "serviceId is required");

        let err = ValidationError::NotAllowed {
            field: "status".to_string(),
            allowed: vec!["paid".to_string(), "pending".to_string()],
        };
        assert_eq!(err.to_string(), "status must be one of: paid, pending");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let core_err: CoreError = ValidationError::required("title").into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
