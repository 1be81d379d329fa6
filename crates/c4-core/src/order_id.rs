//! Order identifier formatting.
//!
//! Identifiers look like `ORDER-20250101120000-0001`: a prefix, the UTC
//! creation time to the second, and a sequence number. The sequence comes
//! from a store-backed counter (see `c4-db`), which is what keeps two orders
//! created in the same second distinct across processes.

use chrono::{DateTime, Utc};

/// Formats an order id. The sequence is zero-padded to at least 4 digits.
///
/// ```rust
/// use c4_core::order_id::format_order_id;
/// use chrono::{TimeZone, Utc};
///
/// let at = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
/// assert_eq!(format_order_id("ORDER", at, 7), "ORDER-20250102030405-0007");
/// assert_eq!(format_order_id("ORDER", at, 12345), "ORDER-20250102030405-12345");
/// ```
pub fn format_order_id(prefix: &str, at: DateTime<Utc>, sequence: i64) -> String {
    format!("{}-{}-{:04}", prefix, at.format("%Y%m%d%H%M%S"), sequence)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_same_second_distinct_sequence() {
        let at = Utc.with_ymd_and_hms(2025, 6, 30, 23, 59, 59).unwrap();
        let a = format_order_id("ORDER", at, 1);
        let b = format_order_id("ORDER", at, 2);
        assert_ne!(a, b);
        assert_eq!(a, "ORDER-20250630235959-0001");
    }

    #[test]
    fn test_custom_prefix() {
        let at = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(format_order_id("C4", at, 42), "C4-20250101000000-0042");
    }
}
