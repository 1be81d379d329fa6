//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    9.99 * 3 = 29.970000000000002  ❌ WRONG!                              │
//! │                                                                         │
//! │  The gateway signs the amount STRING, so "29.970000000000002" and       │
//! │  "29.97" produce different hashes and the checkout is rejected.         │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    999 cents * 3 = 2997 cents → "29.97", always                         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Amounts arrive from clients and from the gateway as decimal strings
//! (`"9.99"`, `"19.980"`, `"7"`). [`Money::parse`] goes through
//! `rust_decimal` so the conversion to cents is exact.
//!
//! ## Usage
//! ```rust
//! use c4_core::money::Money;
//!
//! let price = Money::from_cents(999);            // $9.99
//! let total = price.multiply_quantity(2).unwrap();
//! assert_eq!(total.to_decimal_string(), "19.98");
//!
//! let from_gateway = Money::parse("19.98").unwrap();
//! assert_eq!(from_gateway, total);
//! ```

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};
use std::str::FromStr;

use crate::error::ValidationError;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (cents for USD).
///
/// ## Where Money is Used
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Service.price ──► Order.unit_price ──► Order.amount (× quantity)       │
/// │                                              │                          │
/// │                                              ▼                          │
/// │                           checkout payload "amount": "19.98"            │
/// │                                                                         │
/// │  gateway callback "amount" ──► Transaction.amount ──► Payment.amount    │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
///
/// Stored as INTEGER cents; serialized to JSON as a 2-decimal number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    ///
    /// ## Example
    /// ```rust
    /// use c4_core::money::Money;
    ///
    /// let price = Money::from_cents(999);
    /// assert_eq!(price.cents(), 999);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is negative.
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Parses a decimal string into cents.
    ///
    /// Surrounding whitespace is ignored. More than two fractional digits are
    /// rounded half away from zero (`"0.005"` → 1 cent), matching how the
    /// gateway formats amounts.
    ///
    /// ## Example
    /// ```rust
    /// use c4_core::money::Money;
    ///
    /// assert_eq!(Money::parse("9.99").unwrap().cents(), 999);
    /// assert_eq!(Money::parse(" 7 ").unwrap().cents(), 700);
    /// assert_eq!(Money::parse("1.005").unwrap().cents(), 101);
    /// assert!(Money::parse("abc").is_err());
    /// ```
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        let decimal = Decimal::from_str(trimmed)
            .map_err(|e| ValidationError::invalid("amount", format!("'{trimmed}': {e}")))?;

        Money::from_decimal(decimal).ok_or_else(|| {
            ValidationError::invalid("amount", format!("'{trimmed}' is out of range"))
        })
    }

    /// Converts an exact decimal to cents, rounding to 2 places.
    ///
    /// Returns `None` if the value does not fit in `i64` cents.
    pub fn from_decimal(value: Decimal) -> Option<Self> {
        let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        rounded
            .checked_mul(Decimal::ONE_HUNDRED)
            .and_then(|cents| cents.to_i64())
            .map(Money)
    }

    /// Returns the value as an exact 2-place decimal.
    pub fn to_decimal(&self) -> Decimal {
        Decimal::new(self.0, 2)
    }

    /// Renders the amount the way the gateway expects it: `"19.98"`.
    ///
    /// No currency symbol, no thousands separator, always two fractional
    /// digits.
    pub fn to_decimal_string(&self) -> String {
        // scale 2 is kept by Display, so 700 cents prints "7.00"
        self.to_decimal().to_string()
    }

    /// Multiplies the amount by a quantity.
    ///
    /// Returns `None` on overflow rather than wrapping.
    ///
    /// ## Example
    /// ```rust
    /// use c4_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(999);
    /// assert_eq!(unit_price.multiply_quantity(3).unwrap().cents(), 2997);
    /// assert!(Money::from_cents(i64::MAX).multiply_quantity(2).is_none());
    /// ```
    #[inline]
    pub fn multiply_quantity(&self, qty: i64) -> Option<Self> {
        self.0.checked_mul(qty).map(Money)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display shows a dollar amount, e.g. `$19.98`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let digits = self.to_decimal_string();
        write!(f, "{}${}", sign, digits.trim_start_matches('-'))
    }
}

impl FromStr for Money {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Money::parse(s)
    }
}

/// JSON clients read amounts as numbers (`19.98`), never as cents.
impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.0 as f64 / 100.0)
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
