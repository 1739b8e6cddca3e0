//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  The backend sends prices as JSON numbers (sometimes as strings):      │
//! │    "precio": 1500.5   or   "precio": "1500.50"                          │
//! │                                                                         │
//! │  Summing floats for a cart or an account drifts:                       │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌                                  │
//! │                                                                         │
//! │  OUR SOLUTION: parse once at the boundary into integer cents           │
//! │    1500.5 ──► Money(150050) ──► all math in i64 ──► 1500.5 on the wire  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Wire Format
//! - Deserializes from an integer, a float, a numeric string, or `null` (zero).
//! - Serializes as a JSON number in major units: whole amounts as integers
//!   (`1000`), fractional amounts as floats (`1000.5`).
//!
//! ## Usage
//! ```rust
//! use vetdesk_core::money::Money;
//!
//! let price = Money::from_major(500);
//! let line = price.multiply_quantity(2);
//! assert_eq!(line, Money::from_major(1000));
//!
//! let parsed = Money::parse(" 12.5 ").unwrap();
//! assert_eq!(parsed.cents(), 1250);
//! ```

use serde::de::{self, Unexpected, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in cents (the store works in a single currency).
///
/// ## Where Money is Used
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Product.precio ──► CartLine.precio ──► Cart.subtotal ──► paidAmount   │
/// │                                                                         │
/// │  Sale.total ──► Account total ──► + interest ──► settlement amount      │
/// │                                                                         │
/// │  SalesMonth.total_sales ──► report totals, best/worst month            │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from whole currency units.
    ///
    /// ## Example
    /// ```rust
    /// use vetdesk_core::money::Money;
    ///
    /// assert_eq!(Money::from_major(15).cents(), 1500);
    /// ```
    #[inline]
    pub const fn from_major(major: i64) -> Self {
        Money(major.saturating_mul(100))
    }

    /// Converts a float amount in major units, rounding to the nearest cent.
    ///
    /// Returns `None` for NaN, infinities, or values outside the i64 range.
    pub fn from_major_f64(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        let cents = (value * 100.0).round();
        if cents.abs() >= i64::MAX as f64 {
            return None;
        }
        Some(Money(cents as i64))
    }

    /// Parses operator input or a numeric string from the backend.
    ///
    /// Surrounding whitespace is ignored. Empty or non-numeric text yields
    /// `None`, which callers treat as "not a number".
    ///
    /// ## Example
    /// ```rust
    /// use vetdesk_core::money::Money;
    ///
    /// assert_eq!(Money::parse("250"), Some(Money::from_major(250)));
    /// assert_eq!(Money::parse("abc"), None);
    /// assert_eq!(Money::parse("   "), None);
    /// ```
    pub fn parse(input: &str) -> Option<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return None;
        }
        trimmed.parse::<f64>().ok().and_then(Money::from_major_f64)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the whole-unit portion.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the cents portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns the value as a float in major units (display and wire only).
    #[inline]
    pub fn to_major_f64(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.saturating_abs())
    }

    /// Computes `bps` basis points of this amount, rounded to the nearest cent.
    ///
    /// ## Implementation
    /// Integer math: `(amount * bps + 5000) / 10000`. The +5000 rounds half up.
    ///
    /// ## Example
    /// ```rust
    /// use vetdesk_core::money::Money;
    ///
    /// let total = Money::from_major(1000);
    /// assert_eq!(total.percentage(1000), Money::from_major(100)); // 10%
    /// ```
    pub fn percentage(&self, bps: i64) -> Money {
        // i128 keeps large accounts from overflowing
        let part = (self.0 as i128 * bps as i128 + 5000) / 10000;
        Money(part as i64)
    }

    /// Multiplies a unit price by a quantity, saturating at the i64 range.
    ///
    /// Display paths only. Amounts that are sent use [`Money::checked_mul`].
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }

    /// `None` when `self × qty` leaves the i64 range.
    ///
    /// ## Example
    /// ```rust
    /// use vetdesk_core::money::Money;
    ///
    /// assert_eq!(Money::from_major(3).checked_mul(4), Some(Money::from_major(12)));
    /// assert_eq!(Money::from_major(3).checked_mul(i64::MAX), None);
    /// ```
    #[inline]
    pub const fn checked_mul(&self, qty: i64) -> Option<Self> {
        match self.0.checked_mul(qty) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// `None` on overflow.
    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

// Operators saturate instead of panicking. Totals that leave the process go
// through `checked_add` / `checked_mul`.

/// Plain display for logs and prompts. The console applies its own currency
/// symbol through `ConfigState::format_currency`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}${}.{:02}", sign, self.major().abs(), self.cents_part())
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0.saturating_sub(other.0))
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_sub(other.0);
    }
}

/// Multiplication by a quantity.
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + *m)
    }
}

// =============================================================================
// Serde
// =============================================================================

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0 % 100 == 0 {
            serializer.serialize_i64(self.0 / 100)
        } else {
            serializer.serialize_f64(self.to_major_f64())
        }
    }
}

struct MoneyVisitor;

impl<'de> Visitor<'de> for MoneyVisitor {
    type Value = Money;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an amount as a number or numeric string")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Money, E> {
        v.checked_mul(100)
            .map(Money)
            .ok_or_else(|| E::invalid_value(Unexpected::Signed(v), &self))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Money, E> {
        i64::try_from(v)
            .ok()
            .and_then(|v| v.checked_mul(100))
            .map(Money)
            .ok_or_else(|| E::invalid_value(Unexpected::Unsigned(v), &self))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Money, E> {
        Money::from_major_f64(v).ok_or_else(|| E::invalid_value(Unexpected::Float(v), &self))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Money, E> {
        Money::parse(v).ok_or_else(|| E::invalid_value(Unexpected::Str(v), &self))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Money, E> {
        Ok(Money::zero())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(MoneyVisitor)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_major_and_parts() {
        let money = Money::from_cents(1099);
        assert_eq!(money.major(), 10);
        assert_eq!(money.cents_part(), 99);
        assert_eq!(Money::from_major(5).cents(), 500);
    }

    #[test]
    fn test_parse_operator_input() {
        assert_eq!(Money::parse("100"), Some(Money::from_major(100)));
        assert_eq!(Money::parse("0.1"), Some(Money::from_cents(10)));
        assert_eq!(Money::parse("-3"), Some(Money::from_major(-3)));
        assert_eq!(Money::parse(""), None);
        assert_eq!(Money::parse("NaN"), None);
        assert_eq!(Money::parse("12abc"), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(1099).to_string(), "$10.99");
        assert_eq!(Money::from_cents(-550).to_string(), "-$5.50");
        assert_eq!(Money::zero().to_string(), "$0.00");
    }

    #[test]
    fn test_percentage_rounds_to_cent() {
        assert_eq!(Money::from_major(1000).percentage(1000), Money::from_major(100));
        // 0.825 -> 0.83
        assert_eq!(Money::from_cents(1000).percentage(825).cents(), 83);
    }

    #[test]
    fn test_checked_arithmetic_reports_overflow() {
        let price = Money::from_major(50);
        assert_eq!(price.checked_mul(3), Some(Money::from_major(150)));
        assert_eq!(price.checked_mul(i64::MAX), None);
        assert_eq!(Money::from_cents(i64::MAX).checked_add(Money::from_cents(1)), None);
    }

    #[test]
    fn test_operators_saturate() {
        let price = Money::from_major(50);
        assert_eq!(price * i64::MAX, Money::from_cents(i64::MAX));
        assert_eq!(price.multiply_quantity(i64::MAX), Money::from_cents(i64::MAX));
        assert_eq!(Money::from_cents(i64::MAX) + price, Money::from_cents(i64::MAX));
        assert_eq!(Money::from_major(i64::MAX).cents(), i64::MAX);
    }

    #[test]
    fn test_sum() {
        let amounts = [Money::from_major(1), Money::from_cents(50)];
        let total: Money = amounts.iter().sum();
        assert_eq!(total.cents(), 150);
    }

    #[test]
    fn test_deserialize_lenient_sources() {
        let values: Vec<Money> =
            serde_json::from_str(r#"[1500, 1500.5, "1500.50", " 7 ", null]"#).unwrap();
        assert_eq!(
            values,
            vec![
                Money::from_major(1500),
                Money::from_cents(150050),
                Money::from_cents(150050),
                Money::from_major(7),
                Money::zero(),
            ]
        );
        assert!(serde_json::from_str::<Money>(r#""abc""#).is_err());
    }

    #[test]
    fn test_serialize_whole_amounts_as_integers() {
        assert_eq!(serde_json::to_string(&Money::from_major(1000)).unwrap(), "1000");
        assert_eq!(serde_json::to_string(&Money::from_cents(100050)).unwrap(), "1000.5");
    }
}
