//! # Validation Module
//!
//! Operator input checks that run before any request is sent.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Console input (raw text)                                     │
//! │  ├── THIS MODULE: parse + reject locally                               │
//! │  └── Immediate notice, no request                                      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: vetdesk-client                                               │
//! │  └── Typed payloads only (already validated)                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: REST backend                                                 │
//! │  └── Authoritative checks, `message` on failure                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use vetdesk_core::validation::{coerce_quantity, parse_payment_amount};
//!
//! assert_eq!(coerce_quantity("x"), 1);
//! assert!(parse_payment_amount("-5").is_err());
//! ```

use chrono::NaiveDate;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::parse_date;
use crate::{MAX_ITEM_QUANTITY, MAX_SEARCH_QUERY_LEN};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Returns the trimmed value, or `Required` when it is blank.
pub fn validate_required(field: &str, value: &str) -> ValidationResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::required(field));
    }
    Ok(value.to_string())
}

/// Trims a blank-able text field into `Option`.
pub fn optional_text(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Validates a search query.
///
/// ## Rules
/// - Surrounding whitespace is ignored
/// - Maximum 100 characters
///
/// ## Returns
/// `None` for a blank query (the caller clears results without a request).
pub fn validate_search_query(query: &str) -> ValidationResult<Option<String>> {
    let query = query.trim();

    if query.chars().count() > MAX_SEARCH_QUERY_LEN {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: MAX_SEARCH_QUERY_LEN,
        });
    }

    Ok(optional_text(query))
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Coerces a typed cart quantity to an integer ≥ 1.
///
/// ## Rules
/// - Non-numeric or blank input becomes 1
/// - Fractions are truncated
/// - Anything below 1 becomes 1
/// - Anything above [`MAX_ITEM_QUANTITY`] becomes [`MAX_ITEM_QUANTITY`]
///
/// ## Example
/// ```rust
/// use vetdesk_core::validation::coerce_quantity;
///
/// assert_eq!(coerce_quantity("4"), 4);
/// assert_eq!(coerce_quantity("2.7"), 2);
/// assert_eq!(coerce_quantity("-3"), 1);
/// assert_eq!(coerce_quantity(""), 1);
/// ```
pub fn coerce_quantity(raw: &str) -> i64 {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => {
            (value.trunc().min(MAX_ITEM_QUANTITY as f64) as i64).max(1)
        }
        _ => 1,
    }
}

/// Parses a payment amount.
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Account: Register Payment                                              │
/// │                                                                         │
/// │  Operator enters amount: "1500"                                        │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  parse_payment_amount("1500") ← THIS FUNCTION                          │
/// │       │                                                                 │
/// │       ├── not a number? → InvalidAmount (no request)                   │
/// │       ├── ≤ 0?          → InvalidAmount (no request)                   │
/// │       └── OK → POST /api/payments                                      │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn parse_payment_amount(raw: &str) -> CoreResult<Money> {
    match Money::parse(raw) {
        Some(amount) if amount.is_positive() => Ok(amount),
        _ => Err(CoreError::InvalidAmount {
            input: raw.trim().to_string(),
        }),
    }
}

/// Parses an optional decimal form field (`""` means not provided).
pub fn parse_optional_amount(field: &str, raw: &str) -> ValidationResult<Option<Money>> {
    if raw.trim().is_empty() {
        return Ok(None);
    }
    Money::parse(raw)
        .map(Some)
        .ok_or_else(|| ValidationError::NotANumber {
            field: field.to_string(),
        })
}

/// Parses an optional whole-number form field that must be ≥ 0.
///
/// `"3.0"` is accepted as 3; `"2.5"` and `"-1"` are rejected.
pub fn parse_optional_count(field: &str, raw: &str) -> ValidationResult<Option<i64>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() && value.fract() == 0.0 && value >= 0.0 => {
            Ok(Some(value as i64))
        }
        _ => Err(ValidationError::NotANonNegativeInteger {
            field: field.to_string(),
        }),
    }
}

// =============================================================================
// Date Validators
// =============================================================================

/// Parses a `YYYY-MM-DD` field.
pub fn validate_date(field: &str, raw: &str) -> ValidationResult<NaiveDate> {
    if raw.trim().is_empty() {
        return Err(ValidationError::required(field));
    }
    parse_date(raw).ok_or_else(|| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "expected YYYY-MM-DD".to_string(),
    })
}

/// Validates a report range.
///
/// ## Rules
/// - Both ends are required dates
/// - `from` must not be after `to` (equal is fine)
pub fn validate_date_range(from: &str, to: &str) -> CoreResult<(NaiveDate, NaiveDate)> {
    let from_date = validate_date("from", from)?;
    let to_date = validate_date("to", to)?;

    if from_date > to_date {
        return Err(CoreError::InvalidDateRange {
            from: from.trim().to_string(),
            to: to.trim().to_string(),
        });
    }

    Ok((from_date, to_date))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_required() {
        assert_eq!(validate_required("nombre", "  Ana ").unwrap(), "Ana");
        assert!(validate_required("nombre", "   ").is_err());
    }

    #[test]
    fn test_search_query() {
        assert_eq!(validate_search_query("  can ").unwrap(), Some("can".to_string()));
        assert_eq!(validate_search_query("   ").unwrap(), None);
        assert!(validate_search_query(&"a".repeat(101)).is_err());
    }

    #[test]
    fn test_coerce_quantity() {
        assert_eq!(coerce_quantity("7"), 7);
        assert_eq!(coerce_quantity("0"), 1);
        assert_eq!(coerce_quantity("abc"), 1);
        assert_eq!(coerce_quantity("inf"), 1);
        assert_eq!(coerce_quantity("1e30"), MAX_ITEM_QUANTITY);
        assert_eq!(coerce_quantity("-1e30"), 1);
    }

    #[test]
    fn test_payment_amount() {
        assert_eq!(parse_payment_amount("250.5").unwrap(), Money::from_cents(25050));
        assert!(matches!(
            parse_payment_amount("0"),
            Err(CoreError::InvalidAmount { .. })
        ));
        assert!(parse_payment_amount("abc").is_err());
        assert!(parse_payment_amount("").is_err());
    }

    #[test]
    fn test_optional_count() {
        assert_eq!(parse_optional_count("stock", "").unwrap(), None);
        assert_eq!(parse_optional_count("stock", "3.0").unwrap(), Some(3));
        assert!(parse_optional_count("stock", "2.5").is_err());
        assert!(parse_optional_count("stock", "-1").is_err());
    }

    #[test]
    fn test_optional_amount() {
        assert_eq!(parse_optional_amount("precio", " ").unwrap(), None);
        assert_eq!(
            parse_optional_amount("precio", "10").unwrap(),
            Some(Money::from_major(10))
        );
        assert!(parse_optional_amount("precio", "diez").is_err());
    }

    #[test]
    fn test_inverted_date_range_rejected() {
        let err = validate_date_range("2024-06-01", "2024-01-01").unwrap_err();
        assert!(matches!(err, CoreError::InvalidDateRange { .. }));
    }

    #[test]
    fn test_date_range_accepts_same_day() {
        assert!(validate_date_range("2024-01-01", "2024-01-01").is_ok());
        assert!(validate_date_range("", "2024-01-01").is_err());
        assert!(validate_date_range("2024-13-01", "2024-12-01").is_err());
    }
}
