//! # Customer Account
//!
//! Account total and full settlement with optional interest.
//!
//! ## Settlement Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Full Settlement                                    │
//! │                                                                         │
//! │  sales[] ──► account_total = Σ sale.total                              │
//! │                    │                                                    │
//! │  interest "10" ────┤                                                    │
//! │                    ▼                                                    │
//! │  final_amount = total × (1 + p/100)     ("" / "abc" / "-5" → total)    │
//! │                    │                                                    │
//! │                    ▼                                                    │
//! │  confirm #1: amount ──► confirm #2: cannot be undone                   │
//! │                    │                                                    │
//! │                    ▼                                                    │
//! │  DELETE /api/customers/:id/sales  (client crate)                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The total is always computed from the fetched list, never taken from a
//! backend summary field.

use crate::money::Money;
use crate::types::Sale;

/// Σ sale.total over every sale currently attributed to the customer.
pub fn account_total(sales: &[Sale]) -> Money {
    sales.iter().map(|s| s.total).sum()
}

// =============================================================================
// Interest
// =============================================================================

/// An interest percentage entered by the operator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InterestRate(f64);

impl InterestRate {
    /// Parses a percentage. Blank, non-numeric and negative input is `None`.
    ///
    /// ## Example
    /// ```rust
    /// use vetdesk_core::account::InterestRate;
    ///
    /// assert!(InterestRate::parse("10").is_some());
    /// assert!(InterestRate::parse("0").is_some());
    /// assert!(InterestRate::parse("").is_none());
    /// assert!(InterestRate::parse("abc").is_none());
    /// assert!(InterestRate::parse("-5").is_none());
    /// ```
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        match raw.parse::<f64>() {
            Ok(p) if p.is_finite() && p >= 0.0 => Some(InterestRate(p)),
            _ => None,
        }
    }

    pub fn percent(&self) -> f64 {
        self.0
    }

    /// total × (1 + p/100), rounded to the cent.
    pub fn apply(&self, total: Money) -> Money {
        let cents = (total.cents() as f64 * (1.0 + self.0 / 100.0)).round();
        Money::from_cents(cents as i64)
    }
}

/// Amount to settle given raw interest input. Falls back to `total`.
pub fn final_amount(total: Money, raw_interest: &str) -> Money {
    InterestRate::parse(raw_interest)
        .map(|rate| rate.apply(total))
        .unwrap_or(total)
}

// =============================================================================
// Settlement
// =============================================================================

/// A full-settlement proposal for one customer.
#[derive(Debug, Clone, PartialEq)]
pub struct Settlement {
    pub total: Money,
    pub interest: Option<InterestRate>,
    pub final_amount: Money,
}

impl Settlement {
    pub fn new(sales: &[Sale], raw_interest: &str) -> Self {
        let total = account_total(sales);
        let interest = InterestRate::parse(raw_interest);
        let final_amount = interest.map(|r| r.apply(total)).unwrap_or(total);
        Settlement {
            total,
            interest,
            final_amount,
        }
    }

    /// Nothing to settle.
    pub fn is_empty(&self) -> bool {
        self.total.is_zero()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
