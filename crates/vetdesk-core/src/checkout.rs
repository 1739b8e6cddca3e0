//! # Checkout
//!
//! Customer/credit selection and the `POST /api/sales` payload.
//!
//! ## Sale Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Checkout                                       │
//! │                                                                         │
//! │  select_customer("12") ──► customer = 12, on_credit = true             │
//! │  select_customer("")   ──► customer = none, on_credit = false          │
//! │  set_on_credit(false)  ──► manual override, customer kept              │
//! │                                                                         │
//! │  SalePayload::prepare(cart, selection)                                 │
//! │       │                                                                 │
//! │       ├── cart empty?                 → EmptyCart                      │
//! │       ├── on_credit && no customer?   → CustomerRequired               │
//! │       └── OK → { cart[], customerId, onCredit, paidAmount }            │
//! │                 paidAmount = 0 on credit, else the subtotal            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::cart::Cart;
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::ItemKind;

// =============================================================================
// Customer Selection
// =============================================================================

/// Customer attached to the sale being built, plus the credit flag.
///
/// Picking a customer turns credit on and clearing it turns credit off.
/// That coupling is only a default: the operator can flip `on_credit`
/// either way afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CustomerSelection {
    customer_id: Option<String>,
    on_credit: bool,
}

impl CustomerSelection {
    pub fn new() -> Self {
        CustomerSelection::default()
    }

    /// Applies the selector value. Blank clears the customer.
    pub fn select_customer(&mut self, raw: &str) {
        let raw = raw.trim();
        if raw.is_empty() {
            self.customer_id = None;
            self.on_credit = false;
        } else {
            self.customer_id = Some(raw.to_string());
            self.on_credit = true;
        }
    }

    pub fn set_on_credit(&mut self, on_credit: bool) {
        self.on_credit = on_credit;
    }

    pub fn customer_id(&self) -> Option<&str> {
        self.customer_id.as_deref()
    }

    pub fn on_credit(&self) -> bool {
        self.on_credit
    }

    /// Back to "no customer, paid now".
    pub fn reset(&mut self) {
        *self = CustomerSelection::default();
    }
}

/// Customer id as sent to the backend: numeric when it parses, else as typed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(untagged)]
pub enum CustomerRef {
    Numeric(i64),
    Raw(String),
}

impl CustomerRef {
    /// `"12"` → `Numeric(12)`, `"abc"` → `Raw("abc")`, `""` → `None`.
    pub fn coerce(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        Some(match raw.parse::<i64>() {
            Ok(id) => CustomerRef::Numeric(id),
            Err(_) => CustomerRef::Raw(raw.to_string()),
        })
    }
}

// =============================================================================
// Payload
// =============================================================================

/// One cart line as the backend expects it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleLinePayload {
    #[ts(type = "number")]
    pub id: i64,
    #[ts(type = "number")]
    pub qty: i64,
    #[ts(type = "number")]
    pub precio: Money,
    #[serde(rename = "type")]
    pub kind: ItemKind,
}

/// Body of `POST /api/sales`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SalePayload {
    pub cart: Vec<SaleLinePayload>,
    pub customer_id: Option<CustomerRef>,
    pub on_credit: bool,
    #[ts(type = "number")]
    pub paid_amount: Money,
}

impl SalePayload {
    /// Validates the cart and selection and builds the request body.
    ///
    /// ## Example
    /// ```rust
    /// use vetdesk_core::cart::Cart;
    /// use vetdesk_core::checkout::{CustomerSelection, SalePayload};
    /// use vetdesk_core::error::CoreError;
    ///
    /// let mut selection = CustomerSelection::new();
    /// selection.set_on_credit(true);
    ///
    /// let err = SalePayload::prepare(&Cart::new(), &selection).unwrap_err();
    /// assert_eq!(err, CoreError::EmptyCart);
    /// ```
    pub fn prepare(cart: &Cart, selection: &CustomerSelection) -> CoreResult<Self> {
        if cart.is_empty() {
            return Err(CoreError::EmptyCart);
        }

        let customer_id = selection.customer_id().and_then(CustomerRef::coerce);
        if selection.on_credit() && customer_id.is_none() {
            return Err(CoreError::CustomerRequired);
        }

        let subtotal = cart.checked_subtotal()?;

        let lines = cart
            .lines()
            .iter()
            .map(|line| SaleLinePayload {
                id: line.id,
                qty: line.qty,
                precio: line.precio,
                kind: line.kind,
            })
            .collect();

        Ok(SalePayload {
            cart: lines,
            customer_id,
            on_credit: selection.on_credit(),
            paid_amount: if selection.on_credit() {
                Money::zero()
            } else {
                subtotal
            },
        })
    }

    /// Σ precio × qty over the payload lines.
    pub fn total(&self) -> Money {
        self.cart.iter().map(|l| l.precio.multiply_quantity(l.qty)).sum()
    }

    pub fn items_count(&self) -> i64 {
        self.cart.iter().map(|l| l.qty).sum()
    }

    pub fn outcome(&self) -> SaleOutcome {
        if self.on_credit {
            SaleOutcome::Pending
        } else {
            SaleOutcome::Paid
        }
    }
}

/// How a recorded sale was booked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaleOutcome {
    /// On the customer's account, unpaid.
    Pending,
    /// Paid at the counter.
    Paid,
}

impl SaleOutcome {
    pub fn notice(&self) -> &'static str {
        match self {
            SaleOutcome::Pending => "Sale recorded on account (pending)",
            SaleOutcome::Paid => "Sale recorded (paid)",
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
