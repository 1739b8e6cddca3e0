//! # Cart State
//!
//! Holds the sale being built on the point-of-sale screen.
//!
//! ## Thread Safety
//! The draft is wrapped in `Arc<Mutex<T>>` because:
//! 1. Cart commands and checkout both touch it
//! 2. Only one of them should modify it at a time
//! 3. Checkout clears it from inside an async submission
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart State Operations                                │
//! │                                                                         │
//! │  Operator Action          Command                 Draft Change          │
//! │  ───────────────          ───────                 ────────────          │
//! │                                                                         │
//! │  Pick item ──────────────► add 3 ──────────────► cart.add_item(item)   │
//! │                                                                         │
//! │  Change quantity ────────► qty p-12 4 ─────────► line.qty = clamp(4)   │
//! │                                                                         │
//! │  Remove ─────────────────► rm p-12 ────────────► lines.remove(key)     │
//! │                                                                         │
//! │  Pick customer ──────────► customer 7 ─────────► on_credit = true      │
//! │                                                                         │
//! │  Submit ─────────────────► checkout ───────────► reset on success      │
//! │                                                                         │
//! │  NOTE: The lock is never held across an await.                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::{Arc, Mutex, MutexGuard};

use vetdesk_client::SaleDraft;
use vetdesk_core::{Cart, CartTotals};

/// Shared sale draft.
#[derive(Debug, Clone, Default)]
pub struct CartState {
    draft: Arc<Mutex<SaleDraft>>,
}

impl CartState {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, SaleDraft> {
        self.draft.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// The mutex itself, for `Checkout::submit`.
    pub fn draft(&self) -> &Mutex<SaleDraft> {
        &self.draft
    }

    /// Executes a function with read access to the draft.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// let totals = cart_state.with_cart(|draft| CartTotals::from(&draft.cart));
    /// ```
    pub fn with_cart<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&SaleDraft) -> R,
    {
        f(&self.lock())
    }

    /// Executes a function with write access to the draft.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// cart_state.with_cart_mut(|draft| draft.cart.add_item(&item, 1))?;
    /// ```
    pub fn with_cart_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut SaleDraft) -> R,
    {
        f(&mut self.lock())
    }

    pub fn snapshot(&self) -> Cart {
        self.with_cart(|draft| draft.cart.clone())
    }

    pub fn totals(&self) -> CartTotals {
        self.with_cart(|draft| CartTotals::from(&draft.cart))
    }
}
