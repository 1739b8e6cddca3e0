//! # Sale Submission
//!
//! Turns the draft sale (cart + customer selection) into `POST /api/sales`.
//!
//! ## Submit Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Checkout::submit                                 │
//! │                                                                         │
//! │  already saving? ─────────────────────────► InProgress                 │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  SalePayload::prepare(cart, selection)                                 │
//! │        ├── empty cart / credit w/o customer ──► notice, no request     │
//! │        ▼                                                                │
//! │  confirm "Confirm sale of 3 items for $1500.00?" ── no ──► Declined    │
//! │        │ yes                                                            │
//! │        ▼                                                                │
//! │  POST /api/sales                                                       │
//! │        ├── error ──► notice (backend message), draft kept              │
//! │        ▼                                                                │
//! │  clear cart, reset selection, reload top items, success notice         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{info, warn};

use crate::api::{CatalogApi, SalesApi};
use crate::error::{ClientError, ClientResult};
use crate::notify::{Confirmer, Notifier};
use crate::search::TopItems;
use vetdesk_core::{Cart, CustomerSelection, Money, SaleOutcome, SalePayload};

const SALE_FAILED: &str = "Error processing sale";
const TOP_ITEMS_FAILED: &str = "Error loading items";

// =============================================================================
// Draft
// =============================================================================

/// The sale being built on the point-of-sale screen.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SaleDraft {
    pub cart: Cart,
    pub selection: CustomerSelection,
}

impl SaleDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty cart, no customer, paid now.
    pub fn reset(&mut self) {
        self.cart.clear();
        self.selection.reset();
    }
}

fn lock_draft(draft: &Mutex<SaleDraft>) -> MutexGuard<'_, SaleDraft> {
    draft.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// The question asked before sending.
pub fn confirmation_prompt(payload: &SalePayload, customer_name: Option<&str>) -> String {
    match payload.outcome() {
        SaleOutcome::Pending => format!(
            "Record on account for customer {}: {}",
            customer_name.unwrap_or(""),
            payload.total()
        ),
        SaleOutcome::Paid => format!(
            "Confirm sale of {} items for {}?",
            payload.items_count(),
            payload.total()
        ),
    }
}

// =============================================================================
// Checkout
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum CheckoutOutcome {
    /// The operator said no. Nothing was sent.
    Declined,
    Recorded {
        outcome: SaleOutcome,
        total: Money,
        /// Fresh top-sold lists, `None` if the reload failed.
        top_items: Option<TopItems>,
    },
}

struct SavingGuard<'a>(&'a AtomicBool);

impl Drop for SavingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct Checkout {
    sales: Arc<dyn SalesApi>,
    catalog: Arc<dyn CatalogApi>,
    notifier: Arc<dyn Notifier>,
    confirmer: Arc<dyn Confirmer>,
    top_items_limit: u32,
    saving: AtomicBool,
}

impl Checkout {
    pub fn new(
        sales: Arc<dyn SalesApi>,
        catalog: Arc<dyn CatalogApi>,
        notifier: Arc<dyn Notifier>,
        confirmer: Arc<dyn Confirmer>,
        top_items_limit: u32,
    ) -> Self {
        Checkout {
            sales,
            catalog,
            notifier,
            confirmer,
            top_items_limit,
            saving: AtomicBool::new(false),
        }
    }

    /// True while a submission is in flight.
    pub fn is_saving(&self) -> bool {
        self.saving.load(Ordering::SeqCst)
    }

    /// Validates, confirms and records the draft sale.
    ///
    /// `customer_name` is only used in the confirmation text.
    pub async fn submit(
        &self,
        draft: &Mutex<SaleDraft>,
        customer_name: Option<&str>,
    ) -> ClientResult<CheckoutOutcome> {
        if self
            .saving
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(ClientError::InProgress);
        }
        let _saving = SavingGuard(&self.saving);

        let prepared = {
            let draft = lock_draft(draft);
            SalePayload::prepare(&draft.cart, &draft.selection)
        };
        let payload = match prepared {
            Ok(payload) => payload,
            Err(e) => {
                self.notifier.error(&e.to_string());
                return Err(e.into());
            }
        };

        let prompt = confirmation_prompt(&payload, customer_name);
        if !self.confirmer.confirm(&prompt).await {
            return Ok(CheckoutOutcome::Declined);
        }

        let outcome = payload.outcome();
        let total = payload.total();
        if let Err(e) = self.sales.create_sale(&payload).await {
            warn!(error = %e, "Sale submission failed");
            self.notifier.error(&e.user_message(SALE_FAILED));
            return Err(e);
        }

        lock_draft(draft).reset();
        info!(
            %total,
            items = payload.items_count(),
            on_credit = payload.on_credit,
            "Sale recorded"
        );
        self.notifier.success(outcome.notice());

        let top_items = match TopItems::load(self.catalog.as_ref(), self.top_items_limit).await {
            Ok(top) => Some(top),
            Err(e) => {
                warn!(error = %e, "Failed to reload top items");
                self.notifier.error(TOP_ITEMS_FAILED);
                None
            }
        };

        Ok(CheckoutOutcome::Recorded {
            outcome,
            total,
            top_items,
        })
    }
}
