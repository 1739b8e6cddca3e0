//! # Customer Account View
//!
//! One customer's credit account: the customer record, the sales attributed
//! to them, full settlement with interest, and per-sale payments.
//!
//! ## Reconciliation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         AccountView                                     │
//! │                                                                         │
//! │  refresh()          GET /api/customers/:id ─┐ (concurrent)             │
//! │                     GET /api/sales?customerId┘                          │
//! │                                                                         │
//! │  register_payment   "1500" ──► parse ──► POST /api/payments            │
//! │                                           └──► refresh()               │
//! │                                                                         │
//! │  settle()           confirm amount ──► confirm "cannot be undone"      │
//! │                          └──► DELETE /api/customers/:id/sales          │
//! │                                └──► local sales emptied                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! No cache: after any mutation the view re-fetches or empties its own copy.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::api::{CustomerApi, PaymentRequest, SalesApi};
use crate::error::ClientResult;
use crate::notify::{Confirmer, Notifier};
use vetdesk_core::account::{account_total, Settlement};
use vetdesk_core::types::plain_amount;
use vetdesk_core::validation::parse_payment_amount;
use vetdesk_core::{Customer, Money, Sale};

const LOAD_FAILED: &str = "Could not load the account";
const SETTLE_FAILED: &str = "Could not clear the sales history";
const PAYMENT_FAILED: &str = "Error registering payment";
const DETAIL_FAILED: &str = "Could not load the sale detail";

/// Second confirmation before a full settlement.
pub const SETTLE_WARNING: &str = "ARE YOU SURE?\n\nConfirming the full payment deletes this \
account's whole sales history and starts a new account at zero.\n\nThis cannot be undone.";

/// Result of a full-settlement attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleOutcome {
    /// One of the confirmations was declined.
    Declined,
    /// The account had no sales.
    NothingToSettle,
    Settled { amount: Money },
}

/// Text pre-filled in the payment amount field.
pub fn payment_prefill(sale: &Sale) -> String {
    sale.outstanding_amount.map(plain_amount).unwrap_or_default()
}

pub struct AccountView {
    customers: Arc<dyn CustomerApi>,
    sales_api: Arc<dyn SalesApi>,
    notifier: Arc<dyn Notifier>,
    confirmer: Arc<dyn Confirmer>,
    customer_id: i64,
    customer: Option<Customer>,
    sales: Vec<Sale>,
    interest_input: String,
}

impl AccountView {
    pub fn new(
        customers: Arc<dyn CustomerApi>,
        sales_api: Arc<dyn SalesApi>,
        notifier: Arc<dyn Notifier>,
        confirmer: Arc<dyn Confirmer>,
        customer_id: i64,
    ) -> Self {
        AccountView {
            customers,
            sales_api,
            notifier,
            confirmer,
            customer_id,
            customer: None,
            sales: Vec::new(),
            interest_input: String::new(),
        }
    }

    pub fn customer_id(&self) -> i64 {
        self.customer_id
    }

    pub fn customer(&self) -> Option<&Customer> {
        self.customer.as_ref()
    }

    pub fn sales(&self) -> &[Sale] {
        &self.sales
    }

    /// Σ sale.total over the fetched sales.
    pub fn total(&self) -> Money {
        account_total(&self.sales)
    }

    pub fn set_interest(&mut self, raw: &str) {
        self.interest_input = raw.to_string();
    }

    pub fn interest_input(&self) -> &str {
        &self.interest_input
    }

    /// Current settlement proposal for the typed interest.
    pub fn settlement(&self) -> Settlement {
        Settlement::new(&self.sales, &self.interest_input)
    }

    /// Re-fetches the customer and their sales together. On failure the
    /// previous snapshot stays.
    pub async fn refresh(&mut self) -> ClientResult<()> {
        debug!(customer_id = self.customer_id, "Loading account");
        let (customer, sales) = tokio::join!(
            self.customers.get_customer(self.customer_id),
            self.sales_api.list_sales(Some(self.customer_id))
        );

        match customer.and_then(|c| sales.map(|s| (c, s))) {
            Ok((customer, sales)) => {
                self.customer = Some(customer);
                self.sales = sales;
                Ok(())
            }
            Err(e) => {
                warn!(customer_id = self.customer_id, error = %e, "Failed to load account");
                self.notifier.error(LOAD_FAILED);
                Err(e)
            }
        }
    }

    /// Settles the whole account after two confirmations.
    pub async fn settle(&mut self) -> ClientResult<SettleOutcome> {
        let settlement = self.settlement();
        if self.sales.is_empty() {
            self.notifier.info("No sales to settle");
            return Ok(SettleOutcome::NothingToSettle);
        }

        let amount = settlement.final_amount;
        if !self
            .confirmer
            .confirm(&format!("Confirm full payment of {}?", amount))
            .await
        {
            return Ok(SettleOutcome::Declined);
        }
        if !self.confirmer.confirm(SETTLE_WARNING).await {
            return Ok(SettleOutcome::Declined);
        }

        if let Err(e) = self.customers.settle_account(self.customer_id).await {
            warn!(customer_id = self.customer_id, error = %e, "Settlement failed");
            self.notifier.error(&e.user_message(SETTLE_FAILED));
            return Err(e);
        }

        self.sales.clear();
        self.interest_input.clear();
        info!(customer_id = self.customer_id, %amount, "Account settled");
        self.notifier.success(&format!(
            "Full payment recorded for {}. History cleared.",
            amount
        ));
        Ok(SettleOutcome::Settled { amount })
    }

    /// Registers a payment against one sale, then re-fetches everything.
    pub async fn register_payment(&mut self, sale_id: i64, raw_amount: &str) -> ClientResult<()> {
        let amount = match parse_payment_amount(raw_amount) {
            Ok(amount) => amount,
            Err(e) => {
                self.notifier.error("Invalid amount");
                return Err(e.into());
            }
        };

        let payment = PaymentRequest {
            sale_id,
            customer_id: Some(self.customer_id),
            amount,
        };
        if let Err(e) = self.sales_api.register_payment(&payment).await {
            warn!(sale_id, error = %e, "Payment failed");
            self.notifier.error(&e.user_message(PAYMENT_FAILED));
            return Err(e);
        }

        info!(sale_id, %amount, "Payment registered");
        self.notifier.success("Payment registered");
        self.refresh().await
    }

    /// Fetches one sale with its items.
    pub async fn sale_detail(&self, sale_id: i64) -> ClientResult<Sale> {
        self.sales_api.get_sale(sale_id).await.map_err(|e| {
            self.notifier.error(DETAIL_FAILED);
            e
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;
    use crate::notify::{NoticeLevel, RecordingNotifier, ScriptedConfirmer};
    use crate::testing::{customer, sale, FakeBackend};

    struct Harness {
        api: Arc<FakeBackend>,
        notifier: Arc<RecordingNotifier>,
        confirmer: Arc<ScriptedConfirmer>,
        view: AccountView,
    }

    fn harness(answers: Vec<bool>) -> Harness {
        let api = Arc::new(FakeBackend::new());
        *api.customers.lock().unwrap() = vec![customer(4, "Ana"), customer(5, "Luis")];
        *api.sales.lock().unwrap() = vec![sale(1, 4, 400), sale(2, 4, 600), sale(3, 5, 999)];
        let notifier = Arc::new(RecordingNotifier::new());
        let confirmer = Arc::new(ScriptedConfirmer::new(answers));
        let view = AccountView::new(api.clone(), api.clone(), notifier.clone(), confirmer.clone(), 4);
        Harness {
            api,
            notifier,
            confirmer,
            view,
        }
    }

    #[tokio::test]
    async fn test_refresh_loads_customer_and_sales() {
        let mut h = harness(vec![]);
        h.view.refresh().await.unwrap();

        assert_eq!(h.view.customer().unwrap().nombre, "Ana");
        assert_eq!(h.view.sales().len(), 2);
        assert_eq!(h.view.total(), Money::from_major(1000));
        assert!(h.api.calls().contains(&"list_sales:4".to_string()));
    }

    #[tokio::test]
    async fn test_settle_with_interest_after_two_confirmations() {
        let mut h = harness(vec![true, true]);
        h.view.refresh().await.unwrap();
        h.view.set_interest("10");

        let outcome = h.view.settle().await.unwrap();
        assert_eq!(
            outcome,
            SettleOutcome::Settled {
                amount: Money::from_major(1100)
            }
        );
        let prompts = h.confirmer.prompts();
        assert_eq!(prompts[0], "Confirm full payment of $1100.00?");
        assert_eq!(prompts[1], SETTLE_WARNING);
        assert_eq!(h.api.count("settle_account"), 1);
        assert!(h.view.sales().is_empty());
        assert_eq!(h.view.interest_input(), "");
    }

    #[tokio::test]
    async fn test_invalid_interest_settles_plain_total() {
        let mut h = harness(vec![true, true]);
        h.view.refresh().await.unwrap();
        h.view.set_interest("abc");
        assert_eq!(h.view.settlement().final_amount, Money::from_major(1000));
    }

    #[tokio::test]
    async fn test_second_confirmation_declined_sends_nothing() {
        let mut h = harness(vec![true, false]);
        h.view.refresh().await.unwrap();

        assert_eq!(h.view.settle().await.unwrap(), SettleOutcome::Declined);
        assert_eq!(h.api.count("settle_account"), 0);
        assert_eq!(h.view.sales().len(), 2);
    }

    #[tokio::test]
    async fn test_settle_failure_keeps_sales() {
        let mut h = harness(vec![true, true]);
        h.view.refresh().await.unwrap();
        h.api.fail_on("settle_account", 500, None);

        assert!(h.view.settle().await.is_err());
        assert_eq!(h.view.sales().len(), 2);
        assert_eq!(h.notifier.messages(NoticeLevel::Error), vec![SETTLE_FAILED]);
    }

    #[tokio::test]
    async fn test_invalid_payment_never_sent() {
        let mut h = harness(vec![]);
        h.view.refresh().await.unwrap();

        for raw in ["0", "-5", "abc", ""] {
            let err = h.view.register_payment(1, raw).await.unwrap_err();
            assert!(err.is_validation());
        }
        assert_eq!(h.api.count("register_payment"), 0);
    }

    #[tokio::test]
    async fn test_payment_then_full_refetch() {
        let mut h = harness(vec![]);
        h.view.refresh().await.unwrap();
        let sale = h.view.sales()[0].clone();
        assert_eq!(payment_prefill(&sale), "400");

        h.view.register_payment(sale.id, "150").await.unwrap();

        let sent = h.api.payments.lock().unwrap()[0].clone();
        assert_eq!(sent.customer_id, Some(4));
        assert_eq!(sent.amount, Money::from_major(150));
        assert_eq!(h.api.count("get_customer"), 2);
        assert_eq!(h.view.sales()[0].outstanding(), Money::from_major(250));
    }

    #[tokio::test]
    async fn test_refresh_failure_keeps_snapshot() {
        let mut h = harness(vec![]);
        h.view.refresh().await.unwrap();
        h.api.fail_on("list_sales", 502, None);

        let err = h.view.refresh().await.unwrap_err();
        assert!(matches!(err, ClientError::Http { status: 502, .. }));
        assert_eq!(h.view.sales().len(), 2);
        assert_eq!(h.notifier.messages(NoticeLevel::Error), vec![LOAD_FAILED]);
    }

    #[tokio::test]
    async fn test_sale_detail() {
        let h = harness(vec![]);
        assert_eq!(h.view.sale_detail(2).await.unwrap().total, Money::from_major(600));
        assert!(h.view.sale_detail(99).await.is_err());
    }
}
