//! # Customer Account Commands
//!
//! ```text
//!   account 12 ──► customer + outstanding sales
//!   interest 10 ─► final amount = total × 1.10 (display only)
//!   settle ──────► two confirmations ──► DELETE /api/customers/12/sales
//!   pay 31 [amt] ► POST /api/payments (amount defaults to the outstanding)
//! ```

use tracing::debug;

use super::auth::open_account;
use crate::error::CommandResult;
use crate::state::AppState;
use vetdesk_client::account::payment_prefill;
use vetdesk_client::SettleOutcome;

/// Prints the open account.
pub fn render(state: &AppState) {
    let Some(view) = state.views.account.as_ref() else {
        return;
    };

    match view.customer() {
        Some(c) => println!(
            "Account #{} {}{}",
            c.id,
            c.nombre,
            c.telefono
                .as_deref()
                .map(|t| format!(" ({})", t))
                .unwrap_or_default()
        ),
        None => println!("Account #{}", view.customer_id()),
    }

    if view.sales().is_empty() {
        println!("  No outstanding sales");
    }
    for sale in view.sales() {
        println!(
            "  #{:<6} {:<20} total {:>12}  owed {:>12}",
            sale.id,
            sale.created_at.as_deref().unwrap_or("-"),
            state.money(sale.total),
            state.money(sale.outstanding())
        );
    }

    let settlement = view.settlement();
    println!("  Total owed {:>12}", state.money(settlement.total));
    if let Some(rate) = settlement.interest {
        println!(
            "  With {}% interest {:>12}",
            rate.percent(),
            state.money(settlement.final_amount)
        );
    }
}

pub fn interest(state: &mut AppState, raw: &str) -> CommandResult<()> {
    debug!(raw = %raw, "interest command");
    open_account(state)?.set_interest(raw);
    render(state);
    Ok(())
}

pub async fn settle(state: &mut AppState) -> CommandResult<()> {
    debug!("settle command");

    let outcome = open_account(state)?.settle().await?;
    if matches!(outcome, SettleOutcome::Settled { .. }) {
        render(state);
    }
    Ok(())
}

/// Registers a partial payment. Without an amount the sale's outstanding
/// balance is used.
pub async fn pay(state: &mut AppState, sale_id: i64, amount: Option<&str>) -> CommandResult<()> {
    debug!(sale_id, ?amount, "pay command");

    let view = open_account(state)?;
    let raw = match amount {
        Some(raw) => raw.to_string(),
        None => view
            .sales()
            .iter()
            .find(|s| s.id == sale_id)
            .map(payment_prefill)
            .unwrap_or_default(),
    };
    view.register_payment(sale_id, &raw).await?;
    render(state);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::auth::go;
    use crate::testing::{harness_with, Harness};
    use vetdesk_client::testing::{customer, sale};
    use vetdesk_client::Route;
    use vetdesk_core::Money;

    async fn open(answers: Vec<bool>) -> Harness {
        let mut h = harness_with(true, answers).await;
        h.api.customers.lock().unwrap().push(customer(12, "Ana"));
        h.api
            .sales
            .lock()
            .unwrap()
            .extend([sale(31, 12, 1000), sale(32, 12, 500)]);
        go(&mut h.state, Route::CustomerAccount(12)).await.unwrap();
        h
    }

    #[tokio::test]
    async fn test_interest_changes_final_amount() {
        let mut h = open(vec![]).await;

        interest(&mut h.state, "10").unwrap();
        let view = h.state.views.account.as_ref().unwrap();
        assert_eq!(view.settlement().final_amount, Money::from_major(1650));
    }

    #[tokio::test]
    async fn test_pay_defaults_to_outstanding() {
        let mut h = open(vec![]).await;

        pay(&mut h.state, 32, None).await.unwrap();
        let payments = h.api.payments.lock().unwrap().clone();
        assert_eq!(payments.len(), 1);
        assert_eq!(payments[0].amount, Money::from_major(500));
    }

    #[tokio::test]
    async fn test_pay_rejects_bad_amount() {
        let mut h = open(vec![]).await;

        let err = pay(&mut h.state, 31, Some("abc")).await.unwrap_err();
        assert!(err.already_notified());
        assert!(h.api.payments.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_settle_needs_both_confirmations() {
        let mut h = open(vec![true, false]).await;
        settle(&mut h.state).await.unwrap();
        assert_eq!(h.api.count("settle_account"), 0);

        let mut h = open(vec![true, true]).await;
        settle(&mut h.state).await.unwrap();
        assert_eq!(h.api.count("settle_account"), 1);
        assert!(h.state.views.account.as_ref().unwrap().sales().is_empty());
    }
}
