//! # Cart Commands
//!
//! Editing the sale draft on the point-of-sale screen.
//!
//! ## Cart Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Lifecycle                                       │
//! │                                                                         │
//! │  ┌──────────┐     ┌──────────┐     ┌──────────┐     ┌──────────┐       │
//! │  │  Empty   │────►│ In Cart  │────►│ Confirm  │────►│ Recorded │       │
//! │  │  Cart    │     │          │     │  prompt  │     │   Sale   │       │
//! │  └──────────┘     └──────────┘     └──────────┘     └──────────┘       │
//! │                        │                 │                              │
//! │                      add              checkout                          │
//! │                      qty              (sale.rs)                         │
//! │                      rm                                                 │
//! │                      customer / credit                                  │
//! │                        │                                                │
//! │                        ▼                                                │
//! │                      clear ─────────────────────────►                  │
//! │                                                      (back to empty)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use tracing::debug;

use crate::error::{CommandResult, ConsoleError};
use crate::state::AppState;
use vetdesk_client::SaleDraft;

/// Adds entry `index` (1-based) of the last listing.
pub fn add(state: &mut AppState, index: usize, qty: i64) -> CommandResult<()> {
    debug!(index, qty, "add command");

    let item = state
        .views
        .sales
        .listing
        .get(index - 1)
        .cloned()
        .ok_or_else(|| ConsoleError::not_found("Listing entry", &index.to_string()))?;

    let added = state
        .cart
        .with_cart_mut(|draft| draft.cart.add_item(&item, qty).map(|line| line.qty));
    match added {
        Ok(line_qty) => {
            debug!(key = %item.key(), line_qty, "Item added");
            show(state);
            Ok(())
        }
        Err(e) => {
            state.notifier.error(&e.to_string());
            Err(ConsoleError::validation(e.to_string()))
        }
    }
}

/// Sets a line quantity from typed text. Non-numbers become 1 and the
/// value is clamped to the line's stock.
pub fn set_quantity(state: &mut AppState, key: &str, raw: &str) -> CommandResult<()> {
    debug!(key = %key, raw = %raw, "qty command");

    let qty = state
        .cart
        .with_cart_mut(|draft| draft.cart.update_quantity(key, raw))?;
    debug!(key = %key, qty, "Quantity set");
    show(state);
    Ok(())
}

pub fn remove(state: &mut AppState, key: &str) -> CommandResult<()> {
    debug!(key = %key, "rm command");

    if !state.cart.with_cart_mut(|draft| draft.cart.remove_item(key)) {
        return Err(ConsoleError::not_found("Cart line", key));
    }
    show(state);
    Ok(())
}

pub fn clear(state: &mut AppState) {
    debug!("clear command");
    state.cart.with_cart_mut(SaleDraft::reset);
    show(state);
}

/// Picks the customer. Blank input means none and turns credit off.
pub fn select_customer(state: &mut AppState, raw: &str) {
    debug!(raw = %raw, "customer command");
    state
        .cart
        .with_cart_mut(|draft| draft.selection.select_customer(raw));
    show(state);
}

pub fn set_credit(state: &mut AppState, on: bool) {
    debug!(on, "credit command");
    state
        .cart
        .with_cart_mut(|draft| draft.selection.set_on_credit(on));
    show(state);
}

/// Prints the cart panel.
///
/// ```text
///   CART                                   3 items
///   p-1   Pipeta perro          x2        $3000.00
///   s-7   Consulta              x1        $5000.00
///   Subtotal                              $8000.00
///   Customer: 12 (on account)
/// ```
pub fn show(state: &AppState) {
    let draft = state.cart.with_cart(Clone::clone);
    let totals = state.cart.totals();

    println!("  CART{:>44}", format!("{} items", totals.items_count));
    for line in draft.cart.lines() {
        println!(
            "  {:<6} {:<28} x{:<5} {:>12}",
            line.key,
            line.nombre,
            line.qty,
            state.money(line.line_total())
        );
    }
    println!("  {:<42}{:>12}", "Subtotal", state.money(totals.subtotal));

    let customer = match draft.selection.customer_id() {
        None => "none".to_string(),
        Some(id) => {
            let name = id
                .parse::<i64>()
                .ok()
                .and_then(|id| state.views.customers.find(id))
                .map(|c| format!(" {}", c.nombre))
                .unwrap_or_default();
            format!(
                "{}{}{}",
                id,
                name,
                if draft.selection.on_credit() { " (on account)" } else { " (paid now)" }
            )
        }
    };
    println!("  Customer: {}", customer);
}
