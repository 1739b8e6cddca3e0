//! # Customer & Sales History Commands

use tracing::debug;

use super::Fields;
use crate::error::{CommandResult, ConsoleError};
use crate::state::AppState;
use vetdesk_core::forms::CustomerForm;
use vetdesk_core::{Customer, Sale};

fn customer_form(customer: Option<&Customer>) -> CustomerForm {
    let Some(c) = customer else {
        return CustomerForm::default();
    };
    CustomerForm {
        nombre: c.nombre.clone(),
        email: c.email.clone().unwrap_or_default(),
        telefono: c.telefono.clone().unwrap_or_default(),
    }
}

fn apply_customer_fields(form: &mut CustomerForm, fields: &Fields) -> CommandResult<()> {
    for (key, value) in fields {
        let slot = match key.as_str() {
            "nombre" => &mut form.nombre,
            "email" => &mut form.email,
            "telefono" => &mut form.telefono,
            other => return Err(ConsoleError::usage(format!("unknown field '{}'", other))),
        };
        *slot = value.clone();
    }
    Ok(())
}

pub fn render(state: &AppState) {
    let customers = state.views.customers.visible();
    println!("Customers ({})", customers.len());
    for c in customers {
        println!(
            "  #{:<5} {:<32} {:<28} {}",
            c.id,
            c.nombre,
            c.email.as_deref().unwrap_or("-"),
            c.telefono.as_deref().unwrap_or("-")
        );
    }
}

pub async fn list(state: &mut AppState, query: &str) -> CommandResult<()> {
    debug!(query = %query, "customers command");

    let admin = &mut state.views.customers;
    if admin.customers().is_empty() {
        admin.refresh().await?;
    }
    admin.set_query(query);
    render(state);
    Ok(())
}

pub async fn save(state: &mut AppState, id: Option<i64>, fields: &Fields) -> CommandResult<()> {
    debug!(?id, fields = fields.len(), "customer save command");

    let admin = &mut state.views.customers;
    let existing = match id {
        Some(id) => {
            if admin.find(id).is_none() {
                admin.refresh().await?;
            }
            Some(
                admin
                    .find(id)
                    .ok_or_else(|| ConsoleError::not_found("Customer", &id.to_string()))?,
            )
        }
        None => None,
    };

    let mut form = customer_form(existing);
    apply_customer_fields(&mut form, fields)?;
    admin.save(id, &form).await?;
    render(state);
    Ok(())
}

pub async fn delete(state: &mut AppState, id: i64) -> CommandResult<()> {
    debug!(id, "customer delete command");
    if state.views.customers.delete(id).await? {
        render(state);
    }
    Ok(())
}

// =============================================================================
// Sales History
// =============================================================================

pub fn render_history(state: &AppState) {
    let sales = state.views.history.visible();
    println!("Sales ({})", sales.len());
    for sale in sales {
        println!(
            "  #{:<6} {:<20} {:>12} {:>4} items  {}",
            sale.id,
            sale.created_at.as_deref().unwrap_or("-"),
            state.money(sale.total),
            sale.items.len(),
            if sale.on_credit { "on account" } else { "paid" }
        );
    }
}

pub async fn history(state: &mut AppState, query: &str) -> CommandResult<()> {
    debug!(query = %query, "history command");

    let history = &mut state.views.history;
    if history.sales().is_empty() {
        history.refresh().await?;
    }
    history.set_query(query);
    render_history(state);
    Ok(())
}

fn print_sale(state: &AppState, sale: &Sale) {
    println!(
        "Sale #{} {}{}",
        sale.id,
        sale.created_at.as_deref().unwrap_or(""),
        sale.customer_id
            .map(|id| format!("  customer #{}", id))
            .unwrap_or_default()
    );
    for item in &sale.items {
        println!(
            "  {:<32} x{:<5} {:>12} {:>12}",
            item.display_name(),
            item.qty,
            state.money(item.precio_unitario),
            state.money(item.line_total())
        );
    }
    println!("  Total {:>12}", state.money(sale.total));
    if sale.on_credit {
        println!("  Outstanding {:>12}", state.money(sale.outstanding()));
    }
}

/// One sale with its items. Uses the open account when there is one.
pub async fn sale_detail(state: &mut AppState, id: i64) -> CommandResult<()> {
    debug!(id, "sale command");

    let sale = match state.views.account.as_ref() {
        Some(view) if matches!(state.route, vetdesk_client::Route::CustomerAccount(_)) => {
            view.sale_detail(id).await?
        }
        _ => state.views.history.detail(id).await?,
    };
    print_sale(state, &sale);
    Ok(())
}
