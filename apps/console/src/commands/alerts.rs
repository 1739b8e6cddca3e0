//! # Alert Board Commands
//!
//! Expiry and low-stock alerts. While the board is open a poller re-fetches
//! the list in the background; `show` always prints the latest copy.

use chrono::Local;
use tracing::debug;

use crate::error::CommandResult;
use crate::state::AppState;
use vetdesk_core::alerts::AlertFilter;

pub fn show(state: &AppState) {
    let board = &state.views.alerts;
    let today = Local::now().date_naive();
    let counts = board.counts(today);

    println!(
        "Alerts  all {} · expiring {} · expired {} · low stock {}   [{}]",
        counts.all,
        counts.expiring,
        counts.expired,
        counts.low_stock,
        board.filter().as_str()
    );
    if let Some(at) = board.last_updated() {
        println!("  updated {}", at.with_timezone(&Local).format("%H:%M:%S"));
    }

    let visible = board.visible(today);
    if visible.is_empty() {
        println!("  No alerts");
    }
    for alert in visible {
        let badge = alert
            .expiry_status(today)
            .map(|status| status.label())
            .or_else(|| alert.is_low_stock().then(|| "Low stock".to_string()))
            .unwrap_or_default();
        println!(
            "  #{:<5} {:<8} {:<18} {}",
            alert.id,
            String::from(alert.kind.clone()),
            badge,
            alert.message
        );
    }
}

pub fn filter(state: &AppState, filter: AlertFilter) {
    debug!(?filter, "filter command");
    state.views.alerts.set_filter(filter);
    show(state);
}

pub fn find(state: &AppState, query: &str) {
    debug!(query = %query, "find command");
    state.views.alerts.set_query(query);
    show(state);
}

pub async fn resolve(state: &AppState, id: i64) -> CommandResult<()> {
    debug!(id, "resolve command");
    if state.views.alerts.resolve(id).await? {
        show(state);
    }
    Ok(())
}
