//! # Report Commands
//!
//! Monthly sales and profit for a date range, with CSV export.
//!
//! ```text
//!   report 2024-01-01 2024-06-30
//!     │
//!     ├── bad dates ──► notice, no request
//!     └── GET sales-by-month + profit-by-month (one deadline for both)
//!           │
//!           ▼
//!   summary cards + month tables with month-over-month change
//! ```

use std::path::PathBuf;

use tracing::debug;

use crate::error::{CommandResult, ConsoleError};
use crate::state::AppState;
use vetdesk_core::reports::{format_change, ReportKind};

pub fn render(state: &AppState) {
    let reports = &state.views.reports;
    let (from, to) = reports.range();
    println!("Reports {} to {}", from, to);

    if let Some(error) = reports.last_error() {
        println!("  ! {}", error);
    }

    let totals = reports.totals();
    println!(
        "  Sales {}  Orders {}  Items {}  Avg/month {}",
        state.money(totals.total_sales),
        totals.total_orders,
        totals.total_items,
        state.money(totals.avg_per_month)
    );
    println!(
        "  Revenue {}  Cost {}  Profit {}",
        state.money(totals.total_revenue),
        state.money(totals.total_cogs),
        state.money(totals.total_profit)
    );
    if let (Some(best), Some(worst)) = (&totals.best_month, &totals.worst_month) {
        println!(
            "  Best {} ({})  Worst {} ({})",
            best.month,
            state.money(best.total_sales),
            worst.month,
            state.money(worst.total_sales)
        );
    }

    let sales = reports.sales_with_change();
    if !sales.is_empty() {
        println!("  {:<8} {:>7} {:>7} {:>14} {:>8}", "Month", "Orders", "Items", "Sales", "Change");
        for entry in sales {
            println!(
                "  {:<8} {:>7} {:>7} {:>14} {:>8}",
                entry.row.month,
                entry.row.orders,
                entry.row.total_items,
                state.money(entry.row.total_sales),
                format_change(entry.change_pct)
            );
        }
    }

    let profit = reports.profit_with_change();
    if !profit.is_empty() {
        println!("  {:<8} {:>14} {:>14} {:>14} {:>8}", "Month", "Revenue", "Cost", "Profit", "Change");
        for entry in profit {
            println!(
                "  {:<8} {:>14} {:>14} {:>14} {:>8}",
                entry.row.month,
                state.money(entry.row.revenue),
                state.money(entry.row.cogs),
                state.money(entry.row.profit),
                format_change(entry.change_pct)
            );
        }
    }
}

/// Loads a new range, or reloads the current one when none is given.
pub async fn load(state: &mut AppState, from: Option<&str>, to: Option<&str>) -> CommandResult<()> {
    debug!(?from, ?to, "report command");

    let reports = &mut state.views.reports;
    match (from, to) {
        (Some(from), Some(to)) => reports.load(from, to).await?,
        _ => reports.reload().await?,
    }
    render(state);
    Ok(())
}

/// Writes one series as CSV into `dir` (default: the working directory).
pub fn export(state: &AppState, kind: ReportKind, dir: Option<PathBuf>) -> CommandResult<()> {
    debug!(kind = kind.slug(), ?dir, "export command");

    let dir = dir.unwrap_or_else(|| PathBuf::from("."));
    let written = state
        .views
        .reports
        .write_csv(kind, &dir)
        .map_err(|e| ConsoleError::internal(format!("Could not write the CSV file: {}", e)))?;
    if let Some(path) = written {
        state
            .notifier
            .success(&format!("Exported {}", path.display()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::auth::go;
    use crate::testing::harness;
    use vetdesk_client::Route;
    use vetdesk_core::{Money, SalesMonth};

    fn month(month: &str, total: i64) -> SalesMonth {
        SalesMonth {
            month: month.to_string(),
            orders: 3,
            total_sales: Money::from_major(total),
            total_items: 7,
        }
    }

    #[tokio::test]
    async fn test_invalid_range_sends_nothing() {
        let mut h = harness(true).await;
        go(&mut h.state, Route::Reports).await.unwrap();
        let before = h.api.count("sales_by_month");

        let err = load(&mut h.state, Some("2024-06-30"), Some("2024-01-01"))
            .await
            .unwrap_err();
        assert!(err.already_notified());
        assert_eq!(h.api.count("sales_by_month"), before);
    }

    #[tokio::test]
    async fn test_export_writes_file() {
        let mut h = harness(true).await;
        h.api
            .sales_months
            .lock()
            .unwrap()
            .extend([month("2024-01", 1000), month("2024-02", 1500)]);
        go(&mut h.state, Route::Reports).await.unwrap();
        load(&mut h.state, Some("2024-01-01"), Some("2024-02-29")).await.unwrap();

        let dir = std::env::temp_dir().join(format!("vetdesk-export-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        export(&h.state, ReportKind::Sales, Some(dir.clone())).unwrap();

        let path = dir.join("report_sales_2024-01-01_to_2024-02-29.csv");
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("2024-02"));
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_export_empty_series_writes_nothing() {
        let mut h = harness(true).await;
        go(&mut h.state, Route::Reports).await.unwrap();

        export(&h.state, ReportKind::Profit, Some(std::env::temp_dir())).unwrap();
        assert_eq!(h.infos(), vec!["No data to export".to_string()]);
    }
}
