//! # Reports
//!
//! Client-side reductions over the pre-aggregated monthly series, plus CSV
//! export.
//!
//! ## Derived Values
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  sales-by-month[]  ──► totals: sales, orders, items                    │
//! │                    ──► avg per month, best month, worst month          │
//! │                    ──► month-over-month % on total_sales               │
//! │                                                                         │
//! │  profit-by-month[] ──► totals: revenue, cogs, profit                   │
//! │                    ──► month-over-month % on profit                    │
//! │                                                                         │
//! │  change = (cur − prev) / |prev| × 100                                  │
//! │           None for the first month or when prev == 0                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{Datelike, NaiveDate};

use crate::money::Money;
use crate::types::{plain_amount, ProfitMonth, SalesMonth};

// =============================================================================
// Range
// =============================================================================

/// Default report range: the first day of the month five months back, to today.
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use vetdesk_core::reports::default_range;
///
/// let today = NaiveDate::from_ymd_opt(2024, 3, 20).unwrap();
/// let (from, to) = default_range(today);
/// assert_eq!(from, NaiveDate::from_ymd_opt(2023, 10, 1).unwrap());
/// assert_eq!(to, today);
/// ```
pub fn default_range(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let month_index = today.year() * 12 + today.month0() as i32 - 5;
    let from = NaiveDate::from_ymd_opt(
        month_index.div_euclid(12),
        month_index.rem_euclid(12) as u32 + 1,
        1,
    )
    .unwrap_or(today);
    (from, today)
}

// =============================================================================
// Totals
// =============================================================================

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReportTotals {
    pub total_sales: Money,
    pub total_orders: i64,
    pub total_items: i64,
    pub total_revenue: Money,
    pub total_cogs: Money,
    pub total_profit: Money,
    pub avg_per_month: Money,
    pub best_month: Option<SalesMonth>,
    pub worst_month: Option<SalesMonth>,
}

impl ReportTotals {
    /// Reduces both series. Ties for best/worst keep the earliest row.
    pub fn compute(sales: &[SalesMonth], profit: &[ProfitMonth]) -> Self {
        let total_sales: Money = sales.iter().map(|r| r.total_sales).sum();

        let avg_per_month = if sales.is_empty() {
            Money::zero()
        } else {
            Money::from_cents((total_sales.cents() as f64 / sales.len() as f64).round() as i64)
        };

        let best_month = sales
            .iter()
            .fold(None::<&SalesMonth>, |best, cur| match best {
                Some(b) if cur.total_sales <= b.total_sales => Some(b),
                _ => Some(cur),
            })
            .cloned();

        let worst_month = sales
            .iter()
            .fold(None::<&SalesMonth>, |worst, cur| match worst {
                Some(w) if cur.total_sales >= w.total_sales => Some(w),
                _ => Some(cur),
            })
            .cloned();

        ReportTotals {
            total_sales,
            total_orders: sales.iter().map(|r| r.orders).sum(),
            total_items: sales.iter().map(|r| r.total_items).sum(),
            total_revenue: profit.iter().map(|r| r.revenue).sum(),
            total_cogs: profit.iter().map(|r| r.cogs).sum(),
            total_profit: profit.iter().map(|r| r.profit).sum(),
            avg_per_month,
            best_month,
            worst_month,
        }
    }
}

// =============================================================================
// Month over Month
// =============================================================================

/// A report row paired with its change against the previous month.
#[derive(Debug, Clone, PartialEq)]
pub struct WithChange<'a, T> {
    pub row: &'a T,
    pub change_pct: Option<f64>,
}

/// Sorts ascending by month, computes the change, and returns the rows
/// newest first (display order).
pub fn month_over_month<'a, T, F>(
    rows: &'a [T],
    month: fn(&T) -> &str,
    value: F,
) -> Vec<WithChange<'a, T>>
where
    F: Fn(&T) -> Money,
{
    let mut sorted: Vec<&T> = rows.iter().collect();
    sorted.sort_by(|a, b| month(a).cmp(month(b)));

    let mut out: Vec<WithChange<'a, T>> = sorted
        .iter()
        .enumerate()
        .map(|(idx, &row)| {
            let change_pct = idx
                .checked_sub(1)
                .map(|prev_idx| value(sorted[prev_idx]))
                .filter(|prev| !prev.is_zero())
                .map(|prev| {
                    let cur = value(row).cents() as f64;
                    let prev = prev.cents() as f64;
                    (cur - prev) / prev.abs() * 100.0
                });
            WithChange { row, change_pct }
        })
        .collect();
    out.reverse();
    out
}

/// Month-over-month on `total_sales`.
pub fn sales_with_change(rows: &[SalesMonth]) -> Vec<WithChange<'_, SalesMonth>> {
    month_over_month(rows, |r| r.month.as_str(), |r| r.total_sales)
}

/// Month-over-month on `profit`.
pub fn profit_with_change(rows: &[ProfitMonth]) -> Vec<WithChange<'_, ProfitMonth>> {
    month_over_month(rows, |r| r.month.as_str(), |r| r.profit)
}

/// `+12.5%`, `-3.0%`, or `-` when undefined.
pub fn format_change(change: Option<f64>) -> String {
    match change {
        Some(pct) if pct >= 0.0 => format!("+{:.1}%", pct),
        Some(pct) => format!("{:.1}%", pct),
        None => "-".to_string(),
    }
}

// =============================================================================
// CSV Export
// =============================================================================

/// Which series a report (or CSV file) is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Sales,
    Profit,
}

impl ReportKind {
    pub fn slug(&self) -> &'static str {
        match self {
            ReportKind::Sales => "sales",
            ReportKind::Profit => "profit",
        }
    }

    /// `report_<sales|profit>_<from>_to_<to>.csv`
    pub fn file_name(&self, from: NaiveDate, to: NaiveDate) -> String {
        format!(
            "report_{}_{}_to_{}.csv",
            self.slug(),
            from.format("%Y-%m-%d"),
            to.format("%Y-%m-%d")
        )
    }
}

/// A row that can be written as CSV.
pub trait CsvRow {
    fn header() -> &'static [&'static str];
    fn cells(&self) -> Vec<String>;
}

impl CsvRow for SalesMonth {
    fn header() -> &'static [&'static str] {
        &["month", "orders", "total_sales", "total_items"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.month.clone(),
            self.orders.to_string(),
            plain_amount(self.total_sales),
            self.total_items.to_string(),
        ]
    }
}

impl CsvRow for ProfitMonth {
    fn header() -> &'static [&'static str] {
        &["month", "revenue", "cogs", "profit"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.month.clone(),
            plain_amount(self.revenue),
            plain_amount(self.cogs),
            plain_amount(self.profit),
        ]
    }
}

fn quote(cell: &str) -> String {
    format!("\"{}\"", cell.replace('"', "\"\""))
}

/// Header line plus one line per row, every cell quoted.
///
/// Returns `None` for an empty series (nothing to export).
pub fn to_csv<T: CsvRow>(rows: &[T]) -> Option<String> {
    if rows.is_empty() {
        return None;
    }
    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(T::header().join(","));
    for row in rows {
        let cells: Vec<String> = row.cells().iter().map(|c| quote(c)).collect();
        lines.push(cells.join(","));
    }
    Some(lines.join("\n"))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sales_month(month: &str, total: i64) -> SalesMonth {
        SalesMonth {
            month: month.to_string(),
            orders: 2,
            total_sales: Money::from_major(total),
            total_items: 5,
        }
    }

    #[test]
    fn test_month_over_month() {
        let rows = vec![sales_month("2024-01", 100), sales_month("2024-02", 150)];
        let changes = sales_with_change(&rows);

        // newest first
        assert_eq!(changes[0].row.month, "2024-02");
        assert_eq!(changes[0].change_pct, Some(50.0));
        assert_eq!(changes[1].row.month, "2024-01");
        assert_eq!(changes[1].change_pct, None);
    }

    #[test]
    fn test_month_over_month_sorts_and_skips_zero_prev() {
        let rows = vec![
            sales_month("2024-03", 50),
            sales_month("2024-01", 0),
            sales_month("2024-02", 80),
        ];
        let changes = sales_with_change(&rows);
        let months: Vec<&str> = changes.iter().map(|c| c.row.month.as_str()).collect();
        assert_eq!(months, vec!["2024-03", "2024-02", "2024-01"]);
        assert_eq!(changes[1].change_pct, None); // prev is zero
        assert_eq!(changes[0].change_pct, Some(-37.5));
    }

    #[test]
    fn test_negative_previous_uses_absolute_value() {
        let rows = vec![
            ProfitMonth {
                month: "2024-01".into(),
                revenue: Money::zero(),
                cogs: Money::zero(),
                profit: Money::from_major(-100),
            },
            ProfitMonth {
                month: "2024-02".into(),
                revenue: Money::zero(),
                cogs: Money::zero(),
                profit: Money::from_major(50),
            },
        ];
        let changes = profit_with_change(&rows);
        assert_eq!(changes[0].change_pct, Some(150.0));
    }

    #[test]
    fn test_totals() {
        let sales = vec![
            sales_month("2024-01", 100),
            sales_month("2024-02", 300),
            sales_month("2024-03", 100),
        ];
        let profit = vec![ProfitMonth {
            month: "2024-01".into(),
            revenue: Money::from_major(100),
            cogs: Money::from_major(60),
            profit: Money::from_major(40),
        }];
        let totals = ReportTotals::compute(&sales, &profit);

        assert_eq!(totals.total_sales, Money::from_major(500));
        assert_eq!(totals.total_orders, 6);
        assert_eq!(totals.total_items, 15);
        assert_eq!(totals.total_profit, Money::from_major(40));
        assert_eq!(totals.avg_per_month, Money::from_cents(16667));
        assert_eq!(totals.best_month.unwrap().month, "2024-02");
        assert_eq!(totals.worst_month.unwrap().month, "2024-01");
    }

    #[test]
    fn test_totals_empty() {
        let totals = ReportTotals::compute(&[], &[]);
        assert_eq!(totals.avg_per_month, Money::zero());
        assert!(totals.best_month.is_none());
    }

    #[test]
    fn test_csv_quotes_every_cell() {
        let mut row = sales_month("2024-01", 100);
        row.month = "2024\"01".into();
        let csv = to_csv(&[row]).unwrap();
        assert_eq!(
            csv,
            "month,orders,total_sales,total_items\n\"2024\"\"01\",\"2\",\"100\",\"5\""
        );
        assert!(to_csv::<SalesMonth>(&[]).is_none());
    }

    #[test]
    fn test_file_name_and_change_format() {
        let from = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let to = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
        assert_eq!(
            ReportKind::Profit.file_name(from, to),
            "report_profit_2024-01-01_to_2024-06-30.csv"
        );
        assert_eq!(format_change(Some(50.0)), "+50.0%");
        assert_eq!(format_change(None), "-");
    }

    #[test]
    fn test_default_range_crosses_year() {
        let today = NaiveDate::from_ymd_opt(2024, 2, 10).unwrap();
        assert_eq!(
            default_range(today).0,
            NaiveDate::from_ymd_opt(2023, 9, 1).unwrap()
        );
    }
}
