//! # Alert Classification
//!
//! Derives expiry and low-stock categories from raw alerts. Nothing here is
//! stored: callers recompute from the fetched list whenever they need it.
//!
//! ## Expiry Buckets
//! ```text
//!   days = expiry_date − today   (calendar days)
//!
//!   ... -2  -1 │  0   1  ...  30 │ 31  32 ...
//!   ───────────┼─────────────────┼───────────
//!     Expired  │    Expiring     │  Valid
//! ```
//!
//! "Today" is a parameter so the rules stay pure.

use chrono::NaiveDate;
use std::cmp::Reverse;

use crate::types::Alert;
use crate::EXPIRY_WARNING_DAYS;

// =============================================================================
// Expiry Status
// =============================================================================

/// Where a date falls relative to today.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryStatus {
    /// Strictly in the past. `days_ago ≥ 1`.
    Expired { days_ago: i64 },
    /// Today up to 30 days ahead, inclusive.
    Expiring { days_left: i64 },
    /// More than 30 days ahead.
    Valid { days_left: i64 },
}

impl ExpiryStatus {
    pub fn classify(expiry: NaiveDate, today: NaiveDate) -> Self {
        let days = (expiry - today).num_days();
        if days < 0 {
            ExpiryStatus::Expired { days_ago: -days }
        } else if days <= EXPIRY_WARNING_DAYS {
            ExpiryStatus::Expiring { days_left: days }
        } else {
            ExpiryStatus::Valid { days_left: days }
        }
    }

    /// Short badge text for listings.
    pub fn label(&self) -> String {
        match self {
            ExpiryStatus::Expired { days_ago } => format!("Expired ({}d)", days_ago),
            ExpiryStatus::Expiring { days_left } => format!("Expiring ({}d)", days_left),
            ExpiryStatus::Valid { days_left } => format!("Expires in {}d", days_left),
        }
    }
}

impl Alert {
    /// Expiry bucket, or `None` when the alert carries no usable date.
    pub fn expiry_status(&self, today: NaiveDate) -> Option<ExpiryStatus> {
        self.expiry_date()
            .map(|date| ExpiryStatus::classify(date, today))
    }

    pub fn is_expired(&self, today: NaiveDate) -> bool {
        matches!(self.expiry_status(today), Some(ExpiryStatus::Expired { .. }))
    }

    pub fn is_expiring(&self, today: NaiveDate) -> bool {
        matches!(self.expiry_status(today), Some(ExpiryStatus::Expiring { .. }))
    }
}

// =============================================================================
// Filters & Counts
// =============================================================================

/// Alert list tabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlertFilter {
    #[default]
    All,
    Expiring,
    Expired,
    LowStock,
}

impl AlertFilter {
    pub const fn as_str(&self) -> &'static str {
        match self {
            AlertFilter::All => "all",
            AlertFilter::Expiring => "expiring",
            AlertFilter::Expired => "expired",
            AlertFilter::LowStock => "low_stock",
        }
    }

    pub fn accepts(&self, alert: &Alert, today: NaiveDate) -> bool {
        match self {
            AlertFilter::All => true,
            AlertFilter::Expiring => alert.is_expiring(today),
            AlertFilter::Expired => alert.is_expired(today),
            AlertFilter::LowStock => alert.is_low_stock(),
        }
    }
}

impl std::str::FromStr for AlertFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" | "" => Ok(AlertFilter::All),
            "expiring" => Ok(AlertFilter::Expiring),
            "expired" => Ok(AlertFilter::Expired),
            "low_stock" | "stock" => Ok(AlertFilter::LowStock),
            other => Err(format!("unknown alert filter: {}", other)),
        }
    }
}

/// Badge counts for each tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AlertCounts {
    pub all: usize,
    pub expiring: usize,
    pub expired: usize,
    pub low_stock: usize,
}

impl AlertCounts {
    pub fn tally(alerts: &[Alert], today: NaiveDate) -> Self {
        alerts.iter().fold(
            AlertCounts {
                all: alerts.len(),
                ..Default::default()
            },
            |mut counts, alert| {
                match alert.expiry_status(today) {
                    Some(ExpiryStatus::Expired { .. }) => counts.expired += 1,
                    Some(ExpiryStatus::Expiring { .. }) => counts.expiring += 1,
                    _ => {}
                }
                if alert.is_low_stock() {
                    counts.low_stock += 1;
                }
                counts
            },
        )
    }
}

/// Applies a tab and a free-text search on the message, newest first.
///
/// Alerts without a parseable `created_at` sort after dated ones.
pub fn filter_alerts<'a>(
    alerts: &'a [Alert],
    filter: AlertFilter,
    query: &str,
    today: NaiveDate,
) -> Vec<&'a Alert> {
    let query = query.trim().to_lowercase();
    let mut visible: Vec<&Alert> = alerts
        .iter()
        .filter(|a| filter.accepts(a, today))
        .filter(|a| query.is_empty() || a.message.to_lowercase().contains(&query))
        .collect();
    visible.sort_by_key(|a| Reverse(a.created()));
    visible
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    fn alert(value: serde_json::Value) -> Alert {
        serde_json::from_value(value).unwrap()
    }

    fn sample() -> Vec<Alert> {
        vec![
            alert(json!({"id": 1, "type": "expiry", "message": "Vacuna vence",
                "meta": {"vencimiento": "2024-06-10"}, "created_at": "2024-06-01 08:00:00"})),
            alert(json!({"id": 2, "type": "expiry", "message": "Pipeta por vencer",
                "meta": "{\"vencimiento\":\"2024-07-15\"}", "created_at": "2024-06-03 08:00:00"})),
            alert(json!({"id": 3, "type": "stock", "message": "Stock bajo alimento",
                "meta": null, "created_at": "2024-06-02 08:00:00"})),
            alert(json!({"id": 4, "type": "other", "message": "Revisar precios",
                "meta": {"stock_low": true}})),
        ]
    }

    #[test]
    fn test_expiry_boundaries() {
        let t = today();
        let on = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).unwrap();
        assert_eq!(ExpiryStatus::classify(on(2024, 6, 14), t), ExpiryStatus::Expired { days_ago: 1 });
        assert_eq!(ExpiryStatus::classify(t, t), ExpiryStatus::Expiring { days_left: 0 });
        assert_eq!(ExpiryStatus::classify(on(2024, 7, 15), t), ExpiryStatus::Expiring { days_left: 30 });
        assert_eq!(ExpiryStatus::classify(on(2024, 7, 16), t), ExpiryStatus::Valid { days_left: 31 });
    }

    #[test]
    fn test_counts() {
        let counts = AlertCounts::tally(&sample(), today());
        assert_eq!(
            counts,
            AlertCounts {
                all: 4,
                expiring: 1,
                expired: 1,
                low_stock: 2
            }
        );
    }

    #[test]
    fn test_filter_by_tab() {
        let alerts = sample();
        let ids = |v: Vec<&Alert>| v.into_iter().map(|a| a.id).collect::<Vec<_>>();

        assert_eq!(ids(filter_alerts(&alerts, AlertFilter::Expired, "", today())), vec![1]);
        assert_eq!(ids(filter_alerts(&alerts, AlertFilter::Expiring, "", today())), vec![2]);
        assert_eq!(ids(filter_alerts(&alerts, AlertFilter::LowStock, "", today())), vec![3, 4]);
    }

    #[test]
    fn test_all_sorted_newest_first_with_search() {
        let alerts = sample();
        let all: Vec<i64> = filter_alerts(&alerts, AlertFilter::All, "", today())
            .into_iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(all, vec![2, 3, 1, 4]);

        let found = filter_alerts(&alerts, AlertFilter::All, "PIPETA", today());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, 2);
    }

    #[test]
    fn test_filter_parse() {
        assert_eq!("low_stock".parse::<AlertFilter>().unwrap(), AlertFilter::LowStock);
        assert!("bogus".parse::<AlertFilter>().is_err());
    }
}
