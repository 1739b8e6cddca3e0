//! # Reports Loader
//!
//! Fetches the monthly sales and profit series for a date range and hands
//! them to the pure reducers in `vetdesk_core::reports`.
//!
//! ## Load
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  load("2024-01-01", "2024-06-30")                                      │
//! │        │                                                                │
//! │        ├── bad date / from > to ──► notice, no request                 │
//! │        ▼                                                                │
//! │  timeout(20s, join!(sales-by-month, profit-by-month))                  │
//! │        ├── elapsed ──► Timeout, previous rows kept                     │
//! │        ├── error ────► notice, previous rows kept                      │
//! │        ▼                                                                │
//! │  rows replaced ──► totals / month-over-month / CSV                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::api::ReportsApi;
use crate::error::{ClientError, ClientResult};
use crate::notify::Notifier;
use vetdesk_core::reports::{
    default_range, profit_with_change, sales_with_change, to_csv, ReportKind, ReportTotals,
    WithChange,
};
use vetdesk_core::validation::validate_date_range;
use vetdesk_core::{ProfitMonth, SalesMonth};

const LOAD_FAILED: &str = "Could not load the reports";
const FETCH_FALLBACK: &str = "Error loading reports";

/// A CSV file ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvExport {
    pub file_name: String,
    pub content: String,
}

pub struct ReportsLoader {
    api: Arc<dyn ReportsApi>,
    notifier: Arc<dyn Notifier>,
    timeout: Duration,
    range: (NaiveDate, NaiveDate),
    sales: Vec<SalesMonth>,
    profit: Vec<ProfitMonth>,
    last_error: Option<String>,
}

impl ReportsLoader {
    /// Starts on the default range ending `today`, with no rows.
    pub fn new(
        api: Arc<dyn ReportsApi>,
        notifier: Arc<dyn Notifier>,
        timeout: Duration,
        today: NaiveDate,
    ) -> Self {
        ReportsLoader {
            api,
            notifier,
            timeout,
            range: default_range(today),
            sales: Vec::new(),
            profit: Vec::new(),
            last_error: None,
        }
    }

    pub fn range(&self) -> (NaiveDate, NaiveDate) {
        self.range
    }

    /// Back to the default range. Rows are untouched until the next load.
    pub fn reset_range(&mut self, today: NaiveDate) {
        self.range = default_range(today);
    }

    pub fn sales(&self) -> &[SalesMonth] {
        &self.sales
    }

    pub fn profit(&self) -> &[ProfitMonth] {
        &self.profit
    }

    /// Message of the last failed load, cleared by the next attempt.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn totals(&self) -> ReportTotals {
        ReportTotals::compute(&self.sales, &self.profit)
    }

    pub fn sales_with_change(&self) -> Vec<WithChange<'_, SalesMonth>> {
        sales_with_change(&self.sales)
    }

    pub fn profit_with_change(&self) -> Vec<WithChange<'_, ProfitMonth>> {
        profit_with_change(&self.profit)
    }

    /// Validates the typed range, then loads it.
    pub async fn load(&mut self, from: &str, to: &str) -> ClientResult<()> {
        let (from, to) = match validate_date_range(from, to) {
            Ok(range) => range,
            Err(e) => {
                self.notifier.error(&e.to_string());
                return Err(e.into());
            }
        };
        self.range = (from, to);
        self.reload().await
    }

    /// Loads the current range.
    pub async fn reload(&mut self) -> ClientResult<()> {
        let (from, to) = self.range;
        self.last_error = None;
        debug!(%from, %to, "Loading reports");

        let fetched = tokio::time::timeout(self.timeout, async {
            let (sales, profit) = tokio::join!(
                self.api.sales_by_month(from, to),
                self.api.profit_by_month(from, to)
            );
            Ok::<_, ClientError>((sales?, profit?))
        })
        .await
        .unwrap_or_else(|_| Err(ClientError::Timeout(self.timeout.as_secs())));

        let (sales, profit) = match fetched {
            Ok(rows) => rows,
            Err(e) => {
                warn!(%from, %to, error = %e, "Failed to load reports");
                self.last_error = Some(e.user_message(FETCH_FALLBACK));
                self.notifier.error(LOAD_FAILED);
                return Err(e);
            }
        };

        self.sales = sales;
        self.profit = profit;
        if self.sales.is_empty() && self.profit.is_empty() {
            self.notifier.error("No data found for the selected range");
        } else {
            info!(months = self.sales.len(), "Reports loaded");
            self.notifier.success("Reports loaded");
        }
        Ok(())
    }

    /// CSV for one series, or `None` with a notice when it is empty.
    pub fn export_csv(&self, kind: ReportKind) -> Option<CsvExport> {
        let content = match kind {
            ReportKind::Sales => to_csv(&self.sales),
            ReportKind::Profit => to_csv(&self.profit),
        };
        let Some(content) = content else {
            self.notifier.info("No data to export");
            return None;
        };
        let (from, to) = self.range;
        Some(CsvExport {
            file_name: kind.file_name(from, to),
            content,
        })
    }

    /// Writes the CSV into `dir` and returns the file path.
    pub fn write_csv(&self, kind: ReportKind, dir: &Path) -> ClientResult<Option<PathBuf>> {
        let Some(export) = self.export_csv(kind) else {
            return Ok(None);
        };
        let path = dir.join(&export.file_name);
        std::fs::write(&path, export.content)?;
        info!(path = %path.display(), "Report exported");
        Ok(Some(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::{NoticeLevel, RecordingNotifier};
    use crate::testing::FakeBackend;
    use vetdesk_core::{CoreError, Money};

    fn sales_month(month: &str, total: i64) -> SalesMonth {
        SalesMonth {
            month: month.to_string(),
            orders: 2,
            total_sales: Money::from_major(total),
            total_items: 5,
        }
    }

    fn profit_month(month: &str, profit: i64) -> ProfitMonth {
        ProfitMonth {
            month: month.to_string(),
            revenue: Money::from_major(profit * 2),
            cogs: Money::from_major(profit),
            profit: Money::from_major(profit),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 20).unwrap()
    }

    fn loader() -> (Arc<FakeBackend>, Arc<RecordingNotifier>, ReportsLoader) {
        let api = Arc::new(FakeBackend::new());
        *api.sales_months.lock().unwrap() = vec![sales_month("2024-01", 100), sales_month("2024-02", 150)];
        *api.profit_months.lock().unwrap() = vec![profit_month("2024-01", 40)];
        let notifier = Arc::new(RecordingNotifier::new());
        let loader = ReportsLoader::new(api.clone(), notifier.clone(), Duration::from_secs(20), today());
        (api, notifier, loader)
    }

    #[tokio::test]
    async fn test_load_fetches_both_series() {
        let (api, notifier, mut loader) = loader();
        loader.load("2024-01-01", "2024-06-20").await.unwrap();

        assert!(api.calls().contains(&"sales_by_month:2024-01-01..2024-06-20".to_string()));
        assert_eq!(api.count("profit_by_month"), 1);
        assert_eq!(loader.totals().total_sales, Money::from_major(250));
        assert_eq!(loader.totals().total_profit, Money::from_major(40));
        assert_eq!(loader.sales_with_change()[0].change_pct, Some(50.0));
        assert_eq!(notifier.messages(NoticeLevel::Success), vec!["Reports loaded"]);
    }

    #[tokio::test]
    async fn test_inverted_range_sends_nothing() {
        let (api, notifier, mut loader) = loader();
        let err = loader.load("2024-06-01", "2024-01-01").await.unwrap_err();

        assert!(matches!(err, ClientError::Core(CoreError::InvalidDateRange { .. })));
        assert!(api.calls().is_empty());
        assert_eq!(notifier.messages(NoticeLevel::Error).len(), 1);
        assert_eq!(loader.range(), default_range(today()));
    }

    #[tokio::test]
    async fn test_empty_range_notice() {
        let (api, notifier, mut loader) = loader();
        api.sales_months.lock().unwrap().clear();
        api.profit_months.lock().unwrap().clear();

        loader.reload().await.unwrap();
        assert_eq!(
            notifier.messages(NoticeLevel::Error),
            vec!["No data found for the selected range"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_backend_times_out_and_keeps_rows() {
        let (api, notifier, mut loader) = loader();
        loader.reload().await.unwrap();

        api.delay_on("profit_by_month", Duration::from_secs(30));
        let err = loader.reload().await.unwrap_err();

        assert!(matches!(err, ClientError::Timeout(20)));
        assert_eq!(loader.sales().len(), 2);
        assert_eq!(loader.last_error(), Some(crate::error::CONNECTION_NOTICE));
        assert_eq!(notifier.messages(NoticeLevel::Error), vec![LOAD_FAILED]);
    }

    #[tokio::test]
    async fn test_backend_message_kept_as_last_error() {
        let (api, _notifier, mut loader) = loader();
        api.fail_on("sales_by_month", 400, Some("Rango inválido"));

        loader.reload().await.unwrap_err();
        assert_eq!(loader.last_error(), Some("Rango inválido"));
    }

    #[tokio::test]
    async fn test_export_csv() {
        let (_api, notifier, mut loader) = loader();
        assert!(loader.export_csv(ReportKind::Sales).is_none());
        assert_eq!(notifier.messages(NoticeLevel::Info), vec!["No data to export"]);

        loader.load("2024-01-01", "2024-06-20").await.unwrap();
        let export = loader.export_csv(ReportKind::Profit).unwrap();
        assert_eq!(export.file_name, "report_profit_2024-01-01_to_2024-06-20.csv");
        assert_eq!(
            export.content,
            "month,revenue,cogs,profit\n\"2024-01\",\"80\",\"40\",\"40\""
        );
    }

    #[tokio::test]
    async fn test_write_csv_to_dir() {
        let (_api, _notifier, mut loader) = loader();
        loader.load("2024-01-01", "2024-06-20").await.unwrap();

        let dir = std::env::temp_dir().join(format!("vetdesk-reports-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = loader.write_csv(ReportKind::Sales, &dir).unwrap().unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("month,orders,total_sales,total_items\n"));
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
