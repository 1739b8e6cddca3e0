//! # Alert Board & Poller
//!
//! Keeps the fetched alert list, resolves alerts optimistically and
//! re-fetches on a fixed period while the alerts view is open.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           Alerts View                                   │
//! │                                                                         │
//! │  open ──► board.refresh() ──► AlertPoller::spawn(board, 60s)           │
//! │                                      │                                  │
//! │                 ┌────────────────────┼───────────────────┐              │
//! │                 ▼                    ▼                   ▼              │
//! │            tick (60s)          tick (120s)        handle.shutdown()    │
//! │          GET /api/alerts     GET /api/alerts        or handle dropped  │
//! │                                                          │              │
//! │                                                          ▼              │
//! │                                                     loop exits          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Resolution
//! ```text
//!   confirm ──► snapshot list ──► remove locally ──► PUT /api/alerts/:id/resolve
//!                                                        │
//!                                              failure ──┴──► restore snapshot
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::api::AlertsApi;
use crate::error::{ClientError, ClientResult};
use crate::notify::{Confirmer, Notifier};
use vetdesk_core::alerts::{filter_alerts, AlertCounts, AlertFilter};
use vetdesk_core::Alert;

const LOAD_FAILED: &str = "Could not load the alerts";
const RESOLVE_FAILED: &str = "Could not resolve the alert";
const RESOLVE_PROMPT: &str = "Mark alert as resolved?";

// =============================================================================
// Board
// =============================================================================

#[derive(Debug, Default)]
struct BoardState {
    alerts: Vec<Alert>,
    last_updated: Option<DateTime<Utc>>,
    filter: AlertFilter,
    query: String,
}

/// The alert list shared by the operator and the poller.
#[derive(Clone)]
pub struct AlertBoard {
    api: Arc<dyn AlertsApi>,
    notifier: Arc<dyn Notifier>,
    confirmer: Arc<dyn Confirmer>,
    state: Arc<Mutex<BoardState>>,
}

impl AlertBoard {
    pub fn new(
        api: Arc<dyn AlertsApi>,
        notifier: Arc<dyn Notifier>,
        confirmer: Arc<dyn Confirmer>,
    ) -> Self {
        AlertBoard {
            api,
            notifier,
            confirmer,
            state: Arc::new(Mutex::new(BoardState::default())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BoardState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Replaces the list with a fresh fetch. On failure the list stays.
    pub async fn refresh(&self) -> ClientResult<()> {
        match self.api.list_alerts().await {
            Ok(alerts) => {
                debug!(count = alerts.len(), "Alerts refreshed");
                let mut state = self.lock();
                state.alerts = alerts;
                state.last_updated = Some(Utc::now());
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Failed to load alerts");
                self.notifier.error(LOAD_FAILED);
                Err(e)
            }
        }
    }

    /// Resolves one alert after confirmation.
    ///
    /// Returns `Ok(false)` when the operator declines.
    pub async fn resolve(&self, id: i64) -> ClientResult<bool> {
        if !self.confirmer.confirm(RESOLVE_PROMPT).await {
            return Ok(false);
        }

        let previous = {
            let mut state = self.lock();
            let previous = state.alerts.clone();
            state.alerts.retain(|a| a.id != id);
            previous
        };

        match self.api.resolve_alert(id).await {
            Ok(()) => {
                info!(alert_id = id, "Alert resolved");
                self.notifier.success("Alert resolved");
                Ok(true)
            }
            Err(e) => {
                warn!(alert_id = id, error = %e, "Failed to resolve alert, restoring list");
                self.lock().alerts = previous;
                self.notifier.error(RESOLVE_FAILED);
                Err(e)
            }
        }
    }

    pub fn alerts(&self) -> Vec<Alert> {
        self.lock().alerts.clone()
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.lock().last_updated
    }

    pub fn set_filter(&self, filter: AlertFilter) {
        self.lock().filter = filter;
    }

    pub fn filter(&self) -> AlertFilter {
        self.lock().filter
    }

    pub fn set_query(&self, query: &str) {
        self.lock().query = query.to_string();
    }

    pub fn counts(&self, today: NaiveDate) -> AlertCounts {
        AlertCounts::tally(&self.lock().alerts, today)
    }

    /// Alerts under the current filter and query, newest first.
    pub fn visible(&self, today: NaiveDate) -> Vec<Alert> {
        let state = self.lock();
        filter_alerts(&state.alerts, state.filter, &state.query, today)
            .into_iter()
            .cloned()
            .collect()
    }
}

// =============================================================================
// Poller
// =============================================================================

/// Handle for a running [`AlertPoller`]. Dropping it stops the loop.
pub struct AlertPollerHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl AlertPollerHandle {
    /// Stops the loop and waits for it to exit.
    pub async fn shutdown(self) -> ClientResult<()> {
        self.shutdown_tx
            .send(())
            .await
            .map_err(|_| ClientError::ChannelClosed("alert poller already stopped".into()))?;
        self.task
            .await
            .map_err(|e| ClientError::ChannelClosed(e.to_string()))
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Re-fetches the board on a fixed period.
pub struct AlertPoller {
    board: AlertBoard,
    period: Duration,
    shutdown_rx: mpsc::Receiver<()>,
}

impl AlertPoller {
    /// Spawns the loop. The first refresh happens one period from now; the
    /// caller does the initial fetch itself.
    pub fn spawn(board: AlertBoard, period: Duration) -> AlertPollerHandle {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let poller = AlertPoller {
            board,
            period,
            shutdown_rx,
        };
        let task = tokio::spawn(poller.run());
        AlertPollerHandle { shutdown_tx, task }
    }

    async fn run(mut self) {
        info!(period_secs = self.period.as_secs(), "Alert poller starting");

        let mut interval = tokio::time::interval_at(Instant::now() + self.period, self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    // failures are already surfaced as notices
                    let _ = self.board.refresh().await;
                }

                _ = self.shutdown_rx.recv() => {
                    info!("Alert poller shutting down");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::{NoticeLevel, RecordingNotifier, ScriptedConfirmer};
    use crate::testing::FakeBackend;
    use vetdesk_core::{AlertKind, AlertMeta};

    fn alert(id: i64, kind: AlertKind, vencimiento: Option<&str>, created_at: &str) -> Alert {
        Alert {
            id,
            kind,
            message: format!("alerta {}", id),
            meta: AlertMeta::Empty,
            vencimiento: vencimiento.map(str::to_string),
            created_at: Some(created_at.to_string()),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    fn board(answers: Vec<bool>) -> (Arc<FakeBackend>, Arc<RecordingNotifier>, AlertBoard) {
        let api = Arc::new(FakeBackend::new());
        *api.alerts.lock().unwrap() = vec![
            alert(1, AlertKind::Expiry, Some("2024-06-10"), "2024-06-01 08:00:00"),
            alert(2, AlertKind::Expiry, Some("2024-07-01"), "2024-06-03 08:00:00"),
            alert(3, AlertKind::Stock, None, "2024-06-02 08:00:00"),
        ];
        let notifier = Arc::new(RecordingNotifier::new());
        let confirmer = Arc::new(ScriptedConfirmer::new(answers));
        let board = AlertBoard::new(api.clone(), notifier.clone(), confirmer);
        (api, notifier, board)
    }

    #[tokio::test]
    async fn test_refresh_counts_and_filters() {
        let (_api, _notifier, board) = board(vec![]);
        board.refresh().await.unwrap();

        assert!(board.last_updated().is_some());
        let counts = board.counts(today());
        assert_eq!(counts.all, 3);
        assert_eq!(counts.expired, 1);
        assert_eq!(counts.expiring, 1);
        assert_eq!(counts.low_stock, 1);

        let ids: Vec<i64> = board.visible(today()).iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);

        board.set_filter(AlertFilter::Expired);
        assert_eq!(board.visible(today())[0].id, 1);

        board.set_filter(AlertFilter::All);
        board.set_query("ALERTA 3");
        assert_eq!(board.visible(today()).len(), 1);
    }

    #[tokio::test]
    async fn test_resolve_removes_alert() {
        let (api, notifier, board) = board(vec![true]);
        board.refresh().await.unwrap();

        assert!(board.resolve(2).await.unwrap());
        assert_eq!(board.alerts().len(), 2);
        assert!(api.calls().contains(&"resolve_alert:2".to_string()));
        assert_eq!(notifier.messages(NoticeLevel::Success), vec!["Alert resolved"]);
    }

    #[tokio::test]
    async fn test_resolve_failure_restores_exact_list() {
        let (api, notifier, board) = board(vec![true]);
        board.refresh().await.unwrap();
        let before = board.alerts();

        api.fail_on("resolve_alert", 500, None);
        assert!(board.resolve(2).await.is_err());

        assert_eq!(board.alerts(), before);
        assert_eq!(notifier.messages(NoticeLevel::Error), vec![RESOLVE_FAILED]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resolve_hides_alert_while_request_in_flight() {
        let (api, _notifier, board) = board(vec![true]);
        board.refresh().await.unwrap();
        api.delay_on("resolve_alert", Duration::from_secs(1));

        let pending = {
            let board = board.clone();
            tokio::spawn(async move { board.resolve(1).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(board.alerts().iter().all(|a| a.id != 1));

        assert!(pending.await.unwrap().unwrap());
    }

    #[tokio::test]
    async fn test_declined_resolve_sends_nothing() {
        let (api, _notifier, board) = board(vec![false]);
        board.refresh().await.unwrap();

        assert!(!board.resolve(1).await.unwrap());
        assert_eq!(api.count("resolve_alert"), 0);
        assert_eq!(board.alerts().len(), 3);
    }

    #[tokio::test]
    async fn test_refresh_failure_keeps_list() {
        let (api, notifier, board) = board(vec![]);
        board.refresh().await.unwrap();
        api.fail_on("list_alerts", 503, None);

        assert!(board.refresh().await.is_err());
        assert_eq!(board.alerts().len(), 3);
        assert_eq!(notifier.messages(NoticeLevel::Error), vec![LOAD_FAILED]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poller_refreshes_each_period_until_shutdown() {
        let (api, _notifier, board) = board(vec![]);
        let handle = AlertPoller::spawn(board, Duration::from_secs(60));

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(api.count("list_alerts"), 0);

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(api.count("list_alerts"), 1);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(api.count("list_alerts"), 2);

        handle.shutdown().await.unwrap();
        tokio::time::sleep(Duration::from_secs(300)).await;
        assert_eq!(api.count("list_alerts"), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_handle_stops_poller() {
        let (api, _notifier, board) = board(vec![]);
        drop(AlertPoller::spawn(board, Duration::from_secs(60)));

        tokio::time::sleep(Duration::from_secs(200)).await;
        assert_eq!(api.count("list_alerts"), 0);
    }
}
