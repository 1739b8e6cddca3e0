//! # Live Catalog Search
//!
//! Debounced search-as-you-type over products and services, plus the paged
//! catalog browser and the top-sold lists shown when nothing is typed.
//!
//! ## Keystroke Handling
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        LiveSearch::input                                │
//! │                                                                         │
//! │  "v"      ──► gen 1 ── sleep 300ms ──✗ aborted by gen 2                │
//! │  "va"     ──► gen 2 ── sleep 300ms ──✗ aborted by gen 3                │
//! │  "vac"    ──► gen 3 ── sleep 300ms ──► GET products ─┐                 │
//! │                                        GET services  ─┤                │
//! │                                                       ▼                 │
//! │                          gen still 3? ──► publish Ready(results)       │
//! │                          superseded?  ──► drop silently                │
//! │                                                                         │
//! │  "   "    ──► gen 4 ── abort in-flight ──► Idle (no request)           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Aborting the task drops the in-flight HTTP future, which cancels the
//! request. The generation check catches a response that completes in the
//! same instant the next keystroke arrives.
//!
//! Every generation that runs to completion, with results or with a failure,
//! is also published as "settled", so a caller can wait for the outcome of
//! its own keystroke without watching the notices.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::api::{CatalogApi, PageRequest};
use crate::config::SearchSettings;
use crate::error::{ClientError, ClientResult};
use crate::notify::Notifier;
use vetdesk_core::validation::validate_search_query;
use vetdesk_core::{CatalogItem, ItemKind, Product, Service};

const SEARCH_FAILED: &str = "Search failed";

// =============================================================================
// Scope & Results
// =============================================================================

/// Which half of the catalog a search covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchScope {
    Products,
    Services,
    #[default]
    Both,
}

impl SearchScope {
    pub fn includes_products(&self) -> bool {
        matches!(self, SearchScope::Products | SearchScope::Both)
    }

    pub fn includes_services(&self) -> bool {
        matches!(self, SearchScope::Services | SearchScope::Both)
    }
}

impl std::str::FromStr for SearchScope {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "products" | "product" | "p" => Ok(SearchScope::Products),
            "services" | "service" | "s" => Ok(SearchScope::Services),
            "both" | "all" | "" => Ok(SearchScope::Both),
            other => Err(ClientError::InvalidConfig(format!(
                "Unknown search scope: '{}'. Valid options: products, services, both",
                other
            ))),
        }
    }
}

/// Results of one search generation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchResults {
    pub generation: u64,
    pub query: String,
    pub products: Vec<Product>,
    pub services: Vec<Service>,
}

impl SearchResults {
    /// Products first, then services, each in backend order.
    pub fn items(&self) -> Vec<CatalogItem> {
        self.products
            .iter()
            .cloned()
            .map(CatalogItem::from)
            .chain(self.services.iter().cloned().map(CatalogItem::from))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty() && self.services.is_empty()
    }
}

/// What the search box currently shows.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SearchState {
    /// No query typed. Distinct from a query with zero results.
    #[default]
    Idle,
    Ready(SearchResults),
}

impl SearchState {
    pub fn results(&self) -> Option<&SearchResults> {
        match self {
            SearchState::Idle => None,
            SearchState::Ready(results) => Some(results),
        }
    }
}

async fn run_query(
    api: &dyn CatalogApi,
    query: &str,
    scope: SearchScope,
    limit: u32,
) -> ClientResult<(Vec<Product>, Vec<Service>)> {
    let page = PageRequest::first(limit);
    let products = async {
        if scope.includes_products() {
            api.search_products(Some(query), page).await
        } else {
            Ok(Vec::new())
        }
    };
    let services = async {
        if scope.includes_services() {
            api.list_services(Some(query), Some(page)).await
        } else {
            Ok(Vec::new())
        }
    };
    let (products, services) = tokio::join!(products, services);
    Ok((products?, services?))
}

// =============================================================================
// Live Search
// =============================================================================

pub struct LiveSearch {
    api: Arc<dyn CatalogApi>,
    notifier: Arc<dyn Notifier>,
    settings: SearchSettings,
    generation: Arc<AtomicU64>,
    state: Arc<watch::Sender<SearchState>>,
    /// Latest generation that finished, successfully or not.
    settled: Arc<watch::Sender<u64>>,
    inflight: Mutex<Option<JoinHandle<()>>>,
}

impl LiveSearch {
    pub fn new(api: Arc<dyn CatalogApi>, notifier: Arc<dyn Notifier>, settings: SearchSettings) -> Self {
        let (state, _) = watch::channel(SearchState::Idle);
        let (settled, _) = watch::channel(0);
        LiveSearch {
            api,
            notifier,
            settings,
            generation: Arc::new(AtomicU64::new(0)),
            state: Arc::new(state),
            settled: Arc::new(settled),
            inflight: Mutex::new(None),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> SearchState {
        self.state.borrow().clone()
    }

    /// Feeds the current text of the search box. Must run inside a tokio
    /// runtime.
    ///
    /// Returns the generation of the scheduled request, or `None` when the
    /// query went idle or was rejected without a request.
    pub fn input(&self, query: &str, scope: SearchScope) -> Option<u64> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.abort_inflight();

        let query = match validate_search_query(query) {
            Ok(Some(query)) => query,
            Ok(None) => {
                debug!(generation, "Empty query, search idle");
                self.state.send_replace(SearchState::Idle);
                self.settled.send_replace(generation);
                return None;
            }
            Err(e) => {
                self.notifier.error(&e.to_string());
                self.settled.send_replace(generation);
                return None;
            }
        };

        let api = Arc::clone(&self.api);
        let notifier = Arc::clone(&self.notifier);
        let current = Arc::clone(&self.generation);
        let state = Arc::clone(&self.state);
        let settled = Arc::clone(&self.settled);
        let debounce = self.settings.debounce();
        let limit = self.settings.result_limit;

        let handle = tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            debug!(generation, query = %query, ?scope, "Running live search");

            let outcome = run_query(api.as_ref(), &query, scope, limit).await;
            if current.load(Ordering::SeqCst) != generation {
                debug!(generation, "Dropping superseded search results");
                return;
            }

            match outcome {
                Ok((products, services)) => {
                    state.send_replace(SearchState::Ready(SearchResults {
                        generation,
                        query,
                        products,
                        services,
                    }));
                }
                Err(e) if e.is_cancelled() => debug!(generation, "Search cancelled"),
                Err(e) => {
                    warn!(generation, error = %e, "Live search failed");
                    notifier.error(&e.user_message(SEARCH_FAILED));
                }
            }
            settled.send_replace(generation);
        });

        if let Ok(mut inflight) = self.inflight.lock() {
            *inflight = Some(handle);
        }
        Some(generation)
    }

    /// Waits until `generation`, or a newer one, has finished.
    pub async fn settled(&self, generation: u64) {
        let mut rx = self.settled.subscribe();
        if rx.wait_for(|done| *done >= generation).await.is_err() {
            debug!(generation, "Search closed before settling");
        }
    }

    /// Clears the box: cancels any pending search and goes idle.
    pub fn clear(&self) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.abort_inflight();
        self.state.send_replace(SearchState::Idle);
        self.settled.send_replace(generation);
    }

    fn abort_inflight(&self) {
        if let Ok(mut inflight) = self.inflight.lock() {
            if let Some(handle) = inflight.take() {
                handle.abort();
            }
        }
    }
}

impl Drop for LiveSearch {
    fn drop(&mut self) {
        self.abort_inflight();
    }
}

// =============================================================================
// Top Items
// =============================================================================

/// Top-sold lists shown when the search box is empty.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TopItems {
    pub products: Vec<Product>,
    pub services: Vec<Service>,
}

impl TopItems {
    pub async fn load(api: &dyn CatalogApi, limit: u32) -> ClientResult<Self> {
        let (products, services) = tokio::join!(
            api.top_products(limit),
            api.list_services(None, Some(PageRequest::first(limit)))
        );
        Ok(TopItems {
            products: products?,
            services: services?,
        })
    }

    /// The grid for a display mode, products first.
    pub fn visible(&self, scope: SearchScope) -> Vec<CatalogItem> {
        let products = self
            .products
            .iter()
            .filter(|_| scope.includes_products())
            .cloned()
            .map(CatalogItem::from);
        let services = self
            .services
            .iter()
            .filter(|_| scope.includes_services())
            .cloned()
            .map(CatalogItem::from);
        products.chain(services).collect()
    }
}

// =============================================================================
// Catalog Browser
// =============================================================================

/// The paged "see more" list for one half of the catalog.
pub struct CatalogBrowser {
    api: Arc<dyn CatalogApi>,
    kind: ItemKind,
    page_size: u32,
    query: Option<String>,
    page: u32,
    items: Vec<CatalogItem>,
}

impl CatalogBrowser {
    pub fn new(api: Arc<dyn CatalogApi>, kind: ItemKind, page_size: u32) -> Self {
        CatalogBrowser {
            api,
            kind,
            page_size,
            query: None,
            page: 0,
            items: Vec::new(),
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    /// A full page suggests there may be more.
    pub fn has_next(&self) -> bool {
        self.items.len() as u32 >= self.page_size
    }

    /// New text filter, back to page 0.
    pub async fn search(&mut self, query: &str) -> ClientResult<&[CatalogItem]> {
        self.query = validate_search_query(query)?;
        self.load(0).await
    }

    pub async fn next_page(&mut self) -> ClientResult<&[CatalogItem]> {
        self.load(self.page + 1).await
    }

    pub async fn prev_page(&mut self) -> ClientResult<&[CatalogItem]> {
        self.load(self.page.saturating_sub(1)).await
    }

    /// Fetches `page`. On failure the current page stays as it was.
    pub async fn load(&mut self, page: u32) -> ClientResult<&[CatalogItem]> {
        let request = PageRequest::page(page, self.page_size);
        let query = self.query.as_deref();
        debug!(kind = self.kind.as_str(), page, ?query, "Browsing catalog");

        let items: Vec<CatalogItem> = match self.kind {
            ItemKind::Product => self
                .api
                .search_products(query, request)
                .await?
                .into_iter()
                .map(CatalogItem::from)
                .collect(),
            ItemKind::Service => self
                .api
                .list_services(query, Some(request))
                .await?
                .into_iter()
                .map(CatalogItem::from)
                .collect(),
        };

        self.page = page;
        self.items = items;
        Ok(&self.items)
    }
}
