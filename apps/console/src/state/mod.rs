//! # State Module
//!
//! Everything the console keeps between two commands.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────────┐              │
//! │  │ SessionStore │  │  CartState   │  │   ConfigState    │              │
//! │  │              │  │              │  │                  │              │
//! │  │  token       │  │  Arc<Mutex<  │  │  api url         │              │
//! │  │  is_admin    │  │   SaleDraft  │  │  currency        │              │
//! │  │  (persisted) │  │  >>          │  │  refresh period  │              │
//! │  └──────────────┘  └──────────────┘  └──────────────────┘              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  Views: one controller per screen                               │   │
//! │  │  LiveSearch · Checkout · AccountView · AlertBoard (+ poller)    │   │
//! │  │  ReportsLoader · Product/Service/CustomerAdmin · SalesHistory   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  THREAD SAFETY:                                                        │
//! │  • SessionStore: tokio RwLock inside, shared with HttpBackend          │
//! │  • CartState: Arc<Mutex<T>>, never locked across an await              │
//! │  • ConfigState: read-only after startup                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod cart;
mod config;

pub use cart::CartState;
pub use config::ConfigState;

use chrono::Local;
use std::sync::Arc;

use vetdesk_client::api::{AlertsApi, AuthApi, CatalogApi, CustomerApi, ReportsApi, SalesApi};
use vetdesk_client::{
    AccountView, AlertBoard, AlertPollerHandle, Backend, CatalogBrowser, Checkout, Confirmer,
    CustomerAdmin, LiveSearch, Notifier, ProductAdmin, ReportsLoader, Route, SalesHistory,
    SearchScope, ServiceAdmin, SessionStore, TopItems,
};
use vetdesk_core::CatalogItem;

/// Backend seams, one `Arc` per concern.
#[derive(Clone)]
pub struct Apis {
    pub auth: Arc<dyn AuthApi>,
    pub catalog: Arc<dyn CatalogApi>,
    pub customers: Arc<dyn CustomerApi>,
    pub sales: Arc<dyn SalesApi>,
    pub alerts: Arc<dyn AlertsApi>,
    pub reports: Arc<dyn ReportsApi>,
}

impl Apis {
    pub fn from_backend<B: Backend + 'static>(backend: Arc<B>) -> Self {
        Apis {
            auth: backend.clone(),
            catalog: backend.clone(),
            customers: backend.clone(),
            sales: backend.clone(),
            alerts: backend.clone(),
            reports: backend,
        }
    }
}

/// Point-of-sale screen.
pub struct SalesView {
    pub search: LiveSearch,
    pub scope: SearchScope,
    pub top_items: Option<TopItems>,
    pub browser: Option<CatalogBrowser>,
    /// Last numbered list shown, for `add <n>`.
    pub listing: Vec<CatalogItem>,
    pub checkout: Checkout,
}

/// Per-screen controllers.
pub struct Views {
    pub sales: SalesView,
    pub account: Option<AccountView>,
    pub alerts: AlertBoard,
    pub poller: Option<AlertPollerHandle>,
    pub reports: ReportsLoader,
    pub products: ProductAdmin,
    pub services: ServiceAdmin,
    pub customers: CustomerAdmin,
    pub history: SalesHistory,
}

pub struct AppState {
    pub config: ConfigState,
    pub session: Arc<SessionStore>,
    pub apis: Apis,
    pub notifier: Arc<dyn Notifier>,
    pub confirmer: Arc<dyn Confirmer>,
    pub cart: CartState,
    pub views: Views,
    pub route: Route,
    /// Where to go after a successful login.
    pub pending: Option<Route>,
}

impl AppState {
    pub fn new(
        config: ConfigState,
        session: Arc<SessionStore>,
        apis: Apis,
        notifier: Arc<dyn Notifier>,
        confirmer: Arc<dyn Confirmer>,
    ) -> Self {
        let client = &config.client;
        let views = Views {
            sales: SalesView {
                search: LiveSearch::new(apis.catalog.clone(), notifier.clone(), client.search.clone()),
                scope: SearchScope::Both,
                top_items: None,
                browser: None,
                listing: Vec::new(),
                checkout: Checkout::new(
                    apis.sales.clone(),
                    apis.catalog.clone(),
                    notifier.clone(),
                    confirmer.clone(),
                    client.search.top_items_limit,
                ),
            },
            account: None,
            alerts: AlertBoard::new(apis.alerts.clone(), notifier.clone(), confirmer.clone()),
            poller: None,
            reports: ReportsLoader::new(
                apis.reports.clone(),
                notifier.clone(),
                client.report_timeout(),
                Local::now().date_naive(),
            ),
            products: ProductAdmin::new(apis.catalog.clone(), notifier.clone(), confirmer.clone()),
            services: ServiceAdmin::new(apis.catalog.clone(), notifier.clone(), confirmer.clone()),
            customers: CustomerAdmin::new(apis.customers.clone(), notifier.clone(), confirmer.clone()),
            history: SalesHistory::new(apis.sales.clone(), notifier.clone()),
        };

        AppState {
            config,
            session,
            apis,
            notifier,
            confirmer,
            cart: CartState::new(),
            views,
            route: Route::Home,
            pending: None,
        }
    }

    pub fn money(&self, amount: vetdesk_core::Money) -> String {
        self.config.format_currency(amount)
    }
}
