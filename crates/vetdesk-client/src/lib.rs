//! # vetdesk-client: Backend Client & View Controllers for VetDesk
//!
//! Everything in the console that talks to the REST backend, keeps a
//! session, or runs on a timer. Business rules live in `vetdesk-core`; this
//! crate fetches, sends, and decides what the operator is told.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Client Architecture                              │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                  View controllers (per screen)                   │  │
//! │  │                                                                  │  │
//! │  │  LiveSearch   Checkout   AccountView   AlertBoard   Reports     │  │
//! │  │  TopItems     SaleDraft  (settle,      AlertPoller  Loader      │  │
//! │  │  Catalog                  payments)                              │  │
//! │  │  Browser      ProductAdmin / ServiceAdmin / CustomerAdmin        │  │
//! │  └────────────────────────────┬─────────────────────────────────────┘  │
//! │                               │ Arc<dyn ...Api>                         │
//! │         ┌─────────────────────┼─────────────────────┐                  │
//! │         ▼                     ▼                     ▼                   │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────┐    │
//! │  │  HttpBackend   │  │  SessionStore  │  │  Notifier / Confirmer  │    │
//! │  │                │  │                │  │                        │    │
//! │  │ reqwest + JSON │◄─│ bearer token   │  │ operator notices and   │    │
//! │  │ lenient lists  │  │ session.toml   │  │ yes/no questions       │    │
//! │  └────────────────┘  └────────────────┘  └────────────────────────┘    │
//! │                                                                         │
//! │  ClientConfig: defaults ◄── config.toml ◄── VETDESK_* env              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`api`] - Backend traits and the `reqwest` implementation
//! - [`session`] - Login, logout, persisted credential
//! - [`guard`] - Route table and access checks
//! - [`search`] - Debounced live search, top items, catalog paging
//! - [`checkout`] - Sale draft and submission
//! - [`account`] - Customer account settlement and payments
//! - [`alerts`] - Alert board, optimistic resolve, poller
//! - [`reports`] - Monthly series, totals, CSV export
//! - [`admin`] - Product, service and customer CRUD; sales history
//! - [`notify`] - Operator notices and confirmations
//! - [`config`] - Client configuration
//! - [`error`] - Client error types

pub mod account;
pub mod admin;
pub mod alerts;
pub mod api;
pub mod checkout;
pub mod config;
pub mod error;
pub mod guard;
pub mod notify;
pub mod reports;
pub mod search;
pub mod session;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use account::{AccountView, SettleOutcome};
pub use admin::{CustomerAdmin, ProductAdmin, SalesHistory, ServiceAdmin};
pub use alerts::{AlertBoard, AlertPoller, AlertPollerHandle};
pub use api::{Backend, HttpBackend, PageRequest, PaymentRequest};
pub use checkout::{Checkout, CheckoutOutcome, SaleDraft};
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use guard::{check_access, Access, Route};
pub use notify::{Confirmer, NoOpNotifier, Notice, NoticeLevel, Notifier};
pub use reports::{CsvExport, ReportsLoader};
pub use search::{CatalogBrowser, LiveSearch, SearchScope, SearchState, TopItems};
pub use session::{Session, SessionStore};
