//! # vetdesk-core: Pure Business Logic for VetDesk
//!
//! Domain rules for the veterinary-supply admin console, as pure functions
//! with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        VetDesk Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    apps/console (operator)                      │   │
//! │  │   venta ──► cart ──► checkout ──► cuenta ──► alerts ──► reports │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 vetdesk-client (network)                        │   │
//! │  │   session, live search, sale submission, alert poller, ...      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ vetdesk-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐  │   │
//! │  │   │  types  │ │  cart   │ │checkout │ │ account │ │ alerts  │  │   │
//! │  │   │  money  │ │  lines  │ │ payload │ │interest │ │ reports │  │   │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └─────────┘ └─────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO NETWORK • NO CLOCK • PURE FUNCTIONS               │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Backend entity snapshots (Product, Sale, Alert, ...)
//! - [`money`] - Integer-cent money with lenient wire parsing
//! - [`cart`] - Point-of-sale cart with stock clamping
//! - [`checkout`] - Customer/credit selection and the sale payload
//! - [`account`] - Account totals and settlement with interest
//! - [`alerts`] - Expiry/low-stock classification, counts, filters
//! - [`reports`] - Totals, month-over-month change, CSV
//! - [`forms`] - Admin form validation (products, services, customers)
//! - [`validation`] - Shared input validators
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use vetdesk_core::account::final_amount;
//! use vetdesk_core::money::Money;
//!
//! let total = Money::from_major(1000);
//! assert_eq!(final_amount(total, "10"), Money::from_major(1100));
//! assert_eq!(final_amount(total, "abc"), total);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod account;
pub mod alerts;
pub mod cart;
pub mod checkout;
pub mod error;
pub mod forms;
pub mod money;
pub mod reports;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, CartLine, CartTotals};
pub use checkout::{CustomerRef, CustomerSelection, SaleOutcome, SalePayload};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Quiet period after the last keystroke before a live search is sent.
pub const SEARCH_DEBOUNCE_MS: u64 = 300;

/// Results requested per scope in a live search.
pub const SEARCH_RESULT_LIMIT: u32 = 40;

/// Page size of the "see more" catalog browser.
pub const BROWSE_PAGE_SIZE: u32 = 24;

/// Items shown in each top-sold list on the point-of-sale screen.
pub const TOP_ITEMS_LIMIT: u32 = 9;

/// Longest search query accepted.
pub const MAX_SEARCH_QUERY_LEN: usize = 100;

/// An expiry within this many days (inclusive) counts as "expiring".
pub const EXPIRY_WARNING_DAYS: i64 = 30;

/// Alert list auto-refresh period.
pub const ALERT_REFRESH_SECS: u64 = 60;

/// Client-side timeout for report requests.
pub const REPORT_TIMEOUT_SECS: u64 = 20;

/// Highest quantity a single cart line can hold.
///
/// ## Business Reason
/// Services have no stock ceiling, so a stray `1e30` typed in the quantity
/// field would otherwise reach the sale total.
pub const MAX_ITEM_QUANTITY: i64 = 9_999;
