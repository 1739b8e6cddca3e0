//! # Error Types
//!
//! Domain-specific error types for vetdesk-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  vetdesk-core errors (this file)                                       │
//! │  ├── CoreError        - Business rule rejections (no request sent)     │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  vetdesk-client errors (separate crate)                                │
//! │  └── ClientError      - Backend, network, session failures             │
//! │                                                                         │
//! │  Console errors (in app)                                               │
//! │  └── ConsoleError     - What the operator sees (code + message)        │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ClientError → ConsoleError        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every variant here is raised BEFORE any network call.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule rejections.
#[derive(Debug, Error, PartialEq)]
pub enum CoreError {
    /// A product with no stock left cannot be added to the cart.
    ///
    /// ## User Workflow
    /// ```text
    /// Click "Pipeta antipulgas" (stock: 0)
    ///      │
    ///      ▼
    /// Cart::add_item ──► OutOfStock { nombre: "Pipeta antipulgas" }
    ///      │
    ///      ▼
    /// Notice: "No stock available" (cart unchanged)
    /// ```
    #[error("No stock available for {nombre}")]
    OutOfStock { nombre: String },

    /// The cart line key is not in the cart.
    #[error("Line {0} is not in the cart")]
    LineNotFound(String),

    /// Submitting a sale with no lines.
    #[error("The cart is empty")]
    EmptyCart,

    /// Submitting an on-credit sale with no customer attached.
    #[error("Select a customer to record the sale on credit")]
    CustomerRequired,

    /// A payment amount that is zero, negative, or not a number.
    #[error("Invalid amount: {input}")]
    InvalidAmount { input: String },

    /// A cart or sale total that does not fit in the money range.
    #[error("Amount out of range")]
    AmountOutOfRange,

    /// Report range where `from` is after `to`.
    #[error("Invalid date range: {from} is after {to}")]
    InvalidDateRange { from: String, to: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors for forms and operator input.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be a number.
    #[error("{field} must be a number")]
    NotANumber { field: String },

    /// Value must be a whole number, zero or greater.
    #[error("{field} must be a non-negative integer")]
    NotANonNegativeInteger { field: String },

    /// Value must be zero or greater.
    #[error("{field} must be zero or greater")]
    Negative { field: String },

    /// Value must be strictly positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g. a date that is not YYYY-MM-DD).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    pub(crate) fn required(field: &str) -> Self {
        ValidationError::Required {
            field: field.to_string(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
