//! # Client Error Types
//!
//! Error types for everything that touches the backend, the session file or
//! the config file.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Client Error Categories                            │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │    Session      │  │     Transport           │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  Unauthenticated│  │  ConnectionFailed       │ │
//! │  │  InvalidUrl     │  │  SessionStore   │  │  Timeout                │ │
//! │  │  ConfigLoad/Save│  │                 │  │  Cancelled              │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │    Backend      │  │     Rules       │  │      Internal           │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  Http{status}   │  │  Core(..)       │  │  ShuttingDown           │ │
//! │  │  Decode         │  │  InProgress     │  │  ChannelClosed          │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Only live search ever produces `Cancelled`, and callers drop it silently.

use thiserror::Error;
use vetdesk_core::{CoreError, ValidationError};

/// Result type alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Notice shown when the backend cannot be reached at all.
pub const CONNECTION_NOTICE: &str = "Could not connect to the server";

#[derive(Debug, Error)]
pub enum ClientError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    #[error("Invalid client configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Session Errors
    // =========================================================================
    /// No token in the session context. Raised before any request.
    #[error("Not logged in")]
    Unauthenticated,

    /// The session file could not be read or written.
    #[error("Session store error: {0}")]
    SessionStore(String),

    // =========================================================================
    // Transport Errors
    // =========================================================================
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// The request was superseded and aborted.
    #[error("Request cancelled")]
    Cancelled,

    // =========================================================================
    // Backend Errors
    // =========================================================================
    /// Non-2xx response. `message` is the backend's `message` field, if any.
    #[error("Backend returned {status}{}", .message.as_deref().map(|m| format!(": {}", m)).unwrap_or_default())]
    Http { status: u16, message: Option<String> },

    /// Response body did not have the expected shape.
    #[error("Unexpected response: {0}")]
    Decode(String),

    // =========================================================================
    // Rule Errors
    // =========================================================================
    /// Rejected locally by a domain rule. No request was sent.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A submission is already in flight.
    #[error("A submission is already in progress")]
    InProgress,

    // =========================================================================
    // Internal Errors
    // =========================================================================
    #[error("Client is shutting down")]
    ShuttingDown,

    #[error("Channel closed: {0}")]
    ChannelClosed(String),
}

// =============================================================================
// Conversions
// =============================================================================

impl From<ValidationError> for ClientError {
    fn from(err: ValidationError) -> Self {
        ClientError::Core(CoreError::Validation(err))
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::ConnectionFailed("request timed out".to_string())
        } else if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            ClientError::Http {
                status: status.as_u16(),
                message: None,
            }
        } else {
            ClientError::ConnectionFailed(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Decode(err.to_string())
    }
}

impl From<url::ParseError> for ClientError {
    fn from(err: url::ParseError) -> Self {
        ClientError::InvalidUrl(err.to_string())
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        ClientError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for ClientError {
    fn from(err: toml::de::Error) -> Self {
        ClientError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for ClientError {
    fn from(err: toml::ser::Error) -> Self {
        ClientError::ConfigSaveFailed(err.to_string())
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

impl ClientError {
    /// True for superseded live-search requests.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ClientError::Cancelled)
    }

    /// True when the error was raised locally before any request.
    pub fn is_validation(&self) -> bool {
        matches!(self, ClientError::Core(_) | ClientError::InProgress)
    }

    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            ClientError::InvalidConfig(_)
                | ClientError::InvalidUrl(_)
                | ClientError::ConfigLoadFailed(_)
                | ClientError::ConfigSaveFailed(_)
        )
    }

    /// True when the backend could not be reached or did not answer in time.
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            ClientError::ConnectionFailed(_) | ClientError::Timeout(_)
        )
    }

    /// Text for an operator notice.
    ///
    /// ## Rules
    /// - Backend errors show the backend's `message` when it sent one,
    ///   otherwise `fallback`
    /// - Local rule rejections show their own text
    /// - Transport failures show a generic connection notice
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ClientError::Http {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => message.clone(),
            ClientError::Http { .. } | ClientError::Decode(_) => fallback.to_string(),
            ClientError::ConnectionFailed(_) | ClientError::Timeout(_) => {
                CONNECTION_NOTICE.to_string()
            }
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_message_preferred() {
        let err = ClientError::Http {
            status: 400,
            message: Some("Stock insuficiente".into()),
        };
        assert_eq!(err.user_message("Error processing sale"), "Stock insuficiente");

        let err = ClientError::Http {
            status: 500,
            message: None,
        };
        assert_eq!(err.user_message("Error processing sale"), "Error processing sale");
    }

    #[test]
    fn test_local_rejections_use_their_own_text() {
        let err = ClientError::from(CoreError::EmptyCart);
        assert!(err.is_validation());
        assert_eq!(err.user_message("ignored"), "The cart is empty");
    }

    #[test]
    fn test_categories() {
        assert!(ClientError::Cancelled.is_cancelled());
        assert!(!ClientError::Timeout(20).is_cancelled());
        assert!(ClientError::Timeout(20).is_connection_error());
        assert_eq!(ClientError::Timeout(20).user_message("x"), CONNECTION_NOTICE);
        assert!(ClientError::InvalidUrl("ftp://x".into()).is_config_error());
        assert!(!ClientError::Unauthenticated.is_validation());
    }

    #[test]
    fn test_http_display() {
        let err = ClientError::Http {
            status: 404,
            message: Some("not found".into()),
        };
        assert_eq!(err.to_string(), "Backend returned 404: not found");
    }
}
