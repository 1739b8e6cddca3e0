//! # Console Error Type
//!
//! Unified error type for console commands.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the Console                            │
//! │                                                                         │
//! │  > pay 12 abc                                                           │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Command Function                                                │  │
//! │  │  CommandResult<()>                                               │  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Client Error? ─── ClientError::Http { 400, .. } ──┐            │  │
//! │  │         │                                          │            │  │
//! │  │         ▼                                          ▼            │  │
//! │  │  Rule Error? ──── CoreError::InvalidAmount ──── ConsoleError ───►│  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Success ──────────────────────────────────────────────────────►│  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  [VALIDATION_ERROR] Invalid amount: abc                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Most failures were already shown to the operator as a notice by the
//! client controllers. The shell prints a `ConsoleError` only when its
//! `code` says nobody else did.

use serde::Serialize;
use vetdesk_client::ClientError;
use vetdesk_core::CoreError;

/// Error returned from console commands.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsoleError {
    /// Machine-readable error code
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Result alias for console commands.
pub type CommandResult<T> = Result<T, ConsoleError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// The command line could not be parsed.
    Usage,

    /// Input validation failed before any request.
    ValidationError,

    /// Login required.
    Unauthenticated,

    /// Logged in, but the screen is admin-only.
    Forbidden,

    /// Item or record not found.
    NotFound,

    /// Backend rejected the request.
    Backend,

    /// Backend unreachable or too slow.
    Connection,

    /// Cart operation failed.
    CartError,

    /// Local failure (config, session file, task).
    Internal,
}

impl ConsoleError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ConsoleError {
            code,
            message: message.into(),
        }
    }

    pub fn usage(message: impl Into<String>) -> Self {
        ConsoleError::new(ErrorCode::Usage, message)
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        ConsoleError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ConsoleError::new(ErrorCode::ValidationError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ConsoleError::new(ErrorCode::Internal, message)
    }

    /// True when a client controller already showed a notice for this.
    pub fn already_notified(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::ValidationError | ErrorCode::Backend | ErrorCode::Connection
        )
    }
}

impl From<CoreError> for ConsoleError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::OutOfStock { .. } | CoreError::LineNotFound(_) => {
                ConsoleError::new(ErrorCode::CartError, err.to_string())
            }
            CoreError::EmptyCart | CoreError::CustomerRequired | CoreError::AmountOutOfRange => {
                ConsoleError::new(ErrorCode::CartError, err.to_string())
            }
            other => ConsoleError::validation(other.to_string()),
        }
    }
}

impl From<ClientError> for ConsoleError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Core(core) => {
                let mut mapped = ConsoleError::from(core);
                // controllers surface rule rejections themselves
                mapped.code = ErrorCode::ValidationError;
                mapped
            }
            ClientError::Unauthenticated => {
                ConsoleError::new(ErrorCode::Unauthenticated, "Login required")
            }
            ClientError::Http { status: 404, message } => ConsoleError::new(
                ErrorCode::NotFound,
                message.unwrap_or_else(|| "Not found".to_string()),
            ),
            ClientError::Http { .. } | ClientError::Decode(_) => {
                ConsoleError::new(ErrorCode::Backend, err.to_string())
            }
            ref e if e.is_connection_error() => {
                ConsoleError::new(ErrorCode::Connection, err.to_string())
            }
            ClientError::InProgress => ConsoleError::validation(err.to_string()),
            other => {
                tracing::error!(error = %other, "Console command failed");
                ConsoleError::internal(other.to_string())
            }
        }
    }
}

impl std::fmt::Display for ConsoleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let code = serde_json::to_value(self.code)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_else(|| format!("{:?}", self.code));
        write!(f, "[{}] {}", code, self.message)
    }
}

impl std::error::Error for ConsoleError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_uses_wire_code() {
        let err = ConsoleError::usage("expected: pay <sale id> [amount]");
        assert_eq!(err.to_string(), "[USAGE] expected: pay <sale id> [amount]");
    }

    #[test]
    fn test_cart_errors() {
        let err = ConsoleError::from(CoreError::EmptyCart);
        assert_eq!(err.code, ErrorCode::CartError);
        assert!(!err.already_notified());
    }

    #[test]
    fn test_client_errors() {
        let err = ConsoleError::from(ClientError::Http {
            status: 404,
            message: Some("Cliente no encontrado".into()),
        });
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(err.message, "Cliente no encontrado");

        let err = ConsoleError::from(ClientError::Timeout(20));
        assert_eq!(err.code, ErrorCode::Connection);
        assert!(err.already_notified());

        let err = ConsoleError::from(ClientError::from(CoreError::CustomerRequired));
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = ConsoleError::from(ClientError::Unauthenticated);
        assert_eq!(err.code, ErrorCode::Unauthenticated);
    }
}
