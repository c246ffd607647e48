//! Typed error handling for collection views
//!
//! Every engine operation returns a [`ViewError`] rather than panicking or
//! swallowing failures. The caller decides how to present it and whether to
//! offer a retry.
//!
//! # Error Categories
//!
//! - `Network`: the request never completed
//! - `Server`: non-2xx status, `success: false` body, or an unreadable body
//! - `Validation`: rejected on the client before any request was sent
//! - `Cancelled`: superseded by a newer query or aborted by the owner
//! - `Config`: invalid configuration
//!
//! # Example
//!
//! ```rust,ignore
//! match view.refresh().await {
//!     Ok(()) => {}
//!     Err(ViewError::Cancelled) => {} // a newer refresh owns the view
//!     Err(e) if e.is_retryable() => show_retry_banner(&e),
//!     Err(e) => show_alert(&e),
//! }
//! ```

use thiserror::Error;

/// The main error type for collection operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ViewError {
    /// The request never completed (connection refused, timeout, DNS...)
    #[error("Network error: {message}")]
    Network { message: String },

    /// The backend answered with a failure
    #[error("{}", server_message(*status, message))]
    Server { status: Option<u16>, message: String },

    /// A client-side check failed before sending anything
    #[error("Validation error on '{field}': {message}")]
    Validation { field: String, message: String },

    /// The operation was superseded or aborted
    #[error("Operation cancelled")]
    Cancelled,

    /// Configuration is invalid
    #[error("Configuration error: {message}")]
    Config { message: String },
}

fn server_message(status: Option<u16>, message: &str) -> String {
    match status {
        Some(code) => format!("Server error ({}): {}", code, message),
        None => format!("Server error: {}", message),
    }
}

impl ViewError {
    /// Build a network error
    pub fn network(message: impl Into<String>) -> Self {
        ViewError::Network {
            message: message.into(),
        }
    }

    /// Build a server error
    pub fn server(status: Option<u16>, message: impl Into<String>) -> Self {
        ViewError::Server {
            status,
            message: message.into(),
        }
    }

    /// Build a validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        ViewError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Get the error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ViewError::Network { .. } => "NETWORK_ERROR",
            ViewError::Server { .. } => "SERVER_ERROR",
            ViewError::Validation { .. } => "VALIDATION_ERROR",
            ViewError::Cancelled => "CANCELLED",
            ViewError::Config { .. } => "CONFIG_ERROR",
        }
    }

    /// HTTP status carried by a server error
    pub fn status(&self) -> Option<u16> {
        match self {
            ViewError::Server { status, .. } => *status,
            _ => None,
        }
    }

    /// Whether offering a manual retry makes sense
    ///
    /// Network failures and 5xx responses may succeed on retry. Client
    /// errors, cancellations and config problems will not.
    pub fn is_retryable(&self) -> bool {
        match self {
            ViewError::Network { .. } => true,
            ViewError::Server { status, .. } => status.is_none_or(|s| s >= 500),
            _ => false,
        }
    }

    /// Whether the error only means a newer operation took over
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ViewError::Cancelled)
    }
}

impl From<reqwest::Error> for ViewError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return ViewError::server(
                err.status().map(|s| s.as_u16()),
                format!("malformed response body: {}", err),
            );
        }
        match err.status() {
            Some(status) => ViewError::server(Some(status.as_u16()), err.to_string()),
            None => ViewError::network(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for ViewError {
    fn from(err: serde_json::Error) -> Self {
        ViewError::server(None, format!("malformed response body: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(ViewError::network("x").error_code(), "NETWORK_ERROR");
        assert_eq!(ViewError::server(Some(500), "x").error_code(), "SERVER_ERROR");
        assert_eq!(ViewError::validation("id", "x").error_code(), "VALIDATION_ERROR");
        assert_eq!(ViewError::Cancelled.error_code(), "CANCELLED");
    }

    #[test]
    fn test_server_display_includes_status() {
        let err = ViewError::server(Some(404), "Material not found");
        assert_eq!(err.to_string(), "Server error (404): Material not found");

        let err = ViewError::server(None, "Something went wrong");
        assert_eq!(err.to_string(), "Server error: Something went wrong");
    }

    #[test]
    fn test_retryable() {
        assert!(ViewError::network("refused").is_retryable());
        assert!(ViewError::server(Some(503), "busy").is_retryable());
        assert!(ViewError::server(None, "success false").is_retryable());
        assert!(!ViewError::server(Some(404), "gone").is_retryable());
        assert!(!ViewError::Cancelled.is_retryable());
        assert!(!ViewError::validation("id", "empty").is_retryable());
    }

    #[test]
    fn test_status_accessor() {
        assert_eq!(ViewError::server(Some(422), "bad").status(), Some(422));
        assert_eq!(ViewError::network("x").status(), None);
    }
}
