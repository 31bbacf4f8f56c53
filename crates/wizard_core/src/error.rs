//! Error taxonomy shared by every async operation
//!
//! Transport layers convert their own errors into [`AppError`], which carries a
//! user-facing message ready to render.

use std::time::Duration;
use thiserror::Error;

/// Broad class of a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Transport-level failure, e.g. unreachable host
    Network,
    /// Non-2xx response
    Http { status: u16 },
    /// Local precondition failure; never reaches the network
    Validation,
    /// Polling budget exceeded
    Timeout,
    Unknown,
}

impl ErrorKind {
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::Network => "NETWORK_ERROR",
            ErrorKind::Http { .. } => "HTTP_ERROR",
            ErrorKind::Validation => "VALIDATION_ERROR",
            ErrorKind::Timeout => "TIMEOUT_ERROR",
            ErrorKind::Unknown => "UNKNOWN_ERROR",
        }
    }
}

/// Classified error with a message for direct rendering
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct AppError {
    pub kind: ErrorKind,
    pub message: String,
}

impl AppError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn network() -> Self {
        Self::new(ErrorKind::Network, "Could not connect to the server")
    }

    pub fn http(status: u16) -> Self {
        Self::new(ErrorKind::Http { status }, format!("Server error: {}", status))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Validation failure built from a validator's message list
    pub fn invalid(errors: &[String]) -> Self {
        Self::validation(errors.join(", "))
    }

    pub fn timeout(budget: Duration) -> Self {
        Self::new(
            ErrorKind::Timeout,
            format!("Analysis timed out after {}s", budget.as_secs()),
        )
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unknown, message)
    }

    pub fn status(&self) -> Option<u16> {
        match self.kind {
            ErrorKind::Http { status } => Some(status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_error_carries_status() {
        let error = AppError::http(503);
        assert_eq!(error.status(), Some(503));
        assert_eq!(error.to_string(), "Server error: 503");
        assert_eq!(error.kind.code(), "HTTP_ERROR");
    }

    #[test]
    fn test_invalid_joins_messages() {
        let error = AppError::invalid(&["a".to_string(), "b".to_string()]);
        assert_eq!(error.kind, ErrorKind::Validation);
        assert_eq!(error.message, "a, b");
        assert_eq!(error.status(), None);
    }

    #[test]
    fn test_timeout_message() {
        let error = AppError::timeout(Duration::from_secs(120));
        assert_eq!(error.kind, ErrorKind::Timeout);
        assert!(error.message.contains("120s"));
    }
}
