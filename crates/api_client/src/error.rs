//! Transport errors and their classification

use thiserror::Error;
use tracing::warn;
use wizard_core::AppError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Request never got an HTTP response (connect failure, timeout, ...)
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP error! status: {status}")]
    Http { status: u16, body: String },

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Invalid client configuration: {0}")]
    Config(String),
}

impl ApiError {
    pub(crate) fn transport(error: reqwest::Error) -> Self {
        if error.is_decode() {
            ApiError::Decode(error.to_string())
        } else if error.is_builder() {
            ApiError::Config(error.to_string())
        } else {
            ApiError::Network(error.to_string())
        }
    }
}

impl From<ApiError> for AppError {
    fn from(error: ApiError) -> Self {
        classify(&error)
    }
}

/// Map a transport error onto the user-facing taxonomy
pub fn classify(error: &ApiError) -> AppError {
    warn!(error = %error, "API call failed");

    match error {
        ApiError::Network(_) => AppError::network(),
        ApiError::Http { status, .. } => AppError::http(*status),
        ApiError::Decode(detail) => {
            AppError::unknown(format!("Unexpected response from server: {}", detail))
        }
        ApiError::Config(detail) => AppError::unknown(detail.clone()),
    }
}
