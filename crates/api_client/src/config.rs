//! Client configuration

use crate::error::ApiError;

pub const ENV_BASE_URL: &str = "ETL_API_BASE_URL";
pub const ENV_USER_ID: &str = "ETL_USER_ID";
pub const ENV_TARGET_DB: &str = "ETL_TARGET_DB";
pub const ENV_TIMEOUT_SECS: &str = "ETL_API_TIMEOUT_SECS";

/// Configuration for the pipeline API client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// Base URL including the API prefix (default: http://localhost:8080/api/v1)
    pub base_url: String,
    /// User on whose behalf files are uploaded and analyzed
    pub user_id: String,
    /// Target database hint sent with uploads
    pub target_db: String,
    /// Per-request timeout in seconds (default: 30)
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api/v1".to_string(),
            user_id: "default_user".to_string(),
            target_db: "postgres".to_string(),
            timeout_secs: 30,
        }
    }
}

impl ApiConfig {
    /// Defaults overridden by `ETL_API_*` environment variables
    pub fn from_env() -> Result<Self, ApiError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ApiError> {
        let mut config = Self::default();

        if let Some(base_url) = lookup(ENV_BASE_URL) {
            config.base_url = base_url;
        }
        if let Some(user_id) = lookup(ENV_USER_ID) {
            config.user_id = user_id;
        }
        if let Some(target_db) = lookup(ENV_TARGET_DB) {
            config.target_db = target_db;
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            config.timeout_secs = raw.trim().parse().map_err(|_| {
                ApiError::Config(format!("{} must be a number of seconds, got {:?}", ENV_TIMEOUT_SECS, raw))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn validate(&self) -> Result<(), ApiError> {
        if !wizard_core::validators::is_valid_url(&self.base_url) {
            return Err(ApiError::Config(format!(
                "invalid base URL: {}",
                self.base_url
            )));
        }
        Ok(())
    }

    /// Absolute URL for an API path
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}
