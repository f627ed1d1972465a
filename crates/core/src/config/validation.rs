//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::{AppConfig, HOST_PLACEHOLDER};
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `max_bytes` is 0 or exceeds 50MB
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `user_agent` is empty
    /// - `page_origin`, a seed asset or the fallback asset does not resolve
    /// - `fallback_pattern` is not a valid regex
    /// - `secondary_provider` lacks the `{host}` placeholder
    /// - `fade_ms` exceeds 10 seconds
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_bytes == 0 {
            return Err(ConfigError::Invalid { field: "max_bytes".into(), reason: "must be greater than 0".into() });
        }
        if self.max_bytes > 50 * 1024 * 1024 {
            return Err(ConfigError::Invalid { field: "max_bytes".into(), reason: "must not exceed 50MB".into() });
        }

        if self.timeout_ms < 100 {
            return Err(ConfigError::Invalid { field: "timeout_ms".into(), reason: "must be at least 100ms".into() });
        }
        if self.timeout_ms > 300_000 {
            return Err(ConfigError::Invalid {
                field: "timeout_ms".into(),
                reason: "must not exceed 5 minutes (300000ms)".into(),
            });
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        self.page_origin_url()?;
        self.seed_urls()?;
        let fallback = self.fallback_url()?;
        self.fallback_regex()?;

        if !self.secondary_provider.contains(HOST_PLACEHOLDER) {
            return Err(ConfigError::Invalid {
                field: "secondary_provider".into(),
                reason: format!("must contain {HOST_PLACEHOLDER}"),
            });
        }

        if self.fade_ms > 10_000 {
            return Err(ConfigError::Invalid { field: "fade_ms".into(), reason: "must not exceed 10000ms".into() });
        }

        let seeded = self
            .seed_urls()?
            .iter()
            .any(|url| url == &fallback);
        if !seeded {
            tracing::warn!(
                fallback = %fallback,
                "fallback_asset is not part of seed_assets; \
                 failed icon requests will get the synthesized error response"
            );
        }

        Ok(())
    }
}
