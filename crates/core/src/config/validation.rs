//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `connect_timeout_ms` is zero or exceeds `timeout_ms`
    /// - any byte ceiling, cache capacity or the batch cap is 0
    /// - `user_agent` or `bind_addr` is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_ms < 100 {
            return Err(invalid("timeout_ms", "must be at least 100ms"));
        }
        if self.timeout_ms > 300_000 {
            return Err(invalid("timeout_ms", "must not exceed 5 minutes (300000ms)"));
        }
        if self.connect_timeout_ms == 0 {
            return Err(invalid("connect_timeout_ms", "must be greater than 0"));
        }
        if self.connect_timeout_ms > self.timeout_ms {
            return Err(invalid("connect_timeout_ms", "must not exceed timeout_ms"));
        }

        for (field, value) in [
            ("max_page_bytes", self.max_page_bytes),
            ("max_image_bytes", self.max_image_bytes),
            ("preview_cache_entries", self.preview_cache_entries),
            ("image_cache_entries", self.image_cache_entries),
            ("image_cache_max_entry_bytes", self.image_cache_max_entry_bytes),
            ("max_batch_urls", self.max_batch_urls),
        ] {
            if value == 0 {
                return Err(invalid(field, "must be greater than 0"));
            }
        }

        if self.housekeeping_interval_secs == 0 {
            return Err(invalid("housekeeping_interval_secs", "must be greater than 0"));
        }

        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }
        if self.bind_addr.is_empty() {
            return Err(invalid("bind_addr", "must not be empty"));
        }

        if self.image_cache_max_entry_bytes > self.max_image_bytes {
            tracing::warn!(
                image_cache_max_entry_bytes = self.image_cache_max_entry_bytes,
                max_image_bytes = self.max_image_bytes,
                "image admission ceiling exceeds the read ceiling; every fetched image will be cached"
            );
        }

        Ok(())
    }
}
