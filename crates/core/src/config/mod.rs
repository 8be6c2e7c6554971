//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (UNFURL_*)
//! 2. TOML config file (if UNFURL_CONFIG_FILE set)
//! 3. Built-in defaults

use std::num::NonZeroUsize;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (UNFURL_*)
/// 2. TOML config file (if UNFURL_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Address the HTTP server binds to.
    ///
    /// Set via UNFURL_BIND_ADDR environment variable.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// User-Agent string for outbound requests.
    ///
    /// Set via UNFURL_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Whole-request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Connection establishment timeout in milliseconds.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// How long idle pooled connections are kept for reuse.
    #[serde(default = "default_pool_idle_timeout_secs")]
    pub pool_idle_timeout_secs: u64,

    /// Idle connections kept per upstream host.
    #[serde(default = "default_pool_max_idle_per_host")]
    pub pool_max_idle_per_host: usize,

    /// TCP keep-alive interval in seconds.
    #[serde(default = "default_tcp_keepalive_secs")]
    pub tcp_keepalive_secs: u64,

    /// Read ceiling for pages; also the metadata scan budget.
    #[serde(default = "default_max_page_bytes")]
    pub max_page_bytes: usize,

    /// Read ceiling for proxied images.
    #[serde(default = "default_max_image_bytes")]
    pub max_image_bytes: usize,

    /// Capacity of the preview metadata cache.
    #[serde(default = "default_preview_cache_entries")]
    pub preview_cache_entries: usize,

    /// Optional TTL for preview entries. Unset means capacity-only eviction.
    #[serde(default)]
    pub preview_cache_ttl_secs: Option<u64>,

    /// Capacity of the image cache.
    #[serde(default = "default_image_cache_entries")]
    pub image_cache_entries: usize,

    /// Absolute TTL for cached images.
    #[serde(default = "default_image_cache_ttl_secs")]
    pub image_cache_ttl_secs: u64,

    /// Images must be strictly smaller than this to be cached.
    #[serde(default = "default_image_cache_max_entry_bytes")]
    pub image_cache_max_entry_bytes: usize,

    /// Maximum URLs accepted by one batch request.
    #[serde(default = "default_max_batch_urls")]
    pub max_batch_urls: usize,

    /// `Cache-Control` max-age advertised on preview responses.
    #[serde(default = "default_preview_max_age_secs")]
    pub preview_max_age_secs: u64,

    /// Period of the housekeeping sampler.
    #[serde(default = "default_housekeeping_interval_secs")]
    pub housekeeping_interval_secs: u64,
}

fn default_bind_addr() -> String {
    "0.0.0.0:5000".into()
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36"
        .into()
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_connect_timeout_ms() -> u64 {
    5_000
}

fn default_pool_idle_timeout_secs() -> u64 {
    90
}

fn default_pool_max_idle_per_host() -> usize {
    10
}

fn default_tcp_keepalive_secs() -> u64 {
    30
}

fn default_max_page_bytes() -> usize {
    100_000
}

fn default_max_image_bytes() -> usize {
    2 * 1024 * 1024
}

fn default_preview_cache_entries() -> usize {
    5_000
}

fn default_image_cache_entries() -> usize {
    50
}

fn default_image_cache_ttl_secs() -> u64 {
    300
}

fn default_image_cache_max_entry_bytes() -> usize {
    500 * 1024
}

fn default_max_batch_urls() -> usize {
    20
}

fn default_preview_max_age_secs() -> u64 {
    3_600
}

fn default_housekeeping_interval_secs() -> u64 {
    300
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
            pool_idle_timeout_secs: default_pool_idle_timeout_secs(),
            pool_max_idle_per_host: default_pool_max_idle_per_host(),
            tcp_keepalive_secs: default_tcp_keepalive_secs(),
            max_page_bytes: default_max_page_bytes(),
            max_image_bytes: default_max_image_bytes(),
            preview_cache_entries: default_preview_cache_entries(),
            preview_cache_ttl_secs: None,
            image_cache_entries: default_image_cache_entries(),
            image_cache_ttl_secs: default_image_cache_ttl_secs(),
            image_cache_max_entry_bytes: default_image_cache_max_entry_bytes(),
            max_batch_urls: default_max_batch_urls(),
            preview_max_age_secs: default_preview_max_age_secs(),
            housekeeping_interval_secs: default_housekeeping_interval_secs(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn image_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.image_cache_ttl_secs)
    }

    pub fn preview_cache_ttl(&self) -> Option<Duration> {
        self.preview_cache_ttl_secs.map(Duration::from_secs)
    }

    pub fn housekeeping_interval(&self) -> Duration {
        Duration::from_secs(self.housekeeping_interval_secs)
    }

    /// Preview cache capacity. Zero is rejected by [`AppConfig::validate`], clamped here regardless.
    pub fn preview_capacity(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.preview_cache_entries).unwrap_or(NonZeroUsize::MIN)
    }

    pub fn image_capacity(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.image_cache_entries).unwrap_or(NonZeroUsize::MIN)
    }

    /// Layered figment without validation.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `UNFURL_`
    /// 2. TOML file from `UNFURL_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("UNFURL_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment.merge(Env::prefixed("UNFURL_").ignore(&["config_file"]).map(|key| key.as_str().to_lowercase().into()))
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_figment(Self::figment())
    }

    /// Extract and validate from an arbitrary figment.
    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
