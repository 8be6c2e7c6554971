//! Outbound HTTP fetch coordinator.
//!
//! ### Transport
//! - Fixed whole-request timeout plus a connect timeout
//! - Pooled keep-alive connections for reuse under concurrent load
//! - Browser User-Agent; `Accept` favors HTML for pages
//!
//! ### Failure Mapping
//! - Non-2xx status -> `Error::HttpStatus`
//! - DNS/connect/timeout -> `Error::FetchFailed`
//! - Malformed target -> `Error::InvalidUrl`, before any network call (see [`url`])
//!
//! ### Byte Ceilings
//! Bodies are always read through a hard ceiling, whatever `Content-Length` says.
//! Pages stream into the [`MetaScanner`] and stop early; images are truncated at the cap.

pub mod url;

use async_trait::async_trait;
use bytes::BytesMut;
use reqwest::{Client, Response, header};
use std::time::{Duration, Instant};
use unfurl_core::{AppConfig, Error, ImageAsset};

pub use self::url::{UrlError, authority, canonicalize, loose_authority, resolve_url};

use crate::extract::{MetaScanner, PageMeta};

const PAGE_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const IMAGE_ACCEPT: &str = "image/avif,image/webp,image/apng,image/*,*/*;q=0.8";

/// Content type assumed when an image response omits one.
pub const DEFAULT_IMAGE_CONTENT_TYPE: &str = "image/jpeg";

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,

    /// Whole-request timeout (default: 10s)
    pub timeout: Duration,

    /// Connection establishment timeout (default: 5s)
    pub connect_timeout: Duration,

    pub pool_idle_timeout: Duration,
    pub pool_max_idle_per_host: usize,
    pub tcp_keepalive: Duration,

    /// Page read ceiling and scan budget (default: 100 000 bytes)
    pub max_page_bytes: usize,

    /// Image read ceiling (default: 2MiB)
    pub max_image_bytes: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for FetchConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            timeout: config.timeout(),
            connect_timeout: config.connect_timeout(),
            pool_idle_timeout: Duration::from_secs(config.pool_idle_timeout_secs),
            pool_max_idle_per_host: config.pool_max_idle_per_host,
            tcp_keepalive: Duration::from_secs(config.tcp_keepalive_secs),
            max_page_bytes: config.max_page_bytes,
            max_image_bytes: config.max_image_bytes,
        }
    }
}

/// The network side of the service: where pages and images come from.
///
/// Lets the aggregation layer be exercised without real I/O.
#[async_trait]
pub trait Upstream: Send + Sync {
    /// Fetch a page and scan it for metadata.
    async fn fetch_meta(&self, url: &::url::Url) -> Result<PageMeta, Error>;

    /// Fetch an image through the image byte ceiling.
    async fn fetch_image(&self, url: &::url::Url) -> Result<ImageAsset, Error>;
}

/// HTTP fetch client with timeouts and byte ceilings.
pub struct FetchClient {
    http: Client,
    config: FetchConfig,
}

impl FetchClient {
    /// Create a new fetch client with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .tcp_keepalive(config.tcp_keepalive)
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::ClientBuild(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    /// Issue a GET and reject non-2xx responses.
    async fn get(&self, url: &::url::Url, accept: &str) -> Result<Response, Error> {
        let response = self.http.get(url.as_str()).header(header::ACCEPT, accept).send().await.map_err(|e| {
            tracing::warn!(url = %url, error = %e, "upstream request failed");
            Error::FetchFailed(format!("network error: {}", e))
        })?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!("upstream {} answered {}", url, status);
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        Ok(response)
    }

    /// Stream a page into the metadata scanner, stopping as soon as it is satisfied.
    ///
    /// A body that breaks off after some bytes arrived yields whatever was found so far.
    pub async fn scan_page(&self, url: &::url::Url) -> Result<PageMeta, Error> {
        let start = Instant::now();
        let mut response = self.get(url, PAGE_ACCEPT).await?;
        let mut scanner = MetaScanner::new(self.config.max_page_bytes);

        loop {
            match response.chunk().await {
                Ok(Some(chunk)) => {
                    if scanner.push(&chunk) {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) if scanner.bytes_consumed() > 0 => {
                    tracing::warn!(url = %url, error = %e, "page body interrupted; keeping partial scan");
                    break;
                }
                Err(e) => return Err(Error::FetchFailed(format!("failed to read response: {}", e))),
            }
        }

        let consumed = scanner.bytes_consumed();
        let meta = scanner.finish();

        tracing::debug!("scanned {} in {}ms ({} bytes)", url, start.elapsed().as_millis(), consumed);

        Ok(meta)
    }

    /// Fetch an image, truncating the body at the image ceiling.
    pub async fn fetch_image_bytes(&self, url: &::url::Url) -> Result<ImageAsset, Error> {
        let start = Instant::now();
        let mut response = self.get(url, IMAGE_ACCEPT).await?;
        let max = self.config.max_image_bytes;

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(DEFAULT_IMAGE_CONTENT_TYPE)
            .to_string();

        let declared = response.content_length().map(|len| len as usize).unwrap_or(0);
        let mut data = BytesMut::with_capacity(declared.min(max));

        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| Error::FetchFailed(format!("failed to read response: {}", e)))?
        {
            let room = max - data.len();
            if chunk.len() >= room {
                data.extend_from_slice(&chunk[..room]);
                break;
            }
            data.extend_from_slice(&chunk);
        }

        tracing::debug!("fetched image {} in {}ms ({} bytes)", url, start.elapsed().as_millis(), data.len());

        Ok(ImageAsset { data: data.freeze(), content_type })
    }
}

#[async_trait]
impl Upstream for FetchClient {
    async fn fetch_meta(&self, url: &::url::Url) -> Result<PageMeta, Error> {
        self.scan_page(url).await
    }

    async fn fetch_image(&self, url: &::url::Url) -> Result<ImageAsset, Error> {
        self.fetch_image_bytes(url).await
    }
}
