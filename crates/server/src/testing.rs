//! Scripted upstream used by the server tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use unfurl_client::{PageMeta, Upstream};
use unfurl_core::{AppConfig, Error, ImageAsset};
use url::Url;

/// Upstream that answers from in-memory tables and counts every call.
///
/// Pages without an entry get a generated title; images without an entry
/// answer `404`.
#[derive(Default)]
pub struct StubUpstream {
    pub meta_calls: AtomicUsize,
    pub image_calls: AtomicUsize,
    delay: Duration,
    pages: HashMap<String, Result<PageMeta, Error>>,
    images: HashMap<String, Result<ImageAsset, Error>>,
}

impl StubUpstream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_page(mut self, url: &str, meta: PageMeta) -> Self {
        self.pages.insert(url.to_string(), Ok(meta));
        self
    }

    pub fn with_page_error(mut self, url: &str, err: Error) -> Self {
        self.pages.insert(url.to_string(), Err(err));
        self
    }

    pub fn with_image(mut self, url: &str, size: usize, content_type: &str) -> Self {
        let asset = ImageAsset { data: Bytes::from(vec![7u8; size]), content_type: content_type.to_string() };
        self.images.insert(url.to_string(), Ok(asset));
        self
    }

    pub fn with_image_error(mut self, url: &str, err: Error) -> Self {
        self.images.insert(url.to_string(), Err(err));
        self
    }

    pub fn meta_calls(&self) -> usize {
        self.meta_calls.load(Ordering::SeqCst)
    }

    pub fn image_calls(&self) -> usize {
        self.image_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Upstream for StubUpstream {
    async fn fetch_meta(&self, url: &Url) -> Result<PageMeta, Error> {
        self.meta_calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match self.pages.get(url.as_str()) {
            Some(result) => result.clone(),
            None => Ok(PageMeta { title: Some(format!("Title of {}", url.path())), ..Default::default() }),
        }
    }

    async fn fetch_image(&self, url: &Url) -> Result<ImageAsset, Error> {
        self.image_calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.images
            .get(url.as_str())
            .cloned()
            .unwrap_or_else(|| Err(Error::HttpStatus { status: 404, reason: "Not Found".into() }))
    }
}

/// Defaults with a short housekeeping period.
pub fn test_config() -> AppConfig {
    AppConfig { housekeeping_interval_secs: 1, ..AppConfig::default() }
}
