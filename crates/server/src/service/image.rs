//! Image proxy path.
//!
//! Images are cached with an absolute TTL and only when smaller than the
//! admission ceiling; larger payloads are streamed back but never retained.
//! Concurrent requests for the same image are not collapsed.

use unfurl_client::canonicalize;
use unfurl_core::cache::{KeySpace, compute_cache_key};
use unfurl_core::{Error, ImageAsset};

use super::PreviewService;

impl PreviewService {
    /// Image bytes for `raw_url`, from cache or upstream.
    pub async fn proxy_image(&self, raw_url: &str) -> Result<ImageAsset, Error> {
        let url = canonicalize(raw_url)?;
        let key = compute_cache_key(KeySpace::Image, url.as_str());

        if let Some(asset) = self.images.get(&key) {
            tracing::debug!("image cache hit for {}", url);
            return Ok(asset);
        }

        let asset = self.upstream.fetch_image(&url).await?;

        if asset.len() < self.config.image_cache_max_entry_bytes {
            self.images.insert(key, asset.clone());
        } else {
            tracing::debug!(size = asset.len(), "image for {} too large to cache", url);
        }

        Ok(asset)
    }
}
