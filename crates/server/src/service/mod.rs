//! Preview aggregation service.
//!
//! ### Request Flow
//! - Canonicalize the target; an unusable URL yields a failed record with no
//!   network activity and nothing cached.
//! - Serve from the preview cache when possible.
//! - Otherwise join or start the single in-flight fetch for that URL. The
//!   owner writes a successful record through to the cache before the
//!   in-flight registration is released, and the cache is checked again under
//!   the registry lock before a new fetch starts.
//! - Failures are returned to every waiter and never cached.
//!
//! ### Batches
//! - Each URL runs through the single-preview path on its own task; results
//!   come back in input order and one failure never affects its neighbours.

mod image;

use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use tokio::task::JoinSet;
use url::Url;
use unfurl_client::fetch::url::{authority, loose_authority};
use unfurl_client::{Upstream, build_record, canonicalize};
use unfurl_core::cache::{KeySpace, compute_cache_key};
use unfurl_core::{AppConfig, BoundedCache, Error, ImageAsset, InFlight, PreviewRecord};

use crate::metrics::{MetricsSnapshot, process_memory_mb};

/// Shared state behind every HTTP handler.
pub struct PreviewService {
    config: AppConfig,
    upstream: Arc<dyn Upstream>,
    previews: Arc<BoundedCache<PreviewRecord>>,
    images: BoundedCache<ImageAsset>,
    inflight: InFlight<PreviewRecord>,
    last_housekeeping: Mutex<Option<DateTime<Utc>>>,
}

impl PreviewService {
    pub fn new(config: AppConfig, upstream: Arc<dyn Upstream>) -> Self {
        let previews = Arc::new(BoundedCache::new(config.preview_capacity(), config.preview_cache_ttl()));
        let images = BoundedCache::new(config.image_capacity(), Some(config.image_cache_ttl()));

        tracing::info!(
            preview_capacity = previews.capacity(),
            image_capacity = images.capacity(),
            image_ttl_secs = config.image_cache_ttl_secs,
            "preview service ready"
        );

        Self {
            config,
            upstream,
            previews,
            images,
            inflight: InFlight::new(),
            last_housekeeping: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Preview for one URL. Never fails: errors are carried in the record.
    ///
    /// The record's `url` echoes `raw_url` exactly as the caller sent it.
    pub async fn preview(&self, raw_url: &str) -> PreviewRecord {
        let url = match canonicalize(raw_url) {
            Ok(url) => url,
            Err(e) => {
                tracing::debug!("rejecting {:?}: {}", raw_url, e);
                return PreviewRecord::failed(raw_url, loose_authority(raw_url), &e.into());
            }
        };

        let key = compute_cache_key(KeySpace::Preview, url.as_str());
        if let Some(record) = self.previews.get(&key) {
            tracing::debug!("cache hit for {}", url);
            return PreviewRecord { url: raw_url.to_string(), ..record };
        }

        self.fetch_shared(raw_url, url, &key).await
    }

    /// Miss path: join the in-flight fetch for `key` or start one.
    async fn fetch_shared(&self, raw_url: &str, url: Url, key: &str) -> PreviewRecord {
        let domain = authority(&url);
        let work = {
            let upstream = Arc::clone(&self.upstream);
            let previews = Arc::clone(&self.previews);
            let key = key.to_string();
            async move {
                let meta = upstream.fetch_meta(&url).await?;
                let record = build_record(url.as_str(), &url, &meta);
                previews.insert(key, record.clone());
                Ok::<_, Error>(record)
            }
        };

        // the owner writes through before releasing its registration, so a
        // caller that missed just before the write finds the record here
        let previews = &self.previews;
        match self.inflight.run_unless(key, || previews.peek(key), work).await {
            Ok(record) => PreviewRecord { url: raw_url.to_string(), ..record },
            Err(e) => {
                tracing::warn!(url = raw_url, error = %e, "preview fetch failed");
                PreviewRecord::failed(raw_url, domain, &e)
            }
        }
    }

    /// Previews for up to `max_batch_urls` URLs, in input order.
    ///
    /// An empty or oversized batch is rejected before any fetch starts.
    pub async fn preview_batch(self: &Arc<Self>, urls: Vec<String>) -> Result<Vec<PreviewRecord>, Error> {
        if urls.is_empty() {
            return Err(Error::InvalidInput("Missing url parameter".into()));
        }
        let max = self.config.max_batch_urls;
        if urls.len() > max {
            return Err(Error::InvalidInput(format!("Maximum {max} URLs per request")));
        }

        let mut join_set = JoinSet::new();
        for (idx, url) in urls.iter().cloned().enumerate() {
            let service = Arc::clone(self);
            join_set.spawn(async move { (idx, service.preview(&url).await) });
        }

        let mut slots: Vec<Option<PreviewRecord>> = vec![None; urls.len()];
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((idx, record)) => slots[idx] = Some(record),
                Err(e) => tracing::error!("batch task failed: {}", e),
            }
        }

        let records = slots
            .into_iter()
            .zip(urls)
            .map(|(slot, url)| {
                slot.unwrap_or_else(|| {
                    let err = Error::FetchFailed("batch task failed".into());
                    PreviewRecord::failed(url.as_str(), loose_authority(&url), &err)
                })
            })
            .collect::<Vec<_>>();

        let failed = records.iter().filter(|r| r.is_error()).count();
        tracing::debug!(total = records.len(), failed, "batch resolved");

        Ok(records)
    }

    /// Point-in-time counters for `/metrics`.
    pub fn metrics(&self) -> MetricsSnapshot {
        let previews = self.previews.stats();
        let images = self.images.stats();

        MetricsSnapshot {
            preview_hits: previews.hits,
            preview_misses: previews.misses,
            image_hits: images.hits,
            image_misses: images.misses,
            preview_cache_size: self.previews.len(),
            image_cache_size: self.images.len(),
            memory_usage_mb: process_memory_mb(),
            in_flight: self.inflight.len(),
            last_housekeeping: self.last_housekeeping(),
        }
    }

    pub fn last_housekeeping(&self) -> Option<DateTime<Utc>> {
        *self.last_housekeeping.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn mark_housekeeping(&self, at: DateTime<Utc>) {
        *self.last_housekeeping.lock().unwrap_or_else(PoisonError::into_inner) = Some(at);
    }
}
