//! Periodic housekeeping.
//!
//! Expiry is lazy (entries are checked on read), so this task only samples
//! cache sizes and process memory into the log and records when it last ran.

use std::sync::Arc;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::service::PreviewService;

/// Start the sampler. The task runs until the handle is aborted.
pub fn spawn(service: Arc<PreviewService>) -> JoinHandle<()> {
    let period = service.config().housekeeping_interval();

    tokio::spawn(async move {
        let mut ticker = time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // the first tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            run_once(&service);
        }
    })
}

fn run_once(service: &PreviewService) {
    let metrics = service.metrics();
    tracing::info!(
        preview_cache_size = metrics.preview_cache_size,
        image_cache_size = metrics.image_cache_size,
        in_flight = metrics.in_flight,
        memory_usage_mb = metrics.memory_usage_mb,
        "housekeeping"
    );
    service.mark_housekeeping(Utc::now());
}
