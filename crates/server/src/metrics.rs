//! Operational counters exposed on `/metrics`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sysinfo::System;

/// Point-in-time view of cache effectiveness and process footprint.
///
/// Counters are cumulative since process start; sizes are current entry
/// counts.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub preview_hits: u64,
    pub preview_misses: u64,
    pub image_hits: u64,
    pub image_misses: u64,
    pub preview_cache_size: usize,
    pub image_cache_size: usize,
    pub memory_usage_mb: u64,
    pub in_flight: usize,
    pub last_housekeeping: Option<DateTime<Utc>>,
}

/// Resident memory of this process in MiB, or 0 when it cannot be sampled.
pub fn process_memory_mb() -> u64 {
    let Ok(pid) = sysinfo::get_current_pid() else {
        return 0;
    };

    let mut system = System::new();
    if !system.refresh_process(pid) {
        return 0;
    }

    system.process(pid).map(|p| p.memory() / 1024 / 1024).unwrap_or(0)
}
