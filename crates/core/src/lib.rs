//! Core types and shared functionality for unfurl.
//!
//! This crate provides:
//! - Preview and image data model
//! - Bounded in-memory caches (LRU with optional TTL)
//! - In-flight request deduplication
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod inflight;
pub mod preview;

pub use cache::{BoundedCache, CacheStats};
pub use config::AppConfig;
pub use error::Error;
pub use inflight::InFlight;
pub use preview::{ImageAsset, PreviewRecord};
