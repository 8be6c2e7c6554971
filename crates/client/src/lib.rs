//! Client code for unfurl.
//!
//! This crate provides the HTTP fetch coordinator, URL canonicalization and
//! resolution, and the streaming metadata extractor used by the server.

pub mod extract;
pub mod fetch;

pub use extract::{Field, MetaScanner, PageMeta, build_record, find_field};

pub use fetch::{FetchClient, FetchConfig, Upstream, canonicalize, resolve_url};
