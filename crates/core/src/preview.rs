//! Preview and image records served to callers.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::Error;

/// Maximum title length in characters.
pub const MAX_TITLE_CHARS: usize = 200;

/// Maximum description length in characters.
pub const MAX_DESCRIPTION_CHARS: usize = 300;

/// Normalized social/SEO metadata for one page.
///
/// `image` and `favicon` are always absolute (or empty) by the time a record
/// is built; records are immutable once cached.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewRecord {
    pub url: String,
    pub title: String,
    pub description: String,
    pub image: String,
    pub site_name: String,
    pub favicon: String,
    pub domain: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PreviewRecord {
    /// Build a failed record. `domain` is kept when the URL was parseable.
    pub fn failed(url: impl Into<String>, domain: impl Into<String>, err: &Error) -> Self {
        Self { url: url.into(), domain: domain.into(), error: Some(err.preview_message()), ..Default::default() }
    }

    pub fn is_error(&self) -> bool {
        self.error.as_deref().is_some_and(|e| !e.is_empty())
    }
}

/// Raw image bytes with their content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAsset {
    pub data: Bytes,
    pub content_type: String,
}

impl ImageAsset {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Truncate to at most `max` characters, never splitting a character.
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}
