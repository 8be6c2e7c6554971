//! Turn raw scanned values into a [`PreviewRecord`].
//!
//! Applies entity decoding, whitespace collapsing, length limits, URL
//! resolution and the host-name / `/favicon.ico` fallbacks.

use html_escape::decode_html_entities;
use unfurl_core::PreviewRecord;
use unfurl_core::preview::{MAX_DESCRIPTION_CHARS, MAX_TITLE_CHARS, truncate_chars};
use url::Url;

use super::PageMeta;
use crate::fetch::url::{authority, resolve_url};

/// Decode entities and collapse runs of whitespace.
fn clean_text(raw: Option<&str>) -> String {
    raw.map(|s| decode_html_entities(s).split_whitespace().collect::<Vec<_>>().join(" "))
        .unwrap_or_default()
}

fn clean_href(raw: Option<&str>) -> String {
    raw.map(|s| decode_html_entities(s.trim()).into_owned()).unwrap_or_default()
}

/// Build the record for `page_url` from scanned metadata.
///
/// `requested` is echoed back verbatim in the `url` field so callers can
/// correlate results with their input.
pub fn build_record(requested: &str, page_url: &Url, meta: &PageMeta) -> PreviewRecord {
    let domain = authority(page_url);

    let mut title = clean_text(meta.title.as_deref());
    if title.is_empty() {
        title = domain.clone();
    }

    let mut site_name = clean_text(meta.site_name.as_deref());
    if site_name.is_empty() {
        site_name = domain.clone();
    }

    let description = clean_text(meta.description.as_deref());

    let image = match clean_href(meta.image.as_deref()) {
        href if href.is_empty() => href,
        href => resolve_url(page_url, &href),
    };

    let favicon = match clean_href(meta.favicon.as_deref()) {
        href if href.is_empty() => format!("{}://{}/favicon.ico", page_url.scheme(), domain),
        href => resolve_url(page_url, &href),
    };

    PreviewRecord {
        url: requested.to_string(),
        title: truncate_chars(&title, MAX_TITLE_CHARS),
        description: truncate_chars(&description, MAX_DESCRIPTION_CHARS),
        image,
        site_name,
        favicon,
        domain,
        error: None,
    }
}
