//! HTTP endpoint implementations.
//!
//! Each submodule holds the handlers for one endpoint family. Query strings
//! are read raw so repeated `url` parameters keep their order.

pub mod image;
pub mod preview;
pub mod status;

use axum::http::StatusCode;

/// Every `url` query parameter, decoded, in the order given.
pub(crate) fn query_urls(query: Option<&str>) -> Vec<String> {
    query
        .map(|q| {
            url::form_urlencoded::parse(q.as_bytes())
                .filter(|(key, _)| key == "url")
                .map(|(_, value)| value.into_owned())
                .collect()
        })
        .unwrap_or_default()
}

/// The first `url` parameter, if present and non-empty.
pub(crate) fn first_url(query: Option<&str>) -> Option<String> {
    query_urls(query).into_iter().next().filter(|u| !u.trim().is_empty())
}

pub(crate) fn cache_control(max_age_secs: u64) -> String {
    format!("public, max-age={max_age_secs}")
}

/// Bare `OPTIONS` request: empty 200, CORS headers come from the layer.
pub async fn preflight() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_urls_order_and_decoding() {
        let urls = query_urls(Some("url=https%3A%2F%2Fb.test&x=1&url=https://a.test/?q%3D1&url="));
        assert_eq!(urls, vec!["https://b.test", "https://a.test/?q=1", ""]);
    }

    #[test]
    fn test_first_url() {
        assert_eq!(first_url(None), None);
        assert_eq!(first_url(Some("other=1")), None);
        assert_eq!(first_url(Some("url=")), None);
        assert_eq!(first_url(Some("url=a&url=b")).as_deref(), Some("a"));
    }

    #[test]
    fn test_cache_control() {
        assert_eq!(cache_control(3600), "public, max-age=3600");
    }
}
