//! URL canonicalization for consistent caching, and reference resolution.

use url::Url;

/// Error type for URL canonicalization failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("missing host")]
    MissingHost,

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

impl From<UrlError> for unfurl_core::Error {
    fn from(err: UrlError) -> Self {
        unfurl_core::Error::InvalidUrl(err.to_string())
    }
}

/// Canonicalize a target URL string for cache keys and fetching.
///
/// Normalization steps:
/// 1. Trim leading/trailing whitespace
/// 2. Require an absolute `http`/`https` URL with a host
/// 3. Lowercase the host (done by the parser)
/// 4. Remove fragment (#...)
/// 5. Keep query string intact (do not reorder)
pub fn canonicalize(input: &str) -> Result<Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let mut parsed = Url::parse(trimmed).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }

    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(UrlError::MissingHost);
    }

    parsed.set_fragment(None);

    Ok(parsed)
}

/// Resolve `href` against the page URL.
///
/// References that already carry a scheme are returned unchanged. Relative and
/// protocol-relative references are joined onto `base`. Never fails: an
/// unresolvable reference is returned as given.
pub fn resolve_url(base: &Url, href: &str) -> String {
    let href = href.trim();
    if href.is_empty() {
        return String::new();
    }

    if Url::parse(href).is_ok() {
        return href.to_string();
    }

    match base.join(href) {
        Ok(resolved) => resolved.to_string(),
        Err(e) => {
            tracing::debug!("could not resolve {} against {}: {}", href, base, e);
            href.to_string()
        }
    }
}

/// `host[:port]` of a URL, as shown in the `domain` field.
pub fn authority(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    }
}

/// Best-effort authority of a raw string that may not canonicalize.
pub fn loose_authority(input: &str) -> String {
    Url::parse(input.trim()).map(|u| authority(&u)).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonicalize_basic() {
        let url = canonicalize("https://example.com").unwrap();
        assert_eq!(url.scheme(), "https");
        assert_eq!(url.host_str(), Some("example.com"));
    }

    #[test]
    fn test_canonicalize_requires_scheme() {
        assert!(matches!(canonicalize("bad-url"), Err(UrlError::InvalidUrl(_))));
        assert!(matches!(canonicalize("example.com/path"), Err(UrlError::InvalidUrl(_))));
    }

    #[test]
    fn test_canonicalize_lowercase_host() {
        let url = canonicalize("https://EXAMPLE.COM").unwrap();
        assert_eq!(url.host_str(), Some("example.com"));
    }

    #[test]
    fn test_canonicalize_remove_fragment() {
        let url = canonicalize("https://example.com#section").unwrap();
        assert_eq!(url.fragment(), None);
        assert_eq!(url.path(), "/");
    }

    #[test]
    fn test_canonicalize_preserve_query() {
        let url = canonicalize("https://example.com?b=2&a=1").unwrap();
        assert_eq!(url.query(), Some("b=2&a=1"));
    }

    #[test]
    fn test_canonicalize_trim_whitespace() {
        let url = canonicalize("  https://example.com  ").unwrap();
        assert_eq!(url.as_str(), "https://example.com/");
    }

    #[test]
    fn test_canonicalize_unsupported_scheme() {
        let result = canonicalize("file:///etc/passwd");
        assert!(matches!(result, Err(UrlError::UnsupportedScheme(_))));
        let result = canonicalize("mailto:someone@example.com");
        assert!(matches!(result, Err(UrlError::UnsupportedScheme(_))));
    }

    #[test]
    fn test_canonicalize_empty() {
        assert!(matches!(canonicalize(""), Err(UrlError::Empty)));
        assert!(matches!(canonicalize("   "), Err(UrlError::Empty)));
    }

    #[test]
    fn test_url_error_maps_to_invalid_url() {
        let err: unfurl_core::Error = UrlError::Empty.into();
        assert_eq!(err.preview_message(), "Invalid URL");
    }

    #[test]
    fn test_resolve_relative_path() {
        let base = Url::parse("https://example.com/blog/post").unwrap();
        assert_eq!(resolve_url(&base, "/img/a.png"), "https://example.com/img/a.png");
        assert_eq!(resolve_url(&base, "a.png"), "https://example.com/blog/a.png");
        assert_eq!(resolve_url(&base, "../a.png"), "https://example.com/a.png");
    }

    #[test]
    fn test_resolve_protocol_relative() {
        let base = Url::parse("http://example.com/").unwrap();
        assert_eq!(resolve_url(&base, "//cdn.example.net/a.png"), "http://cdn.example.net/a.png");
    }

    #[test]
    fn test_resolve_absolute_unchanged() {
        let base = Url::parse("https://example.com/").unwrap();
        for href in ["https://cdn.example.net/A.png?x=1", "http://other.test", "data:image/png;base64,AAAA"] {
            assert_eq!(resolve_url(&base, href), href);
        }
    }

    #[test]
    fn test_resolve_always_absolute_for_relative_inputs() {
        let bases = ["https://a.test", "https://a.test/x/y?q=1", "http://b.test:8080/deep/path/"];
        let hrefs = ["", "favicon.ico", "/favicon.ico", "./x", "../../../../up", "?q=2", "#frag", "a b.png"];
        for base in bases {
            let base = Url::parse(base).unwrap();
            for href in hrefs.iter().filter(|h| !h.is_empty()) {
                let resolved = resolve_url(&base, href);
                assert!(Url::parse(&resolved).is_ok(), "{href} against {base} gave {resolved}");
            }
        }
    }

    #[test]
    fn test_authority() {
        let url = Url::parse("http://Example.com:8080/x").unwrap();
        assert_eq!(authority(&url), "example.com:8080");
        let url = Url::parse("https://example.com/x").unwrap();
        assert_eq!(authority(&url), "example.com");
        assert_eq!(loose_authority("bad-url"), "");
    }
}
