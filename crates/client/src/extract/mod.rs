//! Social/SEO metadata extraction.
//!
//! ### Tag Scanning
//! - Best-effort scanning of `<meta>`, `<link>` and `<title>` tags, not a DOM parse.
//! - Attribute order and quote style do not matter; names compare case-insensitively.
//!
//! ### Source Precedence
//! - Open Graph, then Twitter card, then the generic HTML tag.
//! - Fallbacks (host name, `/favicon.ico`) are applied by [`normalize`].
//!
//! ### Incremental Use
//! - [`MetaScanner`] feeds streamed chunks through [`find_field`] and stops
//!   as soon as every field is settled or the byte budget runs out.

pub mod normalize;
pub mod scanner;

pub use normalize::build_record;
pub use scanner::MetaScanner;

use regex::Regex;
use std::sync::LazyLock;

static META_TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?is)<meta\b[^>]*>").expect("invalid regex"));

static LINK_TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?is)<link\b[^>]*>").expect("invalid regex"));

static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<title\b[^>]*>([^<]+)</title>").expect("invalid regex"));

static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)([a-z][a-z0-9_:.-]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+))"#).expect("invalid regex")
});

/// A metadata field a preview is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Title,
    Description,
    Image,
    SiteName,
    Favicon,
}

impl Field {
    pub const ALL: [Field; 5] = [Field::Title, Field::Description, Field::Image, Field::SiteName, Field::Favicon];

    /// Meta `property`/`name` keys in precedence order.
    fn meta_keys(self) -> &'static [&'static str] {
        match self {
            Field::Title => &["og:title", "twitter:title"],
            Field::Description => &["og:description", "twitter:description", "description"],
            Field::Image => &["og:image", "og:image:url", "twitter:image", "twitter:image:src"],
            Field::SiteName => &["og:site_name", "application-name"],
            Field::Favicon => &[],
        }
    }

    /// Lowercase substrings that suggest a line may hold this field.
    pub(crate) fn hints(self) -> &'static [&'static str] {
        match self {
            Field::Title => &["og:title", "twitter:title", "<title", "</title"],
            Field::Description => &["description"],
            Field::Image => &["og:image", "twitter:image"],
            Field::SiteName => &["og:site_name", "application-name"],
            Field::Favicon => &["icon"],
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

/// Raw, undecoded values found in a page. `None` means not present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageMeta {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub site_name: Option<String>,
    pub favicon: Option<String>,
}

impl PageMeta {
    pub fn get(&self, field: Field) -> Option<&str> {
        match field {
            Field::Title => self.title.as_deref(),
            Field::Description => self.description.as_deref(),
            Field::Image => self.image.as_deref(),
            Field::SiteName => self.site_name.as_deref(),
            Field::Favicon => self.favicon.as_deref(),
        }
    }

    pub fn set(&mut self, field: Field, value: String) {
        let slot = match field {
            Field::Title => &mut self.title,
            Field::Description => &mut self.description,
            Field::Image => &mut self.image,
            Field::SiteName => &mut self.site_name,
            Field::Favicon => &mut self.favicon,
        };
        *slot = Some(value);
    }
}

/// Iterate `(lowercased name, value)` pairs of one tag.
fn attributes(tag: &str) -> impl Iterator<Item = (String, &str)> {
    ATTR_RE.captures_iter(tag).filter_map(|caps| {
        let name = caps.get(1)?.as_str().to_ascii_lowercase();
        let value = caps.get(2).or_else(|| caps.get(3)).or_else(|| caps.get(4))?.as_str();
        Some((name, value))
    })
}

/// `(key, content)` for every meta tag carrying both.
fn meta_pairs(html: &str) -> Vec<(String, &str)> {
    META_TAG_RE
        .find_iter(html)
        .filter_map(|tag| {
            let mut key = None;
            let mut content = None;
            for (name, value) in attributes(tag.as_str()) {
                match name.as_str() {
                    "property" | "name" if key.is_none() => key = Some(value.trim().to_ascii_lowercase()),
                    "content" => content = Some(value),
                    _ => {}
                }
            }
            Some((key?, content?))
        })
        .collect()
}

fn favicon_href(html: &str) -> Option<String> {
    LINK_TAG_RE.find_iter(html).find_map(|tag| {
        let mut is_icon = false;
        let mut href = None;
        for (name, value) in attributes(tag.as_str()) {
            match name.as_str() {
                "rel" => is_icon = value.split_ascii_whitespace().any(|t| t.to_ascii_lowercase().contains("icon")),
                "href" => href = Some(value.trim()),
                _ => {}
            }
        }
        href.filter(|h| is_icon && !h.is_empty()).map(str::to_string)
    })
}

/// Highest-precedence value for `field` with its rank (0 = preferred source).
pub(crate) fn find_ranked(html: &str, field: Field) -> Option<(usize, String)> {
    if field == Field::Favicon {
        return favicon_href(html).map(|href| (0, href));
    }

    let keys = field.meta_keys();
    let pairs = meta_pairs(html);

    let from_meta = keys.iter().enumerate().find_map(|(rank, key)| {
        pairs
            .iter()
            .find(|(k, content)| k == key && !content.trim().is_empty())
            .map(|(_, content)| (rank, content.trim().to_string()))
    });

    if from_meta.is_some() || field != Field::Title {
        return from_meta;
    }

    TITLE_RE
        .captures_iter(html)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .find(|t| !t.is_empty())
        .map(|t| (keys.len(), t.to_string()))
}

/// Best value for `field` in `html`, or `None` if the page does not carry it.
///
/// Pure function over already-buffered text; no fallbacks are applied.
pub fn find_field(html: &str, field: Field) -> Option<String> {
    find_ranked(html, field).map(|(_, value)| value)
}

/// Scan a complete document in one pass.
#[cfg(test)]
pub(crate) fn extract_meta(html: &str) -> PageMeta {
    let mut meta = PageMeta::default();
    for field in Field::ALL {
        if let Some(value) = find_field(html, field) {
            meta.set(field, value);
        }
    }
    meta
}
