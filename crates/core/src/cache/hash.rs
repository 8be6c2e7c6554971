//! Content-addressed cache key generation.

use sha2::{Digest, Sha256};

/// Namespace a key belongs to, so a page and an image at the same URL never collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySpace {
    Preview,
    Image,
}

impl KeySpace {
    fn tag(self) -> &'static str {
        match self {
            KeySpace::Preview => "preview",
            KeySpace::Image => "image",
        }
    }
}

/// Compute a fixed-length cache key for a canonical URL.
pub fn compute_cache_key(space: KeySpace, canonical_url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(space.tag().as_bytes());
    hasher.update(b"\n");
    hasher.update(canonical_url.as_bytes());
    hex::encode(hasher.finalize())
}
