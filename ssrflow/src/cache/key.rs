//! Deterministic cache key derivation.

use crate::core::BrowserType;
use sha2::{Digest, Sha256};

/// Derives the cache key for a URL path.
///
/// The key is `"{prefix}:{hex}"` where `hex` is the first 16 bytes of the
/// SHA-256 of the path, optionally followed by `|` and the browser class.
/// Only the path participates; query strings never reach this function.
#[must_use]
pub fn derive_cache_key(prefix: &str, url: &str, browser: Option<BrowserType>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    if let Some(browser) = browser {
        hasher.update(b"|");
        hasher.update(browser.to_string().as_bytes());
    }
    let digest = hasher.finalize();
    format!("{prefix}:{}", hex::encode(&digest[..16]))
}
