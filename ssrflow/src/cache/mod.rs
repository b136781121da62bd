//! Page cache: entry types, key derivation and the store abstraction.
//!
//! The pipeline treats the cache as an optimisation. Read failures degrade
//! to a miss and write failures are logged and dropped, so a store that is
//! down never changes what the client receives.

mod key;
mod memory;

pub use key::derive_cache_key;
pub use memory::InMemoryCacheStore;

use crate::errors::CacheError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Markup for a rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedPage {
    /// Markup placed inside `<head>`.
    pub head: String,
    /// Markup placed inside `<body>`, rehydration script included.
    pub body: String,
    /// Status the page was served with.
    pub status: u16,
}

impl CachedPage {
    /// Creates a page served with status 200.
    #[must_use]
    pub fn ok(head: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            head: head.into(),
            body: body.into(),
            status: 200,
        }
    }
}

/// A value held by the cache store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CacheEntry {
    /// A full rendered page.
    Page(CachedPage),
    /// The URL is known not to resolve.
    NotFound,
}

impl CacheEntry {
    /// Encodes the entry as JSON for stores that persist strings.
    pub fn to_json(&self) -> Result<String, CacheError> {
        serde_json::to_string(self).map_err(|e| CacheError::Malformed {
            key: String::new(),
            reason: e.to_string(),
        })
    }

    /// Decodes an entry previously produced by [`CacheEntry::to_json`].
    pub fn from_json(key: &str, json: &str) -> Result<Self, CacheError> {
        serde_json::from_str(json).map_err(|e| CacheError::Malformed {
            key: key.to_string(),
            reason: e.to_string(),
        })
    }

    /// Returns true for a not-found marker.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}

/// Key-value store with per-entry expiry.
///
/// Implementations must tolerate concurrent `get`/`set` on the same key;
/// the pipeline adds no locking of its own and last write wins.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Gets an entry by key. `Ok(None)` is a miss.
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>, CacheError>;

    /// Stores an entry for `ttl`.
    async fn set(&self, key: &str, entry: CacheEntry, ttl: Duration) -> Result<(), CacheError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_wire_format() {
        let page = CacheEntry::Page(CachedPage::ok("<title>x</title>", "<div></div>"));
        let json: serde_json::Value = serde_json::from_str(&page.to_json().unwrap()).unwrap();

        assert_eq!(json["kind"], "page");
        assert_eq!(json["head"], "<title>x</title>");
        assert_eq!(json["status"], 200);

        let marker = CacheEntry::NotFound.to_json().unwrap();
        assert_eq!(marker, r#"{"kind":"not_found"}"#);
    }

    #[test]
    fn test_entry_from_json() {
        let entry = CacheEntry::from_json("k", r#"{"kind":"not_found"}"#).unwrap();
        assert!(entry.is_not_found());

        let err = CacheEntry::from_json("k", r#"{"kind":"banana"}"#).unwrap_err();
        assert!(matches!(err, CacheError::Malformed { ref key, .. } if key == "k"));
    }
}
