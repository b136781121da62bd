//! Browser classification and the render state machine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of the requesting client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrowserType {
    /// A current evergreen browser.
    Modern,
    /// An old browser that needs degraded markup or polyfills.
    Legacy,
    /// A crawler, link-preview fetcher or headless browser.
    Bot,
    /// Anything else, including a missing header.
    Unknown,
}

impl Default for BrowserType {
    fn default() -> Self {
        Self::Unknown
    }
}

impl fmt::Display for BrowserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Modern => write!(f, "modern"),
            Self::Legacy => write!(f, "legacy"),
            Self::Bot => write!(f, "bot"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Where a request currently stands between "nothing known" and a final
/// response.
///
/// Cache lookup and rendering are the only steps that move the state; every
/// request ends in exactly one of the terminal states.
///
/// ```text
/// Unresolved ──cache page──▶ CacheHit
/// Unresolved ──cache 404───▶ CacheHit404 ──render fails──▶ RenderError
/// Unresolved ──render──────▶ Rendered | Redirected | RenderError
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderState {
    /// No cache hit and nothing rendered yet.
    Unresolved,
    /// A full page was found in the cache.
    CacheHit,
    /// A not-found marker was found in the cache.
    CacheHit404,
    /// The page was freshly rendered (200 or 404).
    Rendered,
    /// Rendering resolved to a redirect.
    Redirected,
    /// Rendering or data resolution failed; a 500 page is served.
    RenderError,
}

impl Default for RenderState {
    fn default() -> Self {
        Self::Unresolved
    }
}

impl fmt::Display for RenderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unresolved => write!(f, "unresolved"),
            Self::CacheHit => write!(f, "cache_hit"),
            Self::CacheHit404 => write!(f, "cache_hit_404"),
            Self::Rendered => write!(f, "rendered"),
            Self::Redirected => write!(f, "redirected"),
            Self::RenderError => write!(f, "render_error"),
        }
    }
}

impl RenderState {
    /// Returns true if `next` is a legal successor of this state.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        use RenderState::{CacheHit, CacheHit404, Redirected, RenderError, Rendered, Unresolved};

        matches!(
            (self, next),
            (Unresolved, CacheHit | CacheHit404 | Rendered | Redirected | RenderError)
                | (CacheHit404, RenderError)
        )
    }

    /// Returns true once the request has a response to send.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Unresolved)
    }

    /// Returns true if the markup came from the cache.
    #[must_use]
    pub fn is_from_cache(self) -> bool {
        matches!(self, Self::CacheHit)
    }

    /// Returns true if the request matched a cached not-found marker.
    #[must_use]
    pub fn is_404_from_cache(self) -> bool {
        matches!(self, Self::CacheHit404)
    }

    /// Returns the value used in the `X-Cache` response header.
    #[must_use]
    pub fn cache_header(self) -> &'static str {
        if matches!(self, Self::CacheHit | Self::CacheHit404) {
            "HIT"
        } else {
            "MISS"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_browser_type_display() {
        assert_eq!(BrowserType::Modern.to_string(), "modern");
        assert_eq!(BrowserType::Bot.to_string(), "bot");
        assert_eq!(BrowserType::default(), BrowserType::Unknown);
    }

    #[test]
    fn test_browser_type_serialize() {
        let json = serde_json::to_string(&BrowserType::Legacy).unwrap();
        assert_eq!(json, r#""legacy""#);
    }

    #[test]
    fn test_transitions_from_unresolved() {
        let start = RenderState::Unresolved;
        assert!(start.can_transition_to(RenderState::CacheHit));
        assert!(start.can_transition_to(RenderState::CacheHit404));
        assert!(start.can_transition_to(RenderState::Rendered));
        assert!(start.can_transition_to(RenderState::Redirected));
        assert!(start.can_transition_to(RenderState::RenderError));
        assert!(!start.can_transition_to(RenderState::Unresolved));
    }

    #[test]
    fn test_terminal_states_are_sticky() {
        for state in [
            RenderState::CacheHit,
            RenderState::Rendered,
            RenderState::Redirected,
            RenderState::RenderError,
        ] {
            assert!(state.is_terminal());
            assert!(!state.can_transition_to(RenderState::Rendered));
            assert!(!state.can_transition_to(RenderState::CacheHit));
        }
    }

    #[test]
    fn test_cached_404_can_only_fail() {
        assert!(RenderState::CacheHit404.can_transition_to(RenderState::RenderError));
        assert!(!RenderState::CacheHit404.can_transition_to(RenderState::Rendered));
    }

    #[test]
    fn test_cache_flags() {
        assert!(RenderState::CacheHit.is_from_cache());
        assert!(!RenderState::CacheHit404.is_from_cache());
        assert!(RenderState::CacheHit404.is_404_from_cache());
        assert_eq!(RenderState::CacheHit404.cache_header(), "HIT");
        assert_eq!(RenderState::Rendered.cache_header(), "MISS");
    }
}
