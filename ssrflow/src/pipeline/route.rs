//! Which requests the pipeline handles.

use crate::config::RouteConfig;
use http::Method;

/// Returns true if `path` is a page route: no `.` anywhere and no excluded
/// prefix.
///
/// Prefixes match on raw string start, so `/api` also excludes `/apiary`.
#[must_use]
pub fn is_covered<S: AsRef<str>>(path: &str, excluded_prefixes: &[S]) -> bool {
    !path.contains('.')
        && !excluded_prefixes
            .iter()
            .any(|prefix| path.starts_with(prefix.as_ref()))
}

/// Route predicate over method and path.
#[derive(Debug, Clone)]
pub struct RoutePredicate {
    excluded_prefixes: Vec<String>,
}

impl RoutePredicate {
    /// Creates a predicate excluding the given prefixes.
    #[must_use]
    pub fn new(excluded_prefixes: Vec<String>) -> Self {
        Self { excluded_prefixes }
    }

    /// Returns true if the pipeline should handle this request. Only GET is
    /// handled.
    #[must_use]
    pub fn matches(&self, method: &Method, path: &str) -> bool {
        *method == Method::GET && is_covered(path, &self.excluded_prefixes)
    }

    /// Returns the excluded prefixes.
    #[must_use]
    pub fn excluded_prefixes(&self) -> &[String] {
        &self.excluded_prefixes
    }
}

impl Default for RoutePredicate {
    fn default() -> Self {
        Self::from(&RouteConfig::default())
    }
}

impl From<&RouteConfig> for RoutePredicate {
    fn from(config: &RouteConfig) -> Self {
        Self::new(config.excluded_prefixes.clone())
    }
}
