//! Data a route needs in order to render.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Application state resolved for a single URL.
///
/// The pipeline serialises this verbatim into the rehydration script, so it
/// should hold only what the client needs to resume.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataContext {
    /// Name of the matched route.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,
    /// Parameters extracted from the URL.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, String>,
    /// Store snapshot.
    #[serde(default)]
    pub state: serde_json::Value,
    /// Locale the page renders in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
}

impl DataContext {
    /// Creates an empty context, used for not-found and error pages.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a context for a matched route.
    #[must_use]
    pub fn for_route(route: impl Into<String>) -> Self {
        Self {
            route: Some(route.into()),
            ..Self::default()
        }
    }

    /// Adds a route parameter.
    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Sets the store snapshot.
    #[must_use]
    pub fn with_state(mut self, state: serde_json::Value) -> Self {
        self.state = state;
        self
    }

    /// Sets the locale.
    #[must_use]
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    /// Returns true if the context carries nothing at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.route.is_none()
            && self.params.is_empty()
            && self.state.is_null()
            && self.locale.is_none()
    }
}
