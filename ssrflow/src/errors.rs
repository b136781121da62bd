//! Error types for the ssrflow pipeline.
//!
//! Most failures inside the pipeline are recoverable and are converted into a
//! degraded response at the step that observes them (cache errors become
//! misses, resolver misses become 404s, render failures become 500s). The
//! errors that escape [`SsrPipeline::handle`](crate::pipeline::SsrPipeline::handle)
//! are the fatal ones: they indicate a broken pipeline rather than a bad
//! request.

use std::collections::HashMap;
use thiserror::Error;

/// The main error type for ssrflow operations.
#[derive(Debug, Error)]
pub enum SsrError {
    /// A cache store operation failed.
    #[error("{0}")]
    Cache(#[from] CacheError),

    /// Route resolution failed.
    #[error("{0}")]
    Resolve(#[from] ResolveError),

    /// The rendering engine failed.
    #[error("{0}")]
    Render(#[from] RenderError),

    /// Writing the response failed.
    #[error("{0}")]
    Transport(#[from] TransportError),

    /// Invalid configuration.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// A generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SsrError {
    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Returns a stable error code for logs and diagnostics.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Cache(_) => "SSR-CACHE",
            Self::Resolve(ResolveError::NotFound { .. }) => "SSR-RESOLVE-404",
            Self::Resolve(_) => "SSR-RESOLVE",
            Self::Render(_) => "SSR-RENDER",
            Self::Transport(TransportError::AlreadySent) => "SSR-TRANSPORT-TWICE",
            Self::Transport(_) => "SSR-TRANSPORT",
            Self::Config(_) => "SSR-CONFIG",
            Self::Internal(_) => "SSR-INTERNAL",
        }
    }

    /// Converts to a JSON-friendly map.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("code".to_string(), serde_json::json!(self.code()));
        map.insert("message".to_string(), serde_json::json!(self.to_string()));
        map
    }
}

/// Errors raised by a [`CacheStore`](crate::cache::CacheStore).
#[derive(Debug, Clone, Error)]
pub enum CacheError {
    /// The backing store could not be reached.
    #[error("Cache store unavailable: {0}")]
    Unavailable(String),

    /// A stored value could not be encoded or decoded.
    #[error("Cache entry for '{key}' is malformed: {reason}")]
    Malformed {
        /// The cache key.
        key: String,
        /// Why decoding failed.
        reason: String,
    },
}

impl CacheError {
    /// Creates an unavailable error.
    #[must_use]
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable(reason.into())
    }
}

/// Errors raised by a [`RouteResolver`](crate::render::RouteResolver).
#[derive(Debug, Clone, Error)]
pub enum ResolveError {
    /// No route matches the URL.
    #[error("No route matches '{url}'")]
    NotFound {
        /// The unmatched URL.
        url: String,
    },

    /// A route matched but its data could not be produced.
    #[error("Failed to resolve data for '{url}': {reason}")]
    Failed {
        /// The URL being resolved.
        url: String,
        /// The underlying failure.
        reason: String,
    },
}

impl ResolveError {
    /// Creates a not-found error.
    #[must_use]
    pub fn not_found(url: impl Into<String>) -> Self {
        Self::NotFound { url: url.into() }
    }

    /// Creates a resolution failure.
    #[must_use]
    pub fn failed(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Failed {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Returns true for a route miss.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Errors raised by a [`Renderer`](crate::render::Renderer).
#[derive(Debug, Clone, Error)]
pub enum RenderError {
    /// The engine reported a failure.
    #[error("Render failed for '{url}': {reason}")]
    Failed {
        /// The URL being rendered.
        url: String,
        /// The engine's message.
        reason: String,
    },

    /// The engine panicked.
    #[error("Renderer panicked while rendering '{url}': {message}")]
    Panicked {
        /// The URL being rendered.
        url: String,
        /// The panic payload, if it was a string.
        message: String,
    },

    /// The data context could not be serialised for rehydration.
    #[error("Could not serialise state for '{url}': {reason}")]
    State {
        /// The URL being rendered.
        url: String,
        /// The serialisation error.
        reason: String,
    },
}

impl RenderError {
    /// Creates a render failure.
    #[must_use]
    pub fn failed(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Failed {
            url: url.into(),
            reason: reason.into(),
        }
    }
}

/// Errors raised while writing the HTTP response.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// A response was already sent for this request.
    #[error("Response already sent for this request")]
    AlreadySent,

    /// The pipeline finished without sending a response.
    #[error("Pipeline finished without sending a response")]
    NotSent,

    /// The response could not be assembled.
    #[error("Invalid response: {0}")]
    Invalid(String),
}

/// Raised when configuration is rejected.
#[derive(Debug, Clone, Error)]
#[error("Invalid configuration: {}", problems.join("; "))]
pub struct ConfigError {
    /// Every problem found.
    pub problems: Vec<String>,
}

impl ConfigError {
    /// Creates a configuration error from a list of problems.
    #[must_use]
    pub fn new(problems: Vec<String>) -> Self {
        Self { problems }
    }

    /// Creates a configuration error with a single problem.
    #[must_use]
    pub fn single(problem: impl Into<String>) -> Self {
        Self {
            problems: vec![problem.into()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err: SsrError = ResolveError::not_found("/missing").into();
        assert_eq!(err.code(), "SSR-RESOLVE-404");

        let err: SsrError = TransportError::AlreadySent.into();
        assert_eq!(err.code(), "SSR-TRANSPORT-TWICE");

        let err: SsrError = CacheError::unavailable("down").into();
        assert_eq!(err.code(), "SSR-CACHE");
    }

    #[test]
    fn test_error_to_dict() {
        let err = SsrError::internal("boom");
        let dict = err.to_dict();

        assert_eq!(dict.get("code").unwrap(), "SSR-INTERNAL");
        assert_eq!(dict.get("message").unwrap(), "Internal error: boom");
    }

    #[test]
    fn test_config_error_joins_problems() {
        let err = ConfigError::new(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(err.to_string(), "Invalid configuration: a; b");
    }

    #[test]
    fn test_resolve_error_kind() {
        assert!(ResolveError::not_found("/x").is_not_found());
        assert!(!ResolveError::failed("/x", "db down").is_not_found());
    }
}
