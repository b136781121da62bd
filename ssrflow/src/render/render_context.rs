//! Per-render side channel for redirects and in-app not-found routes.

/// A routing decision the renderer made while rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderSignal {
    /// The route resolves to another location.
    Redirect {
        /// Target of the redirect.
        location: String,
        /// Whether the redirect is permanent (301) or temporary (302).
        permanent: bool,
    },
    /// The application's router found no match for the URL.
    NotFound,
}

/// Collects routing decisions made during a single render.
///
/// A fresh context is created for every render; the last signal recorded
/// wins.
#[derive(Debug, Clone, Default)]
pub struct ServerRenderContext {
    url: String,
    signal: Option<RenderSignal>,
}

impl ServerRenderContext {
    /// Creates an empty render context for `url`.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            signal: None,
        }
    }

    /// Returns the URL being rendered.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Records a redirect.
    pub fn redirect(&mut self, location: impl Into<String>, permanent: bool) {
        self.signal = Some(RenderSignal::Redirect {
            location: location.into(),
            permanent,
        });
    }

    /// Records that no in-app route matched.
    pub fn not_found(&mut self) {
        self.signal = Some(RenderSignal::NotFound);
    }

    /// Returns the recorded signal, if any.
    #[must_use]
    pub fn signal(&self) -> Option<&RenderSignal> {
        self.signal.as_ref()
    }

    /// Consumes the context, returning the recorded signal.
    #[must_use]
    pub fn into_signal(self) -> Option<RenderSignal> {
        self.signal
    }
}

/// Creates a [`ServerRenderContext`] for each render.
pub trait RenderContextFactory: Send + Sync {
    /// Creates a fresh render context for `url`.
    fn create(&self, url: &str) -> ServerRenderContext;
}

/// Factory producing empty render contexts.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultRenderContextFactory;

impl RenderContextFactory for DefaultRenderContextFactory {
    fn create(&self, url: &str) -> ServerRenderContext {
        ServerRenderContext::new(url)
    }
}
