//! Interfaces to the rendering side of the application.
//!
//! The pipeline never renders markup itself. It drives three collaborators:
//! - a [`RouteResolver`] turning a URL into a [`DataContext`]
//! - a [`RenderContextFactory`] producing a fresh [`ServerRenderContext`]
//! - a [`Renderer`] turning the application, data and URL into markup

mod application;
mod data;
mod markup;
mod render_context;

pub use application::{Application, ComponentRef};
pub use data::DataContext;
pub use markup::{data_markup, html_document};
pub use render_context::{
    DefaultRenderContextFactory, RenderContextFactory, RenderSignal, ServerRenderContext,
};

use crate::errors::{RenderError, ResolveError};
use async_trait::async_trait;

/// Markup produced by a successful render.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedMarkup {
    /// Markup placed inside `<head>`.
    pub head: String,
    /// Markup placed inside `<body>`.
    pub body: String,
}

impl RenderedMarkup {
    /// Creates rendered markup.
    #[must_use]
    pub fn new(head: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            head: head.into(),
            body: body.into(),
        }
    }
}

/// Resolves a URL against the application's route table.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RouteResolver: Send + Sync {
    /// Produces the data needed to render `url`.
    ///
    /// Returns [`ResolveError::NotFound`] when no route matches.
    async fn resolve(&self, url: &str) -> Result<DataContext, ResolveError>;
}

/// Synchronous server-side renderer.
///
/// Redirects and in-app not-found routes are reported through the
/// [`ServerRenderContext`] rather than the return value.
pub trait Renderer: Send + Sync {
    /// Renders the application for `url`.
    fn render(
        &self,
        app: &Application,
        render_ctx: &mut ServerRenderContext,
        data: &DataContext,
        url: &str,
    ) -> Result<RenderedMarkup, RenderError>;
}
