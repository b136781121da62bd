//! axum integration for the SSR pipeline.
//!
//! [`ssr_middleware`] runs the pipeline for covered GET requests and hands
//! everything else to the next handler, so API and asset routes keep
//! working behind it.

use crate::observability::RequestSnapshot;
use crate::pipeline::SsrPipeline;
use axum::{
    body::Body,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{Html, IntoResponse, Response},
    Json, Router,
};
use std::sync::Arc;

/// Middleware rendering covered requests through the pipeline.
///
/// A fatal pipeline error becomes a 500 carrying the configured error body.
pub async fn ssr_middleware(
    State(pipeline): State<Arc<SsrPipeline>>,
    req: Request,
    next: Next,
) -> Response {
    let (parts, body) = req.into_parts();

    match pipeline.handle(&parts).await {
        Ok(Some(response)) => response.map(Body::from),
        Ok(None) => next.run(Request::from_parts(parts, body)).await,
        Err(e) => {
            tracing::error!(
                path = parts.uri.path(),
                error = %e,
                code = e.code(),
                "SSR request failed"
            );
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(pipeline.config().render.error_body.clone()),
            )
                .into_response()
        }
    }
}

/// Handler returning recent request snapshots, newest first.
pub async fn diagnostics_handler(
    State(pipeline): State<Arc<SsrPipeline>>,
) -> Json<Vec<RequestSnapshot>> {
    Json(pipeline.diagnostics().recent())
}

/// Extension for mounting the pipeline on an axum [`Router`].
pub trait SsrRouterExt {
    /// Wraps every route in [`ssr_middleware`].
    #[must_use]
    fn with_ssr(self, pipeline: Arc<SsrPipeline>) -> Self;
}

impl<S> SsrRouterExt for Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_ssr(self, pipeline: Arc<SsrPipeline>) -> Self {
        self.layer(axum::middleware::from_fn_with_state(pipeline, ssr_middleware))
    }
}
