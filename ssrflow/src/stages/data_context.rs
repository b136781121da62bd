//! Step 3: route resolution into render data.

use super::Step;
use crate::context::PipelineContext;
use crate::core::{PipelineEvent, RenderState, StepName, StepOutcome};
use crate::errors::{ResolveError, SsrError};
use crate::render::{DataContext, RouteResolver};
use async_trait::async_trait;
use http::StatusCode;
use std::fmt;
use std::sync::Arc;

/// Sets `data_context` for an unresolved request.
///
/// A route miss sets status 404 and an empty data context so rendering can
/// still produce a not-found page. Any other resolver failure moves the
/// request to [`RenderState::RenderError`].
pub struct DataContextStep {
    resolver: Arc<dyn RouteResolver>,
    error_body: String,
}

impl DataContextStep {
    /// Creates the step. `error_body` is served if resolution fails.
    #[must_use]
    pub fn new(resolver: Arc<dyn RouteResolver>, error_body: impl Into<String>) -> Self {
        Self {
            resolver,
            error_body: error_body.into(),
        }
    }
}

impl fmt::Debug for DataContextStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataContextStep").finish_non_exhaustive()
    }
}

#[async_trait]
impl Step for DataContextStep {
    fn name(&self) -> StepName {
        StepName::DataContext
    }

    async fn run(&self, ctx: &mut PipelineContext<'_>) -> Result<StepOutcome, SsrError> {
        if ctx.is_from_cache() {
            return Ok(StepOutcome::skipped("served from cache"));
        }
        if ctx.is_404_from_cache() {
            return Ok(StepOutcome::skipped("cached not-found"));
        }

        match self.resolver.resolve(ctx.url()).await {
            Ok(data) => {
                ctx.data_context = Some(data);
            }
            Err(ResolveError::NotFound { .. }) => {
                tracing::debug!(
                    request_id = %ctx.request_id(),
                    url = %ctx.url(),
                    "No route matched"
                );
                ctx.status = StatusCode::NOT_FOUND;
                ctx.data_context = Some(DataContext::empty());
            }
            Err(e) => {
                tracing::error!(
                    request_id = %ctx.request_id(),
                    url = %ctx.url(),
                    error = %e,
                    "Route resolution failed"
                );
                ctx.emit(&PipelineEvent::render_failed(ctx.request_id(), &e.to_string()));
                ctx.status = StatusCode::INTERNAL_SERVER_ERROR;
                ctx.head = Some(String::new());
                ctx.body = Some(self.error_body.clone());
                ctx.transition(RenderState::RenderError)?;
            }
        }
        Ok(StepOutcome::Completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::MockRouteResolver;
    use crate::testing::{request, test_app, StaticResolver};

    fn step_with(resolver: StaticResolver) -> DataContextStep {
        DataContextStep::new(Arc::new(resolver), "<h1>500</h1>")
    }

    #[tokio::test]
    async fn test_resolves_route() {
        let resolver = StaticResolver::new()
            .with_route("/about", DataContext::for_route("about").with_locale("en"));
        let parts = request("/about");
        let app = test_app();
        let mut ctx = PipelineContext::new(&parts, &app);

        step_with(resolver).run(&mut ctx).await.unwrap();

        let data = ctx.data_context.as_ref().unwrap();
        assert_eq!(data.route.as_deref(), Some("about"));
        assert_eq!(ctx.status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_route_miss_is_404_with_empty_data() {
        let parts = request("/missing");
        let app = test_app();
        let mut ctx = PipelineContext::new(&parts, &app);

        step_with(StaticResolver::new()).run(&mut ctx).await.unwrap();

        assert_eq!(ctx.status, StatusCode::NOT_FOUND);
        assert!(ctx.data_context.as_ref().is_some_and(DataContext::is_empty));
        assert_eq!(ctx.state(), RenderState::Unresolved);
    }

    #[tokio::test]
    async fn test_resolver_failure_is_render_error() {
        let resolver = StaticResolver::new().with_failure("/flaky", "db down");
        let parts = request("/flaky");
        let app = test_app();
        let mut ctx = PipelineContext::new(&parts, &app);

        step_with(resolver).run(&mut ctx).await.unwrap();

        assert_eq!(ctx.state(), RenderState::RenderError);
        assert_eq!(ctx.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(ctx.body.as_deref(), Some("<h1>500</h1>"));
    }

    #[tokio::test]
    async fn test_skipped_on_cache_hit() {
        let mut resolver = MockRouteResolver::new();
        resolver.expect_resolve().never();

        let parts = request("/about");
        let app = test_app();
        let mut ctx = PipelineContext::new(&parts, &app);
        ctx.transition(RenderState::CacheHit).unwrap();

        let step = DataContextStep::new(Arc::new(resolver), "");
        let outcome = step.run(&mut ctx).await.unwrap();

        assert!(outcome.is_skipped());
        assert!(ctx.data_context.is_none());
    }

    #[tokio::test]
    async fn test_skipped_on_cached_not_found() {
        let mut resolver = MockRouteResolver::new();
        resolver.expect_resolve().never();

        let parts = request("/missing");
        let app = test_app();
        let mut ctx = PipelineContext::new(&parts, &app);
        ctx.transition(RenderState::CacheHit404).unwrap();

        let step = DataContextStep::new(Arc::new(resolver), "");
        assert!(step.run(&mut ctx).await.unwrap().is_skipped());
    }
}
