//! Step 4: server-side render of the application.

use super::Step;
use crate::config::RenderConfig;
use crate::context::PipelineContext;
use crate::core::{PipelineEvent, RenderState, StepName, StepOutcome};
use crate::errors::{RenderError, SsrError};
use crate::render::{data_markup, DataContext, RenderSignal, Renderer};
use async_trait::async_trait;
use http::StatusCode;
use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// Renders the application and sets `head`, `body`, `data_markup`, and on a
/// redirect `location`.
///
/// Runs for unresolved requests and for cached not-found markers. A render
/// error or panic becomes a 500 page built from the configured error body.
pub struct RenderingStep {
    renderer: Arc<dyn Renderer>,
    config: RenderConfig,
}

impl RenderingStep {
    /// Creates the step.
    #[must_use]
    pub fn new(renderer: Arc<dyn Renderer>, config: RenderConfig) -> Self {
        Self { renderer, config }
    }

    fn fail(&self, ctx: &mut PipelineContext<'_>, error: &RenderError) -> Result<(), SsrError> {
        tracing::error!(
            request_id = %ctx.request_id(),
            url = %ctx.url(),
            error = %error,
            "Render failed"
        );
        ctx.emit(&PipelineEvent::render_failed(ctx.request_id(), &error.to_string()));
        ctx.status = StatusCode::INTERNAL_SERVER_ERROR;
        ctx.head = Some(String::new());
        ctx.body = Some(self.config.error_body.clone());
        ctx.location = None;
        ctx.transition(RenderState::RenderError)
    }
}

impl fmt::Debug for RenderingStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderingStep")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[async_trait]
impl Step for RenderingStep {
    fn name(&self) -> StepName {
        StepName::Rendering
    }

    async fn run(&self, ctx: &mut PipelineContext<'_>) -> Result<StepOutcome, SsrError> {
        match ctx.state() {
            RenderState::Unresolved | RenderState::CacheHit404 => {}
            RenderState::CacheHit => return Ok(StepOutcome::skipped("served from cache")),
            state => return Ok(StepOutcome::skipped(format!("already {state}"))),
        }

        let url = ctx.url().to_string();
        let data = ctx.data_context.clone().unwrap_or_else(DataContext::empty);
        let mut render_ctx = ctx.app().context_factory().create(&url);

        let result = {
            let app = ctx.app();
            let renderer = &self.renderer;
            catch_unwind(AssertUnwindSafe(|| {
                renderer.render(app, &mut render_ctx, &data, &url)
            }))
        };

        let markup = match result {
            Ok(Ok(markup)) => markup,
            Ok(Err(e)) => {
                self.fail(ctx, &e)?;
                return Ok(StepOutcome::Completed);
            }
            Err(payload) => {
                let e = RenderError::Panicked {
                    url,
                    message: panic_message(payload.as_ref()),
                };
                self.fail(ctx, &e)?;
                return Ok(StepOutcome::Completed);
            }
        };

        match render_ctx.into_signal() {
            Some(RenderSignal::Redirect {
                location,
                permanent,
            }) if ctx.state() == RenderState::Unresolved => {
                ctx.status = if permanent {
                    StatusCode::MOVED_PERMANENTLY
                } else {
                    StatusCode::FOUND
                };
                tracing::debug!(
                    request_id = %ctx.request_id(),
                    location = %location,
                    status = ctx.status.as_u16(),
                    "Render redirected"
                );
                ctx.location = Some(location);
                ctx.transition(RenderState::Redirected)?;
                return Ok(StepOutcome::Completed);
            }
            Some(RenderSignal::Redirect { location, .. }) => {
                tracing::debug!(
                    request_id = %ctx.request_id(),
                    location = %location,
                    "Ignoring redirect for cached not-found"
                );
            }
            Some(RenderSignal::NotFound) => {
                ctx.status = StatusCode::NOT_FOUND;
            }
            None => {}
        }

        let rehydration = match data_markup(&self.config.state_variable, &data) {
            Ok(markup) => markup,
            Err(e) => {
                let e = RenderError::State {
                    url,
                    reason: e.to_string(),
                };
                self.fail(ctx, &e)?;
                return Ok(StepOutcome::Completed);
            }
        };

        ctx.head = Some(markup.head);
        ctx.body = Some(format!("{}{rehydration}", markup.body));
        ctx.data_markup = Some(rehydration);
        ctx.data_context = Some(data);
        if ctx.state() == RenderState::Unresolved {
            ctx.transition(RenderState::Rendered)?;
        }
        Ok(StepOutcome::Completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RenderedMarkup;
    use crate::testing::{request, test_app, FnRenderer};
    use pretty_assertions::assert_eq;

    fn step_with(renderer: FnRenderer) -> RenderingStep {
        RenderingStep::new(Arc::new(renderer), RenderConfig::default())
    }

    #[tokio::test]
    async fn test_normal_render() {
        let parts = request("/about");
        let app = test_app();
        let mut ctx = PipelineContext::new(&parts, &app);
        ctx.data_context = Some(DataContext::for_route("about"));

        step_with(FnRenderer::static_markup("<h>", "<b>"))
            .run(&mut ctx)
            .await
            .unwrap();

        assert_eq!(ctx.state(), RenderState::Rendered);
        assert_eq!(ctx.status, StatusCode::OK);
        assert_eq!(ctx.head.as_deref(), Some("<h>"));
        let markup = ctx.data_markup.clone().unwrap();
        assert!(markup.starts_with("<script>window.__SSR_STATE__="));
        assert_eq!(ctx.body, Some(format!("<b>{markup}")));
    }

    #[tokio::test]
    async fn test_keeps_404_from_route_miss() {
        let parts = request("/missing");
        let app = test_app();
        let mut ctx = PipelineContext::new(&parts, &app);
        ctx.status = StatusCode::NOT_FOUND;
        ctx.data_context = Some(DataContext::empty());

        step_with(FnRenderer::static_markup("", "<h1>Not found</h1>"))
            .run(&mut ctx)
            .await
            .unwrap();

        assert_eq!(ctx.state(), RenderState::Rendered);
        assert_eq!(ctx.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_in_app_not_found_signal() {
        let parts = request("/users/404");
        let app = test_app();
        let mut ctx = PipelineContext::new(&parts, &app);
        let renderer = FnRenderer::new(|_, render_ctx, _, _| {
            render_ctx.not_found();
            Ok(RenderedMarkup::new("", "gone"))
        });

        step_with(renderer).run(&mut ctx).await.unwrap();

        assert_eq!(ctx.status, StatusCode::NOT_FOUND);
        assert_eq!(ctx.state(), RenderState::Rendered);
    }

    #[tokio::test]
    async fn test_temporary_redirect() {
        let parts = request("/old");
        let app = test_app();
        let mut ctx = PipelineContext::new(&parts, &app);

        step_with(FnRenderer::redirecting("/new", false))
            .run(&mut ctx)
            .await
            .unwrap();

        assert_eq!(ctx.state(), RenderState::Redirected);
        assert_eq!(ctx.status, StatusCode::FOUND);
        assert_eq!(ctx.location.as_deref(), Some("/new"));
        assert!(ctx.body.is_none());
    }

    #[tokio::test]
    async fn test_permanent_redirect() {
        let parts = request("/old");
        let app = test_app();
        let mut ctx = PipelineContext::new(&parts, &app);

        step_with(FnRenderer::redirecting("/new", true))
            .run(&mut ctx)
            .await
            .unwrap();

        assert_eq!(ctx.status, StatusCode::MOVED_PERMANENTLY);
    }

    #[tokio::test]
    async fn test_render_error_becomes_500() {
        let parts = request("/about");
        let app = test_app();
        let mut ctx = PipelineContext::new(&parts, &app);

        step_with(FnRenderer::failing("template missing"))
            .run(&mut ctx)
            .await
            .unwrap();

        assert_eq!(ctx.state(), RenderState::RenderError);
        assert_eq!(ctx.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(ctx.body.as_deref(), Some(RenderConfig::default().error_body.as_str()));
        assert!(ctx.data_markup.is_none());
    }

    #[tokio::test]
    async fn test_panic_becomes_500() {
        let parts = request("/about");
        let app = test_app();
        let mut ctx = PipelineContext::new(&parts, &app);
        let renderer = FnRenderer::new(|_, _, _, _| panic!("component exploded"));

        step_with(renderer).run(&mut ctx).await.unwrap();

        assert_eq!(ctx.state(), RenderState::RenderError);
        assert_eq!(ctx.status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_skipped_on_cache_hit() {
        let parts = request("/about");
        let app = test_app();
        let mut ctx = PipelineContext::new(&parts, &app);
        ctx.head = Some("<cached-h>".to_string());
        ctx.body = Some("<cached-b>".to_string());
        ctx.transition(RenderState::CacheHit).unwrap();

        let renderer = Arc::new(FnRenderer::static_markup("<h>", "<b>"));
        let step = RenderingStep::new(renderer.clone(), RenderConfig::default());
        let outcome = step.run(&mut ctx).await.unwrap();

        assert!(outcome.is_skipped());
        assert_eq!(renderer.call_count(), 0);
        assert_eq!(ctx.body.as_deref(), Some("<cached-b>"));
    }

    #[tokio::test]
    async fn test_cached_not_found_renders_with_empty_data() {
        let parts = request("/missing");
        let app = test_app();
        let mut ctx = PipelineContext::new(&parts, &app);
        ctx.status = StatusCode::NOT_FOUND;
        ctx.transition(RenderState::CacheHit404).unwrap();

        let renderer = FnRenderer::new(|_, _, data, _| {
            assert!(data.is_empty());
            Ok(RenderedMarkup::new("", "<h1>Not found</h1>"))
        });
        step_with(renderer).run(&mut ctx).await.unwrap();

        assert_eq!(ctx.state(), RenderState::CacheHit404);
        assert_eq!(ctx.status, StatusCode::NOT_FOUND);
        assert!(ctx.body.as_deref().is_some_and(|b| b.starts_with("<h1>Not found</h1>")));
    }

    #[tokio::test]
    async fn test_skipped_after_resolution_failure() {
        let parts = request("/flaky");
        let app = test_app();
        let mut ctx = PipelineContext::new(&parts, &app);
        ctx.transition(RenderState::RenderError).unwrap();

        let outcome = step_with(FnRenderer::static_markup("", ""))
            .run(&mut ctx)
            .await
            .unwrap();
        assert!(outcome.is_skipped());
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
        let payload: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(payload.as_ref()), "unknown panic");
    }
}
