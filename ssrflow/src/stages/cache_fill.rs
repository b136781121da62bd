//! Step 6: write-through of freshly rendered pages.

use super::Step;
use crate::cache::{CacheEntry, CacheStore, CachedPage};
use crate::config::CacheConfig;
use crate::context::PipelineContext;
use crate::core::{PipelineEvent, RenderState, StepName, StepOutcome};
use crate::errors::SsrError;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// Stores fresh 200 pages and fresh 404 markers.
///
/// Cache hits, redirects and errors are never written. Write failures are
/// logged and dropped; the response has already been sent.
pub struct CacheFillStep {
    store: Arc<dyn CacheStore>,
    config: CacheConfig,
}

impl CacheFillStep {
    /// Creates the step.
    #[must_use]
    pub fn new(store: Arc<dyn CacheStore>, config: CacheConfig) -> Self {
        Self { store, config }
    }
}

impl fmt::Debug for CacheFillStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheFillStep")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Step for CacheFillStep {
    fn name(&self) -> StepName {
        StepName::CacheFill
    }

    async fn run(&self, ctx: &mut PipelineContext<'_>) -> Result<StepOutcome, SsrError> {
        if !self.config.enabled {
            return Ok(StepOutcome::skipped("cache disabled"));
        }
        if ctx.is_from_cache() || ctx.is_404_from_cache() {
            return Ok(StepOutcome::skipped("served from cache"));
        }
        if ctx.is_redirect() {
            return Ok(StepOutcome::skipped("redirect"));
        }
        if ctx.state() != RenderState::Rendered {
            return Ok(StepOutcome::skipped(format!("not cacheable in state {}", ctx.state())));
        }
        let Some(hash) = ctx.hash.clone() else {
            return Ok(StepOutcome::skipped("no cache key"));
        };

        let (entry, ttl) = match ctx.status.as_u16() {
            200 => (
                CacheEntry::Page(CachedPage::ok(
                    ctx.head.clone().unwrap_or_default(),
                    ctx.body.clone().unwrap_or_default(),
                )),
                self.config.page_ttl(),
            ),
            404 => (CacheEntry::NotFound, self.config.not_found_ttl()),
            status => {
                return Ok(StepOutcome::skipped(format!("status {status} not cacheable")));
            }
        };

        let not_found = entry.is_not_found();
        match self.store.set(&hash, entry, ttl).await {
            Ok(()) => {
                tracing::debug!(
                    request_id = %ctx.request_id(),
                    hash = %hash,
                    not_found,
                    ttl_secs = ttl.as_secs(),
                    "Cached response"
                );
                ctx.emit(&PipelineEvent::cache_stored(ctx.request_id(), &hash, not_found));
            }
            Err(e) => {
                tracing::warn!(
                    request_id = %ctx.request_id(),
                    hash = %hash,
                    error = %e,
                    "Cache write failed"
                );
                ctx.emit(&PipelineEvent::cache_error(ctx.request_id(), "set", &e.to_string()));
            }
        }
        Ok(StepOutcome::Completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MockCacheStore;
    use crate::testing::{request, test_app, FailingCacheStore, RecordingCacheStore};
    use http::StatusCode;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn rendered<'a>(
        parts: &'a http::request::Parts,
        app: &'a crate::render::Application,
        status: StatusCode,
    ) -> PipelineContext<'a> {
        let mut ctx = PipelineContext::new(parts, app);
        ctx.hash = Some("ssr:abc".to_string());
        ctx.head = Some("<h>".to_string());
        ctx.body = Some("<b>".to_string());
        ctx.status = status;
        ctx.transition(RenderState::Rendered).unwrap();
        ctx
    }

    #[tokio::test]
    async fn test_stores_fresh_page() {
        let parts = request("/about");
        let app = test_app();
        let mut ctx = rendered(&parts, &app, StatusCode::OK);
        let store = Arc::new(RecordingCacheStore::new());

        CacheFillStep::new(store.clone(), CacheConfig::default())
            .run(&mut ctx)
            .await
            .unwrap();

        assert_eq!(
            store.writes(),
            vec![(
                "ssr:abc".to_string(),
                CacheEntry::Page(CachedPage::ok("<h>", "<b>")),
                Duration::from_secs(3600),
            )]
        );
    }

    #[tokio::test]
    async fn test_stores_not_found_marker() {
        let parts = request("/missing");
        let app = test_app();
        let mut ctx = rendered(&parts, &app, StatusCode::NOT_FOUND);
        let store = Arc::new(RecordingCacheStore::new());

        CacheFillStep::new(store.clone(), CacheConfig::default())
            .run(&mut ctx)
            .await
            .unwrap();

        let writes = store.writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].1, CacheEntry::NotFound);
        assert_eq!(writes[0].2, Duration::from_secs(600));
    }

    #[tokio::test]
    async fn test_never_writes_cache_hits() {
        let mut store = MockCacheStore::new();
        store.expect_set().never();
        let step = CacheFillStep::new(Arc::new(store), CacheConfig::default());

        let parts = request("/about");
        let app = test_app();

        let mut hit = PipelineContext::new(&parts, &app);
        hit.hash = Some("ssr:abc".to_string());
        hit.transition(RenderState::CacheHit).unwrap();
        assert!(step.run(&mut hit).await.unwrap().is_skipped());

        let mut hit_404 = PipelineContext::new(&parts, &app);
        hit_404.hash = Some("ssr:abc".to_string());
        hit_404.status = StatusCode::NOT_FOUND;
        hit_404.transition(RenderState::CacheHit404).unwrap();
        assert!(step.run(&mut hit_404).await.unwrap().is_skipped());
    }

    #[tokio::test]
    async fn test_never_writes_redirects_or_errors() {
        let mut store = MockCacheStore::new();
        store.expect_set().never();
        let step = CacheFillStep::new(Arc::new(store), CacheConfig::default());

        let parts = request("/old");
        let app = test_app();

        let mut redirect = PipelineContext::new(&parts, &app);
        redirect.hash = Some("ssr:abc".to_string());
        redirect.status = StatusCode::FOUND;
        redirect.transition(RenderState::Redirected).unwrap();
        assert!(step.run(&mut redirect).await.unwrap().is_skipped());

        let mut failed = PipelineContext::new(&parts, &app);
        failed.hash = Some("ssr:abc".to_string());
        failed.status = StatusCode::INTERNAL_SERVER_ERROR;
        failed.transition(RenderState::RenderError).unwrap();
        assert!(step.run(&mut failed).await.unwrap().is_skipped());
    }

    #[tokio::test]
    async fn test_write_failure_is_swallowed() {
        let parts = request("/about");
        let app = test_app();
        let mut ctx = rendered(&parts, &app, StatusCode::OK);
        let store = Arc::new(FailingCacheStore::new());

        let outcome = CacheFillStep::new(store.clone(), CacheConfig::default())
            .run(&mut ctx)
            .await
            .unwrap();

        assert_eq!(outcome, StepOutcome::Completed);
        assert_eq!(store.set_count(), 1);
    }

    #[tokio::test]
    async fn test_disabled_cache() {
        let parts = request("/about");
        let app = test_app();
        let mut ctx = rendered(&parts, &app, StatusCode::OK);
        let store = Arc::new(RecordingCacheStore::new());

        let outcome = CacheFillStep::new(store.clone(), CacheConfig::disabled())
            .run(&mut ctx)
            .await
            .unwrap();

        assert!(outcome.is_skipped());
        assert_eq!(store.write_count(), 0);
    }
}
