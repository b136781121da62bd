//! Step 2: cache key derivation and read-through lookup.

use super::Step;
use crate::cache::{derive_cache_key, CacheEntry, CacheStore};
use crate::config::CacheConfig;
use crate::context::PipelineContext;
use crate::core::{PipelineEvent, RenderState, StepName, StepOutcome};
use crate::errors::SsrError;
use async_trait::async_trait;
use http::StatusCode;
use std::fmt;
use std::sync::Arc;

/// Sets `hash` and, on a hit, the cached markup and status.
///
/// A store that fails on read is treated as a miss.
pub struct CacheLookupStep {
    store: Arc<dyn CacheStore>,
    config: CacheConfig,
}

impl CacheLookupStep {
    /// Creates the step.
    #[must_use]
    pub fn new(store: Arc<dyn CacheStore>, config: CacheConfig) -> Self {
        Self { store, config }
    }

    fn key_for(&self, ctx: &PipelineContext<'_>) -> String {
        let browser = if self.config.partition_by_browser {
            Some(ctx.browser_type.unwrap_or_default())
        } else {
            None
        };
        derive_cache_key(&self.config.key_prefix, ctx.url(), browser)
    }
}

impl fmt::Debug for CacheLookupStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheLookupStep")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Step for CacheLookupStep {
    fn name(&self) -> StepName {
        StepName::CacheLookup
    }

    async fn run(&self, ctx: &mut PipelineContext<'_>) -> Result<StepOutcome, SsrError> {
        let hash = self.key_for(ctx);
        ctx.hash = Some(hash.clone());

        if !self.config.enabled {
            return Ok(StepOutcome::skipped("cache disabled"));
        }

        let entry = match self.store.get(&hash).await {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(
                    request_id = %ctx.request_id(),
                    hash = %hash,
                    error = %e,
                    "Cache read failed, treating as miss"
                );
                ctx.emit(&PipelineEvent::cache_error(ctx.request_id(), "get", &e.to_string()));
                None
            }
        };

        match entry {
            Some(CacheEntry::Page(page)) => {
                ctx.head = Some(page.head);
                ctx.body = Some(page.body);
                ctx.status = StatusCode::from_u16(page.status).unwrap_or(StatusCode::OK);
                ctx.transition(RenderState::CacheHit)?;
                ctx.emit(&PipelineEvent::cache_hit(ctx.request_id(), &hash, false));
            }
            Some(CacheEntry::NotFound) => {
                ctx.status = StatusCode::NOT_FOUND;
                ctx.transition(RenderState::CacheHit404)?;
                ctx.emit(&PipelineEvent::cache_hit(ctx.request_id(), &hash, true));
            }
            None => {
                ctx.emit(&PipelineEvent::cache_miss(ctx.request_id(), &hash));
            }
        }

        tracing::debug!(
            request_id = %ctx.request_id(),
            hash = %hash,
            state = %ctx.state(),
            "Cache lookup finished"
        );
        Ok(StepOutcome::Completed)
    }
}
