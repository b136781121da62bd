//! Request dispatch: route matching, context creation and step execution.

use super::RoutePredicate;
use crate::cache::{CacheStore, InMemoryCacheStore};
use crate::config::PipelineConfig;
use crate::context::PipelineContext;
use crate::core::{PipelineEvent, StepName, StepOutcome};
use crate::errors::SsrError;
use crate::events::{EventSink, NoOpEventSink};
use crate::observability::{Diagnostics, PerfTimer, RequestSnapshot};
use crate::render::{Application, Renderer, RouteResolver};
use crate::stages::{
    CacheFillStep, CacheLookupStep, DataContextStep, RenderingStep, Step, TransportStep,
    UserAgentStep,
};
use chrono::Utc;
use http::request::Parts;
use http::Response;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;

/// The SSR pipeline.
///
/// Shared by all requests. Each covered request gets its own
/// [`PipelineContext`]; the cache store and the diagnostics buffer are the
/// only state shared between requests.
pub struct SsrPipeline {
    app: Application,
    config: PipelineConfig,
    route: RoutePredicate,
    cache: Arc<dyn CacheStore>,
    steps: Vec<Box<dyn Step>>,
    event_sink: Arc<dyn EventSink>,
    diagnostics: Arc<Diagnostics>,
}

impl SsrPipeline {
    /// Starts building a pipeline.
    #[must_use]
    pub fn builder(
        app: Application,
        resolver: Arc<dyn RouteResolver>,
        renderer: Arc<dyn Renderer>,
    ) -> SsrPipelineBuilder {
        SsrPipelineBuilder::new(app, resolver, renderer)
    }

    /// Handles a request.
    ///
    /// Returns `Ok(None)` when the request is not covered and should be
    /// passed to the next handler. An `Err` is fatal for the request and
    /// means no response was produced.
    pub async fn handle(&self, request: &Parts) -> Result<Option<Response<String>>, SsrError> {
        if !self.route.matches(&request.method, request.uri.path()) {
            tracing::trace!(
                method = %request.method,
                path = request.uri.path(),
                "Passing request through"
            );
            return Ok(None);
        }
        self.run(request).await.map(Some)
    }

    /// Runs all six steps for a request without checking the route predicate.
    pub async fn run(&self, request: &Parts) -> Result<Response<String>, SsrError> {
        let timer = PerfTimer::start(self.config.observability.timer_name.as_str());
        let mut ctx =
            PipelineContext::new(request, &self.app).with_event_sink(self.event_sink.clone());

        let span = tracing::info_span!(
            "ssr_request",
            request_id = %ctx.request_id(),
            url = %ctx.url()
        );
        let result = self.run_steps(&mut ctx).instrument(span).await;

        let elapsed_ms = match &result {
            Ok(()) => timer.stop(&format!("{} - {}", ctx.status.as_u16(), ctx.url())),
            Err(e) => {
                let elapsed_ms = timer.elapsed_ms();
                tracing::error!(
                    request_id = %ctx.request_id(),
                    url = %ctx.url(),
                    error = %e,
                    code = e.code(),
                    elapsed_ms,
                    "Pipeline aborted"
                );
                elapsed_ms
            }
        };

        self.diagnostics.record(snapshot(&ctx, elapsed_ms));
        result?;

        ctx.emit(&PipelineEvent::request_finished(
            ctx.request_id(),
            ctx.status.as_u16(),
            ctx.state(),
            elapsed_ms,
        ));
        Ok(ctx.take_response()?)
    }

    async fn run_steps(&self, ctx: &mut PipelineContext<'_>) -> Result<(), SsrError> {
        for step in &self.steps {
            let name = step.name();
            let started = Instant::now();
            let outcome = step.run(ctx).await?;
            let duration_ms = started.elapsed().as_secs_f64() * 1000.0;

            match &outcome {
                StepOutcome::Completed => {
                    tracing::trace!(step = %name, duration_ms, "Step completed");
                    ctx.emit(&PipelineEvent::step_completed(ctx.request_id(), name, duration_ms));
                }
                StepOutcome::Skipped { reason } => {
                    tracing::trace!(step = %name, reason = %reason, "Step skipped");
                    ctx.emit(&PipelineEvent::step_skipped(ctx.request_id(), name, reason));
                }
            }
            ctx.record_step(name, outcome);
        }
        Ok(())
    }

    /// Returns the steps in execution order.
    #[must_use]
    pub fn step_names(&self) -> Vec<StepName> {
        self.steps.iter().map(|step| step.name()).collect()
    }

    /// Returns the route predicate.
    #[must_use]
    pub fn route(&self) -> &RoutePredicate {
        &self.route
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Returns the application.
    #[must_use]
    pub fn app(&self) -> &Application {
        &self.app
    }

    /// Returns the cache store.
    #[must_use]
    pub fn cache(&self) -> &Arc<dyn CacheStore> {
        &self.cache
    }

    /// Returns the diagnostics buffer.
    #[must_use]
    pub fn diagnostics(&self) -> &Arc<Diagnostics> {
        &self.diagnostics
    }
}

impl fmt::Debug for SsrPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SsrPipeline")
            .field("app", &self.app)
            .field("route", &self.route)
            .field("steps", &self.steps)
            .finish_non_exhaustive()
    }
}

fn snapshot(ctx: &PipelineContext<'_>, elapsed_ms: f64) -> RequestSnapshot {
    RequestSnapshot {
        request_id: ctx.request_id(),
        method: ctx.method().to_string(),
        path: ctx.url().to_string(),
        user_agent: ctx.user_agent().map(str::to_string),
        browser_type: ctx.browser_type,
        state: ctx.state(),
        status: ctx.status.as_u16(),
        hash: ctx.hash.clone(),
        elapsed_ms,
        finished_at: Utc::now(),
    }
}

/// Builder for [`SsrPipeline`].
pub struct SsrPipelineBuilder {
    app: Application,
    resolver: Arc<dyn RouteResolver>,
    renderer: Arc<dyn Renderer>,
    cache: Option<Arc<dyn CacheStore>>,
    config: PipelineConfig,
    event_sink: Arc<dyn EventSink>,
    diagnostics: Option<Arc<Diagnostics>>,
}

impl SsrPipelineBuilder {
    /// Creates a builder with default configuration, an in-memory cache and
    /// no event sink.
    #[must_use]
    pub fn new(
        app: Application,
        resolver: Arc<dyn RouteResolver>,
        renderer: Arc<dyn Renderer>,
    ) -> Self {
        Self {
            app,
            resolver,
            renderer,
            cache: None,
            config: PipelineConfig::default(),
            event_sink: Arc::new(NoOpEventSink),
            diagnostics: None,
        }
    }

    /// Sets the configuration.
    #[must_use]
    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the cache store.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<dyn CacheStore>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Sets the event sink.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.event_sink = sink;
        self
    }

    /// Sets the diagnostics buffer.
    #[must_use]
    pub fn with_diagnostics(mut self, diagnostics: Arc<Diagnostics>) -> Self {
        self.diagnostics = Some(diagnostics);
        self
    }

    /// Validates the configuration and assembles the pipeline.
    pub fn build(self) -> Result<SsrPipeline, SsrError> {
        self.config.validate()?;
        let config = self.config;

        let cache: Arc<dyn CacheStore> = match self.cache {
            Some(cache) => cache,
            None => Arc::new(InMemoryCacheStore::new(config.cache.max_entries)),
        };
        let diagnostics = self.diagnostics.unwrap_or_else(|| {
            Arc::new(Diagnostics::new(config.observability.diagnostics_capacity))
        });

        let steps: Vec<Box<dyn Step>> = vec![
            Box::new(UserAgentStep::new()),
            Box::new(CacheLookupStep::new(cache.clone(), config.cache.clone())),
            Box::new(DataContextStep::new(
                self.resolver,
                config.render.error_body.clone(),
            )),
            Box::new(RenderingStep::new(self.renderer, config.render.clone())),
            Box::new(TransportStep::new(config.render.html_lang.clone())),
            Box::new(CacheFillStep::new(cache.clone(), config.cache.clone())),
        ];

        Ok(SsrPipeline {
            app: self.app,
            route: RoutePredicate::from(&config.route),
            config,
            cache,
            steps,
            event_sink: self.event_sink,
            diagnostics,
        })
    }
}

impl fmt::Debug for SsrPipelineBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SsrPipelineBuilder")
            .field("app", &self.app)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
