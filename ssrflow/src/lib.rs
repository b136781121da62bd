//! # Ssrflow
//!
//! A server-side rendering request pipeline.
//!
//! Ssrflow sits in front of a single-page application and, for page routes,
//! returns server-rendered HTML:
//!
//! - **Fixed six-step pipeline**: user-agent analysis, cache lookup, data
//!   context, rendering, transport, cache fill
//! - **Read-through page cache**: full pages and not-found markers, with a
//!   store outage degrading to a miss
//! - **Failure containment**: render errors and panics become a 500 page
//! - **Event-driven observability**: typed pipeline events, `tracing` logs
//!   and a bounded diagnostics buffer
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ssrflow::prelude::*;
//!
//! let pipeline = SsrPipeline::builder(app, Arc::new(resolver), Arc::new(renderer))
//!     .with_config(PipelineConfig::from_env()?)
//!     .build()?;
//!
//! let router = Router::new()
//!     .route("/api/health", get(health))
//!     .with_ssr(Arc::new(pipeline));
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod cache;
pub mod config;
pub mod context;
pub mod core;
pub mod errors;
pub mod events;
pub mod observability;
pub mod pipeline;
pub mod render;
pub mod stages;
pub mod testing;

#[cfg(feature = "server")]
pub mod server;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::cache::{CacheEntry, CacheStore, CachedPage, InMemoryCacheStore};
    pub use crate::config::{
        CacheConfig, ObservabilityConfig, PipelineConfig, RenderConfig, RouteConfig,
    };
    pub use crate::context::PipelineContext;
    pub use crate::core::{BrowserType, PipelineEvent, RenderState, StepName, StepOutcome};
    pub use crate::errors::{
        CacheError, ConfigError, RenderError, ResolveError, SsrError, TransportError,
    };
    pub use crate::events::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};
    pub use crate::observability::{init_tracing, Diagnostics, PerfTimer, RequestSnapshot};
    pub use crate::pipeline::{SsrPipeline, SsrPipelineBuilder};
    pub use crate::render::{
        Application, ComponentRef, DataContext, RenderContextFactory, RenderSignal,
        RenderedMarkup, Renderer, RouteResolver, ServerRenderContext,
    };
    pub use crate::stages::Step;

    #[cfg(feature = "server")]
    pub use crate::server::{ssr_middleware, SsrRouterExt};
}
