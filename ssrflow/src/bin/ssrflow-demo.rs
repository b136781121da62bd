//! Demo server rendering a tiny three-page site through the SSR pipeline.
//!
//! ```text
//! SSRFLOW_BIND=127.0.0.1:3000 cargo run --bin ssrflow-demo
//! curl -i localhost:3000/about
//! curl -i localhost:3000/old        # 301 to /about
//! curl localhost:3000/api/ssr/diagnostics
//! ```

use anyhow::Context as _;
use async_trait::async_trait;
use axum::{routing::get, Router};
use ssrflow::events::LoggingEventSink;
use ssrflow::prelude::*;
use ssrflow::server::diagnostics_handler;
use std::sync::Arc;
use tokio::net::TcpListener;

#[derive(Debug)]
struct Site;

#[async_trait]
impl RouteResolver for Site {
    async fn resolve(&self, url: &str) -> Result<DataContext, ResolveError> {
        match url {
            "/" => Ok(DataContext::for_route("home").with_locale("en")),
            "/about" => Ok(DataContext::for_route("about")
                .with_locale("en")
                .with_state(serde_json::json!({ "team": ["ada", "grace"] }))),
            "/old" => Ok(DataContext::for_route("old")),
            _ => Err(ResolveError::not_found(url)),
        }
    }
}

#[derive(Debug)]
struct ShellRenderer;

impl Renderer for ShellRenderer {
    fn render(
        &self,
        app: &Application,
        render_ctx: &mut ServerRenderContext,
        data: &DataContext,
        url: &str,
    ) -> Result<RenderedMarkup, RenderError> {
        let page = match data.route.as_deref() {
            Some("home") => "<h1>Home</h1>",
            Some("about") => "<h1>About us</h1>",
            Some("old") => {
                render_ctx.redirect("/about", true);
                return Ok(RenderedMarkup::default());
            }
            _ => {
                render_ctx.not_found();
                "<h1>Page not found</h1>"
            }
        };
        Ok(RenderedMarkup::new(
            format!("<title>{url}</title>"),
            format!("<div id=\"{}\">{page}</div>", app.root().name()),
        ))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = PipelineConfig::from_env().context("loading configuration")?;
    init_tracing(&config.observability);

    let app = Application::new(
        ComponentRef::new("app", ()),
        ComponentRef::new("router", ()),
    );
    let pipeline = SsrPipeline::builder(app, Arc::new(Site), Arc::new(ShellRenderer))
        .with_config(config)
        .with_event_sink(Arc::new(LoggingEventSink::default()))
        .build()
        .context("building pipeline")?;
    let pipeline = Arc::new(pipeline);

    let router = Router::new()
        .route("/api/health", get(|| async { "ok" }))
        .route("/api/ssr/diagnostics", get(diagnostics_handler))
        .with_state(pipeline.clone())
        .with_ssr(pipeline);

    let bind = std::env::var("SSRFLOW_BIND").unwrap_or_else(|_| "127.0.0.1:3000".to_string());
    let listener = TcpListener::bind(&bind)
        .await
        .with_context(|| format!("binding {bind}"))?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    axum::serve(listener, router).await?;
    Ok(())
}
