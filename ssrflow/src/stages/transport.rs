//! Step 5: writes the response.

use super::Step;
use crate::context::PipelineContext;
use crate::core::{StepName, StepOutcome};
use crate::errors::{SsrError, TransportError};
use crate::render::html_document;
use async_trait::async_trait;
use http::{header, HeaderValue, Response};

/// Response header carrying `HIT` or `MISS`.
pub const X_CACHE: &str = "x-cache";
/// Response header carrying the request id.
pub const X_REQUEST_ID: &str = "x-request-id";

const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// The only step that sends a response.
///
/// A request with `location` set gets a body-less redirect; everything else
/// gets `head` and `body` wrapped in an HTML document, whether they came
/// from the cache or from a fresh render.
#[derive(Debug, Clone)]
pub struct TransportStep {
    html_lang: String,
}

impl TransportStep {
    /// Creates the step.
    #[must_use]
    pub fn new(html_lang: impl Into<String>) -> Self {
        Self {
            html_lang: html_lang.into(),
        }
    }

    fn build(&self, ctx: &PipelineContext<'_>) -> Result<Response<String>, TransportError> {
        let builder = Response::builder()
            .status(ctx.status)
            .header(X_CACHE, ctx.state().cache_header())
            .header(X_REQUEST_ID, ctx.request_id().to_string());

        let response = if let Some(location) = ctx.location.as_deref() {
            let location = HeaderValue::from_str(location)
                .map_err(|e| TransportError::Invalid(format!("location header: {e}")))?;
            builder
                .header(header::LOCATION, location)
                .body(String::new())
        } else {
            let document = html_document(
                &self.html_lang,
                ctx.head.as_deref().unwrap_or_default(),
                ctx.body.as_deref().unwrap_or_default(),
            );
            builder
                .header(header::CONTENT_TYPE, HTML_CONTENT_TYPE)
                .body(document)
        };

        response.map_err(|e| TransportError::Invalid(e.to_string()))
    }
}

impl Default for TransportStep {
    fn default() -> Self {
        Self::new("en")
    }
}

#[async_trait]
impl Step for TransportStep {
    fn name(&self) -> StepName {
        StepName::Transport
    }

    async fn run(&self, ctx: &mut PipelineContext<'_>) -> Result<StepOutcome, SsrError> {
        if !ctx.state().is_terminal() {
            return Err(SsrError::internal(format!(
                "transport reached with unresolved request for '{}'",
                ctx.url()
            )));
        }

        let response = self.build(ctx)?;
        ctx.send(response)?;

        tracing::debug!(
            request_id = %ctx.request_id(),
            status = ctx.status.as_u16(),
            state = %ctx.state(),
            "Response sent"
        );
        Ok(StepOutcome::Completed)
    }
}
