//! The mutable record passed through every step of a request.

use super::ResponseSlot;
use crate::core::{BrowserType, PipelineEvent, RenderState, StepName, StepOutcome};
use crate::errors::{SsrError, TransportError};
use crate::events::{EventSink, NoOpEventSink};
use crate::render::{Application, DataContext};
use http::request::Parts;
use http::{header, Method, Response, StatusCode};
use std::sync::Arc;
use uuid::Uuid;

/// Per-request pipeline state.
///
/// Created by the dispatcher for one request and dropped once the response
/// has been handed back. The request head and the application are borrowed
/// from the caller for the duration of the request.
///
/// Field ownership by step:
///
/// | field            | written by                          |
/// |------------------|-------------------------------------|
/// | `browser_type`   | user-agent analysis                 |
/// | `hash`           | cache lookup                        |
/// | `status`         | cache lookup, data context, rendering |
/// | `head`, `body`   | cache lookup, rendering             |
/// | `location`       | rendering                           |
/// | `data_context`   | data context                        |
/// | `data_markup`    | rendering                           |
/// | response         | transport                           |
pub struct PipelineContext<'a> {
    request_id: Uuid,
    request: &'a Parts,
    app: &'a Application,
    url: String,
    state: RenderState,
    response: ResponseSlot,
    steps: Vec<(StepName, StepOutcome)>,
    event_sink: Arc<dyn EventSink>,

    /// Client classification.
    pub browser_type: Option<BrowserType>,
    /// Status the response will carry.
    pub status: StatusCode,
    /// Cache key of this URL.
    pub hash: Option<String>,
    /// Markup placed inside `<head>`.
    pub head: Option<String>,
    /// Markup placed inside `<body>`.
    pub body: Option<String>,
    /// Redirect target.
    pub location: Option<String>,
    /// Data resolved for the route.
    pub data_context: Option<DataContext>,
    /// Serialised `data_context` for client rehydration.
    pub data_markup: Option<String>,
}

impl<'a> PipelineContext<'a> {
    /// Creates a context with defaults: status 200, nothing cached, nothing
    /// rendered.
    #[must_use]
    pub fn new(request: &'a Parts, app: &'a Application) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            request,
            app,
            url: request.uri.path().to_string(),
            state: RenderState::Unresolved,
            response: ResponseSlot::new(),
            steps: Vec::with_capacity(StepName::ALL.len()),
            event_sink: Arc::new(NoOpEventSink),
            browser_type: None,
            status: StatusCode::OK,
            hash: None,
            head: None,
            body: None,
            location: None,
            data_context: None,
            data_markup: None,
        }
    }

    /// Sets the request id.
    #[must_use]
    pub fn with_request_id(mut self, request_id: Uuid) -> Self {
        self.request_id = request_id;
        self
    }

    /// Sets the event sink.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.event_sink = sink;
        self
    }

    /// Emits an event to the configured sink.
    pub fn emit(&self, event: &PipelineEvent) {
        self.event_sink.emit(event);
    }

    /// Returns the request id.
    #[must_use]
    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    /// Returns the path portion of the request URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the request method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.request.method
    }

    /// Returns the raw `User-Agent` header, if present and valid UTF-8.
    #[must_use]
    pub fn user_agent(&self) -> Option<&str> {
        self.request
            .headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
    }

    /// Returns the request head.
    #[must_use]
    pub fn request(&self) -> &Parts {
        self.request
    }

    /// Returns the application being rendered.
    #[must_use]
    pub fn app(&self) -> &Application {
        self.app
    }

    /// Returns the current render state.
    #[must_use]
    pub fn state(&self) -> RenderState {
        self.state
    }

    /// Moves the render state forward.
    ///
    /// An illegal transition is a pipeline bug and is reported as
    /// [`SsrError::Internal`].
    pub fn transition(&mut self, next: RenderState) -> Result<(), SsrError> {
        if !self.state.can_transition_to(next) {
            return Err(SsrError::internal(format!(
                "illegal render state transition {} -> {next}",
                self.state
            )));
        }
        tracing::trace!(
            request_id = %self.request_id,
            from = %self.state,
            to = %next,
            "Render state transition"
        );
        self.state = next;
        Ok(())
    }

    /// Returns true if a full page was served from the cache.
    #[must_use]
    pub fn is_from_cache(&self) -> bool {
        self.state.is_from_cache()
    }

    /// Returns true if a cached not-found marker matched.
    #[must_use]
    pub fn is_404_from_cache(&self) -> bool {
        self.state.is_404_from_cache()
    }

    /// Returns true if the status is a redirect.
    #[must_use]
    pub fn is_redirect(&self) -> bool {
        self.status.is_redirection()
    }

    /// Sends the response. Only the transport step calls this.
    pub fn send(&mut self, response: Response<String>) -> Result<(), TransportError> {
        self.response.send(response)
    }

    /// Returns true once the response has been sent.
    #[must_use]
    pub fn is_sent(&self) -> bool {
        self.response.is_sent()
    }

    /// Borrows the sent response.
    #[must_use]
    pub fn response(&self) -> Option<&Response<String>> {
        self.response.peek()
    }

    /// Takes the sent response out of the context.
    pub fn take_response(&mut self) -> Result<Response<String>, TransportError> {
        self.response.take()
    }

    /// Records what a step did.
    pub fn record_step(&mut self, step: StepName, outcome: StepOutcome) {
        self.steps.push((step, outcome));
    }

    /// Returns the recorded step outcomes, in execution order.
    #[must_use]
    pub fn steps(&self) -> &[(StepName, StepOutcome)] {
        &self.steps
    }

    /// Returns the outcome recorded for `step`, if it ran.
    #[must_use]
    pub fn outcome_of(&self, step: StepName) -> Option<&StepOutcome> {
        self.steps
            .iter()
            .find(|(name, _)| *name == step)
            .map(|(_, outcome)| outcome)
    }
}

impl std::fmt::Debug for PipelineContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineContext")
            .field("request_id", &self.request_id)
            .field("url", &self.url)
            .field("state", &self.state)
            .field("status", &self.status)
            .field("browser_type", &self.browser_type)
            .field("hash", &self.hash)
            .field("location", &self.location)
            .field("sent", &self.response.is_sent())
            .finish_non_exhaustive()
    }
}
