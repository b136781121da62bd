//! Typed events published while a request moves through the pipeline.

use super::{RenderState, StepName};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// An event emitted by the pipeline.
///
/// Events carry the request id so a sink can stitch a request's history
/// back together.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineEvent {
    /// The event type (e.g., "step.completed", "cache.hit").
    #[serde(rename = "type")]
    pub event_type: String,

    /// The request this event belongs to.
    pub request_id: Uuid,

    /// When the event occurred.
    pub timestamp: DateTime<Utc>,

    /// The event payload data.
    #[serde(default)]
    pub data: HashMap<String, serde_json::Value>,
}

impl PipelineEvent {
    /// Creates a new event.
    #[must_use]
    pub fn new(event_type: impl Into<String>, request_id: Uuid) -> Self {
        Self {
            event_type: event_type.into(),
            request_id,
            timestamp: Utc::now(),
            data: HashMap::new(),
        }
    }

    /// Adds a data field to the event.
    #[must_use]
    pub fn add_data(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.data.insert(key.into(), value);
        self
    }

    /// Creates a "step.completed" event.
    #[must_use]
    pub fn step_completed(request_id: Uuid, step: StepName, duration_ms: f64) -> Self {
        Self::new("step.completed", request_id)
            .add_data("step", serde_json::json!(step.as_str()))
            .add_data("duration_ms", serde_json::json!(duration_ms))
    }

    /// Creates a "step.skipped" event.
    #[must_use]
    pub fn step_skipped(request_id: Uuid, step: StepName, reason: &str) -> Self {
        Self::new("step.skipped", request_id)
            .add_data("step", serde_json::json!(step.as_str()))
            .add_data("reason", serde_json::json!(reason))
    }

    /// Creates a "cache.hit" event.
    #[must_use]
    pub fn cache_hit(request_id: Uuid, hash: &str, not_found: bool) -> Self {
        Self::new("cache.hit", request_id)
            .add_data("hash", serde_json::json!(hash))
            .add_data("not_found", serde_json::json!(not_found))
    }

    /// Creates a "cache.miss" event.
    #[must_use]
    pub fn cache_miss(request_id: Uuid, hash: &str) -> Self {
        Self::new("cache.miss", request_id).add_data("hash", serde_json::json!(hash))
    }

    /// Creates a "cache.error" event.
    #[must_use]
    pub fn cache_error(request_id: Uuid, operation: &str, error: &str) -> Self {
        Self::new("cache.error", request_id)
            .add_data("operation", serde_json::json!(operation))
            .add_data("error", serde_json::json!(error))
    }

    /// Creates a "cache.stored" event.
    #[must_use]
    pub fn cache_stored(request_id: Uuid, hash: &str, not_found: bool) -> Self {
        Self::new("cache.stored", request_id)
            .add_data("hash", serde_json::json!(hash))
            .add_data("not_found", serde_json::json!(not_found))
    }

    /// Creates a "render.failed" event.
    #[must_use]
    pub fn render_failed(request_id: Uuid, error: &str) -> Self {
        Self::new("render.failed", request_id).add_data("error", serde_json::json!(error))
    }

    /// Creates a "request.finished" event.
    #[must_use]
    pub fn request_finished(
        request_id: Uuid,
        status: u16,
        state: RenderState,
        duration_ms: f64,
    ) -> Self {
        Self::new("request.finished", request_id)
            .add_data("status", serde_json::json!(status))
            .add_data("state", serde_json::json!(state))
            .add_data("duration_ms", serde_json::json!(duration_ms))
    }

    /// Returns the step this event refers to, if any.
    #[must_use]
    pub fn step(&self) -> Option<&str> {
        self.data.get("step").and_then(|v| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_completed_event() {
        let id = Uuid::new_v4();
        let event = PipelineEvent::step_completed(id, StepName::Rendering, 1.5);

        assert_eq!(event.event_type, "step.completed");
        assert_eq!(event.request_id, id);
        assert_eq!(event.step(), Some("rendering"));
        assert_eq!(event.data.get("duration_ms"), Some(&serde_json::json!(1.5)));
    }

    #[test]
    fn test_event_serialize_uses_type_key() {
        let event = PipelineEvent::cache_miss(Uuid::new_v4(), "ssr:abc");
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["type"], "cache.miss");
        assert_eq!(json["data"]["hash"], "ssr:abc");
    }

    #[test]
    fn test_request_finished_event() {
        let event =
            PipelineEvent::request_finished(Uuid::new_v4(), 302, RenderState::Redirected, 3.0);
        assert_eq!(event.data.get("state"), Some(&serde_json::json!("redirected")));
        assert_eq!(event.step(), None);
    }
}
