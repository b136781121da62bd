//! Event sink trait and implementations.

use crate::core::PipelineEvent;
use parking_lot::RwLock;
use tracing::{debug, info, trace, Level};

/// Trait for event sinks that receive pipeline events.
///
/// Emission must never fail the request: implementations swallow and log
/// their own errors.
pub trait EventSink: Send + Sync {
    /// Emits an event.
    fn emit(&self, event: &PipelineEvent);
}

/// A no-op event sink that discards all events.
///
/// Used as the default when no sink is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpEventSink;

impl EventSink for NoOpEventSink {
    fn emit(&self, _event: &PipelineEvent) {}
}

/// An event sink that logs events using the tracing framework.
#[derive(Debug, Clone)]
pub struct LoggingEventSink {
    level: Level,
}

impl Default for LoggingEventSink {
    fn default() -> Self {
        Self { level: Level::DEBUG }
    }
}

impl LoggingEventSink {
    /// Creates a new logging event sink with the specified level.
    #[must_use]
    pub fn new(level: Level) -> Self {
        Self { level }
    }

    /// Creates an info-level logging sink.
    #[must_use]
    pub fn info() -> Self {
        Self::new(Level::INFO)
    }
}

impl EventSink for LoggingEventSink {
    fn emit(&self, event: &PipelineEvent) {
        let request_id = event.request_id.to_string();
        match self.level {
            Level::TRACE => trace!(
                event_type = %event.event_type,
                request_id = %request_id,
                event_data = ?event.data,
                "Event: {}", event.event_type
            ),
            Level::DEBUG => debug!(
                event_type = %event.event_type,
                request_id = %request_id,
                event_data = ?event.data,
                "Event: {}", event.event_type
            ),
            _ => info!(
                event_type = %event.event_type,
                request_id = %request_id,
                event_data = ?event.data,
                "Event: {}", event.event_type
            ),
        }
    }
}

/// A collecting event sink for testing purposes.
#[derive(Debug, Default)]
pub struct CollectingEventSink {
    events: RwLock<Vec<PipelineEvent>>,
}

impl CollectingEventSink {
    /// Creates a new collecting sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all collected events.
    #[must_use]
    pub fn events(&self) -> Vec<PipelineEvent> {
        self.events.read().clone()
    }

    /// Returns the collected event types, in order.
    #[must_use]
    pub fn event_types(&self) -> Vec<String> {
        self.events
            .read()
            .iter()
            .map(|e| e.event_type.clone())
            .collect()
    }

    /// Returns the number of collected events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// Returns true if no events have been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }

    /// Clears all collected events.
    pub fn clear(&self) {
        self.events.write().clear();
    }

    /// Returns events matching a type prefix.
    #[must_use]
    pub fn events_of_type(&self, type_prefix: &str) -> Vec<PipelineEvent> {
        self.events
            .read()
            .iter()
            .filter(|e| e.event_type.starts_with(type_prefix))
            .cloned()
            .collect()
    }
}

impl EventSink for CollectingEventSink {
    fn emit(&self, event: &PipelineEvent) {
        self.events.write().push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::StepName;
    use uuid::Uuid;

    #[test]
    fn test_noop_and_logging_sinks() {
        let event = PipelineEvent::cache_miss(Uuid::new_v4(), "ssr:1");
        NoOpEventSink.emit(&event);
        LoggingEventSink::default().emit(&event);
        LoggingEventSink::info().emit(&event);
    }

    #[test]
    fn test_collecting_sink() {
        let sink = CollectingEventSink::new();
        assert!(sink.is_empty());

        let id = Uuid::new_v4();
        sink.emit(&PipelineEvent::step_completed(id, StepName::CacheLookup, 0.1));
        sink.emit(&PipelineEvent::cache_miss(id, "ssr:1"));

        assert_eq!(sink.len(), 2);
        assert_eq!(sink.event_types(), vec!["step.completed", "cache.miss"]);
    }

    #[test]
    fn test_collecting_sink_filter_and_clear() {
        let sink = CollectingEventSink::new();
        let id = Uuid::new_v4();
        sink.emit(&PipelineEvent::step_completed(id, StepName::Rendering, 1.0));
        sink.emit(&PipelineEvent::step_skipped(id, StepName::CacheFill, "redirect"));
        sink.emit(&PipelineEvent::cache_hit(id, "ssr:1", false));

        assert_eq!(sink.events_of_type("step.").len(), 2);
        assert_eq!(sink.events_of_type("cache.").len(), 1);

        sink.clear();
        assert!(sink.is_empty());
    }
}
