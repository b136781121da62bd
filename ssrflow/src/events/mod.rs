//! Event sinks for pipeline observability.
//!
//! The pipeline publishes a [`PipelineEvent`](crate::core::PipelineEvent)
//! for every step transition. Sinks are handed to the pipeline explicitly;
//! there is no process-wide sink.

mod sink;

pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};
