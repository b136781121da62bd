//! Core domain model types for ssrflow.
//!
//! This module contains the small vocabulary shared by every step:
//! - Browser classification and the render state machine
//! - Step names and step outcomes
//! - Pipeline events

mod event;
mod status;
mod step;

pub use event::PipelineEvent;
pub use status::{BrowserType, RenderState};
pub use step::{StepName, StepOutcome};
