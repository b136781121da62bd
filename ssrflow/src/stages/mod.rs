//! Step trait and the six pipeline steps.
//!
//! Steps are the units of work in an ssrflow pipeline. Each one reads and
//! writes a documented subset of the [`PipelineContext`]; the dispatcher
//! runs them strictly in [`StepName::ALL`] order.

mod cache_fill;
mod cache_lookup;
mod data_context;
mod rendering;
mod transport;
mod user_agent;

pub use cache_fill::CacheFillStep;
pub use cache_lookup::CacheLookupStep;
pub use data_context::DataContextStep;
pub use rendering::RenderingStep;
pub use transport::TransportStep;
pub use user_agent::{UserAgentClassifier, UserAgentStep};

use crate::context::PipelineContext;
use crate::core::{StepName, StepOutcome};
use crate::errors::SsrError;
use async_trait::async_trait;
use std::fmt::Debug;

/// Trait for pipeline steps.
///
/// A step returns [`StepOutcome::Skipped`] when it leaves the context
/// untouched. Recoverable failures are folded into the context; an `Err`
/// aborts the request.
#[async_trait]
pub trait Step: Send + Sync + Debug {
    /// Returns the name of the step.
    fn name(&self) -> StepName;

    /// Runs the step against the request context.
    async fn run(&self, ctx: &mut PipelineContext<'_>) -> Result<StepOutcome, SsrError>;
}
