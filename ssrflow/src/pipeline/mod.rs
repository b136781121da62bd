//! Pipeline dispatch.
//!
//! This module provides:
//! - The route predicate deciding which requests are rendered
//! - The dispatcher running the six steps in order
//! - A builder assembling the pipeline from its collaborators

mod dispatcher;
mod route;


pub use dispatcher::{SsrPipeline, SsrPipelineBuilder};
pub use route::{is_covered, RoutePredicate};
