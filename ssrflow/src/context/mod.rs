//! Per-request state threaded through the pipeline.
//!
//! This module provides:
//! - The mutable [`PipelineContext`] every step reads and writes
//! - The single-use [`ResponseSlot`] the transport step fills

mod pipeline_context;
mod response;


pub use pipeline_context::PipelineContext;
pub use response::ResponseSlot;
