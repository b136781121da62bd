//! Testing utilities for ssrflow pipelines.
//!
//! This module provides:
//! - Request and application fixtures
//! - Fake resolvers, renderers and cache stores that record their calls

mod fakes;
mod fixtures;

pub use fakes::{FailingCacheStore, FnRenderer, RecordingCacheStore, StaticResolver};
pub use fixtures::{request, request_with_method, request_with_user_agent, test_app};
