//! Observability utilities.
//!
//! This module provides:
//! - Subscriber installation for the `tracing` ecosystem
//! - The named performance timer that brackets every request
//! - A bounded diagnostics buffer of recent requests

mod diagnostics;
mod logging;
mod timer;

pub use diagnostics::{Diagnostics, RequestSnapshot};
pub use logging::init_tracing;
pub use timer::PerfTimer;
