//! Named performance timer.

use std::time::Instant;

/// Measures one request from dispatch to the end of the last step.
#[derive(Debug)]
pub struct PerfTimer {
    start: Instant,
    name: String,
}

impl PerfTimer {
    /// Starts a timer.
    #[must_use]
    pub fn start(name: impl Into<String>) -> Self {
        Self {
            start: Instant::now(),
            name: name.into(),
        }
    }

    /// Returns the timer name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the elapsed time in milliseconds.
    #[must_use]
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }

    /// Stops the timer, logs `label` with the elapsed time and returns it.
    pub fn stop(self, label: &str) -> f64 {
        let elapsed_ms = self.elapsed_ms();
        tracing::info!(timer = %self.name, elapsed_ms, "{label}");
        elapsed_ms
    }
}
