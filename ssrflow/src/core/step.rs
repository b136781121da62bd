//! Step identity and per-step outcomes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The six steps of the pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepName {
    /// Classifies the requesting client.
    UserAgentAnalysis,
    /// Derives the cache key and checks the cache store.
    CacheLookup,
    /// Resolves the route into render data.
    DataContext,
    /// Renders the application to markup.
    Rendering,
    /// Writes the HTTP response.
    Transport,
    /// Stores fresh markup in the cache.
    CacheFill,
}

impl StepName {
    /// Every step, in the order the pipeline runs them.
    pub const ALL: [Self; 6] = [
        Self::UserAgentAnalysis,
        Self::CacheLookup,
        Self::DataContext,
        Self::Rendering,
        Self::Transport,
        Self::CacheFill,
    ];

    /// Returns the step name as used in logs and events.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UserAgentAnalysis => "user_agent_analysis",
            Self::CacheLookup => "cache_lookup",
            Self::DataContext => "data_context",
            Self::Rendering => "rendering",
            Self::Transport => "transport",
            Self::CacheFill => "cache_fill",
        }
    }
}

impl fmt::Display for StepName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a step did with the context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepOutcome {
    /// The step ran and updated the context.
    Completed,
    /// The step left the context untouched.
    Skipped {
        /// Why the step did nothing.
        reason: String,
    },
}

impl StepOutcome {
    /// Creates a skipped outcome.
    #[must_use]
    pub fn skipped(reason: impl Into<String>) -> Self {
        Self::Skipped {
            reason: reason.into(),
        }
    }

    /// Returns true if the step was skipped.
    #[must_use]
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_order() {
        let mut sorted = StepName::ALL;
        sorted.sort();
        assert_eq!(sorted, StepName::ALL);
        assert_eq!(StepName::ALL[0], StepName::UserAgentAnalysis);
        assert_eq!(StepName::ALL[5], StepName::CacheFill);
    }

    #[test]
    fn test_step_display() {
        assert_eq!(StepName::CacheLookup.to_string(), "cache_lookup");
        assert_eq!(StepName::Transport.to_string(), "transport");
    }

    #[test]
    fn test_outcome_serialize() {
        let json = serde_json::to_value(StepOutcome::skipped("served from cache")).unwrap();
        assert_eq!(json["status"], "skipped");
        assert_eq!(json["reason"], "served from cache");
    }
}
