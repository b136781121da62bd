//! Step 1: client classification from the `User-Agent` header.

use super::Step;
use crate::context::PipelineContext;
use crate::core::{BrowserType, StepName, StepOutcome};
use crate::errors::SsrError;
use async_trait::async_trait;
use regex::RegexSet;
use std::sync::LazyLock;

static BOT_PATTERNS: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new([
        r"(?i)bot\b|bot/|crawler|spider|slurp",
        r"(?i)facebookexternalhit|embedly|quora link preview|outbrain|pinterest|vkshare",
        r"(?i)whatsapp|w3c_validator|bingpreview|google-inspectiontool",
        r"(?i)headlesschrome|phantomjs|lighthouse|prerender",
    ])
    .expect("bot patterns compile")
});

static LEGACY_PATTERNS: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new([
        r"(?i)\bmsie\s|trident/",
        r"(?i)opera mini",
        r"(?i)android [1-4]\.\d.*version/\d",
        r"(?i)version/[1-9]\.\d+(\.\d+)? (mobile/\S+ )?safari/",
        r"(?i)chrome/([1-4]\d|[1-9])\.",
        r"(?i)firefox/([1-4]\d|[1-9])\.",
    ])
    .expect("legacy patterns compile")
});

static MODERN_PATTERNS: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new([
        r"(?i)(chrome|chromium|crios)/\d",
        r"(?i)firefox/\d|fxios/\d",
        r"(?i)edg(e|a|ios)?/\d",
        r"(?i)version/\d+(\.\d+)* (mobile/\S+ )?safari/",
    ])
    .expect("modern patterns compile")
});

/// Classifies raw `User-Agent` values.
///
/// Rules are checked bot first, then legacy, then modern. A missing or blank
/// header is [`BrowserType::Unknown`].
#[derive(Debug, Clone, Copy, Default)]
pub struct UserAgentClassifier;

impl UserAgentClassifier {
    /// Creates a classifier.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Classifies a header value.
    #[must_use]
    pub fn classify(&self, user_agent: Option<&str>) -> BrowserType {
        let Some(ua) = user_agent.map(str::trim).filter(|ua| !ua.is_empty()) else {
            return BrowserType::Unknown;
        };

        if BOT_PATTERNS.is_match(ua) {
            BrowserType::Bot
        } else if LEGACY_PATTERNS.is_match(ua) {
            BrowserType::Legacy
        } else if MODERN_PATTERNS.is_match(ua) {
            BrowserType::Modern
        } else {
            BrowserType::Unknown
        }
    }
}

/// Sets `browser_type`. Touches nothing else.
#[derive(Debug, Default)]
pub struct UserAgentStep {
    classifier: UserAgentClassifier,
}

impl UserAgentStep {
    /// Creates the step.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Step for UserAgentStep {
    fn name(&self) -> StepName {
        StepName::UserAgentAnalysis
    }

    async fn run(&self, ctx: &mut PipelineContext<'_>) -> Result<StepOutcome, SsrError> {
        let browser_type = self.classifier.classify(ctx.user_agent());
        tracing::debug!(
            request_id = %ctx.request_id(),
            browser_type = %browser_type,
            "Classified client"
        );
        ctx.browser_type = Some(browser_type);
        Ok(StepOutcome::Completed)
    }
}
