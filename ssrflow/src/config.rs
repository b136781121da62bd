//! Configuration types for the SSR pipeline.
//!
//! Every field has a default so an empty JSON object (or no environment
//! variables at all) yields a working configuration.

use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Prefix for environment variable overrides.
pub const ENV_PREFIX: &str = "SSRFLOW_";

/// Longest TTL the cache accepts, one year.
pub const MAX_TTL_SECONDS: u64 = 365 * 24 * 60 * 60;

/// Root configuration for the pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Which requests the pipeline serves.
    #[serde(default)]
    pub route: RouteConfig,
    /// Page cache settings.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Rendering and document settings.
    #[serde(default)]
    pub render: RenderConfig,
    /// Logging, timing and diagnostics.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl PipelineConfig {
    /// Creates a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses and validates a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| ConfigError::single(format!("malformed JSON: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON configuration file.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::single(format!("cannot read {}: {e}", path.display())))?;
        Self::from_json_str(&content)
    }

    /// Builds a configuration from `SSRFLOW_*` environment variables over
    /// the defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary variable lookup.
    ///
    /// Recognised keys (all prefixed with [`ENV_PREFIX`]):
    /// `EXCLUDED_PREFIXES` (comma separated), `CACHE_ENABLED`,
    /// `PAGE_TTL_SECONDS`, `NOT_FOUND_TTL_SECONDS`, `PARTITION_BY_BROWSER`,
    /// `CACHE_MAX_ENTRIES`, `LOG_LEVEL`, `JSON_LOGS`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));
        let mut problems = Vec::new();
        let mut config = Self::default();

        if let Some(prefixes) = get("EXCLUDED_PREFIXES") {
            config.route.excluded_prefixes = prefixes
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(v) = get("CACHE_ENABLED") {
            parse_into(&v, "CACHE_ENABLED", &mut config.cache.enabled, &mut problems);
        }
        if let Some(v) = get("PAGE_TTL_SECONDS") {
            parse_into(&v, "PAGE_TTL_SECONDS", &mut config.cache.page_ttl_seconds, &mut problems);
        }
        if let Some(v) = get("NOT_FOUND_TTL_SECONDS") {
            parse_into(
                &v,
                "NOT_FOUND_TTL_SECONDS",
                &mut config.cache.not_found_ttl_seconds,
                &mut problems,
            );
        }
        if let Some(v) = get("PARTITION_BY_BROWSER") {
            parse_into(
                &v,
                "PARTITION_BY_BROWSER",
                &mut config.cache.partition_by_browser,
                &mut problems,
            );
        }
        if let Some(v) = get("CACHE_MAX_ENTRIES") {
            parse_into(&v, "CACHE_MAX_ENTRIES", &mut config.cache.max_entries, &mut problems);
        }
        if let Some(v) = get("LOG_LEVEL") {
            config.observability.log_level = v;
        }
        if let Some(v) = get("JSON_LOGS") {
            parse_into(&v, "JSON_LOGS", &mut config.observability.json_logs, &mut problems);
        }

        if !problems.is_empty() {
            return Err(ConfigError::new(problems));
        }
        config.validate()?;
        Ok(config)
    }

    /// Checks semantic constraints and reports every problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut problems = Vec::new();

        for prefix in &self.route.excluded_prefixes {
            if !prefix.starts_with('/') || prefix.len() < 2 {
                problems.push(format!("excluded prefix '{prefix}' must start with '/' and name a path"));
            }
        }
        for (field, ttl) in [
            ("cache.page_ttl_seconds", self.cache.page_ttl_seconds),
            ("cache.not_found_ttl_seconds", self.cache.not_found_ttl_seconds),
        ] {
            if ttl == 0 {
                problems.push(format!("{field} must be greater than zero"));
            } else if ttl > MAX_TTL_SECONDS {
                problems.push(format!("{field} must be at most {MAX_TTL_SECONDS}"));
            }
        }
        if self.cache.max_entries == 0 {
            problems.push("cache.max_entries must be greater than zero".to_string());
        }
        if self.cache.key_prefix.is_empty() {
            problems.push("cache.key_prefix must not be empty".to_string());
        }
        if !is_js_identifier(&self.render.state_variable) {
            problems.push(format!(
                "render.state_variable '{}' is not a valid identifier",
                self.render.state_variable
            ));
        }
        if self.observability.diagnostics_capacity == 0 {
            problems.push("observability.diagnostics_capacity must be greater than zero".to_string());
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::new(problems))
        }
    }

    /// Sets the route configuration.
    #[must_use]
    pub fn with_route(mut self, route: RouteConfig) -> Self {
        self.route = route;
        self
    }

    /// Sets the cache configuration.
    #[must_use]
    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }

    /// Sets the render configuration.
    #[must_use]
    pub fn with_render(mut self, render: RenderConfig) -> Self {
        self.render = render;
        self
    }

    /// Sets the observability configuration.
    #[must_use]
    pub fn with_observability(mut self, observability: ObservabilityConfig) -> Self {
        self.observability = observability;
        self
    }
}

fn parse_into<T: std::str::FromStr>(raw: &str, name: &str, slot: &mut T, problems: &mut Vec<String>) {
    match raw.trim().parse() {
        Ok(value) => *slot = value,
        Err(_) => problems.push(format!("{ENV_PREFIX}{name}: cannot parse '{raw}'")),
    }
}

fn is_js_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// Which request paths the pipeline covers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteConfig {
    /// Paths starting with any of these prefixes are passed through.
    #[serde(default = "default_excluded_prefixes")]
    pub excluded_prefixes: Vec<String>,
}

fn default_excluded_prefixes() -> Vec<String> {
    vec!["/api".to_string()]
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            excluded_prefixes: default_excluded_prefixes(),
        }
    }
}

impl RouteConfig {
    /// Adds an excluded prefix.
    #[must_use]
    pub fn exclude(mut self, prefix: impl Into<String>) -> Self {
        self.excluded_prefixes.push(prefix.into());
        self
    }
}

/// Page cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Whether cache lookup and fill run at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// TTL for rendered pages.
    #[serde(default = "default_page_ttl")]
    pub page_ttl_seconds: u64,
    /// TTL for not-found markers.
    #[serde(default = "default_not_found_ttl")]
    pub not_found_ttl_seconds: u64,
    /// Include the browser classification in the cache key.
    #[serde(default)]
    pub partition_by_browser: bool,
    /// Prefix of every cache key.
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
    /// Capacity of the in-memory store.
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

fn default_true() -> bool {
    true
}

fn default_page_ttl() -> u64 {
    3600
}

fn default_not_found_ttl() -> u64 {
    600
}

fn default_key_prefix() -> String {
    "ssr".to_string()
}

fn default_max_entries() -> usize {
    1000
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            page_ttl_seconds: default_page_ttl(),
            not_found_ttl_seconds: default_not_found_ttl(),
            partition_by_browser: false,
            key_prefix: default_key_prefix(),
            max_entries: default_max_entries(),
        }
    }
}

impl CacheConfig {
    /// TTL for rendered pages.
    #[must_use]
    pub fn page_ttl(&self) -> Duration {
        Duration::from_secs(self.page_ttl_seconds)
    }

    /// TTL for not-found markers.
    #[must_use]
    pub fn not_found_ttl(&self) -> Duration {
        Duration::from_secs(self.not_found_ttl_seconds)
    }

    /// Disables the cache.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Enables browser partitioning of cache keys.
    #[must_use]
    pub fn with_partition_by_browser(mut self, enabled: bool) -> Self {
        self.partition_by_browser = enabled;
        self
    }
}

/// Rendering and document configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Global variable the rehydration script assigns.
    #[serde(default = "default_state_variable")]
    pub state_variable: String,
    /// Body served when rendering fails.
    #[serde(default = "default_error_body")]
    pub error_body: String,
    /// `lang` attribute of the HTML document.
    #[serde(default = "default_html_lang")]
    pub html_lang: String,
}

fn default_state_variable() -> String {
    "__SSR_STATE__".to_string()
}

fn default_error_body() -> String {
    "<h1>500 - Internal Server Error</h1>".to_string()
}

fn default_html_lang() -> String {
    "en".to_string()
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            state_variable: default_state_variable(),
            error_body: default_error_body(),
            html_lang: default_html_lang(),
        }
    }
}

/// Logging, timing and diagnostics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Default log filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Emit JSON log lines instead of human-readable ones.
    #[serde(default)]
    pub json_logs: bool,
    /// Name of the per-request performance timer.
    #[serde(default = "default_timer_name")]
    pub timer_name: String,
    /// How many recent requests diagnostics retains.
    #[serde(default = "default_diagnostics_capacity")]
    pub diagnostics_capacity: usize,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_timer_name() -> String {
    "ssr".to_string()
}

fn default_diagnostics_capacity() -> usize {
    16
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logs: false,
            timer_name: default_timer_name(),
            diagnostics_capacity: default_diagnostics_capacity(),
        }
    }
}
