use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

pub mod defaults;

use defaults::*;

use crate::errors::{AppError, AppResult};
use crate::models::SourcePolicy;
use crate::utils::url::UrlUtils;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub aggregation: AggregationConfig,
    /// Sources in output priority order
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_path")]
    pub path: PathBuf,
    /// Write a `# --- Content from <source> ---` comment before each source
    #[serde(default = "default_section_comments")]
    pub section_comments: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Per-request timeout, humantime format ("30s", "1m")
    #[serde(default = "default_fetch_timeout")]
    pub timeout: String,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: String,
    #[serde(default = "default_max_concurrent_fetches")]
    pub max_concurrent_fetches: usize,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregationConfig {
    /// Drop repeated URL + title pairs within a single source
    #[serde(default = "default_deduplicate")]
    pub deduplicate: bool,
}

/// One playlist source
///
/// Exactly one of `url`, `url_env`, `content_env` or `inline` must be set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Endpoints tried in order when `url` fails
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fallback_urls: Vec<String>,
    /// Randomize the order of `fallback_urls` on every run
    #[serde(default)]
    pub shuffle_fallbacks: bool,
    /// Environment variable holding the endpoint URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url_env: Option<String>,
    /// Environment variable holding the playlist text itself
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_env: Option<String>,
    /// Playlist text embedded in the configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline: Option<String>,
    /// Substrings identifying a block/challenge page instead of a playlist
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub block_markers: Vec<String>,
    /// Overrides `fetch.timeout` for this source
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,
    #[serde(default)]
    pub policy: SourcePolicy,
}

/// Where the text of a source comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceLocation<'a> {
    Url(&'a str),
    UrlEnv(&'a str),
    ContentEnv(&'a str),
    Inline(&'a str),
}

// Output defaults
fn default_output_path() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_PATH)
}

fn default_section_comments() -> bool {
    DEFAULT_SECTION_COMMENTS
}

// Fetch defaults
fn default_fetch_timeout() -> String {
    DEFAULT_FETCH_TIMEOUT.to_string()
}

fn default_connect_timeout() -> String {
    DEFAULT_CONNECT_TIMEOUT.to_string()
}

fn default_max_concurrent_fetches() -> usize {
    DEFAULT_MAX_CONCURRENT_FETCHES
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_deduplicate() -> bool {
    DEFAULT_DEDUPLICATE
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
            section_comments: default_section_comments(),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: default_fetch_timeout(),
            connect_timeout: default_connect_timeout(),
            max_concurrent_fetches: default_max_concurrent_fetches(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            deduplicate: default_deduplicate(),
        }
    }
}

/// Parse a humantime duration string from the configuration
pub fn parse_duration(field: &str, value: &str) -> AppResult<Duration> {
    humantime::parse_duration(value.trim())
        .map_err(|e| AppError::configuration(format!("{field}: invalid duration '{value}': {e}")))
}

impl FetchConfig {
    pub fn timeout_duration(&self) -> AppResult<Duration> {
        parse_duration("fetch.timeout", &self.timeout)
    }

    pub fn connect_timeout_duration(&self) -> AppResult<Duration> {
        parse_duration("fetch.connect_timeout", &self.connect_timeout)
    }
}

impl SourceConfig {
    /// The configured location, or `None` unless exactly one is set
    pub fn location(&self) -> Option<SourceLocation<'_>> {
        let candidates = [
            self.url.as_deref().map(SourceLocation::Url),
            self.url_env.as_deref().map(SourceLocation::UrlEnv),
            self.content_env.as_deref().map(SourceLocation::ContentEnv),
            self.inline.as_deref().map(SourceLocation::Inline),
        ];
        let mut set = candidates.into_iter().flatten();
        match (set.next(), set.next()) {
            (Some(location), None) => Some(location),
            _ => None,
        }
    }

    /// Effective timeout for this source
    pub fn timeout_or(&self, default: Duration) -> AppResult<Duration> {
        match &self.timeout {
            Some(value) => parse_duration(&format!("sources.{}.timeout", self.name), value),
            None => Ok(default),
        }
    }

    fn validate(&self) -> AppResult<()> {
        let context = |message: String| AppError::validation(format!("source '{}': {message}", self.name));

        let location = self.location().ok_or_else(|| {
            context("exactly one of url, url_env, content_env or inline must be set".to_string())
        })?;

        if let SourceLocation::Url(url) = location {
            UrlUtils::parse_http_endpoint(url).map_err(context)?;
        }
        if !self.fallback_urls.is_empty() && !matches!(location, SourceLocation::Url(_)) {
            return Err(context("fallback_urls require url".to_string()));
        }
        for fallback in &self.fallback_urls {
            UrlUtils::parse_http_endpoint(fallback).map_err(context)?;
        }
        if let Some(timeout) = &self.timeout {
            humantime::parse_duration(timeout.trim())
                .map_err(|e| context(format!("invalid timeout '{timeout}': {e}")))?;
        }

        self.policy.validate().map_err(context)
    }
}

impl Config {
    /// Parse configuration from TOML text and validate it
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Check everything serde cannot: names, locations, durations, policies
    pub fn validate(&self) -> AppResult<()> {
        self.fetch.timeout_duration()?;
        self.fetch.connect_timeout_duration()?;
        if self.fetch.max_concurrent_fetches == 0 {
            return Err(AppError::configuration(
                "fetch.max_concurrent_fetches must be at least 1",
            ));
        }

        let mut names = HashSet::new();
        for source in &self.sources {
            if source.name.trim().is_empty() {
                return Err(AppError::configuration("source name must not be empty"));
            }
            if !names.insert(source.name.as_str()) {
                return Err(AppError::configuration(format!(
                    "duplicate source name '{}'",
                    source.name
                )));
            }
            source.validate()?;
        }

        Ok(())
    }

    pub fn load_from_file(config_file: &str) -> Result<Self> {
        if std::path::Path::new(&config_file).exists() {
            let contents = std::fs::read_to_string(config_file)?;
            Self::from_toml_str(&contents)
        } else {
            let default_config = Self::default();
            let contents = toml::to_string_pretty(&default_config)?;
            std::fs::write(config_file, contents)?;
            info!("Created default config file: {}", config_file);
            Ok(default_config)
        }
    }
}
