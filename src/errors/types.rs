//! Error type definitions for the M3U aggregator

use std::time::Duration;
use thiserror::Error;

/// Top-level application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Source handling errors
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// Validation errors
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Filesystem errors while writing the output artifact
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client construction errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Errors raised while obtaining the raw text of one source
///
/// Every variant maps to the `FetchFailure` outcome: the source contributes
/// nothing and the run continues.
#[derive(Error, Debug)]
pub enum SourceError {
    /// The request did not complete within its timeout
    #[error("Connection timeout after {}: {url}", humantime::format_duration(*.timeout))]
    Timeout { url: String, timeout: Duration },

    /// The endpoint answered with a non-success status
    #[error("HTTP error: {status} - {url}")]
    Http { status: u16, url: String },

    /// Network or protocol level failure
    #[error("Request failed: {url} - {message}")]
    Request { url: String, message: String },

    /// The body looked like a challenge or block page instead of a playlist
    #[error("Blocked response from {url}: matched marker '{marker}'")]
    Blocked { url: String, marker: String },

    /// An environment variable named by the configuration is not set
    #[error("Environment variable '{name}' is not set")]
    MissingEnv { name: String },

    /// The source entry cannot be resolved to a location
    #[error("Invalid source configuration: {message}")]
    InvalidConfig { message: String },

    /// The body could not be decompressed
    #[error("Decode error: {url} - {message}")]
    Decode { url: String, message: String },

    /// Every configured endpoint for the source failed
    #[error("All {attempts} endpoints failed, last error: {last}")]
    Exhausted { attempts: usize, last: Box<SourceError> },
}

impl AppError {
    /// Create a validation error with a custom message
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

impl SourceError {
    /// Create a request error from any displayable failure
    pub fn request<U: Into<String>, M: std::fmt::Display>(url: U, message: M) -> Self {
        Self::Request {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// Whether trying another endpoint of the same source could help
    pub fn is_endpoint_specific(&self) -> bool {
        !matches!(self, Self::MissingEnv { .. } | Self::InvalidConfig { .. })
    }
}
