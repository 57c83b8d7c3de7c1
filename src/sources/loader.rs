//! Resolving configured sources to playlist text
//!
//! Each [`SourceConfig`] names exactly one location. Network locations go
//! through a [`PlaylistFetcher`] with fallback endpoints and block page
//! detection; environment and inline locations are read directly. All
//! sources are loaded concurrently but reported in configuration order.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use rand::seq::SliceRandom;
use tracing::{debug, info, warn};

use crate::config::{SourceConfig, SourceLocation};
use crate::errors::{SourceError, SourceResult};
use crate::pipeline::SourceInput;
use crate::sources::traits::PlaylistFetcher;
use crate::utils::url::UrlUtils;

/// Loads the text of configured sources
pub struct SourceLoader {
    fetcher: Arc<dyn PlaylistFetcher>,
    default_timeout: Duration,
    max_concurrent: usize,
}

impl SourceLoader {
    pub fn new(fetcher: Arc<dyn PlaylistFetcher>, default_timeout: Duration, max_concurrent: usize) -> Self {
        Self {
            fetcher,
            default_timeout,
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// Load every source, preserving configuration order in the result
    pub async fn load_all(&self, sources: &[SourceConfig]) -> Vec<SourceInput> {
        info!(
            "Loading {} sources ({} concurrent)",
            sources.len(),
            self.max_concurrent
        );

        stream::iter(sources)
            .map(|source| async move {
                let content = self.load(source).await;
                SourceInput::new(source.name.as_str(), content, source.policy.clone())
            })
            .buffered(self.max_concurrent)
            .collect()
            .await
    }

    /// Resolve one source to its playlist text
    pub async fn load(&self, source: &SourceConfig) -> SourceResult<String> {
        let location = source.location().ok_or_else(|| SourceError::InvalidConfig {
            message: format!(
                "source '{}' must set exactly one of url, url_env, content_env or inline",
                source.name
            ),
        })?;

        match location {
            SourceLocation::Inline(text) => {
                debug!("Source '{}' uses inline content", source.name);
                Ok(text.to_string())
            }
            SourceLocation::ContentEnv(var) => {
                debug!("Source '{}' reads content from ${}", source.name, var);
                read_env(var)
            }
            SourceLocation::UrlEnv(var) => {
                let endpoint = read_env(var)?;
                self.fetch_endpoints(source, vec![endpoint.trim().to_string()]).await
            }
            SourceLocation::Url(url) => {
                let endpoints = endpoint_order(url, &source.fallback_urls, source.shuffle_fallbacks);
                self.fetch_endpoints(source, endpoints).await
            }
        }
    }

    /// Try each endpoint in turn until one returns a usable body
    async fn fetch_endpoints(&self, source: &SourceConfig, endpoints: Vec<String>) -> SourceResult<String> {
        let timeout = source.timeout_or(self.default_timeout).map_err(|e| SourceError::InvalidConfig {
            message: e.to_string(),
        })?;

        let attempts = endpoints.len();
        let mut last_error = None;

        for endpoint in endpoints {
            let safe_url = UrlUtils::obfuscate_credentials(&endpoint);
            match self.fetch_once(&endpoint, &safe_url, timeout, &source.block_markers).await {
                Ok(body) => {
                    debug!("Source '{}' fetched from {}", source.name, safe_url);
                    return Ok(body);
                }
                Err(e) if !e.is_endpoint_specific() => return Err(e),
                Err(e) => {
                    warn!("Source '{}' endpoint failed: {}", source.name, e);
                    last_error = Some(e);
                }
            }
        }

        let last = last_error.unwrap_or_else(|| SourceError::InvalidConfig {
            message: format!("source '{}' has no endpoints", source.name),
        });
        if attempts > 1 {
            Err(SourceError::Exhausted {
                attempts,
                last: Box::new(last),
            })
        } else {
            Err(last)
        }
    }

    async fn fetch_once(
        &self,
        endpoint: &str,
        safe_url: &str,
        timeout: Duration,
        block_markers: &[String],
    ) -> SourceResult<String> {
        let body = tokio::time::timeout(timeout, self.fetcher.fetch(endpoint, timeout))
            .await
            .map_err(|_| SourceError::Timeout {
                url: safe_url.to_string(),
                timeout,
            })??;

        if let Some(marker) = find_block_marker(&body, block_markers) {
            return Err(SourceError::Blocked {
                url: safe_url.to_string(),
                marker: marker.to_string(),
            });
        }

        Ok(body)
    }
}

fn read_env(name: &str) -> SourceResult<String> {
    std::env::var(name).map_err(|_| SourceError::MissingEnv {
        name: name.to_string(),
    })
}

/// Primary endpoint first, then fallbacks (optionally shuffled)
fn endpoint_order(primary: &str, fallbacks: &[String], shuffle: bool) -> Vec<String> {
    let mut rest = fallbacks.to_vec();
    if shuffle {
        rest.shuffle(&mut rand::rng());
    }

    let mut endpoints = Vec::with_capacity(rest.len() + 1);
    endpoints.push(primary.to_string());
    endpoints.extend(rest);
    endpoints
}

fn find_block_marker<'a>(body: &str, markers: &'a [String]) -> Option<&'a str> {
    markers
        .iter()
        .map(String::as_str)
        .filter(|m| !m.is_empty())
        .find(|m| body.contains(m))
}
