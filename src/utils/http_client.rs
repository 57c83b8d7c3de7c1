use async_trait::async_trait;
use reqwest::{Client, Response};
use std::time::Duration;
use tracing::debug;

use crate::errors::{AppResult, SourceError, SourceResult};
use crate::sources::traits::PlaylistFetcher;
use crate::utils::url::UrlUtils;
use crate::utils::{CompressionFormat, DecompressionService};

/// reqwest backed [`PlaylistFetcher`] with transparent decompression
pub struct StandardHttpClient {
    client: Client,
}

impl StandardHttpClient {
    /// Build a client with the given user agent and connection timeout
    ///
    /// The total request timeout is supplied per fetch.
    pub fn new(user_agent: &str, connect_timeout: Duration) -> AppResult<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .connect_timeout(connect_timeout)
            .build()?;

        Ok(Self { client })
    }

    /// Check status and decompress the body
    async fn process_response_to_bytes(response: Response, safe_url: &str) -> SourceResult<Vec<u8>> {
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Http {
                status: status.as_u16(),
                url: safe_url.to_string(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| SourceError::request(safe_url, UrlUtils::obfuscate_credentials(&e.to_string())))?;

        debug!("Fetched {} bytes of raw content", bytes.len());

        let compression_format = DecompressionService::detect_compression_format(&bytes);
        let decompressed_bytes = match compression_format {
            CompressionFormat::Uncompressed => bytes.to_vec(),
            _ => {
                debug!("Content is {:?} compressed, decompressing", compression_format);
                DecompressionService::decompress(bytes).map_err(|e| SourceError::Decode {
                    url: safe_url.to_string(),
                    message: e.to_string(),
                })?
            }
        };

        Ok(decompressed_bytes)
    }
}

#[async_trait]
impl PlaylistFetcher for StandardHttpClient {
    async fn fetch(&self, endpoint: &str, timeout: Duration) -> SourceResult<String> {
        let safe_url = UrlUtils::obfuscate_credentials(endpoint);
        debug!("Fetching playlist from: {}", safe_url);

        let response = self
            .client
            .get(endpoint)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SourceError::Timeout {
                        url: safe_url.clone(),
                        timeout,
                    }
                } else {
                    SourceError::request(&safe_url, UrlUtils::obfuscate_credentials(&e.to_string()))
                }
            })?;

        let decompressed_bytes = Self::process_response_to_bytes(response, &safe_url).await?;

        // Invalid UTF-8 is replaced, not rejected
        let content = String::from_utf8_lossy(&decompressed_bytes).into_owned();

        debug!("Fetched {} characters from {}", content.len(), safe_url);
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_builds_with_custom_user_agent() {
        let client = StandardHttpClient::new("m3u-aggregator-test/1.0", Duration::from_secs(5));
        assert!(client.is_ok());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_a_source_error() {
        let client = StandardHttpClient::new("m3u-aggregator-test/1.0", Duration::from_millis(200)).unwrap();
        // Port 9 on localhost is the discard service and is closed on test hosts
        let result = client
            .fetch("http://127.0.0.1:9/playlist.m3u", Duration::from_secs(2))
            .await;

        match result {
            Err(SourceError::Request { url, .. }) | Err(SourceError::Timeout { url, .. }) => {
                assert_eq!(url, "http://127.0.0.1:9/playlist.m3u");
            }
            other => panic!("unexpected result {other:?}"),
        }
    }
}
