use async_trait::async_trait;
use std::time::Duration;

use crate::errors::SourceResult;

/// Retrieves the raw text of a playlist endpoint
///
/// Implementations must either return the decoded body or fail within
/// `timeout`. Any failure becomes a `FetchFailure` for the owning source.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PlaylistFetcher: Send + Sync {
    async fn fetch(&self, endpoint: &str, timeout: Duration) -> SourceResult<String>;
}
