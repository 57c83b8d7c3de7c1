//! Shared helpers for fetching and logging

pub mod decompression;
pub mod http_client;
pub mod url;

pub use decompression::{CompressionFormat, DecompressionService};
pub use http_client::StandardHttpClient;
pub use url::UrlUtils;
