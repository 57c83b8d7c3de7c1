//! M3U playlist aggregator
//!
//! Fetches EXTM3U playlists from configured sources, filters and rewrites
//! their entries per source policy, and writes one merged playlist.

pub mod config;
pub mod errors;
pub mod models;
pub mod pipeline;
pub mod sources;
pub mod utils;
