//! Playlist sources: parsing raw text and resolving configured locations

pub mod loader;
pub mod m3u;
pub mod traits;

pub use loader::SourceLoader;
pub use m3u::{parse_m3u, ParsedPlaylist};
pub use traits::PlaylistFetcher;
