/// Configuration default values
///
/// All defaults live here so they can be changed in one place.
// Output defaults
pub const DEFAULT_OUTPUT_PATH: &str = "./output/playlist.m3u";
pub const DEFAULT_SECTION_COMMENTS: bool = true;

// Fetch defaults
pub const DEFAULT_FETCH_TIMEOUT: &str = "30s";
pub const DEFAULT_CONNECT_TIMEOUT: &str = "10s";
pub const DEFAULT_MAX_CONCURRENT_FETCHES: usize = 4;
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:109.0) Gecko/20100101 Firefox/117.0";

// Aggregation defaults
pub const DEFAULT_DEDUPLICATE: bool = true;
