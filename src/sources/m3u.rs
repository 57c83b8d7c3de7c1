//! M3U playlist parser
//!
//! Turns raw playlist text into [`StreamEntry`] records with a single-pass,
//! line-oriented state machine. Parsing is permissive: unknown comment lines
//! are kept with their entry or ignored, and nothing in the input is fatal.

use tracing::{debug, trace};

use crate::models::{ExtInf, StreamEntry};

/// First line of an extended M3U playlist
pub const M3U_HEADER: &str = "#EXTM3U";

/// Marker that opens a stream block
pub const LIVE_EXTINF_MARKER: &str = "#EXTINF:-1";

/// Result of parsing one playlist
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedPlaylist {
    /// Whether the first non-blank line was an `#EXTM3U` header
    pub has_header: bool,
    pub entries: Vec<StreamEntry>,
    /// Metadata lines dropped because no URL followed them
    pub malformed: usize,
    /// URL lines that had no metadata line in front of them
    pub orphaned_urls: usize,
}

/// Block being assembled between a metadata line and its URL
struct PendingBlock {
    info: ExtInf,
    extra_lines: Vec<String>,
    line_number: usize,
}

/// Parse M3U content into stream entries tagged with `source_tag`
pub fn parse_m3u(content: &str, source_tag: &str) -> ParsedPlaylist {
    let mut parsed = ParsedPlaylist::default();
    let mut pending: Option<PendingBlock> = None;
    let mut seen_first_line = false;

    debug!("Starting M3U parsing for source: {}", source_tag);

    for (index, raw_line) in content.lines().enumerate() {
        let line_number = index + 1;
        let line = raw_line.trim_start_matches('\u{feff}').trim();

        if line.is_empty() {
            continue;
        }

        if !seen_first_line {
            seen_first_line = true;
            parsed.has_header = line.starts_with(M3U_HEADER);
        }

        if line.starts_with(LIVE_EXTINF_MARKER) {
            if let Some(block) = pending.take() {
                parsed.malformed += 1;
                debug!(
                    "Dropping entry '{}' from {} at line {}: no stream URL before next entry",
                    block.info.title, source_tag, block.line_number
                );
            }
            if let Some(info) = ExtInf::parse(line) {
                pending = Some(PendingBlock {
                    info,
                    extra_lines: Vec::new(),
                    line_number,
                });
            }
        } else if line.starts_with('#') {
            match pending.as_mut() {
                Some(block) => block.extra_lines.push(line.to_string()),
                None => trace!("Ignoring comment at line {}: {}", line_number, line),
            }
        } else if let Some(block) = pending.take() {
            parsed.entries.push(StreamEntry {
                info: block.info,
                extra_lines: block.extra_lines,
                url: line.to_string(),
                source_tag: source_tag.to_string(),
            });
        } else {
            parsed.orphaned_urls += 1;
            debug!(
                "Ignoring stream URL without EXTINF metadata in {} at line {}",
                source_tag, line_number
            );
        }
    }

    if let Some(block) = pending {
        parsed.malformed += 1;
        debug!(
            "Dropping trailing entry '{}' from {} at line {}: input ended before its URL",
            block.info.title, source_tag, block.line_number
        );
    }

    debug!(
        "Parsed {} entries from {} (malformed={}, orphaned_urls={}, header={})",
        parsed.entries.len(),
        source_tag,
        parsed.malformed,
        parsed.orphaned_urls,
        parsed.has_header
    );

    parsed
}
