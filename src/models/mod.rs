//! Playlist data model
//!
//! [`StreamEntry`] is one playable channel, [`PlaylistDocument`] is the merged
//! output assembled from per-source [`PlaylistSection`]s.

pub mod extinf;
pub mod policy;

pub use extinf::{ExtInf, EXTINF_PREFIX, UNTITLED};
pub use policy::{DefaultAttribute, PlaceholderIdentity, SourcePolicy};

/// Well-known EXTINF attribute names
pub mod attrs {
    pub const TVG_ID: &str = "tvg-id";
    pub const TVG_NAME: &str = "tvg-name";
    pub const TVG_LOGO: &str = "tvg-logo";
    pub const GROUP_TITLE: &str = "group-title";
}

/// One stream: metadata line, optional option lines, and its URL
///
/// Only the parser constructs entries from text, and it never emits one
/// without both a metadata line and a non-empty URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamEntry {
    pub info: ExtInf,
    /// Comment lines found between the metadata line and the URL
    pub extra_lines: Vec<String>,
    pub url: String,
    /// Originating source name; not part of the rendered output
    pub source_tag: String,
}

impl StreamEntry {
    pub fn new<U: Into<String>, S: Into<String>>(info: ExtInf, url: U, source_tag: S) -> Self {
        Self {
            info,
            extra_lines: Vec::new(),
            url: url.into(),
            source_tag: source_tag.into(),
        }
    }

    pub fn title(&self) -> &str {
        &self.info.title
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.info.get(key)
    }

    pub fn group_title(&self) -> Option<&str> {
        self.info.get(attrs::GROUP_TITLE)
    }

    /// Append the entry's playlist lines to `out`
    pub fn render_into(&self, out: &mut String) {
        out.push_str(&self.info.to_string());
        out.push('\n');
        for line in &self.extra_lines {
            out.push_str(line);
            out.push('\n');
        }
        out.push_str(&self.url);
        out.push('\n');
    }
}

/// Entries contributed by one source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistSection {
    pub source: String,
    pub entries: Vec<StreamEntry>,
}

/// The merged playlist, in source priority order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaylistDocument {
    pub sections: Vec<PlaylistSection>,
}

impl PlaylistDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a section; empty sections are ignored
    pub fn push_section<S: Into<String>>(&mut self, source: S, entries: Vec<StreamEntry>) -> bool {
        if entries.is_empty() {
            return false;
        }
        self.sections.push(PlaylistSection {
            source: source.into(),
            entries,
        });
        true
    }

    pub fn entry_count(&self) -> usize {
        self.sections.iter().map(|s| s.entries.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// All entries in output order
    pub fn entries(&self) -> impl Iterator<Item = &StreamEntry> {
        self.sections.iter().flat_map(|s| s.entries.iter())
    }
}
