//! Playlist generation
//!
//! Renders a [`PlaylistDocument`] as EXTM3U text and writes it to disk. The
//! output always starts with exactly one `#EXTM3U` line; source playlists are
//! parsed before they get here, so their own headers never reach the output.

use std::path::{Path, PathBuf};
use std::time::Instant;

use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::errors::AppResult;
use crate::models::PlaylistDocument;
use crate::sources::m3u::M3U_HEADER;

/// Rendering switches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Precede every section with a `# --- Content from <source> ---` comment
    pub section_comments: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            section_comments: true,
        }
    }
}

/// Render the merged document as playlist text
pub fn render(document: &PlaylistDocument, options: &RenderOptions) -> String {
    let mut out = String::from(M3U_HEADER);
    out.push('\n');

    for section in &document.sections {
        if options.section_comments {
            out.push_str(&format!("\n# --- Content from {} ---\n\n", section.source));
        }
        for entry in &section.entries {
            entry.render_into(&mut out);
        }
    }

    out
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "playlist".into());
    name.push(".tmp");
    path.with_file_name(name)
}

async fn write_then_rename(temp_path: &Path, path: &Path, content: &str) -> std::io::Result<()> {
    let file = tokio::fs::File::create(temp_path).await?;
    let mut writer = tokio::io::BufWriter::new(file);
    writer.write_all(content.as_bytes()).await?;
    writer.flush().await?;
    drop(writer);
    debug!("Wrote temporary playlist {:?}", temp_path);

    tokio::fs::rename(temp_path, path).await
}

/// Write playlist text to `path`, creating parent directories as needed
///
/// The content is written to a sibling temporary file first and renamed
/// into place, so readers never observe a half-written playlist.
pub async fn write_playlist(path: &Path, content: &str) -> AppResult<u64> {
    let write_start = Instant::now();

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let temp_path = temp_path_for(path);
    if let Err(e) = write_then_rename(&temp_path, path, content).await {
        if tokio::fs::remove_file(&temp_path).await.is_ok() {
            debug!("Removed temporary playlist {:?} after failed write", temp_path);
        }
        return Err(e.into());
    }

    let bytes_written = content.len() as u64;
    info!(
        "Saved playlist to {:?}: bytes={} duration={:?}",
        path,
        bytes_written,
        write_start.elapsed()
    );
    Ok(bytes_written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExtInf, StreamEntry};

    fn entry(title: &str, url: &str) -> StreamEntry {
        StreamEntry::new(ExtInf::new(title), url, "t")
    }

    #[test]
    fn test_render_empty_document_is_header_only() {
        let out = render(&PlaylistDocument::new(), &RenderOptions::default());
        assert_eq!(out, "#EXTM3U\n");
    }

    #[test]
    fn test_render_with_section_comments() {
        let mut doc = PlaylistDocument::new();
        doc.push_section("A", vec![entry("One", "http://a/1")]);
        doc.push_section("B", vec![entry("Two", "http://b/2")]);

        let out = render(&doc, &RenderOptions::default());
        assert_eq!(
            out,
            "#EXTM3U\n\n# --- Content from A ---\n\n#EXTINF:-1,One\nhttp://a/1\n\n# --- Content from B ---\n\n#EXTINF:-1,Two\nhttp://b/2\n"
        );
        assert_eq!(out.matches("#EXTM3U").count(), 1);
    }

    #[test]
    fn test_render_without_section_comments() {
        let mut doc = PlaylistDocument::new();
        doc.push_section("A", vec![entry("One", "http://a/1")]);
        let out = render(
            &doc,
            &RenderOptions {
                section_comments: false,
            },
        );
        assert_eq!(out, "#EXTM3U\n#EXTINF:-1,One\nhttp://a/1\n");
    }

    #[tokio::test]
    async fn test_write_playlist_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("MyStuff").join("MyStuff.m3u");

        let written = write_playlist(&path, "#EXTM3U\n").await.unwrap();
        assert_eq!(written, 8);
        assert_eq!(tokio::fs::read_to_string(&path).await.unwrap(), "#EXTM3U\n");
        assert!(!temp_path_for(&path).exists());
    }

    #[tokio::test]
    async fn test_failed_rename_removes_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        // a non-empty directory at the target path makes the rename fail
        let path = dir.path().join("playlist.m3u");
        std::fs::create_dir_all(path.join("occupied")).unwrap();

        let result = write_playlist(&path, "#EXTM3U\n").await;
        assert!(matches!(result, Err(crate::errors::AppError::Io(_))));
        assert!(!temp_path_for(&path).exists());
        assert!(path.is_dir());
    }

    #[tokio::test]
    async fn test_write_playlist_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.m3u");
        tokio::fs::write(&path, "old content that is longer").await.unwrap();

        write_playlist(&path, "#EXTM3U\n#EXTINF:-1,New\nhttp://n/1\n").await.unwrap();
        assert_eq!(
            tokio::fs::read_to_string(&path).await.unwrap(),
            "#EXTM3U\n#EXTINF:-1,New\nhttp://n/1\n"
        );
    }
}
