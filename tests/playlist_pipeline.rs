use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use m3u_aggregator::config::Config;
use m3u_aggregator::errors::{SourceError, SourceResult};
use m3u_aggregator::pipeline::{write_playlist, PlaylistOrchestrator, SourceOutcome};
use m3u_aggregator::sources::PlaylistFetcher;

/// Serves canned bodies keyed by endpoint, everything else is a 404
struct StaticFetcher {
    bodies: HashMap<String, String>,
}

impl StaticFetcher {
    fn new(bodies: &[(&str, &str)]) -> Arc<Self> {
        Arc::new(Self {
            bodies: bodies
                .iter()
                .map(|(url, body)| (url.to_string(), body.to_string()))
                .collect(),
        })
    }
}

#[async_trait]
impl PlaylistFetcher for StaticFetcher {
    async fn fetch(&self, endpoint: &str, _timeout: Duration) -> SourceResult<String> {
        self.bodies.get(endpoint).cloned().ok_or_else(|| SourceError::Http {
            status: 404,
            url: endpoint.to_string(),
        })
    }
}

async fn run(config_toml: &str, fetcher: Arc<StaticFetcher>) -> m3u_aggregator::pipeline::PlaylistRun {
    let config = Config::from_toml_str(config_toml).unwrap();
    PlaylistOrchestrator::from_config(&config, fetcher)
        .unwrap()
        .run()
        .await
}

#[tokio::test]
async fn test_empty_source_is_skipped_and_header_written_once() {
    let fetcher = StaticFetcher::new(&[
        (
            "https://a.example/a.m3u",
            "#EXTM3U\n#EXTINF:-1 group-title=\"News\",BBC News\nhttp://a/1\n",
        ),
        (
            "https://b.example/b.m3u",
            "#EXTM3U\n#EXTINF:-1 group-title=\"Sky Sports Main\",Sky Sports Main Event\nhttp://x/1\n",
        ),
    ]);

    let result = run(
        r#"
[output]
section_comments = false

[[sources]]
name = "A"
url = "https://a.example/a.m3u"
[sources.policy]
mode = "group-include"
groups = ["Sky Sports Main"]
group_label = "A"

[[sources]]
name = "B"
url = "https://b.example/b.m3u"
[sources.policy]
mode = "group-include"
groups = ["Sky Sports Main"]
group_label = "ZXIPTV"
"#,
        fetcher,
    )
    .await;

    assert_eq!(
        result.content,
        "#EXTM3U\n#EXTINF:-1 group-title=\"ZXIPTV\",Sky Sports Main Event\nhttp://x/1\n"
    );
    assert!(matches!(
        result.report.sources[0].outcome,
        SourceOutcome::Empty { parsed: 1, discarded: 1, .. }
    ));
    assert_eq!(result.report.included_sources(), 1);
}

#[tokio::test]
async fn test_fetch_failure_does_not_block_other_sources() {
    let fetcher = StaticFetcher::new(&[(
        "https://ok.example/list.m3u",
        "#EXTM3U\n#EXTINF:-1,Some Channel\nhttp://ok/1\n",
    )]);

    let result = run(
        r#"
[[sources]]
name = "Down"
url = "https://down.example/list.m3u"

[[sources]]
name = "DDL"
url = "https://ok.example/list.m3u"
[sources.policy]
mode = "keyword-exclude"
exclude_keywords = ["nfl", "cricket"]
default_attributes = [
    { name = "tvg-name", value = "Live Event" },
    { name = "group-title", value = "Unknown" },
]
"#,
        fetcher,
    )
    .await;

    assert!(matches!(
        result.report.sources[0].outcome,
        SourceOutcome::FetchFailed { .. }
    ));
    assert_eq!(
        result.content,
        "#EXTM3U\n\n# --- Content from DDL ---\n\n#EXTINF:-1 tvg-name=\"Live Event\" group-title=\"Unknown\",Some Channel\nhttp://ok/1\n"
    );
}

#[tokio::test]
async fn test_passthrough_preserves_urls_and_attributes() {
    let playlist = "#EXTM3U\n\
        #EXTINF:-1 tvg-id=\"bbc1.uk\" tvg-logo=\"http://logo/bbc1.png\" group-title=\"UK\",BBC One\n\
        #EXTVLCOPT:http-user-agent=Mozilla\n\
        http://stream/bbc1\n\
        #EXTINF:-1 tvg-id=\"itv1.uk\",ITV1, London\n\
        http://stream/itv1\n";
    let fetcher = StaticFetcher::new(&[("https://wac.example/WAC.m3u8", playlist)]);

    let result = run(
        r#"
[output]
section_comments = false

[[sources]]
name = "WAC"
url = "https://wac.example/WAC.m3u8"
"#,
        fetcher,
    )
    .await;

    assert_eq!(
        result.content,
        "#EXTM3U\n\
        #EXTINF:-1 tvg-id=\"bbc1.uk\" tvg-logo=\"http://logo/bbc1.png\" group-title=\"UK\",BBC One\n\
        #EXTVLCOPT:http-user-agent=Mozilla\n\
        http://stream/bbc1\n\
        #EXTINF:-1 tvg-id=\"itv1.uk\",ITV1, London\n\
        http://stream/itv1\n"
    );
    assert_eq!(result.document.entry_count(), 2);
}

#[tokio::test]
async fn test_inline_and_env_sources_merge_in_order() {
    std::env::set_var(
        "M3U_AGGREGATOR_IT_LOCAL_CHANNELS",
        "#EXTM3U\n#EXTINF:-1 group-title=\"Local\",Local One\nhttp://local/1\n",
    );

    let result = run(
        r##"
[output]
section_comments = false

[[sources]]
name = "Inline"
inline = "#EXTINF:-1,Inline One\nhttp://inline/1\n"

[[sources]]
name = "LocalChannels"
content_env = "M3U_AGGREGATOR_IT_LOCAL_CHANNELS"
"##,
        StaticFetcher::new(&[]),
    )
    .await;

    let urls: Vec<_> = result.document.entries().map(|e| e.url.as_str()).collect();
    assert_eq!(urls, vec!["http://inline/1", "http://local/1"]);
    assert_eq!(result.content.matches("#EXTM3U").count(), 1);
}

#[tokio::test]
async fn test_keyword_include_relabels_and_cleans_titles() {
    let fetcher = StaticFetcher::new(&[(
        "https://fstv.example/list.m3u",
        "#EXTM3U\n\
        #EXTINF:-1 group-title=\"Sports\",UK: Sky Sports Premier League (Backup) [HD]\n\
        http://fstv/1\n\
        #EXTINF:-1 group-title=\"Sports\",Sky Sports Arena\n\
        http://fstv/2\n\
        #EXTINF:-1 group-title=\"Movies\",Sky Cinema\n\
        http://fstv/3\n",
    )]);

    let result = run(
        r#"
[output]
section_comments = false

[[sources]]
name = "FSTVL"
url = "https://fstv.example/list.m3u"
[sources.policy]
mode = "keyword-include"
keywords = ["sky sports"]
negative_guard = "arena"
group_label = "FSTVL"
strip_prefixes = ["UK:"]
"#,
        fetcher,
    )
    .await;

    let entries: Vec<_> = result.document.entries().collect();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].title(), "Sky Sports Premier League");
    assert_eq!(entries[0].attribute("tvg-name"), Some("Sky Sports Premier League"));
    assert_eq!(entries[0].group_title(), Some("FSTVL"));
    assert_eq!(entries[0].url, "http://fstv/1");
}

#[tokio::test]
async fn test_all_sources_failing_still_writes_header() {
    let result = run(
        r#"
[[sources]]
name = "Gone"
url = "https://gone.example/list.m3u"
"#,
        StaticFetcher::new(&[]),
    )
    .await;

    assert_eq!(result.content, "#EXTM3U\n");

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out").join("playlist.m3u");
    write_playlist(&path, &result.content).await.unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "#EXTM3U\n");
}
