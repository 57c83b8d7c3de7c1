//! One end-to-end aggregation run: load, aggregate, render

use std::sync::Arc;
use std::time::Instant;

use tracing::info;

use crate::config::{Config, SourceConfig};
use crate::errors::AppResult;
use crate::models::PlaylistDocument;
use crate::pipeline::aggregator::{AggregationReport, Aggregator};
use crate::pipeline::generation::{render, RenderOptions};
use crate::sources::{PlaylistFetcher, SourceLoader};

/// Result of a completed run
#[derive(Debug)]
pub struct PlaylistRun {
    pub document: PlaylistDocument,
    pub report: AggregationReport,
    /// Rendered playlist text
    pub content: String,
}

/// Drives every configured source through the pipeline
pub struct PlaylistOrchestrator {
    sources: Vec<SourceConfig>,
    loader: SourceLoader,
    aggregator: Aggregator,
    render_options: RenderOptions,
}

impl PlaylistOrchestrator {
    pub fn from_config(config: &Config, fetcher: Arc<dyn PlaylistFetcher>) -> AppResult<Self> {
        let loader = SourceLoader::new(
            fetcher,
            config.fetch.timeout_duration()?,
            config.fetch.max_concurrent_fetches,
        );

        Ok(Self {
            sources: config.sources.clone(),
            loader,
            aggregator: Aggregator::new(config.aggregation.deduplicate),
            render_options: RenderOptions {
                section_comments: config.output.section_comments,
            },
        })
    }

    /// Load all sources and build the merged playlist
    ///
    /// Never fails: a source that cannot be loaded is skipped and recorded
    /// in the report.
    pub async fn run(&self) -> PlaylistRun {
        let started = Instant::now();

        let inputs = self.loader.load_all(&self.sources).await;
        let (document, report) = self.aggregator.aggregate(inputs);
        let content = render(&document, &self.render_options);

        info!(
            "Playlist built with {} entries from {} sources in {:?}",
            document.entry_count(),
            report.included_sources(),
            started.elapsed()
        );

        PlaylistRun {
            document,
            report,
            content,
        }
    }
}
