//! Source aggregation
//!
//! Takes the fetched text (or fetch error) of every source in priority order,
//! runs each through the parser and its filter engine, and assembles the
//! merged [`PlaylistDocument`]. Sources never affect one another, and no
//! per-source failure is fatal.

use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::errors::SourceResult;
use crate::models::{PlaylistDocument, SourcePolicy, StreamEntry};
use crate::pipeline::filter_engine::FilterEngine;
use crate::sources::m3u::parse_m3u;

/// One source ready for aggregation
#[derive(Debug)]
pub struct SourceInput {
    pub name: String,
    /// Fetched playlist text, or why it could not be fetched
    pub content: SourceResult<String>,
    pub policy: SourcePolicy,
}

impl SourceInput {
    pub fn new<N: Into<String>>(name: N, content: SourceResult<String>, policy: SourcePolicy) -> Self {
        Self {
            name: name.into(),
            content,
            policy,
        }
    }
}

/// What happened to one source during aggregation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceOutcome {
    /// The source contributed `entries` entries to the document
    Included {
        entries: usize,
        discarded: usize,
        malformed: usize,
        duplicates: usize,
    },
    /// The source could not be fetched and was skipped
    FetchFailed { error: String },
    /// Nothing survived parsing and filtering
    Empty {
        parsed: usize,
        discarded: usize,
        malformed: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceReport {
    pub name: String,
    pub outcome: SourceOutcome,
}

/// Per-source outcomes of one aggregation run, in source order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregationReport {
    pub sources: Vec<SourceReport>,
}

impl AggregationReport {
    pub fn included_sources(&self) -> usize {
        self.sources
            .iter()
            .filter(|s| matches!(s.outcome, SourceOutcome::Included { .. }))
            .count()
    }

    pub fn skipped_sources(&self) -> impl Iterator<Item = &SourceReport> {
        self.sources
            .iter()
            .filter(|s| !matches!(s.outcome, SourceOutcome::Included { .. }))
    }

    pub fn total_entries(&self) -> usize {
        self.sources
            .iter()
            .map(|s| match s.outcome {
                SourceOutcome::Included { entries, .. } => entries,
                _ => 0,
            })
            .sum()
    }
}

/// Merges sources into one document
#[derive(Debug, Clone)]
pub struct Aggregator {
    deduplicate: bool,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self { deduplicate: true }
    }
}

impl Aggregator {
    pub fn new(deduplicate: bool) -> Self {
        Self { deduplicate }
    }

    /// Parse, filter and merge `sources` in the given order
    pub fn aggregate(&self, sources: Vec<SourceInput>) -> (PlaylistDocument, AggregationReport) {
        let mut document = PlaylistDocument::new();
        let mut report = AggregationReport::default();

        for source in sources {
            let outcome = match source.content {
                Err(error) => {
                    warn!("Skipping source '{}': {}", source.name, error);
                    SourceOutcome::FetchFailed {
                        error: error.to_string(),
                    }
                }
                Ok(text) => {
                    let (entries, outcome) = self.process_source(&source.name, &text, &source.policy);
                    document.push_section(source.name.as_str(), entries);
                    outcome
                }
            };

            report.sources.push(SourceReport {
                name: source.name,
                outcome,
            });
        }

        info!(
            "Aggregated {} entries from {} of {} sources",
            document.entry_count(),
            report.included_sources(),
            report.sources.len()
        );

        (document, report)
    }

    fn process_source(
        &self,
        name: &str,
        text: &str,
        policy: &SourcePolicy,
    ) -> (Vec<StreamEntry>, SourceOutcome) {
        let parsed = parse_m3u(text, name);
        let parsed_count = parsed.entries.len();
        if !parsed.has_header {
            debug!("Source '{}' has no #EXTM3U header", name);
        }

        let engine = FilterEngine::new(policy);
        let (mut entries, stats) = engine.filter_entries(parsed.entries);

        let duplicates = if self.deduplicate {
            remove_duplicates(&mut entries)
        } else {
            0
        };
        if duplicates > 0 {
            info!("Removed {} duplicate entries from source '{}'", duplicates, name);
        }

        if entries.is_empty() {
            warn!(
                "No content to add from source '{}' ({} parsed, {} filtered out by {})",
                name,
                parsed_count,
                stats.discarded,
                engine.mode()
            );
            return (
                entries,
                SourceOutcome::Empty {
                    parsed: parsed_count,
                    discarded: stats.discarded,
                    malformed: parsed.malformed,
                },
            );
        }

        info!(
            "Added {} entries from source '{}' ({} filtered out, {} malformed)",
            entries.len(),
            name,
            stats.discarded,
            parsed.malformed
        );
        let outcome = SourceOutcome::Included {
            entries: entries.len(),
            discarded: stats.discarded,
            malformed: parsed.malformed,
            duplicates,
        };
        (entries, outcome)
    }
}

/// Drop repeated (URL, title) pairs, keeping the first occurrence
fn remove_duplicates(entries: &mut Vec<StreamEntry>) -> usize {
    let before = entries.len();
    let mut seen = HashSet::new();
    entries.retain(|e| seen.insert((e.url.clone(), e.info.title.clone())));
    before - entries.len()
}

/// Aggregate with the default settings (within-source de-duplication on)
pub fn aggregate(sources: Vec<SourceInput>) -> (PlaylistDocument, AggregationReport) {
    Aggregator::default().aggregate(sources)
}
