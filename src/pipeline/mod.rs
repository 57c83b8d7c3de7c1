//! Ingestion and normalization pipeline
//!
//! parse ([`crate::sources::m3u`]) -> filter/rewrite ([`filter_engine`]) ->
//! merge ([`aggregator`]) -> render ([`generation`]). [`orchestrator`] ties
//! the stages to source loading.

pub mod aggregator;
pub mod filter_engine;
pub mod generation;
pub mod orchestrator;

pub use aggregator::{aggregate, AggregationReport, Aggregator, SourceInput, SourceOutcome, SourceReport};
pub use filter_engine::{FilterEngine, FilterStats};
pub use generation::{render, write_playlist, RenderOptions};
pub use orchestrator::{PlaylistOrchestrator, PlaylistRun};
