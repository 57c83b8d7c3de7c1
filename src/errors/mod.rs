//! Centralized error handling for the M3U aggregator
//!
//! Errors are split by layer:
//!
//! - **Source Errors**: fetching a single playlist source failed. These are
//!   never fatal to a run; the aggregator turns them into a skipped source.
//! - **Application Errors**: configuration, I/O and validation failures in
//!   the outer shell, which do abort the run.
//!
//! # Usage
//!
//! ```rust
//! use m3u_aggregator::errors::{AppError, AppResult};
//!
//! fn example_function() -> AppResult<String> {
//!     Err(AppError::validation("no sources configured"))
//! }
//! ```

pub mod types;

pub use types::*;

/// Convenience type alias for Results using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Convenience type alias for Source Results
pub type SourceResult<T> = Result<T, SourceError>;
