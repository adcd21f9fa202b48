#![doc = include_str!("../README.md")]

/// Invocation settings and per-language configuration.
pub mod config;
/// Directory, file, and counter name constants shared across stages.
pub mod constants;
/// Named counters tallied by stages and persisted with checkpoints.
pub mod counters;
/// Error types for the whole crate.
pub mod errors;
/// Local data-parallel map/combine/reduce runner.
pub mod mapreduce;
/// Sorted-stream cursor for the final merge-join.
pub mod merge;
/// Record types flowing between stages.
pub mod model;
/// Stage orchestration and the run report.
pub mod pipeline;
/// Keyed part-file IO.
pub mod records;
/// Resumable stage contract: checkpoints and completion markers.
pub mod step;
/// The pipeline stages themselves.
pub mod steps;
/// Common type aliases.
pub mod types;
/// Title normalization and field escaping.
pub mod utils;

pub use config::{LanguageConfig, LanguageInfo, PipelineConfig};
pub use errors::ExtractError;
pub use pipeline::{Pipeline, PipelineReport};
