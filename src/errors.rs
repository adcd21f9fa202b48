use std::io;

use thiserror::Error;

/// Error type for pipeline configuration, IO, and stage execution failures.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("record codec failure: {0}")]
    Codec(#[from] serde_json::Error),
    #[error("checkpoint failure: {0}")]
    Checkpoint(String),
    #[error("output of step '{step}' could not be located: {detail}")]
    MissingDependency { step: String, detail: String },
    #[error("step '{step}' produced {parts} result partitions where exactly one was expected")]
    AmbiguousOutput { step: String, parts: usize },
    #[error("no language configuration found for code '{0}'")]
    UnknownLanguage(String),
}
