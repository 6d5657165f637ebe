use std::path::PathBuf;

use thiserror::Error;

/// Failures that escape the pipeline.
///
/// Per-source parse and IO problems never show up here; they are logged and
/// turned into a missing record by the loader.
#[derive(Error, Debug)]
pub enum PlagError {
    #[error("failed to connect to {url}: {source}")]
    Connection {
        url: String,
        #[source]
        source: rusqlite::Error,
    },
    #[error("collection \"{0}\" not found")]
    MissingCollection(&'static str),
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("invalid config {path}: {reason}")]
    Config { path: PathBuf, reason: String },
    #[error("invalid path pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PlagError>;
