//! Error types for resgraph.

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by the resource graph pipeline.
#[derive(Debug, Error)]
pub enum GraphError {
    /// The scan root does not exist or is not a directory.
    #[error("scan root not found: {0}")]
    RootNotFound(PathBuf),

    /// A filesystem operation failed.
    #[error("i/o error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The configuration file could not be parsed.
    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),

    /// A path pattern could not be compiled into a matcher.
    #[error("invalid path pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("artifact not found: {0}")]
    ArtifactNotFound(String),

    /// A stored artifact does not hold a resource graph.
    #[error("invalid artifact {id}: {reason}")]
    InvalidArtifact { id: String, reason: String },

    /// A graph payload references nodes it does not contain.
    #[error("invalid graph: {0}")]
    InvalidGraph(String),
}

impl GraphError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        GraphError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, GraphError>;
