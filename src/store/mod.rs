//! Persistence collaborators: artifact storage and the audit event stream.
//!
//! The pipeline only talks to these traits. File-backed implementations are
//! used by the CLI; the in-memory ones back tests and embedding callers.

pub mod artifacts;
pub mod events;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

pub use artifacts::{FileArtifactStore, MemoryArtifactStore};
pub use events::{JsonlEventStream, MemoryEventStream, TracingEventStream};

/// A stored, opaque JSON document with identifying metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub id: String,
    #[serde(rename = "type")]
    pub artifact_type: String,
    pub name: String,
    pub content: Value,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub metadata: Value,
}

/// Listing view of an artifact (no content).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactSummary {
    pub id: String,
    #[serde(rename = "type")]
    pub artifact_type: String,
    pub name: String,
    pub timestamp: DateTime<Utc>,
}

impl From<&Artifact> for ArtifactSummary {
    fn from(artifact: &Artifact) -> Self {
        Self {
            id: artifact.id.clone(),
            artifact_type: artifact.artifact_type.clone(),
            name: artifact.name.clone(),
            timestamp: artifact.timestamp,
        }
    }
}

/// One audit record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GovernanceEvent {
    pub event_type: String,
    pub layer: String,
    pub semantic_anchor: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub metadata: Value,
}

/// Key-value persistence for artifacts.
pub trait ArtifactStore: Send + Sync {
    fn store_artifact(&self, artifact: &Artifact) -> Result<()>;

    /// `Ok(None)` when no artifact has this id.
    fn load_artifact(&self, id: &str) -> Result<Option<Artifact>>;

    /// Summaries ordered oldest first.
    fn list_artifacts(&self) -> Result<Vec<ArtifactSummary>>;
}

/// Sink for audit events.
pub trait EventStream: Send + Sync {
    fn log_event(&self, event: &GovernanceEvent) -> Result<()>;
}

/// Sort oldest first; ties broken by id so listings are stable.
fn sort_summaries(summaries: &mut [ArtifactSummary]) {
    summaries.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.id.cmp(&b.id)));
}
