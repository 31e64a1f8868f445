//! Artifact store backends.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::{debug, warn};

use super::{sort_summaries, Artifact, ArtifactStore, ArtifactSummary};
use crate::error::{GraphError, Result};

/// One pretty-printed JSON file per artifact, named `<id>.json`.
#[derive(Debug, Clone)]
pub struct FileArtifactStore {
    dir: PathBuf,
}

impl FileArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `None` for ids that would escape the store directory.
    fn artifact_path(&self, id: &str) -> Option<PathBuf> {
        if id.is_empty() || id.contains(['/', '\\']) || id.starts_with('.') {
            return None;
        }
        Some(self.dir.join(format!("{id}.json")))
    }

    fn read(path: &Path) -> Result<Artifact> {
        let json = fs::read_to_string(path).map_err(|e| GraphError::io(path, e))?;
        Ok(serde_json::from_str(&json)?)
    }
}

impl ArtifactStore for FileArtifactStore {
    fn store_artifact(&self, artifact: &Artifact) -> Result<()> {
        let path = self.artifact_path(&artifact.id).ok_or_else(|| {
            GraphError::InvalidArtifact {
                id: artifact.id.clone(),
                reason: "id is not a valid file name".to_string(),
            }
        })?;
        fs::create_dir_all(&self.dir).map_err(|e| GraphError::io(&self.dir, e))?;
        let json = serde_json::to_string_pretty(artifact)?;
        fs::write(&path, json).map_err(|e| GraphError::io(&path, e))?;
        debug!(id = %artifact.id, path = %path.display(), "artifact stored");
        Ok(())
    }

    fn load_artifact(&self, id: &str) -> Result<Option<Artifact>> {
        let Some(path) = self.artifact_path(id) else {
            return Ok(None);
        };
        if !path.exists() {
            return Ok(None);
        }
        Self::read(&path).map(Some)
    }

    fn list_artifacts(&self) -> Result<Vec<ArtifactSummary>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let entries = fs::read_dir(&self.dir).map_err(|e| GraphError::io(&self.dir, e))?;

        let mut summaries = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| GraphError::io(&self.dir, e))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match Self::read(&path) {
                Ok(artifact) => summaries.push(ArtifactSummary::from(&artifact)),
                Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable artifact"),
            }
        }
        sort_summaries(&mut summaries);
        Ok(summaries)
    }
}

/// Process-local store.
#[derive(Debug, Default)]
pub struct MemoryArtifactStore {
    artifacts: RwLock<HashMap<String, Artifact>>,
}

impl MemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.artifacts.read().map(|a| a.len()).unwrap_or_else(|e| e.into_inner().len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ArtifactStore for MemoryArtifactStore {
    fn store_artifact(&self, artifact: &Artifact) -> Result<()> {
        let mut artifacts = self.artifacts.write().unwrap_or_else(|e| e.into_inner());
        artifacts.insert(artifact.id.clone(), artifact.clone());
        Ok(())
    }

    fn load_artifact(&self, id: &str) -> Result<Option<Artifact>> {
        let artifacts = self.artifacts.read().unwrap_or_else(|e| e.into_inner());
        Ok(artifacts.get(id).cloned())
    }

    fn list_artifacts(&self) -> Result<Vec<ArtifactSummary>> {
        let artifacts = self.artifacts.read().unwrap_or_else(|e| e.into_inner());
        let mut summaries: Vec<ArtifactSummary> =
            artifacts.values().map(ArtifactSummary::from).collect();
        sort_summaries(&mut summaries);
        Ok(summaries)
    }
}
