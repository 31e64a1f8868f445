//! Configuration for scanning, governance markers and artifact storage.
//!
//! Load order: `.resgraph/config.toml` -> environment variables -> defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::Result;

/// Directory (relative to the project root) that holds config and artifacts.
pub const STATE_DIR: &str = ".resgraph";

/// Top-level resgraph configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    pub scan: ScanConfig,
    pub governance: GovernanceConfig,
    pub storage: StorageConfig,
}

/// Directory walk settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Directory names pruned from the walk (exact name match).
    pub excluded_dirs: Vec<String>,
}

/// Markers searched for in file content.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GovernanceConfig {
    pub governed_marker: String,
    pub semantic_marker: String,
    pub charter_marker: String,
    pub layer_marker: String,
}

/// Where build artifacts and audit events go.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Artifact directory. Relative paths are resolved against the state dir.
    pub artifact_dir: PathBuf,
    /// JSON-lines event log. Relative paths are resolved against the state dir.
    pub event_log: PathBuf,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            excluded_dirs: ["node_modules", ".git", "dist", "build"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self {
            governed_marker: "@GL-governed".to_string(),
            semantic_marker: "@GL-semantic".to_string(),
            charter_marker: "@GL-charter-version".to_string(),
            layer_marker: "@GL-layer".to_string(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            artifact_dir: PathBuf::from("artifacts"),
            event_log: PathBuf::from("events.jsonl"),
        }
    }
}

impl GraphConfig {
    /// Load config from a TOML file, applying environment overrides.
    ///
    /// A missing file yields defaults. A malformed file is logged and
    /// also yields defaults so a bad config never blocks a scan.
    pub fn load(config_path: &Path) -> Self {
        Self::load_with(config_path, |key| std::env::var(key).ok())
    }

    /// `load` with environment lookups routed through `env`.
    fn load_with(config_path: &Path, env: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = match Self::from_file(config_path) {
            Ok(Some(config)) => config,
            Ok(None) => Self::default(),
            Err(e) => {
                warn!(path = %config_path.display(), error = %e, "invalid config, using defaults");
                Self::default()
            }
        };
        config.apply_env(env);
        config
    }

    /// Load `<root>/.resgraph/config.toml`.
    pub fn load_for_root(root: &Path) -> Self {
        Self::load(&root.join(STATE_DIR).join("config.toml"))
    }

    /// Parse a config file strictly. Returns `Ok(None)` when it does not exist.
    pub fn from_file(config_path: &Path) -> Result<Option<Self>> {
        if !config_path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(config_path)
            .map_err(|e| crate::error::GraphError::io(config_path, e))?;
        let config: Self = toml::from_str(&content)?;
        debug!(path = %config_path.display(), "loaded config");
        Ok(Some(config))
    }

    fn apply_env(&mut self, env: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = env("RESGRAPH_ARTIFACT_DIR") {
            if !dir.is_empty() {
                self.storage.artifact_dir = PathBuf::from(dir);
            }
        }
        if let Some(list) = env("RESGRAPH_EXCLUDED_DIRS") {
            let dirs: Vec<String> = list
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            if !dirs.is_empty() {
                self.scan.excluded_dirs = dirs;
            }
        }
    }

    /// Copy of this config whose exclusion list also prunes the state directory.
    pub fn excluding_state_dir(&self) -> Self {
        let mut config = self.clone();
        if !config.scan.excluded_dirs.iter().any(|d| d == STATE_DIR) {
            config.scan.excluded_dirs.push(STATE_DIR.to_string());
        }
        config
    }

    /// Resolve the artifact directory against the state directory.
    pub fn resolve_artifact_dir(&self, state_dir: &Path) -> PathBuf {
        resolve_against(state_dir, &self.storage.artifact_dir)
    }

    /// Resolve the event log path against the state directory.
    pub fn resolve_event_log(&self, state_dir: &Path) -> PathBuf {
        resolve_against(state_dir, &self.storage.event_log)
    }
}

fn resolve_against(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
