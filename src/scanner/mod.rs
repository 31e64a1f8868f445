//! Repository scanner: walks a directory tree and classifies every file.
//!
//! Prunes excluded directory names, reads each file, classifies it by
//! extension and records which governance markers its content carries.
//! A file that cannot be read still produces a (defaulted) result.

pub mod classify;

use chrono::{DateTime, Utc};
use ignore::WalkBuilder;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, info, warn};

pub use classify::{Language, ResourceFormat, ResourceType};

use crate::config::{GovernanceConfig, GraphConfig};
use crate::error::{GraphError, Result};

/// Classification and governance flags for one scanned file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    /// Path relative to the scan root, `/`-separated.
    pub path: String,
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    pub language: Language,
    pub format: ResourceFormat,
    pub size: u64,
    pub last_modified: DateTime<Utc>,
    pub has_governance_tag: bool,
    pub has_semantic_anchor: bool,
    pub has_charter_version: bool,
}

impl ScanResult {
    /// Result recorded for a file whose content or metadata could not be read.
    pub fn unreadable(path: String) -> Self {
        Self {
            path,
            resource_type: ResourceType::Unknown,
            language: Language::Unspecified,
            format: ResourceFormat::Binary,
            size: 0,
            last_modified: DateTime::<Utc>::from(SystemTime::UNIX_EPOCH),
            has_governance_tag: false,
            has_semantic_anchor: false,
            has_charter_version: false,
        }
    }

    /// True when any of the three governance markers is absent.
    pub fn missing_governance_tags(&self) -> bool {
        !(self.has_governance_tag && self.has_semantic_anchor && self.has_charter_version)
    }
}

/// Walks a repository and keeps the results of the latest scan.
#[derive(Debug, Clone)]
pub struct Scanner {
    excluded_dirs: HashSet<String>,
    markers: GovernanceConfig,
    results: BTreeMap<String, ScanResult>,
}

impl Scanner {
    pub fn new(config: &GraphConfig) -> Self {
        Self {
            excluded_dirs: config.scan.excluded_dirs.iter().cloned().collect(),
            markers: config.governance.clone(),
            results: BTreeMap::new(),
        }
    }

    /// Scan every non-excluded file under `root`.
    ///
    /// Replaces the results of any previous scan. Returns the results
    /// ordered by path.
    pub fn scan_repository(&mut self, root: &Path) -> Result<Vec<ScanResult>> {
        if !root.is_dir() {
            return Err(GraphError::RootNotFound(root.to_path_buf()));
        }

        let files = self.collect_files(root);
        debug!(root = %root.display(), file_count = files.len(), "scanning files");

        self.results = self
            .scan_files(&files)
            .into_iter()
            .map(|result| (result.path.clone(), result))
            .collect();

        info!(
            root = %root.display(),
            files = self.results.len(),
            "scan complete"
        );
        Ok(self.results.values().cloned().collect())
    }

    /// Walk `root`, returning (absolute, root-relative) paths of all files.
    fn collect_files(&self, root: &Path) -> Vec<(PathBuf, String)> {
        let excluded = self.excluded_dirs.clone();
        let walker = WalkBuilder::new(root)
            .hidden(false)
            .ignore(false)
            .parents(false)
            .git_ignore(false)
            .git_global(false)
            .git_exclude(false)
            .filter_entry(move |entry| {
                let is_dir = entry.file_type().is_some_and(|ft| ft.is_dir());
                entry.depth() == 0
                    || !is_dir
                    || !excluded.contains(entry.file_name().to_string_lossy().as_ref())
            })
            .build();

        let mut files = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "skipping unreadable directory entry");
                    continue;
                }
            };
            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }
            let rel = relative_path(root, entry.path());
            files.push((entry.into_path(), rel));
        }
        files
    }

    /// Read and classify collected files in parallel.
    ///
    /// A file that vanished or became unreadable since the walk yields a
    /// defaulted result instead of failing the batch.
    fn scan_files(&self, files: &[(PathBuf, String)]) -> Vec<ScanResult> {
        let markers = &self.markers;
        files
            .par_iter()
            .map(|(abs, rel)| scan_file(abs, rel.clone(), markers))
            .collect()
    }

    pub fn get(&self, path: &str) -> Option<&ScanResult> {
        self.results.get(path)
    }

    pub fn results(&self) -> impl Iterator<Item = &ScanResult> {
        self.results.values()
    }

    pub fn by_type(&self, resource_type: ResourceType) -> Vec<&ScanResult> {
        self.results
            .values()
            .filter(|r| r.resource_type == resource_type)
            .collect()
    }

    pub fn by_language(&self, language: Language) -> Vec<&ScanResult> {
        self.results
            .values()
            .filter(|r| r.language == language)
            .collect()
    }

    /// Files lacking at least one of the governance markers.
    pub fn missing_governance_tags(&self) -> Vec<&ScanResult> {
        self.results
            .values()
            .filter(|r| r.missing_governance_tags())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Aggregate counts over the latest scan.
    pub fn summary(&self) -> ScanSummary {
        let mut summary = ScanSummary::default();
        for result in self.results.values() {
            summary.total_files += 1;
            *summary
                .by_type
                .entry(result.resource_type.to_string())
                .or_default() += 1;
            *summary
                .by_language
                .entry(result.language.to_string())
                .or_default() += 1;
            if result.missing_governance_tags() {
                summary.missing_governance += 1;
            }
        }
        summary
    }
}

/// Read and classify a single file. Never fails.
fn scan_file(abs: &Path, rel: String, markers: &GovernanceConfig) -> ScanResult {
    let metadata = match fs::metadata(abs) {
        Ok(m) => m,
        Err(e) => {
            warn!(file = %abs.display(), error = %e, "cannot stat file");
            return ScanResult::unreadable(rel);
        }
    };
    let bytes = match fs::read(abs) {
        Ok(b) => b,
        Err(e) => {
            warn!(file = %abs.display(), error = %e, "cannot read file");
            return ScanResult::unreadable(rel);
        }
    };
    let content = String::from_utf8_lossy(&bytes);
    let last_modified = metadata
        .modified()
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| DateTime::<Utc>::from(SystemTime::UNIX_EPOCH));

    let path = Path::new(&rel);
    ScanResult {
        resource_type: ResourceType::from_path(path),
        language: Language::from_path(path),
        format: ResourceFormat::from_path(path),
        size: metadata.len(),
        last_modified,
        has_governance_tag: content.contains(&markers.governed_marker),
        has_semantic_anchor: content.contains(&markers.semantic_marker),
        has_charter_version: content.contains(&markers.charter_marker),
        path: rel,
    }
}

/// Root-relative path with `/` separators regardless of platform.
pub(crate) fn relative_path(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Counts over one scan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanSummary {
    pub total_files: usize,
    pub by_type: BTreeMap<String, usize>,
    pub by_language: BTreeMap<String, usize>,
    pub missing_governance: usize,
}

impl fmt::Display for ScanSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let types = self
            .by_type
            .iter()
            .map(|(k, v)| format!("{k}: {v}"))
            .collect::<Vec<_>>()
            .join(", ");
        write!(
            f,
            "Found {} files ({}), {} missing governance tags",
            self.total_files, types, self.missing_governance
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn fixture() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(
            root,
            "src/index.ts",
            "// @GL-governed\n// @GL-semantic: core-entry\n// @GL-charter-version: 2.0\nexport {};\n",
        );
        write(root, "src/util.js", "module.exports = {};\n");
        write(root, "docs/guide.md", "# Guide\n@GL-governed\n");
        write(root, "config/app.yaml", "name: app\n");
        write(root, "node_modules/pkg/index.js", "x");
        write(root, ".git/HEAD", "ref: refs/heads/main");
        write(root, "dist/bundle.js", "x");
        write(root, "packages/a/build/out.js", "x");
        dir
    }

    #[test]
    fn test_scan_skips_excluded_dirs() {
        let dir = fixture();
        let mut scanner = Scanner::new(&GraphConfig::default());
        let results = scanner.scan_repository(dir.path()).unwrap();

        let paths: Vec<&str> = results.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(
            paths,
            vec!["config/app.yaml", "docs/guide.md", "src/index.ts", "src/util.js"]
        );
        assert_eq!(scanner.len(), 4);
    }

    #[test]
    fn test_exclusion_is_exact_name_match() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "builder/main.py", "import os\n");
        write(dir.path(), "dist2/x.py", "");
        write(dir.path(), "build/x.py", "");

        let mut scanner = Scanner::new(&GraphConfig::default());
        let results = scanner.scan_repository(dir.path()).unwrap();
        let paths: Vec<&str> = results.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, vec!["builder/main.py", "dist2/x.py"]);
    }

    #[test]
    fn test_scan_records_classification_and_tags() {
        let dir = fixture();
        let mut scanner = Scanner::new(&GraphConfig::default());
        scanner.scan_repository(dir.path()).unwrap();

        let entry = scanner.get("src/index.ts").unwrap();
        assert_eq!(entry.resource_type, ResourceType::Code);
        assert_eq!(entry.language, Language::TypeScript);
        assert_eq!(entry.format, ResourceFormat::Text);
        assert!(entry.size > 0);
        assert!(entry.has_governance_tag);
        assert!(entry.has_semantic_anchor);
        assert!(entry.has_charter_version);
        assert!(!entry.missing_governance_tags());

        let guide = scanner.get("docs/guide.md").unwrap();
        assert!(guide.has_governance_tag);
        assert!(!guide.has_semantic_anchor);
        assert!(guide.missing_governance_tags());
    }

    #[test]
    fn test_queries_without_rescan() {
        let dir = fixture();
        let mut scanner = Scanner::new(&GraphConfig::default());
        scanner.scan_repository(dir.path()).unwrap();

        assert_eq!(scanner.by_type(ResourceType::Code).len(), 2);
        assert_eq!(scanner.by_language(Language::JavaScript).len(), 1);
        assert_eq!(scanner.missing_governance_tags().len(), 3);

        let summary = scanner.summary();
        assert_eq!(summary.total_files, 4);
        assert_eq!(summary.by_type.get("code"), Some(&2));
        assert_eq!(summary.missing_governance, 3);
    }

    #[test]
    fn test_rescan_replaces_results() {
        let dir = fixture();
        let mut scanner = Scanner::new(&GraphConfig::default());
        scanner.scan_repository(dir.path()).unwrap();

        let other = TempDir::new().unwrap();
        write(other.path(), "only.py", "print(1)\n");
        let results = scanner.scan_repository(other.path()).unwrap();
        assert_eq!(results.len(), 1);
        assert!(scanner.get("src/index.ts").is_none());
    }

    #[test]
    fn test_binary_content_is_read_lossily() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("logo.png"), [0x89, 0x50, 0x4e, 0x47, 0xff, 0x00]).unwrap();

        let mut scanner = Scanner::new(&GraphConfig::default());
        let results = scanner.scan_repository(dir.path()).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].resource_type, ResourceType::Unknown);
        assert_eq!(results[0].format, ResourceFormat::Binary);
        assert_eq!(results[0].size, 6);
    }

    #[test]
    fn test_unreadable_result_is_defaulted() {
        let result = ScanResult::unreadable("secret.ts".to_string());
        assert_eq!(result.resource_type, ResourceType::Unknown);
        assert_eq!(result.language, Language::Unspecified);
        assert_eq!(result.size, 0);
        assert!(result.missing_governance_tags());
        assert_eq!(result.last_modified.timestamp(), 0);
    }

    #[test]
    fn test_vanished_file_does_not_abort_scan() {
        let dir = fixture();
        let scanner = Scanner::new(&GraphConfig::default());
        let files = scanner.collect_files(dir.path());
        assert_eq!(files.len(), 4);

        // Deleted between the walk and the read
        fs::remove_file(dir.path().join("src/util.js")).unwrap();
        let results = scanner.scan_files(&files);

        assert_eq!(results.len(), 4);
        let gone = results.iter().find(|r| r.path == "src/util.js").unwrap();
        assert_eq!(gone, &ScanResult::unreadable("src/util.js".to_string()));

        let index = results.iter().find(|r| r.path == "src/index.ts").unwrap();
        assert_eq!(index.language, Language::TypeScript);
        assert!(!index.missing_governance_tags());
    }

    #[test]
    fn test_scan_file_on_missing_path_keeps_path() {
        let dir = TempDir::new().unwrap();
        let result = scan_file(
            &dir.path().join("absent.py"),
            "absent.py".to_string(),
            &GovernanceConfig::default(),
        );
        assert_eq!(result.path, "absent.py");
        assert_eq!(result.resource_type, ResourceType::Unknown);
        assert_eq!(result.size, 0);
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let dir = TempDir::new().unwrap();
        let mut scanner = Scanner::new(&GraphConfig::default());
        let err = scanner
            .scan_repository(&dir.path().join("missing"))
            .unwrap_err();
        assert!(matches!(err, GraphError::RootNotFound(_)));
    }

    #[test]
    fn test_custom_exclusions() {
        let dir = fixture();
        let mut config = GraphConfig::default();
        config.scan.excluded_dirs = vec!["docs".to_string()];
        let mut scanner = Scanner::new(&config);
        let results = scanner.scan_repository(dir.path()).unwrap();
        assert!(results.iter().all(|r| !r.path.starts_with("docs/")));
        assert!(results.iter().any(|r| r.path.starts_with("node_modules/")));
    }
}
