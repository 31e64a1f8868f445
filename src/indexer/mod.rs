//! Resource indexer: metadata and dependency lists per scanned file.
//!
//! Builds four lookup indices (path, type, language, semantic anchor) from a
//! scan. Every `build_index` call rebuilds all of them from scratch.

pub mod deps;
pub mod metadata;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub use deps::{Dependency, Specifier};
pub use metadata::FileMetadata;

use crate::config::{GovernanceConfig, GraphConfig};
use crate::scanner::{Language, ResourceType, ScanResult};

/// Indexed view of one file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexEntry {
    pub path: String,
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    pub language: Language,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semantic_anchor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub charter_version: Option<String>,
    pub dependencies: Vec<Dependency>,
    pub dependents: Vec<String>,
}

/// Builds and serves the resource index.
#[derive(Debug, Clone)]
pub struct Indexer {
    root: PathBuf,
    markers: GovernanceConfig,
    by_path: BTreeMap<String, IndexEntry>,
    by_type: HashMap<ResourceType, Vec<String>>,
    by_language: HashMap<Language, Vec<String>>,
    by_anchor: HashMap<String, Vec<String>>,
}

impl Indexer {
    /// Create an indexer that reads file content relative to `root`.
    pub fn new(root: &Path, config: &GraphConfig) -> Self {
        Self {
            root: root.to_path_buf(),
            markers: config.governance.clone(),
            by_path: BTreeMap::new(),
            by_type: HashMap::new(),
            by_language: HashMap::new(),
            by_anchor: HashMap::new(),
        }
    }

    /// Index a scan, reading each file's content from disk.
    ///
    /// Content is reduced to metadata and raw specifiers as soon as it is
    /// read, so at most one file per worker is held in memory. Files that can
    /// no longer be read are indexed without metadata or dependencies.
    pub fn build_index(&mut self, scan_results: &[ScanResult]) {
        let root = &self.root;
        let markers = &self.markers;
        let extracted: Vec<Extracted> = scan_results
            .par_iter()
            .map(|result| {
                let content = match fs::read(root.join(&result.path)) {
                    Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
                    Err(e) => {
                        debug!(file = %result.path, error = %e, "indexing without content");
                        None
                    }
                };
                Extracted::new(result, content.as_deref(), markers)
            })
            .collect();
        self.assemble(extracted);
    }

    /// Index scan results whose content is supplied by the caller.
    pub fn index_sources<I>(&mut self, sources: I)
    where
        I: IntoIterator<Item = (ScanResult, Option<String>)>,
    {
        let extracted: Vec<Extracted> = sources
            .into_iter()
            .map(|(result, content)| Extracted::new(&result, content.as_deref(), &self.markers))
            .collect();
        self.assemble(extracted);
    }

    /// Resolve extracted specifiers against the scanned set and rebuild every
    /// index.
    fn assemble(&mut self, extracted: Vec<Extracted>) {
        let known: HashSet<String> = extracted.iter().map(|e| e.path.clone()).collect();

        // Pass 1: outgoing dependencies per file
        let mut by_path: BTreeMap<String, IndexEntry> = BTreeMap::new();
        for file in extracted {
            let entry = file.into_entry(&known);
            by_path.insert(entry.path.clone(), entry);
        }

        // Pass 2: invert dependencies into dependents
        let mut dependents: HashMap<String, Vec<String>> = HashMap::new();
        for entry in by_path.values() {
            for dep in &entry.dependencies {
                if by_path.contains_key(&dep.path) {
                    dependents
                        .entry(dep.path.clone())
                        .or_default()
                        .push(entry.path.clone());
                }
            }
        }
        for (path, list) in dependents {
            if let Some(entry) = by_path.get_mut(&path) {
                entry.dependents = list;
            }
        }

        self.by_type.clear();
        self.by_language.clear();
        self.by_anchor.clear();
        for entry in by_path.values() {
            self.by_type
                .entry(entry.resource_type)
                .or_default()
                .push(entry.path.clone());
            self.by_language
                .entry(entry.language)
                .or_default()
                .push(entry.path.clone());
            if let Some(anchor) = &entry.semantic_anchor {
                self.by_anchor
                    .entry(anchor.clone())
                    .or_default()
                    .push(entry.path.clone());
            }
        }
        self.by_path = by_path;

        info!(
            entries = self.by_path.len(),
            anchors = self.by_anchor.len(),
            "index built"
        );
    }

    // ─── Queries ────────────────────────────────────────────────

    pub fn get_by_path(&self, path: &str) -> Option<&IndexEntry> {
        self.by_path.get(path)
    }

    pub fn get_by_type(&self, resource_type: ResourceType) -> Vec<&IndexEntry> {
        self.lookup(self.by_type.get(&resource_type))
    }

    pub fn get_by_language(&self, language: Language) -> Vec<&IndexEntry> {
        self.lookup(self.by_language.get(&language))
    }

    pub fn get_by_semantic_anchor(&self, anchor: &str) -> Vec<&IndexEntry> {
        self.lookup(self.by_anchor.get(anchor))
    }

    /// Direct dependencies of `path` (one hop).
    pub fn get_all_dependencies(&self, path: &str) -> Vec<String> {
        self.by_path
            .get(path)
            .map(|e| e.dependencies.iter().map(|d| d.path.clone()).collect())
            .unwrap_or_default()
    }

    /// Direct dependents of `path` (one hop).
    pub fn get_all_dependents(&self, path: &str) -> Vec<String> {
        self.by_path
            .get(path)
            .map(|e| e.dependents.clone())
            .unwrap_or_default()
    }

    pub fn get_index_size(&self) -> usize {
        self.by_path.len()
    }

    /// The path index, ordered by path.
    pub fn entries(&self) -> &BTreeMap<String, IndexEntry> {
        &self.by_path
    }

    pub fn into_entries(self) -> BTreeMap<String, IndexEntry> {
        self.by_path
    }

    fn lookup(&self, paths: Option<&Vec<String>>) -> Vec<&IndexEntry> {
        paths
            .map(|paths| paths.iter().filter_map(|p| self.by_path.get(p)).collect())
            .unwrap_or_default()
    }
}

/// What one file contributes to the index before resolution.
#[derive(Debug)]
struct Extracted {
    path: String,
    resource_type: ResourceType,
    language: Language,
    meta: FileMetadata,
    specifiers: Vec<Specifier>,
}

impl Extracted {
    fn new(result: &ScanResult, content: Option<&str>, markers: &GovernanceConfig) -> Self {
        let (meta, specifiers) = match content {
            Some(content) => (
                FileMetadata::extract(content, markers),
                deps::detect_specifiers(result.language, result.format, content),
            ),
            None => (FileMetadata::default(), Vec::new()),
        };
        Self {
            path: result.path.clone(),
            resource_type: result.resource_type,
            language: result.language,
            meta,
            specifiers,
        }
    }

    fn into_entry(self, known: &HashSet<String>) -> IndexEntry {
        let mut seen = HashSet::new();
        let dependencies = self
            .specifiers
            .iter()
            .map(|spec| Dependency {
                path: deps::resolve(&self.path, spec, self.language, known),
                kind: spec.kind,
            })
            .filter(|dep| seen.insert(dep.path.clone()))
            .collect();

        IndexEntry {
            path: self.path,
            resource_type: self.resource_type,
            language: self.language,
            semantic_anchor: self.meta.semantic_anchor,
            layer: self.meta.layer,
            charter_version: self.meta.charter_version,
            dependencies,
            dependents: Vec::new(),
        }
    }
}
