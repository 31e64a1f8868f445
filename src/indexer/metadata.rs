//! Governance metadata extraction (`@GL-semantic: <anchor>` and friends).

use crate::config::GovernanceConfig;

/// Metadata captured from a file's governance tags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileMetadata {
    pub semantic_anchor: Option<String>,
    pub layer: Option<String>,
    pub charter_version: Option<String>,
}

impl FileMetadata {
    pub fn extract(content: &str, markers: &GovernanceConfig) -> Self {
        Self {
            semantic_anchor: tag_value(content, &markers.semantic_marker),
            layer: tag_value(content, &markers.layer_marker),
            charter_version: tag_value(content, &markers.charter_marker),
        }
    }
}

/// Token following the first `<marker>:` occurrence.
///
/// Only the first tagged line counts; if its value is empty the tag is
/// treated as absent.
pub fn tag_value(content: &str, marker: &str) -> Option<String> {
    let needle = format!("{marker}:");
    let line = content.lines().find(|line| line.contains(&needle))?;
    let start = line.find(&needle)? + needle.len();
    let token = line[start..].split_whitespace().next()?;
    let token = token.trim_matches(|c| c == '"' || c == '\'' || c == ',' || c == ';');
    if token.is_empty() || token == "*/" || token == "-->" {
        return None;
    }
    Some(token.to_string())
}
