//! Event stream backends.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::info;

use super::{EventStream, GovernanceEvent};
use crate::error::{GraphError, Result};

/// Emits each event as a structured tracing record.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventStream;

impl EventStream for TracingEventStream {
    fn log_event(&self, event: &GovernanceEvent) -> Result<()> {
        info!(
            target: "resgraph::events",
            event_type = %event.event_type,
            layer = %event.layer,
            semantic_anchor = %event.semantic_anchor,
            metadata = %event.metadata,
            "governance event"
        );
        Ok(())
    }
}

/// Appends one JSON object per line to a log file.
#[derive(Debug)]
pub struct JsonlEventStream {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonlEventStream {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EventStream for JsonlEventStream {
    fn log_event(&self, event: &GovernanceEvent) -> Result<()> {
        let line = serde_json::to_string(event)?;
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| GraphError::io(parent, e))?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| GraphError::io(&self.path, e))?;
        writeln!(file, "{line}").map_err(|e| GraphError::io(&self.path, e))?;
        Ok(())
    }
}

/// Captures events in memory.
#[derive(Debug, Default)]
pub struct MemoryEventStream {
    events: Mutex<Vec<GovernanceEvent>>,
}

impl MemoryEventStream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the captured events, oldest first.
    pub fn events(&self) -> Vec<GovernanceEvent> {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl EventStream for MemoryEventStream {
    fn log_event(&self, event: &GovernanceEvent) -> Result<()> {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(event.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;
    use tempfile::TempDir;

    fn event(kind: &str) -> GovernanceEvent {
        GovernanceEvent {
            event_type: kind.to_string(),
            layer: "GL30-49".to_string(),
            semantic_anchor: "resource-graph".to_string(),
            timestamp: Utc::now(),
            metadata: json!({"nodes": 3}),
        }
    }

    #[test]
    fn test_jsonl_appends_lines() {
        let dir = TempDir::new().unwrap();
        let stream = JsonlEventStream::new(dir.path().join("logs/events.jsonl"));
        stream.log_event(&event("build_started")).unwrap();
        stream.log_event(&event("build_completed")).unwrap();

        let text = std::fs::read_to_string(stream.path()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let second: GovernanceEvent = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second.event_type, "build_completed");
        assert!(lines[0].contains("\"eventType\":\"build_started\""));
        assert!(lines[0].contains("\"semanticAnchor\""));
    }

    #[test]
    fn test_memory_stream_captures_in_order() {
        let stream = MemoryEventStream::new();
        stream.log_event(&event("a")).unwrap();
        stream.log_event(&event("b")).unwrap();
        let kinds: Vec<String> = stream.events().into_iter().map(|e| e.event_type).collect();
        assert_eq!(kinds, vec!["a", "b"]);
    }

    #[test]
    fn test_tracing_stream_never_fails() {
        assert!(TracingEventStream.log_event(&event("x")).is_ok());
    }
}
