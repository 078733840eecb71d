//! Persistence helpers: atomic JSON documents and per-run JSONL logs.

use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use flightdeck_types::{AgentEvent, Run};

use crate::error::StoreError;

/// On-disk run-metadata document (`runs.json`).
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct RunsDocument {
    /// When the document was written.
    pub saved_at: DateTime<Utc>,
    /// All known runs.
    pub runs: Vec<Run>,
}

/// Write text content atomically:
/// - ensure parent directory exists
/// - write to a temp file in the same directory
/// - fsync file + rename into place
pub(crate) fn atomic_write_text(path: &Path, content: &str) -> std::io::Result<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent)?;

    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .filter(|name| !name.is_empty())
        .unwrap_or("state.json");
    let temp_name = format!(".{}.{}.tmp", file_name, uuid::Uuid::new_v4());
    let temp_path = parent.join(temp_name);

    let mut temp_file = std::fs::File::create(&temp_path)?;
    temp_file.write_all(content.as_bytes())?;
    temp_file.sync_all()?;
    std::fs::rename(&temp_path, path)?;
    Ok(())
}

pub(crate) fn runs_document_path(data_dir: &Path) -> PathBuf {
    data_dir.join("runs.json")
}

pub(crate) fn event_log_path(data_dir: &Path, run_id: &str) -> PathBuf {
    data_dir.join("events").join(format!("{run_id}.jsonl"))
}

/// Write the run-metadata document atomically.
pub(crate) fn write_runs_document(data_dir: &Path, runs: Vec<Run>) -> Result<(), StoreError> {
    let document = RunsDocument {
        saved_at: Utc::now(),
        runs,
    };
    let content = serde_json::to_string_pretty(&document)?;
    atomic_write_text(&runs_document_path(data_dir), &content)?;
    Ok(())
}

/// Read the run-metadata document. `Ok(None)` when it does not exist yet.
pub(crate) fn read_runs_document(data_dir: &Path) -> Result<Option<RunsDocument>, StoreError> {
    let path = runs_document_path(data_dir);
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(&path)?;
    Ok(Some(serde_json::from_str(&content)?))
}

/// Append events to a run's line-delimited log.
pub(crate) fn append_event_log(
    data_dir: &Path,
    run_id: &str,
    events: &[AgentEvent],
) -> Result<(), StoreError> {
    if events.is_empty() {
        return Ok(());
    }
    let path = event_log_path(data_dir, run_id);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut lines = String::new();
    for event in events {
        lines.push_str(&serde_json::to_string(event)?);
        lines.push('\n');
    }
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)?;
    file.write_all(lines.as_bytes())?;
    Ok(())
}

/// Read back a run's event log, keeping only the last `cap` entries.
///
/// Undecodable lines are skipped rather than failing the whole replay, so
/// a torn trailing write from a crash does not lose the run.
pub(crate) fn read_event_log(
    data_dir: &Path,
    run_id: &str,
    cap: usize,
) -> Result<Vec<AgentEvent>, StoreError> {
    let path = event_log_path(data_dir, run_id);
    if !path.exists() {
        return Ok(Vec::new());
    }
    let file = std::fs::File::open(&path)?;
    let reader = BufReader::new(file);
    let mut events: std::collections::VecDeque<AgentEvent> =
        std::collections::VecDeque::with_capacity(cap.min(4096));
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<AgentEvent>(&line) {
            Ok(event) => {
                events.push_back(event);
                while events.len() > cap {
                    let _ = events.pop_front();
                }
            }
            Err(_) => continue,
        }
    }
    Ok(events.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flightdeck_types::EventKind;
    use tempfile::TempDir;

    #[test]
    fn test_runs_document_roundtrip() {
        let dir = TempDir::new().unwrap();
        let runs = vec![Run::new("r1").with_prompt("hello")];
        write_runs_document(dir.path(), runs).unwrap();
        let document = read_runs_document(dir.path()).unwrap().unwrap();
        assert_eq!(document.runs.len(), 1);
        assert_eq!(document.runs[0].id, "r1");
        assert_eq!(document.runs[0].prompt.as_deref(), Some("hello"));
    }

    #[test]
    fn test_event_log_append_and_tail() {
        let dir = TempDir::new().unwrap();
        let events: Vec<AgentEvent> = (0..5)
            .map(|i| {
                let mut ev = AgentEvent::new(format!("e{i}"), "r1", EventKind::SystemInfo);
                ev.seq = i;
                ev
            })
            .collect();
        append_event_log(dir.path(), "r1", &events).unwrap();

        let tail = read_event_log(dir.path(), "r1", 3).unwrap();
        assert_eq!(tail.len(), 3);
        assert_eq!(tail[0].id, "e2");
        assert_eq!(tail[2].id, "e4");
    }

    #[test]
    fn test_event_log_skips_torn_lines() {
        let dir = TempDir::new().unwrap();
        let event = AgentEvent::new("e1", "r1", EventKind::SystemInfo);
        append_event_log(dir.path(), "r1", std::slice::from_ref(&event)).unwrap();
        let path = event_log_path(dir.path(), "r1");
        let mut content = std::fs::read_to_string(&path).unwrap();
        content.push_str("{\"id\":\"torn");
        std::fs::write(&path, content).unwrap();

        let events = read_event_log(dir.path(), "r1", 10).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].id, "e1");
    }

    #[test]
    fn test_missing_log_reads_empty() {
        let dir = TempDir::new().unwrap();
        assert!(read_event_log(dir.path(), "absent", 10).unwrap().is_empty());
    }
}
