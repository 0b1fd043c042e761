//! JSONL file writer for provider usage events.
//!
//! Each [`UsageEvent`] is serialized as a single JSON line with a `type`
//! field and `timestamp`, appended to the file via a buffered writer.

use appforge_application::{UsageEvent, UsageSink};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

/// Record type written for every provider call
const RECORD_TYPE: &str = "provider_usage";

/// JSONL usage log that appends one JSON object per provider call.
///
/// Thread-safe via `Mutex<BufWriter<File>>`. Flushes on `Drop`.
pub struct JsonlUsageLog {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl JsonlUsageLog {
    /// Open (or create) the log at the given path for appending.
    ///
    /// Creates parent directories if they don't exist.
    /// Returns `None` if the file cannot be opened.
    pub fn new(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            warn!(
                "Could not create usage log directory {}: {}",
                parent.display(),
                e
            );
            return None;
        }

        let file = match OpenOptions::new().create(true).append(true).open(path) {
            Ok(f) => f,
            Err(e) => {
                warn!("Could not open usage log file {}: {}", path.display(), e);
                return None;
            }
        };

        Some(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path: path.to_path_buf(),
        })
    }

    /// Get the path to the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn to_record(event: &UsageEvent) -> Option<serde_json::Value> {
        let serde_json::Value::Object(mut map) = serde_json::to_value(event).ok()? else {
            return None;
        };
        map.insert(
            "type".to_string(),
            serde_json::Value::String(RECORD_TYPE.to_string()),
        );
        map.insert(
            "timestamp".to_string(),
            serde_json::Value::String(
                event
                    .timestamp
                    .to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            ),
        );
        Some(serde_json::Value::Object(map))
    }
}

impl UsageSink for JsonlUsageLog {
    fn record(&self, event: UsageEvent) {
        let Some(record) = Self::to_record(&event) else {
            return;
        };
        let Ok(line) = serde_json::to_string(&record) else {
            return;
        };

        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", line);
            // JSONL is append-only; flush each record for crash safety
            let _ = writer.flush();
        }
    }
}

impl Drop for JsonlUsageLog {
    fn drop(&mut self) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use appforge_domain::{AgentRole, Model};

    fn read_lines(path: &Path) -> Vec<serde_json::Value> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_usage_log_writes_valid_jsonl() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("usage.jsonl");
        let log = JsonlUsageLog::new(&path).unwrap();

        log.record(UsageEvent::new(
            Model::Claude,
            AgentRole::RequirementsAnalyst,
            120,
            80,
            0.0022,
        ));
        log.record(UsageEvent::new(
            Model::Codex,
            AgentRole::BackendDeveloper,
            300,
            900,
            0.042,
        ));
        drop(log);

        let records = read_lines(&path);
        assert_eq!(records.len(), 2);
        for record in &records {
            assert_eq!(record["type"], "provider_usage");
            assert!(record["timestamp"].as_str().unwrap().ends_with('Z'));
        }
        assert_eq!(records[0]["model"], "claude");
        assert_eq!(records[0]["role"], "requirements_analyst");
        assert_eq!(records[0]["tokens_used"], 200);
        assert_eq!(records[1]["completion_tokens"], 900);
    }

    #[test]
    fn test_usage_log_appends_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("usage.jsonl");

        for _ in 0..2 {
            let log = JsonlUsageLog::new(&path).unwrap();
            log.record(UsageEvent::new(Model::Gpt4, AgentRole::Generalist, 1, 1, 0.0));
        }

        assert_eq!(read_lines(&path).len(), 2);
        let log = JsonlUsageLog::new(&path).unwrap();
        assert_eq!(log.path(), path.as_path());
    }
}
