//! Vote log - appends accepted touch events to file
//!
//! Events are written in JSONL format (one JSON object per line) to the
//! file specified in config. Rejected events are not logged.

use serde::Serialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use tracing::{debug, error, info};

/// One accepted touch event
#[derive(Debug, Serialize)]
pub struct VoteRecord {
    pub flavor: String,
    pub source: String,
    pub choice: String,
    /// Timestamp (epoch ms)
    pub time: u64,
    /// Elapsed touch duration, end records only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    /// Duration-derived radius, end records only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
}

impl VoteRecord {
    pub fn started(source: &str, choice: &str, time: u64) -> Self {
        Self {
            flavor: "start_touch".to_string(),
            source: source.to_string(),
            choice: choice.to_string(),
            time,
            duration_ms: None,
            radius: None,
        }
    }

    pub fn ended(source: &str, choice: &str, time: u64, duration_ms: u64, radius: f64) -> Self {
        Self {
            flavor: "end_touch".to_string(),
            source: source.to_string(),
            choice: choice.to_string(),
            time,
            duration_ms: Some(duration_ms),
            radius: Some(radius),
        }
    }
}

/// Append-only writer for the touch event log
pub struct VoteLog {
    file_path: String,
}

impl VoteLog {
    pub fn new(file_path: &str) -> Self {
        info!(file_path = %file_path, "vote_log_initialized");
        Self { file_path: file_path.to_string() }
    }

    /// Write a record to the log file
    /// Returns true if successful, false otherwise
    pub fn record(&self, record: &VoteRecord) -> bool {
        let json = match serde_json::to_string(record) {
            Ok(json) => json,
            Err(e) => {
                error!(error = %e, "vote_record_serialize_failed");
                return false;
            }
        };

        match self.append_line(&json) {
            Ok(()) => true,
            Err(e) => {
                error!(
                    flavor = %record.flavor,
                    source = %record.source,
                    error = %e,
                    "vote_log_write_failed"
                );
                false
            }
        }
    }

    /// Append a line to the log file
    fn append_line(&self, line: &str) -> std::io::Result<()> {
        let path = Path::new(&self.file_path);

        // Create parent directories if they don't exist
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new().create(true).append(true).open(path)?;

        writeln!(file, "{}", line)?;
        debug!(file = %self.file_path, bytes = %line.len(), "vote_log_written");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_record_start_touch() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("votelog.jsonl");
        let log = VoteLog::new(file_path.to_str().unwrap());

        assert!(log.record(&VoteRecord::started("101", "left", 1234567890)));

        let content = fs::read_to_string(&file_path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(content.trim()).unwrap();
        assert_eq!(parsed["flavor"], "start_touch");
        assert_eq!(parsed["source"], "101");
        assert_eq!(parsed["choice"], "left");
        assert_eq!(parsed["time"], 1234567890u64);
        // Start records carry no duration fields
        assert!(parsed.get("duration_ms").is_none());
        assert!(parsed.get("radius").is_none());
    }

    #[test]
    fn test_record_end_touch_carries_duration_and_radius() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("votelog.jsonl");
        let log = VoteLog::new(file_path.to_str().unwrap());

        assert!(log.record(&VoteRecord::ended("101", "right", 1234567890, 2500, 10.0)));

        let content = fs::read_to_string(&file_path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(content.trim()).unwrap();
        assert_eq!(parsed["flavor"], "end_touch");
        assert_eq!(parsed["duration_ms"], 2500);
        assert_eq!(parsed["radius"], 10.0);
    }

    #[test]
    fn test_append_mode() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("votelog.jsonl");
        fs::write(&file_path, "{\"existing\":\"data\"}\n").unwrap();

        let log = VoteLog::new(file_path.to_str().unwrap());
        log.record(&VoteRecord::started("101", "left", 1));

        let content = fs::read_to_string(&file_path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("existing"));
        assert!(lines[1].contains("start_touch"));
    }

    #[test]
    fn test_creates_parent_directories() {
        let dir = tempdir().unwrap();
        let nested_path = dir.path().join("nested").join("logs").join("votelog.jsonl");

        let log = VoteLog::new(nested_path.to_str().unwrap());
        assert!(log.record(&VoteRecord::started("101", "left", 1)));
        assert!(nested_path.exists());
    }
}
