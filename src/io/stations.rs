//! Station file loading
//!
//! The station file is a JSON array of raw station records, loaded once
//! before the tracker starts.

use crate::domain::types::RawStation;
use anyhow::Context;
use std::fs;
use std::path::Path;
use tracing::info;

/// Read and parse the station file
pub fn load_stations<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<RawStation>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read station file {}", path.display()))?;

    let records: Vec<RawStation> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse station file {}", path.display()))?;

    info!(count = %records.len(), file = %path.display(), "stations_loaded");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_station_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(
                br#"[
                    {"id": 1, "source": 101, "choice": "left", "x3": 120.0, "y3": 80.5},
                    {"id": 2, "source": 101, "choice": "right", "x3": 160.0, "y3": 80.5},
                    {"id": 3, "source": "102", "choice": "left"}
                ]"#,
            )
            .unwrap();
        temp_file.flush().unwrap();

        let records = load_stations(temp_file.path()).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].source, "101");
        assert_eq!(records[0].x, Some(120.0));
        assert_eq!(records[2].source, "102");
        assert_eq!(records[2].x, None);
    }

    #[test]
    fn test_missing_file_fails_with_context() {
        let err = load_stations("/nonexistent/stations.json").unwrap_err();
        assert!(err.to_string().contains("Failed to read station file"));
    }

    #[test]
    fn test_invalid_json_fails_with_context() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"not json").unwrap();
        temp_file.flush().unwrap();

        let err = load_stations(temp_file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse station file"));
    }
}
