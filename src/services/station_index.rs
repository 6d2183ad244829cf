//! Station index built once from configuration data
//!
//! Immutable after load: lookups only, no inserts past `build`.

use crate::domain::types::{RawStation, Station, StationKey};
use crate::infra::config::DuplicatePolicy;
use rustc_hash::FxHashMap;
use std::collections::hash_map::Entry;
use tracing::warn;

/// Mapping from (source, choice) key to station record
pub struct StationIndex {
    stations: FxHashMap<StationKey, Station>,
}

impl StationIndex {
    /// Build the index from raw records.
    ///
    /// Duplicate keys follow `on_duplicate`: `Reject` fails the load,
    /// `Overwrite` keeps the last record and warns per replaced key.
    pub fn build(records: Vec<RawStation>, on_duplicate: DuplicatePolicy) -> anyhow::Result<Self> {
        let mut stations =
            FxHashMap::with_capacity_and_hasher(records.len(), Default::default());

        for raw in records {
            let station = Station::from(raw);
            let key = station.key();
            match stations.entry(key) {
                Entry::Vacant(entry) => {
                    entry.insert(station);
                }
                Entry::Occupied(mut entry) => match on_duplicate {
                    DuplicatePolicy::Reject => {
                        anyhow::bail!(
                            "duplicate station key '{}' in station data",
                            entry.key()
                        );
                    }
                    DuplicatePolicy::Overwrite => {
                        warn!(key = %entry.key(), "station_key_overwritten");
                        entry.insert(station);
                    }
                },
            }
        }

        Ok(Self { stations })
    }

    /// Look up a station by its (source, choice) pair
    pub fn lookup(&self, source: &str, choice: &str) -> Option<&Station> {
        self.stations.get(&StationKey::new(source, choice))
    }

    pub fn get(&self, key: &StationKey) -> Option<&Station> {
        self.stations.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &StationKey> {
        self.stations.keys()
    }

    /// Distinct sources across all stations, for heartbeat tracking
    pub fn sources(&self) -> Vec<String> {
        let mut sources: Vec<String> =
            self.stations.values().map(|s| s.source.clone()).collect();
        sources.sort();
        sources.dedup();
        sources
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::StationId;

    fn raw(id: i64, source: &str, choice: &str) -> RawStation {
        RawStation {
            id,
            source: source.to_string(),
            choice: choice.to_string(),
            x: None,
            y: None,
        }
    }

    #[test]
    fn test_build_and_lookup() {
        let index = StationIndex::build(
            vec![raw(1, "101", "left"), raw(2, "101", "right"), raw(3, "102", "left")],
            DuplicatePolicy::Reject,
        )
        .unwrap();

        assert_eq!(index.len(), 3);
        assert_eq!(index.lookup("101", "left").unwrap().id, StationId(1));
        assert_eq!(index.lookup("102", "left").unwrap().id, StationId(3));
    }

    #[test]
    fn test_lookup_absent_key() {
        let index =
            StationIndex::build(vec![raw(1, "101", "left")], DuplicatePolicy::Reject).unwrap();

        assert!(index.lookup("101", "right").is_none());
        assert!(index.lookup("999", "left").is_none());
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let result = StationIndex::build(
            vec![raw(1, "101", "left"), raw(2, "101", "left")],
            DuplicatePolicy::Reject,
        );

        let err = result.err().expect("duplicate key should fail the load");
        assert!(err.to_string().contains("101left"));
    }

    #[test]
    fn test_duplicate_key_overwrite_keeps_last() {
        let index = StationIndex::build(
            vec![raw(1, "101", "left"), raw(2, "101", "left")],
            DuplicatePolicy::Overwrite,
        )
        .unwrap();

        assert_eq!(index.len(), 1);
        assert_eq!(index.lookup("101", "left").unwrap().id, StationId(2));
    }

    #[test]
    fn test_distinct_sources() {
        let index = StationIndex::build(
            vec![raw(1, "101", "left"), raw(2, "101", "right"), raw(3, "102", "left")],
            DuplicatePolicy::Reject,
        )
        .unwrap();

        assert_eq!(index.sources(), vec!["101".to_string(), "102".to_string()]);
    }
}
