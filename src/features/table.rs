//! Feature Table
//!
//! One write-once row per observed `(zone_id, time_bin)` cell. Every field
//! is populated; `0` means "no contributing events", never "missing".

use crate::trajectory::ZoneId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

/// Aggregated statistics of one zone x time-bin cell
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub zone_id: ZoneId,
    pub time_bin: u16,

    pub speed_mean: f64,
    pub speed_median: f64,
    pub speed_min: f64,
    pub speed_max: f64,
    /// Sample variance of ping speeds
    pub speed_var: f64,
    pub speed_q25: f64,
    pub speed_q75: f64,

    pub ping_count: usize,
    pub unique_devs: usize,
    pub pings_per_dev: f64,
    /// Shannon entropy (bits) of per-device ping shares
    pub dev_entropy: f64,

    pub dwell_mean: f64,
    pub dwell_median: f64,
    pub dwell_min: f64,
    pub dwell_max: f64,

    /// Entry events into the zone (all time bins)
    pub in_count: usize,
    pub in_speed_mean: f64,
    /// Exit events out of the zone (all time bins)
    pub out_count: usize,
    pub out_speed_mean: f64,
    /// Entropy (bits) of exit destinations from the zone
    pub trans_entropy: f64,

    pub is_morning_commute: bool,
    pub is_evening_commute: bool,
    pub is_late_night: bool,

    pub prior_walk: f64,
    pub prior_car: f64,
}

/// Output of one aggregation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureTable {
    /// Identifier of the run that produced the table
    pub run_id: Uuid,
    pub created_at: DateTime<Utc>,
    /// Time bin width the rows were computed with
    pub time_bin_minutes: u32,
    /// Rows in ascending `(zone_id, time_bin)` order
    pub rows: Vec<FeatureRow>,
}

impl FeatureTable {
    pub fn new(time_bin_minutes: u32, rows: Vec<FeatureRow>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            created_at: Utc::now(),
            time_bin_minutes,
            rows,
        }
    }

    /// Row for a cell, if it was observed
    pub fn get(&self, zone_id: ZoneId, time_bin: u16) -> Option<&FeatureRow> {
        self.rows
            .binary_search_by(|r| (r.zone_id, r.time_bin).cmp(&(zone_id, time_bin)))
            .ok()
            .map(|i| &self.rows[i])
    }

    /// Observed cells, in row order
    pub fn keys(&self) -> Vec<(ZoneId, u16)> {
        self.rows.iter().map(|r| (r.zone_id, r.time_bin)).collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Save the table as pretty-printed JSON
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load a table saved with [`FeatureTable::save`]
    pub fn load(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn row(zone_id: ZoneId, time_bin: u16) -> FeatureRow {
        FeatureRow {
            zone_id,
            time_bin,
            ping_count: 1,
            ..Default::default()
        }
    }

    #[test]
    fn test_lookup() {
        let table = FeatureTable::new(60, vec![row(1, 3), row(1, 7), row(4, 0)]);
        assert!(table.get(1, 7).is_some());
        assert!(table.get(4, 0).is_some());
        assert!(table.get(2, 0).is_none());
        assert_eq!(table.keys(), vec![(1, 3), (1, 7), (4, 0)]);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("features.json");
        let table = FeatureTable::new(30, vec![row(2, 5)]);

        table.save(&path).unwrap();
        let loaded = FeatureTable::load(&path).unwrap();

        assert_eq!(loaded.run_id, table.run_id);
        assert_eq!(loaded.time_bin_minutes, 30);
        assert_eq!(loaded.rows, table.rows);
    }

    #[test]
    fn test_load_missing_file() {
        assert!(FeatureTable::load(Path::new("/tmp/no_such_features_98765.json")).is_err());
    }
}
