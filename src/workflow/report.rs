//! Dataset Reports
//!
//! Before/after summaries used to report how much a cleaning stage removed.

use crate::trajectory::PingRow;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Size and coverage of a ping set
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetStats {
    pub n_points: usize,
    pub n_devices: usize,
    pub avg_points_per_device: f64,
    /// Span between the first and last timestamp, in hours
    pub hours_covered: f64,
}

impl DatasetStats {
    pub fn from_rows<P: PingRow>(rows: &[P]) -> Self {
        let n_points = rows.len();
        let n_devices = rows
            .iter()
            .map(|r| r.ping().device)
            .collect::<HashSet<_>>()
            .len();
        let avg_points_per_device = if n_devices == 0 {
            0.0
        } else {
            round2(n_points as f64 / n_devices as f64)
        };

        let first = rows.iter().map(|r| r.ping().timestamp).min();
        let last = rows.iter().map(|r| r.ping().timestamp).max();
        let hours_covered = match (first, last) {
            (Some(f), Some(l)) => round2((l - f).num_milliseconds() as f64 / 3_600_000.0),
            _ => 0.0,
        };

        Self {
            n_points,
            n_devices,
            avg_points_per_device,
            hours_covered,
        }
    }
}

/// One metric before and after a stage
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricChange {
    pub before: f64,
    pub after: f64,
    /// `None` when `before` is zero
    pub reduction_pct: Option<f64>,
}

impl MetricChange {
    pub fn new(before: f64, after: f64) -> Self {
        let reduction_pct = if before == 0.0 {
            None
        } else {
            Some(round2((before - after) / before * 100.0))
        };
        Self {
            before,
            after,
            reduction_pct,
        }
    }
}

/// Per-metric comparison of two [`DatasetStats`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatsComparison {
    pub n_points: MetricChange,
    pub n_devices: MetricChange,
    pub avg_points_per_device: MetricChange,
    pub hours_covered: MetricChange,
}

impl StatsComparison {
    pub fn new(before: &DatasetStats, after: &DatasetStats) -> Self {
        Self {
            n_points: MetricChange::new(before.n_points as f64, after.n_points as f64),
            n_devices: MetricChange::new(before.n_devices as f64, after.n_devices as f64),
            avg_points_per_device: MetricChange::new(before.avg_points_per_device, after.avg_points_per_device),
            hours_covered: MetricChange::new(before.hours_covered, after.hours_covered),
        }
    }

    fn metrics(&self) -> [(&'static str, &MetricChange); 4] {
        [
            ("n_points", &self.n_points),
            ("n_devices", &self.n_devices),
            ("avg_points_per_device", &self.avg_points_per_device),
            ("hours_covered", &self.hours_covered),
        ]
    }
}

impl fmt::Display for StatsComparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:<24} {:>14} {:>14} {:>12}", "metric", "before", "after", "reduction %")?;
        for (name, m) in self.metrics() {
            let pct = m
                .reduction_pct
                .map(|p| format!("{:.2}", p))
                .unwrap_or_else(|| "-".to_string());
            writeln!(f, "{:<24} {:>14.2} {:>14.2} {:>12}", name, m.before, m.after, pct)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trajectory::Ping;
    use chrono::NaiveDate;

    fn ping(device: u32, h: u32, m: u32) -> Ping {
        let ts = NaiveDate::from_ymd_opt(2023, 3, 27)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap();
        Ping::new(device, ts, 46.0, 14.0)
    }

    #[test]
    fn test_empty_stats() {
        let stats = DatasetStats::from_rows::<Ping>(&[]);
        assert_eq!(stats, DatasetStats::default());
    }

    #[test]
    fn test_stats_values() {
        let rows = vec![ping(0, 8, 0), ping(0, 9, 0), ping(1, 10, 30)];
        let stats = DatasetStats::from_rows(&rows);
        assert_eq!(stats.n_points, 3);
        assert_eq!(stats.n_devices, 2);
        assert_eq!(stats.avg_points_per_device, 1.5);
        assert_eq!(stats.hours_covered, 2.5);
    }

    #[test]
    fn test_comparison_reduction() {
        let before = DatasetStats {
            n_points: 200,
            n_devices: 10,
            avg_points_per_device: 20.0,
            hours_covered: 0.0,
        };
        let after = DatasetStats {
            n_points: 150,
            n_devices: 10,
            avg_points_per_device: 15.0,
            hours_covered: 0.0,
        };
        let cmp = StatsComparison::new(&before, &after);
        assert_eq!(cmp.n_points.reduction_pct, Some(25.0));
        assert_eq!(cmp.n_devices.reduction_pct, Some(0.0));
        assert_eq!(cmp.hours_covered.reduction_pct, None);

        let rendered = cmp.to_string();
        assert!(rendered.contains("n_points"));
        assert!(rendered.contains("25.00"));
    }
}
