//! Sequential Deltas
//!
//! Per-device consecutive-ping distance, elapsed time, speed and bearings.
//!
//! Rows are sorted by `(device, timestamp)` first. A row is a device
//! boundary iff its device differs from the preceding row's (the first row
//! always is). Boundary rows get zero deltas and no incoming bearing; they
//! are never measured against another device's last ping.

use super::ping::PingRow;
use crate::geo::{bearing, haversine_distance};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Elapsed-time floor applied before dividing (seconds)
pub const MIN_ELAPSED_S: f64 = 1.0;

/// Motion relative to the previous ping of the same device
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Delta {
    /// Great-circle distance from the previous ping (meters)
    pub distance_m: f64,
    /// Elapsed time, clamped to at least one second (0 on boundary rows)
    pub elapsed_s: f64,
    /// Unclamped elapsed time; `None` on boundary rows
    pub raw_elapsed_s: Option<f64>,
    /// `distance_m / elapsed_s` (0 on boundary rows)
    pub speed_m_s: f64,
    /// Bearing from the previous ping; `None` on boundary rows
    pub bearing_in_deg: Option<f64>,
    /// Bearing to the next ping; `None` on the last row of a device
    pub bearing_out_deg: Option<f64>,
}

impl Delta {
    /// True if this row starts a device segment
    pub fn is_boundary(&self) -> bool {
        self.raw_elapsed_s.is_none()
    }
}

/// A row together with its computed delta
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tracked<P> {
    pub row: P,
    pub delta: Delta,
}

/// Stable sort by `(device, timestamp)`; equal keys keep input order.
pub fn sort_by_device_time<P: PingRow>(rows: &mut [P]) {
    rows.sort_by(|a, b| {
        let (a, b) = (a.ping(), b.ping());
        a.device.cmp(&b.device).then(a.timestamp.cmp(&b.timestamp))
    });
}

/// Boundary mask: `true` where a row's device differs from its predecessor's
pub fn device_boundaries<P: PingRow>(rows: &[P]) -> Vec<bool> {
    rows.iter()
        .enumerate()
        .map(|(i, row)| i == 0 || rows[i - 1].ping().device != row.ping().device)
        .collect()
}

/// Contiguous per-device ranges described by a boundary mask
pub fn segment_ranges(boundaries: &[bool]) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    let mut start = 0;
    for i in 1..=boundaries.len() {
        if i == boundaries.len() || boundaries[i] {
            if i > start {
                ranges.push(start..i);
            }
            start = i;
        }
    }
    ranges
}

/// Sequential delta computation
#[derive(Debug, Clone)]
pub struct DeltaComputer {
    /// Also compute incoming/outgoing bearings
    pub with_bearings: bool,
}

impl DeltaComputer {
    /// Computer that fills in bearings
    pub fn new() -> Self {
        Self { with_bearings: true }
    }

    /// Computer that skips bearings (distance, time and speed only)
    pub fn without_bearings() -> Self {
        Self { with_bearings: false }
    }

    /// Sort rows by `(device, timestamp)` and compute their deltas
    pub fn compute<P: PingRow>(&self, mut rows: Vec<P>) -> Vec<Tracked<P>> {
        sort_by_device_time(&mut rows);
        self.compute_sorted(rows)
    }

    /// Compute deltas for rows already ordered by `(device, timestamp)`
    pub fn compute_sorted<P: PingRow>(&self, rows: Vec<P>) -> Vec<Tracked<P>> {
        let n = rows.len();
        let starts = device_boundaries(&rows);
        let ends: Vec<bool> = (0..n).map(|i| i + 1 == n || starts[i + 1]).collect();

        let deltas: Vec<Delta> = (0..n)
            .map(|i| {
                let cur = rows[i].ping();
                let mut delta = Delta::default();

                if !starts[i] {
                    let prev = rows[i - 1].ping();
                    let raw = (cur.epoch_seconds() - prev.epoch_seconds()) as f64;
                    let elapsed = raw.max(MIN_ELAPSED_S);
                    let distance = haversine_distance(prev.lat, prev.lon, cur.lat, cur.lon);

                    delta.distance_m = distance;
                    delta.elapsed_s = elapsed;
                    delta.raw_elapsed_s = Some(raw);
                    delta.speed_m_s = distance / elapsed;
                    if self.with_bearings {
                        delta.bearing_in_deg = Some(bearing(prev.lat, prev.lon, cur.lat, cur.lon));
                    }
                }

                if self.with_bearings && !ends[i] {
                    let next = rows[i + 1].ping();
                    delta.bearing_out_deg = Some(bearing(cur.lat, cur.lon, next.lat, next.lon));
                }

                delta
            })
            .collect();

        rows.into_iter()
            .zip(deltas)
            .map(|(row, delta)| Tracked { row, delta })
            .collect()
    }
}

impl Default for DeltaComputer {
    fn default() -> Self {
        Self::new()
    }
}
