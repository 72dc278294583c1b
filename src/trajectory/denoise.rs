//! Denoise Filter Chain
//!
//! Two order-sensitive filters followed by a sparse-device prune:
//!
//! 1. [`GeometricOutlierFilter`]: keeps an interior ping only if it is slow
//!    enough and either turns sharply or follows a long gap.
//! 2. [`MedianSpeedFilter`]: keeps a ping only if the centered rolling median
//!    of speed within its own device segment is below the threshold.
//! 3. Prune: drops every device left with `min_points_per_device` pings or fewer.
//!
//! Each filter recomputes sequential deltas over its own input, so device
//! boundaries and speeds always describe the rows actually present.

use super::deltas::{segment_ranges, sort_by_device_time, DeltaComputer, Tracked};
use super::ping::{DeviceCode, PingRow};
use crate::app::config::DenoiseConfig;
use crate::geo::turn_angle;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

/// Geometric / speed outlier filter
#[derive(Debug, Clone)]
pub struct GeometricOutlierFilter {
    /// Maximum speed from the predecessor (m/s, exclusive)
    pub speed_threshold: f64,
    /// Minimum turn angle to keep a ping (degrees, exclusive)
    pub angle_threshold: f64,
    /// Gap after which a straight-line ping is still kept (seconds, exclusive)
    pub time_threshold: f64,
}

impl GeometricOutlierFilter {
    /// Create with default thresholds
    pub fn new() -> Self {
        Self {
            speed_threshold: 30.0,
            angle_threshold: 30.0,
            time_threshold: 10.0,
        }
    }

    pub fn from_config(config: &DenoiseConfig) -> Self {
        Self {
            speed_threshold: config.speed_threshold_a,
            angle_threshold: config.angle_threshold,
            time_threshold: config.time_threshold,
        }
    }

    /// Keep mask over rows whose deltas include bearings.
    ///
    /// Rows without both an in-segment predecessor and successor are dropped.
    pub fn keep_mask<P>(&self, rows: &[Tracked<P>]) -> Vec<bool> {
        rows.iter()
            .map(|t| {
                let d = &t.delta;
                let (Some(b_in), Some(b_out), Some(raw_dt)) =
                    (d.bearing_in_deg, d.bearing_out_deg, d.raw_elapsed_s)
                else {
                    return false;
                };
                let angle = turn_angle(b_in, b_out);
                d.speed_m_s < self.speed_threshold
                    && (angle > self.angle_threshold || raw_dt > self.time_threshold)
            })
            .collect()
    }

    /// Filter rows, returning survivors ordered by `(device, timestamp)`
    pub fn apply<P: PingRow>(&self, rows: Vec<P>) -> Vec<P> {
        let tracked = DeltaComputer::new().compute(rows);
        let keep = self.keep_mask(&tracked);
        tracked
            .into_iter()
            .zip(keep)
            .filter_map(|(t, k)| k.then_some(t.row))
            .collect()
    }
}

impl Default for GeometricOutlierFilter {
    fn default() -> Self {
        Self::new()
    }
}

/// Sliding-window median-speed filter
#[derive(Debug, Clone)]
pub struct MedianSpeedFilter {
    /// Centered window width (rows)
    pub window_size: usize,
    /// Maximum median speed (m/s, exclusive)
    pub speed_threshold: f64,
}

impl MedianSpeedFilter {
    /// Create with default window and threshold
    pub fn new() -> Self {
        Self {
            window_size: 5,
            speed_threshold: 40.0,
        }
    }

    pub fn from_config(config: &DenoiseConfig) -> Self {
        Self {
            window_size: config.window_size,
            speed_threshold: config.speed_threshold_b,
        }
    }

    /// Rolling medians of `speeds`, computed independently per segment.
    ///
    /// `boundaries[i]` marks the first row of a segment. Windows are clipped
    /// at segment edges, so the minimum population is one.
    pub fn segment_medians(&self, speeds: &[f64], boundaries: &[bool]) -> Vec<f64> {
        let mut medians = vec![0.0; speeds.len()];
        for range in segment_ranges(boundaries) {
            let seg = rolling_median(&speeds[range.clone()], self.window_size);
            medians[range].copy_from_slice(&seg);
        }
        medians
    }

    /// Filter rows, returning survivors with deltas measured over the input
    pub fn apply<P: PingRow>(&self, rows: Vec<P>) -> Vec<Tracked<P>> {
        let tracked = DeltaComputer::without_bearings().compute(rows);
        let boundaries: Vec<bool> = tracked.iter().map(|t| t.delta.is_boundary()).collect();
        let speeds: Vec<f64> = tracked.iter().map(|t| t.delta.speed_m_s).collect();
        let medians = self.segment_medians(&speeds, &boundaries);

        tracked
            .into_iter()
            .zip(medians)
            .filter_map(|(t, m)| (m < self.speed_threshold).then_some(t))
            .collect()
    }
}

impl Default for MedianSpeedFilter {
    fn default() -> Self {
        Self::new()
    }
}

/// Centered rolling median with minimum population one.
///
/// The window for index `i` spans `i - w/2 ..= i + (w-1)/2`, clipped to the
/// slice. A zero width behaves as width one.
pub fn rolling_median(values: &[f64], window: usize) -> Vec<f64> {
    let window = window.max(1);
    let before = window / 2;
    let after = (window - 1) / 2;
    let mut scratch = Vec::with_capacity(window);

    (0..values.len())
        .map(|i| {
            let lo = i.saturating_sub(before);
            let hi = (i + after + 1).min(values.len());
            scratch.clear();
            scratch.extend_from_slice(&values[lo..hi]);
            median_in_place(&mut scratch)
        })
        .collect()
}

fn median_in_place(values: &mut [f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        values[mid]
    } else {
        (values[mid - 1] + values[mid]) * 0.5
    }
}

/// Drop every device with `min_points` rows or fewer.
///
/// Returns the surviving rows (input order preserved) and the number of
/// devices removed.
pub fn prune_sparse_devices<P: PingRow>(rows: Vec<P>, min_points: usize) -> (Vec<P>, usize) {
    let mut counts: HashMap<DeviceCode, usize> = HashMap::new();
    for row in &rows {
        *counts.entry(row.ping().device).or_default() += 1;
    }
    let sparse: HashSet<DeviceCode> = counts
        .iter()
        .filter(|(_, &n)| n <= min_points)
        .map(|(&d, _)| d)
        .collect();

    let kept = rows
        .into_iter()
        .filter(|r| !sparse.contains(&r.ping().device))
        .collect();
    (kept, sparse.len())
}

/// Row and device counts through each stage of the chain
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DenoiseCounts {
    pub input_rows: usize,
    pub input_devices: usize,
    pub after_geometric: usize,
    pub after_median: usize,
    pub output_rows: usize,
    pub output_devices: usize,
    /// Devices removed by the prune step
    pub pruned_devices: usize,
}

/// Result of running the chain
#[derive(Debug, Clone)]
pub struct DenoiseOutcome<P> {
    /// Surviving rows, ordered by `(device, timestamp)`, with deltas
    /// recomputed over the surviving set
    pub rows: Vec<Tracked<P>>,
    pub counts: DenoiseCounts,
}

/// Geometric filter, then median filter, then sparse-device prune
#[derive(Debug, Clone)]
pub struct DenoiseChain {
    pub geometric: GeometricOutlierFilter,
    pub median: MedianSpeedFilter,
    /// Devices must keep strictly more pings than this
    pub min_points_per_device: usize,
}

impl DenoiseChain {
    /// Create with default filters
    pub fn new() -> Self {
        Self {
            geometric: GeometricOutlierFilter::new(),
            median: MedianSpeedFilter::new(),
            min_points_per_device: 3,
        }
    }

    pub fn from_config(config: &DenoiseConfig) -> Self {
        Self {
            geometric: GeometricOutlierFilter::from_config(config),
            median: MedianSpeedFilter::from_config(config),
            min_points_per_device: config.min_points_per_device,
        }
    }

    /// Run the full chain. Empty input yields an empty outcome.
    pub fn denoise<P: PingRow>(&self, mut rows: Vec<P>) -> DenoiseOutcome<P> {
        let mut counts = DenoiseCounts {
            input_rows: rows.len(),
            input_devices: distinct_devices(&rows),
            ..Default::default()
        };

        if rows.is_empty() {
            warn!("Denoise received no rows; returning empty output");
            return DenoiseOutcome {
                rows: Vec::new(),
                counts,
            };
        }

        sort_by_device_time(&mut rows);

        let survivors = self.geometric.apply(rows);
        counts.after_geometric = survivors.len();
        debug!(
            rows_in = counts.input_rows,
            rows_out = counts.after_geometric,
            "Geometric outlier filter applied"
        );

        let survivors: Vec<P> = self.median.apply(survivors).into_iter().map(|t| t.row).collect();
        counts.after_median = survivors.len();
        debug!(
            rows_in = counts.after_geometric,
            rows_out = counts.after_median,
            "Median speed filter applied"
        );

        let (survivors, pruned) = prune_sparse_devices(survivors, self.min_points_per_device);
        counts.pruned_devices = pruned;
        counts.output_rows = survivors.len();
        counts.output_devices = distinct_devices(&survivors);

        info!(
            rows_in = counts.input_rows,
            rows_out = counts.output_rows,
            devices_in = counts.input_devices,
            devices_out = counts.output_devices,
            pruned_devices = pruned,
            "Denoise complete"
        );

        DenoiseOutcome {
            rows: DeltaComputer::new().compute_sorted(survivors),
            counts,
        }
    }
}

impl Default for DenoiseChain {
    fn default() -> Self {
        Self::new()
    }
}

fn distinct_devices<P: PingRow>(rows: &[P]) -> usize {
    rows.iter().map(|r| r.ping().device).collect::<HashSet<_>>().len()
}
