//! Zone x Time-Bin Aggregator
//!
//! Speeds are recomputed from the labeled rows themselves; whatever deltas
//! an earlier stage produced are stale once rows have been filtered.
//!
//! Rows carrying the sentinel zone are excluded from every zone-keyed
//! group. They still take part in transition detection, which walks each
//! device's full ping sequence, so moving out of coverage is an exit.

use super::stats::{mean, shannon_entropy, Spread, SpeedSummary};
use super::table::{FeatureRow, FeatureTable};
use crate::app::config::Config;
use crate::time::TimeBinner;
use crate::trajectory::{DeltaComputer, DeviceCode, LabeledPing, Tracked, ZoneId};
use chrono::NaiveDateTime;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Constant per-zone mode priors handed to the mode-inference stage
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZonePriors {
    pub walk: f64,
    pub car: f64,
}

impl Default for ZonePriors {
    fn default() -> Self {
        Self { walk: 0.5, car: 0.5 }
    }
}

/// Entry / exit structure of one zone, across all time bins
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransitionProfile {
    pub in_count: usize,
    pub in_speed_mean: f64,
    pub out_count: usize,
    pub out_speed_mean: f64,
    /// Exit counts by destination zone (exits with no successor excluded)
    pub destinations: BTreeMap<ZoneId, usize>,
}

impl TransitionProfile {
    /// Entropy (bits) of the destination distribution
    pub fn entropy(&self) -> f64 {
        let counts: Vec<usize> = self.destinations.values().copied().collect();
        shannon_entropy(&counts)
    }
}

#[derive(Default)]
struct DeviceSpan {
    pings: usize,
    first: Option<NaiveDateTime>,
    last: Option<NaiveDateTime>,
}

impl DeviceSpan {
    fn observe(&mut self, ts: NaiveDateTime) {
        self.pings += 1;
        self.first = Some(self.first.map_or(ts, |f| f.min(ts)));
        self.last = Some(self.last.map_or(ts, |l| l.max(ts)));
    }

    fn dwell_s(&self) -> f64 {
        match (self.first, self.last) {
            (Some(f), Some(l)) => (l - f).num_milliseconds() as f64 / 1000.0,
            _ => 0.0,
        }
    }
}

#[derive(Default)]
struct CellAcc {
    speeds: Vec<f64>,
    devices: BTreeMap<DeviceCode, DeviceSpan>,
}

/// Aggregates labeled pings into a [`FeatureTable`]
#[derive(Debug, Clone)]
pub struct ZoneTimeAggregator {
    pub binner: TimeBinner,
    /// Zone id excluded from zone-keyed groups
    pub sentinel: ZoneId,
    pub priors: ZonePriors,
}

impl ZoneTimeAggregator {
    pub fn new(binner: TimeBinner, sentinel: ZoneId) -> Self {
        Self {
            binner,
            sentinel,
            priors: ZonePriors::default(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            binner: TimeBinner::new(config.binning.time_bin_minutes),
            sentinel: config.binning.zone_sentinel_value,
            priors: ZonePriors {
                walk: config.aggregate.prior_walk,
                car: config.aggregate.prior_car,
            },
        }
    }

    /// Aggregate labeled pings into one row per observed cell.
    ///
    /// Fails with a schema error if any `time_bin` is outside the day range
    /// for the configured bin width.
    pub fn aggregate(&self, rows: Vec<LabeledPing>) -> crate::Result<FeatureTable> {
        if let Some(bad) = rows.iter().find(|r| !self.binner.contains(r.time_bin)) {
            return Err(crate::Error::Schema(format!(
                "time_bin {} outside [0, {}) for {}-minute bins",
                bad.time_bin,
                self.binner.bins_per_day(),
                self.binner.minutes()
            )));
        }

        if rows.is_empty() {
            warn!("Aggregation received no rows; returning empty feature table");
            return Ok(FeatureTable::new(self.binner.minutes(), Vec::new()));
        }

        let tracked = DeltaComputer::without_bearings().compute(rows);
        let profiles = self.transition_profiles(&tracked);

        let mut cells: BTreeMap<(ZoneId, u16), CellAcc> = BTreeMap::new();
        let mut excluded = 0usize;
        for t in &tracked {
            if t.row.zone_id == self.sentinel {
                excluded += 1;
                continue;
            }
            let cell = cells.entry((t.row.zone_id, t.row.time_bin)).or_default();
            cell.speeds.push(t.delta.speed_m_s);
            cell.devices
                .entry(t.row.ping.device)
                .or_default()
                .observe(t.row.ping.timestamp);
        }
        debug!(excluded, sentinel = self.sentinel, "Unassigned pings excluded from zone groups");

        let empty = TransitionProfile::default();
        let feature_rows: Vec<FeatureRow> = cells
            .into_iter()
            .map(|((zone_id, time_bin), cell)| {
                let profile = profiles.get(&zone_id).unwrap_or(&empty);
                self.build_row(zone_id, time_bin, &cell, profile)
            })
            .collect();

        info!(
            rows_in = tracked.len(),
            cells = feature_rows.len(),
            zones = profiles.len(),
            "Zone x time-bin features aggregated"
        );

        Ok(FeatureTable::new(self.binner.minutes(), feature_rows))
    }

    /// Entry/exit profiles per assigned zone.
    ///
    /// `rows` must be ordered by `(device, timestamp)` with fresh deltas.
    /// A ping is an entry if its zone differs from the previous ping's (or it
    /// starts its device), and an exit if it differs from the next ping's (or
    /// it ends its device).
    pub fn transition_profiles(&self, rows: &[Tracked<LabeledPing>]) -> BTreeMap<ZoneId, TransitionProfile> {
        let n = rows.len();
        let mut in_speeds: BTreeMap<ZoneId, Vec<f64>> = BTreeMap::new();
        let mut out_speeds: BTreeMap<ZoneId, Vec<f64>> = BTreeMap::new();
        let mut destinations: BTreeMap<ZoneId, BTreeMap<ZoneId, usize>> = BTreeMap::new();

        for (i, t) in rows.iter().enumerate() {
            let zone = t.row.zone_id;
            if zone == self.sentinel {
                continue;
            }
            let prev_zone = (!t.delta.is_boundary()).then(|| rows[i - 1].row.zone_id);
            let next_zone = (i + 1 < n && !rows[i + 1].delta.is_boundary()).then(|| rows[i + 1].row.zone_id);

            if prev_zone != Some(zone) {
                in_speeds.entry(zone).or_default().push(t.delta.speed_m_s);
            }
            if next_zone != Some(zone) {
                out_speeds.entry(zone).or_default().push(t.delta.speed_m_s);
                if let Some(dst) = next_zone {
                    *destinations.entry(zone).or_default().entry(dst).or_default() += 1;
                }
            }
        }

        let mut profiles: BTreeMap<ZoneId, TransitionProfile> = BTreeMap::new();
        for (zone, speeds) in in_speeds {
            let p = profiles.entry(zone).or_default();
            p.in_count = speeds.len();
            p.in_speed_mean = mean(&speeds);
        }
        for (zone, speeds) in out_speeds {
            let p = profiles.entry(zone).or_default();
            p.out_count = speeds.len();
            p.out_speed_mean = mean(&speeds);
        }
        for (zone, dst) in destinations {
            profiles.entry(zone).or_default().destinations = dst;
        }
        profiles
    }

    fn build_row(&self, zone_id: ZoneId, time_bin: u16, cell: &CellAcc, profile: &TransitionProfile) -> FeatureRow {
        let speed = SpeedSummary::from_values(&cell.speeds);
        let ping_count = cell.speeds.len();
        let unique_devs = cell.devices.len();
        let pings_per_dev = if unique_devs == 0 {
            0.0
        } else {
            ping_count as f64 / unique_devs as f64
        };
        let device_counts: Vec<usize> = cell.devices.values().map(|d| d.pings).collect();
        let dwells: Vec<f64> = cell.devices.values().map(DeviceSpan::dwell_s).collect();
        let dwell = Spread::from_values(&dwells);
        let flags = self.binner.flags(time_bin);

        FeatureRow {
            zone_id,
            time_bin,
            speed_mean: speed.mean,
            speed_median: speed.median,
            speed_min: speed.min,
            speed_max: speed.max,
            speed_var: speed.variance,
            speed_q25: speed.q25,
            speed_q75: speed.q75,
            ping_count,
            unique_devs,
            pings_per_dev,
            dev_entropy: shannon_entropy(&device_counts),
            dwell_mean: dwell.mean,
            dwell_median: dwell.median,
            dwell_min: dwell.min,
            dwell_max: dwell.max,
            in_count: profile.in_count,
            in_speed_mean: profile.in_speed_mean,
            out_count: profile.out_count,
            out_speed_mean: profile.out_speed_mean,
            trans_entropy: profile.entropy(),
            is_morning_commute: flags.is_morning_commute,
            is_evening_commute: flags.is_evening_commute,
            is_late_night: flags.is_late_night,
            prior_walk: self.priors.walk,
            prior_car: self.priors.car,
        }
    }
}

impl Default for ZoneTimeAggregator {
    fn default() -> Self {
        Self::new(TimeBinner::default(), -1)
    }
}
