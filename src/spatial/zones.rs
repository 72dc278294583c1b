//! Zone Labeling
//!
//! Attaches a zone id and a time bin to every ping. Zone lookups run in
//! fixed-size chunks so callers can bound the work handed to an external
//! assigner per call.

use crate::app::config::BinningConfig;
use crate::time::TimeBinner;
use crate::trajectory::{LabeledPing, Ping, ZoneId};
use tracing::{debug, info, warn};

/// Resolves a point to the zone containing it
pub trait ZoneAssigner {
    /// Zone id for the point, or `None` when it lies outside coverage
    fn assign_zone(&self, lat: f64, lon: f64) -> Option<ZoneId>;

    /// Assign a batch of points; the default maps [`ZoneAssigner::assign_zone`]
    fn assign_batch(&self, points: &[(f64, f64)]) -> Vec<Option<ZoneId>> {
        points.iter().map(|&(lat, lon)| self.assign_zone(lat, lon)).collect()
    }
}

impl<F> ZoneAssigner for F
where
    F: Fn(f64, f64) -> Option<ZoneId>,
{
    fn assign_zone(&self, lat: f64, lon: f64) -> Option<ZoneId> {
        self(lat, lon)
    }
}

/// Labels pings with zone ids and time bins
#[derive(Debug, Clone)]
pub struct ZoneLabeler {
    pub binner: TimeBinner,
    /// Zone id written for unassigned pings
    pub sentinel: ZoneId,
    /// Rows per assigner call
    pub chunk_rows: usize,
}

impl ZoneLabeler {
    pub fn new(binner: TimeBinner, sentinel: ZoneId, chunk_rows: usize) -> Self {
        Self {
            binner,
            sentinel,
            chunk_rows: chunk_rows.max(1),
        }
    }

    pub fn from_config(config: &BinningConfig) -> Self {
        Self::new(
            TimeBinner::new(config.time_bin_minutes),
            config.zone_sentinel_value,
            config.chunk_rows,
        )
    }

    /// Label every ping; row order is preserved
    pub fn label<A: ZoneAssigner + ?Sized>(&self, pings: Vec<Ping>, assigner: &A) -> Vec<LabeledPing> {
        if pings.is_empty() {
            warn!("Zone labeling received no rows");
            return Vec::new();
        }

        let total_chunks = pings.len().div_ceil(self.chunk_rows);
        let mut labeled = Vec::with_capacity(pings.len());
        let mut unassigned = 0usize;

        for (i, chunk) in pings.chunks(self.chunk_rows).enumerate() {
            let points: Vec<(f64, f64)> = chunk.iter().map(|p| (p.lat, p.lon)).collect();
            let zones = assigner.assign_batch(&points);

            for (ping, zone) in chunk.iter().zip(zones) {
                let zone_id = match zone {
                    Some(z) if z != self.sentinel => z,
                    _ => {
                        unassigned += 1;
                        self.sentinel
                    }
                };
                labeled.push(LabeledPing::new(*ping, zone_id, self.binner.bin_of(&ping.timestamp)));
            }
            debug!(chunk = i + 1, chunks = total_chunks, rows = chunk.len(), "Zone chunk labeled");
        }

        info!(
            rows = labeled.len(),
            unassigned,
            bin_minutes = self.binner.minutes(),
            "Zone and time bins assigned"
        );
        labeled
    }
}
