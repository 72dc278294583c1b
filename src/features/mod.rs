//! Zone x time-bin feature aggregation
//!
//! Consumes denoised, zone/time-labeled pings and produces one feature row
//! per observed `(zone_id, time_bin)` cell: speed distribution, density,
//! device entropy, dwell time, transition profiles, temporal flags and zone
//! priors.

pub mod stats;
pub mod table;
pub mod aggregate;

pub use aggregate::{TransitionProfile, ZonePriors, ZoneTimeAggregator};
pub use stats::{shannon_entropy, Spread, SpeedSummary};
pub use table::{FeatureRow, FeatureTable};
