//! Trajectory cleaning
//!
//! Turns raw per-device ping streams into clean trajectories:
//! - Dense device encoding and the `Ping` record
//! - Sequential deltas (distance, elapsed time, speed, bearings) with
//!   device-boundary reset
//! - The cascaded denoise chain: geometric outlier filter, sliding-window
//!   median-speed filter and the sparse-device prune

pub mod ping;
pub mod deltas;
pub mod denoise;

pub use deltas::{Delta, DeltaComputer, Tracked};
pub use denoise::{DenoiseChain, DenoiseCounts, DenoiseOutcome, GeometricOutlierFilter, MedianSpeedFilter};
pub use ping::{DeviceCode, DeviceCodes, LabeledPing, Ping, PingRow, ZoneId};
