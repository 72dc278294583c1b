//! Geodesic math
//!
//! Great-circle distance and initial bearing between WGS-84 points.
//! Everything downstream (deltas, denoising, zone grids) builds on these.

pub mod geodesic;

pub use geodesic::{
    bearing, bearings, haversine_distance, haversine_distances, turn_angle, EARTH_RADIUS_M,
};
