//! Spatial zone assignment
//!
//! The `ZoneAssigner` trait is the seam to whatever point-in-polygon service
//! owns the zone geometry. `GridZoneAssigner` is a regular metric grid that
//! needs no external geometry.

pub mod zones;
pub mod grid;

pub use grid::GridZoneAssigner;
pub use zones::{ZoneAssigner, ZoneLabeler};
