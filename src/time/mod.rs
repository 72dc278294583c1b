//! Time-of-day binning
//!
//! Fixed-width bins over the local day and the static temporal flags
//! attached to each bin.

pub mod bins;

pub use bins::{TemporalFlags, TimeBinner};
