//! # Mobility Features
//!
//! Turns raw GPS pings from mobile devices into per-zone, per-time-bin
//! mobility features.
//!
//! ## Overview
//!
//! Pings are cleaned by a chain of trajectory filters, labeled with a
//! spatial zone and a time-of-day bin, and aggregated into one feature row
//! per observed `(zone_id, time_bin)` cell: speed distribution, density,
//! device diversity, dwell, entry/exit structure and temporal context.
//!
//! ## Quick Start
//!
//! ```no_run
//! use mobility_features::{Config, GridZoneAssigner, Pipeline};
//! use mobility_features::workflow::ColumnTable;
//! use std::path::Path;
//!
//! let config = Config::default();
//! let table = ColumnTable::load(Path::new("pings.json")).expect("load");
//! let decoded = table.to_pings().expect("decode");
//!
//! let grid = GridZoneAssigner::from_config(&config.grid).expect("grid");
//! let output = Pipeline::new(&config).run(decoded.rows, &grid).expect("run");
//! println!("{} feature rows", output.features.len());
//! ```
//!
//! ## Architecture
//!
//! - [`geo`]: Haversine distance, bearings and turn angles
//! - [`trajectory`]: Pings, sequential deltas and the denoise filter chain
//! - [`time`]: Time-of-day binning and temporal flags
//! - [`spatial`]: Zone assignment and labeling
//! - [`features`]: Zone x time-bin aggregation
//! - [`workflow`]: Dataset I/O, partitioning, reports and the pipeline
//! - [`app`]: CLI and configuration management
//!
//! ## Data Flow
//!
//! ```text
//! ┌─────────────┐    ┌─────────────┐    ┌─────────────┐    ┌─────────────┐
//! │  Raw pings  │───▶│   Deltas    │───▶│   Denoise   │───▶│ Zone + bin  │
//! │             │    │ (per device)│    │   (A, B,    │    │  labeling   │
//! └─────────────┘    └─────────────┘    │    prune)   │    └─────────────┘
//!                                       └─────────────┘           │
//!                                                                 ▼
//!                                                          ┌─────────────┐
//!                                                          │  Feature    │
//!                                                          │   table     │
//!                                                          └─────────────┘
//! ```

pub mod app;
pub mod features;
pub mod geo;
pub mod spatial;
pub mod time;
pub mod trajectory;
pub mod workflow;

// Re-export commonly used types
pub use app::config::Config;
pub use features::{FeatureRow, FeatureTable, ZoneTimeAggregator};
pub use spatial::{GridZoneAssigner, ZoneAssigner, ZoneLabeler};
pub use time::TimeBinner;
pub use trajectory::{DeltaComputer, DenoiseChain, LabeledPing, Ping};
pub use workflow::{Pipeline, PipelineOutput};

/// Result type alias for the mobility feature pipeline
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the mobility feature pipeline
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
