//! Workflow Module
//!
//! Dataset I/O, partitioning, reporting and the end-to-end pipeline.

pub mod dataset;
pub mod partition;
pub mod pipeline;
pub mod report;

pub use dataset::{ColumnTable, Decoded};
pub use partition::{merge_parts, split_by_device};
pub use pipeline::{Pipeline, PipelineOutput};
pub use report::{DatasetStats, MetricChange, StatsComparison};
