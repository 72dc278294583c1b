//! End-to-End Pipeline
//!
//! Denoise, label, aggregate. Every intermediate is returned so callers can
//! persist whichever stages they need.

use super::report::{DatasetStats, StatsComparison};
use crate::app::config::Config;
use crate::features::{FeatureTable, ZoneTimeAggregator};
use crate::spatial::{ZoneAssigner, ZoneLabeler};
use crate::trajectory::{DenoiseChain, DenoiseCounts, LabeledPing, Ping, Tracked};
use std::time::Instant;
use tracing::info;

/// Results of a full pipeline run
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Denoised pings with deltas over the surviving set
    pub denoised: Vec<Tracked<Ping>>,
    pub labeled: Vec<LabeledPing>,
    pub features: FeatureTable,
    pub counts: DenoiseCounts,
    /// Raw input vs. denoised output
    pub comparison: StatsComparison,
}

/// Stage parameters for one run
#[derive(Debug, Clone)]
pub struct Pipeline {
    pub denoise: DenoiseChain,
    pub labeler: ZoneLabeler,
    pub aggregator: ZoneTimeAggregator,
}

impl Pipeline {
    pub fn new(config: &Config) -> Self {
        Self {
            denoise: DenoiseChain::from_config(&config.denoise),
            labeler: ZoneLabeler::from_config(&config.binning),
            aggregator: ZoneTimeAggregator::from_config(config),
        }
    }

    pub fn run<A: ZoneAssigner + ?Sized>(&self, pings: Vec<Ping>, assigner: &A) -> crate::Result<PipelineOutput> {
        let started = Instant::now();
        let before = DatasetStats::from_rows(&pings);

        let outcome = self.denoise.denoise(pings);
        let survivors: Vec<Ping> = outcome.rows.iter().map(|t| t.row).collect();
        let after = DatasetStats::from_rows(&survivors);

        let labeled = self.labeler.label(survivors, assigner);
        let features = self.aggregator.aggregate(labeled.clone())?;

        info!(
            rows_in = outcome.counts.input_rows,
            rows_denoised = outcome.counts.output_rows,
            feature_rows = features.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Pipeline complete"
        );

        Ok(PipelineOutput {
            denoised: outcome.rows,
            labeled,
            features,
            counts: outcome.counts,
            comparison: StatsComparison::new(&before, &after),
        })
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}
