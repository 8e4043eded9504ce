//! Correlation-sum adapter.
//!
//! ## Purpose
//!
//! This module provides the execution builder for Grassberger-Procaccia
//! correlation sums. For every scheduled embedding dimension it counts the
//! pairs of points closer than each radius of the scale ladder and reports
//! `C(r) = pairs inside r / pairs examined`. The local slopes of
//! `ln C(r)` against `ln r` estimate the correlation dimension D2.
//!
//! ## Design notes
//!
//! * Options are validated once in [`CorrelationSumBuilder::build`]; a
//!   built [`CorrelationSumScan`] can run any number of inputs.
//! * The pair cap `max_pairs` bounds the work per scale. Scales that reach
//!   it stop accumulating and are flagged low-confidence.
//!
//! ## Visibility
//!
//! Public through the high-level [`ScalingBuilder`](crate::api::ScalingBuilder).

use num_traits::Float;

use crate::adapters::{prepare_sample, ScaleSpec, ScanOptions};
use crate::engine::executor::{run_schedule, RunSummary};
use crate::engine::output::{EstimatorKind, NullReporter, Reporter};
use crate::engine::validator::Validator;
use crate::estimators::pair_count::{PairCountParams, PairCounter};
use crate::input::SampleInput;
use crate::primitives::errors::ScalingError;

/// Default pair cap per scale.
pub const DEFAULT_MAX_PAIRS: u64 = 1000;

/// Default ladder over rescaled data.
pub const DEFAULT_SCALES: ScaleSpec = ScaleSpec::LogSpaced {
    min: 1e-3,
    max: 1.0,
    count: 100,
};

// ============================================================================
// Builder
// ============================================================================

/// Builder for correlation-sum scans.
#[derive(Debug, Clone)]
pub struct CorrelationSumBuilder {
    /// Shared scan options.
    pub scan: ScanOptions,

    /// Length-scale ladder.
    pub scales: ScaleSpec,

    /// Pair cap `N_max` per scale (`None` = unlimited).
    pub max_pairs: Option<u64>,

    /// Tracks options set more than once.
    pub(crate) duplicate_param: Option<&'static str>,
}

impl Default for CorrelationSumBuilder {
    fn default() -> Self {
        Self {
            scan: ScanOptions::default(),
            scales: DEFAULT_SCALES,
            max_pairs: Some(DEFAULT_MAX_PAIRS),
            duplicate_param: None,
        }
    }
}

impl CorrelationSumBuilder {
    /// Set the length-scale ladder.
    pub fn scales(mut self, scales: ScaleSpec) -> Self {
        self.scales = scales;
        self
    }

    /// Set the pair cap (`None` = unlimited).
    pub fn max_pairs(mut self, max_pairs: Option<u64>) -> Self {
        self.max_pairs = max_pairs;
        self
    }

    /// Validate and build the runner.
    pub fn build(self) -> Result<CorrelationSumScan, ScalingError> {
        Validator::validate_no_duplicates(self.duplicate_param)?;
        self.scan.validate()?;
        Validator::validate_max_pairs(self.max_pairs)?;
        let ladder = self.scales.ladder()?;

        Ok(CorrelationSumScan {
            params: PairCountParams {
                ladder,
                metric: self.scan.metric,
                theiler: self.scan.theiler,
                max_pairs: self.max_pairs,
                grid: self.scan.grid,
            },
            scan: self.scan,
        })
    }
}

// ============================================================================
// Runner
// ============================================================================

/// Validated correlation-sum scan.
#[derive(Debug, Clone)]
pub struct CorrelationSumScan {
    scan: ScanOptions,
    params: PairCountParams,
}

impl CorrelationSumScan {
    /// Run every scheduled dimension, streaming snapshots to `reporter`.
    pub fn run<T, I>(&self, input: &I, reporter: &dyn Reporter) -> Result<RunSummary, ScalingError>
    where
        T: Float,
        I: SampleInput<T> + ?Sized,
    {
        let sample = prepare_sample(input)?;
        let config = self.scan.executor_config(EstimatorKind::CorrelationSum);
        Ok(run_schedule(
            &sample,
            &config,
            |points| PairCounter::new(points, self.params.clone()),
            reporter,
        ))
    }

    /// Run without a reporter and return the final tables.
    pub fn fit<T, I>(&self, input: &I) -> Result<RunSummary, ScalingError>
    where
        T: Float,
        I: SampleInput<T> + ?Sized,
    {
        self.run(input, &NullReporter)
    }

    /// Shared scan options.
    pub fn options(&self) -> &ScanOptions {
        &self.scan
    }
}
