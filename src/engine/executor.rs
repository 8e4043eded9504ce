//! Dimension executor.
//!
//! ## Purpose
//!
//! This module runs a whole scan: it prepares the sample once, walks the
//! embedding schedule and, for every configuration, embeds the sample,
//! builds an accumulator and hands it to the [`ScaleScheduler`].
//!
//! ## Design notes
//!
//! * Dimensions are independent: each owns its point set, grid and
//!   accumulator. With the `cpu` feature they run on the rayon pool and
//!   only meet again when results are collected.
//! * Errors are isolated. A dimension that cannot be embedded or indexed is
//!   recorded as failed in the [`RunSummary`] and the others continue.
//! * The accumulator is created through a factory closure, so the same
//!   driver serves every estimator variant.

#[cfg(feature = "cpu")]
use rayon::prelude::*;
use tracing::{info, warn};

use crate::algorithms::embedding::{embed, EmbeddingSchedule, EmbeddingSpec, PointSet};
use crate::engine::output::{EstimatorKind, Phase, Reporter, ScalingTable, StatusLine};
use crate::engine::scheduler::{ScaleScheduler, SchedulerConfig, TableMeta};
use crate::estimators::ScaleAccumulator;
use crate::math::metric::Metric;
use crate::math::normalize::rescale_unit_interval;
use crate::primitives::errors::ScalingError;
use crate::primitives::sample::Sample;

// ============================================================================
// Configuration
// ============================================================================

/// Settings of one scan, shared by every estimator variant.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Smallest embedding dimension reported.
    pub min_dim: usize,

    /// Largest embedding dimension reported.
    pub max_dim: usize,

    /// Maximum number of components mixed per lag.
    pub components: usize,

    /// Delay `d`.
    pub delay: usize,

    /// Column selection (completed upward).
    pub columns: Vec<usize>,

    /// Rescale every column to `[0, 1]` before embedding.
    pub normalize: bool,

    /// Quantity being estimated.
    pub kind: EstimatorKind,

    /// Distance norm.
    pub metric: Metric,

    /// Per-dimension scheduler settings.
    pub scheduler: SchedulerConfig,
}

// ============================================================================
// Results
// ============================================================================

/// Result of one scheduled embedding.
#[derive(Debug)]
pub struct DimensionOutcome {
    /// The embedding configuration.
    pub spec: EmbeddingSpec,

    /// Final table, or the error that ended this dimension.
    pub result: Result<ScalingTable, ScalingError>,
}

/// Results of every scheduled dimension, in schedule order.
#[derive(Debug, Default)]
pub struct RunSummary {
    /// One entry per scheduled embedding.
    pub dimensions: Vec<DimensionOutcome>,
}

impl RunSummary {
    /// Successful tables, in schedule order.
    pub fn tables(&self) -> impl Iterator<Item = &ScalingTable> {
        self.dimensions.iter().filter_map(|d| d.result.as_ref().ok())
    }

    /// Failed dimensions with their errors.
    pub fn failures(&self) -> impl Iterator<Item = (&EmbeddingSpec, &ScalingError)> {
        self.dimensions
            .iter()
            .filter_map(|d| d.result.as_ref().err().map(|e| (&d.spec, e)))
    }

    /// Table of embedding dimension `m` (the first one, in mixed schedules).
    pub fn table(&self, m: usize) -> Option<&ScalingTable> {
        self.tables().find(|t| t.dimension == m)
    }

    /// Returns `true` if every dimension produced a complete table.
    pub fn is_complete(&self) -> bool {
        self.dimensions
            .iter()
            .all(|d| matches!(&d.result, Ok(t) if t.is_complete()))
    }

    /// Returns `true` if any dimension was cancelled.
    pub fn was_cancelled(&self) -> bool {
        self.tables().any(|t| t.cancelled)
    }
}

// ============================================================================
// Executor
// ============================================================================

/// Run every scheduled dimension with accumulators built by `make`.
pub fn run_schedule<A, F>(
    sample: &Sample<f64>,
    config: &ExecutorConfig,
    make: F,
    reporter: &dyn Reporter,
) -> RunSummary
where
    A: ScaleAccumulator,
    F: Fn(PointSet) -> Result<A, ScalingError> + Sync,
{
    let prepared;
    let sample = if config.normalize {
        let mut copy = sample.clone();
        let constant = rescale_unit_interval(&mut copy);
        if !constant.is_empty() {
            warn!(columns = ?constant, "constant columns mapped to 0 by normalization");
        }
        prepared = copy;
        &prepared
    } else {
        sample
    };

    let schedule = EmbeddingSchedule::new(
        config.components,
        config.min_dim,
        config.max_dim,
        config.delay,
        &config.columns,
    );
    info!(
        estimator = config.kind.label(),
        dimensions = schedule.len(),
        rows = sample.len(),
        "starting scan"
    );

    let run_one = |spec: &EmbeddingSpec| DimensionOutcome {
        spec: spec.clone(),
        result: run_dimension(sample, spec, config, &make, reporter),
    };

    #[cfg(feature = "cpu")]
    let dimensions: Vec<DimensionOutcome> = if config.scheduler.parallel {
        schedule.specs().par_iter().map(run_one).collect()
    } else {
        schedule.specs().iter().map(run_one).collect()
    };
    #[cfg(not(feature = "cpu"))]
    let dimensions: Vec<DimensionOutcome> = schedule.specs().iter().map(run_one).collect();

    let summary = RunSummary { dimensions };
    info!(
        completed = summary.tables().count(),
        failed = summary.failures().count(),
        "scan finished"
    );
    summary
}

fn run_dimension<A, F>(
    sample: &Sample<f64>,
    spec: &EmbeddingSpec,
    config: &ExecutorConfig,
    make: &F,
    reporter: &dyn Reporter,
) -> Result<ScalingTable, ScalingError>
where
    A: ScaleAccumulator,
    F: Fn(PointSet) -> Result<A, ScalingError>,
{
    let dimension = spec.dimension();
    info!(
        dimension,
        components = spec.components,
        lags = spec.lags,
        "starting dimension"
    );
    reporter.status(&StatusLine {
        dimension,
        phase: Phase::Initializing,
        references_done: 0,
        references_total: 0,
        frozen_scales: 0,
        total_scales: 0,
        message: None,
    });

    let result = embed(sample, spec).and_then(make).and_then(|acc| {
        let meta = TableMeta {
            kind: config.kind,
            metric: config.metric,
            spec: spec.clone(),
        };
        ScaleScheduler::new(acc, &config.scheduler, meta).run(reporter)
    });

    match &result {
        Ok(table) => info!(
            dimension,
            references = table.references_done,
            frozen = table.frozen_rows(),
            cancelled = table.cancelled,
            "dimension finished"
        ),
        Err(err) => {
            warn!(dimension, error = %err, "dimension failed");
            reporter.status(&StatusLine {
                dimension,
                phase: Phase::Done,
                references_done: 0,
                references_total: 0,
                frozen_scales: 0,
                total_scales: 0,
                message: Some(err.to_string()),
            });
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::grid::GridLimits;
    use crate::engine::output::CollectingReporter;
    use crate::estimators::pair_count::{PairCountParams, PairCounter};
    use crate::primitives::ladder::ScaleLadder;

    fn config(min_dim: usize, max_dim: usize) -> ExecutorConfig {
        ExecutorConfig {
            min_dim,
            max_dim,
            components: 1,
            delay: 1,
            columns: Vec::new(),
            normalize: true,
            kind: EstimatorKind::CorrelationSum,
            metric: Metric::Maximum,
            scheduler: SchedulerConfig::default(),
        }
    }

    fn params() -> PairCountParams {
        PairCountParams {
            ladder: ScaleLadder::log_spaced(0.05, 0.5, 4).unwrap(),
            metric: Metric::Maximum,
            theiler: 0,
            max_pairs: None,
            grid: GridLimits::default(),
        }
    }

    #[test]
    fn too_short_dimensions_fail_in_isolation() {
        let values: Vec<f64> = (0..6).map(|i| (i as f64 * 1.3).sin()).collect();
        let sample = Sample::scalar(&values).unwrap();
        let reporter = CollectingReporter::new();
        let summary = run_schedule(
            &sample,
            &config(1, 8),
            |pts| PairCounter::new(pts, params()),
            &reporter,
        );

        // m = 1..6 embed, m = 7, 8 need more samples than exist.
        assert_eq!(summary.dimensions.len(), 8);
        assert_eq!(summary.tables().count(), 6);
        let failed: Vec<usize> = summary.failures().map(|(s, _)| s.dimension()).collect();
        assert_eq!(failed, vec![7, 8]);
        assert!(summary
            .failures()
            .all(|(_, e)| matches!(e, ScalingError::InvalidEmbedding { .. })));
        assert!(!summary.is_complete());
        assert_eq!(reporter.finals().len(), 6);
    }

    #[test]
    fn constant_series_is_degenerate_not_fatal() {
        let sample = Sample::scalar(&[3.0; 20]).unwrap();
        let summary = run_schedule(
            &sample,
            &config(1, 2),
            |pts| PairCounter::new(pts, params()),
            &CollectingReporter::new(),
        );
        assert_eq!(summary.tables().count(), 2);
        assert!(summary.tables().all(|t| t.degenerate && t.is_complete()));
    }
}
