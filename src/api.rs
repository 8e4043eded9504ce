//! High-level API for dimension and entropy scans.
//!
//! ## Purpose
//!
//! This module provides the primary user-facing entry point. It implements
//! a fluent builder for the options shared by every estimator and a choice
//! of estimator adapter (correlation sum, fixed mass or Renyi entropy).
//!
//! ## Design notes
//!
//! * **Ergonomic**: every option has a default; only what differs needs to
//!   be set.
//! * **Polymorphic**: marker types turn the generic builder into the
//!   execution builder of one estimator.
//! * **Validated**: options are checked when the execution builder is
//!   built, and setting an option twice is reported as an error.
//!
//! ## Key concepts
//!
//! ### Configuration Flow
//!
//! 1. Create a [`ScalingBuilder`] via `ScalingBuilder::new()`.
//! 2. Chain configuration methods (`.dimensions()`, `.theiler()`, ...).
//! 3. Select an estimator via `.adapter(Adapter::CorrelationSum)`.
//! 4. `.build()` and `.run()` / `.fit()` on any supported input.
//!
//! ```no_run
//! use fastd2::prelude::*;
//!
//! let series: Vec<f64> = (0..2000).map(|i| (i as f64 * 0.1).sin()).collect();
//! let summary = ScalingBuilder::new()
//!     .dimensions(1, 5)
//!     .theiler(10)
//!     .log_scales(1e-3, 1.0, 40)
//!     .adapter(Adapter::CorrelationSum)
//!     .build()?
//!     .fit(&series)?;
//!
//! for table in summary.tables() {
//!     println!("{table}");
//! }
//! # Ok::<(), ScalingError>(())
//! ```
//!
//! ## Visibility
//!
//! This is the primary public API. Types re-exported here are considered
//! stable.

use std::result;
use std::time::Duration;

use crate::adapters::correlation::CorrelationSumBuilder;
use crate::adapters::fixed_mass::FixedMassBuilder;
use crate::adapters::renyi::RenyiBuilder;

// Publicly re-exported types
pub use crate::adapters::correlation::CorrelationSumScan;
pub use crate::adapters::fixed_mass::FixedMassScan;
pub use crate::adapters::renyi::RenyiScan;
pub use crate::adapters::{ScaleSpec, ScanOptions};
pub use crate::algorithms::grid::GridLimits;
pub use crate::algorithms::selection::{ReferenceSelection, DEFAULT_SEED};
pub use crate::engine::executor::{DimensionOutcome, RunSummary};
pub use crate::engine::output::{
    CollectingReporter, EstimatorKind, NullReporter, Phase, Reporter, ScalingTable, SnapshotKind,
    StatusLine, TableFileReporter, WriteMode,
};
pub use crate::estimators::ScaleRow;
pub use crate::math::metric::Metric;
pub use crate::primitives::errors::ScalingError;
pub use crate::primitives::signal::StopSignal;

/// Result type alias for scan operations.
pub type Result<T> = result::Result<T, ScalingError>;

/// Marker types for selecting estimator adapters.
#[allow(non_snake_case)]
pub mod Adapter {
    pub use super::{CorrelationSum, FixedMass, Renyi};
}

// ============================================================================
// Scaling Builder
// ============================================================================

/// Fluent builder for scan options and estimator selection.
#[derive(Debug, Clone, Default)]
pub struct ScalingBuilder {
    /// Embedding-dimension range `(min, max)`.
    pub dimensions: Option<(usize, usize)>,

    /// Maximum components per lag.
    pub components: Option<usize>,

    /// Delay `d`.
    pub delay: Option<usize>,

    /// Column selection.
    pub columns: Option<Vec<usize>>,

    /// Theiler window.
    pub theiler: Option<usize>,

    /// Length-scale ladder.
    pub scales: Option<ScaleSpec>,

    /// Pair (or observation) cap per scale; inner `None` = unlimited.
    pub max_pairs: Option<Option<u64>>,

    /// Reference-point selection.
    pub selection: Option<ReferenceSelection>,

    /// Seed for random reference subsets.
    pub seed: Option<u64>,

    /// Rescale columns to `[0, 1]`.
    pub normalize: Option<bool>,

    /// Distance norm.
    pub metric: Option<Metric>,

    /// Checkpoint interval.
    pub checkpoint_interval: Option<Duration>,

    /// Parallel batch size.
    pub batch_size: Option<usize>,

    /// Parallel execution.
    pub parallel: Option<bool>,

    /// Cancellation flag.
    pub stop: Option<StopSignal>,

    /// Grid memory limits.
    pub grid: Option<GridLimits>,

    /// Fixed-mass neighbor range `(min, max)`.
    pub neighbors: Option<(usize, usize)>,

    /// Fixed-mass target count.
    pub mass_count: Option<usize>,

    /// Renyi order.
    pub order: Option<f64>,

    /// Tracks if any option was set more than once.
    pub(crate) duplicate_param: Option<&'static str>,
}

/// Record `value` in `slot`, noting `name` if it was already set.
fn set<V>(slot: &mut Option<V>, value: V, name: &'static str, dup: &mut Option<&'static str>) {
    if slot.is_some() {
        *dup = Some(name);
    }
    *slot = Some(value);
}

impl ScalingBuilder {
    /// Create a builder with every option at its default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Select an estimator adapter.
    pub fn adapter<A: ScalingAdapter>(self, _adapter: A) -> A::Output {
        A::convert(self)
    }

    /// Set the embedding-dimension range `min..=max`.
    pub fn dimensions(mut self, min: usize, max: usize) -> Self {
        set(&mut self.dimensions, (min, max), "dimensions", &mut self.duplicate_param);
        self
    }

    /// Set the maximum number of components mixed per lag.
    pub fn components(mut self, components: usize) -> Self {
        set(&mut self.components, components, "components", &mut self.duplicate_param);
        self
    }

    /// Set the delay `d`.
    pub fn delay(mut self, delay: usize) -> Self {
        set(&mut self.delay, delay, "delay", &mut self.duplicate_param);
        self
    }

    /// Select input columns (completed upward from the largest).
    pub fn columns(mut self, columns: Vec<usize>) -> Self {
        set(&mut self.columns, columns, "columns", &mut self.duplicate_param);
        self
    }

    /// Set the Theiler window.
    pub fn theiler(mut self, window: usize) -> Self {
        set(&mut self.theiler, window, "theiler", &mut self.duplicate_param);
        self
    }

    /// Use `count` log-spaced scales in `[min, max]`.
    pub fn log_scales(mut self, min: f64, max: f64, count: usize) -> Self {
        set(
            &mut self.scales,
            ScaleSpec::LogSpaced { min, max, count },
            "scales",
            &mut self.duplicate_param,
        );
        self
    }

    /// Use an explicit, strictly increasing list of scales.
    pub fn scales(mut self, scales: Vec<f64>) -> Self {
        set(
            &mut self.scales,
            ScaleSpec::Explicit(scales),
            "scales",
            &mut self.duplicate_param,
        );
        self
    }

    /// Cap the pairs (or observations) accumulated per scale.
    pub fn max_pairs(mut self, max_pairs: u64) -> Self {
        set(&mut self.max_pairs, Some(max_pairs), "max_pairs", &mut self.duplicate_param);
        self
    }

    /// Remove the per-scale cap.
    pub fn unlimited_pairs(mut self) -> Self {
        set(&mut self.max_pairs, None, "max_pairs", &mut self.duplicate_param);
        self
    }

    /// Use a seeded random subset of `count` reference points.
    pub fn reference_points(mut self, count: usize) -> Self {
        set(
            &mut self.selection,
            ReferenceSelection::Random(count),
            "reference_points",
            &mut self.duplicate_param,
        );
        self
    }

    /// Set the seed for random reference subsets.
    pub fn seed(mut self, seed: u64) -> Self {
        set(&mut self.seed, seed, "seed", &mut self.duplicate_param);
        self
    }

    /// Enable or disable rescaling to the unit interval.
    pub fn normalize(mut self, enabled: bool) -> Self {
        set(&mut self.normalize, enabled, "normalize", &mut self.duplicate_param);
        self
    }

    /// Set the distance norm.
    pub fn metric(mut self, metric: Metric) -> Self {
        set(&mut self.metric, metric, "metric", &mut self.duplicate_param);
        self
    }

    /// Set the soft checkpoint interval.
    pub fn checkpoint_interval(mut self, interval: Duration) -> Self {
        set(
            &mut self.checkpoint_interval,
            interval,
            "checkpoint_interval",
            &mut self.duplicate_param,
        );
        self
    }

    /// Set the number of references probed per parallel batch.
    pub fn batch_size(mut self, size: usize) -> Self {
        set(&mut self.batch_size, size, "batch_size", &mut self.duplicate_param);
        self
    }

    /// Enable or disable parallel execution.
    pub fn parallel(mut self, enabled: bool) -> Self {
        set(&mut self.parallel, enabled, "parallel", &mut self.duplicate_param);
        self
    }

    /// Attach a cancellation signal.
    pub fn stop_signal(mut self, stop: StopSignal) -> Self {
        set(&mut self.stop, stop, "stop_signal", &mut self.duplicate_param);
        self
    }

    /// Set grid memory limits.
    pub fn grid_limits(mut self, limits: GridLimits) -> Self {
        set(&mut self.grid, limits, "grid_limits", &mut self.duplicate_param);
        self
    }

    /// Set the fixed-mass neighbor range.
    pub fn neighbors(mut self, min: usize, max: usize) -> Self {
        set(&mut self.neighbors, (min, max), "neighbors", &mut self.duplicate_param);
        self
    }

    /// Set the number of fixed-mass targets.
    pub fn mass_count(mut self, count: usize) -> Self {
        set(&mut self.mass_count, count, "mass_count", &mut self.duplicate_param);
        self
    }

    /// Set the Renyi order `Q`.
    pub fn order(mut self, order: f64) -> Self {
        set(&mut self.order, order, "order", &mut self.duplicate_param);
        self
    }

    /// Shared options with defaults filled in.
    fn scan_options(&self) -> ScanOptions {
        let defaults = ScanOptions::default();
        let (min_dim, max_dim) = self
            .dimensions
            .unwrap_or((defaults.min_dim, defaults.max_dim));
        ScanOptions {
            min_dim,
            max_dim,
            components: self.components.unwrap_or(defaults.components),
            delay: self.delay.unwrap_or(defaults.delay),
            columns: self.columns.clone().unwrap_or(defaults.columns),
            theiler: self.theiler.unwrap_or(defaults.theiler),
            metric: self.metric.unwrap_or(defaults.metric),
            normalize: self.normalize.unwrap_or(defaults.normalize),
            selection: self.selection.unwrap_or(defaults.selection),
            seed: self.seed.unwrap_or(defaults.seed),
            checkpoint_interval: self
                .checkpoint_interval
                .unwrap_or(defaults.checkpoint_interval),
            batch_size: self.batch_size.unwrap_or(defaults.batch_size),
            parallel: self.parallel.unwrap_or(defaults.parallel),
            stop: self.stop.clone().unwrap_or(defaults.stop),
            grid: self.grid.unwrap_or(defaults.grid),
        }
    }
}

// ============================================================================
// Adapters
// ============================================================================

/// Conversion from the generic builder into an estimator's execution builder.
pub trait ScalingAdapter {
    /// The execution builder.
    type Output;

    /// Convert a [`ScalingBuilder`] into the execution builder.
    fn convert(builder: ScalingBuilder) -> Self::Output;
}

/// Marker for correlation-sum scans.
#[derive(Debug, Clone, Copy)]
pub struct CorrelationSum;

impl ScalingAdapter for CorrelationSum {
    type Output = CorrelationSumBuilder;

    fn convert(builder: ScalingBuilder) -> Self::Output {
        let defaults = CorrelationSumBuilder::default();
        CorrelationSumBuilder {
            scan: builder.scan_options(),
            scales: builder.scales.unwrap_or(defaults.scales),
            max_pairs: builder.max_pairs.unwrap_or(defaults.max_pairs),
            duplicate_param: builder.duplicate_param,
        }
    }
}

/// Marker for fixed-mass scans.
#[derive(Debug, Clone, Copy)]
pub struct FixedMass;

impl ScalingAdapter for FixedMass {
    type Output = FixedMassBuilder;

    fn convert(builder: ScalingBuilder) -> Self::Output {
        let defaults = FixedMassBuilder::default();
        let (min_neighbors, max_neighbors) = builder
            .neighbors
            .unwrap_or((defaults.min_neighbors, defaults.max_neighbors));
        FixedMassBuilder {
            scan: builder.scan_options(),
            min_neighbors,
            max_neighbors,
            mass_count: builder.mass_count.unwrap_or(defaults.mass_count),
            max_observations: builder.max_pairs.unwrap_or(defaults.max_observations),
            duplicate_param: builder.duplicate_param,
        }
    }
}

/// Marker for Renyi-entropy scans.
#[derive(Debug, Clone, Copy)]
pub struct Renyi;

impl ScalingAdapter for Renyi {
    type Output = RenyiBuilder;

    fn convert(builder: ScalingBuilder) -> Self::Output {
        let defaults = RenyiBuilder::default();
        RenyiBuilder {
            scan: builder.scan_options(),
            scales: builder.scales.unwrap_or(defaults.scales),
            order: builder.order.unwrap_or(defaults.order),
            duplicate_param: builder.duplicate_param,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_option_fails_build() {
        let err = ScalingBuilder::new()
            .delay(2)
            .delay(3)
            .adapter(Adapter::CorrelationSum)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("delay"));
    }

    #[test]
    fn options_flow_into_adapters() {
        let b = ScalingBuilder::new()
            .dimensions(2, 4)
            .theiler(5)
            .max_pairs(50)
            .neighbors(2, 16)
            .adapter(Adapter::FixedMass);
        assert_eq!((b.scan.min_dim, b.scan.max_dim), (2, 4));
        assert_eq!(b.scan.theiler, 5);
        assert_eq!(b.max_observations, Some(50));
        assert_eq!((b.min_neighbors, b.max_neighbors), (2, 16));

        let r = ScalingBuilder::new().order(0.0).adapter(Adapter::Renyi);
        assert_eq!(r.order, 0.0);

        let c = ScalingBuilder::new().unlimited_pairs().adapter(Adapter::CorrelationSum);
        assert_eq!(c.max_pairs, None);
    }
}
