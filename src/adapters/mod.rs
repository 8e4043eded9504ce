//! Layer 6: Adapters
//!
//! Execution builders for the estimator variants.
//!
//! Each adapter pairs the shared [`ScanOptions`] (embedding range, Theiler
//! window, reference selection, scheduler and grid settings) with the
//! options of one estimator, validates everything in `build()` and then
//! runs scans on any [`SampleInput`](crate::input::SampleInput).
//!
//! # Module Organization
//!
//! - **correlation**: Correlation sums `C(r)` (correlation dimension D2)
//! - **fixed_mass**: Fixed-mass radii (information dimension D1)
//! - **renyi**: Order-Q Renyi entropies from box counting
//!
//! # Architecture
//!
//! ```text
//! Layer 7: API
//!   ↓
//! Layer 6: Adapters ← You are here
//!   ↓
//! Layer 5: Engine (validator, scheduler, executor, output)
//!   ↓
//! Layer 4: Estimators (pair count, fixed mass, box occupation)
//!   ↓
//! Layer 3: Algorithms (embedding, grid, selection)
//!   ↓
//! Layer 2: Math (metric, normalize, slope)
//!   ↓
//! Layer 1: Primitives (errors, sample, ladder, signal)
//! ```

use std::time::Duration;

use num_traits::Float;

use crate::algorithms::grid::GridLimits;
use crate::algorithms::selection::{ReferenceSelection, DEFAULT_SEED};
use crate::engine::executor::ExecutorConfig;
use crate::engine::output::EstimatorKind;
use crate::engine::scheduler::{SchedulerConfig, DEFAULT_BATCH_SIZE, DEFAULT_CHECKPOINT_INTERVAL};
use crate::engine::validator::Validator;
use crate::input::SampleInput;
use crate::math::metric::Metric;
use crate::primitives::errors::ScalingError;
use crate::primitives::ladder::ScaleLadder;
use crate::primitives::sample::Sample;
use crate::primitives::signal::StopSignal;

/// Correlation-sum adapter.
///
/// Provides:
/// - `CorrelationSumBuilder` and the `CorrelationSumScan` runner
pub mod correlation;

/// Fixed-mass adapter.
///
/// Provides:
/// - `FixedMassBuilder` and the `FixedMassScan` runner
pub mod fixed_mass;

/// Renyi-entropy adapter.
///
/// Provides:
/// - `RenyiBuilder` and the `RenyiScan` runner
pub mod renyi;

// ============================================================================
// Scale Specification
// ============================================================================

/// How the length-scale ladder is chosen.
#[derive(Debug, Clone, PartialEq)]
pub enum ScaleSpec {
    /// `count` radii log-spaced over `[min, max]`.
    LogSpaced {
        /// Smallest radius.
        min: f64,
        /// Largest radius.
        max: f64,
        /// Number of radii.
        count: usize,
    },

    /// Explicit, strictly increasing radii.
    Explicit(Vec<f64>),
}

impl ScaleSpec {
    /// Materialize the ladder, validating the request.
    pub fn ladder(&self) -> Result<ScaleLadder, ScalingError> {
        match self {
            Self::LogSpaced { min, max, count } => ScaleLadder::log_spaced(*min, *max, *count),
            Self::Explicit(scales) => ScaleLadder::from_scales(scales.clone()),
        }
    }
}

// ============================================================================
// Scan Options
// ============================================================================

/// Options shared by every estimator variant.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Smallest embedding dimension `m` reported.
    pub min_dim: usize,

    /// Largest embedding dimension `m` reported.
    pub max_dim: usize,

    /// Maximum components mixed per lag (1 for scalar delay embeddings).
    pub components: usize,

    /// Delay `d` in samples.
    pub delay: usize,

    /// Column selection, completed upward from its largest entry.
    pub columns: Vec<usize>,

    /// Theiler window `t_w`.
    pub theiler: usize,

    /// Distance norm.
    pub metric: Metric,

    /// Rescale every column to `[0, 1]` before embedding.
    pub normalize: bool,

    /// Reference points.
    pub selection: ReferenceSelection,

    /// Seed for random reference subsets.
    pub seed: u64,

    /// Soft interval between checkpoints.
    pub checkpoint_interval: Duration,

    /// Units probed per parallel batch.
    pub batch_size: usize,

    /// Run dimensions and batches on the rayon pool.
    pub parallel: bool,

    /// External cancellation flag.
    pub stop: StopSignal,

    /// Grid memory limits.
    pub grid: GridLimits,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            min_dim: 1,
            max_dim: 10,
            components: 1,
            delay: 1,
            columns: Vec::new(),
            theiler: 0,
            metric: Metric::default(),
            normalize: true,
            selection: ReferenceSelection::All,
            seed: DEFAULT_SEED,
            checkpoint_interval: DEFAULT_CHECKPOINT_INTERVAL,
            batch_size: DEFAULT_BATCH_SIZE,
            parallel: true,
            stop: StopSignal::new(),
            grid: GridLimits::default(),
        }
    }
}

impl ScanOptions {
    /// Check every shared option.
    pub fn validate(&self) -> Result<(), ScalingError> {
        Validator::validate_dimensions(self.min_dim, self.max_dim)?;
        Validator::validate_embedding(self.components, self.delay)?;
        Validator::validate_references(self.selection)?;
        Validator::validate_scheduler(self.checkpoint_interval, self.batch_size)?;
        Validator::validate_cell_budget(self.grid.cell_budget)?;
        Ok(())
    }

    /// Engine configuration for one estimator kind.
    pub(crate) fn executor_config(&self, kind: EstimatorKind) -> ExecutorConfig {
        ExecutorConfig {
            min_dim: self.min_dim,
            max_dim: self.max_dim,
            components: self.components,
            delay: self.delay,
            columns: self.columns.clone(),
            normalize: self.normalize,
            kind,
            metric: self.metric,
            scheduler: SchedulerConfig {
                selection: self.selection,
                seed: self.seed,
                checkpoint_interval: self.checkpoint_interval,
                batch_size: self.batch_size,
                parallel: self.parallel,
                stop: self.stop.clone(),
            },
        }
    }
}

/// Convert any supported input to the `f64` sample the engine works on.
pub(crate) fn prepare_sample<T, I>(input: &I) -> Result<Sample<f64>, ScalingError>
where
    T: Float,
    I: SampleInput<T> + ?Sized,
{
    Ok(input.to_sample()?.to_f64())
}
