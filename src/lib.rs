//! Multiscale neighbor counting for dimension and entropy estimation.
//!
//! `fastd2` embeds scalar or multichannel time series with time delays and
//! measures, across a ladder of length scales, how neighborhoods of the
//! embedded points fill up. Three estimators are provided:
//!
//! * **Correlation sums** `C(r)`: the fraction of point pairs closer than
//!   `r`. The slope of `ln C` against `ln r` estimates the correlation
//!   dimension D2.
//! * **Fixed mass**: the mean log radius enclosing `K` nearest neighbors.
//!   The slope of `ln(K / N)` against the mean `ln r` estimates the
//!   information dimension D1.
//! * **Renyi entropies** `H_Q(r)` from box occupation. `-dH_Q / d ln r`
//!   estimates the generalized dimension `D_Q`.
//!
//! Neighbor searches run on a sparse box grid, reference points are
//! processed in batches (in parallel with the `cpu` feature), scales whose
//! pair budget is exhausted stop early, and snapshots of every table are
//! streamed to a [`Reporter`](engine::output::Reporter) at a soft interval.
//!
//! ## Quick start
//!
//! ```no_run
//! use fastd2::prelude::*;
//!
//! let series = read_file("series.dat", &ReadOptions::default())?;
//! let reporter = TableFileReporter::create("d2.txt", WriteMode::Overwrite)?;
//!
//! let summary = ScalingBuilder::new()
//!     .dimensions(1, 8)
//!     .delay(2)
//!     .theiler(20)
//!     .adapter(Adapter::CorrelationSum)
//!     .build()?
//!     .run(&series, &reporter)?;
//!
//! for failure in summary.failures() {
//!     eprintln!("{failure:?}");
//! }
//! # Ok::<(), ScalingError>(())
//! ```
//!
//! ## Feature flags
//!
//! * `cpu` (default): parallel execution across embedding dimensions and
//!   reference batches via rayon. Results are identical without it.

// Layer 1: Primitives
pub mod primitives;

// Layer 2: Math
pub mod math;

// Layer 3: Algorithms
pub mod algorithms;

// Layer 4: Estimators
pub mod estimators;

// Layer 5: Engine
pub mod engine;

// Layer 6: Adapters
pub mod adapters;

// Layer 7: API
pub mod api;

// Input conversion and file reading
pub mod input;

// TOML scan configuration
pub mod config;

/// Standard imports for running scans.
pub mod prelude {
    pub use crate::api::{
        Adapter, CollectingReporter, DimensionOutcome, EstimatorKind, GridLimits, Metric,
        NullReporter, Phase, ReferenceSelection, Reporter, Result, RunSummary, ScaleRow,
        ScaleSpec, ScalingAdapter, ScalingBuilder, ScalingError, ScalingTable, StatusLine,
        StopSignal, TableFileReporter, WriteMode,
    };
    pub use crate::config::{EngineConfig, EstimatorChoice};
    pub use crate::input::{read_columns, read_file, ReadOptions, SampleInput};
    pub use crate::primitives::sample::Sample;
}

/// Lower-level building blocks for custom estimators.
///
/// These types are public for callers implementing their own
/// [`ScaleAccumulator`](crate::estimators::ScaleAccumulator); their
/// signatures may change between minor versions.
pub mod internals {
    pub use crate::algorithms::embedding::{embed, EmbeddingSchedule, EmbeddingSpec, PointSet};
    pub use crate::algorithms::grid::BoxGrid;
    pub use crate::engine::executor::{run_schedule, ExecutorConfig};
    pub use crate::engine::scheduler::{ScaleScheduler, SchedulerConfig, TableMeta};
    pub use crate::estimators::ScaleAccumulator;
    pub use crate::primitives::ladder::ScaleLadder;
}
