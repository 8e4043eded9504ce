//! Layer 4: Estimators
//!
//! Per-dimension accumulation strategies.
//!
//! Each estimator variant owns its point set, its spatial index and its
//! accumulators, and exposes them to the scheduler through the
//! [`ScaleAccumulator`] trait. Work is split into independent *units*
//! (reference points, or scales for box counting): a unit is first
//! *probed* against an immutable view of the estimator, producing a tally,
//! and tallies are then *absorbed* in unit order. Probing may run on many
//! threads; absorbing is sequential and append-only, so results never depend
//! on the thread count.
//!
//! # Module Organization
//!
//! - **pair_count**: Correlation sums (pair counts per radius)
//! - **fixed_mass**: Radius of the K-th nearest neighbor per mass
//! - **box_occupation**: Order-Q Renyi sums over box occupations
//!
//! # Architecture
//!
//! ```text
//! Layer 7: API
//!   ↓
//! Layer 6: Adapters
//!   ↓
//! Layer 5: Engine (validator, scheduler, executor, output)
//!   ↓
//! Layer 4: Estimators ← You are here
//!   ↓
//! Layer 3: Algorithms (embedding, grid, selection)
//!   ↓
//! Layer 2: Math (metric, normalize, slope)
//!   ↓
//! Layer 1: Primitives (errors, sample, ladder, signal)
//! ```

use crate::algorithms::selection::ReferenceSelection;

/// Correlation-sum accumulator.
///
/// Provides:
/// - Histogram tallies of pair distances over the scale ladder
/// - Per-scale pair caps with suffix freezing
pub mod pair_count;

/// Fixed-mass accumulator.
///
/// Provides:
/// - Ring-expanding K-nearest-neighbor search
/// - Geometric mean radius per neighbor-count target
pub mod fixed_mass;

/// Box-occupation accumulator.
///
/// Provides:
/// - Occupation counts of full-dimensional boxes per scale
/// - Order-Q Renyi entropies
pub mod box_occupation;

// ============================================================================
// Scale Row
// ============================================================================

/// One reported line of a scaling table.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleRow {
    /// Length scale (radius) of the row.
    pub scale: f64,

    /// Estimator-specific statistic at this scale.
    pub statistic: f64,

    /// Raw count behind the statistic (pairs, observations or boxes).
    pub count: u64,

    /// Normalization of `count` (examined pairs, references or points).
    pub norm: u64,

    /// Reference points (or work units) that contributed to this row.
    pub references: u64,

    /// Whether the row stopped accumulating before the scan finished.
    pub frozen: bool,

    /// Whether the data were degenerate at this scale.
    pub degenerate: bool,

    /// Whether the statistic is a truncated, early-frozen estimate.
    pub low_confidence: bool,
}

// ============================================================================
// Accumulator Trait
// ============================================================================

/// Strategy driven by the scale scheduler for one embedding dimension.
pub trait ScaleAccumulator: Send + Sync {
    /// Contribution of one work unit.
    type Tally: Send;

    /// Per-worker scratch space reused across probes.
    type Scratch: Send;

    /// Work units to process, in order.
    fn work_units(&self, selection: ReferenceSelection, seed: u64) -> Vec<usize>;

    /// Allocate a scratch buffer for one worker.
    fn scratch(&self) -> Self::Scratch;

    /// Measure one unit against the current (immutable) state.
    fn probe(&self, unit: usize, scratch: &mut Self::Scratch) -> Self::Tally;

    /// Fold one tally into the accumulators.
    fn absorb(&mut self, tally: Self::Tally);

    /// Returns `true` once every scale is frozen.
    fn is_saturated(&self) -> bool;

    /// Returns `true` if the point set has zero extent.
    fn is_degenerate(&self) -> bool;

    /// Number of embedded points `N'`.
    fn point_count(&self) -> usize;

    /// Render the current state, one row per scale.
    fn rows(&self) -> Vec<ScaleRow>;
}
