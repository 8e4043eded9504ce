//! Multiscale pair counting for correlation sums.
//!
//! ## Purpose
//!
//! This module accumulates, for every radius `r_b` of a scale ladder, the
//! number of point pairs closer than `r_b`. The correlation sum
//! `C(r_b) = count_b / pairs_b` is the fraction of examined pairs inside
//! the radius; its log-log slope estimates the correlation dimension.
//!
//! ## Design notes
//!
//! * **One query, all scales**: each reference point issues a single grid
//!   query at the largest active radius. Every surviving pair is binned at
//!   the first scale containing it, and scales are updated together from
//!   the cumulative histogram.
//! * **Ordered pairs**: reference `i` only pairs with partners `j > i`, so
//!   an unordered pair is never counted twice.
//! * **Theiler window**: partners with `j - i < t_w` are skipped.
//! * **Pair cap**: absorbing a tally clamps every scale at `N_max`, which
//!   is exactly what freezing after each single increment would give.
//!
//! ## Key concepts
//!
//! ### Suffix freezing
//!
//! Larger scales contain every pair of smaller scales, so counts are
//! non-decreasing along the ladder and the largest scales reach the cap
//! first. Frozen scales therefore always form a suffix; `active_end` marks
//! its start, and the query radius shrinks as scales freeze.
//!
//! ### Normalization
//!
//! A scale's denominator is the number of partners that were eligible
//! while the scale was active, so frozen scales stay unbiased estimates of
//! `C(r)` over the references they saw.
//!
//! ## Invariants
//!
//! * `count[b] <= count[b + 1]` at all times.
//! * `count[b] <= N_max` for every scale.
//! * Counts and denominators only grow.

use crate::algorithms::embedding::PointSet;
use crate::algorithms::grid::{BoxGrid, GridLimits};
use crate::algorithms::selection::ReferenceSelection;
use crate::estimators::{ScaleAccumulator, ScaleRow};
use crate::math::metric::Metric;
use crate::primitives::errors::ScalingError;
use crate::primitives::ladder::ScaleLadder;

// ============================================================================
// Parameters
// ============================================================================

/// Settings shared by every dimension of a correlation-sum scan.
#[derive(Debug, Clone)]
pub struct PairCountParams {
    /// Radii at which pairs are counted.
    pub ladder: ScaleLadder,

    /// Distance norm.
    pub metric: Metric,

    /// Theiler window `t_w`.
    pub theiler: usize,

    /// Pair cap `N_max` per scale (`None` = unlimited).
    pub max_pairs: Option<u64>,

    /// Grid memory limits.
    pub grid: GridLimits,
}

/// Pair-distance histogram of one reference point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairTally {
    /// Partners eligible for pairing with the reference.
    pub partners: u64,

    /// `hist[b]`: pairs whose first containing scale is `b`.
    pub hist: Vec<u64>,
}

// ============================================================================
// Pair Counter
// ============================================================================

/// Correlation-sum accumulator for one embedding dimension.
#[derive(Debug)]
pub struct PairCounter {
    points: PointSet,
    grid: BoxGrid,
    params: PairCountParams,
    degenerate: bool,
    counts: Vec<u64>,
    pairs: Vec<u64>,
    references: Vec<u64>,
    active_end: usize,
}

impl PairCounter {
    /// Index `points` and create empty accumulators.
    pub fn new(points: PointSet, params: PairCountParams) -> Result<Self, ScalingError> {
        let grid = BoxGrid::build_coarsening(&points, params.ladder.largest(), params.grid)?;
        let scales = params.ladder.len();
        let degenerate = points.extent() <= 0.0;

        Ok(Self {
            points,
            grid,
            degenerate,
            counts: vec![0; scales],
            pairs: vec![0; scales],
            references: vec![0; scales],
            active_end: if degenerate { 0 } else { scales },
            params,
        })
    }

    /// Minimum index separation of a counted pair.
    #[inline]
    fn min_separation(&self) -> usize {
        self.params.theiler.max(1)
    }

    #[inline]
    fn cap(&self) -> u64 {
        self.params.max_pairs.unwrap_or(u64::MAX)
    }

    /// Raw pair counts, one per scale.
    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    /// Number of scales still accumulating.
    pub fn active_scales(&self) -> usize {
        self.active_end
    }
}

impl ScaleAccumulator for PairCounter {
    type Tally = PairTally;
    type Scratch = ();

    fn work_units(&self, selection: ReferenceSelection, seed: u64) -> Vec<usize> {
        selection.select(self.points.len(), seed)
    }

    fn scratch(&self) -> Self::Scratch {}

    fn probe(&self, i: usize, _scratch: &mut Self::Scratch) -> PairTally {
        let n = self.points.len();
        let first_partner = i + self.min_separation();
        let partners = n.saturating_sub(first_partner) as u64;
        let mut hist = vec![0u64; self.active_end];

        if self.active_end == 0 || partners == 0 {
            return PairTally { partners, hist };
        }

        let ladder = &self.params.ladder;
        let cutoff = ladder.as_slice()[self.active_end - 1];
        let metric = self.params.metric;
        let p = self.points.point(i);

        self.grid.for_each_candidate(i, |j| {
            if j < first_partner {
                return;
            }
            if let Some(d) = metric.distance_within(p, self.points.point(j), cutoff) {
                hist[ladder.first_containing(d)] += 1;
            }
        });

        PairTally { partners, hist }
    }

    fn absorb(&mut self, tally: PairTally) {
        let cap = self.cap();
        let active = self.active_end.min(tally.hist.len());

        let mut inside = 0u64;
        for b in 0..active {
            inside += tally.hist[b];
            self.references[b] += 1;
            self.pairs[b] += tally.partners;
            self.counts[b] = self.counts[b].saturating_add(inside).min(cap);
        }

        while self.active_end > 0 && self.counts[self.active_end - 1] >= cap {
            self.active_end -= 1;
        }
    }

    fn is_saturated(&self) -> bool {
        self.active_end == 0
    }

    fn is_degenerate(&self) -> bool {
        self.degenerate
    }

    fn point_count(&self) -> usize {
        self.points.len()
    }

    fn rows(&self) -> Vec<ScaleRow> {
        self.params
            .ladder
            .as_slice()
            .iter()
            .enumerate()
            .map(|(b, &scale)| {
                let frozen = b >= self.active_end;
                let statistic = if self.pairs[b] > 0 {
                    self.counts[b] as f64 / self.pairs[b] as f64
                } else {
                    0.0
                };
                ScaleRow {
                    scale,
                    statistic,
                    count: self.counts[b],
                    norm: self.pairs[b],
                    references: self.references[b],
                    frozen,
                    degenerate: self.degenerate,
                    low_confidence: frozen && !self.degenerate,
                }
            })
            .collect()
    }
}
