//! Fixed-mass scaling.
//!
//! ## Purpose
//!
//! Instead of counting neighbors inside fixed radii, the fixed-mass
//! estimator fixes the neighbor count `K` and measures the radius needed to
//! reach it. For a mass ladder `K_1 < ... < K_B` it averages `ln r_K` over
//! reference points; the curve `ln(K / (N' - 1))` against the mean log
//! radius has the dimension as its slope, and stays well sampled at small
//! radii where correlation sums run out of pairs.
//!
//! ## Design notes
//!
//! * **Ring expansion**: neighbors are gathered ring by ring around the
//!   reference cell. After rings `0..=R` every point within `R * side` has
//!   been seen, so the search stops as soon as the `K_need`-th smallest
//!   distance found is inside that radius.
//! * **Both sides**: unlike pair counting, every eligible point on either
//!   side of the reference is a neighbor candidate. The Theiler window
//!   excludes `|i - j| < max(t_w, 1)`.
//! * **Per-target freezing**: a target stops accumulating after `N_max`
//!   observations.
//! * **Zero radii**: coincident neighbors give `ln 0`; they are counted as
//!   degenerate hits and left out of the mean.

use crate::algorithms::embedding::PointSet;
use crate::algorithms::grid::{BoxGrid, GridLimits, MAX_GRID_AXES};
use crate::algorithms::selection::ReferenceSelection;
use crate::estimators::{ScaleAccumulator, ScaleRow};
use crate::math::metric::Metric;
use crate::primitives::errors::ScalingError;

// ============================================================================
// Mass Ladder
// ============================================================================

/// Log-spaced integer neighbor counts between `min` and `max`.
///
/// Rounding can map neighboring log positions to the same integer; such
/// duplicates are dropped, so fewer than `count` targets may come back.
pub fn mass_targets(min: usize, max: usize, count: usize) -> Result<Vec<usize>, ScalingError> {
    if min == 0 {
        return Err(ScalingError::config("min_neighbors", min, "must be at least 1"));
    }
    if max < min {
        return Err(ScalingError::config(
            "max_neighbors",
            max,
            format!("must be >= min_neighbors ({min})"),
        ));
    }
    if count == 0 {
        return Err(ScalingError::config("mass_count", count, "must be at least 1"));
    }
    if count == 1 || min == max {
        return Ok(vec![max]);
    }

    let (lo, hi) = ((min as f64).ln(), (max as f64).ln());
    let step = (hi - lo) / (count - 1) as f64;
    let mut out: Vec<usize> = (0..count)
        .map(|b| ((lo + step * b as f64).exp().round() as usize).clamp(min, max))
        .collect();
    out.dedup();
    Ok(out)
}

// ============================================================================
// Parameters
// ============================================================================

/// Settings shared by every dimension of a fixed-mass scan.
#[derive(Debug, Clone)]
pub struct FixedMassParams {
    /// Neighbor-count targets, strictly increasing.
    pub targets: Vec<usize>,

    /// Distance norm.
    pub metric: Metric,

    /// Theiler window `t_w`.
    pub theiler: usize,

    /// Observation cap per target (`None` = unlimited).
    pub max_observations: Option<u64>,

    /// Grid memory limits.
    pub grid: GridLimits,
}

// ============================================================================
// Fixed-Mass Accumulator
// ============================================================================

#[derive(Debug, Clone, Default)]
struct TargetState {
    sum_ln: f64,
    observations: u64,
    zero_hits: u64,
    references: u64,
    frozen: bool,
}

/// Fixed-mass accumulator for one embedding dimension.
#[derive(Debug)]
pub struct FixedMassAccumulator {
    points: PointSet,
    grid: BoxGrid,
    params: FixedMassParams,
    degenerate: bool,
    state: Vec<TargetState>,
}

impl FixedMassAccumulator {
    /// Index `points` with a cell side sized for the largest target.
    pub fn new(points: PointSet, params: FixedMassParams) -> Result<Self, ScalingError> {
        let side = Self::cell_side(&points, params.targets.last().copied().unwrap_or(1));
        let grid = BoxGrid::build_coarsening(&points, side, params.grid)?;
        let degenerate = points.extent() <= 0.0;
        let mut state = vec![TargetState::default(); params.targets.len()];
        if degenerate {
            state.iter_mut().for_each(|s| s.frozen = true);
        }

        Ok(Self {
            points,
            grid,
            params,
            degenerate,
            state,
        })
    }

    /// Side at which a cell neighborhood holds about `k_max` points under a
    /// uniform density over the gridded axes.
    fn cell_side(points: &PointSet, k_max: usize) -> f64 {
        let axes = points.dim().min(MAX_GRID_AXES);
        let (lo, hi) = points.bounds(axes);
        let extent = lo
            .iter()
            .zip(&hi)
            .map(|(a, b)| b - a)
            .fold(0.0_f64, f64::max);
        if extent <= 0.0 || points.is_empty() || axes == 0 {
            return 1.0;
        }
        let fraction = (k_max as f64 / points.len() as f64).min(1.0);
        extent * fraction.powf(1.0 / axes as f64)
    }

    /// Neighbor exclusion radius in index space.
    #[inline]
    fn min_separation(&self) -> usize {
        self.params.theiler.max(1)
    }

    /// Number of points eligible as neighbors of `i`.
    fn eligible(&self, i: usize) -> usize {
        let w = self.min_separation();
        let before = (i + 1).saturating_sub(w);
        let after = self.points.len().saturating_sub(i + w);
        before + after
    }

    /// Largest target still accumulating.
    fn needed(&self) -> Option<usize> {
        self.params
            .targets
            .iter()
            .zip(&self.state)
            .filter(|(_, s)| !s.frozen)
            .map(|(&k, _)| k)
            .max()
    }

    /// Mass `K / (N' - 1)` of a target.
    fn mass(&self, k: usize) -> f64 {
        let others = self.points.len().saturating_sub(1).max(1);
        k as f64 / others as f64
    }
}

impl ScaleAccumulator for FixedMassAccumulator {
    type Tally = Vec<Option<f64>>;
    type Scratch = Vec<f64>;

    fn work_units(&self, selection: ReferenceSelection, seed: u64) -> Vec<usize> {
        selection.select(self.points.len(), seed)
    }

    fn scratch(&self) -> Vec<f64> {
        Vec::new()
    }

    fn probe(&self, i: usize, dists: &mut Vec<f64>) -> Self::Tally {
        let mut tally = vec![None; self.params.targets.len()];
        let Some(k_max) = self.needed() else {
            return tally;
        };
        let k_need = k_max.min(self.eligible(i));
        if k_need == 0 {
            return tally;
        }

        let w = self.min_separation();
        let metric = self.params.metric;
        let p = self.points.point(i);
        let last_ring = self.grid.max_ring(i);
        dists.clear();

        for ring in 0..=last_ring {
            self.grid.for_each_in_ring(i, ring, |j| {
                if i.abs_diff(j) >= w {
                    dists.push(metric.distance(p, self.points.point(j)));
                }
            });
            if dists.len() >= k_need {
                let (_, kth, _) = dists.select_nth_unstable_by(k_need - 1, f64::total_cmp);
                if *kth <= self.grid.covered_radius(ring) {
                    break;
                }
            }
        }

        if dists.len() < k_need {
            return tally;
        }
        dists.select_nth_unstable_by(k_need - 1, f64::total_cmp);
        dists[..k_need].sort_unstable_by(f64::total_cmp);

        for (slot, (&k, s)) in tally
            .iter_mut()
            .zip(self.params.targets.iter().zip(&self.state))
        {
            if !s.frozen && k <= k_need {
                *slot = Some(dists[k - 1]);
            }
        }
        tally
    }

    fn absorb(&mut self, tally: Self::Tally) {
        let cap = self.params.max_observations.unwrap_or(u64::MAX);
        for (s, radius) in self.state.iter_mut().zip(tally) {
            let Some(r) = radius else { continue };
            if s.frozen {
                continue;
            }
            s.references += 1;
            if r > 0.0 {
                s.sum_ln += r.ln();
                s.observations += 1;
            } else {
                s.zero_hits += 1;
            }
            if s.observations >= cap {
                s.frozen = true;
            }
        }
    }

    fn is_saturated(&self) -> bool {
        self.state.iter().all(|s| s.frozen)
    }

    fn is_degenerate(&self) -> bool {
        self.degenerate
    }

    fn point_count(&self) -> usize {
        self.points.len()
    }

    fn rows(&self) -> Vec<ScaleRow> {
        self.params
            .targets
            .iter()
            .zip(&self.state)
            .map(|(&k, s)| {
                let scale = if s.observations > 0 {
                    (s.sum_ln / s.observations as f64).exp()
                } else {
                    0.0
                };
                let degenerate = self.degenerate || (s.observations == 0 && s.zero_hits > 0);
                ScaleRow {
                    scale,
                    statistic: self.mass(k),
                    count: s.observations,
                    norm: s.references,
                    references: s.references,
                    frozen: s.frozen,
                    degenerate,
                    low_confidence: s.frozen && !degenerate,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn params(targets: Vec<usize>, theiler: usize, cap: Option<u64>) -> FixedMassParams {
        FixedMassParams {
            targets,
            metric: Metric::Maximum,
            theiler,
            max_observations: cap,
            grid: GridLimits::default(),
        }
    }

    fn run_all(acc: &mut FixedMassAccumulator) {
        let mut scratch = acc.scratch();
        for i in acc.work_units(ReferenceSelection::All, 0) {
            let tally = acc.probe(i, &mut scratch);
            acc.absorb(tally);
        }
    }

    #[test]
    fn mass_targets_are_distinct_and_pinned() {
        let t = mass_targets(1, 100, 5).unwrap();
        assert_eq!(t.first(), Some(&1));
        assert_eq!(t.last(), Some(&100));
        assert!(t.windows(2).all(|w| w[0] < w[1]));

        assert_eq!(mass_targets(1, 3, 10).unwrap(), vec![1, 2, 3]);
        assert!(mass_targets(0, 3, 2).is_err());
        assert!(mass_targets(4, 3, 2).is_err());
    }

    #[test]
    fn evenly_spaced_line_has_unit_spacing_radii() {
        let points = PointSet::from_flat((0..50).map(|i| i as f64).collect(), 1);
        let mut acc = FixedMassAccumulator::new(points, params(vec![1, 2, 4], 0, None)).unwrap();
        run_all(&mut acc);

        let rows = acc.rows();
        // Nearest neighbor is always 1 away.
        assert_relative_eq!(rows[0].scale, 1.0, epsilon = 1e-12);
        // Second neighbor is 1 away inside the line and 2 at both ends.
        assert!(rows[1].scale > 1.0 && rows[1].scale < 1.1);
        assert_eq!(rows[0].count, 50);
        assert_relative_eq!(rows[0].statistic, 1.0 / 49.0);
    }

    #[test]
    fn theiler_window_pushes_neighbors_out() {
        let points = PointSet::from_flat((0..30).map(|i| i as f64).collect(), 1);
        let mut acc = FixedMassAccumulator::new(points, params(vec![1], 3, None)).unwrap();
        run_all(&mut acc);
        assert_relative_eq!(acc.rows()[0].scale, 3.0, epsilon = 1e-12);
    }

    #[test]
    fn observation_cap_freezes_targets() {
        let points = PointSet::from_flat((0..30).map(|i| (i as f64 * 0.37).sin()).collect(), 1);
        let mut acc = FixedMassAccumulator::new(points, params(vec![1, 3], 0, Some(5))).unwrap();
        run_all(&mut acc);
        assert!(acc.is_saturated());
        assert!(acc.rows().iter().all(|r| r.count == 5 && r.low_confidence));
    }

    #[test]
    fn coincident_points_are_degenerate() {
        let points = PointSet::from_flat(vec![0.5; 10], 1);
        let acc = FixedMassAccumulator::new(points, params(vec![1, 2], 0, None)).unwrap();
        assert!(acc.is_degenerate());
        assert!(acc.is_saturated());
        assert!(acc.rows().iter().all(|r| r.degenerate && r.count == 0));
    }
}
