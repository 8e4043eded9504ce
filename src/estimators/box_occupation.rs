//! Order-Q Renyi entropies from box occupations.
//!
//! ## Purpose
//!
//! The embedded space is partitioned into boxes of side `r_b` over all `m`
//! coordinates. With `p_i` the fraction of points in box `i`, the order-Q
//! Renyi entropy is
//!
//! ```text
//! H_Q(r) = ln(Σ p_i^Q) / (1 - Q)        Q != 1
//! H_1(r) = -Σ p_i ln p_i                (Shannon)
//! H_0(r) = ln(#occupied boxes)          (box counting)
//! ```
//!
//! and `-dH_Q / d ln r` estimates the generalized dimension `D_Q`.
//!
//! ## Design notes
//!
//! * **Units are scales**: one work unit partitions the point set at one
//!   scale, so scales are processed in parallel and absorbed in ladder
//!   order.
//! * **Sparse boxes**: only occupied boxes are materialized, keyed by their
//!   full integer cell coordinates and anchored at the per-axis minimum.

use std::collections::HashMap;

use crate::algorithms::embedding::PointSet;
use crate::algorithms::grid::cell_index;
use crate::algorithms::selection::ReferenceSelection;
use crate::estimators::{ScaleAccumulator, ScaleRow};
use crate::primitives::ladder::ScaleLadder;

/// Settings shared by every dimension of a Renyi scan.
#[derive(Debug, Clone)]
pub struct BoxOccupationParams {
    /// Box sides.
    pub ladder: ScaleLadder,

    /// Renyi order `Q` (finite, non-negative).
    pub order: f64,
}

/// Occupation summary of one scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxTally {
    /// Scale index.
    pub scale: usize,

    /// Number of occupied boxes.
    pub boxes: u64,

    /// Renyi entropy of the occupation distribution.
    pub entropy: f64,
}

/// Renyi entropy of an occupation histogram over `total` points.
pub fn renyi_entropy(occupations: impl Iterator<Item = u32>, total: usize, order: f64) -> f64 {
    let n = total as f64;
    let probs = occupations.map(|c| c as f64 / n);
    if order == 1.0 {
        -probs.map(|p| p * p.ln()).sum::<f64>()
    } else if order == 0.0 {
        (probs.count() as f64).ln()
    } else {
        probs.map(|p| p.powf(order)).sum::<f64>().ln() / (1.0 - order)
    }
}

/// Box-occupation accumulator for one embedding dimension.
#[derive(Debug)]
pub struct BoxOccupation {
    points: PointSet,
    origin: Vec<f64>,
    params: BoxOccupationParams,
    degenerate: bool,
    done: Vec<Option<BoxTally>>,
}

impl BoxOccupation {
    /// Wrap `points`; boxes are anchored at the per-axis minimum.
    pub fn new(points: PointSet, params: BoxOccupationParams) -> Self {
        let (origin, _) = points.bounds(points.dim());
        let degenerate = points.extent() <= 0.0;
        let done = vec![None; params.ladder.len()];
        Self {
            points,
            origin,
            params,
            degenerate,
            done,
        }
    }
}

impl ScaleAccumulator for BoxOccupation {
    type Tally = BoxTally;
    type Scratch = HashMap<Vec<i64>, u32>;

    /// Every scale, in ladder order. Reference selection does not apply.
    fn work_units(&self, _selection: ReferenceSelection, _seed: u64) -> Vec<usize> {
        (0..self.params.ladder.len()).collect()
    }

    fn scratch(&self) -> Self::Scratch {
        HashMap::new()
    }

    fn probe(&self, b: usize, boxes: &mut Self::Scratch) -> BoxTally {
        let side = self.params.ladder.as_slice()[b];
        boxes.clear();
        for i in 0..self.points.len() {
            let key: Vec<i64> = self
                .points
                .point(i)
                .iter()
                .zip(&self.origin)
                .map(|(&x, &o)| cell_index(x, o, side))
                .collect();
            *boxes.entry(key).or_insert(0) += 1;
        }

        BoxTally {
            scale: b,
            boxes: boxes.len() as u64,
            entropy: renyi_entropy(
                boxes.values().copied(),
                self.points.len(),
                self.params.order,
            ),
        }
    }

    fn absorb(&mut self, tally: BoxTally) {
        if let Some(slot) = self.done.get_mut(tally.scale) {
            *slot = Some(tally);
        }
    }

    fn is_saturated(&self) -> bool {
        self.done.iter().all(Option::is_some)
    }

    fn is_degenerate(&self) -> bool {
        self.degenerate
    }

    fn point_count(&self) -> usize {
        self.points.len()
    }

    fn rows(&self) -> Vec<ScaleRow> {
        let n = self.points.len() as u64;
        self.params
            .ladder
            .as_slice()
            .iter()
            .zip(&self.done)
            .map(|(&scale, tally)| {
                let (statistic, count, references) = match tally {
                    Some(t) => (t.entropy, t.boxes, n),
                    None => (0.0, 0, 0),
                };
                ScaleRow {
                    scale,
                    statistic,
                    count,
                    norm: n,
                    references,
                    frozen: false,
                    degenerate: self.degenerate,
                    low_confidence: false,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn run(points: PointSet, scales: Vec<f64>, order: f64) -> Vec<ScaleRow> {
        let mut acc = BoxOccupation::new(
            points,
            BoxOccupationParams {
                ladder: ScaleLadder::from_scales(scales).unwrap(),
                order,
            },
        );
        let mut scratch = acc.scratch();
        for b in acc.work_units(ReferenceSelection::All, 0) {
            let tally = acc.probe(b, &mut scratch);
            acc.absorb(tally);
        }
        assert!(acc.is_saturated());
        acc.rows()
    }

    #[test]
    fn two_equal_boxes_give_ln_two_for_every_order() {
        let pts = || PointSet::from_flat(vec![0.1, 0.3, 0.6, 0.8], 1);
        for &q in &[0.0, 1.0, 2.0, 0.5] {
            let rows = run(pts(), vec![0.5], q);
            assert_eq!(rows[0].count, 2);
            assert_relative_eq!(rows[0].statistic, 2f64.ln(), epsilon = 1e-12);
        }
    }

    #[test]
    fn unequal_boxes_order_entropies() {
        // Occupations 3 and 1: H_0 > H_1 > H_2.
        let pts = || PointSet::from_flat(vec![0.0, 0.1, 0.2, 0.9], 1);
        let h0 = run(pts(), vec![0.5], 0.0)[0].statistic;
        let h1 = run(pts(), vec![0.5], 1.0)[0].statistic;
        let h2 = run(pts(), vec![0.5], 2.0)[0].statistic;
        assert!(h0 > h1 && h1 > h2);
        assert_relative_eq!(h2, -(0.75f64.powi(2) + 0.25f64.powi(2)).ln(), epsilon = 1e-12);
    }

    #[test]
    fn single_box_has_zero_entropy() {
        let rows = run(PointSet::from_flat(vec![0.2, 0.4], 1), vec![10.0], 2.0);
        assert_eq!(rows[0].count, 1);
        assert_relative_eq!(rows[0].statistic, 0.0);
    }
}
