//! Box-assisted neighbor search.
//!
//! ## Purpose
//!
//! This module provides [`BoxGrid`], a uniform grid over embedded points that
//! turns "all points within `r_max` of point `p`" into a scan of `p`'s cell
//! and its immediate neighbors instead of an all-pairs comparison.
//!
//! ## Design notes
//!
//! * **Projected grid**: only the first `g = min(m, MAX_GRID_AXES)`
//!   coordinates are gridded. A full `m`-dimensional grid would need `3^m`
//!   neighbor cells per query; since `|a_i - b_i| <= d(a, b)` under both
//!   supported norms, gridding a subset of axes can only add candidates,
//!   never lose one.
//! * **Sparse storage**: only occupied cells are stored. Points are grouped
//!   by cell into one index array (each cell owns a contiguous run), so
//!   memory is `O(N' + occupied cells)` regardless of the cell side.
//! * **Deterministic layout**: within a cell points are kept in ascending
//!   index order, and cells are visited in a fixed offset order.
//!
//! ## Key concepts
//!
//! ### Cell side
//!
//! The side equals the largest length scale. Any point within that radius
//! of `p` then lies in one of the `3^g` cells around `p`'s cell.
//!
//! ### Rings
//!
//! Ring `R` is the set of cells at Chebyshev cell-distance exactly `R`. After
//! scanning rings `0..=R`, every point within `R * side` of `p` has been
//! seen, which is the stopping rule used by the fixed-mass search.
//!
//! ### Capacity
//!
//! Building fails with [`ScalingError::IndexCapacity`] if the occupied cell
//! count exceeds the configured budget. [`BoxGrid::build_coarsening`]
//! recovers by doubling the side up to a retry limit.
//!
//! ## Invariants
//!
//! * Candidate sets are supersets of the true neighbor sets (no false
//!   negatives).
//! * The grid is immutable once built; a new dimension gets a new grid.

use std::collections::HashMap;

use tracing::warn;

use crate::algorithms::embedding::PointSet;
use crate::primitives::errors::ScalingError;

/// Maximum number of coordinates used for cell assignment.
pub const MAX_GRID_AXES: usize = 3;

/// Default budget of occupied cells.
pub const DEFAULT_CELL_BUDGET: usize = 1 << 22;

/// Default number of coarsening attempts after a capacity failure.
pub const DEFAULT_COARSEN_RETRIES: usize = 8;

/// Memory limits applied when building a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridLimits {
    /// Maximum number of occupied cells.
    pub cell_budget: usize,

    /// Number of side doublings tried before giving up.
    pub coarsen_retries: usize,
}

impl Default for GridLimits {
    fn default() -> Self {
        Self {
            cell_budget: DEFAULT_CELL_BUDGET,
            coarsen_retries: DEFAULT_COARSEN_RETRIES,
        }
    }
}

type CellKey = [i64; MAX_GRID_AXES];

#[derive(Debug, Clone, Copy, Default)]
struct CellRange {
    start: usize,
    len: usize,
}

// ============================================================================
// Box Grid
// ============================================================================

/// Sparse uniform grid over the leading coordinates of a point set.
#[derive(Debug, Clone)]
pub struct BoxGrid {
    side: f64,
    axes: usize,
    max_key: CellKey,
    cells: HashMap<CellKey, CellRange>,
    order: Vec<usize>,
    point_keys: Vec<CellKey>,
    neighbor_offsets: Vec<CellKey>,
}

impl BoxGrid {
    /// Index `points` into cells of side `side`.
    pub fn build(points: &PointSet, side: f64, budget: usize) -> Result<Self, ScalingError> {
        if !side.is_finite() || side <= 0.0 {
            return Err(ScalingError::config("grid_side", side, "must be finite and > 0"));
        }

        let axes = points.dim().min(MAX_GRID_AXES);
        let (lo, _) = points.bounds(axes);
        let mut origin = [0.0; MAX_GRID_AXES];
        origin[..axes].copy_from_slice(&lo);

        let n = points.len();
        let mut max_key: CellKey = [0; MAX_GRID_AXES];
        let point_keys: Vec<CellKey> = (0..n)
            .map(|i| {
                let key = key_for(points.point(i), &origin, axes, side);
                for a in 0..axes {
                    max_key[a] = max_key[a].max(key[a]);
                }
                key
            })
            .collect();

        let mut cells: HashMap<CellKey, CellRange> = HashMap::new();
        for key in &point_keys {
            cells.entry(*key).or_default().len += 1;
        }
        if cells.len() > budget {
            return Err(ScalingError::IndexCapacity {
                cells: cells.len(),
                budget,
            });
        }

        // Counting sort: assign each cell a contiguous run, then fill it.
        let mut next = 0;
        for range in cells.values_mut() {
            range.start = next;
            next += range.len;
            range.len = 0;
        }
        let mut order = vec![0usize; n];
        for (i, key) in point_keys.iter().enumerate() {
            if let Some(range) = cells.get_mut(key) {
                order[range.start + range.len] = i;
                range.len += 1;
            }
        }

        Ok(Self {
            side,
            axes,
            max_key,
            cells,
            order,
            point_keys,
            neighbor_offsets: ring_offsets(axes, 0)
                .into_iter()
                .chain(ring_offsets(axes, 1))
                .collect(),
        })
    }

    /// Build, doubling the side after each capacity failure.
    pub fn build_coarsening(
        points: &PointSet,
        side: f64,
        limits: GridLimits,
    ) -> Result<Self, ScalingError> {
        let GridLimits {
            cell_budget: budget,
            coarsen_retries: retries,
        } = limits;
        let mut side = side;
        let mut attempt = 0;
        loop {
            match Self::build(points, side, budget) {
                Err(ScalingError::IndexCapacity { cells, budget }) if attempt < retries => {
                    warn!(
                        cells,
                        budget,
                        side,
                        "box grid over budget, coarsening cell side"
                    );
                    side *= 2.0;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    /// Cell side length.
    #[inline]
    pub fn side(&self) -> f64 {
        self.side
    }

    /// Number of gridded coordinates `g`.
    #[inline]
    pub fn axes(&self) -> usize {
        self.axes
    }

    /// Number of occupied cells.
    #[inline]
    pub fn occupied_cells(&self) -> usize {
        self.cells.len()
    }

    /// Points stored in the cell at `key`, in ascending index order.
    #[inline]
    fn cell(&self, key: &CellKey) -> &[usize] {
        match self.cells.get(key) {
            Some(r) => &self.order[r.start..r.start + r.len],
            None => &[],
        }
    }

    /// Visit every point in the `3^g` cells around point `i` (including `i`).
    pub fn for_each_candidate<F: FnMut(usize)>(&self, i: usize, mut f: F) {
        let home = self.point_keys[i];
        for off in &self.neighbor_offsets {
            let key = shifted(&home, off);
            for &j in self.cell(&key) {
                f(j);
            }
        }
    }

    /// Visit every point in the cells at Chebyshev cell-distance `ring` from
    /// point `i`'s cell.
    pub fn for_each_in_ring<F: FnMut(usize)>(&self, i: usize, ring: usize, mut f: F) {
        let home = self.point_keys[i];
        for off in ring_offsets(self.axes, ring) {
            let key = shifted(&home, &off);
            for &j in self.cell(&key) {
                f(j);
            }
        }
    }

    /// Smallest ring beyond which no cell of the grid exists, seen from `i`.
    pub fn max_ring(&self, i: usize) -> usize {
        let home = self.point_keys[i];
        (0..self.axes)
            .map(|a| home[a].max(self.max_key[a] - home[a]))
            .max()
            .unwrap_or(0) as usize
    }

    /// Distance covered after scanning rings `0..=ring`.
    #[inline]
    pub fn covered_radius(&self, ring: usize) -> f64 {
        ring as f64 * self.side
    }
}

// ============================================================================
// Cell Arithmetic
// ============================================================================

/// Cell index of a single coordinate.
#[inline]
pub fn cell_index(value: f64, origin: f64, side: f64) -> i64 {
    ((value - origin) / side).floor() as i64
}

#[inline]
fn key_for(p: &[f64], origin: &[f64; MAX_GRID_AXES], axes: usize, side: f64) -> CellKey {
    let mut key = [0i64; MAX_GRID_AXES];
    for a in 0..axes {
        key[a] = cell_index(p[a], origin[a], side);
    }
    key
}

#[inline]
fn shifted(home: &CellKey, off: &CellKey) -> CellKey {
    let mut key = *home;
    for a in 0..MAX_GRID_AXES {
        key[a] += off[a];
    }
    key
}

/// Offsets with Chebyshev norm exactly `ring` over the first `axes` axes.
///
/// Interior offsets are never generated, so the cost is proportional to the
/// ring's surface rather than its volume.
fn ring_offsets(axes: usize, ring: usize) -> Vec<CellKey> {
    let r = ring as i64;
    let mut out = Vec::new();
    if axes == 0 {
        if ring == 0 {
            out.push([0; MAX_GRID_AXES]);
        }
        return out;
    }
    let mut current = [0i64; MAX_GRID_AXES];
    fill_ring(0, axes, r, false, &mut current, &mut out);
    out
}

fn fill_ring(
    axis: usize,
    axes: usize,
    r: i64,
    on_boundary: bool,
    current: &mut CellKey,
    out: &mut Vec<CellKey>,
) {
    if axis + 1 == axes {
        if on_boundary {
            for v in -r..=r {
                current[axis] = v;
                out.push(*current);
            }
        } else {
            current[axis] = -r;
            out.push(*current);
            if r != 0 {
                current[axis] = r;
                out.push(*current);
            }
        }
        current[axis] = 0;
        return;
    }
    for v in -r..=r {
        current[axis] = v;
        fill_ring(axis + 1, axes, r, on_boundary || v.abs() == r, current, out);
    }
    current[axis] = 0;
}
