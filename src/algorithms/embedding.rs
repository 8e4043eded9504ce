//! Delay and mixed embeddings.
//!
//! ## Purpose
//!
//! This module reconstructs phase-space points from a (possibly
//! multivariate) sample. An [`EmbeddingSpec`] selects `c` columns and `k`
//! delayed copies spaced `d` samples apart; the resulting [`PointSet`] holds
//! `N' = N - (k-1)d` points of dimension `m = c * k`.
//!
//! ## Key concepts
//!
//! ### Coordinate order
//!
//! Point `i` concatenates, lag-major, the selected columns at times
//! `i, i + d, ..., i + (k-1)d`. For the scalar series `[1, 2, 3, 4, 5]` with
//! `d = 1`, `m = 2` this gives `(1,2), (2,3), (3,4), (4,5)`. Point indices
//! are therefore consecutive in time, which is what the Theiler window is
//! measured on.
//!
//! ### Column filling
//!
//! When fewer than `c` columns are selected, the selection is completed
//! upward from its largest entry: `[2]` with `c = 3` becomes `[2, 3, 4]`.
//!
//! ### Mixed embedding schedule
//!
//! [`EmbeddingSchedule`] enumerates configurations so that `m` never
//! decreases: first `c = 1..=C` with `k = 1`, then `k = 2, 3, ...` with
//! `c = C`. Scalar input is the special case `C = 1`.
//!
//! ## Invariants
//!
//! * `PointSet::len() >= 1` for every successful embedding.
//! * Embedding is a pure transform; the sample is never modified.

use crate::primitives::errors::ScalingError;
use crate::primitives::sample::Sample;

// ============================================================================
// Embedding Spec
// ============================================================================

/// One embedding configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddingSpec {
    /// Number of signal components `c` taken at each lag.
    pub components: usize,

    /// Number of delayed copies `k`.
    pub lags: usize,

    /// Delay `d` between copies, in samples.
    pub delay: usize,

    /// Selected columns (completed upward to `components` entries).
    pub columns: Vec<usize>,
}

impl EmbeddingSpec {
    /// Scalar delay embedding of a single column.
    pub fn scalar(column: usize, dimension: usize, delay: usize) -> Self {
        Self {
            components: 1,
            lags: dimension,
            delay,
            columns: vec![column],
        }
    }

    /// Total embedding dimension `m = c * k`.
    #[inline]
    pub fn dimension(&self) -> usize {
        self.components * self.lags
    }

    /// Number of samples consumed by the delays, `(k-1) * d`.
    #[inline]
    pub fn span(&self) -> usize {
        self.lags.saturating_sub(1) * self.delay
    }

    /// Column list of exactly `components` entries.
    pub fn resolved_columns(&self) -> Vec<usize> {
        resolve_columns(&self.columns, self.components)
    }
}

/// Complete a column selection upward from its largest entry.
pub fn resolve_columns(selection: &[usize], components: usize) -> Vec<usize> {
    let mut cols: Vec<usize> = selection.iter().copied().take(components).collect();
    let mut next = match cols.iter().max() {
        Some(&max) => max + 1,
        None => 0,
    };
    while cols.len() < components {
        cols.push(next);
        next += 1;
    }
    cols
}

// ============================================================================
// Point Set
// ============================================================================

/// All valid embedded points of one configuration, stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct PointSet {
    coords: Vec<f64>,
    dim: usize,
}

impl PointSet {
    /// Wrap row-major coordinates of dimension `dim`.
    pub fn from_flat(coords: Vec<f64>, dim: usize) -> Self {
        debug_assert!(dim > 0 && coords.len() % dim == 0);
        Self { coords, dim }
    }

    /// Number of points `N'`.
    #[inline]
    pub fn len(&self) -> usize {
        self.coords.len() / self.dim
    }

    /// Returns `true` if no point is stored.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    /// Embedding dimension `m`.
    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Coordinates of point `i`.
    #[inline]
    pub fn point(&self, i: usize) -> &[f64] {
        &self.coords[i * self.dim..(i + 1) * self.dim]
    }

    /// Per-axis minimum and maximum over the first `axes` coordinates.
    pub fn bounds(&self, axes: usize) -> (Vec<f64>, Vec<f64>) {
        let axes = axes.min(self.dim);
        let mut lo = vec![f64::INFINITY; axes];
        let mut hi = vec![f64::NEG_INFINITY; axes];
        for i in 0..self.len() {
            for (a, &v) in self.point(i)[..axes].iter().enumerate() {
                lo[a] = lo[a].min(v);
                hi[a] = hi[a].max(v);
            }
        }
        (lo, hi)
    }

    /// Largest per-axis range over all coordinates.
    pub fn extent(&self) -> f64 {
        let (lo, hi) = self.bounds(self.dim);
        lo.iter()
            .zip(&hi)
            .map(|(l, h)| h - l)
            .fold(0.0, f64::max)
    }
}

// ============================================================================
// Embedder
// ============================================================================

/// Build the point set for `spec` from `sample`.
pub fn embed(sample: &Sample<f64>, spec: &EmbeddingSpec) -> Result<PointSet, ScalingError> {
    let m = spec.dimension();
    if m == 0 {
        return Err(ScalingError::InvalidEmbedding {
            dimension: m,
            reason: "components and lags must both be at least 1".into(),
        });
    }

    let columns = spec.resolved_columns();
    if let Some(&bad) = columns.iter().find(|&&c| c >= sample.width()) {
        return Err(ScalingError::InvalidEmbedding {
            dimension: m,
            reason: format!(
                "column {} out of range for a sample of width {}",
                bad,
                sample.width()
            ),
        });
    }

    let n = sample.len();
    let span = spec.span();
    if span >= n {
        return Err(ScalingError::InvalidEmbedding {
            dimension: m,
            reason: format!(
                "(k-1)*d = {} leaves no valid point in a series of length {}",
                span, n
            ),
        });
    }

    let count = n - span;
    let mut coords = Vec::with_capacity(count * m);
    for i in 0..count {
        for lag in 0..spec.lags {
            let t = i + lag * spec.delay;
            for &c in &columns {
                coords.push(sample.value(t, c));
            }
        }
    }

    Ok(PointSet::from_flat(coords, m))
}

// ============================================================================
// Embedding Schedule
// ============================================================================

/// Ordered list of embedding configurations with non-decreasing `m`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddingSchedule {
    specs: Vec<EmbeddingSpec>,
}

impl EmbeddingSchedule {
    /// Enumerate configurations with `min_dim <= m <= max_dim`.
    ///
    /// Components grow first (`k = 1`), then lags grow with all
    /// `max_components` components selected.
    pub fn new(
        max_components: usize,
        min_dim: usize,
        max_dim: usize,
        delay: usize,
        columns: &[usize],
    ) -> Self {
        let mut specs = Vec::new();
        let push = |specs: &mut Vec<EmbeddingSpec>, c: usize, k: usize| {
            let m = c * k;
            if m >= min_dim && m <= max_dim {
                specs.push(EmbeddingSpec {
                    components: c,
                    lags: k,
                    delay,
                    columns: resolve_columns(columns, c),
                });
            }
        };

        if max_components == 0 {
            return Self { specs };
        }

        for c in 1..=max_components {
            push(&mut specs, c, 1);
        }
        let mut k = 2;
        while max_components * k <= max_dim {
            push(&mut specs, max_components, k);
            k += 1;
        }

        Self { specs }
    }

    /// The configurations in scan order.
    pub fn specs(&self) -> &[EmbeddingSpec] {
        &self.specs
    }

    /// Number of configurations.
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    /// Returns `true` if no dimension falls in the requested range.
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}
