//! Distance metrics for embedded points.
//!
//! ## Purpose
//!
//! Neighbor counting compares a pair distance against a ladder of radii.
//! Most candidate pairs returned by the grid are farther apart than the
//! largest scale, so [`Metric::distance_within`] abandons a pair as soon as
//! the partial sum proves it lies outside the cutoff.
//!
//! ## Key concepts
//!
//! * **Euclidean**: `sqrt(sum (a_i - b_i)^2)`. Partial sums are compared in
//!   squared form; the root is taken only for pairs that survive.
//! * **Maximum**: `max |a_i - b_i|`, the norm used by box-counting.
//!
//! Both norms satisfy `|a_i - b_i| <= d(a, b)` for every coordinate, which is
//! what lets the box grid index a subset of coordinates without false
//! negatives.
//!
//! ## Invariants
//!
//! * All arithmetic is `f64`.
//! * Distances are exact: no epsilon tolerance is applied.

use serde::{Deserialize, Serialize};

/// Norm used to measure distances between embedded points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    /// Euclidean (L2) norm.
    #[default]
    Euclidean,

    /// Maximum (L-infinity) norm.
    Maximum,
}

impl Metric {
    /// Full distance between two points of equal length.
    #[inline]
    pub fn distance(self, a: &[f64], b: &[f64]) -> f64 {
        debug_assert_eq!(a.len(), b.len());
        match self {
            Self::Euclidean => a
                .iter()
                .zip(b)
                .map(|(x, y)| (x - y) * (x - y))
                .sum::<f64>()
                .sqrt(),
            Self::Maximum => a
                .iter()
                .zip(b)
                .fold(0.0, |acc, (x, y)| f64::max(acc, (x - y).abs())),
        }
    }

    /// Distance if it is `<= cutoff`, otherwise `None`.
    #[inline]
    pub fn distance_within(self, a: &[f64], b: &[f64], cutoff: f64) -> Option<f64> {
        debug_assert_eq!(a.len(), b.len());
        match self {
            Self::Euclidean => {
                let limit = cutoff * cutoff;
                let mut acc = 0.0;
                for (x, y) in a.iter().zip(b) {
                    let d = x - y;
                    acc += d * d;
                    if acc > limit {
                        return None;
                    }
                }
                Some(acc.sqrt())
            }
            Self::Maximum => {
                let mut acc: f64 = 0.0;
                for (x, y) in a.iter().zip(b) {
                    acc = acc.max((x - y).abs());
                    if acc > cutoff {
                        return None;
                    }
                }
                Some(acc)
            }
        }
    }

    /// Lowercase name used in configuration files and table headers.
    pub fn name(self) -> &'static str {
        match self {
            Self::Euclidean => "euclidean",
            Self::Maximum => "maximum",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn euclidean_and_maximum_norms() {
        let a = [0.0, 0.0];
        let b = [3.0, 4.0];
        assert_relative_eq!(Metric::Euclidean.distance(&a, &b), 5.0);
        assert_relative_eq!(Metric::Maximum.distance(&a, &b), 4.0);
    }

    #[test]
    fn cutoff_is_inclusive() {
        let a = [0.0, 0.0];
        let b = [3.0, 4.0];
        assert_eq!(Metric::Euclidean.distance_within(&a, &b, 5.0), Some(5.0));
        assert_eq!(Metric::Euclidean.distance_within(&a, &b, 4.999), None);
        assert_eq!(Metric::Maximum.distance_within(&a, &b, 4.0), Some(4.0));
        assert_eq!(Metric::Maximum.distance_within(&a, &b, 3.5), None);
    }
}
