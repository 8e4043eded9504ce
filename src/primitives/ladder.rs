//! Length-scale ladders.
//!
//! ## Purpose
//!
//! A [`ScaleLadder`] is the ordered set of radii `r_1 < r_2 < ... < r_B` at
//! which every estimator reports its statistic. Ladders are either
//! logarithmically spaced between a minimum and maximum radius or supplied
//! explicitly.
//!
//! ## Invariants
//!
//! * At least one scale.
//! * Every scale is finite and strictly positive.
//! * Strictly increasing (no duplicates).

use crate::primitives::errors::ScalingError;

/// Strictly increasing list of positive radii.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleLadder {
    scales: Vec<f64>,
}

impl ScaleLadder {
    /// Logarithmically spaced ladder of `count` radii in `[min, max]`.
    ///
    /// A single-scale ladder is allowed only when `min == max`.
    pub fn log_spaced(min: f64, max: f64, count: usize) -> Result<Self, ScalingError> {
        if !min.is_finite() || min <= 0.0 {
            return Err(ScalingError::config("min_scale", min, "must be finite and > 0"));
        }
        if !max.is_finite() || max < min {
            return Err(ScalingError::config(
                "max_scale",
                max,
                format!("must be finite and >= min_scale ({})", min),
            ));
        }
        if count == 0 {
            return Err(ScalingError::config("scale_count", count, "must be at least 1"));
        }
        if count == 1 || min == max {
            if min != max {
                return Err(ScalingError::config(
                    "scale_count",
                    count,
                    "must be at least 2 when min_scale < max_scale",
                ));
            }
            return Ok(Self { scales: vec![max] });
        }

        let ratio = (max / min).ln() / (count - 1) as f64;
        let mut scales: Vec<f64> = (0..count)
            .map(|i| min * (ratio * i as f64).exp())
            .collect();
        // Pin the end points so they match the request exactly.
        scales[0] = min;
        scales[count - 1] = max;

        Self::from_scales(scales)
    }

    /// Validate a user-supplied ladder.
    pub fn from_scales(scales: Vec<f64>) -> Result<Self, ScalingError> {
        if scales.is_empty() {
            return Err(ScalingError::config("scales", "[]", "at least one scale is required"));
        }
        for (i, &r) in scales.iter().enumerate() {
            if !r.is_finite() || r <= 0.0 {
                return Err(ScalingError::config(
                    "scales",
                    format!("[{}] = {}", i, r),
                    "every scale must be finite and > 0",
                ));
            }
        }
        if let Some(i) = scales.windows(2).position(|w| w[1] <= w[0]) {
            return Err(ScalingError::config(
                "scales",
                format!("[{}] = {}, [{}] = {}", i, scales[i], i + 1, scales[i + 1]),
                "scales must be strictly increasing",
            ));
        }
        Ok(Self { scales })
    }

    /// Number of scales `B`.
    #[inline]
    pub fn len(&self) -> usize {
        self.scales.len()
    }

    /// Always `false`; a ladder holds at least one scale.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.scales.is_empty()
    }

    /// The radii in increasing order.
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.scales
    }

    /// Smallest radius `r_1`.
    #[inline]
    pub fn smallest(&self) -> f64 {
        self.scales[0]
    }

    /// Largest radius `r_B`.
    #[inline]
    pub fn largest(&self) -> f64 {
        self.scales[self.scales.len() - 1]
    }

    /// Index of the first scale with `r_b >= distance` (ties count as inside).
    ///
    /// Returns `len()` when the distance exceeds every scale.
    #[inline]
    pub fn first_containing(&self, distance: f64) -> usize {
        self.scales.partition_point(|&r| r < distance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn log_spacing_is_geometric() {
        let ladder = ScaleLadder::log_spaced(0.01, 1.0, 3).unwrap();
        assert_eq!(ladder.len(), 3);
        assert_relative_eq!(ladder.as_slice()[1], 0.1, max_relative = 1e-12);
        assert_eq!(ladder.smallest(), 0.01);
        assert_eq!(ladder.largest(), 1.0);
    }

    #[test]
    fn duplicates_and_decreasing_scales_are_rejected() {
        let err = ScaleLadder::from_scales(vec![0.1, 0.2, 0.2]).unwrap_err();
        assert!(err.to_string().contains("strictly increasing"));
        assert!(ScaleLadder::from_scales(vec![0.3, 0.1]).is_err());
        assert!(ScaleLadder::from_scales(vec![-1.0]).is_err());
        assert!(ScaleLadder::log_spaced(1.0, 0.5, 4).is_err());
    }

    #[test]
    fn single_scale_needs_equal_bounds() {
        assert!(ScaleLadder::log_spaced(0.1, 0.5, 1).is_err());
        assert!(ScaleLadder::log_spaced(0.0, 0.5, 4).is_err());
        assert_eq!(ScaleLadder::log_spaced(0.5, 0.5, 1).unwrap().len(), 1);
    }

    #[test]
    fn ties_are_inside() {
        let ladder = ScaleLadder::from_scales(vec![1.0, 2.0, 3.0]).unwrap();
        assert_eq!(ladder.first_containing(0.5), 0);
        assert_eq!(ladder.first_containing(2.0), 1);
        assert_eq!(ladder.first_containing(2.5), 2);
        assert_eq!(ladder.first_containing(3.5), 3);
    }
}
