//! Slopes of scaling curves.
//!
//! ## Purpose
//!
//! Dimensions are read off scaling curves as slopes in log-log coordinates:
//! `D2 ≈ d ln C(r) / d ln r` for the correlation sum. This module provides
//! the two forms used downstream:
//!
//! * [`local_slopes`]: central differences at every scale, one-sided at the
//!   ends of the ladder.
//! * [`least_squares_slope`]: one ordinary least-squares slope over a
//!   scale range.
//! * [`takens_estimator`]: the maximum-likelihood dimension
//!   `C(r) / ∫_0^r C(s)/s ds` of a correlation sum.
//! * [`smooth`]: a moving average over neighboring scales.
//!
//! Points whose coordinates are not finite (e.g. `ln 0` for an empty scale)
//! are skipped rather than propagated.

/// Derivative `dy/dx` at every point by finite differences.
///
/// Returns `None` wherever a neighbor needed for the difference is not
/// finite.
pub fn finite_differences(x: &[f64], y: &[f64]) -> Vec<Option<f64>> {
    let n = x.len().min(y.len());
    let ok = |i: usize| x[i].is_finite() && y[i].is_finite();

    (0..n)
        .map(|i| {
            let (a, b) = match (i.checked_sub(1), i + 1 < n) {
                (Some(p), true) if ok(p) && ok(i + 1) => (p, i + 1),
                (Some(p), _) if ok(p) && ok(i) => (p, i),
                (_, true) if ok(i) && ok(i + 1) => (i, i + 1),
                _ => return None,
            };
            let dx = x[b] - x[a];
            if dx == 0.0 {
                None
            } else {
                Some((y[b] - y[a]) / dx)
            }
        })
        .collect()
}

/// Local slopes `d ln v / d ln r` of a positive scaling curve.
pub fn local_slopes(scales: &[f64], values: &[f64]) -> Vec<Option<f64>> {
    let lx: Vec<f64> = scales.iter().map(|r| r.ln()).collect();
    let ly: Vec<f64> = values
        .iter()
        .map(|&v| if v > 0.0 { v.ln() } else { f64::NAN })
        .collect();
    finite_differences(&lx, &ly)
}

/// Least-squares slope of `ln v` against `ln r` for scales in `[lo, hi]`.
///
/// Returns `None` when fewer than two usable points fall in the range.
pub fn least_squares_slope(scales: &[f64], values: &[f64], lo: f64, hi: f64) -> Option<f64> {
    let pts: Vec<(f64, f64)> = scales
        .iter()
        .zip(values)
        .filter(|&(&r, &v)| r >= lo && r <= hi && v > 0.0)
        .map(|(&r, &v)| (r.ln(), v.ln()))
        .collect();

    if pts.len() < 2 {
        return None;
    }

    let n = pts.len() as f64;
    let mean_x = pts.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pts.iter().map(|p| p.1).sum::<f64>() / n;
    let (sxy, sxx) = pts.iter().fold((0.0, 0.0), |(sxy, sxx), &(x, y)| {
        let dx = x - mean_x;
        (sxy + dx * (y - mean_y), sxx + dx * dx)
    });

    if sxx <= 0.0 {
        None
    } else {
        Some(sxy / sxx)
    }
}

/// Takens' estimator `D_T(r) = C(r) / ∫_0^r C(s)/s ds` at every scale.
///
/// The integral runs in `ln r`. Between consecutive scales `C` is
/// interpolated as a power law, and below the first positive scale the
/// power law of the first interval is continued to `r = 0`, so the
/// estimate is exact for `C(r) = a r^D`. Rows before the first positive
/// value, or after a non-positive one, are `None`.
pub fn takens_estimator(scales: &[f64], values: &[f64]) -> Vec<Option<f64>> {
    let n = scales.len().min(values.len());
    let mut out = vec![None; n];
    let Some(first) = values[..n].iter().position(|&v| v > 0.0) else {
        return out;
    };

    let exponent = |a: usize| {
        let b = a + 1;
        (values[b] / values[a]).ln() / (scales[b] / scales[a]).ln()
    };
    // Integral of C(s)/s over one interval under power-law interpolation.
    let segment = |a: usize| {
        let alpha = exponent(a);
        if alpha.abs() < 1e-12 {
            values[a] * (scales[a + 1] / scales[a]).ln()
        } else {
            (values[a + 1] - values[a]) / alpha
        }
    };

    if first + 1 >= n || values[first + 1] <= 0.0 {
        return out;
    }
    let head = exponent(first);
    if !(head > 0.0 && head.is_finite()) {
        return out;
    }

    let mut integral = values[first] / head;
    out[first] = Some(head);
    for b in (first + 1)..n {
        if values[b].is_nan() || values[b] <= 0.0 {
            break;
        }
        integral += segment(b - 1);
        out[b] = Some(values[b] / integral);
    }
    out
}

/// Average of the available values within `half_width` positions of each
/// entry. Entries with no value in their window stay `None`.
pub fn smooth(values: &[Option<f64>], half_width: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| {
            let lo = i.saturating_sub(half_width);
            let hi = (i + half_width + 1).min(values.len());
            let (sum, count) = values[lo..hi]
                .iter()
                .flatten()
                .fold((0.0, 0usize), |(s, c), &v| (s + v, c + 1));
            (count > 0).then(|| sum / count as f64)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn power_law_has_constant_slope() {
        let r: Vec<f64> = (1..=6).map(|i| 0.01 * 2f64.powi(i)).collect();
        let c: Vec<f64> = r.iter().map(|x| 3.0 * x * x).collect();

        for s in local_slopes(&r, &c) {
            assert_relative_eq!(s.unwrap(), 2.0, epsilon = 1e-9);
        }
        let fit = least_squares_slope(&r, &c, 0.0, 1.0).unwrap();
        assert_relative_eq!(fit, 2.0, epsilon = 1e-9);
    }

    #[test]
    fn empty_scales_are_skipped() {
        let r = [0.1, 0.2, 0.4, 0.8];
        let c = [0.0, 0.04, 0.16, 0.64];
        let slopes = local_slopes(&r, &c);
        assert!(slopes[0].is_none());
        assert_relative_eq!(slopes[2].unwrap(), 2.0, epsilon = 1e-9);
        assert!(least_squares_slope(&r, &c, 0.1, 0.15).is_none());
    }

    #[test]
    fn takens_estimator_recovers_power_law_exponent() {
        let r: Vec<f64> = (0..8).map(|i| 0.01 * 1.7f64.powi(i)).collect();
        let c: Vec<f64> = r.iter().map(|x| 0.4 * x.powf(1.6)).collect();
        for d in takens_estimator(&r, &c) {
            assert_relative_eq!(d.unwrap(), 1.6, epsilon = 1e-9);
        }
    }

    #[test]
    fn takens_estimator_skips_leading_zeros() {
        let r = [0.1, 0.2, 0.4, 0.8];
        let c = [0.0, 0.04, 0.16, 0.64];
        let d = takens_estimator(&r, &c);
        assert!(d[0].is_none());
        for v in &d[1..] {
            assert_relative_eq!(v.unwrap(), 2.0, epsilon = 1e-9);
        }
        assert!(takens_estimator(&r, &[0.0; 4]).iter().all(Option::is_none));
    }

    #[test]
    fn smoothing_averages_available_neighbors() {
        let v = [Some(1.0), None, Some(3.0), Some(5.0)];
        let s = smooth(&v, 1);
        assert_eq!(s, vec![Some(1.0), Some(2.0), Some(4.0), Some(4.0)]);
        assert_eq!(smooth(&v, 0), v.to_vec());
        assert_eq!(smooth(&[None, None], 3), vec![None, None]);
    }
}
