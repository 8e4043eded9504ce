//! Rescaling of samples to the unit interval.
//!
//! Every column is mapped independently by `(x - min) / (max - min)`.
//! A constant column has no interval to divide by; it is mapped to zero
//! and reported back to the caller, which surfaces the degeneracy instead
//! of aborting.

use crate::primitives::sample::Sample;

/// Rescale each column of `sample` into `[0, 1]` in place.
///
/// Returns the indices of columns with zero interval (constant columns).
pub fn rescale_unit_interval(sample: &mut Sample<f64>) -> Vec<usize> {
    let width = sample.width();
    let n = sample.len();
    let mut lo = vec![f64::INFINITY; width];
    let mut hi = vec![f64::NEG_INFINITY; width];

    for t in 0..n {
        for (c, &v) in sample.row(t).iter().enumerate() {
            lo[c] = lo[c].min(v);
            hi[c] = hi[c].max(v);
        }
    }

    let degenerate: Vec<usize> = (0..width).filter(|&c| hi[c] - lo[c] <= 0.0).collect();

    let data = sample.as_mut_slice();
    for (k, v) in data.iter_mut().enumerate() {
        let c = k % width;
        let interval = hi[c] - lo[c];
        *v = if interval > 0.0 {
            (*v - lo[c]) / interval
        } else {
            0.0
        };
    }

    degenerate
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_are_rescaled_independently() {
        let mut s =
            Sample::from_columns(&[vec![2.0, 4.0, 6.0], vec![-1.0, 1.0, 0.0]]).unwrap();
        let degenerate = rescale_unit_interval(&mut s);
        assert!(degenerate.is_empty());
        assert_eq!(s.column(0), vec![0.0, 0.5, 1.0]);
        assert_eq!(s.column(1), vec![0.0, 1.0, 0.5]);
    }

    #[test]
    fn constant_column_is_reported() {
        let mut s = Sample::from_columns(&[vec![3.0, 3.0], vec![0.0, 2.0]]).unwrap();
        assert_eq!(rescale_unit_interval(&mut s), vec![0]);
        assert_eq!(s.column(0), vec![0.0, 0.0]);
    }
}
