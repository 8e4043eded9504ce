//! Immutable multivariate time series.
//!
//! ## Purpose
//!
//! A [`Sample`] is an ordered sequence of real-valued vectors of fixed
//! width, indexed by integer time `t = 0..N-1`. It is the raw input to the
//! embedder and is never mutated once built.
//!
//! ## Design notes
//!
//! * Row-major flat storage: observation `t` occupies
//!   `data[t * width .. (t + 1) * width]`.
//! * Generic over `Float` so `f32` recordings need no conversion upfront.
//! * Every constructor rejects empty input and non-finite values.
//!
//! ## Invariants
//!
//! * `width >= 1` and `data.len() == len * width`.
//! * All values are finite.

use num_traits::Float;

use crate::primitives::errors::ScalingError;

/// Fixed-width time series of finite values.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample<T> {
    data: Vec<T>,
    width: usize,
}

impl<T: Float> Sample<T> {
    /// Build a scalar (width 1) series.
    pub fn scalar(values: &[T]) -> Result<Self, ScalingError> {
        Self::from_flat(values.to_vec(), 1)
    }

    /// Build from row-major data of the given width.
    pub fn from_flat(data: Vec<T>, width: usize) -> Result<Self, ScalingError> {
        if width == 0 {
            return Err(ScalingError::config("width", width, "must be at least 1"));
        }
        if data.is_empty() {
            return Err(ScalingError::EmptyInput);
        }
        if data.len() % width != 0 {
            return Err(ScalingError::config(
                "width",
                width,
                format!("does not divide the {} supplied values", data.len()),
            ));
        }
        if let Some(pos) = data.iter().position(|v| !v.is_finite()) {
            return Err(ScalingError::NonFiniteValue {
                row: pos / width,
                column: pos % width,
            });
        }
        Ok(Self { data, width })
    }

    /// Build from equally long columns.
    pub fn from_columns(columns: &[Vec<T>]) -> Result<Self, ScalingError> {
        let Some(first) = columns.first() else {
            return Err(ScalingError::EmptyInput);
        };
        let n = first.len();
        if let Some((c, col)) = columns.iter().enumerate().find(|(_, c)| c.len() != n) {
            return Err(ScalingError::config(
                "columns",
                format!("column {} has {} rows", c, col.len()),
                format!("all columns must have {} rows", n),
            ));
        }
        let width = columns.len();
        let mut data = Vec::with_capacity(n * width);
        for t in 0..n {
            for col in columns {
                data.push(col[t]);
            }
        }
        Self::from_flat(data, width)
    }

    /// Number of observations `N`.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len() / self.width
    }

    /// Returns `true` if the sample holds no observations.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of columns per observation.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Observation at time `t`.
    #[inline]
    pub fn row(&self, t: usize) -> &[T] {
        &self.data[t * self.width..(t + 1) * self.width]
    }

    /// Single value at time `t`, column `column`.
    #[inline]
    pub fn value(&self, t: usize, column: usize) -> T {
        self.data[t * self.width + column]
    }

    /// Copy of one column.
    pub fn column(&self, column: usize) -> Vec<T> {
        (0..self.len()).map(|t| self.value(t, column)).collect()
    }

    /// Promote every value to `f64`.
    pub fn to_f64(&self) -> Sample<f64> {
        Sample {
            data: self
                .data
                .iter()
                .map(|v| v.to_f64().unwrap_or(f64::NAN))
                .collect(),
            width: self.width,
        }
    }

    /// Borrow the flat row-major storage.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }
}

impl Sample<f64> {
    /// Mutable access for in-crate transforms such as normalization.
    pub(crate) fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_are_interleaved_row_major() {
        let s = Sample::from_columns(&[vec![1.0, 2.0, 3.0], vec![10.0, 20.0, 30.0]]).unwrap();
        assert_eq!(s.len(), 3);
        assert_eq!(s.width(), 2);
        assert_eq!(s.row(1), &[2.0, 20.0]);
        assert_eq!(s.column(1), vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn rejects_non_finite_values() {
        let err = Sample::from_flat(vec![1.0, 2.0, f64::NAN, 4.0], 2).unwrap_err();
        match err {
            ScalingError::NonFiniteValue { row, column } => {
                assert_eq!((row, column), (1, 0));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rejects_ragged_columns_and_empty_input() {
        assert!(Sample::<f64>::from_columns(&[vec![1.0], vec![1.0, 2.0]]).is_err());
        assert!(matches!(
            Sample::<f32>::scalar(&[]),
            Err(ScalingError::EmptyInput)
        ));
    }

    #[test]
    fn promotes_f32_to_f64() {
        let s = Sample::scalar(&[0.5f32, 1.5]).unwrap().to_f64();
        assert_eq!(s.as_slice(), &[0.5, 1.5]);
    }
}
