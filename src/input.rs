//! Input abstraction and delimited-text reading.
//!
//! This module defines the [`SampleInput`] trait, which lets the scan
//! entry points accept slices, vectors, ndarray arrays and ready-made
//! [`Sample`]s interchangeably, and [`read_columns`], which loads numeric
//! columns from whitespace- or comma-delimited text.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use ndarray::{ArrayBase, Data, Ix1, Ix2};
use num_traits::Float;

use crate::primitives::errors::ScalingError;
use crate::primitives::sample::Sample;

// ============================================================================
// Sample Input
// ============================================================================

/// Types that can be turned into a [`Sample`].
pub trait SampleInput<T: Float> {
    /// Copy the input into a validated sample.
    fn to_sample(&self) -> Result<Sample<T>, ScalingError>;
}

impl<T: Float> SampleInput<T> for [T] {
    fn to_sample(&self) -> Result<Sample<T>, ScalingError> {
        Sample::scalar(self)
    }
}

impl<T: Float> SampleInput<T> for Vec<T> {
    fn to_sample(&self) -> Result<Sample<T>, ScalingError> {
        Sample::scalar(self)
    }
}

impl<T: Float> SampleInput<T> for Sample<T> {
    fn to_sample(&self) -> Result<Sample<T>, ScalingError> {
        Ok(self.clone())
    }
}

impl<T: Float, S> SampleInput<T> for ArrayBase<S, Ix1>
where
    S: Data<Elem = T>,
{
    fn to_sample(&self) -> Result<Sample<T>, ScalingError> {
        Sample::from_flat(self.iter().copied().collect(), 1)
    }
}

/// Rows are time steps, columns are signal components.
impl<T: Float, S> SampleInput<T> for ArrayBase<S, Ix2>
where
    S: Data<Elem = T>,
{
    fn to_sample(&self) -> Result<Sample<T>, ScalingError> {
        // `iter` walks in logical row-major order regardless of layout.
        Sample::from_flat(self.iter().copied().collect(), self.ncols())
    }
}

// ============================================================================
// Text Reader
// ============================================================================

/// Options for [`read_columns`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadOptions {
    /// Data lines skipped at the top (comments and blank lines excluded).
    pub skip_rows: usize,

    /// 0-based columns to read, in order. Empty reads every column of the
    /// first data row.
    pub columns: Vec<usize>,

    /// Maximum number of rows read after skipping.
    pub max_rows: Option<usize>,
}

/// Read numeric columns from delimited text.
///
/// Fields are separated by whitespace or commas. Lines starting with `#`
/// and blank lines are ignored.
pub fn read_columns<R: BufRead>(
    reader: R,
    options: &ReadOptions,
) -> Result<Sample<f64>, ScalingError> {
    let mut data = Vec::new();
    let mut width = if options.columns.is_empty() {
        None
    } else {
        Some(options.columns.len())
    };
    let mut skipped = 0;
    let mut rows = 0;

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = index + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        if skipped < options.skip_rows {
            skipped += 1;
            continue;
        }
        if options.max_rows.is_some_and(|max| rows >= max) {
            break;
        }

        let fields: Vec<&str> = trimmed
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|f| !f.is_empty())
            .collect();

        let parse = |token: &str| {
            token.parse::<f64>().map_err(|_| ScalingError::Parse {
                line: line_no,
                token: token.to_string(),
            })
        };

        if options.columns.is_empty() {
            let expected = *width.get_or_insert(fields.len());
            if fields.len() != expected {
                return Err(ScalingError::Parse {
                    line: line_no,
                    token: format!("{} fields, expected {}", fields.len(), expected),
                });
            }
            for &token in &fields {
                data.push(parse(token)?);
            }
        } else {
            for &c in &options.columns {
                let token = fields.get(c).copied().ok_or_else(|| ScalingError::Parse {
                    line: line_no,
                    token: format!("missing column {c}"),
                })?;
                data.push(parse(token)?);
            }
        }
        rows += 1;
    }

    match width {
        Some(w) if !data.is_empty() => Sample::from_flat(data, w),
        _ => Err(ScalingError::EmptyInput),
    }
}

/// Read numeric columns from a file.
pub fn read_file(
    path: impl AsRef<Path>,
    options: &ReadOptions,
) -> Result<Sample<f64>, ScalingError> {
    let file = File::open(path)?;
    read_columns(BufReader::new(file), options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array1};

    #[test]
    fn reads_selected_columns_after_skipping() {
        let text = "# header\nx y z\n1 2 3\n\n4,5,6\n7\t8\t9\n";
        let options = ReadOptions {
            skip_rows: 1,
            columns: vec![2, 0],
            max_rows: Some(2),
        };
        let s = read_columns(text.as_bytes(), &options).unwrap();
        assert_eq!(s.width(), 2);
        assert_eq!(s.as_slice(), &[3.0, 1.0, 6.0, 4.0]);
    }

    #[test]
    fn reports_line_of_bad_token() {
        let err = read_columns("1\n2\nabc\n".as_bytes(), &ReadOptions::default()).unwrap_err();
        match err {
            ScalingError::Parse { line, token } => {
                assert_eq!(line, 3);
                assert_eq!(token, "abc");
            }
            other => panic!("unexpected {other}"),
        }
    }

    #[test]
    fn ragged_rows_and_empty_files_fail() {
        assert!(read_columns("1 2\n3\n".as_bytes(), &ReadOptions::default()).is_err());
        assert!(matches!(
            read_columns("# nothing\n".as_bytes(), &ReadOptions::default()),
            Err(ScalingError::EmptyInput)
        ));
    }

    #[test]
    fn ndarray_inputs_convert() {
        let a: Array1<f64> = array![1.0, 2.0, 3.0];
        assert_eq!(a.to_sample().unwrap().len(), 3);

        let m = array![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]];
        let s = m.to_sample().unwrap();
        assert_eq!((s.len(), s.width()), (3, 2));
        assert_eq!(s.row(1), &[3.0, 4.0]);

        let t = m.t();
        assert_eq!(t.to_sample().unwrap().row(0), &[1.0, 3.0, 5.0]);
    }

    #[test]
    fn non_finite_values_are_rejected() {
        let v = vec![1.0, f64::NAN];
        assert!(matches!(
            v.to_sample(),
            Err(ScalingError::NonFiniteValue { row: 1, column: 0 })
        ));
    }
}
