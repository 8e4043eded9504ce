//! Error types for scaling estimation.
//!
//! ## Purpose
//!
//! This module defines [`ScalingError`], the single error enum used across
//! the crate. Variants fall into three groups:
//!
//! * **Fatal configuration errors** raised before any computation starts.
//!   They always name the offending field and the value that violated its
//!   constraint.
//! * **Per-dimension errors** (`InvalidEmbedding`, `IndexCapacity`,
//!   `NumericDegeneracy`) which are isolated to one embedding dimension;
//!   the remaining dimensions of a scan still run.
//! * **I/O errors** raised by the input reader and the table reporters.
//!
//! ## Visibility
//!
//! [`ScalingError`] is part of the public API.

use std::io;
use thiserror::Error;

/// Unified error type for embedding, indexing and accumulation.
#[derive(Debug, Error)]
pub enum ScalingError {
    /// A configuration field violated its constraint.
    #[error("invalid configuration: `{field}` = {value} ({constraint})")]
    Configuration {
        /// Name of the offending option.
        field: &'static str,
        /// The value that was supplied.
        value: String,
        /// The constraint it violated.
        constraint: String,
    },

    /// The input series contained no observations.
    #[error("input sample is empty")]
    EmptyInput,

    /// The input series contained NaN or infinity.
    #[error("non-finite value at row {row}, column {column}")]
    NonFiniteValue {
        /// Row (time index) of the offending value.
        row: usize,
        /// Column of the offending value.
        column: usize,
    },

    /// No valid embedded point exists for this configuration.
    #[error("invalid embedding for m = {dimension}: {reason}")]
    InvalidEmbedding {
        /// Total embedding dimension `m = c * k`.
        dimension: usize,
        /// Human-readable cause.
        reason: String,
    },

    /// The grid would need more occupied cells than the memory budget allows.
    #[error("box grid needs {cells} cells, budget is {budget}")]
    IndexCapacity {
        /// Cells required at the attempted cell side.
        cells: usize,
        /// Configured budget.
        budget: usize,
    },

    /// The embedded points have zero extent; every scale is degenerate.
    #[error("numeric degeneracy for m = {dimension}: all embedded points coincide")]
    NumericDegeneracy {
        /// Total embedding dimension.
        dimension: usize,
    },

    /// A token in a data file could not be parsed as a number.
    #[error("line {line}: cannot parse `{token}` as a number")]
    Parse {
        /// 1-based line number.
        line: usize,
        /// Offending token.
        token: String,
    },

    /// A configuration file could not be read or parsed.
    #[error("configuration file: {0}")]
    ConfigFile(String),

    /// The reporter failed to persist a snapshot.
    #[error("reporter failed: {0}")]
    Report(String),

    /// Underlying I/O failure.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl ScalingError {
    /// Build a [`ScalingError::Configuration`] from any displayable value.
    pub fn config(
        field: &'static str,
        value: impl ToString,
        constraint: impl Into<String>,
    ) -> Self {
        Self::Configuration {
            field,
            value: value.to_string(),
            constraint: constraint.into(),
        }
    }

    /// Returns `true` for errors that only invalidate a single dimension.
    pub fn is_dimension_local(&self) -> bool {
        matches!(
            self,
            Self::InvalidEmbedding { .. }
                | Self::IndexCapacity { .. }
                | Self::NumericDegeneracy { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_error_names_field_and_value() {
        let err = ScalingError::config("delay", 0, "must be at least 1");
        let msg = err.to_string();
        assert!(msg.contains("delay"));
        assert!(msg.contains('0'));
        assert!(msg.contains("at least 1"));
        assert!(!err.is_dimension_local());
    }

    #[test]
    fn embedding_errors_are_dimension_local() {
        let err = ScalingError::InvalidEmbedding {
            dimension: 4,
            reason: "too short".into(),
        };
        assert!(err.is_dimension_local());
        assert!(ScalingError::IndexCapacity { cells: 10, budget: 5 }.is_dimension_local());
    }
}
