//! Input validation for scan configuration.
//!
//! ## Purpose
//!
//! This module checks every configuration value before any embedding or
//! indexing starts. A failed check returns
//! [`ScalingError::Configuration`] naming the field, the offending value
//! and the violated constraint.
//!
//! ## Design notes
//!
//! * Validation is fail-fast: the first violation is returned.
//! * Checks that depend on the data (embedding span, column range) are left
//!   to the embedder, because they only invalidate single dimensions.
//!
//! ## Visibility
//!
//! Internal to the builders and adapters.

use std::time::Duration;

use crate::algorithms::selection::ReferenceSelection;
use crate::primitives::errors::ScalingError;

// ============================================================================
// Validator
// ============================================================================

/// Validation utility for scan configuration.
pub struct Validator;

impl Validator {
    /// Validate the embedding-dimension range.
    pub fn validate_dimensions(min_dim: usize, max_dim: usize) -> Result<(), ScalingError> {
        if min_dim == 0 {
            return Err(ScalingError::config("min_dim", min_dim, "must be at least 1"));
        }
        if max_dim < min_dim {
            return Err(ScalingError::config(
                "max_dim",
                max_dim,
                format!("must be >= min_dim ({min_dim})"),
            ));
        }
        Ok(())
    }

    /// Validate component count and delay.
    pub fn validate_embedding(components: usize, delay: usize) -> Result<(), ScalingError> {
        if components == 0 {
            return Err(ScalingError::config("components", components, "must be at least 1"));
        }
        if delay == 0 {
            return Err(ScalingError::config("delay", delay, "must be at least 1"));
        }
        Ok(())
    }

    /// Validate the per-scale pair cap.
    pub fn validate_max_pairs(max_pairs: Option<u64>) -> Result<(), ScalingError> {
        match max_pairs {
            Some(0) => Err(ScalingError::config("max_pairs", 0, "must be at least 1")),
            _ => Ok(()),
        }
    }

    /// Validate the reference-point selection.
    pub fn validate_references(selection: ReferenceSelection) -> Result<(), ScalingError> {
        match selection {
            ReferenceSelection::Random(0) => Err(ScalingError::config(
                "reference_points",
                0,
                "must be at least 1",
            )),
            _ => Ok(()),
        }
    }

    /// Validate scheduler settings.
    pub fn validate_scheduler(
        checkpoint_interval: Duration,
        batch_size: usize,
    ) -> Result<(), ScalingError> {
        if checkpoint_interval.is_zero() {
            return Err(ScalingError::config(
                "checkpoint_interval",
                format!("{checkpoint_interval:?}"),
                "must be > 0",
            ));
        }
        if batch_size == 0 {
            return Err(ScalingError::config("batch_size", batch_size, "must be at least 1"));
        }
        Ok(())
    }

    /// Validate the grid cell budget.
    pub fn validate_cell_budget(budget: usize) -> Result<(), ScalingError> {
        if budget == 0 {
            return Err(ScalingError::config("cell_budget", budget, "must be at least 1"));
        }
        Ok(())
    }

    /// Validate a Renyi order.
    pub fn validate_order(order: f64) -> Result<(), ScalingError> {
        if !order.is_finite() || order < 0.0 {
            return Err(ScalingError::config("order", order, "must be finite and >= 0"));
        }
        Ok(())
    }

    /// Reject options set more than once on a builder.
    pub fn validate_no_duplicates(duplicate: Option<&'static str>) -> Result<(), ScalingError> {
        match duplicate {
            Some(field) => Err(ScalingError::config(field, "set twice", "may only be set once")),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_of(err: ScalingError) -> &'static str {
        match err {
            ScalingError::Configuration { field, .. } => field,
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn rejects_bad_dimension_ranges() {
        assert_eq!(field_of(Validator::validate_dimensions(0, 3).unwrap_err()), "min_dim");
        assert_eq!(field_of(Validator::validate_dimensions(4, 3).unwrap_err()), "max_dim");
        assert!(Validator::validate_dimensions(2, 2).is_ok());
    }

    #[test]
    fn rejects_zero_limits() {
        assert!(Validator::validate_max_pairs(Some(0)).is_err());
        assert!(Validator::validate_max_pairs(None).is_ok());
        assert!(Validator::validate_references(ReferenceSelection::Random(0)).is_err());
        assert!(Validator::validate_scheduler(Duration::ZERO, 8).is_err());
        assert!(Validator::validate_scheduler(Duration::from_secs(1), 0).is_err());
        assert!(Validator::validate_order(-1.0).is_err());
        assert!(Validator::validate_order(f64::NAN).is_err());
        assert!(Validator::validate_embedding(1, 0).is_err());
    }

    #[test]
    fn duplicate_option_is_named() {
        let err = Validator::validate_no_duplicates(Some("delay")).unwrap_err();
        assert!(err.to_string().contains("delay"));
    }
}
