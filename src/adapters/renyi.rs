//! Renyi-entropy adapter.
//!
//! ## Purpose
//!
//! This module provides the execution builder for box-counting scans of
//! order-Q Renyi entropies `H_Q(r)`. `-dH_Q / d ln r` estimates the
//! generalized dimension `D_Q`; `Q = 0` gives the box-counting dimension and
//! `Q = 1` the information dimension.
//!
//! Reference selection, the Theiler window and pair caps do not apply:
//! every point is assigned to a box at every scale.
//!
//! ## Visibility
//!
//! Public through the high-level [`ScalingBuilder`](crate::api::ScalingBuilder).

use num_traits::Float;

use crate::adapters::{prepare_sample, ScaleSpec, ScanOptions};
use crate::engine::executor::{run_schedule, RunSummary};
use crate::engine::output::{EstimatorKind, NullReporter, Reporter};
use crate::engine::validator::Validator;
use crate::estimators::box_occupation::{BoxOccupation, BoxOccupationParams};
use crate::input::SampleInput;
use crate::primitives::errors::ScalingError;

/// Default Renyi order.
pub const DEFAULT_ORDER: f64 = 2.0;

/// Default box sides over rescaled data.
pub const DEFAULT_SCALES: ScaleSpec = ScaleSpec::LogSpaced {
    min: 1e-3,
    max: 1.0,
    count: 20,
};

/// Builder for Renyi-entropy scans.
#[derive(Debug, Clone)]
pub struct RenyiBuilder {
    /// Shared scan options.
    pub scan: ScanOptions,

    /// Box sides.
    pub scales: ScaleSpec,

    /// Renyi order `Q`.
    pub order: f64,

    /// Tracks options set more than once.
    pub(crate) duplicate_param: Option<&'static str>,
}

impl Default for RenyiBuilder {
    fn default() -> Self {
        Self {
            scan: ScanOptions::default(),
            scales: DEFAULT_SCALES,
            order: DEFAULT_ORDER,
            duplicate_param: None,
        }
    }
}

impl RenyiBuilder {
    /// Set the box sides.
    pub fn scales(mut self, scales: ScaleSpec) -> Self {
        self.scales = scales;
        self
    }

    /// Set the Renyi order.
    pub fn order(mut self, order: f64) -> Self {
        self.order = order;
        self
    }

    /// Validate and build the runner.
    pub fn build(self) -> Result<RenyiScan, ScalingError> {
        Validator::validate_no_duplicates(self.duplicate_param)?;
        self.scan.validate()?;
        Validator::validate_order(self.order)?;
        let ladder = self.scales.ladder()?;

        Ok(RenyiScan {
            params: BoxOccupationParams {
                ladder,
                order: self.order,
            },
            scan: self.scan,
        })
    }
}

/// Validated Renyi-entropy scan.
#[derive(Debug, Clone)]
pub struct RenyiScan {
    scan: ScanOptions,
    params: BoxOccupationParams,
}

impl RenyiScan {
    /// Run every scheduled dimension, streaming snapshots to `reporter`.
    pub fn run<T, I>(&self, input: &I, reporter: &dyn Reporter) -> Result<RunSummary, ScalingError>
    where
        T: Float,
        I: SampleInput<T> + ?Sized,
    {
        let sample = prepare_sample(input)?;
        let config = self.scan.executor_config(EstimatorKind::Renyi);
        Ok(run_schedule(
            &sample,
            &config,
            |points| Ok(BoxOccupation::new(points, self.params.clone())),
            reporter,
        ))
    }

    /// Run without a reporter and return the final tables.
    pub fn fit<T, I>(&self, input: &I) -> Result<RunSummary, ScalingError>
    where
        T: Float,
        I: SampleInput<T> + ?Sized,
    {
        self.run(input, &NullReporter)
    }

    /// Renyi order `Q`.
    pub fn order(&self) -> f64 {
        self.params.order
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_rejects_negative_order() {
        assert!(RenyiBuilder::default().order(-0.5).build().is_err());
        assert_eq!(RenyiBuilder::default().order(0.0).build().unwrap().order(), 0.0);
    }
}
