//! Fixed-mass adapter.
//!
//! ## Purpose
//!
//! This module provides the execution builder for fixed-mass scans. For
//! each neighbor count `K` of a log-spaced mass ladder it measures the
//! radius enclosing the `K` nearest neighbors of every reference point and
//! reports the geometric mean radius against the mass `K / (N' - 1)`. The
//! slope of `ln mass` against `ln r` estimates the information dimension
//! D1.
//!
//! ## Visibility
//!
//! Public through the high-level [`ScalingBuilder`](crate::api::ScalingBuilder).

use num_traits::Float;

use crate::adapters::{prepare_sample, ScanOptions};
use crate::engine::executor::{run_schedule, RunSummary};
use crate::engine::output::{EstimatorKind, NullReporter, Reporter};
use crate::engine::validator::Validator;
use crate::estimators::fixed_mass::{mass_targets, FixedMassAccumulator, FixedMassParams};
use crate::input::SampleInput;
use crate::primitives::errors::ScalingError;

/// Default smallest neighbor count.
pub const DEFAULT_MIN_NEIGHBORS: usize = 1;

/// Default largest neighbor count.
pub const DEFAULT_MAX_NEIGHBORS: usize = 100;

/// Default number of mass targets.
pub const DEFAULT_MASS_COUNT: usize = 20;

/// Builder for fixed-mass scans.
#[derive(Debug, Clone)]
pub struct FixedMassBuilder {
    /// Shared scan options.
    pub scan: ScanOptions,

    /// Smallest neighbor count `K_1`.
    pub min_neighbors: usize,

    /// Largest neighbor count `K_B`.
    pub max_neighbors: usize,

    /// Number of log-spaced targets.
    pub mass_count: usize,

    /// Observation cap per target (`None` = unlimited).
    pub max_observations: Option<u64>,

    /// Tracks options set more than once.
    pub(crate) duplicate_param: Option<&'static str>,
}

impl Default for FixedMassBuilder {
    fn default() -> Self {
        Self {
            scan: ScanOptions::default(),
            min_neighbors: DEFAULT_MIN_NEIGHBORS,
            max_neighbors: DEFAULT_MAX_NEIGHBORS,
            mass_count: DEFAULT_MASS_COUNT,
            max_observations: None,
            duplicate_param: None,
        }
    }
}

impl FixedMassBuilder {
    /// Set the neighbor-count range.
    pub fn neighbors(mut self, min: usize, max: usize) -> Self {
        self.min_neighbors = min;
        self.max_neighbors = max;
        self
    }

    /// Set the number of mass targets.
    pub fn mass_count(mut self, count: usize) -> Self {
        self.mass_count = count;
        self
    }

    /// Set the observation cap per target.
    pub fn max_observations(mut self, cap: Option<u64>) -> Self {
        self.max_observations = cap;
        self
    }

    /// Validate and build the runner.
    pub fn build(self) -> Result<FixedMassScan, ScalingError> {
        Validator::validate_no_duplicates(self.duplicate_param)?;
        self.scan.validate()?;
        if self.max_observations == Some(0) {
            return Err(ScalingError::config("max_observations", 0, "must be at least 1"));
        }
        let targets = mass_targets(self.min_neighbors, self.max_neighbors, self.mass_count)?;

        Ok(FixedMassScan {
            params: FixedMassParams {
                targets,
                metric: self.scan.metric,
                theiler: self.scan.theiler,
                max_observations: self.max_observations,
                grid: self.scan.grid,
            },
            scan: self.scan,
        })
    }
}

/// Validated fixed-mass scan.
#[derive(Debug, Clone)]
pub struct FixedMassScan {
    scan: ScanOptions,
    params: FixedMassParams,
}

impl FixedMassScan {
    /// Run every scheduled dimension, streaming snapshots to `reporter`.
    pub fn run<T, I>(&self, input: &I, reporter: &dyn Reporter) -> Result<RunSummary, ScalingError>
    where
        T: Float,
        I: SampleInput<T> + ?Sized,
    {
        let sample = prepare_sample(input)?;
        let config = self.scan.executor_config(EstimatorKind::FixedMass);
        Ok(run_schedule(
            &sample,
            &config,
            |points| FixedMassAccumulator::new(points, self.params.clone()),
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

    /// Neighbor-count targets after deduplication.
    pub fn targets(&self) -> &[usize] {
        &self.params.targets
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_validates_neighbor_range() {
        assert!(FixedMassBuilder::default().neighbors(5, 2).build().is_err());
        assert!(FixedMassBuilder::default().neighbors(0, 2).build().is_err());
        let fm = FixedMassBuilder::default().neighbors(1, 8).mass_count(4).build().unwrap();
        assert_eq!(fm.targets(), &[1, 2, 4, 8]);
    }
}
