//! Per-dimension scale scheduler.
//!
//! ## Purpose
//!
//! This module drives one [`ScaleAccumulator`] through its work units and
//! decides when its state is handed to a [`Reporter`].
//!
//! ## Design notes
//!
//! * **State machine**: `Initializing -> Scanning <-> Draining -> Done`.
//!   A checkpoint drains the current snapshot and resumes scanning at the
//!   same position.
//! * **Batches**: units are probed in batches (in parallel with the `cpu`
//!   feature) and the tallies are absorbed in unit order. Sequential runs
//!   use batches of one, so results never depend on the batch size.
//! * **Soft timer**: the checkpoint interval is checked between batches; a
//!   long batch delays the checkpoint, it never interrupts a query.
//! * **Cancellation**: the [`StopSignal`] is polled at the same boundaries.
//!   A cancelled dimension still produces a valid partial table.
//! * **Early exit**: the scan stops once every scale is frozen.
//!
//! ## Invariants
//!
//! * Snapshot counts are non-decreasing from one checkpoint to the next.
//! * `references_done` never exceeds `references_total`.

use std::time::{Duration, Instant};

#[cfg(feature = "cpu")]
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::algorithms::embedding::EmbeddingSpec;
use crate::algorithms::selection::{ReferenceSelection, DEFAULT_SEED};
use crate::engine::output::{EstimatorKind, Phase, Reporter, ScalingTable, StatusLine};
use crate::estimators::ScaleAccumulator;
use crate::math::metric::Metric;
use crate::primitives::errors::ScalingError;
use crate::primitives::signal::StopSignal;

/// Default time between checkpoints.
pub const DEFAULT_CHECKPOINT_INTERVAL: Duration = Duration::from_secs(120);

/// Default number of units probed per parallel batch.
pub const DEFAULT_BATCH_SIZE: usize = 256;

// ============================================================================
// Configuration
// ============================================================================

/// Scheduler settings shared by every dimension of a scan.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Which points act as references.
    pub selection: ReferenceSelection,

    /// Seed for random reference subsets.
    pub seed: u64,

    /// Soft interval between checkpoints.
    pub checkpoint_interval: Duration,

    /// Units probed per parallel batch.
    pub batch_size: usize,

    /// Probe batches on the rayon pool (requires the `cpu` feature).
    pub parallel: bool,

    /// External cancellation flag.
    pub stop: StopSignal,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            selection: ReferenceSelection::All,
            seed: DEFAULT_SEED,
            checkpoint_interval: DEFAULT_CHECKPOINT_INTERVAL,
            batch_size: DEFAULT_BATCH_SIZE,
            parallel: true,
            stop: StopSignal::new(),
        }
    }
}

impl SchedulerConfig {
    /// Whether batches are actually probed in parallel.
    #[inline]
    pub fn runs_parallel(&self) -> bool {
        cfg!(feature = "cpu") && self.parallel
    }
}

/// Labels attached to every table of one dimension.
#[derive(Debug, Clone)]
pub struct TableMeta {
    /// Quantity being accumulated.
    pub kind: EstimatorKind,

    /// Distance norm.
    pub metric: Metric,

    /// Embedding that produced the point set.
    pub spec: EmbeddingSpec,
}

// ============================================================================
// Scheduler
// ============================================================================

/// Drives one accumulator from its first unit to `Done`.
pub struct ScaleScheduler<'a, A: ScaleAccumulator> {
    acc: A,
    config: &'a SchedulerConfig,
    meta: TableMeta,
    units: Vec<usize>,
    position: usize,
    phase: Phase,
    cancelled: bool,
    scratch: A::Scratch,
}

impl<'a, A: ScaleAccumulator> ScaleScheduler<'a, A> {
    /// Prepare a scan over the accumulator's work units.
    pub fn new(acc: A, config: &'a SchedulerConfig, meta: TableMeta) -> Self {
        let units = acc.work_units(config.selection, config.seed);
        let scratch = acc.scratch();
        Self {
            acc,
            config,
            meta,
            units,
            position: 0,
            phase: Phase::Initializing,
            cancelled: false,
            scratch,
        }
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Run to completion, saturation or cancellation.
    ///
    /// Checkpoint write failures are logged and the scan continues; a
    /// failure of the final write is returned.
    pub fn run(mut self, reporter: &dyn Reporter) -> Result<ScalingTable, ScalingError> {
        let dimension = self.meta.spec.dimension();
        let degeneracy = self.acc.is_degenerate().then(|| {
            let err = ScalingError::NumericDegeneracy { dimension };
            warn!(dimension, "{err}");
            err.to_string()
        });

        self.phase = Phase::Scanning;
        reporter.status(&self.status(degeneracy.clone()));

        let step = if self.config.runs_parallel() {
            self.config.batch_size.max(1)
        } else {
            1
        };
        let mut last_checkpoint = Instant::now();

        while self.position < self.units.len() && !self.acc.is_saturated() {
            if self.config.stop.is_stopped() {
                self.cancelled = true;
                break;
            }

            let end = (self.position + step).min(self.units.len());
            let tallies = probe_batch(
                &self.acc,
                &mut self.scratch,
                &self.units[self.position..end],
                self.config.runs_parallel(),
            );
            for tally in tallies {
                self.acc.absorb(tally);
            }
            self.position = end;

            if last_checkpoint.elapsed() >= self.config.checkpoint_interval {
                self.drain(reporter);
                last_checkpoint = Instant::now();
            }
        }

        self.phase = Phase::Done;
        let table = self.snapshot();
        let message = if self.cancelled {
            Some("cancelled".to_string())
        } else {
            degeneracy
        };
        reporter.status(&self.status(message));
        reporter.finish(&table)?;
        Ok(table)
    }

    /// Hand an intermediate snapshot to the reporter.
    fn drain(&mut self, reporter: &dyn Reporter) {
        self.phase = Phase::Draining;
        let table = self.snapshot();
        debug!(
            dimension = table.dimension,
            done = table.references_done,
            total = table.references_total,
            frozen = table.frozen_rows(),
            "checkpoint"
        );
        if let Err(err) = reporter.checkpoint(&table) {
            warn!(dimension = table.dimension, error = %err, "checkpoint write failed");
        }
        reporter.status(&self.status(None));
        self.phase = Phase::Scanning;
    }

    /// Render the accumulator state.
    pub fn snapshot(&self) -> ScalingTable {
        let spec = &self.meta.spec;
        ScalingTable {
            kind: self.meta.kind,
            metric: self.meta.metric,
            dimension: spec.dimension(),
            components: spec.components,
            lags: spec.lags,
            points: self.acc.point_count(),
            rows: self.acc.rows(),
            references_done: self.position,
            references_total: self.units.len(),
            cancelled: self.cancelled,
            saturated: self.acc.is_saturated(),
            degenerate: self.acc.is_degenerate(),
        }
    }

    fn status(&self, message: Option<String>) -> StatusLine {
        let rows = self.acc.rows();
        StatusLine {
            dimension: self.meta.spec.dimension(),
            phase: self.phase,
            references_done: self.position,
            references_total: self.units.len(),
            frozen_scales: rows.iter().filter(|r| r.frozen).count(),
            total_scales: rows.len(),
            message,
        }
    }
}

/// Probe `units` against the current accumulator state, in unit order.
fn probe_batch<A: ScaleAccumulator>(
    acc: &A,
    scratch: &mut A::Scratch,
    units: &[usize],
    parallel: bool,
) -> Vec<A::Tally> {
    #[cfg(feature = "cpu")]
    if parallel && units.len() > 1 {
        return units
            .par_iter()
            .map_init(|| acc.scratch(), |s, &u| acc.probe(u, s))
            .collect();
    }
    #[cfg(not(feature = "cpu"))]
    let _ = parallel;

    units.iter().map(|&u| acc.probe(u, scratch)).collect()
}
