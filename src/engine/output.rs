//! Output types and reporters for dimension scans.
//!
//! ## Purpose
//!
//! This module defines [`ScalingTable`], the snapshot of one embedding
//! dimension's accumulators, together with the [`Reporter`] trait that
//! receives snapshots on every checkpoint and at completion.
//!
//! ## Design notes
//!
//! * Tables are plain values: reporters receive a fresh snapshot and never
//!   see live accumulators.
//! * Reporters are shared across dimension threads and take `&self`; each
//!   implementation guards its sink with a mutex, so a write holds the
//!   output resource only for the duration of one call.
//! * [`TableFileReporter`] keeps the latest table per dimension and, in
//!   overwrite mode, replaces the whole file atomically (temporary file in
//!   the same directory, then rename). Readers never see a torn file.
//!
//! ## Key concepts
//!
//! ### Rendering
//!
//! Each table renders as a block:
//!
//! ```text
//! # m = 2 (c = 1, k = 2) correlation-sum euclidean refs 1000/1000 done
//! # scale statistic count norm flags
//! 1.000000e-2 3.1250000e-4 156 499500 -
//! ```
//!
//! Flags are `F` (frozen), `L` (low confidence) and `D` (degenerate).
//!
//! ### Slopes
//!
//! [`ScalingTable::local_slopes`] turns a table into dimension estimates:
//! `d ln C / d ln r` for correlation sums, `d ln mass / d ln r` for fixed
//! mass and `-d H_Q / d ln r` for Renyi entropies.
//!
//! ## Visibility
//!
//! All types here are part of the public API.

use std::collections::BTreeMap;
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{info, warn};

use crate::estimators::ScaleRow;
use crate::math::metric::Metric;
use crate::math::slope::{
    finite_differences, least_squares_slope, local_slopes, smooth, takens_estimator,
};
use crate::primitives::errors::ScalingError;

// ============================================================================
// Estimator Kind
// ============================================================================

/// Which quantity a table holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EstimatorKind {
    /// Correlation sum `C(r)`.
    CorrelationSum,

    /// Fixed-mass radius curve.
    FixedMass,

    /// Order-Q Renyi entropy.
    Renyi,
}

impl EstimatorKind {
    /// Short label used in rendered tables.
    pub fn label(self) -> &'static str {
        match self {
            Self::CorrelationSum => "correlation-sum",
            Self::FixedMass => "fixed-mass",
            Self::Renyi => "renyi",
        }
    }
}

// ============================================================================
// Scaling Table
// ============================================================================

/// Snapshot of one embedding dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalingTable {
    /// Quantity held in `rows`.
    pub kind: EstimatorKind,

    /// Distance norm used.
    pub metric: Metric,

    /// Embedding dimension `m`.
    pub dimension: usize,

    /// Components `c`.
    pub components: usize,

    /// Lags `k`.
    pub lags: usize,

    /// Embedded points `N'`.
    pub points: usize,

    /// One row per scale, in ladder order.
    pub rows: Vec<ScaleRow>,

    /// Work units processed so far.
    pub references_done: usize,

    /// Work units scheduled.
    pub references_total: usize,

    /// Whether the scan was stopped before completion.
    pub cancelled: bool,

    /// Whether every scale froze before all units were processed.
    pub saturated: bool,

    /// Whether the embedded points have zero extent.
    pub degenerate: bool,
}

impl ScalingTable {
    /// Length scales of all rows.
    pub fn scales(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.scale).collect()
    }

    /// Statistic of all rows.
    pub fn statistics(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.statistic).collect()
    }

    /// Returns `true` if the scan ran to its end (all units, or all
    /// scales frozen).
    pub fn is_complete(&self) -> bool {
        !self.cancelled && (self.saturated || self.references_done >= self.references_total)
    }

    /// Local dimension estimate at every row.
    pub fn local_slopes(&self) -> Vec<Option<f64>> {
        let scales = self.scales();
        let stats = self.statistics();
        match self.kind {
            EstimatorKind::Renyi => {
                let lx: Vec<f64> = scales.iter().map(|r| r.ln()).collect();
                finite_differences(&lx, &stats)
                    .into_iter()
                    .map(|s| s.map(|v| -v))
                    .collect()
            }
            _ => local_slopes(&scales, &stats),
        }
    }

    /// Least-squares dimension estimate over scales in `[lo, hi]`.
    pub fn slope_between(&self, lo: f64, hi: f64) -> Option<f64> {
        match self.kind {
            EstimatorKind::Renyi => {
                // ln(exp(-H)) = -H, so the log-log fit yields -dH/dln r.
                let values: Vec<f64> = self.rows.iter().map(|r| (-r.statistic).exp()).collect();
                least_squares_slope(&self.scales(), &values, lo, hi)
            }
            _ => least_squares_slope(&self.scales(), &self.statistics(), lo, hi),
        }
    }

    /// Local slopes averaged over `half_width` neighboring scales on each
    /// side.
    pub fn smoothed_local_slopes(&self, half_width: usize) -> Vec<Option<f64>> {
        smooth(&self.local_slopes(), half_width)
    }

    /// Takens' maximum-likelihood dimension at every row of a
    /// correlation-sum table. Other estimators yield `None` throughout.
    pub fn takens_estimator(&self) -> Vec<Option<f64>> {
        match self.kind {
            EstimatorKind::CorrelationSum => takens_estimator(&self.scales(), &self.statistics()),
            _ => vec![None; self.rows.len()],
        }
    }

    /// Number of rows that stopped accumulating.
    pub fn frozen_rows(&self) -> usize {
        self.rows.iter().filter(|r| r.frozen).count()
    }
}

impl fmt::Display for ScalingTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.cancelled {
            "cancelled"
        } else if self.references_done >= self.references_total {
            "done"
        } else if self.saturated {
            "saturated"
        } else {
            "partial"
        };
        writeln!(
            f,
            "# m = {} (c = {}, k = {}) {} {} refs {}/{} {}",
            self.dimension,
            self.components,
            self.lags,
            self.kind.label(),
            self.metric.name(),
            self.references_done,
            self.references_total,
            state
        )?;
        if self.degenerate {
            writeln!(f, "# degenerate: all embedded points coincide")?;
        }
        writeln!(f, "# scale statistic count norm flags")?;
        for row in &self.rows {
            let mut flags = String::new();
            if row.frozen {
                flags.push('F');
            }
            if row.low_confidence {
                flags.push('L');
            }
            if row.degenerate {
                flags.push('D');
            }
            if flags.is_empty() {
                flags.push('-');
            }
            writeln!(
                f,
                "{:.6e} {:.7e} {} {} {}",
                row.scale, row.statistic, row.count, row.norm, flags
            )?;
        }
        Ok(())
    }
}

// ============================================================================
// Status
// ============================================================================

/// Lifecycle phase of a dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Building the point set and the index.
    Initializing,

    /// Running the reference loop.
    Scanning,

    /// Handing a checkpoint snapshot to the reporter.
    Draining,

    /// Finished (completed, saturated, cancelled or failed).
    Done,
}

/// Progress report of one dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusLine {
    /// Embedding dimension `m`.
    pub dimension: usize,

    /// Current phase.
    pub phase: Phase,

    /// Work units processed.
    pub references_done: usize,

    /// Work units scheduled.
    pub references_total: usize,

    /// Frozen scales.
    pub frozen_scales: usize,

    /// All scales.
    pub total_scales: usize,

    /// Warning or error attached to the dimension.
    pub message: Option<String>,
}

impl fmt::Display for StatusLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "m = {}: {:?} {}/{} refs, {}/{} scales frozen",
            self.dimension,
            self.phase,
            self.references_done,
            self.references_total,
            self.frozen_scales,
            self.total_scales
        )?;
        if let Some(msg) = &self.message {
            write!(f, " ({msg})")?;
        }
        Ok(())
    }
}

// ============================================================================
// Reporter
// ============================================================================

/// Sink for snapshots and status lines.
pub trait Reporter: Send + Sync {
    /// Receive an intermediate snapshot.
    fn checkpoint(&self, table: &ScalingTable) -> Result<(), ScalingError>;

    /// Receive the final snapshot of a dimension.
    fn finish(&self, table: &ScalingTable) -> Result<(), ScalingError> {
        self.checkpoint(table)
    }

    /// Receive a progress line. Logged at `info` level by default.
    fn status(&self, line: &StatusLine) {
        match &line.message {
            Some(_) => warn!(dimension = line.dimension, "{line}"),
            None => info!(dimension = line.dimension, "{line}"),
        }
    }
}

/// Reporter that discards everything except status logging.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn checkpoint(&self, _table: &ScalingTable) -> Result<(), ScalingError> {
        Ok(())
    }
}

// ============================================================================
// Collecting Reporter
// ============================================================================

/// Kind of a collected snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotKind {
    /// Emitted on a checkpoint.
    Checkpoint,

    /// Emitted at completion.
    Final,
}

#[derive(Debug, Default)]
struct Collected {
    snapshots: Vec<(SnapshotKind, ScalingTable)>,
    statuses: Vec<StatusLine>,
}

/// Reporter that keeps every snapshot and status line in memory.
#[derive(Debug, Default)]
pub struct CollectingReporter {
    inner: Mutex<Collected>,
}

impl CollectingReporter {
    /// Create an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// All snapshots in arrival order.
    pub fn snapshots(&self) -> Vec<(SnapshotKind, ScalingTable)> {
        self.lock().snapshots.clone()
    }

    /// Final snapshots, sorted by dimension.
    pub fn finals(&self) -> Vec<ScalingTable> {
        let mut out: Vec<ScalingTable> = self
            .lock()
            .snapshots
            .iter()
            .filter(|(k, _)| *k == SnapshotKind::Final)
            .map(|(_, t)| t.clone())
            .collect();
        out.sort_by_key(|t| t.dimension);
        out
    }

    /// All status lines in arrival order.
    pub fn statuses(&self) -> Vec<StatusLine> {
        self.lock().statuses.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Collected> {
        // A panic in another reporter call cannot leave `Collected` invalid.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Reporter for CollectingReporter {
    fn checkpoint(&self, table: &ScalingTable) -> Result<(), ScalingError> {
        self.lock()
            .snapshots
            .push((SnapshotKind::Checkpoint, table.clone()));
        Ok(())
    }

    fn finish(&self, table: &ScalingTable) -> Result<(), ScalingError> {
        self.lock().snapshots.push((SnapshotKind::Final, table.clone()));
        Ok(())
    }

    fn status(&self, line: &StatusLine) {
        self.lock().statuses.push(line.clone());
    }
}

// ============================================================================
// Table File Reporter
// ============================================================================

/// How a [`TableFileReporter`] persists snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    /// Rewrite the file with the latest table of every dimension.
    #[default]
    Overwrite,

    /// Append every snapshot as a new block.
    Append,
}

/// Reporter writing tables to one text file.
#[derive(Debug)]
pub struct TableFileReporter {
    path: PathBuf,
    mode: WriteMode,
    latest: Mutex<BTreeMap<usize, ScalingTable>>,
}

impl TableFileReporter {
    /// Create a reporter writing to `path`.
    ///
    /// The parent directory is created if missing. In append mode an
    /// existing file is truncated first, so a run never mixes with the
    /// output of an earlier one.
    pub fn create(path: impl AsRef<Path>, mode: WriteMode) -> Result<Self, ScalingError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        if mode == WriteMode::Append {
            fs::File::create(&path)?;
        }
        Ok(Self {
            path,
            mode,
            latest: Mutex::new(BTreeMap::new()),
        })
    }

    /// Output path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, table: &ScalingTable) -> Result<(), ScalingError> {
        let mut latest = self
            .latest
            .lock()
            .map_err(|_| ScalingError::Report("table store poisoned".into()))?;

        match self.mode {
            WriteMode::Overwrite => {
                latest.insert(table.dimension, table.clone());
                let mut body = String::new();
                for t in latest.values() {
                    body.push_str(&t.to_string());
                    body.push('\n');
                }
                atomic_write(&self.path, body.as_bytes())
            }
            WriteMode::Append => {
                let mut file = OpenOptions::new().append(true).open(&self.path)?;
                writeln!(file, "{table}")?;
                Ok(())
            }
        }
    }
}

impl Reporter for TableFileReporter {
    fn checkpoint(&self, table: &ScalingTable) -> Result<(), ScalingError> {
        self.write(table)
    }
}

/// Replace `dest` with `bytes` through a temporary file in the same
/// directory.
fn atomic_write(dest: &Path, bytes: &[u8]) -> Result<(), ScalingError> {
    let dir = match dest.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.flush()?;
    tmp.persist(dest)
        .map_err(|e| ScalingError::Report(format!("{}: {}", dest.display(), e.error)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(dimension: usize, kind: EstimatorKind, rows: &[(f64, f64)]) -> ScalingTable {
        ScalingTable {
            kind,
            metric: Metric::Euclidean,
            dimension,
            components: 1,
            lags: dimension,
            points: 100,
            rows: rows
                .iter()
                .map(|&(scale, statistic)| ScaleRow {
                    scale,
                    statistic,
                    count: 1,
                    norm: 1,
                    references: 1,
                    frozen: false,
                    degenerate: false,
                    low_confidence: false,
                })
                .collect(),
            references_done: 100,
            references_total: 100,
            cancelled: false,
            saturated: false,
            degenerate: false,
        }
    }

    #[test]
    fn power_law_has_constant_local_slope() {
        let rows: Vec<(f64, f64)> = (1..6)
            .map(|b| {
                let r = 0.01 * 2f64.powi(b);
                (r, r * r)
            })
            .collect();
        let t = table(2, EstimatorKind::CorrelationSum, &rows);
        for s in t.local_slopes() {
            assert!((s.unwrap() - 2.0).abs() < 1e-9);
        }
        assert!((t.slope_between(0.0, 1.0).unwrap() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn renyi_slope_is_negated_entropy_derivative() {
        // H = -1.5 ln r
        let rows: Vec<(f64, f64)> = (1..5)
            .map(|b| {
                let r = 0.5f64.powi(b);
                (r, -1.5 * r.ln())
            })
            .collect();
        let t = table(1, EstimatorKind::Renyi, &rows);
        for s in t.local_slopes() {
            assert!((s.unwrap() - 1.5).abs() < 1e-9);
        }
        assert!((t.slope_between(0.0, 1.0).unwrap() - 1.5).abs() < 1e-9);
    }

    #[test]
    fn takens_and_smoothed_slopes_follow_a_power_law() {
        let rows: Vec<(f64, f64)> = (1..7)
            .map(|b| {
                let r = 0.01 * 1.5f64.powi(b);
                (r, 2.0 * r.powf(2.5))
            })
            .collect();
        let t = table(3, EstimatorKind::CorrelationSum, &rows);
        let takens = t.takens_estimator();
        assert_eq!(takens.len(), rows.len());
        for d in takens {
            assert!((d.unwrap() - 2.5).abs() < 1e-9);
        }
        for s in t.smoothed_local_slopes(2) {
            assert!((s.unwrap() - 2.5).abs() < 1e-9);
        }

        let renyi = table(3, EstimatorKind::Renyi, &rows);
        assert!(renyi.takens_estimator().iter().all(Option::is_none));
    }

    #[test]
    fn rendered_block_has_header_and_rows() {
        let text = table(3, EstimatorKind::CorrelationSum, &[(0.1, 0.01), (0.2, 0.04)]).to_string();
        assert!(text.starts_with("# m = 3 (c = 1, k = 3) correlation-sum euclidean"));
        assert!(text.contains("done"));
        assert_eq!(text.lines().count(), 4);
    }

    #[test]
    fn overwrite_keeps_latest_table_per_dimension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("d2.txt");
        let reporter = TableFileReporter::create(&path, WriteMode::Overwrite).unwrap();

        reporter
            .checkpoint(&table(1, EstimatorKind::CorrelationSum, &[(0.1, 0.5)]))
            .unwrap();
        reporter
            .checkpoint(&table(2, EstimatorKind::CorrelationSum, &[(0.1, 0.25)]))
            .unwrap();
        reporter
            .finish(&table(1, EstimatorKind::CorrelationSum, &[(0.1, 0.75)]))
            .unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text.matches("# m = ").count(), 2);
        assert!(text.contains("7.5000000e-1"));
        assert!(!text.contains("5.0000000e-1"));
        assert!(text.find("# m = 1").unwrap() < text.find("# m = 2").unwrap());
    }

    #[test]
    fn append_keeps_every_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("d2.txt");
        let reporter = TableFileReporter::create(&path, WriteMode::Append).unwrap();
        let t = table(1, EstimatorKind::FixedMass, &[(0.1, 0.5)]);
        reporter.checkpoint(&t).unwrap();
        reporter.finish(&t).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text.matches("# m = 1").count(), 2);
    }

    #[test]
    fn collector_separates_finals() {
        let c = CollectingReporter::new();
        let t = table(1, EstimatorKind::Renyi, &[(0.1, 0.5)]);
        c.checkpoint(&t).unwrap();
        c.finish(&t).unwrap();
        assert_eq!(c.snapshots().len(), 2);
        assert_eq!(c.finals(), vec![t]);
    }
}
