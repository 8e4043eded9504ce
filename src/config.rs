//! TOML scan configuration.
//!
//! A configuration file describes a complete scan: where the data come
//! from, the embedding and scale options, the estimator and where tables
//! are written. Every section and key is optional.
//!
//! ```toml
//! estimator = "correlation-sum"   # or "fixed-mass", "renyi"
//!
//! [input]
//! path = "series.dat"
//! skip_rows = 0
//! columns = [1]
//!
//! [embedding]
//! min_dim = 1
//! max_dim = 8
//! delay = 2
//! theiler = 20
//! metric = "maximum"
//!
//! [scales]
//! min = 0.001
//! max = 1.0
//! count = 60
//! max_pairs = 1000        # 0 = unlimited
//!
//! [output]
//! path = "d2.txt"
//! mode = "overwrite"      # or "append"
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::info;

use crate::algorithms::embedding::resolve_columns;
use crate::algorithms::grid::GridLimits;
use crate::api::{Adapter, ScalingBuilder};
use crate::engine::executor::RunSummary;
use crate::engine::output::{NullReporter, Reporter, TableFileReporter, WriteMode};
use crate::input::{read_file, ReadOptions};
use crate::math::metric::Metric;
use crate::primitives::errors::ScalingError;
use crate::primitives::sample::Sample;

/// Estimator selected by a configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EstimatorChoice {
    /// Correlation sums.
    #[default]
    CorrelationSum,

    /// Fixed-mass radii.
    FixedMass,

    /// Renyi entropies.
    Renyi,
}

/// `[input]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InputSection {
    /// Data file; required for [`EngineConfig::run`].
    pub path: Option<PathBuf>,
    /// Data lines skipped at the top.
    pub skip_rows: usize,
    /// Columns to read (all when empty).
    pub columns: Vec<usize>,
    /// Maximum rows read.
    pub max_rows: Option<usize>,
}

/// `[embedding]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EmbeddingSection {
    /// Smallest embedding dimension reported.
    pub min_dim: Option<usize>,
    /// Largest embedding dimension reported.
    pub max_dim: Option<usize>,
    /// Signal components per lag; above 1 selects the mixed schedule.
    pub components: Option<usize>,
    /// Delay between lags, in samples.
    pub delay: Option<usize>,
    /// Theiler window.
    pub theiler: Option<usize>,
    /// `"euclidean"` or `"maximum"`.
    pub metric: Option<Metric>,
    /// Rescale every column to [0, 1] before embedding.
    pub normalize: Option<bool>,
}

/// `[scales]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScalesSection {
    /// Smallest length scale.
    pub min: Option<f64>,
    /// Largest length scale.
    pub max: Option<f64>,
    /// Number of log-spaced scales.
    pub count: Option<usize>,
    /// Explicit scales; overrides `min`, `max` and `count`.
    pub values: Option<Vec<f64>>,
    /// Pair cap per scale, `0` = unlimited.
    pub max_pairs: Option<u64>,
}

/// `[references]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReferencesSection {
    /// Random subset size; all points when absent.
    pub count: Option<usize>,
    /// Seed of the random subset.
    pub seed: Option<u64>,
}

/// `[scheduler]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SchedulerSection {
    /// Soft checkpoint interval in seconds.
    pub checkpoint_secs: Option<f64>,
    /// Reference points per batch.
    pub batch_size: Option<usize>,
    /// Run batches and dimensions in parallel.
    pub parallel: Option<bool>,
}

/// `[grid]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GridSection {
    /// Occupied-cell limit before the grid is coarsened.
    pub cell_budget: Option<usize>,
    /// Coarsening attempts before a dimension fails.
    pub coarsen_retries: Option<usize>,
}

/// `[fixed_mass]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FixedMassSection {
    /// Smallest neighbor-count target.
    pub min_neighbors: Option<usize>,
    /// Largest neighbor-count target.
    pub max_neighbors: Option<usize>,
    /// Number of neighbor-count targets.
    pub mass_count: Option<usize>,
}

/// `[renyi]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenyiSection {
    /// Order `Q` of the entropies.
    pub order: Option<f64>,
}

/// `[output]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputSection {
    /// Table file; tables are only returned when absent.
    pub path: Option<PathBuf>,
    /// Overwrite or append snapshots.
    pub mode: WriteMode,
}

/// A complete scan configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Estimator to run.
    pub estimator: EstimatorChoice,
    /// Data file and column selection.
    pub input: InputSection,
    /// Embedding options.
    pub embedding: EmbeddingSection,
    /// Scale ladder and pair cap.
    pub scales: ScalesSection,
    /// Reference-point subset.
    pub references: ReferencesSection,
    /// Checkpoints and parallelism.
    pub scheduler: SchedulerSection,
    /// Spatial index limits.
    pub grid: GridSection,
    /// Fixed-mass targets.
    pub fixed_mass: FixedMassSection,
    /// Renyi order.
    pub renyi: RenyiSection,
    /// Table file.
    pub output: OutputSection,
}

impl EngineConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ScalingError> {
        toml::from_str(text).map_err(|e| ScalingError::ConfigFile(e.to_string()))
    }

    /// Load a configuration file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ScalingError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| ScalingError::ConfigFile(format!("reading {}: {e}", path.display())))?;
        Self::from_toml_str(&text)
            .map_err(|e| ScalingError::ConfigFile(format!("parsing {}: {e}", path.display())))
    }

    /// Builder carrying every option set in the file.
    pub fn builder(&self) -> Result<ScalingBuilder, ScalingError> {
        let mut b = ScalingBuilder::new();
        let e = &self.embedding;

        if e.min_dim.is_some() || e.max_dim.is_some() {
            let min = e.min_dim.unwrap_or(1);
            b = b.dimensions(min, e.max_dim.unwrap_or(min.max(10)));
        }
        if let Some(v) = e.components {
            b = b.components(v);
        }
        if let Some(v) = e.delay {
            b = b.delay(v);
        }
        if let Some(v) = e.theiler {
            b = b.theiler(v);
        }
        if let Some(v) = e.metric {
            b = b.metric(v);
        }
        if let Some(v) = e.normalize {
            b = b.normalize(v);
        }
        let read = self.file_columns();
        if !read.is_empty() {
            // Columns are picked by the reader, so the sample is already in order.
            b = b.columns((0..read.len()).collect());
        }

        let s = &self.scales;
        if let Some(values) = &s.values {
            b = b.scales(values.clone());
        } else if let (Some(min), Some(max), Some(count)) = (s.min, s.max, s.count) {
            b = b.log_scales(min, max, count);
        } else if s.min.is_some() || s.max.is_some() || s.count.is_some() {
            return Err(ScalingError::ConfigFile(
                "[scales] needs all of min, max and count, or values".into(),
            ));
        }
        match s.max_pairs {
            Some(0) => b = b.unlimited_pairs(),
            Some(n) => b = b.max_pairs(n),
            None => {}
        }

        if let Some(n) = self.references.count {
            b = b.reference_points(n);
        }
        if let Some(seed) = self.references.seed {
            b = b.seed(seed);
        }

        let sch = &self.scheduler;
        if let Some(secs) = sch.checkpoint_secs {
            let interval = Duration::try_from_secs_f64(secs).map_err(|_| {
                ScalingError::config("checkpoint_secs", secs, "must be finite and >= 0")
            })?;
            b = b.checkpoint_interval(interval);
        }
        if let Some(v) = sch.batch_size {
            b = b.batch_size(v);
        }
        if let Some(v) = sch.parallel {
            b = b.parallel(v);
        }

        if self.grid.cell_budget.is_some() || self.grid.coarsen_retries.is_some() {
            let d = GridLimits::default();
            b = b.grid_limits(GridLimits {
                cell_budget: self.grid.cell_budget.unwrap_or(d.cell_budget),
                coarsen_retries: self.grid.coarsen_retries.unwrap_or(d.coarsen_retries),
            });
        }

        let fm = &self.fixed_mass;
        if fm.min_neighbors.is_some() || fm.max_neighbors.is_some() {
            let min = fm.min_neighbors.unwrap_or(1);
            b = b.neighbors(min, fm.max_neighbors.unwrap_or(min.max(100)));
        }
        if let Some(v) = fm.mass_count {
            b = b.mass_count(v);
        }
        if let Some(q) = self.renyi.order {
            b = b.order(q);
        }
        Ok(b)
    }

    /// File columns to read: the `[input]` selection, filled upward from
    /// its largest entry when fewer than `components` are listed.
    fn file_columns(&self) -> Vec<usize> {
        let selection = &self.input.columns;
        if selection.is_empty() {
            return Vec::new();
        }
        let width = self.embedding.components.unwrap_or(1).max(selection.len());
        resolve_columns(selection, width)
    }

    /// Read options of the `[input]` section.
    pub fn read_options(&self) -> ReadOptions {
        ReadOptions {
            skip_rows: self.input.skip_rows,
            columns: self.file_columns(),
            max_rows: self.input.max_rows,
        }
    }

    /// Run the configured scan on `sample`, writing tables if an output
    /// path is configured.
    pub fn run_sample(&self, sample: &Sample<f64>) -> Result<RunSummary, ScalingError> {
        let builder = self.builder()?;
        let file_reporter = match &self.output.path {
            Some(path) => Some(TableFileReporter::create(path, self.output.mode)?),
            None => None,
        };
        let reporter: &dyn Reporter = match &file_reporter {
            Some(r) => r,
            None => &NullReporter,
        };

        match self.estimator {
            EstimatorChoice::CorrelationSum => builder
                .adapter(Adapter::CorrelationSum)
                .build()?
                .run(sample, reporter),
            EstimatorChoice::FixedMass => builder
                .adapter(Adapter::FixedMass)
                .build()?
                .run(sample, reporter),
            EstimatorChoice::Renyi => builder
                .adapter(Adapter::Renyi)
                .build()?
                .run(sample, reporter),
        }
    }

    /// Read the configured input file and run the scan.
    pub fn run(&self) -> Result<RunSummary, ScalingError> {
        let path = self.input.path.as_ref().ok_or_else(|| {
            ScalingError::config("input.path", "<missing>", "a data file is required")
        })?;
        let sample = read_file(path, &self.read_options())?;
        info!(path = %path.display(), rows = sample.len(), width = sample.width(), "loaded input");
        self.run_sample(&sample)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_file() {
        let cfg = EngineConfig::from_toml_str(
            r#"
            estimator = "fixed-mass"
            [embedding]
            max_dim = 4
            metric = "maximum"
            [scales]
            max_pairs = 0
            [references]
            count = 100
            seed = 9
            [fixed_mass]
            min_neighbors = 2
            max_neighbors = 32
            [output]
            mode = "append"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.estimator, EstimatorChoice::FixedMass);
        assert_eq!(cfg.output.mode, WriteMode::Append);

        let b = cfg.builder().unwrap();
        assert_eq!(b.dimensions, Some((1, 4)));
        assert_eq!(b.metric, Some(Metric::Maximum));
        assert_eq!(b.max_pairs, Some(None));
        assert_eq!(b.seed, Some(9));
        assert_eq!(b.neighbors, Some((2, 32)));
    }

    #[test]
    fn unknown_keys_and_partial_scales_are_rejected() {
        assert!(matches!(
            EngineConfig::from_toml_str("[embedding]\ndimension = 3\n"),
            Err(ScalingError::ConfigFile(_))
        ));
        let cfg = EngineConfig::from_toml_str("[scales]\nmin = 0.1\n").unwrap();
        assert!(cfg.builder().is_err());
    }

    #[test]
    fn empty_file_is_all_defaults() {
        let cfg = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(cfg.estimator, EstimatorChoice::CorrelationSum);
        assert!(cfg.builder().unwrap().dimensions.is_none());
        assert!(cfg.run().is_err());
    }

    #[test]
    fn short_column_selection_is_filled_for_the_reader() {
        let cfg = EngineConfig::from_toml_str(
            "[input]\ncolumns = [1]\n[embedding]\ncomponents = 2\n",
        )
        .unwrap();
        assert_eq!(cfg.read_options().columns, vec![1, 2]);
        assert_eq!(cfg.builder().unwrap().columns, Some(vec![0, 1]));

        let cfg = EngineConfig::from_toml_str("[input]\ncolumns = [3, 0]\n").unwrap();
        assert_eq!(cfg.read_options().columns, vec![3, 0]);
    }
}
