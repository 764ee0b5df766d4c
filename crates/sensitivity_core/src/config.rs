//! Configuration types for batch execution and the three analysis passes.
//!
//! Every struct deserializes with defaults for omitted fields, so a partial
//! JSON (or any serde format) document is enough to override one knob.

use serde::{Deserialize, Serialize};

use crate::analysis::{ReplicateReduction, SobolOptions};
use crate::error::{AnalysisError, Result};
use crate::metrics::WatchdogConfig;

fn default_replicates() -> usize {
    20
}

fn default_max_steps() -> usize {
    130
}

fn default_parallel_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

fn default_watchdog() -> Option<WatchdogConfig> {
    Some(WatchdogConfig::default())
}

/// How a batch of runs is executed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Independent runs per assignment
    #[serde(default = "default_replicates")]
    pub replicates: usize,
    /// Step budget per run
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
    /// Base seed for the batch. A random seed is drawn (and logged) when unset.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Number of worker threads when the `parallel` feature is enabled
    #[serde(default = "default_parallel_workers")]
    pub parallel_workers: usize,
    /// Wall-clock budget per run; `null` disables hang detection
    #[serde(default = "default_watchdog")]
    pub watchdog: Option<WatchdogConfig>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            replicates: default_replicates(),
            max_steps: default_max_steps(),
            seed: None,
            parallel_workers: default_parallel_workers(),
            watchdog: default_watchdog(),
        }
    }
}

impl BatchConfig {
    #[must_use]
    pub fn with_replicates(mut self, replicates: usize) -> Self {
        self.replicates = replicates;
        self
    }

    #[must_use]
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    #[must_use]
    pub fn with_parallel_workers(mut self, workers: usize) -> Self {
        self.parallel_workers = workers;
        self
    }

    #[must_use]
    pub fn with_watchdog(mut self, watchdog: WatchdogConfig) -> Self {
        self.watchdog = Some(watchdog);
        self
    }

    /// Let runs take as long as they need
    #[must_use]
    pub fn without_watchdog(mut self) -> Self {
        self.watchdog = None;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.replicates == 0 {
            return Err(AnalysisError::Config(
                "replicates must be at least 1".to_string(),
            ));
        }
        if self.max_steps == 0 {
            return Err(AnalysisError::Config(
                "max_steps must be at least 1".to_string(),
            ));
        }
        if self.parallel_workers == 0 {
            return Err(AnalysisError::Config(
                "parallel_workers must be at least 1".to_string(),
            ));
        }
        if let Some(watchdog) = &self.watchdog {
            watchdog.validate()?;
        }
        Ok(())
    }
}

fn default_distinct_samples() -> usize {
    15
}

/// One-at-a-time sweep of every parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalAnalysisConfig {
    /// Sweep values per parameter (before integer deduplication)
    #[serde(default = "default_distinct_samples")]
    pub distinct_samples: usize,
    #[serde(default)]
    pub batch: BatchConfig,
}

impl Default for LocalAnalysisConfig {
    fn default() -> Self {
        Self {
            distinct_samples: default_distinct_samples(),
            batch: BatchConfig::default(),
        }
    }
}

fn default_base_samples() -> usize {
    10
}

fn default_global_batch() -> BatchConfig {
    BatchConfig::default().with_replicates(10)
}

fn default_bootstrap_resamples() -> usize {
    100
}

fn default_confidence_level() -> f64 {
    0.95
}

/// Saltelli design plus Sobol index estimation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalAnalysisConfig {
    /// Base rows `N` of the Saltelli design
    #[serde(default = "default_base_samples")]
    pub base_samples: usize,
    #[serde(default = "default_global_batch")]
    pub batch: BatchConfig,
    #[serde(default = "default_bootstrap_resamples")]
    pub bootstrap_resamples: usize,
    #[serde(default = "default_confidence_level")]
    pub confidence_level: f64,
    #[serde(default)]
    pub reduction: ReplicateReduction,
    /// Seed for bootstrap resampling
    #[serde(default)]
    pub bootstrap_seed: Option<u64>,
}

impl Default for GlobalAnalysisConfig {
    fn default() -> Self {
        Self {
            base_samples: default_base_samples(),
            batch: default_global_batch(),
            bootstrap_resamples: default_bootstrap_resamples(),
            confidence_level: default_confidence_level(),
            reduction: ReplicateReduction::default(),
            bootstrap_seed: None,
        }
    }
}

impl GlobalAnalysisConfig {
    #[must_use]
    pub fn sobol_options(&self) -> SobolOptions {
        SobolOptions {
            bootstrap_resamples: self.bootstrap_resamples,
            confidence_level: self.confidence_level,
            seed: self.bootstrap_seed,
        }
    }
}

fn default_baseline_batch() -> BatchConfig {
    BatchConfig::default().with_replicates(120)
}

fn default_histogram_bins() -> usize {
    20
}

fn default_kde_grid_points() -> usize {
    512
}

/// Output distribution at the default configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineConfig {
    #[serde(default = "default_baseline_batch")]
    pub batch: BatchConfig,
    #[serde(default = "default_histogram_bins")]
    pub histogram_bins: usize,
    #[serde(default = "default_kde_grid_points")]
    pub kde_grid_points: usize,
}

impl Default for BaselineConfig {
    fn default() -> Self {
        Self {
            batch: default_baseline_batch(),
            histogram_bins: default_histogram_bins(),
            kde_grid_points: default_kde_grid_points(),
        }
    }
}

/// Settings for a full analysis session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SensitivityConfig {
    #[serde(default)]
    pub local: LocalAnalysisConfig,
    #[serde(default)]
    pub global: GlobalAnalysisConfig,
    #[serde(default)]
    pub baseline: BaselineConfig,
}
