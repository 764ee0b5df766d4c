//! Sensitivity analysis engine for stochastic agent-based simulations
//!
//! This crate drives repeated runs of a seeded simulation across parameter
//! configurations and turns the results into sensitivity signals:
//! - Parameter spaces with integer and real bounds, validated on construction
//! - One-at-a-time sweeps and Saltelli designs over Sobol sequences
//! - A batch runner with a worker pool, per-run seeding, a hang watchdog and
//!   cooperative cancellation
//! - Local response curves (mean, standard error, 95% confidence interval)
//! - First- and total-order Sobol indices with bootstrap confidence values
//! - Baseline output diagnostics: kernel density, histogram, normal Q-Q
//!
//! # Example
//!
//! ```ignore
//! use sensitivity_core::{ParameterDescriptor, ParameterSpace, Reporter};
//! use sensitivity_core::analysis::local_sensitivity;
//!
//! let space = ParameterSpace::new([
//!     ParameterDescriptor::integer("team_size", 5.0, 25.0),
//!     ParameterDescriptor::real("prob_of_prosecution", 0.01, 0.99),
//! ])?;
//! let reporters = vec![
//!     Reporter::<Precinct>::count_in_state("Bribing", "cop", CopAction::Bribe),
//!     Reporter::<Precinct>::count_in_state("NoBribing", "cop", CopAction::NoBribe),
//! ];
//! let local = local_sensitivity(&reporters, &space, &defaults, &config.local, None)?;
//! let curve = local.curve("team_size", "Bribing")?;
//! ```

#![warn(clippy::all)]

// ============================================================================
// Core modules
// ============================================================================

pub mod analysis;
pub mod batch;
pub mod error;
pub mod metrics;
pub mod sampling;
pub mod simulation;

// ============================================================================
// Type definition modules
// ============================================================================

pub mod config;
pub mod model;

// ============================================================================
// Test modules
// ============================================================================

#[cfg(test)]
mod tests;

// ============================================================================
// Public re-exports for convenience
// ============================================================================

pub use analysis::{
    AggregatedStatistic, DistributionSummary, QqPlot, SobolIndices, aggregate, compute_indices,
    qq_against_normal, summarize_distribution,
};
pub use batch::{BatchProgress, BatchRunner};
pub use config::{
    BaselineConfig, BatchConfig, GlobalAnalysisConfig, LocalAnalysisConfig, SensitivityConfig,
};
pub use error::{AnalysisError, AssignmentError, ModelError, RunError, SpaceError};
pub use metrics::{RunMetrics, WatchdogConfig};
pub use model::{
    ParamValue, ParameterAssignment, ParameterDescriptor, ParameterSpace, ResultTable, RunResult,
};
pub use sampling::{JointDesign, joint_samples, sweep_samples};
pub use simulation::{Reporter, Simulation};
