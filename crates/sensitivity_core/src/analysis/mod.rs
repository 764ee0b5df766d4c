//! Statistical analysis of batch results
//!
//! - `aggregate`: local sensitivity curves (mean, standard error, 95% CI)
//! - `sobol`: first- and total-order Sobol indices with bootstrap confidence
//! - `distribution`: KDE, histogram and normal Q-Q diagnostics
//! - `workflow`: the local, global and baseline passes end to end

mod aggregate;
mod distribution;
mod sobol;
pub mod stats;
mod workflow;

pub use aggregate::{AggregatedStatistic, aggregate};
pub use distribution::{
    DistributionSummary, Histogram, KernelDensity, QqPlot, qq_against_normal,
    summarize_distribution, summarize_distribution_with,
};
pub use sobol::{
    ReplicateReduction, SobolAnalysis, SobolIndices, SobolOptions, analyze_reporter,
    compute_indices, outputs_from_table,
};
pub use workflow::{
    BaselineDistribution, GlobalSensitivity, LocalSensitivity, ReporterDistribution,
    baseline_distribution, global_sensitivity, local_sensitivity,
};
