//! End-to-end analysis passes
//!
//! Each pass builds its own runner and result tables and hands them back to
//! the caller; nothing is kept between calls.

use serde::Serialize;

use crate::batch::{BatchProgress, BatchRunner};
use crate::config::{BaselineConfig, BatchConfig, GlobalAnalysisConfig, LocalAnalysisConfig};
use crate::error::{AnalysisError, Result};
use crate::model::{ParameterAssignment, ParameterSpace, ResultTable};
use crate::sampling::{JointDesign, joint_samples, sweep_samples};
use crate::simulation::{Reporter, Simulation};

use super::aggregate::{AggregatedStatistic, aggregate};
use super::distribution::{
    DistributionSummary, QqPlot, qq_against_normal, summarize_distribution_with,
};
use super::sobol::{SobolAnalysis, analyze_reporter};

fn runner<M: Simulation>(
    reporters: &[Reporter<M>],
    config: &BatchConfig,
    progress: Option<&BatchProgress>,
) -> Result<BatchRunner<M>> {
    let runner = BatchRunner::new(reporters.to_vec(), config.clone())?;
    Ok(match progress {
        Some(progress) => runner.with_progress(progress.clone()),
        None => runner,
    })
}

/// One sweep table per parameter, in space order
#[derive(Debug, Clone, Serialize)]
pub struct LocalSensitivity {
    tables: Vec<ResultTable>,
}

impl LocalSensitivity {
    #[must_use]
    pub fn tables(&self) -> &[ResultTable] {
        &self.tables
    }

    /// Sweep table for one parameter
    #[must_use]
    pub fn table(&self, parameter: &str) -> Option<&ResultTable> {
        self.tables.iter().find(|t| t.swept() == Some(parameter))
    }

    /// Response curve of `reporter` along `parameter`
    pub fn curve(&self, parameter: &str, reporter: &str) -> Result<Vec<AggregatedStatistic>> {
        let table = self
            .table(parameter)
            .ok_or_else(|| AnalysisError::UnknownParameter(parameter.to_string()))?;
        aggregate(table, parameter, reporter)
    }
}

/// Sweep every parameter in turn around `defaults`.
///
/// A cancelled run stops after the batch in flight; parameters not yet swept
/// have no table.
pub fn local_sensitivity<M: Simulation>(
    reporters: &[Reporter<M>],
    space: &ParameterSpace,
    defaults: &ParameterAssignment,
    config: &LocalAnalysisConfig,
    progress: Option<&BatchProgress>,
) -> Result<LocalSensitivity> {
    let runner = runner(reporters, &config.batch, progress)?;

    let mut tables = Vec::with_capacity(space.len());
    for name in space.names() {
        if progress.is_some_and(BatchProgress::is_cancelled) {
            tracing::warn!(parameter = name, "local analysis cancelled before sweep");
            break;
        }
        let samples = sweep_samples(space, defaults, name, config.distinct_samples)?;
        tracing::info!(parameter = name, values = samples.len(), "sweeping parameter");
        tables.push(runner.run_sweep(space, name, &samples)?);
    }

    Ok(LocalSensitivity { tables })
}

/// Saltelli design, its batch, and Sobol indices for every reporter
#[derive(Debug, Clone, Serialize)]
pub struct GlobalSensitivity {
    pub design: JointDesign,
    pub table: ResultTable,
    pub analyses: Vec<SobolAnalysis>,
}

impl GlobalSensitivity {
    #[must_use]
    pub fn analysis(&self, reporter: &str) -> Option<&SobolAnalysis> {
        self.analyses.iter().find(|a| a.reporter == reporter)
    }
}

/// Run every design point `replicates` times and compute Sobol indices.
///
/// Fails with `IncompleteGroup` if the batch was cancelled before every point
/// collected all its replicates.
pub fn global_sensitivity<M: Simulation>(
    reporters: &[Reporter<M>],
    space: &ParameterSpace,
    config: &GlobalAnalysisConfig,
    progress: Option<&BatchProgress>,
) -> Result<GlobalSensitivity> {
    let runner = runner(reporters, &config.batch, progress)?;
    let design = joint_samples(space, config.base_samples)?;
    let table = runner.run_design(&design)?;
    table.ensure_complete()?;

    let options = config.sobol_options();
    let analyses = table
        .reporters()
        .iter()
        .map(|reporter| analyze_reporter(&design, &table, reporter, config.reduction, &options))
        .collect::<Result<Vec<_>>>()?;

    Ok(GlobalSensitivity {
        design,
        table,
        analyses,
    })
}

/// Output distribution of one reporter at the baseline configuration
#[derive(Debug, Clone, Serialize)]
pub struct ReporterDistribution {
    pub reporter: String,
    pub values: Vec<f64>,
    pub summary: DistributionSummary,
    pub qq: QqPlot,
}

#[derive(Debug, Clone, Serialize)]
pub struct BaselineDistribution {
    pub table: ResultTable,
    pub reporters: Vec<ReporterDistribution>,
}

impl BaselineDistribution {
    #[must_use]
    pub fn reporter(&self, name: &str) -> Option<&ReporterDistribution> {
        self.reporters.iter().find(|r| r.reporter == name)
    }
}

/// Run the baseline configuration repeatedly and describe each reporter's
/// output distribution
pub fn baseline_distribution<M: Simulation>(
    reporters: &[Reporter<M>],
    defaults: &ParameterAssignment,
    config: &BaselineConfig,
    progress: Option<&BatchProgress>,
) -> Result<BaselineDistribution> {
    let runner = runner(reporters, &config.batch, progress)?;
    let table = runner.run_fixed(defaults)?;
    table.ensure_complete()?;

    let mut distributions = Vec::with_capacity(table.reporters().len());
    for reporter in table.reporters() {
        let values = table.values(reporter)?;
        let summary =
            summarize_distribution_with(&values, config.histogram_bins, config.kde_grid_points)?;
        let qq = qq_against_normal(&values)?;
        distributions.push(ReporterDistribution {
            reporter: reporter.clone(),
            values,
            summary,
            qq,
        });
    }

    Ok(BaselineDistribution {
        table,
        reporters: distributions,
    })
}
