//! Global sensitivity: first- and total-order Sobol indices
//!
//! Estimators over a Saltelli design (see `sampling::joint_samples`):
//!
//! - first order: `S1_j = mean(f(B) * (f(AB_j) - f(A))) / Var[f(A), f(B)]`
//! - total order: `ST_j = mean((f(A) - f(AB_j))^2) / (2 Var[f(A), f(B)])`
//!
//! Outputs are standardized before estimation. Confidence values are the
//! bootstrap standard deviation of each estimate scaled by the normal critical
//! value of the requested level.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};
use crate::model::ResultTable;
use crate::sampling::JointDesign;

use super::stats::{critical_value, mean, std_dev, variance};

/// How replicate outputs of one design point are turned into estimator input
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplicateReduction {
    /// Each replicate pass over the design contributes its own blocks
    #[default]
    Stacked,
    /// Replicates of a design point are averaged first
    Mean,
}

/// Bootstrap settings for index confidence values
#[derive(Debug, Clone, PartialEq)]
pub struct SobolOptions {
    pub bootstrap_resamples: usize,
    pub confidence_level: f64,
    /// Seed for resampling; drawn at random when unset
    pub seed: Option<u64>,
}

impl Default for SobolOptions {
    fn default() -> Self {
        Self {
            bootstrap_resamples: 100,
            confidence_level: 0.95,
            seed: None,
        }
    }
}

/// Sensitivity of the output to one parameter
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SobolIndices {
    pub parameter: String,
    pub first_order: f64,
    pub first_order_conf: f64,
    pub total_order: f64,
    pub total_order_conf: f64,
}

/// Indices for one reporter together with the output vector they came from
#[derive(Debug, Clone, Serialize)]
pub struct SobolAnalysis {
    pub reporter: String,
    pub indices: Vec<SobolIndices>,
    pub outputs: Vec<f64>,
}

impl SobolAnalysis {
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&SobolIndices> {
        self.indices.iter().find(|i| i.parameter == name)
    }
}

/// Compute first- and total-order indices for every parameter of the design.
///
/// `outputs` must hold one value per design point, or a whole multiple of the
/// design length laid out replicate-major (as produced by
/// `ReplicateReduction::Stacked`).
pub fn compute_indices(
    design: &JointDesign,
    outputs: &[f64],
    options: &SobolOptions,
) -> Result<Vec<SobolIndices>> {
    if design.is_empty() || outputs.is_empty() || outputs.len() % design.len() != 0 {
        return Err(AnalysisError::Config(format!(
            "expected a multiple of {} outputs, got {}",
            design.len(),
            outputs.len()
        )));
    }
    if outputs.iter().any(|v| !v.is_finite()) {
        return Err(AnalysisError::Config(
            "Sobol outputs must be finite".to_string(),
        ));
    }
    if options.bootstrap_resamples < 2 {
        return Err(AnalysisError::Config(
            "at least two bootstrap resamples are required".to_string(),
        ));
    }
    let z = critical_value(options.confidence_level)?;

    let y_mean = mean(outputs);
    let y_std = std_dev(outputs, 0);
    if y_std == 0.0 {
        return Err(AnalysisError::ZeroVariance {
            reporter: "output".to_string(),
        });
    }
    let y: Vec<f64> = outputs.iter().map(|v| (v - y_mean) / y_std).collect();

    let d = design.space().len();
    let blocks = Blocks::new(&y, d);
    let all: Vec<usize> = (0..blocks.len()).collect();

    let seed = options.seed.unwrap_or_else(rand::random);
    let mut rng = StdRng::seed_from_u64(seed);
    let resamples: Vec<Vec<usize>> = (0..options.bootstrap_resamples)
        .map(|_| {
            (0..blocks.len())
                .map(|_| rng.random_range(0..blocks.len()))
                .collect()
        })
        .collect();

    let mut indices = Vec::with_capacity(d);
    for (j, descriptor) in design.space().descriptors().iter().enumerate() {
        let (first_order, total_order) = blocks.estimate(j, &all);
        if !first_order.is_finite() || !total_order.is_finite() {
            return Err(AnalysisError::ZeroVariance {
                reporter: "output".to_string(),
            });
        }

        let (s1_boot, st_boot): (Vec<f64>, Vec<f64>) = resamples
            .iter()
            .map(|sample| blocks.estimate(j, sample))
            .filter(|(s1, st)| s1.is_finite() && st.is_finite())
            .unzip();

        indices.push(SobolIndices {
            parameter: descriptor.name.clone(),
            first_order,
            first_order_conf: z * std_dev(&s1_boot, 1),
            total_order,
            total_order_conf: z * std_dev(&st_boot, 1),
        });
    }

    tracing::debug!(
        blocks = blocks.len(),
        parameters = d,
        seed,
        "computed Sobol indices"
    );
    Ok(indices)
}

/// Standardized outputs viewed as Saltelli blocks of `D + 2` rows
struct Blocks<'a> {
    y: &'a [f64],
    d: usize,
}

impl<'a> Blocks<'a> {
    fn new(y: &'a [f64], d: usize) -> Self {
        Self { y, d }
    }

    fn len(&self) -> usize {
        self.y.len() / (self.d + 2)
    }

    fn a(&self, block: usize) -> f64 {
        self.y[block * (self.d + 2)]
    }

    fn ab(&self, block: usize, j: usize) -> f64 {
        self.y[block * (self.d + 2) + 1 + j]
    }

    fn b(&self, block: usize) -> f64 {
        self.y[block * (self.d + 2) + self.d + 1]
    }

    /// `(first order, total order)` for parameter `j` over the chosen blocks
    fn estimate(&self, j: usize, sample: &[usize]) -> (f64, f64) {
        let n = sample.len() as f64;
        let ab_values: Vec<f64> = sample
            .iter()
            .flat_map(|&k| [self.a(k), self.b(k)])
            .collect();
        let var = variance(&ab_values, 0);
        if var == 0.0 {
            return (f64::NAN, f64::NAN);
        }

        let mut first = 0.0;
        let mut total = 0.0;
        for &k in sample {
            let (a, ab, b) = (self.a(k), self.ab(k, j), self.b(k));
            first += b * (ab - a);
            total += (a - ab).powi(2);
        }
        (first / n / var, 0.5 * total / n / var)
    }
}

/// Extract estimator input for `reporter` from a completed design batch
pub fn outputs_from_table(
    design: &JointDesign,
    table: &ResultTable,
    reporter: &str,
    reduction: ReplicateReduction,
) -> Result<Vec<f64>> {
    if table.design_points() != design.len() {
        return Err(AnalysisError::Config(format!(
            "result table covers {} design points, design has {}",
            table.design_points(),
            design.len()
        )));
    }
    table.ensure_complete()?;
    let reporter_idx = table.reporter_index(reporter)?;
    let replicates = table.replicates_requested();

    let n = design.len();
    let mut grid: Vec<Option<f64>> = vec![None; n * replicates];
    for run in table.runs() {
        if run.replicate < replicates && run.design_point < n {
            grid[run.replicate * n + run.design_point] = Some(run.reporter_values[reporter_idx]);
        }
    }
    // Counts can be complete while replicate indices repeat
    if let Some(missing) = grid.iter().position(Option::is_none) {
        let point = missing % n;
        let completed = (0..replicates)
            .filter(|r| grid[r * n + point].is_some())
            .count();
        return Err(AnalysisError::IncompleteGroup {
            group: format!("design point {point}"),
            completed,
            requested: replicates,
        });
    }
    let stacked: Vec<f64> = grid.into_iter().flatten().collect();

    Ok(match reduction {
        ReplicateReduction::Stacked => stacked,
        ReplicateReduction::Mean => (0..design.len())
            .map(|point| {
                let values: Vec<f64> = (0..replicates).map(|r| stacked[r * n + point]).collect();
                mean(&values)
            })
            .collect(),
    })
}

/// Sobol analysis of one reporter from a completed design batch
pub fn analyze_reporter(
    design: &JointDesign,
    table: &ResultTable,
    reporter: &str,
    reduction: ReplicateReduction,
    options: &SobolOptions,
) -> Result<SobolAnalysis> {
    let outputs = outputs_from_table(design, table, reporter, reduction)?;
    let indices = compute_indices(design, &outputs, options).map_err(|e| match e {
        AnalysisError::ZeroVariance { .. } => AnalysisError::ZeroVariance {
            reporter: reporter.to_string(),
        },
        other => other,
    })?;
    Ok(SobolAnalysis {
        reporter: reporter.to_string(),
        indices,
        outputs,
    })
}
