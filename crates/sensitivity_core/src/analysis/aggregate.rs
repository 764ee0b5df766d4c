//! Local sensitivity: per-value summary statistics of a one-parameter sweep

use rustc_hash::FxHashSet;
use serde::Serialize;

use crate::error::{AnalysisError, Result};
use crate::model::ResultTable;

use super::stats::{Z_95, mean, std_dev};

/// Summary of one reporter at one value of the swept parameter
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedStatistic {
    pub parameter_value: f64,
    pub mean: f64,
    /// Sample standard deviation over `sqrt(sample_count)`; zero for a single run
    pub standard_error: f64,
    /// `mean ± 1.96 × standard_error`
    pub confidence_interval: (f64, f64),
    pub sample_count: usize,
}

impl AggregatedStatistic {
    fn from_values(parameter_value: f64, values: &[f64]) -> Self {
        let n = values.len();
        let mean = mean(values);
        let standard_error = if n > 1 {
            std_dev(values, 1) / (n as f64).sqrt()
        } else {
            0.0
        };
        let half_width = Z_95 * standard_error;
        Self {
            parameter_value,
            mean,
            standard_error,
            confidence_interval: (mean - half_width, mean + half_width),
            sample_count: n,
        }
    }

    /// Width of the confidence interval
    #[must_use]
    pub fn interval_width(&self) -> f64 {
        self.confidence_interval.1 - self.confidence_interval.0
    }
}

/// Group the table by the value of `group_by` and summarize `reporter`.
///
/// Output is ordered by ascending parameter value and does not depend on the
/// order of runs in the table. Values whose group contains runs from an
/// incomplete replicate set are omitted with a warning.
pub fn aggregate(
    table: &ResultTable,
    group_by: &str,
    reporter: &str,
) -> Result<Vec<AggregatedStatistic>> {
    let param_idx = table
        .space()
        .index_of(group_by)
        .ok_or_else(|| AnalysisError::UnknownParameter(group_by.to_string()))?;
    let reporter_idx = table.reporter_index(reporter)?;

    let incomplete: FxHashSet<usize> = table
        .incomplete_groups()
        .iter()
        .map(|g| g.design_point)
        .collect();

    let mut rows: Vec<(f64, f64, usize)> = table
        .runs()
        .iter()
        .map(|run| {
            let value = run
                .assignment
                .value_at(param_idx)
                .map_or(f64::NAN, |v| v.as_f64());
            (value, run.reporter_values[reporter_idx], run.design_point)
        })
        .collect();
    // Sorting by value then output fixes the summation order
    rows.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1)));

    let mut stats = Vec::new();
    for group in rows.chunk_by(|a, b| a.0 == b.0) {
        let value = group[0].0;
        if group.iter().any(|row| incomplete.contains(&row.2)) {
            tracing::warn!(
                parameter = group_by,
                value,
                reporter,
                "omitting value with an incomplete replicate set"
            );
            continue;
        }
        let outputs: Vec<f64> = group.iter().map(|row| row.1).collect();
        stats.push(AggregatedStatistic::from_values(value, &outputs));
    }

    Ok(stats)
}
