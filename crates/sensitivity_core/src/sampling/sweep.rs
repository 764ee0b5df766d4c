//! One-at-a-time sweeps for local sensitivity analysis

use crate::error::{AnalysisError, Result};
use crate::model::{ParameterAssignment, ParameterDescriptor, ParameterSpace};

/// `count` evenly spaced values from `lower` to `upper`, both ends included
#[must_use]
pub fn linspace(lower: f64, upper: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![lower],
        _ => {
            let step = (upper - lower) / (count - 1) as f64;
            (0..count)
                .map(|i| {
                    // Pin the last point so the upper bound is hit exactly
                    if i == count - 1 {
                        upper
                    } else {
                        lower + step * i as f64
                    }
                })
                .collect()
        }
    }
}

/// Values taken by a swept parameter.
///
/// Integer parameters are rounded and deduplicated, so fewer than
/// `sample_count` values may come back.
#[must_use]
pub fn sweep_values(descriptor: &ParameterDescriptor, sample_count: usize) -> Vec<f64> {
    let mut values = linspace(descriptor.lower, descriptor.upper, sample_count);
    if descriptor.integer {
        for value in &mut values {
            *value = descriptor.round_to_integer(*value);
        }
        values.dedup();
    }
    values
}

/// Assignments for a sweep of `variable`, holding every other parameter at its
/// value in `defaults`. Ordered by ascending swept value.
pub fn sweep_samples(
    space: &ParameterSpace,
    defaults: &ParameterAssignment,
    variable: &str,
    sample_count: usize,
) -> Result<Vec<ParameterAssignment>> {
    if sample_count == 0 {
        return Err(AnalysisError::Config(
            "a sweep needs at least one sample".to_string(),
        ));
    }
    if !defaults.space().is_same(space) {
        return Err(AnalysisError::Config(
            "default assignment belongs to a different parameter space".to_string(),
        ));
    }
    let descriptor = space
        .descriptor(variable)
        .ok_or_else(|| AnalysisError::UnknownParameter(variable.to_string()))?;

    let values = sweep_values(descriptor, sample_count);
    if values.len() < sample_count {
        tracing::debug!(
            parameter = variable,
            requested = sample_count,
            distinct = values.len(),
            "integer rounding collapsed sweep values"
        );
    }

    values
        .into_iter()
        .map(|value| defaults.with_sample(variable, value).map_err(Into::into))
        .collect()
}
