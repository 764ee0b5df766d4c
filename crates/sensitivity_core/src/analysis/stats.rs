//! Small descriptive-statistics helpers shared by the analyzers

use statrs::distribution::{ContinuousCDF, Normal};

use crate::error::{AnalysisError, Result};

/// Two-sided 95% normal critical value used for local confidence intervals
pub const Z_95: f64 = 1.96;

/// Arithmetic mean. Returns NaN for an empty slice.
#[must_use]
pub fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Variance with `ddof` delta degrees of freedom (0 = population, 1 = sample).
///
/// Returns 0 when there are not more values than `ddof`.
#[must_use]
pub fn variance(values: &[f64], ddof: usize) -> f64 {
    if values.len() <= ddof {
        return 0.0;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    ss / (values.len() - ddof) as f64
}

#[must_use]
pub fn std_dev(values: &[f64], ddof: usize) -> f64 {
    variance(values, ddof).sqrt()
}

/// Percentile of an ascending slice with linear interpolation, `q` in `[0, 1]`
#[must_use]
pub fn percentile(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        n => {
            let pos = q.clamp(0.0, 1.0) * (n - 1) as f64;
            let lo = pos.floor() as usize;
            let hi = pos.ceil() as usize;
            sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
        }
    }
}

pub fn standard_normal() -> Result<Normal> {
    Normal::new(0.0, 1.0)
        .map_err(|e| AnalysisError::Config(format!("standard normal distribution: {e}")))
}

/// Two-sided critical value for a confidence level in `(0, 1)`
pub fn critical_value(confidence_level: f64) -> Result<f64> {
    if !(confidence_level > 0.0 && confidence_level < 1.0) {
        return Err(AnalysisError::Config(format!(
            "confidence level must lie in (0, 1), got {confidence_level}"
        )));
    }
    Ok(standard_normal()?.inverse_cdf(0.5 + confidence_level / 2.0))
}

/// Reject empty or non-finite samples
pub fn check_sample(values: &[f64]) -> Result<()> {
    if values.is_empty() {
        return Err(AnalysisError::EmptySample);
    }
    if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
        return Err(AnalysisError::Config(format!(
            "sample contains a non-finite value ({bad})"
        )));
    }
    Ok(())
}
