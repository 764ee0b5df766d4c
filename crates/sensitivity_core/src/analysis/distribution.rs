//! Distribution diagnostics for fixed-configuration output samples
//!
//! A Gaussian kernel density estimate (normal-reference bandwidth), a histogram
//! with evenly spaced bins, and a normal Q-Q comparison.

use serde::Serialize;
use statrs::distribution::ContinuousCDF;

use crate::error::{AnalysisError, Result};
use crate::sampling::linspace;

use super::stats::{check_sample, mean, percentile, standard_normal, std_dev};

const DEFAULT_BINS: usize = 20;
const DEFAULT_GRID_POINTS: usize = 512;
/// Bandwidths the KDE support extends past the sample range
const KDE_CUT: f64 = 3.0;

/// Kernel density estimate evaluated on an even grid
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KernelDensity {
    pub support: Vec<f64>,
    pub density: Vec<f64>,
    pub bandwidth: f64,
}

impl KernelDensity {
    /// Trapezoidal integral of the density over its support
    #[must_use]
    pub fn integral(&self) -> f64 {
        trapezoid(&self.support, &self.density)
    }
}

/// Counts per bin; `edges` has one more entry than `counts`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

impl Histogram {
    /// Per-bin density: the bars integrate to 1
    #[must_use]
    pub fn density(&self) -> Vec<f64> {
        let total: usize = self.counts.iter().sum();
        self.counts
            .iter()
            .zip(self.edges.windows(2))
            .map(|(&count, edge)| count as f64 / (total as f64 * (edge[1] - edge[0])))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistributionSummary {
    pub kde: KernelDensity,
    pub histogram: Histogram,
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation
    pub std_dev: f64,
}

/// Standard normal Q-Q comparison with its standardized reference line
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QqPlot {
    /// `(theoretical quantile, sample quantile)`, ascending
    pub points: Vec<(f64, f64)>,
    /// Reference line `sample = intercept + slope * theoretical`
    pub intercept: f64,
    pub slope: f64,
}

/// KDE and histogram with 20 bins on a 512-point grid
pub fn summarize_distribution(values: &[f64]) -> Result<DistributionSummary> {
    summarize_distribution_with(values, DEFAULT_BINS, DEFAULT_GRID_POINTS)
}

pub fn summarize_distribution_with(
    values: &[f64],
    bins: usize,
    grid_points: usize,
) -> Result<DistributionSummary> {
    check_sample(values)?;
    if bins == 0 {
        return Err(AnalysisError::Config(
            "histogram needs at least one bin".to_string(),
        ));
    }
    if grid_points < 2 {
        return Err(AnalysisError::Config(
            "density grid needs at least two points".to_string(),
        ));
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    Ok(DistributionSummary {
        kde: kernel_density(&sorted, grid_points),
        histogram: histogram(&sorted, bins),
        count: values.len(),
        mean: mean(values),
        std_dev: std_dev(values, 1),
    })
}

/// Silverman-style normal reference bandwidth:
/// `1.059 * min(std, IQR / 1.349) * n^(-1/5)`
fn bandwidth(sorted: &[f64]) -> f64 {
    let std = std_dev(sorted, 1);
    let iqr = percentile(sorted, 0.75) - percentile(sorted, 0.25);
    let mut spread = std.min(iqr / 1.349);
    if spread <= 0.0 {
        spread = std;
    }
    let h = 1.059 * spread * (sorted.len() as f64).powf(-0.2);
    if h > 0.0 && h.is_finite() { h } else { 1.0 }
}

fn kernel_density(sorted: &[f64], grid_points: usize) -> KernelDensity {
    let h = bandwidth(sorted);
    let lo = sorted[0] - KDE_CUT * h;
    let hi = sorted[sorted.len() - 1] + KDE_CUT * h;
    let support = linspace(lo, hi, grid_points);

    let norm = 1.0 / (sorted.len() as f64 * h * (2.0 * std::f64::consts::PI).sqrt());
    let mut density: Vec<f64> = support
        .iter()
        .map(|&x| {
            sorted
                .iter()
                .map(|&xi| (-0.5 * ((x - xi) / h).powi(2)).exp())
                .sum::<f64>()
                * norm
        })
        .collect();

    // The support is truncated at the cut, so rescale onto unit mass
    let mass = trapezoid(&support, &density);
    if mass > 0.0 {
        for d in &mut density {
            *d /= mass;
        }
    }

    KernelDensity {
        support,
        density,
        bandwidth: h,
    }
}

fn histogram(sorted: &[f64], bins: usize) -> Histogram {
    let (mut lo, mut hi) = (sorted[0], sorted[sorted.len() - 1]);
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }
    let edges = linspace(lo, hi, bins + 1);
    let width = hi - lo;

    let mut counts = vec![0; bins];
    for &v in sorted {
        let bin = (((v - lo) / width) * bins as f64) as usize;
        // The last bin is closed on the right
        counts[bin.min(bins - 1)] += 1;
    }
    Histogram { edges, counts }
}

fn trapezoid(x: &[f64], y: &[f64]) -> f64 {
    x.windows(2)
        .zip(y.windows(2))
        .map(|(x, y)| 0.5 * (x[1] - x[0]) * (y[0] + y[1]))
        .sum()
}

/// Pair sorted sample values with standard normal quantiles at plotting
/// positions `i / (n + 1)`
pub fn qq_against_normal(values: &[f64]) -> Result<QqPlot> {
    check_sample(values)?;
    let normal = standard_normal()?;

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let n = sorted.len() as f64;

    let points = sorted
        .iter()
        .enumerate()
        .map(|(i, &v)| (normal.inverse_cdf((i as f64 + 1.0) / (n + 1.0)), v))
        .collect();

    Ok(QqPlot {
        points,
        intercept: mean(&sorted),
        slope: std_dev(&sorted, 0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_histogram_counts_every_value() {
        let values = [0.0, 1.0, 1.0, 2.0, 3.0, 4.0];
        let summary = summarize_distribution_with(&values, 4, 64).unwrap();
        let hist = &summary.histogram;
        assert_eq!(hist.edges, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
        assert_eq!(hist.counts, vec![1, 2, 1, 2]);

        let area: f64 = hist
            .density()
            .iter()
            .zip(hist.edges.windows(2))
            .map(|(d, e)| d * (e[1] - e[0]))
            .sum();
        assert!((area - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_constant_sample() {
        let summary = summarize_distribution(&[7.0; 10]).unwrap();
        assert_eq!(summary.histogram.edges[0], 6.5);
        assert_eq!(summary.histogram.counts.iter().sum::<usize>(), 10);
        assert_eq!(summary.kde.bandwidth, 1.0);
        assert!((summary.kde.integral() - 1.0).abs() < 1e-2);
    }

    #[test]
    fn test_bandwidth_uses_robust_spread() {
        // One far outlier inflates the std but not the IQR
        let mut values: Vec<f64> = (0..50).map(|i| i as f64 / 10.0).collect();
        values.push(1_000.0);
        let h = bandwidth(&{
            let mut v = values.clone();
            v.sort_by(f64::total_cmp);
            v
        });
        assert!(h < 2.0);
    }

    #[test]
    fn test_qq_line_and_order() {
        let qq = qq_against_normal(&[3.0, 1.0, 2.0]).unwrap();
        let sample: Vec<f64> = qq.points.iter().map(|p| p.1).collect();
        assert_eq!(sample, vec![1.0, 2.0, 3.0]);
        assert!(qq.points[1].0.abs() < 1e-12);
        assert!(qq.points[0].0 < 0.0 && qq.points[2].0 > 0.0);
        assert_eq!(qq.intercept, 2.0);
        assert!((qq.slope - (2.0f64 / 3.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_empty_and_non_finite() {
        assert!(matches!(
            summarize_distribution(&[]),
            Err(AnalysisError::EmptySample)
        ));
        assert!(matches!(
            qq_against_normal(&[]),
            Err(AnalysisError::EmptySample)
        ));
        assert!(summarize_distribution(&[1.0, f64::NAN]).is_err());
        assert!(summarize_distribution_with(&[1.0], 0, 10).is_err());
    }
}
