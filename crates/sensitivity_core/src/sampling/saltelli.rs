//! Saltelli cross-sampling for variance-based global sensitivity analysis
//!
//! Two quasi-random base matrices `A` and `B` are drawn from one Sobol sequence
//! of dimension `2D`. For every base row the design contains `A`, then one row
//! per parameter `j` equal to `A` with column `j` taken from `B`, then `B`. Each
//! block therefore holds `D + 2` rows and the design holds `N * (D + 2)`.

use serde::Serialize;

use crate::error::{AnalysisError, Result};
use crate::model::{ParameterAssignment, ParameterSpace};

use super::sobol_sequence::{MAX_DIMENSIONS, SobolSequence};

/// Joint design over the whole parameter space.
///
/// Points keep their continuous sampled values; integer parameters are only
/// rounded when a point becomes a `ParameterAssignment`.
#[derive(Debug, Clone, Serialize)]
pub struct JointDesign {
    space: ParameterSpace,
    base_samples: usize,
    points: Vec<Vec<f64>>,
}

impl JointDesign {
    #[must_use]
    pub fn space(&self) -> &ParameterSpace {
        &self.space
    }

    /// Number of base rows `N`
    #[must_use]
    pub fn base_samples(&self) -> usize {
        self.base_samples
    }

    /// Rows per base sample, `D + 2`
    #[must_use]
    pub fn block_len(&self) -> usize {
        self.space.len() + 2
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[must_use]
    pub fn point(&self, index: usize) -> Option<&[f64]> {
        self.points.get(index).map(Vec::as_slice)
    }

    #[must_use]
    pub fn points(&self) -> &[Vec<f64>] {
        &self.points
    }

    pub fn assignment(&self, index: usize) -> Result<ParameterAssignment> {
        let row = self.point(index).ok_or_else(|| {
            AnalysisError::Config(format!(
                "design point {index} is out of range for a design of {} points",
                self.len()
            ))
        })?;
        Ok(ParameterAssignment::from_sample(&self.space, row)?)
    }

    /// Every design point as an assignment, in design order
    pub fn assignments(&self) -> Result<Vec<ParameterAssignment>> {
        self.points
            .iter()
            .map(|row| ParameterAssignment::from_sample(&self.space, row).map_err(Into::into))
            .collect()
    }
}

/// Build a Saltelli design with `base_samples` base rows.
///
/// The leading `base_samples.next_power_of_two()` points of the sequence are
/// skipped. Base sizes that are not a power of two are accepted but weaken the
/// sequence's balance properties.
pub fn joint_samples(space: &ParameterSpace, base_samples: usize) -> Result<JointDesign> {
    if base_samples == 0 {
        return Err(AnalysisError::Config(
            "joint sampling needs at least one base sample".to_string(),
        ));
    }
    let d = space.len();
    if 2 * d > MAX_DIMENSIONS {
        return Err(AnalysisError::Config(format!(
            "joint sampling supports at most {} parameters, space has {d}",
            MAX_DIMENSIONS / 2
        )));
    }
    if !base_samples.is_power_of_two() {
        tracing::warn!(
            base_samples,
            "base sample count is not a power of two; convergence properties are degraded"
        );
    }

    let mut sequence = SobolSequence::new(2 * d)?;
    sequence.skip_points(base_samples.next_power_of_two());

    let descriptors = space.descriptors();
    let scale = |unit: &[f64]| -> Vec<f64> {
        descriptors
            .iter()
            .zip(unit)
            .map(|(desc, &u)| desc.scale(u))
            .collect()
    };

    let mut points = Vec::with_capacity(base_samples * (d + 2));
    for base in sequence.take(base_samples) {
        let (a, b) = base.split_at(d);
        let a = scale(a);
        let b = scale(b);

        points.push(a.clone());
        for j in 0..d {
            let mut ab = a.clone();
            ab[j] = b[j];
            points.push(ab);
        }
        points.push(b);
    }

    tracing::debug!(
        base_samples,
        parameters = d,
        points = points.len(),
        "built Saltelli design"
    );

    Ok(JointDesign {
        space: space.clone(),
        base_samples,
        points,
    })
}
