//! Sampling designs over a parameter space
//!
//! - `sweep`: one-at-a-time sweeps for local sensitivity curves
//! - `saltelli`: Saltelli cross-sampling for Sobol indices
//! - `sobol_sequence`: the quasi-random sequence behind the Saltelli design

mod saltelli;
mod sobol_sequence;
mod sweep;

pub use saltelli::{JointDesign, joint_samples};
pub use sobol_sequence::{MAX_DIMENSIONS, SobolSequence};
pub use sweep::{linspace, sweep_samples, sweep_values};
