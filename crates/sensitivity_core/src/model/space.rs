//! Parameter space definitions
//!
//! A `ParameterSpace` is the ordered, validated set of tunable inputs shared by
//! every sampler, runner and analyzer in an analysis session. It is cheap to
//! clone (the descriptors live behind an `Arc`) and immutable once built.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::SpaceError;

/// One tunable model input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterDescriptor {
    pub name: String,
    pub lower: f64,
    pub upper: f64,
    /// Integer-valued parameters are rounded to the nearest whole number
    /// before they reach the simulation
    #[serde(default)]
    pub integer: bool,
}

impl ParameterDescriptor {
    pub fn real(name: impl Into<String>, lower: f64, upper: f64) -> Self {
        Self {
            name: name.into(),
            lower,
            upper,
            integer: false,
        }
    }

    pub fn integer(name: impl Into<String>, lower: f64, upper: f64) -> Self {
        Self {
            name: name.into(),
            lower,
            upper,
            integer: true,
        }
    }

    /// Width of the sampling range
    #[must_use]
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }

    /// Map a unit-interval coordinate onto the bounds
    #[must_use]
    pub fn scale(&self, unit: f64) -> f64 {
        self.lower + unit * self.width()
    }

    /// Round a sampled value to the nearest whole number inside the bounds
    #[must_use]
    pub fn round_to_integer(&self, value: f64) -> f64 {
        value.round().clamp(self.lower.ceil(), self.upper.floor())
    }

    /// Check whether a value lies within the bounds (inclusive)
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }

    fn validate(&self) -> Result<(), SpaceError> {
        if !self.lower.is_finite() || !self.upper.is_finite() {
            return Err(SpaceError::NonFinite {
                name: self.name.clone(),
            });
        }
        let no_whole_number = self.integer && self.lower.ceil() > self.upper.floor();
        if self.lower >= self.upper || no_whole_number {
            return Err(SpaceError::InvalidBounds {
                name: self.name.clone(),
                lower: self.lower,
                upper: self.upper,
            });
        }
        Ok(())
    }
}

/// Ordered set of parameter descriptors with unique names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "Vec<ParameterDescriptor>",
    into = "Vec<ParameterDescriptor>"
)]
pub struct ParameterSpace {
    descriptors: Arc<[ParameterDescriptor]>,
}

impl ParameterSpace {
    /// Validate and build a space.
    ///
    /// Fails if the list is empty, a bound is not finite, any lower bound is not
    /// strictly below its upper bound, or a name appears twice.
    pub fn new(
        descriptors: impl IntoIterator<Item = ParameterDescriptor>,
    ) -> Result<Self, SpaceError> {
        let descriptors: Vec<ParameterDescriptor> = descriptors.into_iter().collect();
        if descriptors.is_empty() {
            return Err(SpaceError::Empty);
        }

        let mut seen = rustc_hash::FxHashSet::default();
        for descriptor in &descriptors {
            descriptor.validate()?;
            if !seen.insert(descriptor.name.as_str()) {
                return Err(SpaceError::DuplicateName(descriptor.name.clone()));
            }
        }

        Ok(Self {
            descriptors: descriptors.into(),
        })
    }

    /// Number of parameters
    #[must_use]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Always false for a validated space
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    #[must_use]
    pub fn descriptors(&self) -> &[ParameterDescriptor] {
        &self.descriptors
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.descriptors.iter().map(|d| d.name.as_str())
    }

    /// Position of a parameter in declaration order
    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.descriptors.iter().position(|d| d.name == name)
    }

    #[must_use]
    pub fn descriptor(&self, name: &str) -> Option<&ParameterDescriptor> {
        self.descriptors.iter().find(|d| d.name == name)
    }

    /// Cheap identity check before falling back to structural equality
    #[must_use]
    pub fn is_same(&self, other: &ParameterSpace) -> bool {
        Arc::ptr_eq(&self.descriptors, &other.descriptors) || self == other
    }

    /// Compare the space's names against an expected name set.
    ///
    /// Returns `(missing, unknown)`: names expected but not declared, and names
    /// declared but not expected. Both empty means an exact match.
    #[must_use]
    pub fn diff_names(&self, expected: &[&str]) -> (Vec<String>, Vec<String>) {
        let missing = expected
            .iter()
            .filter(|name| self.index_of(name).is_none())
            .map(|name| (*name).to_string())
            .collect();
        let unknown = self
            .names()
            .filter(|name| !expected.contains(name))
            .map(str::to_string)
            .collect();
        (missing, unknown)
    }
}

impl TryFrom<Vec<ParameterDescriptor>> for ParameterSpace {
    type Error = SpaceError;

    fn try_from(descriptors: Vec<ParameterDescriptor>) -> Result<Self, Self::Error> {
        Self::new(descriptors)
    }
}

impl From<ParameterSpace> for Vec<ParameterDescriptor> {
    fn from(space: ParameterSpace) -> Self {
        space.descriptors.to_vec()
    }
}
