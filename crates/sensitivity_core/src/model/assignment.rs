//! Concrete parameter values for a single simulation run

use std::fmt;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::AssignmentError;

use super::space::{ParameterDescriptor, ParameterSpace};

/// A parameter value, typed by its descriptor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Integer(i64),
    Real(f64),
}

impl ParamValue {
    #[must_use]
    pub fn as_f64(self) -> f64 {
        match self {
            ParamValue::Integer(v) => v as f64,
            ParamValue::Real(v) => v,
        }
    }

    #[must_use]
    pub fn as_i64(self) -> Option<i64> {
        match self {
            ParamValue::Integer(v) => Some(v),
            ParamValue::Real(_) => None,
        }
    }

    /// Convert a sampled real value for the given descriptor.
    ///
    /// Integer parameters are rounded to the nearest whole number here and
    /// nowhere else, so sampling designs keep their continuous values.
    #[must_use]
    pub fn from_sample(descriptor: &ParameterDescriptor, raw: f64) -> Self {
        if descriptor.integer {
            ParamValue::Integer(descriptor.round_to_integer(raw) as i64)
        } else {
            ParamValue::Real(raw)
        }
    }

    /// Convert an exact caller-supplied value, rejecting fractional integers
    fn from_exact(descriptor: &ParameterDescriptor, raw: f64) -> Result<Self, AssignmentError> {
        if !raw.is_finite() {
            return Err(AssignmentError::NonFinite {
                name: descriptor.name.clone(),
            });
        }
        if descriptor.integer {
            if raw.fract() != 0.0 {
                return Err(AssignmentError::NotInteger {
                    name: descriptor.name.clone(),
                    value: raw,
                });
            }
            Ok(ParamValue::Integer(raw as i64))
        } else {
            Ok(ParamValue::Real(raw))
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Integer(v) => write!(f, "{v}"),
            ParamValue::Real(v) => write!(f, "{v}"),
        }
    }
}

/// Mapping from every parameter in a space to a concrete value.
///
/// Always complete: construction fails unless each declared parameter has a
/// value, so a simulation never sees a silently defaulted input.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterAssignment {
    space: ParameterSpace,
    values: Vec<ParamValue>,
}

impl ParameterAssignment {
    /// Build from values in declaration order
    pub fn new(space: &ParameterSpace, values: &[f64]) -> Result<Self, AssignmentError> {
        if values.len() != space.len() {
            return Err(AssignmentError::Arity {
                expected: space.len(),
                found: values.len(),
            });
        }
        let values = space
            .descriptors()
            .iter()
            .zip(values)
            .map(|(d, &v)| ParamValue::from_exact(d, v))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            space: space.clone(),
            values,
        })
    }

    /// Build from `(name, value)` pairs. Every declared parameter must appear.
    pub fn from_pairs<'a>(
        space: &ParameterSpace,
        pairs: impl IntoIterator<Item = (&'a str, f64)>,
    ) -> Result<Self, AssignmentError> {
        let mut slots: Vec<Option<f64>> = vec![None; space.len()];
        for (name, value) in pairs {
            let idx = space
                .index_of(name)
                .ok_or_else(|| AssignmentError::UnknownParameter(name.to_string()))?;
            slots[idx] = Some(value);
        }

        let mut values = Vec::with_capacity(slots.len());
        for (slot, descriptor) in slots.into_iter().zip(space.descriptors()) {
            let raw = slot.ok_or_else(|| AssignmentError::MissingParameter(descriptor.name.clone()))?;
            values.push(raw);
        }
        Self::new(space, &values)
    }

    /// Build from one row of a sampling design, rounding integer parameters
    pub fn from_sample(space: &ParameterSpace, row: &[f64]) -> Result<Self, AssignmentError> {
        if row.len() != space.len() {
            return Err(AssignmentError::Arity {
                expected: space.len(),
                found: row.len(),
            });
        }
        let values = space
            .descriptors()
            .iter()
            .zip(row)
            .map(|(d, &v)| ParamValue::from_sample(d, v))
            .collect();
        Ok(Self {
            space: space.clone(),
            values,
        })
    }

    /// Copy with one parameter replaced by a sampled value
    pub fn with_sample(&self, name: &str, raw: f64) -> Result<Self, AssignmentError> {
        let idx = self
            .space
            .index_of(name)
            .ok_or_else(|| AssignmentError::UnknownParameter(name.to_string()))?;
        let mut values = self.values.clone();
        values[idx] = ParamValue::from_sample(&self.space.descriptors()[idx], raw);
        Ok(Self {
            space: self.space.clone(),
            values,
        })
    }

    #[must_use]
    pub fn space(&self) -> &ParameterSpace {
        &self.space
    }

    pub fn get(&self, name: &str) -> Result<ParamValue, AssignmentError> {
        self.space
            .index_of(name)
            .map(|idx| self.values[idx])
            .ok_or_else(|| AssignmentError::UnknownParameter(name.to_string()))
    }

    /// Read any parameter as a real number
    pub fn real(&self, name: &str) -> Result<f64, AssignmentError> {
        self.get(name).map(ParamValue::as_f64)
    }

    /// Read an integer-valued parameter
    pub fn integer(&self, name: &str) -> Result<i64, AssignmentError> {
        match self.get(name)? {
            ParamValue::Integer(v) => Ok(v),
            ParamValue::Real(value) => Err(AssignmentError::NotInteger {
                name: name.to_string(),
                value,
            }),
        }
    }

    /// Value by position (declaration order)
    #[must_use]
    pub fn value_at(&self, index: usize) -> Option<ParamValue> {
        self.values.get(index).copied()
    }

    #[must_use]
    pub fn values(&self) -> &[ParamValue] {
        &self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, ParamValue)> {
        self.space.names().zip(self.values.iter().copied())
    }
}

impl fmt::Display for ParameterAssignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, value)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{name}={value}")?;
        }
        Ok(())
    }
}

impl Serialize for ParameterAssignment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, &value)?;
        }
        map.end()
    }
}
