use std::fmt;
use std::time::Duration;

use crate::model::ParameterAssignment;

/// Errors raised while defining a parameter space
#[derive(Debug, Clone, PartialEq)]
pub enum SpaceError {
    /// A space must declare at least one parameter
    Empty,
    /// Lower bound is not strictly below the upper bound
    InvalidBounds { name: String, lower: f64, upper: f64 },
    /// A bound is NaN or infinite
    NonFinite { name: String },
    /// Two descriptors share a name
    DuplicateName(String),
}

impl fmt::Display for SpaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpaceError::Empty => write!(f, "parameter space declares no parameters"),
            SpaceError::InvalidBounds { name, lower, upper } => write!(
                f,
                "invalid bounds for parameter '{name}': lower bound {lower} must be below upper bound {upper}"
            ),
            SpaceError::NonFinite { name } => {
                write!(f, "bounds for parameter '{name}' must be finite")
            }
            SpaceError::DuplicateName(name) => {
                write!(f, "parameter '{name}' is declared more than once")
            }
        }
    }
}

impl std::error::Error for SpaceError {}

/// Errors related to building or reading a parameter assignment
#[derive(Debug, Clone, PartialEq)]
pub enum AssignmentError {
    UnknownParameter(String),
    MissingParameter(String),
    Arity { expected: usize, found: usize },
    NotInteger { name: String, value: f64 },
    NonFinite { name: String },
}

impl fmt::Display for AssignmentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssignmentError::UnknownParameter(name) => {
                write!(f, "parameter '{name}' is not part of the parameter space")
            }
            AssignmentError::MissingParameter(name) => {
                write!(f, "no value supplied for parameter '{name}'")
            }
            AssignmentError::Arity { expected, found } => {
                write!(f, "expected {expected} parameter values, found {found}")
            }
            AssignmentError::NotInteger { name, value } => {
                write!(f, "parameter '{name}' is integer-valued but got {value}")
            }
            AssignmentError::NonFinite { name } => {
                write!(f, "value for parameter '{name}' is not finite")
            }
        }
    }
}

impl std::error::Error for AssignmentError {}

/// Errors reported by a simulation model while building or stepping
#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    Parameter(AssignmentError),
    Internal(String),
}

impl ModelError {
    pub fn internal(message: impl Into<String>) -> Self {
        ModelError::Internal(message.into())
    }
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::Parameter(e) => write!(f, "model configuration error: {e}"),
            ModelError::Internal(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for ModelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ModelError::Parameter(e) => Some(e),
            ModelError::Internal(_) => None,
        }
    }
}

impl From<AssignmentError> for ModelError {
    fn from(err: AssignmentError) -> Self {
        ModelError::Parameter(err)
    }
}

/// Everything needed to reproduce a single run
#[derive(Debug, Clone, PartialEq)]
pub struct RunContext {
    pub assignment: ParameterAssignment,
    /// Index of the assignment within the batch
    pub design_point: usize,
    pub replicate: usize,
    pub seed: u64,
}

impl fmt::Display for RunContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "design point {}, replicate {}, seed {} [{}]",
            self.design_point, self.replicate, self.seed, self.assignment
        )
    }
}

/// A single simulation run that did not complete
#[derive(Debug, Clone)]
pub enum RunError {
    /// The model raised an error during construction (`step == None`) or stepping
    Failed {
        context: RunContext,
        step: Option<usize>,
        source: ModelError,
    },
    /// The run exceeded its wall-clock budget
    Hung {
        context: RunContext,
        steps_completed: usize,
        elapsed: Duration,
        budget: Duration,
    },
}

impl RunError {
    #[must_use]
    pub fn context(&self) -> &RunContext {
        match self {
            RunError::Failed { context, .. } | RunError::Hung { context, .. } => context,
        }
    }
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunError::Failed {
                context,
                step: None,
                source,
            } => write!(f, "simulation construction failed at {context}: {source}"),
            RunError::Failed {
                context,
                step: Some(step),
                source,
            } => write!(f, "simulation failed on step {step} at {context}: {source}"),
            RunError::Hung {
                context,
                steps_completed,
                elapsed,
                budget,
            } => write!(
                f,
                "simulation exceeded its time budget of {budget:?} after {steps_completed} steps ({elapsed:?} elapsed) at {context}"
            ),
        }
    }
}

impl std::error::Error for RunError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RunError::Failed { source, .. } => Some(source),
            RunError::Hung { .. } => None,
        }
    }
}

/// Errors returned by sampling, batch execution and the analyzers
#[derive(Debug, Clone)]
pub enum AnalysisError {
    Space(SpaceError),
    Assignment(AssignmentError),
    Run(Box<RunError>),
    /// The model's declared parameters differ from the space's names
    ParameterMismatch {
        missing: Vec<String>,
        unknown: Vec<String>,
    },
    /// A group finished fewer replicates than requested
    IncompleteGroup {
        group: String,
        completed: usize,
        requested: usize,
    },
    UnknownParameter(String),
    UnknownReporter(String),
    /// Output variance is zero, so variance fractions are undefined
    ZeroVariance { reporter: String },
    EmptySample,
    Config(String),
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisError::Space(e) => write!(f, "{e}"),
            AnalysisError::Assignment(e) => write!(f, "{e}"),
            AnalysisError::Run(e) => write!(f, "{e}"),
            AnalysisError::ParameterMismatch { missing, unknown } => write!(
                f,
                "model parameters do not match the parameter space (missing: [{}], unknown: [{}])",
                missing.join(", "),
                unknown.join(", ")
            ),
            AnalysisError::IncompleteGroup {
                group,
                completed,
                requested,
            } => write!(
                f,
                "group {group} completed {completed} of {requested} requested replicates"
            ),
            AnalysisError::UnknownParameter(name) => write!(f, "unknown parameter '{name}'"),
            AnalysisError::UnknownReporter(name) => write!(f, "unknown reporter '{name}'"),
            AnalysisError::ZeroVariance { reporter } => {
                write!(f, "output of reporter '{reporter}' has zero variance")
            }
            AnalysisError::EmptySample => write!(f, "sample is empty"),
            AnalysisError::Config(msg) => write!(f, "configuration error: {msg}"),
        }
    }
}

impl std::error::Error for AnalysisError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AnalysisError::Space(e) => Some(e),
            AnalysisError::Assignment(e) => Some(e),
            AnalysisError::Run(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

impl From<SpaceError> for AnalysisError {
    fn from(err: SpaceError) -> Self {
        AnalysisError::Space(err)
    }
}

impl From<AssignmentError> for AnalysisError {
    fn from(err: AssignmentError) -> Self {
        AnalysisError::Assignment(err)
    }
}

impl From<RunError> for AnalysisError {
    fn from(err: RunError) -> Self {
        AnalysisError::Run(Box::new(err))
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
