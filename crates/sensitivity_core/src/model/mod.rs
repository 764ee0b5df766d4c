mod assignment;
mod results;
mod space;

pub use assignment::{ParamValue, ParameterAssignment};
pub use results::{IncompleteGroup, ResultTable, RunResult};
pub use space::{ParameterDescriptor, ParameterSpace};
