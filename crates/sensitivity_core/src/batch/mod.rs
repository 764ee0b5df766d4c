//! Batch execution: worker pool, seeding, watchdog and cancellation

mod progress;
mod runner;

pub use progress::BatchProgress;
pub use runner::{BatchRunner, check_model_parameters, run_seed};
