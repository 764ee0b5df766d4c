//! Per-run instrumentation and the hang watchdog
//!
//! Every run records how many steps it executed, whether the model asked to
//! stop early, and its wall-clock time. The watchdog turns a run whose time
//! exceeds a generous multiple of its expected cost into a `RunError::Hung`
//! instead of letting it stall the whole batch.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};

fn default_multiplier() -> f64 {
    10.0
}

/// Wall-clock budget for a single run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchdogConfig {
    /// Expected cost of one simulation step, in microseconds
    pub expected_step_micros: u64,
    /// Budget multiple applied on top of `expected_step_micros * max_steps`
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self {
            expected_step_micros: 10_000,
            multiplier: default_multiplier(),
        }
    }
}

impl WatchdogConfig {
    /// Create a watchdog for a given per-step cost
    #[must_use]
    pub fn with_step_cost(expected_step: Duration) -> Self {
        Self {
            expected_step_micros: u64::try_from(expected_step.as_micros()).unwrap_or(u64::MAX),
            ..Default::default()
        }
    }

    /// Total budget for a run of `max_steps` steps, saturating at
    /// `Duration::MAX`
    #[must_use]
    pub fn budget(&self, max_steps: usize) -> Duration {
        let nanos = self.expected_step_micros as f64
            * 1_000.0
            * max_steps.max(1) as f64
            * self.multiplier.max(1.0);
        if nanos.is_finite() && nanos < u64::MAX as f64 {
            Duration::from_nanos(nanos as u64)
        } else {
            Duration::MAX
        }
    }

    /// Reject budgets that cannot be computed or would flag every run
    pub fn validate(&self) -> Result<()> {
        if self.expected_step_micros == 0 {
            return Err(AnalysisError::Config(
                "watchdog expected_step_micros must be at least 1".to_string(),
            ));
        }
        if !self.multiplier.is_finite() || self.multiplier < 1.0 {
            return Err(AnalysisError::Config(format!(
                "watchdog multiplier must be a finite value of at least 1, got {}",
                self.multiplier
            )));
        }
        Ok(())
    }
}

/// Metrics collected for one completed run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunMetrics {
    /// Steps actually executed
    pub steps: usize,
    /// The model reported it was finished before `max_steps`
    pub terminated_early: bool,
    pub elapsed: Duration,
}

impl RunMetrics {
    /// Average wall-clock time per executed step
    #[must_use]
    pub fn avg_step_time(&self) -> Duration {
        if self.steps == 0 {
            Duration::ZERO
        } else {
            self.elapsed.div_f64(self.steps as f64)
        }
    }
}
