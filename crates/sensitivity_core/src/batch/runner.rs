//! Batch execution of simulation runs
//!
//! A batch is the cross product of design points and replicates. Each job owns
//! its model instance exclusively; the only shared state is the immutable
//! assignments, the reporter set, and the progress/abort flags. Results are
//! collected back in job order, so a batch with a fixed seed produces the same
//! table whether it runs on one worker or many.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::config::BatchConfig;
use crate::error::{AnalysisError, Result, RunContext, RunError};
use crate::model::{ParameterAssignment, ParameterSpace, ResultTable, RunResult};
use crate::sampling::JointDesign;
use crate::simulation::{Reporter, Simulation, reporter_names, run_once};

use super::progress::BatchProgress;

type JobOutcome = std::result::Result<RunResult, RunError>;

/// Derive the seed of one run from the batch seed and its position
#[must_use]
pub fn run_seed(base_seed: u64, design_point: usize, replicate: usize) -> u64 {
    let position = ((design_point as u64) << 32) | (replicate as u64 & 0xFFFF_FFFF);
    SmallRng::seed_from_u64(base_seed ^ position).next_u64()
}

/// Check that the model is built from exactly the space's parameters
pub fn check_model_parameters<M: Simulation>(space: &ParameterSpace) -> Result<()> {
    let (missing, unknown) = space.diff_names(M::PARAMETERS);
    if missing.is_empty() && unknown.is_empty() {
        Ok(())
    } else {
        Err(AnalysisError::ParameterMismatch { missing, unknown })
    }
}

/// Runs a simulation many times and collects reporter values
pub struct BatchRunner<M: Simulation> {
    reporters: Vec<Reporter<M>>,
    reporter_names: Arc<[String]>,
    config: BatchConfig,
    progress: Option<BatchProgress>,
}

impl<M: Simulation> BatchRunner<M> {
    pub fn new(reporters: Vec<Reporter<M>>, config: BatchConfig) -> Result<Self> {
        config.validate()?;
        let reporter_names = reporter_names(&reporters)?;
        Ok(Self {
            reporters,
            reporter_names,
            config,
            progress: None,
        })
    }

    /// Share a progress handle with the caller
    #[must_use]
    pub fn with_progress(mut self, progress: BatchProgress) -> Self {
        self.progress = Some(progress);
        self
    }

    #[must_use]
    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    #[must_use]
    pub fn reporter_names(&self) -> &[String] {
        &self.reporter_names
    }

    /// Run every sweep assignment `replicates` times.
    ///
    /// The returned table is tagged with the swept parameter so it can be
    /// aggregated by that parameter's values.
    pub fn run_sweep(
        &self,
        space: &ParameterSpace,
        variable: &str,
        samples: &[ParameterAssignment],
    ) -> Result<ResultTable> {
        if space.index_of(variable).is_none() {
            return Err(AnalysisError::UnknownParameter(variable.to_string()));
        }
        let table = self.run_points(space, samples)?;
        Ok(table.with_swept(variable))
    }

    /// Run one configuration `replicates` times
    pub fn run_fixed(&self, assignment: &ParameterAssignment) -> Result<ResultTable> {
        self.run_points(assignment.space(), std::slice::from_ref(assignment))
    }

    /// Run every point of a joint design `replicates` times.
    ///
    /// Design point indices in the table match positions in the design.
    pub fn run_design(&self, design: &JointDesign) -> Result<ResultTable> {
        let assignments = design.assignments()?;
        self.run_points(design.space(), &assignments)
    }

    fn is_cancelled(&self) -> bool {
        self.progress.as_ref().is_some_and(BatchProgress::is_cancelled)
    }

    fn run_points(
        &self,
        space: &ParameterSpace,
        assignments: &[ParameterAssignment],
    ) -> Result<ResultTable> {
        check_model_parameters::<M>(space)?;
        if let Some(foreign) = assignments.iter().find(|a| !a.space().is_same(space)) {
            return Err(AnalysisError::Config(format!(
                "assignment [{foreign}] belongs to a different parameter space"
            )));
        }

        let replicates = self.config.replicates;
        let max_steps = self.config.max_steps;
        let total = assignments.len() * replicates;
        let base_seed = self.config.seed.unwrap_or_else(rand::random);
        let budget = self
            .config
            .watchdog
            .as_ref()
            .map(|w| w.budget(max_steps));

        tracing::info!(
            design_points = assignments.len(),
            replicates,
            total_runs = total,
            max_steps,
            seed = base_seed,
            "starting batch"
        );
        if let Some(progress) = &self.progress {
            progress.reset(total);
        }

        let jobs: Vec<(usize, usize)> = (0..assignments.len())
            .flat_map(|point| (0..replicates).map(move |replicate| (point, replicate)))
            .collect();
        let abort = AtomicBool::new(false);

        let run_job = |&(point, replicate): &(usize, usize)| -> Option<JobOutcome> {
            if abort.load(Ordering::Relaxed) || self.is_cancelled() {
                return None;
            }
            let context = RunContext {
                assignment: assignments[point].clone(),
                design_point: point,
                replicate,
                seed: run_seed(base_seed, point, replicate),
            };
            let outcome = run_once::<M>(&context, max_steps, &self.reporters, budget).map(
                |(values, metrics)| {
                    RunResult::new(
                        context.assignment,
                        point,
                        replicate,
                        context.seed,
                        Arc::clone(&self.reporter_names),
                        values,
                        metrics,
                    )
                },
            );
            if outcome.is_err() {
                abort.store(true, Ordering::Relaxed);
            }
            if let Some(progress) = &self.progress {
                progress.increment();
            }
            Some(outcome)
        };

        #[cfg(feature = "parallel")]
        let outcomes: Vec<Option<JobOutcome>> = {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.config.parallel_workers)
                .build()
                .map_err(|e| AnalysisError::Config(format!("failed to start worker pool: {e}")))?;
            pool.install(|| jobs.par_iter().map(run_job).collect())
        };

        #[cfg(not(feature = "parallel"))]
        let outcomes: Vec<Option<JobOutcome>> = jobs.iter().map(run_job).collect();

        let mut table = ResultTable::new(
            space.clone(),
            Arc::clone(&self.reporter_names),
            replicates,
            assignments.len(),
        );
        for outcome in outcomes.into_iter().flatten() {
            match outcome {
                Ok(run) => table.push(run),
                Err(err) => {
                    tracing::error!(error = %err, "run failed, aborting batch");
                    return Err(err.into());
                }
            }
        }

        for (point, completed) in table.group_counts() {
            if completed == replicates {
                tracing::debug!(design_point = point, replicates, "group complete");
            }
        }

        if self.is_cancelled() {
            let discarded = table.discard_incomplete();
            tracing::warn!(
                completed_runs = table.len(),
                discarded_groups = discarded.len(),
                "batch cancelled"
            );
        } else {
            tracing::info!(runs = table.len(), "batch finished");
        }

        Ok(table)
    }
}
