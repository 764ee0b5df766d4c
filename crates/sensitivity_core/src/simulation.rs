//! The narrow contract between the analysis engine and an agent-based model
//!
//! The engine never looks inside a model. It builds one instance per run from a
//! complete `ParameterAssignment` and a seed, advances it up to `max_steps`
//! times, and evaluates a fixed set of named reporters on the final state.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::{AnalysisError, ModelError, RunContext, RunError};
use crate::metrics::RunMetrics;
use crate::model::ParameterAssignment;

/// A stochastic simulation driven by the batch runner.
///
/// Each run builds and owns its instance on a single thread, so
/// implementations need not be `Send` or `Sync`.
pub trait Simulation: Sized + 'static {
    /// Discrete behavioral state an agent can be in
    type Action: Copy + PartialEq + fmt::Debug;

    /// Exact parameter names the model is constructed from
    const PARAMETERS: &'static [&'static str];

    /// Build a fresh model for one run
    fn build(assignment: &ParameterAssignment, seed: u64) -> Result<Self, ModelError>;

    /// Advance the model by one step
    fn step(&mut self) -> Result<(), ModelError>;

    /// Models that can finish on their own return `false` once done
    fn is_running(&self) -> bool {
        true
    }

    /// Current actions of all agents in a tracked category
    fn agents(&self, category: &str) -> Box<dyn Iterator<Item = Self::Action> + '_>;
}

type ReporterFn<M> = dyn Fn(&M) -> f64 + Send + Sync;

/// A named scalar computed from terminal model state
pub struct Reporter<M> {
    name: String,
    eval: Arc<ReporterFn<M>>,
}

impl<M> Clone for Reporter<M> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            eval: Arc::clone(&self.eval),
        }
    }
}

impl<M> fmt::Debug for Reporter<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reporter").field("name", &self.name).finish()
    }
}

impl<M> Reporter<M> {
    pub fn new(name: impl Into<String>, eval: impl Fn(&M) -> f64 + Send + Sync + 'static) -> Self {
        Self {
            name: name.into(),
            eval: Arc::new(eval),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn evaluate(&self, model: &M) -> f64 {
        (self.eval)(model)
    }
}

impl<M> Reporter<M>
where
    M: Simulation + 'static,
    M::Action: Send + Sync + 'static,
{
    /// Count the agents of `category` whose current action equals `action`
    pub fn count_in_state(
        name: impl Into<String>,
        category: impl Into<String>,
        action: M::Action,
    ) -> Self {
        let category = category.into();
        Self::new(name, move |model: &M| {
            model.agents(&category).filter(|a| *a == action).count() as f64
        })
    }
}

/// Validate reporter names (non-empty set, unique names) and collect them
pub(crate) fn reporter_names<M>(reporters: &[Reporter<M>]) -> Result<Arc<[String]>, AnalysisError> {
    if reporters.is_empty() {
        return Err(AnalysisError::Config(
            "at least one reporter is required".to_string(),
        ));
    }
    let mut names: Vec<String> = Vec::with_capacity(reporters.len());
    for reporter in reporters {
        if names.iter().any(|n| n == reporter.name()) {
            return Err(AnalysisError::Config(format!(
                "reporter '{}' is defined more than once",
                reporter.name()
            )));
        }
        names.push(reporter.name().to_string());
    }
    Ok(names.into())
}

/// Execute a single run and evaluate every reporter on its final state.
///
/// With a budget the run executes on a thread of its own and the caller waits
/// at most `budget` for it. A run that outlives the budget fails with
/// `RunError::Hung` and its thread is abandoned, so even a step that never
/// returns cannot stall the batch. A reporter that yields a non-finite value is
/// a run failure rather than a placeholder.
pub fn run_once<M: Simulation>(
    context: &RunContext,
    max_steps: usize,
    reporters: &[Reporter<M>],
    budget: Option<Duration>,
) -> Result<(Vec<f64>, RunMetrics), RunError> {
    let Some(budget) = budget else {
        return execute(context, max_steps, reporters, &AtomicUsize::new(0));
    };

    let start = Instant::now();
    let steps = Arc::new(AtomicUsize::new(0));
    let (tx, rx) = mpsc::channel();
    let spawned = {
        let context = context.clone();
        let reporters = reporters.to_vec();
        let steps = Arc::clone(&steps);
        thread::Builder::new()
            .name(format!("run-{}-{}", context.design_point, context.replicate))
            .spawn(move || {
                // The receiver is gone once the run has been declared hung
                let _ = tx.send(execute(&context, max_steps, &reporters, &steps));
            })
    };
    if let Err(e) = spawned {
        return Err(RunError::Failed {
            context: context.clone(),
            step: None,
            source: ModelError::internal(format!("failed to start run thread: {e}")),
        });
    }

    match rx.recv_timeout(budget) {
        Ok(outcome) => outcome,
        Err(RecvTimeoutError::Timeout) => {
            let steps_completed = steps.load(Ordering::Relaxed);
            tracing::warn!(
                design_point = context.design_point,
                replicate = context.replicate,
                steps_completed,
                ?budget,
                "abandoning hung run"
            );
            Err(RunError::Hung {
                context: context.clone(),
                steps_completed,
                elapsed: start.elapsed(),
                budget,
            })
        }
        Err(RecvTimeoutError::Disconnected) => Err(RunError::Failed {
            context: context.clone(),
            step: Some(steps.load(Ordering::Relaxed)),
            source: ModelError::internal("simulation panicked"),
        }),
    }
}

/// Build, step and report on the calling thread, publishing the step count
fn execute<M: Simulation>(
    context: &RunContext,
    max_steps: usize,
    reporters: &[Reporter<M>],
    steps_done: &AtomicUsize,
) -> Result<(Vec<f64>, RunMetrics), RunError> {
    let start = Instant::now();

    let mut model =
        M::build(&context.assignment, context.seed).map_err(|source| RunError::Failed {
            context: context.clone(),
            step: None,
            source,
        })?;

    let mut steps = 0;
    while steps < max_steps && model.is_running() {
        model.step().map_err(|source| RunError::Failed {
            context: context.clone(),
            step: Some(steps),
            source,
        })?;
        steps += 1;
        steps_done.store(steps, Ordering::Relaxed);
    }

    let mut values = Vec::with_capacity(reporters.len());
    for reporter in reporters {
        let value = reporter.evaluate(&model);
        if !value.is_finite() {
            return Err(RunError::Failed {
                context: context.clone(),
                step: None,
                source: ModelError::internal(format!(
                    "reporter '{}' produced a non-finite value ({value})",
                    reporter.name()
                )),
            });
        }
        values.push(value);
    }

    let metrics = RunMetrics {
        steps,
        terminated_early: steps < max_steps,
        elapsed: start.elapsed(),
    };
    Ok((values, metrics))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ParameterDescriptor, ParameterSpace};

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Action {
        Bribe,
        Refuse,
    }

    /// Flips one cop to bribing per step until `limit` steps have run
    struct Precinct {
        cops: Vec<Action>,
        step: usize,
        limit: usize,
    }

    impl Simulation for Precinct {
        type Action = Action;
        const PARAMETERS: &'static [&'static str] = &["team_size"];

        fn build(assignment: &ParameterAssignment, _seed: u64) -> Result<Self, ModelError> {
            let team = assignment.integer("team_size")? as usize;
            Ok(Self {
                cops: vec![Action::Refuse; team],
                step: 0,
                limit: team,
            })
        }

        fn step(&mut self) -> Result<(), ModelError> {
            if self.step == 99 {
                return Err(ModelError::internal("step 99 is cursed"));
            }
            if let Some(cop) = self.cops.get_mut(self.step) {
                *cop = Action::Bribe;
            }
            self.step += 1;
            Ok(())
        }

        fn is_running(&self) -> bool {
            self.step < self.limit
        }

        fn agents(&self, category: &str) -> Box<dyn Iterator<Item = Action> + '_> {
            match category {
                "cop" => Box::new(self.cops.iter().copied()),
                _ => Box::new(std::iter::empty()),
            }
        }
    }

    fn context(team: f64) -> RunContext {
        let space =
            ParameterSpace::new([ParameterDescriptor::integer("team_size", 1.0, 200.0)]).unwrap();
        RunContext {
            assignment: ParameterAssignment::new(&space, &[team]).unwrap(),
            design_point: 0,
            replicate: 0,
            seed: 7,
        }
    }

    fn reporters() -> Vec<Reporter<Precinct>> {
        vec![
            Reporter::count_in_state("Bribing", "cop", Action::Bribe),
            Reporter::count_in_state("NoBribing", "cop", Action::Refuse),
        ]
    }

    #[test]
    fn test_runs_until_max_steps() {
        let (values, metrics) = run_once(&context(10.0), 4, &reporters(), None).unwrap();
        assert_eq!(values, vec![4.0, 6.0]);
        assert_eq!(metrics.steps, 4);
        assert!(!metrics.terminated_early);
    }

    #[test]
    fn test_stops_when_model_finishes() {
        let (values, metrics) = run_once(&context(3.0), 10, &reporters(), None).unwrap();
        assert_eq!(values, vec![3.0, 0.0]);
        assert_eq!(metrics.steps, 3);
        assert!(metrics.terminated_early);
    }

    #[test]
    fn test_budgeted_run_matches_inline_run() {
        let inline = run_once(&context(10.0), 4, &reporters(), None).unwrap();
        let watched =
            run_once(&context(10.0), 4, &reporters(), Some(Duration::from_secs(30))).unwrap();
        assert_eq!(inline.0, watched.0);
        assert_eq!(inline.1.steps, watched.1.steps);

        let err = run_once(&context(150.0), 120, &reporters(), Some(Duration::from_secs(30)))
            .unwrap_err();
        assert!(matches!(err, RunError::Failed { step: Some(99), .. }));
    }

    #[test]
    fn test_step_failure_carries_context() {
        let err = run_once(&context(150.0), 120, &reporters(), None).unwrap_err();
        match err {
            RunError::Failed {
                context,
                step: Some(99),
                ..
            } => assert_eq!(context.seed, 7),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_non_finite_reporter_fails_run() {
        let reporters = vec![Reporter::<Precinct>::new("Broken", |_| f64::NAN)];
        let err = run_once(&context(2.0), 1, &reporters, None).unwrap_err();
        assert!(err.to_string().contains("Broken"));
    }

    #[test]
    fn test_reporter_names_must_be_unique() {
        let dup = vec![
            Reporter::<Precinct>::new("Bribing", |_| 0.0),
            Reporter::<Precinct>::new("Bribing", |_| 1.0),
        ];
        assert!(reporter_names(&dup).is_err());
        assert!(reporter_names::<Precinct>(&[]).is_err());
        assert_eq!(reporter_names(&reporters()).unwrap().len(), 2);
    }
}
