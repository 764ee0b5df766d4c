//! Run results and the append-only result table
//!
//! A `ResultTable` belongs to the analysis pass that produced it. Runs are
//! appended as they complete and are grouped logically by design point (one
//! design point per distinct assignment handed to the batch runner). Groups that
//! did not collect every requested replicate are never reduced; they are moved
//! to the table's discard list instead.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use crate::error::{AnalysisError, Result};
use crate::metrics::RunMetrics;

use super::assignment::ParameterAssignment;
use super::space::ParameterSpace;

/// Outcome of one completed simulation run
#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub assignment: ParameterAssignment,
    /// Index of the assignment within the batch that produced this run
    pub design_point: usize,
    pub replicate: usize,
    pub seed: u64,
    /// Reporter values, aligned with the owning table's reporter names
    pub reporter_values: Vec<f64>,
    pub metrics: RunMetrics,
    #[serde(skip)]
    reporters: Arc<[String]>,
}

impl RunResult {
    pub(crate) fn new(
        assignment: ParameterAssignment,
        design_point: usize,
        replicate: usize,
        seed: u64,
        reporters: Arc<[String]>,
        reporter_values: Vec<f64>,
        metrics: RunMetrics,
    ) -> Self {
        Self {
            assignment,
            design_point,
            replicate,
            seed,
            reporter_values,
            metrics,
            reporters,
        }
    }

    /// Number of steps the run executed
    #[must_use]
    pub fn step_count(&self) -> usize {
        self.metrics.steps
    }

    /// Value of a named reporter
    #[must_use]
    pub fn reporter(&self, name: &str) -> Option<f64> {
        self.reporters
            .iter()
            .position(|r| r == name)
            .map(|idx| self.reporter_values[idx])
    }

    pub fn reporter_values(&self) -> impl Iterator<Item = (&str, f64)> {
        self.reporters
            .iter()
            .map(String::as_str)
            .zip(self.reporter_values.iter().copied())
    }
}

/// A design point whose replicate set was incomplete when the batch ended
#[derive(Debug, Clone, Serialize)]
pub struct IncompleteGroup {
    pub design_point: usize,
    pub completed: usize,
    pub requested: usize,
}

impl IncompleteGroup {
    #[must_use]
    pub fn to_error(&self) -> AnalysisError {
        AnalysisError::IncompleteGroup {
            group: format!("design point {}", self.design_point),
            completed: self.completed,
            requested: self.requested,
        }
    }
}

/// Ordered collection of run results produced by one batch
#[derive(Debug, Clone, Serialize)]
pub struct ResultTable {
    space: ParameterSpace,
    reporters: Arc<[String]>,
    /// Parameter varied by a one-at-a-time sweep, if any
    swept: Option<String>,
    replicates_requested: usize,
    /// Number of distinct design points the batch was asked to run
    design_points: usize,
    runs: Vec<RunResult>,
    discarded: Vec<IncompleteGroup>,
}

impl ResultTable {
    #[must_use]
    pub fn new(
        space: ParameterSpace,
        reporters: Arc<[String]>,
        replicates_requested: usize,
        design_points: usize,
    ) -> Self {
        Self {
            space,
            reporters,
            swept: None,
            replicates_requested,
            design_points,
            runs: Vec::with_capacity(replicates_requested * design_points),
            discarded: Vec::new(),
        }
    }

    /// Mark the table as the output of a one-parameter sweep
    #[must_use]
    pub fn with_swept(mut self, parameter: impl Into<String>) -> Self {
        self.swept = Some(parameter.into());
        self
    }

    /// Append a completed run
    pub fn push(&mut self, run: RunResult) {
        debug_assert_eq!(run.reporter_values.len(), self.reporters.len());
        self.runs.push(run);
    }

    #[must_use]
    pub fn runs(&self) -> &[RunResult] {
        &self.runs
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.runs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    #[must_use]
    pub fn space(&self) -> &ParameterSpace {
        &self.space
    }

    #[must_use]
    pub fn reporters(&self) -> &[String] {
        &self.reporters
    }

    #[must_use]
    pub fn swept(&self) -> Option<&str> {
        self.swept.as_deref()
    }

    #[must_use]
    pub fn replicates_requested(&self) -> usize {
        self.replicates_requested
    }

    #[must_use]
    pub fn design_points(&self) -> usize {
        self.design_points
    }

    /// Groups removed because they finished fewer replicates than requested
    #[must_use]
    pub fn discarded(&self) -> &[IncompleteGroup] {
        &self.discarded
    }

    /// True when at least one requested design point has no complete result
    #[must_use]
    pub fn is_partial(&self) -> bool {
        let counts = self.group_counts();
        let complete = counts
            .values()
            .filter(|&&c| c >= self.replicates_requested)
            .count();
        complete < self.design_points
    }

    pub fn reporter_index(&self, name: &str) -> Result<usize> {
        self.reporters
            .iter()
            .position(|r| r == name)
            .ok_or_else(|| AnalysisError::UnknownReporter(name.to_string()))
    }

    /// All values of one reporter, in table order
    pub fn values(&self, reporter: &str) -> Result<Vec<f64>> {
        let idx = self.reporter_index(reporter)?;
        Ok(self.runs.iter().map(|r| r.reporter_values[idx]).collect())
    }

    /// Number of runs collected per design point
    #[must_use]
    pub fn group_counts(&self) -> BTreeMap<usize, usize> {
        let mut counts = BTreeMap::new();
        for run in &self.runs {
            *counts.entry(run.design_point).or_insert(0) += 1;
        }
        counts
    }

    /// Design points present in the table with fewer runs than requested
    #[must_use]
    pub fn incomplete_groups(&self) -> Vec<IncompleteGroup> {
        self.group_counts()
            .into_iter()
            .filter(|&(_, completed)| completed < self.replicates_requested)
            .map(|(design_point, completed)| IncompleteGroup {
                design_point,
                completed,
                requested: self.replicates_requested,
            })
            .collect()
    }

    /// Fail unless every requested design point collected all its replicates
    pub fn ensure_complete(&self) -> Result<()> {
        if let Some(group) = self.discarded.first() {
            return Err(group.to_error());
        }
        if let Some(group) = self.incomplete_groups().first() {
            return Err(group.to_error());
        }
        let counts = self.group_counts();
        if let Some(missing) = (0..self.design_points).find(|p| !counts.contains_key(p)) {
            return Err(IncompleteGroup {
                design_point: missing,
                completed: 0,
                requested: self.replicates_requested,
            }
            .to_error());
        }
        Ok(())
    }

    /// Remove every run belonging to an incomplete group and record the group
    /// as discarded. Returns the groups removed by this call.
    pub fn discard_incomplete(&mut self) -> Vec<IncompleteGroup> {
        let incomplete = self.incomplete_groups();
        if incomplete.is_empty() {
            return incomplete;
        }

        for group in &incomplete {
            tracing::warn!(
                design_point = group.design_point,
                completed = group.completed,
                requested = group.requested,
                "discarding incomplete replicate group"
            );
        }
        self.runs
            .retain(|run| !incomplete.iter().any(|g| g.design_point == run.design_point));
        self.discarded.extend(incomplete.iter().cloned());
        incomplete
    }
}
