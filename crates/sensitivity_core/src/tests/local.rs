//! Tests for local sensitivity analysis
//!
//! These tests verify:
//! - Integer sweeps over the reference team size range
//! - Zero-width intervals for deterministic or single-replicate groups
//! - Aggregation independent of run order
//! - The whole-space pass over the precinct model

use crate::analysis::{aggregate, local_sensitivity};
use crate::batch::{BatchProgress, BatchRunner};
use crate::config::{BatchConfig, LocalAnalysisConfig};
use crate::model::{ParameterAssignment, ResultTable};
use crate::sampling::sweep_samples;
use crate::simulation::Reporter;

use super::support::{
    Constant, CopAction, bribery_defaults, bribery_space, cop_reporters, noisy_reporter,
    team_space, unit_space,
};

#[test]
fn test_team_size_sweep_yields_fifteen_integers() {
    let space = bribery_space();
    let samples = sweep_samples(&space, &bribery_defaults(&space), "team_size", 15).unwrap();

    let teams: Vec<i64> = samples
        .iter()
        .map(|a| a.integer("team_size").unwrap())
        .collect();
    assert_eq!(teams.len(), 15);
    assert!(teams.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(teams.first(), Some(&5));
    assert_eq!(teams.last(), Some(&25));

    // Everything else stays at the baseline
    for a in &samples {
        assert_eq!(a.real("bribe_amount").unwrap(), 50.0);
        assert_eq!(a.integer("jail_time").unwrap(), 4);
    }
}

#[test]
fn test_deterministic_stub_has_zero_standard_error() {
    let space = team_space();
    let defaults = ParameterAssignment::new(&space, &[10.0]).unwrap();
    let samples = sweep_samples(&space, &defaults, "team_size", 5).unwrap();
    let runner = BatchRunner::new(
        vec![Reporter::<Constant>::count_in_state(
            "Bribing",
            "cop",
            CopAction::Bribe,
        )],
        BatchConfig::default().with_replicates(3).with_max_steps(10),
    )
    .unwrap();
    let table = runner.run_sweep(&space, "team_size", &samples).unwrap();

    let stats = aggregate(&table, "team_size", "Bribing").unwrap();
    assert_eq!(stats.len(), 5);
    for stat in &stats {
        assert_eq!(stat.mean, 4.0);
        assert_eq!(stat.standard_error, 0.0);
        assert_eq!(stat.interval_width(), 0.0);
        assert_eq!(stat.sample_count, 3);
    }
    let values: Vec<f64> = stats.iter().map(|s| s.parameter_value).collect();
    assert_eq!(values, vec![5.0, 10.0, 15.0, 20.0, 25.0]);
}

#[test]
fn test_single_replicate_interval_has_zero_width() {
    let space = unit_space();
    let defaults = ParameterAssignment::from_pairs(&space, [("x0", 0.5), ("x1", 0.5)]).unwrap();
    let samples = sweep_samples(&space, &defaults, "x1", 6).unwrap();
    let table = BatchRunner::new(
        vec![noisy_reporter()],
        BatchConfig::default().with_replicates(1).with_seed(8),
    )
    .unwrap()
    .run_sweep(&space, "x1", &samples)
    .unwrap();

    let stats = aggregate(&table, "x1", "y").unwrap();
    assert_eq!(stats.len(), 6);
    for stat in stats {
        assert_eq!(stat.sample_count, 1);
        assert_eq!(stat.interval_width(), 0.0);
    }
}

#[test]
fn test_aggregate_ignores_run_order() {
    let space = unit_space();
    let defaults = ParameterAssignment::from_pairs(&space, [("x0", 0.5), ("x1", 0.5)]).unwrap();
    let samples = sweep_samples(&space, &defaults, "x0", 5).unwrap();
    let table = BatchRunner::new(
        vec![noisy_reporter()],
        BatchConfig::default().with_replicates(7).with_seed(77),
    )
    .unwrap()
    .run_sweep(&space, "x0", &samples)
    .unwrap();

    let mut shuffled = ResultTable::new(
        table.space().clone(),
        table.reporters().to_vec().into(),
        table.replicates_requested(),
        table.design_points(),
    )
    .with_swept("x0");
    // Interleave from both ends
    let runs = table.runs();
    let (mut lo, mut hi) = (0, runs.len());
    while lo < hi {
        hi -= 1;
        shuffled.push(runs[hi].clone());
        if lo < hi {
            shuffled.push(runs[lo].clone());
            lo += 1;
        }
    }
    assert_eq!(shuffled.len(), table.len());

    let original = aggregate(&table, "x0", "y").unwrap();
    let permuted = aggregate(&shuffled, "x0", "y").unwrap();
    assert_eq!(original, permuted);

    // Means follow the linear response
    for stat in &original {
        let expected = 3.0 * stat.parameter_value + 0.5;
        assert!((stat.mean - expected).abs() < 0.2);
        assert!(stat.confidence_interval.0 < stat.mean && stat.mean < stat.confidence_interval.1);
    }
}

#[test]
fn test_aggregate_rejects_unknown_names() {
    let space = team_space();
    let defaults = ParameterAssignment::new(&space, &[10.0]).unwrap();
    let table = BatchRunner::new(
        vec![Reporter::new("one", |_: &Constant| 1.0)],
        BatchConfig::default().with_replicates(2),
    )
    .unwrap()
    .run_fixed(&defaults)
    .unwrap();

    assert!(aggregate(&table, "jail_time", "one").is_err());
    assert!(aggregate(&table, "team_size", "Bribing").is_err());
    assert_eq!(aggregate(&table, "team_size", "one").unwrap().len(), 1);
}

#[test]
fn test_local_sensitivity_sweeps_every_parameter() {
    super::init_tracing();
    let space = bribery_space();
    let defaults = bribery_defaults(&space);
    let config = LocalAnalysisConfig {
        distinct_samples: 4,
        batch: BatchConfig::default()
            .with_replicates(3)
            .with_max_steps(10)
            .with_seed(130),
    };

    let local = local_sensitivity(&cop_reporters(), &space, &defaults, &config, None).unwrap();
    assert_eq!(local.tables().len(), space.len());
    let swept: Vec<&str> = local.tables().iter().filter_map(|t| t.swept()).collect();
    assert_eq!(swept, space.names().collect::<Vec<_>>());

    let bribing = local.curve("team_size", "Bribing").unwrap();
    let honest = local.curve("team_size", "NoBribing").unwrap();
    assert_eq!(bribing.len(), 4);
    for (b, h) in bribing.iter().zip(&honest) {
        assert_eq!(b.parameter_value, h.parameter_value);
        // Every cop is in exactly one state
        assert!((b.mean + h.mean - b.parameter_value).abs() < 1e-9);
    }

    let curve = local.curve("bribe_amount", "Bribing").unwrap();
    let values: Vec<f64> = curve.iter().map(|s| s.parameter_value).collect();
    assert_eq!(values.first(), Some(&0.0));
    assert_eq!(values.last(), Some(&5.0));

    assert!(local.curve("not_a_parameter", "Bribing").is_err());
}

#[test]
fn test_cancelled_local_analysis_stops() {
    let space = bribery_space();
    let progress = BatchProgress::default();
    progress.cancel();

    let local = local_sensitivity(
        &cop_reporters(),
        &space,
        &bribery_defaults(&space),
        &LocalAnalysisConfig::default(),
        Some(&progress),
    )
    .unwrap();
    assert!(local.tables().is_empty());
}
