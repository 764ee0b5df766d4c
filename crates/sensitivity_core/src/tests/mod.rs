//! Scenario tests for the sensitivity engine
//!
//! Tests are organized by topic:
//! - `batch` - Worker pool, seeding, failures, watchdog and cancellation
//! - `local` - Sweeps and local response curves
//! - `global` - Saltelli designs run through the batch runner into Sobol indices
//! - `baseline` - Fixed-configuration output distributions
//!
//! Shared stub simulations live in `support`. Set `RUST_LOG` to see the
//! engine's log output while a test runs.

mod local;
mod support;

/// Route engine logs to the test writer; safe to call from every test
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
