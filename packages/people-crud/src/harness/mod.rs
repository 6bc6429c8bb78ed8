//! Fixture lifecycle for the CRUD scenario.
//!
//! A run moves through `Uninitialized → TableReady → steps → TornDown`.
//! [`Fixture::setup`] is the only way to reach `TableReady` and
//! [`Fixture::teardown`] consumes the fixture, so a table created by a run is
//! always dropped by that same run once setup has succeeded.

mod report;
mod steps;

pub use report::{StepReport, SuiteReport};
pub use steps::Step;

use std::time::Instant;

use crate::error::Result;
use crate::store::PeopleStore;

/// Owns the store and the scratch table for one run.
pub struct Fixture<S: PeopleStore> {
    store: S,
}

impl<S: PeopleStore> Fixture<S> {
    /// Creates the table and commits. On failure the store is closed and the
    /// error returned; no steps may run.
    pub async fn setup(mut store: S) -> Result<Self> {
        tracing::info!(backend = store.backend(), "Creating People table");
        let created = match store.create_table().await {
            Ok(()) => store.commit().await,
            Err(e) => Err(e),
        };
        if let Err(e) = created {
            tracing::error!(error = %e, "Setup failed");
            if let Err(close_err) = store.close().await {
                tracing::warn!(error = %close_err, "Failed to close store after setup failure");
            }
            return Err(e);
        }
        Ok(Self { store })
    }

    pub fn store(&mut self) -> &mut S {
        &mut self.store
    }

    /// Runs one step and records its outcome. Never fails itself.
    ///
    /// A failed step's open transaction is rolled back, so a statement error
    /// in one step does not leave later steps facing an aborted transaction.
    pub async fn run_step(&mut self, step: Step) -> StepReport {
        let start = Instant::now();
        let outcome = step.run(&mut self.store).await;
        let elapsed = start.elapsed();

        let error = match outcome {
            Ok(()) => {
                tracing::info!(step = step.name(), ?elapsed, "Step passed");
                None
            }
            Err(e) => {
                let message = format!("{:#}", e);
                tracing::error!(step = step.name(), error = %message, "Step failed");
                if let Err(rollback_err) = self.store.rollback().await {
                    tracing::warn!(
                        step = step.name(),
                        error = %rollback_err,
                        "Failed to roll back after step failure"
                    );
                }
                Some(message)
            }
        };
        StepReport {
            step,
            error,
            elapsed,
        }
    }

    /// Rolls back anything left open, drops the table, commits and closes.
    /// The store is closed even when an earlier teardown statement fails.
    pub async fn teardown(mut self) -> (S, Result<()>) {
        tracing::info!(backend = self.store.backend(), "Dropping People table");
        let dropped: Result<()> = async {
            self.store.rollback().await?;
            self.store.drop_table().await?;
            self.store.commit().await
        }
        .await;
        let closed = self.store.close().await;

        let result = dropped.and(closed);
        if let Err(e) = &result {
            tracing::error!(error = %e, "Teardown failed");
        }
        (self.store, result)
    }
}

/// Sets up, runs `steps` in order, and always tears down after a successful
/// setup. A setup failure is returned as an error; step and teardown failures
/// are recorded in the report.
pub async fn run_suite<S: PeopleStore>(store: S, steps: &[Step]) -> Result<SuiteReport> {
    let backend = store.backend().to_string();
    let mut fixture = Fixture::setup(store).await?;

    let mut reports = Vec::with_capacity(steps.len());
    for &step in steps {
        reports.push(fixture.run_step(step).await);
    }

    let (_, teardown) = fixture.teardown().await;
    let report = SuiteReport {
        backend,
        steps: reports,
        teardown_error: teardown.err().map(|e| e.to_string()),
    };
    tracing::info!(
        passed = report.passed(),
        failed = report.failed(),
        "Suite finished"
    );
    Ok(report)
}
