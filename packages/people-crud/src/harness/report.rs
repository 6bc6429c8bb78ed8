//! Per-step outcomes of a suite run.

use std::fmt;
use std::time::Duration;

use serde::{Serialize, Serializer};

use super::Step;

/// Outcome of one step.
#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub step: Step,
    /// Failure message with its context chain; `None` when the step passed.
    pub error: Option<String>,
    #[serde(rename = "elapsed_ms", serialize_with = "as_millis")]
    pub elapsed: Duration,
}

impl StepReport {
    pub fn passed(&self) -> bool {
        self.error.is_none()
    }
}

/// Outcome of a whole run: every executed step plus teardown.
#[derive(Debug, Clone, Serialize)]
pub struct SuiteReport {
    pub backend: String,
    pub steps: Vec<StepReport>,
    pub teardown_error: Option<String>,
}

impl SuiteReport {
    pub fn passed(&self) -> usize {
        self.steps.iter().filter(|s| s.passed()).count()
    }

    pub fn failed(&self) -> usize {
        self.steps.len() - self.passed()
    }

    /// True when every step passed and teardown succeeded.
    pub fn is_success(&self) -> bool {
        self.failed() == 0 && self.teardown_error.is_none()
    }

    pub fn failures(&self) -> impl Iterator<Item = &StepReport> {
        self.steps.iter().filter(|s| !s.passed())
    }
}

fn as_millis<S: Serializer>(elapsed: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(elapsed.as_micros() as f64 / 1000.0)
}

/// Renders in the familiar `cargo test` layout.
impl fmt::Display for SuiteReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "running {} steps against {}", self.steps.len(), self.backend)?;
        for report in &self.steps {
            let status = if report.passed() { "ok" } else { "FAILED" };
            writeln!(f, "test {} ... {}", report.step, status)?;
        }

        if self.failed() > 0 {
            writeln!(f)?;
            writeln!(f, "failures:")?;
            for report in self.failures() {
                if let Some(error) = &report.error {
                    writeln!(f, "    {}: {}", report.step, error)?;
                }
            }
        }

        if let Some(error) = &self.teardown_error {
            writeln!(f)?;
            writeln!(f, "teardown FAILED: {}", error)?;
        }

        writeln!(f)?;
        write!(
            f,
            "test result: {}. {} passed; {} failed",
            if self.is_success() { "ok" } else { "FAILED" },
            self.passed(),
            self.failed()
        )
    }
}
