//! Scenario verdict.

use crate::assertion::AssertionResult;
use serde::{Deserialize, Serialize};

/// Pass/fail outcome built once from the ordered results of a scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    /// True iff no mandatory result failed
    pub overall_passed: bool,
    /// Failed mandatory results, in declaration order
    pub failed_checks: Vec<AssertionResult>,
}

impl Verdict {
    /// Build a verdict; informational results never affect it
    #[must_use]
    pub fn from_results(results: &[AssertionResult]) -> Self {
        let failed_checks: Vec<AssertionResult> = results
            .iter()
            .filter(|r| r.is_blocking())
            .cloned()
            .collect();
        Self {
            overall_passed: failed_checks.is_empty(),
            failed_checks,
        }
    }

    /// Names of the failed mandatory checks
    #[must_use]
    pub fn failed_names(&self) -> Vec<&str> {
        self.failed_checks.iter().map(|r| r.name.as_str()).collect()
    }
}
