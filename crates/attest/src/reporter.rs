//! Scenario reports.
//!
//! A [`ScenarioReport`] is everything one run produced; the [`Reporter`]
//! collects reports and renders them as text, JSON or JUnit XML.

use crate::assertion::{AssertionResult, Severity};
use crate::auth::AuthResult;
use crate::capture::CaptureOutcome;
use crate::driver::ConsoleMessage;
use crate::result::AttestResult;
use crate::verdict::Verdict;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::Path;
use std::time::Duration;

/// Screenshot taken during a scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    /// Capture label (`login`, `final`)
    pub label: String,
    /// Capture outcome
    pub outcome: CaptureOutcome,
}

/// Duration of one runner step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepTiming {
    /// Step name
    pub step: String,
    /// Milliseconds spent
    pub ms: u64,
}

/// Everything one scenario run produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioReport {
    /// Scenario name
    pub scenario: String,
    /// Start instant
    pub started_at: DateTime<Utc>,
    /// Total wall time in milliseconds
    pub duration_ms: u64,
    /// Login outcome, when a login step ran
    pub auth: Option<AuthResult>,
    /// Every result, in evaluation order
    pub results: Vec<AssertionResult>,
    /// Verdict built from `results`
    pub verdict: Verdict,
    /// Screenshots
    pub artifacts: Vec<Artifact>,
    /// Console messages captured during the run
    pub console: Vec<ConsoleMessage>,
    /// Step that aborted the run
    pub aborted_at: Option<String>,
    /// Per-step timings
    pub timings: Vec<StepTiming>,
}

impl ScenarioReport {
    /// Whether the scenario passed
    #[must_use]
    pub const fn passed(&self) -> bool {
        self.verdict.overall_passed
    }

    /// Number of error-level console messages
    #[must_use]
    pub fn console_errors(&self) -> usize {
        self.console.iter().filter(|m| m.level.is_error()).count()
    }

    /// Write the report as pretty JSON
    ///
    /// # Errors
    ///
    /// `Json` or `Io` errors.
    pub fn write_json(&self, path: &Path) -> AttestResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// Collects scenario reports
#[derive(Debug, Clone)]
pub struct Reporter {
    suite_name: String,
    reports: Vec<ScenarioReport>,
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new("attest")
    }
}

impl Reporter {
    /// Create a reporter for a suite
    #[must_use]
    pub fn new(suite_name: impl Into<String>) -> Self {
        Self {
            suite_name: suite_name.into(),
            reports: Vec::new(),
        }
    }

    /// Record a report
    pub fn record(&mut self, report: ScenarioReport) {
        self.reports.push(report);
    }

    /// Recorded reports
    #[must_use]
    pub fn reports(&self) -> &[ScenarioReport] {
        &self.reports
    }

    /// Count passed scenarios
    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.reports.iter().filter(|r| r.passed()).count()
    }

    /// Count failed scenarios
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.total_count() - self.passed_count()
    }

    /// Count all scenarios
    #[must_use]
    pub fn total_count(&self) -> usize {
        self.reports.len()
    }

    /// Check if all scenarios passed
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.reports.iter().all(ScenarioReport::passed)
    }

    /// One-line summary
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{}: {}/{} scenarios passed",
            self.suite_name,
            self.passed_count(),
            self.total_count()
        )
    }

    /// Write JUnit XML report
    ///
    /// # Errors
    ///
    /// Returns error if file writing fails
    pub fn generate_junit(&self, output_path: &Path) -> AttestResult<()> {
        if let Some(parent) = output_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(output_path, self.render_junit())?;
        Ok(())
    }

    /// Render JUnit XML: one testsuite per scenario, one testcase per
    /// result; only mandatory failures are `<failure>`s
    #[must_use]
    pub fn render_junit(&self) -> String {
        let mut xml = String::new();
        let tests: usize = self.reports.iter().map(|r| r.results.len()).sum();
        let failures: usize = self.reports.iter().map(|r| r.verdict.failed_checks.len()).sum();

        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        xml.push('\n');
        let _ = writeln!(
            xml,
            r#"<testsuites name="{}" tests="{tests}" failures="{failures}">"#,
            escape_xml(&self.suite_name)
        );

        for report in &self.reports {
            let _ = writeln!(
                xml,
                r#"  <testsuite name="{}" tests="{}" failures="{}" time="{:.3}" timestamp="{}">"#,
                escape_xml(&report.scenario),
                report.results.len(),
                report.verdict.failed_checks.len(),
                Duration::from_millis(report.duration_ms).as_secs_f64(),
                report.started_at.format("%Y-%m-%dT%H:%M:%S")
            );
            for result in &report.results {
                let _ = writeln!(
                    xml,
                    r#"    <testcase classname="{}" name="{}">"#,
                    escape_xml(&report.scenario),
                    escape_xml(&result.name)
                );
                let message = format!("expected {}, got {}", result.expected, result.actual);
                if result.is_blocking() {
                    let _ = writeln!(
                        xml,
                        r#"      <failure message="{}">{}</failure>"#,
                        escape_xml(&message),
                        escape_xml(&message)
                    );
                } else if !result.passed && result.severity == Severity::Informational {
                    let _ = writeln!(
                        xml,
                        "      <system-out>informational: {}</system-out>",
                        escape_xml(&message)
                    );
                }
                xml.push_str("    </testcase>\n");
            }
            xml.push_str("  </testsuite>\n");
        }

        xml.push_str("</testsuites>\n");
        xml
    }
}

/// Escape XML special characters
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
