//! Scenario runner.
//!
//! Sequences one scenario against one session:
//!
//! ```text
//! preflight → authentication → navigation → wait → snapshot → checks
//!                                                      │
//!                     capture (always) ◄───────────────┘
//!                           │
//!                  console → verdict → report
//! ```
//!
//! An error in a step records a failed mandatory result named after the
//! step and skips the remaining steps; capture, console collection and
//! the verdict still happen.

use crate::assertion::{AssertionResult, Severity};
use crate::auth::{AuthFlow, AuthResult};
use crate::capture::{ArtifactCapture, FINAL_LABEL, LOGIN_LABEL};
use crate::driver::{ConsoleMessage, SessionDriver};
use crate::reporter::{Artifact, ScenarioReport, StepTiming};
use crate::result::{AttestError, AttestResult};
use crate::scenario::Scenario;
use crate::session::{bounded, Session};
use crate::snapshot::DomSnapshot;
use crate::verdict::Verdict;
use chrono::{DateTime, Utc};
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Step names used in results and timings
pub mod steps {
    /// Health check
    pub const PREFLIGHT: &str = "preflight";
    /// Browser launch
    pub const LAUNCH: &str = "launch";
    /// Login
    pub const AUTHENTICATION: &str = "authentication";
    /// Navigation to the target view
    pub const NAVIGATION: &str = "navigation";
    /// Stabilisation wait
    pub const WAIT: &str = "wait";
    /// DOM snapshot
    pub const SNAPSHOT: &str = "snapshot";
}

fn millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

/// Health payload `status` values accepted as healthy
fn is_healthy(status: &str) -> bool {
    ["healthy", "ok", "up", "pass"]
        .iter()
        .any(|s| status.eq_ignore_ascii_case(s))
}

/// Mutable state of one run
struct RunState {
    started_at: DateTime<Utc>,
    start: Instant,
    auth: Option<AuthResult>,
    results: Vec<AssertionResult>,
    artifacts: Vec<Artifact>,
    timings: Vec<StepTiming>,
    aborted_at: Option<String>,
}

impl RunState {
    fn new() -> Self {
        Self {
            started_at: Utc::now(),
            start: Instant::now(),
            auth: None,
            results: Vec::new(),
            artifacts: Vec::new(),
            timings: Vec::new(),
            aborted_at: None,
        }
    }

    fn abort(&mut self, step: &str, error: &AttestError) {
        warn!(step, error = %error, "Scenario step failed, skipping remaining steps");
        self.results.push(AssertionResult::step_failed(step, error));
        self.aborted_at = Some(step.to_string());
    }

    /// Run a step, timing it; `None` means the scenario aborted
    async fn step<T, F>(&mut self, name: &str, fut: F) -> Option<T>
    where
        F: Future<Output = AttestResult<T>>,
    {
        debug!(step = name, "Step started");
        let start = Instant::now();
        let result = fut.await;
        self.timings.push(StepTiming {
            step: name.to_string(),
            ms: millis(start.elapsed()),
        });
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                self.abort(name, &e);
                None
            }
        }
    }

    fn finish(self, scenario: &Scenario, console: Vec<ConsoleMessage>) -> ScenarioReport {
        let verdict = Verdict::from_results(&self.results);
        ScenarioReport {
            scenario: scenario.name.clone(),
            started_at: self.started_at,
            duration_ms: millis(self.start.elapsed()),
            auth: self.auth,
            results: self.results,
            verdict,
            artifacts: self.artifacts,
            console,
            aborted_at: self.aborted_at,
            timings: self.timings,
        }
    }
}

/// Runs scenarios; one instance can run many scenarios concurrently
#[derive(Debug, Clone)]
pub struct ScenarioRunner {
    http: reqwest::Client,
}

impl Default for ScenarioRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl ScenarioRunner {
    /// Create a runner
    #[must_use]
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }

    /// Run a scenario to completion; never fails, every fault ends up in
    /// the report
    pub async fn run<D: SessionDriver>(&self, scenario: &Scenario, driver: D) -> ScenarioReport {
        info!(scenario = %scenario.name, base_url = %scenario.base_url, "Scenario started");
        let mut state = RunState::new();
        let mut session = Session::new(driver, scenario.base_url.clone(), scenario.timeouts);
        let capture = ArtifactCapture::new(&scenario.output_dir);

        self.drive(scenario, &mut session, &capture, &mut state).await;

        if scenario.screenshots {
            let outcome = capture.capture(&session, &scenario.name, FINAL_LABEL).await;
            state.artifacts.push(Artifact {
                label: FINAL_LABEL.to_string(),
                outcome,
            });
        }
        let console = session.console_messages().await.unwrap_or_else(|e| {
            warn!(error = %e, "Could not read console messages");
            Vec::new()
        });
        if let Err(e) = session.close().await {
            warn!(error = %e, "Session did not close cleanly");
        }

        let report = state.finish(scenario, console);
        info!(
            scenario = %report.scenario,
            passed = report.passed(),
            failed = report.verdict.failed_checks.len(),
            duration_ms = report.duration_ms,
            "Scenario finished"
        );
        report
    }

    async fn drive<D: SessionDriver>(
        &self,
        scenario: &Scenario,
        session: &mut Session<D>,
        capture: &ArtifactCapture,
        state: &mut RunState,
    ) {
        if let Some(ref url) = scenario.health_url {
            let bound = scenario.timeouts.navigation();
            if state.step(steps::PREFLIGHT, self.preflight(url, bound)).await.is_none() {
                return;
            }
        }

        if let Some(ref credentials) = scenario.credentials {
            let mut flow = AuthFlow::new(&scenario.login);
            let Some(auth) = state
                .step(steps::AUTHENTICATION, flow.login(session, credentials))
                .await
            else {
                return;
            };
            let authenticated = auth.is_authenticated();
            state.results.push(AssertionResult::new(
                steps::AUTHENTICATION,
                "authenticated",
                auth.describe(),
                authenticated,
                Severity::Mandatory,
            ));
            state.auth = Some(auth);
            if !authenticated {
                warn!(scenario = %scenario.name, "Login failed, table checks skipped");
                state.aborted_at = Some(steps::AUTHENTICATION.to_string());
                return;
            }
            if scenario.screenshots {
                let outcome = capture.capture(session, &scenario.name, LOGIN_LABEL).await;
                state.artifacts.push(Artifact {
                    label: LOGIN_LABEL.to_string(),
                    outcome,
                });
            }
        }

        if state
            .step(steps::NAVIGATION, session.navigate(&scenario.target))
            .await
            .is_none()
        {
            return;
        }
        if state
            .step(steps::WAIT, session.wait_for_stable(&scenario.wait))
            .await
            .is_none()
        {
            return;
        }
        let Some(snapshot) = state
            .step(steps::SNAPSHOT, DomSnapshot::capture(session, &scenario.table))
            .await
        else {
            return;
        };

        for check in &scenario.checks {
            let results = check.evaluate(&snapshot);
            for r in &results {
                debug!(check = %r.name, passed = r.passed, severity = %r.severity, "Check evaluated");
            }
            state.results.extend(results);
        }
    }

    /// Check a health endpoint
    ///
    /// A 2xx response passes unless its JSON body carries a `status` field
    /// that is not a healthy value.
    ///
    /// # Errors
    ///
    /// `HealthCheck` for transport errors, non-2xx statuses and unhealthy
    /// payloads, `Timeout` when the bound elapses.
    pub async fn preflight(&self, url: &str, bound: Duration) -> AttestResult<()> {
        let failed = |message: String| AttestError::HealthCheck {
            url: url.to_string(),
            message,
        };
        info!(url, "Checking health endpoint");
        let check = async {
            let response = self
                .http
                .get(url)
                .send()
                .await
                .map_err(|e| failed(e.to_string()))?;
            let status = response.status();
            if !status.is_success() {
                return Err(failed(format!("HTTP {status}")));
            }
            let body = response.text().await.map_err(|e| failed(e.to_string()))?;
            if let Ok(json) = serde_json::from_str::<serde_json::Value>(&body) {
                if let Some(reported) = json.get("status").and_then(serde_json::Value::as_str) {
                    if !is_healthy(reported) {
                        return Err(failed(format!("status {reported}")));
                    }
                }
            }
            Ok(())
        };
        bounded("health check", bound, check).await
    }

    /// Report for a scenario whose browser could not be started
    #[must_use]
    pub fn launch_failed(scenario: &Scenario, error: &AttestError) -> ScenarioReport {
        let mut state = RunState::new();
        state.abort(steps::LAUNCH, error);
        state.finish(scenario, Vec::new())
    }
}
