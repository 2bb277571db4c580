//! Suite runner: loads scenario files, runs them concurrently, writes reports

use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::ProgressReporter;
use attest::{
    slugify, AttestResult, DriverConfig, Reporter, Scenario, ScenarioOverrides, ScenarioReport,
    ScenarioRunner, SessionDriver,
};
use futures::stream::{self, StreamExt};
use std::future::Future;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// A scenario with the file it came from
#[derive(Debug, Clone)]
pub struct LoadedScenario {
    /// Source file
    pub path: PathBuf,
    /// Parsed, overridden and validated scenario
    pub scenario: Scenario,
}

/// Load and validate one scenario file, applying overrides
pub fn load_scenario(path: &Path, overrides: &ScenarioOverrides) -> CliResult<LoadedScenario> {
    let scenario =
        Scenario::load_with(path, overrides).map_err(|e| CliError::scenario_file(path, e))?;
    Ok(LoadedScenario {
        path: path.to_path_buf(),
        scenario,
    })
}

/// Path of the JSON report for a scenario
#[must_use]
pub fn report_path(scenario: &Scenario) -> PathBuf {
    scenario
        .output_dir
        .join(format!("{}.json", slugify(&scenario.name)))
}

/// Runs a suite of scenarios
#[derive(Debug)]
pub struct SuiteRunner {
    config: CliConfig,
    runner: ScenarioRunner,
}

impl SuiteRunner {
    /// Create a new suite runner
    #[must_use]
    pub fn new(config: CliConfig) -> Self {
        Self {
            config,
            runner: ScenarioRunner::new(),
        }
    }

    /// Run scenarios, each in its own Chromium instance
    #[cfg(feature = "browser")]
    pub async fn run(
        &self,
        scenarios: &[LoadedScenario],
        progress: &ProgressReporter,
    ) -> CliResult<Reporter> {
        self.run_with(scenarios, progress, |config| async move {
            attest::ChromiumDriver::launch(&config).await
        })
        .await
    }

    /// Every scenario fails at launch when built without browser support
    #[cfg(not(feature = "browser"))]
    pub async fn run(
        &self,
        scenarios: &[LoadedScenario],
        progress: &ProgressReporter,
    ) -> CliResult<Reporter> {
        self.run_with(scenarios, progress, |_config| async {
            Err::<attest::MockDriver, _>(attest::AttestError::BrowserLaunch {
                message: "attestor was built without the `browser` feature".to_string(),
            })
        })
        .await
    }

    /// Run scenarios with drivers from `launch`
    ///
    /// At most `jobs` scenarios run at once; reports keep the input order.
    /// A scenario whose driver cannot be launched gets a failed report.
    pub async fn run_with<D, F, Fut>(
        &self,
        scenarios: &[LoadedScenario],
        progress: &ProgressReporter,
        launch: F,
    ) -> CliResult<Reporter>
    where
        D: SessionDriver,
        F: Fn(DriverConfig) -> Fut,
        Fut: Future<Output = AttestResult<D>>,
    {
        let jobs = self.config.effective_jobs().max(1);
        info!(scenarios = scenarios.len(), jobs, "Running suite");

        let runs = scenarios.iter().enumerate().map(|(index, loaded)| {
            let launch = &launch;
            async move {
                let scenario = &loaded.scenario;
                let report = match launch(scenario.driver.clone()).await {
                    Ok(driver) => self.runner.run(scenario, driver).await,
                    Err(e) => {
                        warn!(scenario = %scenario.name, error = %e, "Browser launch failed");
                        ScenarioRunner::launch_failed(scenario, &e)
                    }
                };
                (index, report)
            }
        });

        let mut finished: Vec<(usize, ScenarioReport)> = stream::iter(runs)
            .buffer_unordered(jobs)
            .inspect(|(_, report)| {
                progress.increment(1);
                progress.set_message(&report.scenario);
            })
            .collect()
            .await;
        finished.sort_by_key(|(index, _)| *index);

        let mut reporter = Reporter::new("attest");
        for (index, report) in finished {
            let path = report_path(&scenarios[index].scenario);
            report
                .write_json(&path)
                .map_err(|e| CliError::report_generation(format!("{}: {e}", path.display())))?;
            info!(scenario = %report.scenario, path = %path.display(), "Report written");
            reporter.record(report);
        }

        if let Some(ref junit) = self.config.junit {
            reporter
                .generate_junit(junit)
                .map_err(|e| CliError::report_generation(format!("{}: {e}", junit.display())))?;
            info!(path = %junit.display(), "JUnit report written");
        }
        info!(summary = %reporter.summary(), "Suite finished");
        Ok(reporter)
    }
}
