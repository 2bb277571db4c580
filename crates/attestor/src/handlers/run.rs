//! Run command handler

use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::ProgressReporter;
use crate::runner::{load_scenario, LoadedScenario, SuiteRunner};
use crate::RunArgs;
use attest::ScenarioOverrides;
use std::time::Instant;

/// Scenario overrides taken from flags and `ATTEST_*` variables
#[must_use]
pub fn overrides_from_args(config: &CliConfig, args: &RunArgs) -> ScenarioOverrides {
    ScenarioOverrides {
        base_url: args.base_url.clone(),
        identifier: args.identifier.clone(),
        secret: args.secret.clone(),
        output_dir: config.output_dir.clone().or_else(|| args.output_dir.clone()),
        headed: args.headed,
    }
}

/// Execute the run command
///
/// Every scenario file is loaded before any browser starts; a single
/// invalid file stops the run.
pub fn execute_run(config: &CliConfig, args: &RunArgs) -> CliResult<()> {
    let overrides = overrides_from_args(config, args);
    let scenarios = args
        .files
        .iter()
        .map(|path| load_scenario(path, &overrides))
        .collect::<CliResult<Vec<LoadedScenario>>>()?;

    let mut progress = ProgressReporter::new(config.color.should_color(), config.verbosity.is_quiet())
        .with_verbose(config.verbosity.is_verbose());
    progress.start_progress(scenarios.len() as u64, "Running scenarios");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let start = Instant::now();
    let suite = SuiteRunner::new(config.clone());
    let reporter = runtime.block_on(suite.run(&scenarios, &progress))?;
    progress.finish();

    for report in reporter.reports() {
        progress.scenario(report);
    }
    progress.summary(reporter.passed_count(), reporter.failed_count(), start.elapsed());

    if reporter.all_passed() {
        Ok(())
    } else {
        Err(CliError::ScenariosFailed {
            failed: reporter.failed_count(),
            total: reporter.total_count(),
        })
    }
}
