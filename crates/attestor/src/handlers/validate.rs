//! Validate command handler

use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::ProgressReporter;
use crate::ValidateArgs;
use attest::Scenario;
use std::path::Path;

/// Load and validate one scenario file
pub fn validate_file(path: &Path) -> CliResult<Scenario> {
    Scenario::load(path).map_err(|e| CliError::scenario_file(path, e))
}

/// Execute the validate command
pub fn execute_validate(config: &CliConfig, args: &ValidateArgs) -> CliResult<()> {
    let reporter = ProgressReporter::new(config.color.should_color(), config.verbosity.is_quiet());
    let mut invalid = 0;
    for path in &args.files {
        match validate_file(path) {
            Ok(scenario) => reporter.success(&format!(
                "{}: '{}' ({} checks, up to {} results)",
                path.display(),
                scenario.name,
                scenario.checks.len(),
                scenario.declared_results()
            )),
            Err(e) => {
                invalid += 1;
                reporter.failure(&e.to_string());
            }
        }
    }
    if invalid > 0 {
        return Err(CliError::config(format!(
            "{invalid} of {} scenario files are invalid",
            args.files.len()
        )));
    }
    Ok(())
}
