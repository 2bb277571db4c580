//! Init command handler

use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::ProgressReporter;
use crate::InitArgs;
use attest::CANONICAL_SCENARIO;

/// Starter scenario: the admin events table with the strict success
/// definition
#[must_use]
pub const fn starter_scenario() -> &'static str {
    CANONICAL_SCENARIO
}

/// Execute the init command
pub fn execute_init(config: &CliConfig, args: &InitArgs) -> CliResult<()> {
    let reporter = ProgressReporter::new(config.color.should_color(), config.verbosity.is_quiet());
    if args.path.exists() && !args.force {
        return Err(CliError::invalid_argument(format!(
            "{} already exists (use --force to overwrite)",
            args.path.display()
        )));
    }
    if let Some(parent) = args.path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&args.path, starter_scenario())?;

    reporter.success(&format!("Created {}", args.path.display()));
    reporter.info("Set ATTEST_IDENTIFIER and ATTEST_SECRET, then run: attestor run <file>");
    Ok(())
}
