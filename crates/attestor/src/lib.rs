//! Attestor CLI library
//!
//! Command-line interface for the Attest acceptance harness: loads
//! scenario files, runs them against a live front end and maps verdicts
//! to the process exit status.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

mod commands;
mod config;
mod error;
pub mod handlers;
mod output;
mod runner;

pub use commands::{Cli, ColorArg, Commands, InitArgs, LogFormatArg, RunArgs, ValidateArgs};
pub use config::{CliConfig, ColorChoice, LogFormat, Verbosity};
pub use error::{CliError, CliResult};
pub use output::{format_result, ProgressReporter};
pub use runner::{load_scenario, report_path, LoadedScenario, SuiteRunner};
