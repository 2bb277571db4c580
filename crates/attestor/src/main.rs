//! Attestor: browser acceptance checks from the command line
//!
//! ## Usage
//!
//! ```bash
//! attestor init                          # Write attest.yaml
//! attestor validate attest.yaml          # Check scenario files
//! attestor run attest.yaml -j 2          # Run against a live front end
//! attestor run attest.yaml --junit out/junit.xml
//! ```

use attestor::{
    handlers::{execute_init, execute_run, execute_validate},
    Cli, CliConfig, CliError, CliResult, ColorChoice, Commands, LogFormat, Verbosity,
};
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(CliError::ScenariosFailed { .. }) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();
    let config = build_config(&cli);
    init_tracing(&config);

    match cli.command {
        Commands::Run(args) => {
            let mut config = config.with_jobs(args.jobs);
            if let Some(ref dir) = args.output_dir {
                config = config.with_output_dir(dir.clone());
            }
            if let Some(ref junit) = args.junit {
                config = config.with_junit(junit.clone());
            }
            execute_run(&config, &args)
        }
        Commands::Validate(args) => execute_validate(&config, &args),
        Commands::Init(args) => execute_init(&config, &args),
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    let verbosity = if cli.quiet {
        Verbosity::Quiet
    } else {
        match cli.verbose {
            0 => Verbosity::Normal,
            1 => Verbosity::Verbose,
            _ => Verbosity::Debug,
        }
    };

    let color: ColorChoice = cli.color.into();
    let log_format: LogFormat = cli.log_format.into();

    CliConfig::new()
        .with_verbosity(verbosity)
        .with_color(color)
        .with_log_format(log_format)
}

/// Install the log subscriber; `RUST_LOG` wins over the verbosity flags
fn init_tracing(config: &CliConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.verbosity.log_filter()));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    let _ = match config.log_format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.with_ansi(config.color.should_color()).try_init(),
    };
}
