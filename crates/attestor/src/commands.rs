//! CLI command definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Attestor: browser acceptance checks for an authenticated admin table
#[derive(Parser, Debug)]
#[command(name = "attestor")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Log line format (text, json)
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormatArg,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run scenarios against a live front end
    Run(RunArgs),

    /// Parse and validate scenario files without launching a browser
    Validate(ValidateArgs),

    /// Write a starter scenario for the admin events table
    Init(InitArgs),
}

/// Arguments for the run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Scenario files
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Number of scenarios run concurrently (0 = one per CPU)
    #[arg(short, long, default_value = "1")]
    pub jobs: usize,

    /// Artifact and report directory (overrides the scenario files)
    #[arg(short, long, env = "ATTEST_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Base URL of the front end (overrides the scenario files)
    #[arg(long, env = "ATTEST_BASE_URL")]
    pub base_url: Option<String>,

    /// Login identifier (overrides the scenario files)
    #[arg(long, env = "ATTEST_IDENTIFIER")]
    pub identifier: Option<String>,

    /// Login secret (overrides the scenario files)
    #[arg(long, env = "ATTEST_SECRET", hide_env_values = true)]
    pub secret: Option<String>,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// Also write a JUnit XML report to this path
    #[arg(long)]
    pub junit: Option<PathBuf>,
}

/// Arguments for the validate command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Scenario files
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

/// Arguments for the init command
#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Path of the scenario file to write
    #[arg(default_value = "attest.yaml")]
    pub path: PathBuf,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

/// Color argument for CLI
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}

/// Log format argument for CLI
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormatArg {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

impl From<LogFormatArg> for crate::config::LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Text => Self::Text,
            LogFormatArg::Json => Self::Json,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::config::{ColorChoice, LogFormat};

    mod cli_tests {
        use super::*;

        #[test]
        fn test_parse_run_command() {
            let cli = Cli::parse_from(["attestor", "run", "a.yaml", "b.yaml"]);
            if let Commands::Run(args) = cli.command {
                assert_eq!(args.files, vec![PathBuf::from("a.yaml"), PathBuf::from("b.yaml")]);
                assert_eq!(args.jobs, 1);
                assert!(!args.headed);
                assert!(args.junit.is_none());
            } else {
                panic!("expected Run command");
            }
        }

        #[test]
        fn test_run_requires_files() {
            assert!(Cli::try_parse_from(["attestor", "run"]).is_err());
        }

        #[test]
        fn test_parse_run_options() {
            let cli = Cli::parse_from([
                "attestor",
                "run",
                "a.yaml",
                "-j",
                "4",
                "--output-dir",
                "out",
                "--base-url",
                "http://staging.test",
                "--identifier",
                "qa@example.test",
                "--secret",
                "hunter2",
                "--headed",
                "--junit",
                "out/junit.xml",
            ]);
            if let Commands::Run(args) = cli.command {
                assert_eq!(args.jobs, 4);
                assert_eq!(args.output_dir, Some(PathBuf::from("out")));
                assert_eq!(args.base_url.as_deref(), Some("http://staging.test"));
                assert_eq!(args.identifier.as_deref(), Some("qa@example.test"));
                assert_eq!(args.secret.as_deref(), Some("hunter2"));
                assert!(args.headed);
                assert_eq!(args.junit, Some(PathBuf::from("out/junit.xml")));
            } else {
                panic!("expected Run command");
            }
        }

        #[test]
        fn test_parse_validate_command() {
            let cli = Cli::parse_from(["attestor", "validate", "a.yaml"]);
            assert!(matches!(cli.command, Commands::Validate(_)));
        }

        #[test]
        fn test_parse_init_default_path() {
            let cli = Cli::parse_from(["attestor", "init"]);
            if let Commands::Init(args) = cli.command {
                assert_eq!(args.path, PathBuf::from("attest.yaml"));
                assert!(!args.force);
            } else {
                panic!("expected Init command");
            }
        }

        #[test]
        fn test_global_flags() {
            let cli = Cli::parse_from([
                "attestor",
                "validate",
                "a.yaml",
                "-vv",
                "--color",
                "never",
                "--log-format",
                "json",
            ]);
            assert_eq!(cli.verbose, 2);
            assert!(matches!(cli.color, ColorArg::Never));
            assert!(matches!(cli.log_format, LogFormatArg::Json));
        }

        #[test]
        fn test_quiet_flag() {
            let cli = Cli::parse_from(["attestor", "-q", "init"]);
            assert!(cli.quiet);
        }
    }

    mod conversion_tests {
        use super::*;

        #[test]
        fn test_color_arg_conversion() {
            assert_eq!(ColorChoice::from(ColorArg::Auto), ColorChoice::Auto);
            assert_eq!(ColorChoice::from(ColorArg::Always), ColorChoice::Always);
            assert_eq!(ColorChoice::from(ColorArg::Never), ColorChoice::Never);
        }

        #[test]
        fn test_log_format_conversion() {
            assert_eq!(LogFormat::from(LogFormatArg::Text), LogFormat::Text);
            assert_eq!(LogFormat::from(LogFormatArg::Json), LogFormat::Json);
        }
    }
}
