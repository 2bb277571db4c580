//! Output formatting and progress reporting

use attest::{AssertionResult, ScenarioReport, Severity};
use console::{style, Style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// One line per check result
#[must_use]
pub fn format_result(result: &AssertionResult, use_color: bool) -> String {
    let status = match (result.passed, result.severity, use_color) {
        (true, _, true) => style("PASS").green().bold().to_string(),
        (true, _, false) => "PASS".to_string(),
        (false, Severity::Mandatory, true) => style("FAIL").red().bold().to_string(),
        (false, Severity::Mandatory, false) => "FAIL".to_string(),
        (false, Severity::Informational, true) => style("NOTE").yellow().to_string(),
        (false, Severity::Informational, false) => "NOTE".to_string(),
    };
    let mut line = format!(
        "  {status} {} (expected {}, got {})",
        result.name, result.expected, result.actual
    );
    if result.severity == Severity::Informational {
        line.push_str(" [informational]");
    }
    line
}

/// Progress reporter for scenario execution
#[derive(Debug)]
pub struct ProgressReporter {
    term: Term,
    progress_bar: Option<ProgressBar>,
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode
    pub quiet: bool,
    /// Print every check result, not just failures
    pub verbose: bool,
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

impl ProgressReporter {
    /// Create a new progress reporter
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        Self {
            term: Term::stderr(),
            progress_bar: None,
            use_color,
            quiet,
            verbose: false,
        }
    }

    /// Print every check result
    #[must_use]
    pub const fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Start a progress bar over several scenarios
    pub fn start_progress(&mut self, total: u64, message: &str) {
        if self.quiet || total < 2 {
            return;
        }

        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        pb.set_message(message.to_string());
        self.progress_bar = Some(pb);
    }

    /// Increment progress
    pub fn increment(&self, delta: u64) {
        if let Some(ref pb) = self.progress_bar {
            pb.inc(delta);
        }
    }

    /// Update progress message
    pub fn set_message(&self, message: &str) {
        if let Some(ref pb) = self.progress_bar {
            pb.set_message(message.to_string());
        }
    }

    /// Finish progress bar
    pub fn finish(&self) {
        if let Some(ref pb) = self.progress_bar {
            pb.finish_and_clear();
        }
    }

    fn write_line(&self, line: &str) {
        match self.progress_bar {
            Some(ref pb) if !pb.is_finished() => pb.println(line),
            _ => {
                let _ = self.term.write_line(line);
            }
        }
    }

    fn prefixed(&self, symbol: &str, plain: &str, color: Style, message: &str) -> String {
        let prefix = if self.use_color {
            color.apply_to(symbol).to_string()
        } else {
            plain.to_string()
        };
        format!("{prefix} {message}")
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        if self.quiet {
            return;
        }
        self.write_line(&self.prefixed("✓", "PASS", Style::new().green().bold(), message));
    }

    /// Print a failure message
    pub fn failure(&self, message: &str) {
        // failures print even in quiet mode
        self.write_line(&self.prefixed("✗", "FAIL", Style::new().red().bold(), message));
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if self.quiet {
            return;
        }
        self.write_line(&self.prefixed("ℹ", "INFO", Style::new().blue().bold(), message));
    }

    /// Print one scenario report
    pub fn scenario(&self, report: &ScenarioReport) {
        let headline = format!("{} ({}ms)", report.scenario, report.duration_ms);
        if report.passed() {
            self.success(&headline);
        } else {
            self.failure(&headline);
        }
        for line in self.scenario_lines(report) {
            self.write_line(&line);
        }
    }

    /// Detail lines for a scenario report
    ///
    /// Every check result is listed, informational ones included; quiet
    /// mode keeps only blocking failures.
    #[must_use]
    pub fn scenario_lines(&self, report: &ScenarioReport) -> Vec<String> {
        let mut lines = Vec::new();
        if self.quiet {
            lines.extend(
                report
                    .results
                    .iter()
                    .filter(|r| r.is_blocking())
                    .map(|r| format_result(r, self.use_color)),
            );
            return lines;
        }

        if let Some(ref auth) = report.auth {
            if self.verbose || !auth.is_authenticated() {
                lines.push(format!("  login: {}", auth.describe()));
            }
        }
        lines.extend(report.results.iter().map(|r| format_result(r, self.use_color)));
        if let Some(ref step) = report.aborted_at {
            lines.push(format!("  aborted at {step}"));
        }
        let errors = report.console_errors();
        if errors > 0 {
            lines.push(format!("  console: {errors} error(s)"));
        }
        if self.verbose {
            for artifact in &report.artifacts {
                match artifact.outcome.path() {
                    Some(path) => lines.push(format!("  {}: {}", artifact.label, path.display())),
                    None => lines.push(format!("  {}: not captured", artifact.label)),
                }
            }
        }
        lines
    }

    /// Print suite summary
    pub fn summary(&self, passed: usize, failed: usize, duration: Duration) {
        if self.quiet && failed == 0 {
            return;
        }

        let _ = self.term.write_line("");

        let total = passed + failed;
        let duration_secs = duration.as_secs_f64();

        if self.use_color {
            let passed_style = Style::new().green().bold();
            let failed_style = Style::new().red().bold();

            let status = if failed > 0 {
                failed_style.apply_to("FAILED")
            } else {
                passed_style.apply_to("PASSED")
            };

            let _ = self.term.write_line(&format!(
                "{} {} scenarios in {:.2}s ({} passed, {} failed)",
                status,
                total,
                duration_secs,
                passed_style.apply_to(passed),
                if failed > 0 {
                    failed_style.apply_to(failed).to_string()
                } else {
                    failed.to_string()
                },
            ));
        } else {
            let status = if failed > 0 { "FAILED" } else { "PASSED" };
            let _ = self.term.write_line(&format!(
                "{status} {total} scenarios in {duration_secs:.2}s ({passed} passed, {failed} failed)"
            ));
        }
    }
}
