//! Scenario YAML schema.
//!
//! One parameterised description drives every run: where the app lives,
//! how to log in, which view to open, how to wait and which checks to
//! evaluate. Fixture values come from the environment through `${VAR}`
//! placeholders (`${VAR:-default}` supplies a fallback).

use crate::assertion::Check;
use crate::auth::{Credentials, LoginForm};
use crate::driver::DriverConfig;
use crate::locator::LocatorChain;
use crate::result::{AttestError, AttestResult};
use crate::snapshot::TableSelectors;
use crate::wait::{Timeouts, UrlPattern, WaitMode};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Supported schema version
pub const SCENARIO_VERSION: &str = "1.0";

/// Default artifact directory
pub const DEFAULT_OUTPUT_DIR: &str = "test-results";

/// Variable carrying the base URL
pub const BASE_URL_VAR: &str = "ATTEST_BASE_URL";

/// Variable carrying the login identifier
pub const IDENTIFIER_VAR: &str = "ATTEST_IDENTIFIER";

/// Variable carrying the login secret
pub const SECRET_VAR: &str = "ATTEST_SECRET";

/// Starter scenario: admin events table, strict success definition
/// (exact header count, "Type" label, badges present)
pub const CANONICAL_SCENARIO: &str = r#"version: "1.0"
name: Admin events table
description: Admin events list renders the Type column with badges
base_url: "${ATTEST_BASE_URL:-http://localhost:5173}"
health_url: "${ATTEST_HEALTH_URL:-http://localhost:5655/health}"
credentials:
  identifier: "${ATTEST_IDENTIFIER}"
  secret: "${ATTEST_SECRET}"
login:
  path: /login
  success_url:
    glob: "**/dashboard"
target: /admin/events
wait: network_idle
table:
  header_cell: table thead th
  badge: table .mantine-Badge-root, table .badge
  data_row: '[data-testid="event-row"]'
  cell: td
checks:
  - type: header
    label: Type
    expected_count: 6
  - type: badges
    min: 1
    sample: 3
  - type: row_count
    min: 1
  - type: row_badge
    column: 2
  - type: content
    text: Access Denied
    present: false
  - type: console_clean
timeouts:
  navigation_ms: 30000
  login_ms: 15000
  stable_ms: 30000
output_dir: test-results
"#;

fn default_version() -> String {
    SCENARIO_VERSION.to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_DIR)
}

const fn default_true() -> bool {
    true
}

/// A complete, self-contained scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Schema version (must be "1.0")
    #[serde(default = "default_version")]
    pub version: String,
    /// Scenario name (used for artifact names)
    pub name: String,
    /// Free-form description
    #[serde(default)]
    pub description: String,
    /// Base URL of the application under test
    pub base_url: String,
    /// Optional health endpoint checked before the browser starts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_url: Option<String>,
    /// Credentials; no login step when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<Credentials>,
    /// Login form description
    #[serde(default)]
    pub login: LoginForm,
    /// Route of the view under test
    pub target: String,
    /// How to wait for the target view to settle
    #[serde(default, with = "serde_yaml_ng::with::singleton_map_recursive")]
    pub wait: WaitMode,
    /// Table selectors
    #[serde(default)]
    pub table: TableSelectors,
    /// Checks, in declaration order
    pub checks: Vec<Check>,
    /// Bounds for every suspension point
    #[serde(default)]
    pub timeouts: Timeouts,
    /// Browser settings
    #[serde(default)]
    pub driver: DriverConfig,
    /// Artifact directory
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Take screenshots
    #[serde(default = "default_true")]
    pub screenshots: bool,
}

/// Values that replace what a scenario file declares
#[derive(Debug, Clone, Default)]
pub struct ScenarioOverrides {
    /// Base URL
    pub base_url: Option<String>,
    /// Login identifier
    pub identifier: Option<String>,
    /// Login secret
    pub secret: Option<String>,
    /// Artifact directory
    pub output_dir: Option<PathBuf>,
    /// Show the browser window
    pub headed: bool,
}

impl ScenarioOverrides {
    /// Value an override supplies for a placeholder variable
    ///
    /// The CLI flags stand in for the `ATTEST_*` variables of the same
    /// meaning, so a file referencing them loads without the environment.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<String> {
        match name {
            BASE_URL_VAR => self.base_url.clone(),
            IDENTIFIER_VAR => self.identifier.clone(),
            SECRET_VAR => self.secret.clone(),
            _ => None,
        }
    }
}

impl Scenario {
    /// Parse and validate a scenario, expanding placeholders from the
    /// process environment
    ///
    /// # Errors
    ///
    /// `Scenario` for unset variables or invalid content, `Yaml` for
    /// malformed documents.
    pub fn from_yaml(yaml: &str) -> AttestResult<Self> {
        Self::from_yaml_with(yaml, |name| std::env::var(name).ok())
    }

    /// Parse and validate with a custom variable lookup
    ///
    /// Placeholders are expanded inside parsed string values, so a
    /// substituted value is never read as YAML.
    ///
    /// # Errors
    ///
    /// See [`Scenario::from_yaml`].
    pub fn from_yaml_with(
        yaml: &str,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> AttestResult<Self> {
        let mut document: serde_yaml_ng::Value = serde_yaml_ng::from_str(yaml)?;
        expand_value(&mut document, &lookup)?;
        let scenario: Self = serde_yaml_ng::from_value(document)?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Load a scenario file
    ///
    /// # Errors
    ///
    /// `Io` when the file cannot be read, otherwise see
    /// [`Scenario::from_yaml`].
    pub fn load(path: &Path) -> AttestResult<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml(&yaml)
    }

    /// Load a scenario file with overrides
    ///
    /// Overrides fill the placeholders they stand for before the
    /// environment is consulted, then replace the declared values.
    ///
    /// # Errors
    ///
    /// See [`Scenario::load`] and [`Scenario::with_overrides`].
    pub fn load_with(path: &Path, overrides: &ScenarioOverrides) -> AttestResult<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_with(&yaml, |name| {
            overrides.lookup(name).or_else(|| std::env::var(name).ok())
        })?
        .with_overrides(overrides)
    }

    /// Apply overrides, then re-validate
    ///
    /// # Errors
    ///
    /// `Scenario` when the result is invalid (e.g. only one half of the
    /// credentials is known).
    pub fn with_overrides(mut self, overrides: &ScenarioOverrides) -> AttestResult<Self> {
        if let Some(ref url) = overrides.base_url {
            self.base_url.clone_from(url);
        }
        if let Some(ref dir) = overrides.output_dir {
            self.output_dir.clone_from(dir);
        }
        if overrides.headed {
            self.driver.headless = false;
        }
        let (identifier, secret) = (&overrides.identifier, &overrides.secret);
        if let Some(creds) = self.credentials.as_mut() {
            if let Some(id) = identifier {
                creds.identifier.clone_from(id);
            }
            if let Some(s) = secret {
                creds.secret.clone_from(s);
            }
        } else if let (Some(id), Some(s)) = (identifier, secret) {
            self.credentials = Some(Credentials::new(id.clone(), s.clone()));
        } else if identifier.is_some() || secret.is_some() {
            return Err(AttestError::scenario(
                "both identifier and secret are required when the scenario declares no credentials",
            ));
        }
        self.validate()?;
        Ok(self)
    }

    /// Validate the scenario
    ///
    /// # Errors
    ///
    /// `Scenario` describing the first problem found.
    pub fn validate(&self) -> AttestResult<()> {
        if self.version != SCENARIO_VERSION {
            return Err(AttestError::scenario(format!(
                "unsupported version '{}', expected '{SCENARIO_VERSION}'",
                self.version
            )));
        }
        if self.name.trim().is_empty() {
            return Err(AttestError::scenario("name must not be empty"));
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(AttestError::scenario(format!(
                "base_url '{}' must be an http(s) URL",
                self.base_url
            )));
        }
        if let Some(ref url) = self.health_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(AttestError::scenario(format!(
                    "health_url '{url}' must be an http(s) URL"
                )));
            }
        }
        if self.target.trim().is_empty() {
            return Err(AttestError::scenario("target must not be empty"));
        }
        if let Some(ref creds) = self.credentials {
            if creds.identifier.is_empty() || creds.secret.is_empty() {
                return Err(AttestError::scenario(
                    "credentials need a non-empty identifier and secret",
                ));
            }
            self.validate_login()?;
        }
        if self.checks.is_empty() {
            return Err(AttestError::scenario("at least one check is required"));
        }
        for check in &self.checks {
            validate_check(check)?;
        }
        if let WaitMode::Url(ref pattern) = self.wait {
            validate_pattern("wait", pattern)?;
        }
        if self.timeouts.poll_interval_ms == 0 {
            return Err(AttestError::scenario("timeouts.poll_interval_ms must be positive"));
        }
        Ok(())
    }

    fn validate_login(&self) -> AttestResult<()> {
        let chains: [(&str, &LocatorChain); 4] = [
            ("login.identifier", &self.login.identifier),
            ("login.secret", &self.login.secret),
            ("login.submit", &self.login.submit),
            ("login.error_indicator", &self.login.error_indicator),
        ];
        if let Some((field, _)) = chains.iter().find(|(_, chain)| chain.is_empty()) {
            return Err(AttestError::scenario(format!("{field} needs at least one locator")));
        }
        validate_pattern("login.success_url", &self.login.success_url)
    }

    /// Number of results the checks produce at most
    #[must_use]
    pub fn declared_results(&self) -> usize {
        self.checks
            .iter()
            .map(|c| match c {
                Check::Header {
                    expected_count: Some(_),
                    ..
                } => 2,
                _ => 1,
            })
            .sum()
    }
}

fn validate_pattern(field: &str, pattern: &UrlPattern) -> AttestResult<()> {
    pattern
        .validate()
        .map_err(|e| AttestError::scenario(format!("{field}: invalid regex: {e}")))
}

fn validate_check(check: &Check) -> AttestResult<()> {
    match check {
        Check::Header { label, .. } if label.trim().is_empty() => {
            Err(AttestError::scenario("header check needs a label"))
        }
        Check::RowBadge { column: 0, .. } => {
            Err(AttestError::scenario("row_badge column is 1-based"))
        }
        Check::RowCount {
            min,
            exact: Some(exact),
            ..
        } if exact < min => Err(AttestError::scenario(format!(
            "row_count exact {exact} is below min {min}"
        ))),
        Check::Content { text, .. } if text.is_empty() => {
            Err(AttestError::scenario("content check needs text"))
        }
        _ => Ok(()),
    }
}

fn expand_value(
    value: &mut serde_yaml_ng::Value,
    lookup: &impl Fn(&str) -> Option<String>,
) -> AttestResult<()> {
    use serde_yaml_ng::Value;
    match value {
        Value::String(text) if text.contains("${") => {
            *text = expand_env(text, lookup)?;
        }
        Value::Sequence(items) => {
            for item in items {
                expand_value(item, lookup)?;
            }
        }
        Value::Mapping(map) => {
            for (_, item) in map.iter_mut() {
                expand_value(item, lookup)?;
            }
        }
        Value::Tagged(tagged) => expand_value(&mut tagged.value, lookup)?,
        _ => {}
    }
    Ok(())
}

/// Expand `${VAR}` and `${VAR:-default}` placeholders
///
/// # Errors
///
/// `Scenario` naming the first unset variable without a default, or an
/// unterminated placeholder.
pub fn expand_env(text: &str, lookup: impl Fn(&str) -> Option<String>) -> AttestResult<String> {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            return Err(AttestError::scenario("unterminated ${ placeholder"));
        };
        let body = &after[..end];
        let (name, default) = match body.split_once(":-") {
            Some((name, default)) => (name.trim(), Some(default)),
            None => (body.trim(), None),
        };
        match lookup(name).filter(|v| !v.is_empty()) {
            Some(value) => out.push_str(&value),
            None => match default {
                Some(default) => out.push_str(default),
                None => {
                    return Err(AttestError::scenario(format!(
                        "environment variable {name} is not set"
                    )))
                }
            },
        }
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    Ok(out)
}
