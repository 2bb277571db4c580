//! Checks over a [`DomSnapshot`].
//!
//! Every check is a pure function of the snapshot: evaluating the same
//! check twice against an unchanged snapshot yields identical results.

use crate::snapshot::DomSnapshot;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether a result gates the verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Failure fails the scenario
    Mandatory,
    /// Reported only
    Informational,
}

impl Severity {
    /// Severity from a mandatory flag
    #[must_use]
    pub const fn from_mandatory(mandatory: bool) -> Self {
        if mandatory {
            Self::Mandatory
        } else {
            Self::Informational
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mandatory => f.write_str("mandatory"),
            Self::Informational => f.write_str("informational"),
        }
    }
}

/// Result of a single named check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionResult {
    /// Check name
    pub name: String,
    /// Expected value, human readable
    pub expected: String,
    /// Observed value, human readable
    pub actual: String,
    /// Whether the check passed
    pub passed: bool,
    /// Whether the result gates the verdict
    pub severity: Severity,
}

impl AssertionResult {
    /// Create a result
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
        passed: bool,
        severity: Severity,
    ) -> Self {
        Self {
            name: name.into(),
            expected: expected.into(),
            actual: actual.into(),
            passed,
            severity,
        }
    }

    /// Failed mandatory result for an aborted step
    #[must_use]
    pub fn step_failed(step: impl Into<String>, error: impl fmt::Display) -> Self {
        Self::new(step, "step completes", error.to_string(), false, Severity::Mandatory)
    }

    /// Whether this result fails the verdict
    #[must_use]
    pub fn is_blocking(&self) -> bool {
        !self.passed && self.severity == Severity::Mandatory
    }
}

const fn default_true() -> bool {
    true
}

const fn default_one() -> usize {
    1
}

const fn default_sample() -> usize {
    3
}

/// Declarative structural check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Check {
    /// A header cell with `label` exists; optionally the exact header count
    Header {
        /// Expected header text (trimmed, exact)
        label: String,
        /// Exact number of header cells
        #[serde(default, skip_serializing_if = "Option::is_none")]
        expected_count: Option<usize>,
        /// Gates the verdict
        #[serde(default = "default_true")]
        mandatory: bool,
    },
    /// At least `min` badges are rendered
    Badges {
        /// Minimum badge count
        #[serde(default = "default_one")]
        min: usize,
        /// Number of badge texts reported
        #[serde(default = "default_sample")]
        sample: usize,
        /// Gates the verdict
        #[serde(default = "default_true")]
        mandatory: bool,
    },
    /// The first data row carries a badge in a 1-based column
    RowBadge {
        /// 1-based column
        column: usize,
        /// Gates the verdict
        #[serde(default)]
        mandatory: bool,
    },
    /// Number of data rows
    RowCount {
        /// Minimum rows
        #[serde(default)]
        min: usize,
        /// Exact rows
        #[serde(default, skip_serializing_if = "Option::is_none")]
        exact: Option<usize>,
        /// Gates the verdict
        #[serde(default = "default_true")]
        mandatory: bool,
    },
    /// Literal text presence (or absence) in the markup
    Content {
        /// Text searched for
        text: String,
        /// Expect presence (`true`) or absence (`false`)
        #[serde(default = "default_true")]
        present: bool,
        /// Gates the verdict
        #[serde(default)]
        mandatory: bool,
    },
    /// No console errors were captured
    ConsoleClean {
        /// Substrings of messages to ignore
        #[serde(default)]
        ignore: Vec<String>,
        /// Gates the verdict
        #[serde(default)]
        mandatory: bool,
    },
}

impl Check {
    /// Header check with an exact count
    #[must_use]
    pub fn header(label: impl Into<String>, expected_count: Option<usize>) -> Self {
        Self::Header {
            label: label.into(),
            expected_count,
            mandatory: true,
        }
    }

    /// Whether the check gates the verdict
    #[must_use]
    pub const fn is_mandatory(&self) -> bool {
        match self {
            Self::Header { mandatory, .. }
            | Self::Badges { mandatory, .. }
            | Self::RowBadge { mandatory, .. }
            | Self::RowCount { mandatory, .. }
            | Self::Content { mandatory, .. }
            | Self::ConsoleClean { mandatory, .. } => *mandatory,
        }
    }

    /// Short name used in reports
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            Self::Header { label, .. } => format!("header '{label}'"),
            Self::Badges { .. } => "badges".to_string(),
            Self::RowBadge { column, .. } => format!("row badge column {column}"),
            Self::RowCount { .. } => "row count".to_string(),
            Self::Content { text, present: true, .. } => format!("content contains '{text}'"),
            Self::Content { text, .. } => format!("content lacks '{text}'"),
            Self::ConsoleClean { .. } => "console clean".to_string(),
        }
    }

    /// Evaluate against a snapshot
    #[must_use]
    pub fn evaluate(&self, snapshot: &DomSnapshot) -> Vec<AssertionResult> {
        let severity = Severity::from_mandatory(self.is_mandatory());
        match self {
            Self::Header {
                label,
                expected_count,
                ..
            } => {
                let want = label.trim();
                let present = snapshot.headers.iter().any(|h| h.trim() == want);
                let mut results = vec![AssertionResult::new(
                    self.name(),
                    format!("header '{want}' present"),
                    format!("headers {:?}", snapshot.headers),
                    present,
                    severity,
                )];
                if let Some(count) = expected_count {
                    results.push(AssertionResult::new(
                        "header count",
                        count.to_string(),
                        snapshot.headers.len().to_string(),
                        snapshot.headers.len() == *count,
                        severity,
                    ));
                }
                results
            }
            Self::Badges { min, sample, .. } => {
                let shown: Vec<&String> = snapshot.badges.iter().take(*sample).collect();
                vec![AssertionResult::new(
                    self.name(),
                    format!(">= {min}"),
                    format!("{} (first: {shown:?})", snapshot.badges.len()),
                    snapshot.badges.len() >= *min,
                    severity,
                )]
            }
            Self::RowBadge { column, .. } => {
                let expected = format!("badge in column {column} of first row");
                let result = match (snapshot.rows.is_empty(), snapshot.first_row_cell(*column)) {
                    // empty match set: reported, never an error
                    (true, _) => AssertionResult::new(
                        self.name(),
                        expected,
                        "no data rows (empty match set)",
                        false,
                        severity,
                    ),
                    (false, None) => AssertionResult::new(
                        self.name(),
                        expected,
                        format!("first row has {} cells", snapshot.rows[0].len()),
                        false,
                        severity,
                    ),
                    (false, Some(cell)) => AssertionResult::new(
                        self.name(),
                        expected,
                        if cell.badges.is_empty() {
                            format!("no badge (cell text '{}')", cell.text)
                        } else {
                            format!("badges {:?}", cell.badges)
                        },
                        !cell.badges.is_empty(),
                        severity,
                    ),
                };
                vec![result]
            }
            Self::RowCount { min, exact, .. } => {
                let count = snapshot.rows.len();
                let (expected, passed) = match exact {
                    Some(exact) => (format!("== {exact}"), count == *exact),
                    None => (format!(">= {min}"), count >= *min),
                };
                vec![AssertionResult::new(
                    self.name(),
                    expected,
                    count.to_string(),
                    passed,
                    severity,
                )]
            }
            Self::Content { text, present, .. } => {
                let found = snapshot.markup.contains(text.as_str());
                vec![AssertionResult::new(
                    self.name(),
                    if *present { "present" } else { "absent" },
                    if found { "present" } else { "absent" },
                    found == *present,
                    severity,
                )]
            }
            Self::ConsoleClean { ignore, .. } => {
                let errors: Vec<&str> = snapshot
                    .console
                    .iter()
                    .filter(|m| m.level.is_error())
                    .filter(|m| !ignore.iter().any(|pattern| m.text.contains(pattern.as_str())))
                    .map(|m| m.text.as_str())
                    .collect();
                let actual = match errors.first() {
                    None => "0 errors".to_string(),
                    Some(first) => format!("{} errors (first: {first})", errors.len()),
                };
                vec![AssertionResult::new(
                    self.name(),
                    "0 errors",
                    actual,
                    errors.is_empty(),
                    severity,
                )]
            }
        }
    }
}
