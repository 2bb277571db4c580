//! Artifact capture.
//!
//! Full-page screenshots at `<output_dir>/<scenario-slug>-<label>-<UTC>.png`.
//! Capture failures are diagnostics, they never change a verdict.

use crate::driver::SessionDriver;
use crate::session::Session;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Label of the artifact taken right after login
pub const LOGIN_LABEL: &str = "login";

/// Label of the artifact taken on the target view (or on abort)
pub const FINAL_LABEL: &str = "final";

/// Result of a capture attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureOutcome {
    /// Image written to the path
    Saved(PathBuf),
    /// Capture failed
    Failed {
        /// Failure description
        reason: String,
    },
}

impl CaptureOutcome {
    /// Path of the saved artifact
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Saved(path) => Some(path),
            Self::Failed { .. } => None,
        }
    }
}

/// Lowercase, dash-separated form of a scenario name
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        "scenario".to_string()
    } else {
        slug.to_string()
    }
}

/// Writes screenshots under an output directory
#[derive(Debug, Clone)]
pub struct ArtifactCapture {
    output_dir: PathBuf,
}

impl ArtifactCapture {
    /// Create a capture rooted at `output_dir` (created on demand)
    #[must_use]
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Output directory
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Deterministic artifact path for a scenario, label and instant
    #[must_use]
    pub fn artifact_path(&self, scenario: &str, label: &str, at: DateTime<Utc>) -> PathBuf {
        self.output_dir.join(format!(
            "{}-{}-{}.png",
            slugify(scenario),
            slugify(label),
            at.format("%Y%m%dT%H%M%S%.3fZ")
        ))
    }

    /// Take a full-page screenshot of the session's current page
    pub async fn capture<D: SessionDriver>(
        &self,
        session: &Session<D>,
        scenario: &str,
        label: &str,
    ) -> CaptureOutcome {
        let path = self.artifact_path(scenario, label, Utc::now());
        let outcome = session.screenshot(&path, true).await;
        if let CaptureOutcome::Failed { ref reason } = outcome {
            warn!(scenario, label, reason = %reason, "Artifact capture failed");
        }
        outcome
    }
}
