//! Result and error types for attest.

use thiserror::Error;

/// Result type for attest operations
pub type AttestResult<T> = Result<T, AttestError>;

/// Errors that can occur while driving a scenario
#[derive(Debug, Error)]
pub enum AttestError {
    /// Browser executable not found
    #[error("Browser not found. Install Chromium or set CHROMIUM_PATH")]
    BrowserNotFound,

    /// Browser launch error
    #[error("Failed to launch browser: {message}")]
    BrowserLaunch {
        /// Error message
        message: String,
    },

    /// Driver-level fault (CDP command failed, page crashed, ...)
    #[error("Driver error: {message}")]
    Driver {
        /// Error message
        message: String,
    },

    /// Navigation error
    #[error("Navigation to {url} failed: {message}")]
    Navigation {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// A bounded suspension point elapsed
    #[error("{operation} timed out after {ms}ms")]
    Timeout {
        /// What was being waited for
        operation: String,
        /// Timeout in milliseconds
        ms: u64,
    },

    /// Locator resolved to zero elements
    #[error("No element matches {locator}")]
    ElementNotFound {
        /// Locator description
        locator: String,
    },

    /// Locator resolved to more than one element where exactly one was required
    #[error("{count} elements match {locator}, expected exactly one")]
    AmbiguousElement {
        /// Locator description
        locator: String,
        /// Number of matches
        count: usize,
    },

    /// Screenshot error
    #[error("Screenshot failed: {message}")]
    Screenshot {
        /// Error message
        message: String,
    },

    /// Pre-flight health check failed
    #[error("Health check of {url} failed: {message}")]
    HealthCheck {
        /// Checked URL
        url: String,
        /// Error message
        message: String,
    },

    /// Invalid scenario description
    #[error("Invalid scenario: {message}")]
    Scenario {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl AttestError {
    /// Create a driver error
    #[must_use]
    pub fn driver(message: impl Into<String>) -> Self {
        Self::Driver {
            message: message.into(),
        }
    }

    /// Create a timeout error
    #[must_use]
    pub fn timeout(operation: impl Into<String>, ms: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            ms,
        }
    }

    /// Create a scenario validation error
    #[must_use]
    pub fn scenario(message: impl Into<String>) -> Self {
        Self::Scenario {
            message: message.into(),
        }
    }

    /// Infrastructure faults abort the remainder of a scenario
    #[must_use]
    pub const fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            Self::BrowserNotFound
                | Self::BrowserLaunch { .. }
                | Self::Driver { .. }
                | Self::Navigation { .. }
                | Self::Timeout { .. }
                | Self::HealthCheck { .. }
        )
    }

    /// Locator faults are assertion failures about the UI under test
    #[must_use]
    pub const fn is_locator_fault(&self) -> bool {
        matches!(
            self,
            Self::ElementNotFound { .. } | Self::AmbiguousElement { .. }
        )
    }
}
