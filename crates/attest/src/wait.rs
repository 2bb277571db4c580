//! Wait Mechanisms
//!
//! Bounded stabilisation modes used after navigation and login.
//!
//! Every wait in the harness has an upper bound taken from [`Timeouts`];
//! the polling loops themselves live on [`crate::Session`], this module
//! holds the pure pieces (patterns, idle tracking, bounds).

use crate::driver::NetworkActivity;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

// =============================================================================
// CONSTANTS
// =============================================================================

/// Default navigation bound (30 seconds)
pub const DEFAULT_NAVIGATION_TIMEOUT_MS: u64 = 30_000;

/// Default element auto-wait bound (10 seconds)
pub const DEFAULT_ELEMENT_TIMEOUT_MS: u64 = 10_000;

/// Default stabilisation bound (30 seconds)
pub const DEFAULT_STABLE_TIMEOUT_MS: u64 = 30_000;

/// Default login outcome bound (15 seconds)
pub const DEFAULT_LOGIN_TIMEOUT_MS: u64 = 15_000;

/// Default polling interval (100ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

/// Network idle threshold (500ms without new requests)
pub const NETWORK_IDLE_THRESHOLD_MS: u64 = 500;

// =============================================================================
// TIMEOUTS
// =============================================================================

/// Upper bounds for every suspension point of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    /// Navigation bound in milliseconds
    pub navigation_ms: u64,
    /// Element auto-wait bound in milliseconds
    pub element_ms: u64,
    /// Stabilisation bound in milliseconds
    pub stable_ms: u64,
    /// Login outcome bound in milliseconds
    pub login_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
    /// Quiet period that counts as network idle, in milliseconds
    pub network_idle_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            navigation_ms: DEFAULT_NAVIGATION_TIMEOUT_MS,
            element_ms: DEFAULT_ELEMENT_TIMEOUT_MS,
            stable_ms: DEFAULT_STABLE_TIMEOUT_MS,
            login_ms: DEFAULT_LOGIN_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            network_idle_ms: NETWORK_IDLE_THRESHOLD_MS,
        }
    }
}

impl Timeouts {
    /// Create timeouts with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set every bound to the same value (tests, smoke runs)
    #[must_use]
    pub const fn uniform(ms: u64) -> Self {
        Self {
            navigation_ms: ms,
            element_ms: ms,
            stable_ms: ms,
            login_ms: ms,
            poll_interval_ms: if ms < DEFAULT_POLL_INTERVAL_MS {
                if ms < 5 { 1 } else { ms / 5 }
            } else {
                DEFAULT_POLL_INTERVAL_MS
            },
            network_idle_ms: if ms < NETWORK_IDLE_THRESHOLD_MS {
                ms / 2
            } else {
                NETWORK_IDLE_THRESHOLD_MS
            },
        }
    }

    /// Set navigation bound
    #[must_use]
    pub const fn with_navigation(mut self, ms: u64) -> Self {
        self.navigation_ms = ms;
        self
    }

    /// Set element auto-wait bound
    #[must_use]
    pub const fn with_element(mut self, ms: u64) -> Self {
        self.element_ms = ms;
        self
    }

    /// Set stabilisation bound
    #[must_use]
    pub const fn with_stable(mut self, ms: u64) -> Self {
        self.stable_ms = ms;
        self
    }

    /// Set login outcome bound
    #[must_use]
    pub const fn with_login(mut self, ms: u64) -> Self {
        self.login_ms = ms;
        self
    }

    /// Set polling interval
    #[must_use]
    pub const fn with_poll_interval(mut self, ms: u64) -> Self {
        self.poll_interval_ms = ms;
        self
    }

    /// Navigation bound as Duration
    #[must_use]
    pub const fn navigation(&self) -> Duration {
        Duration::from_millis(self.navigation_ms)
    }

    /// Element auto-wait bound as Duration
    #[must_use]
    pub const fn element(&self) -> Duration {
        Duration::from_millis(self.element_ms)
    }

    /// Stabilisation bound as Duration
    #[must_use]
    pub const fn stable(&self) -> Duration {
        Duration::from_millis(self.stable_ms)
    }

    /// Login outcome bound as Duration
    #[must_use]
    pub const fn login(&self) -> Duration {
        Duration::from_millis(self.login_ms)
    }

    /// Poll interval as Duration (never zero)
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    /// Network idle threshold as Duration
    #[must_use]
    pub const fn network_idle(&self) -> Duration {
        Duration::from_millis(self.network_idle_ms)
    }
}

// =============================================================================
// URL PATTERN
// =============================================================================

/// Pattern for matching page URLs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrlPattern {
    /// Exact URL match
    Exact(String),
    /// Prefix match
    Prefix(String),
    /// Contains substring
    Contains(String),
    /// Regex match
    Regex(String),
    /// Glob pattern (e.g., "**/dashboard"); `*` and `**` match any run of
    /// characters
    Glob(String),
    /// Match any URL
    Any,
}

impl UrlPattern {
    /// Create a glob pattern
    #[must_use]
    pub fn glob(pattern: impl Into<String>) -> Self {
        Self::Glob(pattern.into())
    }

    /// Check if a URL matches this pattern
    #[must_use]
    pub fn matches(&self, url: &str) -> bool {
        match self {
            Self::Exact(pattern) => url == pattern,
            Self::Prefix(pattern) => url.starts_with(pattern.as_str()),
            Self::Contains(pattern) => url.contains(pattern.as_str()),
            Self::Regex(pattern) => regex::Regex::new(pattern)
                .map(|re| re.is_match(url))
                .unwrap_or(false),
            Self::Glob(pattern) => Self::glob_matches(pattern, url),
            Self::Any => true,
        }
    }

    /// Check that a regex pattern compiles
    pub fn validate(&self) -> Result<(), String> {
        match self {
            Self::Regex(pattern) => regex::Regex::new(pattern)
                .map(|_| ())
                .map_err(|e| e.to_string()),
            _ => Ok(()),
        }
    }

    fn glob_matches(pattern: &str, url: &str) -> bool {
        let parts: Vec<&str> = pattern.split('*').collect();
        let (first, rest) = match parts.split_first() {
            Some(split) => split,
            None => return url.is_empty(),
        };
        if !url.starts_with(first) {
            return false;
        }
        let Some((last, middle)) = rest.split_last() else {
            // no wildcard at all
            return url == pattern;
        };

        let mut pos = first.len();
        for part in middle.iter().filter(|p| !p.is_empty()) {
            match url[pos..].find(part) {
                Some(found) => pos += found + part.len(),
                None => return false,
            }
        }
        url.len() >= pos + last.len() && url.ends_with(last)
    }
}

impl std::fmt::Display for UrlPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exact(p) => write!(f, "url == {p}"),
            Self::Prefix(p) => write!(f, "url starts with {p}"),
            Self::Contains(p) => write!(f, "url contains {p}"),
            Self::Regex(p) => write!(f, "url =~ /{p}/"),
            Self::Glob(p) => write!(f, "url matches {p}"),
            Self::Any => write!(f, "any url"),
        }
    }
}

// =============================================================================
// WAIT MODE
// =============================================================================

/// Condition that marks a page as settled
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitMode {
    /// Sleep for a fixed number of milliseconds
    Fixed(u64),
    /// Document complete and no new requests for the idle threshold
    NetworkIdle,
    /// Current URL matches a pattern
    Url(UrlPattern),
}

impl Default for WaitMode {
    fn default() -> Self {
        Self::NetworkIdle
    }
}

impl std::fmt::Display for WaitMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fixed(ms) => write!(f, "fixed {ms}ms"),
            Self::NetworkIdle => write!(f, "network idle"),
            Self::Url(pattern) => write!(f, "{pattern}"),
        }
    }
}

// =============================================================================
// WAIT RESULT
// =============================================================================

/// Result of a successful wait
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitResult {
    /// Time spent waiting
    pub elapsed: Duration,
    /// Description of what was waited for
    pub waited_for: String,
}

impl WaitResult {
    /// Create a wait result
    #[must_use]
    pub fn new(elapsed: Duration, waited_for: impl Into<String>) -> Self {
        Self {
            elapsed,
            waited_for: waited_for.into(),
        }
    }
}

// =============================================================================
// NETWORK IDLE
// =============================================================================

/// Tracks resource counters until they stop changing
#[derive(Debug, Clone)]
pub struct NetworkIdleTracker {
    threshold: Duration,
    last_count: Option<usize>,
    quiet_since: Option<Instant>,
}

impl NetworkIdleTracker {
    /// Create a tracker with the given quiet threshold
    #[must_use]
    pub const fn new(threshold: Duration) -> Self {
        Self {
            threshold,
            last_count: None,
            quiet_since: None,
        }
    }

    /// Feed one sample; returns true once the network has been quiet for
    /// the threshold
    pub fn observe(&mut self, activity: NetworkActivity, now: Instant) -> bool {
        if !activity.document_complete {
            self.last_count = None;
            self.quiet_since = None;
            return false;
        }
        if self.last_count != Some(activity.resource_count) {
            self.last_count = Some(activity.resource_count);
            self.quiet_since = Some(now);
        }
        self.quiet_since
            .is_some_and(|since| now.saturating_duration_since(since) >= self.threshold)
    }
}
