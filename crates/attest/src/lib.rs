//! Attest: browser-driven acceptance checks for an authenticated admin table
//!
//! Logs into a web front end, opens the view under test, waits for it to
//! settle, extracts structural facts from the rendered table and turns
//! them into a pass/fail verdict with screenshots and console summaries.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      ScenarioRunner                              │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐            │
//! │   │ AuthFlow   │    │ DomSnapshot│    │ Artifact   │            │
//! │   │ (login)    │───►│ + Checks   │───►│ Capture    │──► Verdict │
//! │   └─────┬──────┘    └─────┬──────┘    └─────┬──────┘            │
//! │         └────────── Session<D> ─────────────┘                    │
//! │                  (bounded waits, locators)                       │
//! │                          │                                       │
//! │           SessionDriver: ChromiumDriver | MockDriver             │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]

mod assertion;
#[cfg(feature = "browser")]
#[allow(clippy::missing_errors_doc)]
mod browser;
mod capture;
#[allow(clippy::missing_errors_doc)]
mod driver;
mod locator;
mod reporter;
mod result;
mod session;
mod snapshot;
mod verdict;
mod wait;

/// Login state machine
pub mod auth;
/// Scenario runner
pub mod runner;
/// Scenario YAML schema
pub mod scenario;

pub use assertion::{AssertionResult, Check, Severity};
pub use auth::{AuthFailure, AuthFlow, AuthResult, AuthState, Credentials, LoginForm};
#[cfg(feature = "browser")]
pub use browser::ChromiumDriver;
pub use capture::{slugify, ArtifactCapture, CaptureOutcome, FINAL_LABEL, LOGIN_LABEL};
pub use driver::{
    normalize_text, ClickEffect, ClickRule, ConsoleLevel, ConsoleMessage, DriverConfig,
    ElementHandle, MockDriver, MockElement, MockPage, NetworkActivity, Screenshot, SessionDriver,
};
pub use locator::{Locator, LocatorChain, Selector, Stability, TEST_ID_ATTRIBUTE};
pub use reporter::{Artifact, Reporter, ScenarioReport, StepTiming};
pub use result::{AttestError, AttestResult};
pub use runner::ScenarioRunner;
pub use scenario::{
    expand_env, Scenario, ScenarioOverrides, BASE_URL_VAR, CANONICAL_SCENARIO, IDENTIFIER_VAR,
    SECRET_VAR,
};
pub use session::{bounded, Resolved, Session};
pub use snapshot::{CellSnapshot, DomSnapshot, TableSelectors};
pub use verdict::Verdict;
pub use wait::{NetworkIdleTracker, Timeouts, UrlPattern, WaitMode, WaitResult};

/// Prelude for convenient imports
pub mod prelude {
    pub use super::assertion::*;
    pub use super::auth::*;
    #[cfg(feature = "browser")]
    pub use super::browser::*;
    pub use super::capture::*;
    pub use super::driver::*;
    pub use super::locator::*;
    pub use super::reporter::*;
    pub use super::result::*;
    pub use super::runner::ScenarioRunner;
    pub use super::scenario::*;
    pub use super::session::*;
    pub use super::snapshot::*;
    pub use super::verdict::*;
    pub use super::wait::*;
}
