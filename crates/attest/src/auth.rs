//! Authentication flow.
//!
//! Drives a login form and classifies the outcome:
//!
//! ```text
//! Unauthenticated ──fill+click──► Submitting ──url matches──► Authenticated
//!                                     │
//!                                     ├──error indicator──► Failed(Rejected)
//!                                     └──bound elapsed────► Failed(Timeout)
//! ```
//!
//! A rejected login is a value ([`AuthResult`] with [`AuthState::Failed`]);
//! locator and driver faults are errors.

use crate::driver::{ElementHandle, SessionDriver};
use crate::locator::{Locator, LocatorChain};
use crate::result::AttestResult;
use crate::session::Session;
use crate::wait::UrlPattern;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Identifier/secret pair; immutable for a run
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Login identifier (usually an email address)
    pub identifier: String,
    /// Secret, never printed
    pub secret: String,
}

impl Credentials {
    /// Create credentials
    #[must_use]
    pub fn new(identifier: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            secret: secret.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("identifier", &self.identifier)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Where the login form lives and how to recognise the outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    /// Route of the login page
    pub path: String,
    /// Identifier input
    #[serde(with = "serde_yaml_ng::with::singleton_map_recursive")]
    pub identifier: LocatorChain,
    /// Secret input
    #[serde(with = "serde_yaml_ng::with::singleton_map_recursive")]
    pub secret: LocatorChain,
    /// Submit control
    #[serde(with = "serde_yaml_ng::with::singleton_map_recursive")]
    pub submit: LocatorChain,
    /// Element that appears when the login is rejected
    #[serde(with = "serde_yaml_ng::with::singleton_map_recursive")]
    pub error_indicator: LocatorChain,
    /// URL reached after a successful login
    #[serde(with = "serde_yaml_ng::with::singleton_map_recursive")]
    pub success_url: UrlPattern,
}

impl Default for LoginForm {
    fn default() -> Self {
        Self {
            path: "/login".to_string(),
            identifier: LocatorChain::new(vec![
                Locator::test_id("email-input"),
                Locator::label("Email"),
                Locator::position("input", 0),
            ]),
            secret: LocatorChain::new(vec![
                Locator::test_id("password-input"),
                Locator::label("Password"),
                Locator::position("input", 1),
            ]),
            submit: LocatorChain::new(vec![
                Locator::test_id("login-button"),
                Locator::css("button[type=\"submit\"]"),
            ]),
            error_indicator: LocatorChain::new(vec![
                Locator::test_id("login-error"),
                Locator::css("[role=\"alert\"]"),
            ]),
            success_url: UrlPattern::glob("**/dashboard"),
        }
    }
}

/// Login state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthState {
    /// Nothing submitted yet
    Unauthenticated,
    /// Form submitted, waiting for the outcome
    Submitting,
    /// Success route reached
    Authenticated,
    /// Login rejected or timed out
    Failed,
}

impl fmt::Display for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Submitting => "submitting",
            Self::Authenticated => "authenticated",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Why a login failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthFailure {
    /// The error indicator became visible
    Rejected,
    /// Neither outcome appeared within the login bound
    Timeout,
}

/// Outcome of a login attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResult {
    /// Final state (`Authenticated` or `Failed`)
    pub state: AuthState,
    /// URL before the form was submitted
    pub start_url: String,
    /// URL when the outcome was decided
    pub final_url: String,
    /// Text of the error indicator, when one appeared
    pub error_text: Option<String>,
    /// Failure reason, when failed
    pub failure: Option<AuthFailure>,
    /// Time from submit to outcome, in milliseconds
    pub elapsed_ms: u64,
}

impl AuthResult {
    /// Whether the login succeeded
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state == AuthState::Authenticated
    }

    /// One-line description for reports
    #[must_use]
    pub fn describe(&self) -> String {
        match (self.failure, &self.error_text) {
            (None, _) => format!("authenticated at {}", self.final_url),
            (Some(AuthFailure::Rejected), Some(text)) => format!("rejected: {text}"),
            (Some(AuthFailure::Rejected), None) => "rejected".to_string(),
            (Some(AuthFailure::Timeout), _) => {
                format!("no outcome after {}ms at {}", self.elapsed_ms, self.final_url)
            }
        }
    }
}

/// Login state machine over a session
#[derive(Debug)]
pub struct AuthFlow<'a> {
    form: &'a LoginForm,
    state: AuthState,
}

impl<'a> AuthFlow<'a> {
    /// Create a flow in the `Unauthenticated` state
    #[must_use]
    pub const fn new(form: &'a LoginForm) -> Self {
        Self {
            form,
            state: AuthState::Unauthenticated,
        }
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> AuthState {
        self.state
    }

    fn transition(&mut self, next: AuthState) {
        debug!(from = %self.state, to = %next, "Auth state transition");
        self.state = next;
    }

    /// Log in once; no retries
    ///
    /// # Errors
    ///
    /// Navigation, locator and driver faults. A rejected or timed out
    /// login is returned as `Ok` with `state == Failed`.
    pub async fn login<D: SessionDriver>(
        &mut self,
        session: &mut Session<D>,
        credentials: &Credentials,
    ) -> AttestResult<AuthResult> {
        info!(identifier = %credentials.identifier, path = %self.form.path, "Logging in");
        session.navigate(&self.form.path).await?;

        session.fill(&self.form.identifier, &credentials.identifier).await?;
        session.fill(&self.form.secret, &credentials.secret).await?;
        let start_url = session.current_url().await?;
        self.transition(AuthState::Submitting);
        session.click(&self.form.submit).await?;

        let start = Instant::now();
        let bound = session.timeouts().login();
        let outcome = self.await_outcome(session, start + bound).await?;
        let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        let result = match outcome {
            Outcome::Success(final_url) => {
                self.transition(AuthState::Authenticated);
                info!(url = %final_url, elapsed_ms, "Login succeeded");
                AuthResult {
                    state: AuthState::Authenticated,
                    start_url,
                    final_url,
                    error_text: None,
                    failure: None,
                    elapsed_ms,
                }
            }
            Outcome::Rejected { url, text } => {
                self.transition(AuthState::Failed);
                warn!(url = %url, error = %text, "Login rejected");
                AuthResult {
                    state: AuthState::Failed,
                    start_url,
                    final_url: url,
                    error_text: Some(text),
                    failure: Some(AuthFailure::Rejected),
                    elapsed_ms,
                }
            }
            Outcome::Undecided(url) => {
                self.transition(AuthState::Failed);
                warn!(url = %url, bound_ms = session.timeouts().login_ms, "Login outcome timed out");
                AuthResult {
                    state: AuthState::Failed,
                    start_url,
                    final_url: url,
                    error_text: None,
                    failure: Some(AuthFailure::Timeout),
                    elapsed_ms,
                }
            }
        };
        Ok(result)
    }

    async fn await_outcome<D: SessionDriver>(
        &self,
        session: &Session<D>,
        deadline: Instant,
    ) -> AttestResult<Outcome> {
        let interval = session.timeouts().poll_interval();
        loop {
            let url = session.current_url().await?;
            if self.form.success_url.matches(&url) {
                return Ok(Outcome::Success(url));
            }
            if let Some(indicator) = self.visible_error(session).await? {
                let text = indicator.text();
                let text = if text.is_empty() {
                    "login error indicator shown".to_string()
                } else {
                    text
                };
                return Ok(Outcome::Rejected { url, text });
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(Outcome::Undecided(url));
            }
            tokio::time::sleep(interval.min(deadline - now).max(Duration::from_millis(1))).await;
        }
    }

    async fn visible_error<D: SessionDriver>(
        &self,
        session: &Session<D>,
    ) -> AttestResult<Option<ElementHandle>> {
        for locator in self.form.error_indicator.locators() {
            let found = session.query_all(locator).await?;
            if let Some(element) = found.into_iter().find(|e| e.visible) {
                return Ok(Some(element));
            }
        }
        Ok(None)
    }
}

enum Outcome {
    Success(String),
    Rejected { url: String, text: String },
    Undecided(String),
}
