//! Bounded browser session.
//!
//! A [`Session`] owns one driver page bound to a base URL. Every method
//! that suspends is wrapped in `tokio::time::timeout` with a bound taken
//! from [`Timeouts`].

use crate::capture::CaptureOutcome;
use crate::driver::{ConsoleMessage, ElementHandle, SessionDriver};
use crate::locator::{Locator, LocatorChain, Selector};
use crate::result::{AttestError, AttestResult};
use crate::wait::{NetworkIdleTracker, Timeouts, WaitMode, WaitResult};
use std::future::Future;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Milliseconds of a bound, saturating
fn millis(bound: Duration) -> u64 {
    u64::try_from(bound.as_millis()).unwrap_or(u64::MAX)
}

/// Run `fut`, converting an elapsed bound into [`AttestError::Timeout`]
pub async fn bounded<T, F>(operation: &str, bound: Duration, fut: F) -> AttestResult<T>
where
    F: Future<Output = AttestResult<T>>,
{
    match tokio::time::timeout(bound, fut).await {
        Ok(result) => result,
        Err(_) => Err(AttestError::timeout(operation, millis(bound))),
    }
}

/// Element resolved from a locator chain
#[derive(Debug, Clone)]
pub struct Resolved {
    /// The element
    pub element: ElementHandle,
    /// The chain member that produced it
    pub locator: Locator,
    /// Whether a fallback (non-preferred) locator was needed
    pub fallback: bool,
}

/// One live browser page bound to a base URL
#[derive(Debug)]
pub struct Session<D: SessionDriver> {
    driver: D,
    base_url: String,
    timeouts: Timeouts,
}

impl<D: SessionDriver> Session<D> {
    /// Create a session over a driver
    #[must_use]
    pub fn new(driver: D, base_url: impl Into<String>, timeouts: Timeouts) -> Self {
        Self {
            driver,
            base_url: base_url.into(),
            timeouts,
        }
    }

    /// Base URL relative routes are joined onto
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Session bounds
    #[must_use]
    pub const fn timeouts(&self) -> &Timeouts {
        &self.timeouts
    }

    /// Underlying driver
    #[must_use]
    pub const fn driver(&self) -> &D {
        &self.driver
    }

    /// Consume the session, returning the driver
    #[must_use]
    pub fn into_driver(self) -> D {
        self.driver
    }

    /// Join a route onto the base URL; absolute URLs pass through
    #[must_use]
    pub fn resolve_url(&self, target: &str) -> String {
        if target.contains("://") || target.starts_with("about:") || target.starts_with("data:") {
            return target.to_string();
        }
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            target.trim_start_matches('/')
        )
    }

    /// Navigate to a route or absolute URL
    ///
    /// # Errors
    ///
    /// `Navigation` when the page fails to load, `Timeout` when the
    /// navigation bound elapses.
    pub async fn navigate(&mut self, target: &str) -> AttestResult<()> {
        let url = self.resolve_url(target);
        info!(url = %url, "Navigating");
        let bound = self.timeouts.navigation();
        let operation = format!("navigation to {url}");
        bounded(&operation, bound, self.driver.navigate(&url)).await
    }

    /// Current page URL
    ///
    /// # Errors
    ///
    /// Driver faults and `Timeout`.
    pub async fn current_url(&self) -> AttestResult<String> {
        bounded(
            "read current url",
            self.timeouts.navigation(),
            self.driver.current_url(),
        )
        .await
    }

    /// Wait until the page satisfies `mode`
    ///
    /// # Errors
    ///
    /// `Timeout` when the condition does not hold within the stable bound.
    pub async fn wait_for_stable(&self, mode: &WaitMode) -> AttestResult<WaitResult> {
        let start = Instant::now();
        let operation = format!("wait for {mode}");
        debug!(mode = %mode, bound_ms = self.timeouts.stable_ms, "Waiting for page to settle");
        bounded(&operation, self.timeouts.stable(), self.settle(mode)).await?;
        let result = WaitResult::new(start.elapsed(), mode.to_string());
        debug!(elapsed_ms = millis(result.elapsed), "Page settled");
        Ok(result)
    }

    async fn settle(&self, mode: &WaitMode) -> AttestResult<()> {
        let interval = self.timeouts.poll_interval();
        match mode {
            WaitMode::Fixed(ms) => {
                tokio::time::sleep(Duration::from_millis(*ms)).await;
                Ok(())
            }
            WaitMode::NetworkIdle => {
                let mut tracker = NetworkIdleTracker::new(self.timeouts.network_idle());
                loop {
                    let activity = self.driver.network_activity().await?;
                    if tracker.observe(activity, Instant::now()) {
                        return Ok(());
                    }
                    tokio::time::sleep(interval).await;
                }
            }
            WaitMode::Url(pattern) => loop {
                let url = self.driver.current_url().await?;
                if pattern.matches(&url) {
                    return Ok(());
                }
                tokio::time::sleep(interval).await;
            },
        }
    }

    /// All elements a locator matches; empty when nothing matches
    ///
    /// # Errors
    ///
    /// Driver faults and `Timeout`, never zero matches.
    pub async fn query_all(&self, locator: &Locator) -> AttestResult<Vec<ElementHandle>> {
        let mut found = self.query_selector_all(&locator.selector()).await?;
        if let Some(index) = locator.index() {
            found = if index < found.len() {
                vec![found.swap_remove(index)]
            } else {
                Vec::new()
            };
        }
        Ok(found)
    }

    /// All elements a raw selector matches
    ///
    /// # Errors
    ///
    /// Driver faults and `Timeout`.
    pub async fn query_selector_all(&self, selector: &Selector) -> AttestResult<Vec<ElementHandle>> {
        let operation = format!("query {selector}");
        bounded(
            &operation,
            self.timeouts.element(),
            self.driver.query_all(selector),
        )
        .await
    }

    /// Descendants of `scope` matching a selector
    ///
    /// # Errors
    ///
    /// Driver faults and `Timeout`.
    pub async fn query_within(
        &self,
        scope: &ElementHandle,
        selector: &Selector,
    ) -> AttestResult<Vec<ElementHandle>> {
        let operation = format!("query {selector} within {}", scope.id);
        bounded(
            &operation,
            self.timeouts.element(),
            self.driver.query_within(scope, selector),
        )
        .await
    }

    /// Resolve a chain to exactly one visible, enabled element
    ///
    /// The first chain member with at least one actionable candidate
    /// decides. Waits up to the element bound for a candidate to appear.
    ///
    /// # Errors
    ///
    /// `ElementNotFound` when nothing appears in time, `AmbiguousElement`
    /// when the deciding locator matches more than one element.
    pub async fn resolve(&self, chain: &LocatorChain) -> AttestResult<Resolved> {
        if chain.is_empty() {
            return Err(AttestError::scenario("empty locator chain"));
        }
        let deadline = Instant::now() + self.timeouts.element();
        loop {
            for (position, locator) in chain.locators().iter().enumerate() {
                let mut candidates: Vec<ElementHandle> = self
                    .query_all(locator)
                    .await?
                    .into_iter()
                    .filter(ElementHandle::is_actionable)
                    .collect();
                match candidates.len() {
                    0 => continue,
                    1 => {
                        let fallback = position > 0;
                        if fallback {
                            warn!(
                                preferred = %chain.preferred().map(ToString::to_string).unwrap_or_default(),
                                resolved = %locator,
                                "Locator fallback used"
                            );
                        }
                        if locator.is_fragile() {
                            warn!(locator = %locator, "Resolved through a positional locator");
                        }
                        return Ok(Resolved {
                            element: candidates.remove(0),
                            locator: locator.clone(),
                            fallback,
                        });
                    }
                    count => {
                        return Err(AttestError::AmbiguousElement {
                            locator: locator.to_string(),
                            count,
                        })
                    }
                }
            }
            if Instant::now() >= deadline {
                return Err(AttestError::ElementNotFound {
                    locator: chain.to_string(),
                });
            }
            tokio::time::sleep(self.timeouts.poll_interval()).await;
        }
    }

    /// Replace the value of the single element `chain` resolves to
    ///
    /// # Errors
    ///
    /// Resolution errors, driver faults and `Timeout`.
    pub async fn fill(&mut self, chain: &LocatorChain, text: &str) -> AttestResult<Resolved> {
        let resolved = self.resolve(chain).await?;
        let operation = format!("fill {}", resolved.locator);
        bounded(
            &operation,
            self.timeouts.element(),
            self.driver.fill(&resolved.element, text),
        )
        .await?;
        Ok(resolved)
    }

    /// Click the single element `chain` resolves to
    ///
    /// # Errors
    ///
    /// Resolution errors, driver faults and `Timeout`.
    pub async fn click(&mut self, chain: &LocatorChain) -> AttestResult<Resolved> {
        let resolved = self.resolve(chain).await?;
        let operation = format!("click {}", resolved.locator);
        bounded(
            &operation,
            self.timeouts.element(),
            self.driver.click(&resolved.element),
        )
        .await?;
        Ok(resolved)
    }

    /// Serialized markup of the current document
    ///
    /// # Errors
    ///
    /// Driver faults and `Timeout`.
    pub async fn content(&self) -> AttestResult<String> {
        bounded("read page content", self.timeouts.element(), self.driver.content()).await
    }

    /// Console messages captured so far
    ///
    /// # Errors
    ///
    /// Driver faults and `Timeout`.
    pub async fn console_messages(&self) -> AttestResult<Vec<ConsoleMessage>> {
        bounded(
            "read console messages",
            self.timeouts.element(),
            self.driver.console_messages(),
        )
        .await
    }

    /// Write a screenshot to `path`; failures are returned, never raised
    pub async fn screenshot(&self, path: &Path, full_page: bool) -> CaptureOutcome {
        let shot = bounded(
            "screenshot",
            self.timeouts.navigation(),
            self.driver.screenshot(full_page),
        )
        .await;
        let written = match shot {
            Ok(shot) => write_screenshot(path, &shot.data).await.map(|()| shot.size_bytes()),
            Err(e) => Err(e),
        };
        match written {
            Ok(bytes) => {
                debug!(path = %path.display(), bytes, "Screenshot saved");
                CaptureOutcome::Saved(path.to_path_buf())
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Screenshot failed");
                CaptureOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Close the page
    ///
    /// # Errors
    ///
    /// Driver faults and `Timeout`.
    pub async fn close(&mut self) -> AttestResult<()> {
        let bound = self.timeouts.navigation();
        bounded("close session", bound, self.driver.close()).await
    }
}

async fn write_screenshot(path: &Path, data: &[u8]) -> AttestResult<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, data).await?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::driver::{MockDriver, MockElement, MockPage};
    use crate::wait::UrlPattern;

    const BASE: &str = "http://app.test";

    fn form_page() -> MockPage {
        MockPage::new()
            .element(
                MockElement::new("input")
                    .test_id("email-input")
                    .label("Email"),
            )
            .element(MockElement::new("input").label("Password"))
            .element(MockElement::new("button").class("btn").text("Sign in"))
            .element(MockElement::new("button").class("btn").text("Cancel"))
            .element(MockElement::new("button").test_id("ghost").hidden())
    }

    async fn session_on(page: MockPage) -> Session<MockDriver> {
        let driver = MockDriver::new().with_page(format!("{BASE}/login"), page);
        let mut session = Session::new(driver, BASE, Timeouts::uniform(100));
        session.navigate("/login").await.unwrap();
        session
    }

    mod url_tests {
        use super::*;

        #[test]
        fn test_resolve_url() {
            let session = Session::new(MockDriver::new(), "http://app.test/", Timeouts::default());
            assert_eq!(session.resolve_url("/login"), "http://app.test/login");
            assert_eq!(session.resolve_url("admin/events"), "http://app.test/admin/events");
            assert_eq!(session.resolve_url("https://other/x"), "https://other/x");
        }

        #[tokio::test]
        async fn test_navigate_timeout() {
            let driver = MockDriver::new().with_page(format!("{BASE}/slow"), MockPage::new().stalling());
            let mut session = Session::new(driver, BASE, Timeouts::uniform(30));
            let err = session.navigate("/slow").await.unwrap_err();
            assert!(matches!(err, AttestError::Timeout { ms: 30, .. }));
        }
    }

    mod query_tests {
        use super::*;

        #[tokio::test]
        async fn test_query_all_zero_matches_is_empty() {
            let session = session_on(form_page()).await;
            let found = session.query_all(&Locator::test_id("missing")).await.unwrap();
            assert!(found.is_empty());
        }

        #[tokio::test]
        async fn test_query_all_position() {
            let session = session_on(form_page()).await;
            let second = session.query_all(&Locator::position("input", 1)).await.unwrap();
            assert_eq!(second.len(), 1);
            assert!(session.query_all(&Locator::position("input", 9)).await.unwrap().is_empty());
        }
    }

    mod resolve_tests {
        use super::*;

        #[tokio::test]
        async fn test_fill_zero_matches() {
            let mut session = session_on(form_page()).await;
            let err = session
                .fill(&Locator::test_id("missing").into(), "x")
                .await
                .unwrap_err();
            assert!(matches!(err, AttestError::ElementNotFound { .. }));
        }

        #[tokio::test]
        async fn test_click_ambiguous() {
            let mut session = session_on(form_page()).await;
            let err = session
                .click(&Locator::css("button.btn").into())
                .await
                .unwrap_err();
            assert!(matches!(err, AttestError::AmbiguousElement { count: 2, .. }));
        }

        #[tokio::test]
        async fn test_hidden_elements_are_not_candidates() {
            let mut session = session_on(form_page()).await;
            let err = session.click(&Locator::test_id("ghost").into()).await.unwrap_err();
            assert!(err.is_locator_fault());
        }

        #[tokio::test]
        async fn test_fallback_reported() {
            let mut session = session_on(form_page()).await;
            let chain = LocatorChain::new(vec![
                Locator::test_id("password-input"),
                Locator::label("Password"),
            ]);
            let resolved = session.fill(&chain, "secret").await.unwrap();
            assert!(resolved.fallback);
            assert_eq!(resolved.locator, Locator::label("Password"));
            assert_eq!(
                session.driver().values.get(&resolved.element.id).map(String::as_str),
                Some("secret")
            );
        }

        #[tokio::test]
        async fn test_preferred_resolution() {
            let session = session_on(form_page()).await;
            let chain = LocatorChain::new(vec![
                Locator::position("input", 0),
                Locator::test_id("email-input"),
            ]);
            let resolved = session.resolve(&chain).await.unwrap();
            assert!(!resolved.fallback);
        }
    }

    mod wait_tests {
        use super::*;

        #[tokio::test]
        async fn test_network_idle() {
            let session = session_on(form_page()).await;
            let result = session.wait_for_stable(&WaitMode::NetworkIdle).await.unwrap();
            assert_eq!(result.waited_for, "network idle");
        }

        #[tokio::test]
        async fn test_busy_network_times_out_within_bound() {
            let session = session_on(form_page().with_busy_network()).await;
            let start = Instant::now();
            let err = session.wait_for_stable(&WaitMode::NetworkIdle).await.unwrap_err();
            assert!(matches!(err, AttestError::Timeout { .. }));
            assert!(start.elapsed() < Duration::from_millis(100 * 5));
        }

        #[tokio::test]
        async fn test_url_wait() {
            let session = session_on(form_page()).await;
            session
                .wait_for_stable(&WaitMode::Url(UrlPattern::glob("**/login")))
                .await
                .unwrap();
            let err = session
                .wait_for_stable(&WaitMode::Url(UrlPattern::glob("**/dashboard")))
                .await
                .unwrap_err();
            assert!(matches!(err, AttestError::Timeout { ms: 100, .. }));
        }

        #[tokio::test]
        async fn test_fixed_longer_than_bound() {
            let session = session_on(form_page()).await;
            assert!(session.wait_for_stable(&WaitMode::Fixed(10)).await.is_ok());
            assert!(session.wait_for_stable(&WaitMode::Fixed(5_000)).await.is_err());
        }
    }

    mod screenshot_tests {
        use super::*;

        #[tokio::test]
        async fn test_screenshot_written() {
            let dir = tempfile::tempdir().unwrap();
            let session = session_on(form_page()).await;
            let path = dir.path().join("nested").join("shot.png");
            let outcome = session.screenshot(&path, true).await;
            assert_eq!(outcome, CaptureOutcome::Saved(path.clone()));
            assert!(path.exists());
        }

        #[tokio::test]
        async fn test_screenshot_failure_is_a_value() {
            let dir = tempfile::tempdir().unwrap();
            let driver = MockDriver::new().without_screenshots();
            let session = Session::new(driver, BASE, Timeouts::uniform(50));
            let outcome = session.screenshot(&dir.path().join("x.png"), true).await;
            assert!(matches!(outcome, CaptureOutcome::Failed { .. }));
        }

        #[tokio::test]
        async fn test_unwritable_directory_is_a_value() {
            let dir = tempfile::tempdir().unwrap();
            let blocker = dir.path().join("taken");
            std::fs::write(&blocker, "file, not a directory").unwrap();
            let session = session_on(form_page()).await;
            let outcome = session.screenshot(&blocker.join("shot.png"), true).await;
            assert!(matches!(outcome, CaptureOutcome::Failed { .. }));
        }
    }
}
