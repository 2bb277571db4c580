//! End-to-end scenario runs against the mock driver.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use attest::prelude::*;
use attest::runner::steps;
use std::path::Path;
use std::time::Duration;

const BASE: &str = "http://app.test";
const IDENTIFIER: &str = "admin@example.test";
const SECRET: &str = "Test123!";

// ============================================================================
// Fixtures
// ============================================================================

fn canonical(output_dir: &Path, secret: &str) -> Scenario {
    let secret = secret.to_string();
    let mut scenario = Scenario::from_yaml_with(CANONICAL_SCENARIO, |name| match name {
        "ATTEST_BASE_URL" => Some(BASE.to_string()),
        "ATTEST_IDENTIFIER" => Some(IDENTIFIER.to_string()),
        "ATTEST_SECRET" => Some(secret.clone()),
        _ => None,
    })
    .unwrap();
    scenario.health_url = None;
    scenario.output_dir = output_dir.to_path_buf();
    scenario.timeouts = Timeouts::uniform(1000);
    scenario
}

fn login_page() -> MockPage {
    MockPage::new().element(
        MockElement::new("form").test_id("login-form").children([
            MockElement::new("input").test_id("email-input").label("Email"),
            MockElement::new("input")
                .test_id("password-input")
                .label("Password"),
            MockElement::new("button")
                .test_id("login-button")
                .attr("type", "submit")
                .text("Sign in"),
            MockElement::new("div")
                .test_id("login-error")
                .attr("role", "alert")
                .text("Invalid email or password")
                .hidden(),
        ]),
    )
}

fn event_row(day: usize, kind: &str) -> MockElement {
    MockElement::new("tr").test_id("event-row").children([
        MockElement::new("td").text(format!("2026-03-{day:02}")),
        MockElement::new("td")
            .child(MockElement::new("span").class("mantine-Badge-root").text(kind)),
        MockElement::new("td").text("Community evening"),
        MockElement::new("td").text("18:00"),
        MockElement::new("td").text("40"),
        MockElement::new("td").text("Edit"),
    ])
}

fn events_page(headers: &[&str], rows: Vec<MockElement>) -> MockPage {
    let header_row = MockElement::new("tr").children(
        headers
            .iter()
            .map(|h| MockElement::new("th").text(*h)),
    );
    MockPage::new().element(
        MockElement::new("table").children([
            MockElement::new("thead").child(header_row),
            MockElement::new("tbody").children(rows),
        ]),
    )
}

const HEADERS: [&str; 6] = ["Date", "Type", "Title", "Time", "Capacity", "Actions"];

fn admin_driver(events: MockPage) -> MockDriver {
    MockDriver::new()
        .with_page(format!("{BASE}/login"), login_page())
        .with_page(format!("{BASE}/dashboard"), MockPage::new())
        .with_page(format!("{BASE}/admin/events"), events)
        .with_click_rule(
            ClickRule::new(
                Selector::test_id("login-button"),
                ClickEffect::Navigate(format!("{BASE}/dashboard")),
            )
            .requires(Selector::test_id("email-input"), IDENTIFIER)
            .requires(Selector::test_id("password-input"), SECRET)
            .otherwise(ClickEffect::Reveal(Selector::test_id("login-error"))),
        )
}

fn populated_events() -> MockPage {
    events_page(
        &HEADERS,
        vec![event_row(1, "Social"), event_row(2, "Workshop"), event_row(3, "Sport")],
    )
}

fn result<'a>(report: &'a ScenarioReport, name: &str) -> &'a AssertionResult {
    report
        .results
        .iter()
        .find(|r| r.name == name)
        .unwrap_or_else(|| panic!("no result named {name}: {:?}", report.results))
}

// ============================================================================
// Tests
// ============================================================================

mod happy_path_tests {
    use super::*;

    #[tokio::test]
    async fn test_six_headers_with_type_passes() {
        let dir = tempfile::tempdir().unwrap();
        let scenario = canonical(dir.path(), SECRET);

        let report = ScenarioRunner::new()
            .run(&scenario, admin_driver(populated_events()))
            .await;

        assert!(report.passed(), "{:?}", report.verdict.failed_names());
        assert!(report.aborted_at.is_none());
        assert!(report.auth.as_ref().unwrap().is_authenticated());
        assert!(result(&report, "header 'Type'").passed);
        let count = result(&report, "header count");
        assert!(count.passed);
        assert_eq!(count.actual, "6");
        assert!(result(&report, "badges").passed);
        assert!(result(&report, "row badge column 2").passed);
        assert!(result(&report, "content lacks 'Access Denied'").passed);
        assert!(result(&report, "console clean").passed);
        // authentication result plus every declared check result
        assert_eq!(report.results.len(), 1 + scenario.declared_results());
    }

    #[tokio::test]
    async fn test_artifacts_written_after_login_and_at_end() {
        let dir = tempfile::tempdir().unwrap();
        let scenario = canonical(dir.path(), SECRET);

        let report = ScenarioRunner::new()
            .run(&scenario, admin_driver(populated_events()))
            .await;

        let labels: Vec<&str> = report.artifacts.iter().map(|a| a.label.as_str()).collect();
        assert_eq!(labels, vec![LOGIN_LABEL, FINAL_LABEL]);
        for artifact in &report.artifacts {
            let path = artifact.outcome.path().expect("artifact saved");
            assert!(path.starts_with(dir.path()));
            assert!(path.exists());
        }
    }

    #[tokio::test]
    async fn test_missing_screenshots_do_not_change_verdict() {
        let dir = tempfile::tempdir().unwrap();
        let scenario = canonical(dir.path(), SECRET);

        let report = ScenarioRunner::new()
            .run(&scenario, admin_driver(populated_events()).without_screenshots())
            .await;

        assert!(report.passed());
        assert!(report
            .artifacts
            .iter()
            .all(|a| matches!(a.outcome, CaptureOutcome::Failed { .. })));
    }

    #[tokio::test]
    async fn test_wrong_header_count_fails() {
        let dir = tempfile::tempdir().unwrap();
        let scenario = canonical(dir.path(), SECRET);
        let events = events_page(&HEADERS[..5], vec![event_row(1, "Social")]);

        let report = ScenarioRunner::new().run(&scenario, admin_driver(events)).await;

        assert!(!report.passed());
        assert!(result(&report, "header 'Type'").passed);
        assert_eq!(report.verdict.failed_names(), vec!["header count"]);
    }

    #[tokio::test]
    async fn test_console_errors_are_informational() {
        let dir = tempfile::tempdir().unwrap();
        let scenario = canonical(dir.path(), SECRET);
        let events = populated_events().console(ConsoleMessage::error("TypeError: x is undefined"));

        let report = ScenarioRunner::new().run(&scenario, admin_driver(events)).await;

        assert!(report.passed());
        assert_eq!(report.console_errors(), 1);
        let console = result(&report, "console clean");
        assert!(!console.passed);
        assert_eq!(console.severity, Severity::Informational);
    }
}

mod authentication_tests {
    use super::*;

    #[tokio::test]
    async fn test_invalid_credentials_fail_without_table_checks() {
        let dir = tempfile::tempdir().unwrap();
        let scenario = canonical(dir.path(), "wrong-password");

        let report = ScenarioRunner::new()
            .run(&scenario, admin_driver(populated_events()))
            .await;

        let auth = report.auth.as_ref().unwrap();
        assert_eq!(auth.state, AuthState::Failed);
        assert_eq!(auth.failure, Some(AuthFailure::Rejected));
        let error_text = auth.error_text.as_deref().unwrap();
        assert!(!error_text.is_empty());
        assert!(error_text.contains("Invalid"));

        assert!(!report.passed());
        assert_eq!(report.aborted_at.as_deref(), Some(steps::AUTHENTICATION));
        assert_eq!(report.verdict.failed_names(), vec![steps::AUTHENTICATION]);
        assert!(report.results.iter().all(|r| r.name == steps::AUTHENTICATION));
        // diagnostic screenshot of the login page only
        let labels: Vec<&str> = report.artifacts.iter().map(|a| a.label.as_str()).collect();
        assert_eq!(labels, vec![FINAL_LABEL]);
    }

    #[tokio::test]
    async fn test_missing_login_form_is_a_failed_step() {
        let dir = tempfile::tempdir().unwrap();
        let scenario = canonical(dir.path(), SECRET);
        let driver = MockDriver::new()
            .with_page(format!("{BASE}/login"), MockPage::new())
            .with_page(format!("{BASE}/admin/events"), populated_events());

        let report = ScenarioRunner::new().run(&scenario, driver).await;

        assert!(!report.passed());
        assert!(report.auth.is_none());
        assert_eq!(report.aborted_at.as_deref(), Some(steps::AUTHENTICATION));
        let failed = &report.verdict.failed_checks[0];
        assert!(failed.actual.contains("No element matches"), "{}", failed.actual);
    }
}

mod empty_table_tests {
    use super::*;

    #[tokio::test]
    async fn test_zero_rows_reported_without_failing() {
        let dir = tempfile::tempdir().unwrap();
        let mut scenario = canonical(dir.path(), SECRET);
        scenario
            .checks
            .retain(|c| !matches!(c, Check::RowCount { .. }));
        let events = events_page(&HEADERS, Vec::new());

        let report = ScenarioRunner::new().run(&scenario, admin_driver(events)).await;

        let row_badge = result(&report, "row badge column 2");
        assert!(!row_badge.passed);
        assert_eq!(row_badge.severity, Severity::Informational);
        assert!(row_badge.actual.contains("empty match set"));
        // badges check sees no badges either, and it is mandatory
        assert_eq!(report.verdict.failed_names(), vec!["badges"]);
    }

    #[tokio::test]
    async fn test_zero_rows_pass_when_only_headers_are_required() {
        let dir = tempfile::tempdir().unwrap();
        let mut scenario = canonical(dir.path(), SECRET);
        scenario
            .checks
            .retain(|c| matches!(c, Check::Header { .. } | Check::RowBadge { .. }));
        let events = events_page(&HEADERS, Vec::new());

        let report = ScenarioRunner::new().run(&scenario, admin_driver(events)).await;

        assert!(report.passed(), "{:?}", report.verdict.failed_names());
        assert!(!result(&report, "row badge column 2").passed);
    }
}

mod bound_tests {
    use super::*;

    #[tokio::test]
    async fn test_stalled_navigation_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let scenario = canonical(dir.path(), SECRET);
        let driver = admin_driver(MockPage::new().stalling());

        let report = tokio::time::timeout(
            Duration::from_secs(10),
            ScenarioRunner::new().run(&scenario, driver),
        )
        .await
        .expect("run must respect its own bounds");

        assert!(!report.passed());
        assert_eq!(report.aborted_at.as_deref(), Some(steps::NAVIGATION));
        let failed = &report.verdict.failed_checks[0];
        assert_eq!(failed.name, steps::NAVIGATION);
        assert!(failed.actual.contains("timed out"), "{}", failed.actual);
    }

    #[tokio::test]
    async fn test_busy_network_times_out_wait() {
        let dir = tempfile::tempdir().unwrap();
        let scenario = canonical(dir.path(), SECRET);
        let driver = admin_driver(populated_events().with_busy_network());

        let report = ScenarioRunner::new().run(&scenario, driver).await;

        assert_eq!(report.aborted_at.as_deref(), Some(steps::WAIT));
        assert!(!report.passed());
        assert!(report.results.iter().all(|r| r.name != "header 'Type'"));
    }

    #[tokio::test]
    async fn test_navigation_error_is_a_failed_step() {
        let dir = tempfile::tempdir().unwrap();
        let scenario = canonical(dir.path(), SECRET);
        let driver = admin_driver(MockPage::new().failing("net::ERR_CONNECTION_REFUSED"));

        let report = ScenarioRunner::new().run(&scenario, driver).await;

        assert_eq!(report.aborted_at.as_deref(), Some(steps::NAVIGATION));
        assert!(report.verdict.failed_checks[0]
            .actual
            .contains("ERR_CONNECTION_REFUSED"));
    }
}

mod repeatability_tests {
    use super::*;

    fn outcome(report: &ScenarioReport) -> Vec<(String, bool)> {
        report
            .results
            .iter()
            .map(|r| (r.name.clone(), r.passed))
            .collect()
    }

    #[tokio::test]
    async fn test_repeated_runs_agree() {
        let dir = tempfile::tempdir().unwrap();
        let scenario = canonical(dir.path(), SECRET);
        let runner = ScenarioRunner::new();

        let first = runner.run(&scenario, admin_driver(populated_events())).await;
        let second = runner.run(&scenario, admin_driver(populated_events())).await;

        assert_eq!(first.verdict, second.verdict);
        assert_eq!(outcome(&first), outcome(&second));
    }

    #[tokio::test]
    async fn test_reporter_aggregates_runs() {
        let dir = tempfile::tempdir().unwrap();
        let runner = ScenarioRunner::new();
        let mut reporter = Reporter::new("admin");
        reporter.record(
            runner
                .run(&canonical(dir.path(), SECRET), admin_driver(populated_events()))
                .await,
        );
        reporter.record(
            runner
                .run(&canonical(dir.path(), "nope"), admin_driver(populated_events()))
                .await,
        );

        assert_eq!(reporter.total_count(), 2);
        assert_eq!(reporter.passed_count(), 1);
        assert!(!reporter.all_passed());
        let junit = reporter.render_junit();
        assert!(junit.contains("<failure"));
        assert!(junit.contains("authentication"));
    }
}
