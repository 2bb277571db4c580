//! SessionDriver - Abstract Browser Automation Trait
//!
//! The driver is the only place the harness touches a browser. Everything
//! above it (sessions, login, snapshots) is written against this trait so
//! implementations can be swapped.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │  SessionDriver (Abstract Trait)                               │
//! ├───────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────┐        ┌─────────────────────┐      │
//! │  │  ChromiumDriver     │        │  MockDriver         │      │
//! │  │  (feature=browser)  │        │  (tests)            │      │
//! │  │  CDP via            │        │  in-memory element  │      │
//! │  │  chromiumoxide      │        │  tree + click rules │      │
//! │  └─────────────────────┘        └─────────────────────┘      │
//! └───────────────────────────────────────────────────────────────┘
//! ```

use crate::locator::{Selector, TEST_ID_ATTRIBUTE};
use crate::result::{AttestError, AttestResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::SystemTime;

/// Element handle for DOM interactions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementHandle {
    /// Driver-assigned identifier, valid until the next navigation
    pub id: String,
    /// Element tag name (lowercase)
    pub tag_name: String,
    /// Element text content
    pub text_content: Option<String>,
    /// Whether the element is rendered and visible
    pub visible: bool,
    /// Whether the element accepts input
    pub enabled: bool,
}

impl ElementHandle {
    /// Create a new visible, enabled element handle
    #[must_use]
    pub fn new(id: impl Into<String>, tag_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tag_name: tag_name.into(),
            text_content: None,
            visible: true,
            enabled: true,
        }
    }

    /// Set text content
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text_content = Some(text.into());
        self
    }

    /// Whitespace-normalised text content
    #[must_use]
    pub fn text(&self) -> String {
        normalize_text(self.text_content.as_deref().unwrap_or_default())
    }

    /// Whether the element can be filled or clicked
    #[must_use]
    pub const fn is_actionable(&self) -> bool {
        self.visible && self.enabled
    }
}

/// Collapse runs of whitespace and trim
#[must_use]
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Network/document readiness as observed by the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NetworkActivity {
    /// `document.readyState === "complete"`
    pub document_complete: bool,
    /// Number of resources the page has requested so far
    pub resource_count: usize,
}

/// Console message severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleLevel {
    /// `console.log` / `console.info`
    Info,
    /// `console.warn`
    Warning,
    /// `console.error`
    Error,
    /// Uncaught exception or unhandled rejection
    PageError,
}

impl ConsoleLevel {
    /// Errors and page errors
    #[must_use]
    pub const fn is_error(self) -> bool {
        matches!(self, Self::Error | Self::PageError)
    }
}

/// Message captured from the page console
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleMessage {
    /// Severity
    pub level: ConsoleLevel,
    /// Message text
    pub text: String,
}

impl ConsoleMessage {
    /// Create a console message
    #[must_use]
    pub fn new(level: ConsoleLevel, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
        }
    }

    /// Create an error message
    #[must_use]
    pub fn error(text: impl Into<String>) -> Self {
        Self::new(ConsoleLevel::Error, text)
    }
}

/// Screenshot data with metadata
#[derive(Debug, Clone)]
pub struct Screenshot {
    /// Raw PNG data
    pub data: Vec<u8>,
    /// Whether the capture extends beyond the viewport
    pub full_page: bool,
    /// Timestamp when screenshot was taken
    pub timestamp: SystemTime,
}

impl Screenshot {
    /// Create a new screenshot
    #[must_use]
    pub fn new(data: Vec<u8>, full_page: bool) -> Self {
        Self {
            data,
            full_page,
            timestamp: SystemTime::now(),
        }
    }

    /// Get the size in bytes
    #[must_use]
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }

    /// Check if screenshot is valid (has data)
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.data.is_empty()
    }
}

/// Browser configuration for driver
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Run in headless mode
    pub headless: bool,
    /// Viewport width
    pub viewport_width: u32,
    /// Viewport height
    pub viewport_height: u32,
    /// User agent string
    pub user_agent: Option<String>,
    /// Executable path override
    pub executable_path: Option<String>,
    /// Sandbox mode (disable for containers)
    pub sandbox: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            headless: true,
            viewport_width: 1920,
            viewport_height: 1080,
            user_agent: None,
            executable_path: None,
            sandbox: true,
        }
    }
}

impl DriverConfig {
    /// Create new config with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set headless mode
    #[must_use]
    pub const fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set viewport dimensions
    #[must_use]
    pub const fn viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport_width = width;
        self.viewport_height = height;
        self
    }

    /// Set user agent
    #[must_use]
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Set the chromium executable
    #[must_use]
    pub fn executable(mut self, path: impl Into<String>) -> Self {
        self.executable_path = Some(path.into());
        self
    }

    /// Disable sandbox (for containers/CI)
    #[must_use]
    pub const fn no_sandbox(mut self) -> Self {
        self.sandbox = false;
        self
    }
}

/// Abstract driver trait for browser automation
///
/// Implementations are not required to bound their own calls; the
/// [`crate::Session`] wraps every suspension point in a timeout.
#[async_trait]
pub trait SessionDriver: Send + Sync {
    /// Navigate to URL
    async fn navigate(&mut self, url: &str) -> AttestResult<()>;

    /// Get current URL
    async fn current_url(&self) -> AttestResult<String>;

    /// Query all matching elements in the document
    async fn query_all(&self, selector: &Selector) -> AttestResult<Vec<ElementHandle>>;

    /// Query all matching descendants of `scope`
    async fn query_within(
        &self,
        scope: &ElementHandle,
        selector: &Selector,
    ) -> AttestResult<Vec<ElementHandle>>;

    /// Replace the value of an input element
    async fn fill(&mut self, element: &ElementHandle, text: &str) -> AttestResult<()>;

    /// Click element
    async fn click(&mut self, element: &ElementHandle) -> AttestResult<()>;

    /// Serialized markup of the current document
    async fn content(&self) -> AttestResult<String>;

    /// Document readiness and resource counters
    async fn network_activity(&self) -> AttestResult<NetworkActivity>;

    /// Console messages captured since the session started
    async fn console_messages(&self) -> AttestResult<Vec<ConsoleMessage>>;

    /// Take screenshot
    async fn screenshot(&self, full_page: bool) -> AttestResult<Screenshot>;

    /// Close the page and its browser
    async fn close(&mut self) -> AttestResult<()>;
}

// ============================================================================
// Mock driver
// ============================================================================

/// Element in the [`MockDriver`] page model
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MockElement {
    /// Tag name
    pub tag: String,
    /// Attributes (including `class` and `data-testid`)
    pub attributes: BTreeMap<String, String>,
    /// Own text (children contribute their text after it)
    pub text: String,
    /// Text of an associated `<label>`
    pub label: Option<String>,
    /// Own visibility flag
    pub visible: bool,
    /// Whether the element is enabled
    pub enabled: bool,
    /// Child elements
    pub children: Vec<MockElement>,
}

impl MockElement {
    /// Create a visible, enabled element
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_lowercase(),
            visible: true,
            enabled: true,
            ..Self::default()
        }
    }

    /// Set an attribute
    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Set the test id attribute
    #[must_use]
    pub fn test_id(self, id: impl Into<String>) -> Self {
        self.attr(TEST_ID_ATTRIBUTE, id)
    }

    /// Set the class attribute
    #[must_use]
    pub fn class(self, classes: impl Into<String>) -> Self {
        self.attr("class", classes)
    }

    /// Set own text
    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Associate a label
    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Hide the element
    #[must_use]
    pub const fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Disable the element
    #[must_use]
    pub const fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Append a child
    #[must_use]
    pub fn child(mut self, child: Self) -> Self {
        self.children.push(child);
        self
    }

    /// Append several children
    #[must_use]
    pub fn children(mut self, children: impl IntoIterator<Item = Self>) -> Self {
        self.children.extend(children);
        self
    }

    fn classes(&self) -> impl Iterator<Item = &str> {
        self.attributes
            .get("class")
            .map(String::as_str)
            .unwrap_or_default()
            .split_whitespace()
    }

    fn text_content(&self) -> String {
        let mut out = self.text.clone();
        for child in &self.children {
            let text = child.text_content();
            if !text.is_empty() {
                if !out.is_empty() {
                    out.push(' ');
                }
                out.push_str(&text);
            }
        }
        out
    }

    fn render(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.tag);
        for (name, value) in &self.attributes {
            out.push_str(&format!(" {name}=\"{value}\""));
        }
        out.push('>');
        out.push_str(&self.text);
        for child in &self.children {
            child.render(out);
        }
        out.push_str("</");
        out.push_str(&self.tag);
        out.push('>');
    }
}

/// A page served by the [`MockDriver`]
#[derive(Debug, Clone, Default)]
pub struct MockPage {
    /// Top-level elements of the body
    pub body: Vec<MockElement>,
    /// Console messages emitted when the page loads
    pub console: Vec<ConsoleMessage>,
    /// Navigation to this page fails with this message
    pub navigation_error: Option<String>,
    /// Navigation to this page never completes
    pub stalls: bool,
    /// Network never goes quiet on this page
    pub busy_network: bool,
}

impl MockPage {
    /// Create an empty page
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a body element
    #[must_use]
    pub fn element(mut self, element: MockElement) -> Self {
        self.body.push(element);
        self
    }

    /// Emit a console message on load
    #[must_use]
    pub fn console(mut self, message: ConsoleMessage) -> Self {
        self.console.push(message);
        self
    }

    /// Make navigation to this page fail
    #[must_use]
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.navigation_error = Some(message.into());
        self
    }

    /// Make navigation to this page hang
    #[must_use]
    pub const fn stalling(mut self) -> Self {
        self.stalls = true;
        self
    }

    /// Keep the network busy forever
    #[must_use]
    pub const fn with_busy_network(mut self) -> Self {
        self.busy_network = true;
        self
    }
}

/// What a click does in the mock page model
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickEffect {
    /// Navigate to a URL
    Navigate(String),
    /// Make the elements matching the selector visible
    Reveal(Selector),
    /// Nothing happens
    Nothing,
}

/// Click behaviour for elements matching `target`
#[derive(Debug, Clone)]
pub struct ClickRule {
    /// Clicked element selector
    pub target: Selector,
    /// Inputs that must hold the given values for `on_success`
    pub requires: Vec<(Selector, String)>,
    /// Effect when every requirement holds
    pub on_success: ClickEffect,
    /// Effect otherwise
    pub on_failure: ClickEffect,
}

impl ClickRule {
    /// Rule with no requirements
    #[must_use]
    pub fn new(target: Selector, effect: ClickEffect) -> Self {
        Self {
            target,
            requires: Vec::new(),
            on_success: effect,
            on_failure: ClickEffect::Nothing,
        }
    }

    /// Require an input value
    #[must_use]
    pub fn requires(mut self, input: Selector, value: impl Into<String>) -> Self {
        self.requires.push((input, value.into()));
        self
    }

    /// Effect when a requirement does not hold
    #[must_use]
    pub fn otherwise(mut self, effect: ClickEffect) -> Self {
        self.on_failure = effect;
        self
    }
}

/// Mock driver for unit testing
///
/// Serves [`MockPage`]s keyed by URL and evaluates a small CSS subset
/// (type, `.class`, `#id`, attribute selectors, descendant combinator and
/// selector lists) against them.
#[derive(Debug, Default)]
pub struct MockDriver {
    /// Current URL
    pub current_url: String,
    /// Pages by URL
    pub pages: HashMap<String, MockPage>,
    /// Click rules, first match wins
    pub click_rules: Vec<ClickRule>,
    /// Input values by element id
    pub values: HashMap<String, String>,
    /// Screenshot data (None = screenshots fail)
    pub screenshot_data: Option<Vec<u8>>,
    /// Call history for verification
    pub call_history: Vec<String>,
    console: Vec<ConsoleMessage>,
    network_polls: AtomicUsize,
}

impl MockDriver {
    /// Create new mock driver
    #[must_use]
    pub fn new() -> Self {
        Self {
            screenshot_data: Some(b"\x89PNG\r\n\x1a\n".to_vec()),
            ..Self::default()
        }
    }

    /// Serve a page at a URL
    #[must_use]
    pub fn with_page(mut self, url: impl Into<String>, page: MockPage) -> Self {
        self.pages.insert(url.into(), page);
        self
    }

    /// Add a click rule
    #[must_use]
    pub fn with_click_rule(mut self, rule: ClickRule) -> Self {
        self.click_rules.push(rule);
        self
    }

    /// Make every screenshot fail
    #[must_use]
    pub fn without_screenshots(mut self) -> Self {
        self.screenshot_data = None;
        self
    }

    /// Get call history
    #[must_use]
    pub fn history(&self) -> &[String] {
        &self.call_history
    }

    /// Check if method was called
    #[must_use]
    pub fn was_called(&self, method: &str) -> bool {
        self.call_history.iter().any(|c| c.starts_with(method))
    }

    fn page(&self) -> Option<&MockPage> {
        self.pages.get(&self.current_url)
    }

    fn flatten(&self) -> Vec<Located<'_>> {
        let mut out = Vec::new();
        if let Some(page) = self.page() {
            for (i, element) in page.body.iter().enumerate() {
                collect(element, i.to_string(), &[], true, &mut out);
            }
        }
        out
    }

    fn matches(&self, selector: &Selector, within: Option<&str>) -> Vec<ElementHandle> {
        let prefix = within.map(|id| format!("{id}."));
        self.flatten()
            .into_iter()
            .filter(|loc| {
                prefix
                    .as_deref()
                    .map_or(true, |p| loc.id.starts_with(p))
            })
            .filter(|loc| selector_matches(selector, loc))
            .map(|loc| loc.handle())
            .collect()
    }

    fn effect_for(&self, element: &ElementHandle) -> ClickEffect {
        let located = self.flatten();
        let Some(clicked) = located.iter().find(|loc| loc.id == element.id) else {
            return ClickEffect::Nothing;
        };
        let Some(rule) = self
            .click_rules
            .iter()
            .find(|rule| selector_matches(&rule.target, clicked))
        else {
            return ClickEffect::Nothing;
        };
        let satisfied = rule.requires.iter().all(|(input, expected)| {
            located
                .iter()
                .find(|loc| selector_matches(input, loc))
                .and_then(|loc| self.values.get(&loc.id))
                .is_some_and(|value| value == expected)
        });
        if satisfied {
            rule.on_success.clone()
        } else {
            rule.on_failure.clone()
        }
    }

    fn reveal(&mut self, selector: &Selector) {
        let ids: Vec<String> = self
            .flatten()
            .into_iter()
            .filter(|loc| selector_matches(selector, loc))
            .map(|loc| loc.id)
            .collect();
        if let Some(page) = self.pages.get_mut(&self.current_url) {
            for id in ids {
                if let Some(element) = element_at_mut(&mut page.body, &id) {
                    element.visible = true;
                }
            }
        }
    }

    fn load(&mut self, url: &str) {
        self.current_url = url.to_string();
        self.values.clear();
        self.network_polls.store(0, Ordering::SeqCst);
        if let Some(page) = self.pages.get(url) {
            self.console.extend(page.console.iter().cloned());
        }
    }
}

#[async_trait]
impl SessionDriver for MockDriver {
    async fn navigate(&mut self, url: &str) -> AttestResult<()> {
        self.call_history.push(format!("navigate:{url}"));
        if let Some(page) = self.pages.get(url) {
            if let Some(ref message) = page.navigation_error {
                return Err(AttestError::Navigation {
                    url: url.to_string(),
                    message: message.clone(),
                });
            }
            if page.stalls {
                std::future::pending::<()>().await;
            }
        }
        self.load(url);
        Ok(())
    }

    async fn current_url(&self) -> AttestResult<String> {
        Ok(self.current_url.clone())
    }

    async fn query_all(&self, selector: &Selector) -> AttestResult<Vec<ElementHandle>> {
        Ok(self.matches(selector, None))
    }

    async fn query_within(
        &self,
        scope: &ElementHandle,
        selector: &Selector,
    ) -> AttestResult<Vec<ElementHandle>> {
        Ok(self.matches(selector, Some(&scope.id)))
    }

    async fn fill(&mut self, element: &ElementHandle, text: &str) -> AttestResult<()> {
        self.call_history.push(format!("fill:{}", element.id));
        self.values.insert(element.id.clone(), text.to_string());
        Ok(())
    }

    async fn click(&mut self, element: &ElementHandle) -> AttestResult<()> {
        self.call_history.push(format!("click:{}", element.id));
        match self.effect_for(element) {
            ClickEffect::Navigate(url) => self.load(&url),
            ClickEffect::Reveal(selector) => self.reveal(&selector),
            ClickEffect::Nothing => {}
        }
        Ok(())
    }

    async fn content(&self) -> AttestResult<String> {
        let mut out = String::from("<html><body>");
        if let Some(page) = self.page() {
            for element in &page.body {
                element.render(&mut out);
            }
        }
        out.push_str("</body></html>");
        Ok(out)
    }

    async fn network_activity(&self) -> AttestResult<NetworkActivity> {
        let polls = self.network_polls.fetch_add(1, Ordering::SeqCst);
        let busy = self.page().is_some_and(|p| p.busy_network);
        Ok(NetworkActivity {
            document_complete: true,
            resource_count: if busy { polls } else { 0 },
        })
    }

    async fn console_messages(&self) -> AttestResult<Vec<ConsoleMessage>> {
        Ok(self.console.clone())
    }

    async fn screenshot(&self, full_page: bool) -> AttestResult<Screenshot> {
        self.screenshot_data
            .clone()
            .map(|data| Screenshot::new(data, full_page))
            .ok_or_else(|| AttestError::Screenshot {
                message: "No mock screenshot set".to_string(),
            })
    }

    async fn close(&mut self) -> AttestResult<()> {
        self.call_history.push("close".to_string());
        Ok(())
    }
}

/// Element with its tree position and ancestry
struct Located<'a> {
    id: String,
    element: &'a MockElement,
    ancestors: Vec<&'a MockElement>,
    visible: bool,
}

impl Located<'_> {
    fn handle(&self) -> ElementHandle {
        let text = self.element.text_content();
        ElementHandle {
            id: self.id.clone(),
            tag_name: self.element.tag.clone(),
            text_content: (!text.is_empty()).then_some(text),
            visible: self.visible,
            enabled: self.element.enabled,
        }
    }
}

fn collect<'a>(
    element: &'a MockElement,
    id: String,
    ancestors: &[&'a MockElement],
    parent_visible: bool,
    out: &mut Vec<Located<'a>>,
) {
    let visible = parent_visible && element.visible;
    let mut chain = ancestors.to_vec();
    chain.push(element);
    out.push(Located {
        id: id.clone(),
        element,
        ancestors: ancestors.to_vec(),
        visible,
    });
    for (i, child) in element.children.iter().enumerate() {
        collect(child, format!("{id}.{i}"), &chain, visible, out);
    }
}

fn element_at_mut<'a>(body: &'a mut [MockElement], id: &str) -> Option<&'a mut MockElement> {
    let mut indexes = id.split('.').map(|s| s.parse::<usize>().ok());
    let mut current = body.get_mut(indexes.next()??)?;
    for index in indexes {
        current = current.children.get_mut(index?)?;
    }
    Some(current)
}

fn selector_matches(selector: &Selector, located: &Located<'_>) -> bool {
    match selector {
        Selector::TestId(id) => located
            .element
            .attributes
            .get(TEST_ID_ATTRIBUTE)
            .is_some_and(|v| v == id),
        Selector::Label(text) => {
            located.element.label.as_deref() == Some(text.as_str())
                || located
                    .element
                    .attributes
                    .get("aria-label")
                    .is_some_and(|v| v == text)
        }
        Selector::Css(css) => css
            .split(',')
            .any(|complex| complex_matches(complex.trim(), located)),
    }
}

fn complex_matches(complex: &str, located: &Located<'_>) -> bool {
    let compounds: Vec<&str> = complex.split_whitespace().collect();
    let Some((last, rest)) = compounds.split_last() else {
        return false;
    };
    if !compound_matches(last, located.element) {
        return false;
    }
    // descendant combinator: remaining compounds match ancestors, innermost first
    let mut ancestors = located.ancestors.iter().rev();
    rest.iter()
        .rev()
        .all(|compound| ancestors.any(|a| compound_matches(compound, a)))
}

fn compound_matches(compound: &str, element: &MockElement) -> bool {
    let mut rest = compound;
    let tag_end = rest.find(['.', '#', '[', ':']).unwrap_or(rest.len());
    let tag = &rest[..tag_end];
    if !tag.is_empty() && tag != "*" && !tag.eq_ignore_ascii_case(&element.tag) {
        return false;
    }
    rest = &rest[tag_end..];

    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix('.') {
            let end = after.find(['.', '#', '[', ':']).unwrap_or(after.len());
            if !element.classes().any(|c| c == &after[..end]) {
                return false;
            }
            rest = &after[end..];
        } else if let Some(after) = rest.strip_prefix('#') {
            let end = after.find(['.', '#', '[', ':']).unwrap_or(after.len());
            if element.attributes.get("id").map(String::as_str) != Some(&after[..end]) {
                return false;
            }
            rest = &after[end..];
        } else if let Some(after) = rest.strip_prefix('[') {
            let Some(end) = after.find(']') else {
                return false;
            };
            if !attribute_matches(&after[..end], element) {
                return false;
            }
            rest = &after[end + 1..];
        } else {
            // pseudo-classes are outside the supported subset
            return false;
        }
    }
    true
}

fn attribute_matches(expr: &str, element: &MockElement) -> bool {
    let operators = ["*=", "^=", "$=", "~=", "="];
    let Some((name, op, raw)) = operators.iter().find_map(|op| {
        expr.find(op)
            .map(|pos| (&expr[..pos], *op, &expr[pos + op.len()..]))
    }) else {
        return element.attributes.contains_key(expr.trim());
    };
    let want = raw.trim().trim_matches(|c| c == '"' || c == '\'');
    let Some(value) = element.attributes.get(name.trim()) else {
        return false;
    };
    match op {
        "*=" => value.contains(want),
        "^=" => value.starts_with(want),
        "$=" => value.ends_with(want),
        "~=" => value.split_whitespace().any(|v| v == want),
        _ => value == want,
    }
}

// ============================================================================
// Tests
// ============================================================================
