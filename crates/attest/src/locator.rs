//! Locator abstraction for element selection.
//!
//! A [`Locator`] is a pure description of how to find an element; resolution
//! happens against the live DOM through the session and may produce zero,
//! one or many matches.
//!
//! # Design Philosophy
//!
//! - **Stability ordering**: test ids are preferred, accessible labels come
//!   second, CSS third, positional indexes last.
//! - **Visible drift**: a [`LocatorChain`] reports which variant resolved so
//!   the session can warn when a fallback was needed.
//! - **Strict interaction**: fill/click need exactly one match, queries
//!   tolerate any number.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Attribute carrying explicit test identifiers
pub const TEST_ID_ATTRIBUTE: &str = "data-testid";

/// Query primitive understood by a [`crate::SessionDriver`]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Selector {
    /// CSS selector (e.g., "thead th")
    Css(String),
    /// Test ID selector (data-testid attribute)
    TestId(String),
    /// Accessible label: `<label>` text or `aria-label`
    Label(String),
}

impl Selector {
    /// Create a CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Create a test ID selector
    #[must_use]
    pub fn test_id(id: impl Into<String>) -> Self {
        Self::TestId(id.into())
    }

    /// Create a label selector
    #[must_use]
    pub fn label(text: impl Into<String>) -> Self {
        Self::Label(text.into())
    }

    /// CSS form of the selector, when one exists
    #[must_use]
    pub fn to_css(&self) -> Option<String> {
        match self {
            Self::Css(s) => Some(s.clone()),
            Self::TestId(id) => Some(format!("[{TEST_ID_ATTRIBUTE}={id:?}]")),
            Self::Label(_) => None,
        }
    }

    /// JavaScript expression evaluating to an array of matching elements
    /// below `root` (a JS expression naming an element or `document`)
    #[must_use]
    pub fn to_query_all(&self, root: &str) -> String {
        match self {
            Self::Css(_) | Self::TestId(_) => {
                let css = self.to_css().unwrap_or_default();
                format!("Array.from({root}.querySelectorAll({css:?}))")
            }
            Self::Label(text) => format!(
                "(() => {{ \
                    const want = {text:?}; \
                    const norm = s => (s || '').replace(/\\s+/g, ' ').trim(); \
                    const out = new Set(); \
                    for (const l of {root}.querySelectorAll('label')) {{ \
                        if (norm(l.textContent) === want && l.control) {{ out.add(l.control); }} \
                    }} \
                    for (const el of {root}.querySelectorAll('[aria-label]')) {{ \
                        if (norm(el.getAttribute('aria-label')) === want) {{ out.add(el); }} \
                    }} \
                    return Array.from(out); \
                }})()"
            ),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css(s) => write!(f, "css {s:?}"),
            Self::TestId(id) => write!(f, "test id {id:?}"),
            Self::Label(text) => write!(f, "label {text:?}"),
        }
    }
}

/// How stable a locator variant is against DOM changes (lower is better)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Stability {
    /// Explicit test identifier
    TestId,
    /// Accessible label or role
    Label,
    /// Structural CSS selector
    Css,
    /// Positional index among same-tag elements (fragile)
    Position,
}

/// Declarative description of how to find a UI element
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Locator {
    /// By explicit test identifier (preferred)
    TestId(String),
    /// By accessible label
    Label(String),
    /// By CSS selector
    Css(String),
    /// By position among the elements matching `css` (0-based)
    Position {
        /// Base CSS selector, usually a tag name
        css: String,
        /// Index among the matches
        index: usize,
    },
}

impl Locator {
    /// Locate by test identifier
    #[must_use]
    pub fn test_id(id: impl Into<String>) -> Self {
        Self::TestId(id.into())
    }

    /// Locate by accessible label
    #[must_use]
    pub fn label(text: impl Into<String>) -> Self {
        Self::Label(text.into())
    }

    /// Locate by CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Locate by position among `css` matches
    #[must_use]
    pub fn position(css: impl Into<String>, index: usize) -> Self {
        Self::Position {
            css: css.into(),
            index,
        }
    }

    /// Stability class of this variant
    #[must_use]
    pub const fn stability(&self) -> Stability {
        match self {
            Self::TestId(_) => Stability::TestId,
            Self::Label(_) => Stability::Label,
            Self::Css(_) => Stability::Css,
            Self::Position { .. } => Stability::Position,
        }
    }

    /// Driver selector used to enumerate candidates
    #[must_use]
    pub fn selector(&self) -> Selector {
        match self {
            Self::TestId(id) => Selector::TestId(id.clone()),
            Self::Label(text) => Selector::Label(text.clone()),
            Self::Css(css) | Self::Position { css, .. } => Selector::Css(css.clone()),
        }
    }

    /// Positional index, if this is a positional locator
    #[must_use]
    pub const fn index(&self) -> Option<usize> {
        match self {
            Self::Position { index, .. } => Some(*index),
            _ => None,
        }
    }

    /// Whether this variant is flagged as fragile
    #[must_use]
    pub const fn is_fragile(&self) -> bool {
        matches!(self, Self::Position { .. })
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TestId(id) => write!(f, "test id {id:?}"),
            Self::Label(text) => write!(f, "label {text:?}"),
            Self::Css(css) => write!(f, "css {css:?}"),
            Self::Position { css, index } => write!(f, "position {index} of {css:?}"),
        }
    }
}

/// Ordered fallback chain of locators, most stable first
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Locator>", into = "Vec<Locator>")]
pub struct LocatorChain {
    locators: Vec<Locator>,
}

impl LocatorChain {
    /// Build a chain; locators are ordered by stability, ties keep their
    /// declared order
    #[must_use]
    pub fn new(mut locators: Vec<Locator>) -> Self {
        locators.sort_by_key(Locator::stability);
        Self { locators }
    }

    /// Chain with a single locator
    #[must_use]
    pub fn single(locator: Locator) -> Self {
        Self {
            locators: vec![locator],
        }
    }

    /// Append a fallback and restore stability ordering
    #[must_use]
    pub fn or(mut self, locator: Locator) -> Self {
        self.locators.push(locator);
        Self::new(self.locators)
    }

    /// Locators in resolution order
    #[must_use]
    pub fn locators(&self) -> &[Locator] {
        &self.locators
    }

    /// The preferred locator
    #[must_use]
    pub fn preferred(&self) -> Option<&Locator> {
        self.locators.first()
    }

    /// Check if the chain is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locators.is_empty()
    }
}

impl From<Vec<Locator>> for LocatorChain {
    fn from(locators: Vec<Locator>) -> Self {
        Self::new(locators)
    }
}

impl From<LocatorChain> for Vec<Locator> {
    fn from(chain: LocatorChain) -> Self {
        chain.locators
    }
}

impl From<Locator> for LocatorChain {
    fn from(locator: Locator) -> Self {
        Self::single(locator)
    }
}

impl fmt::Display for LocatorChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.locators.iter().map(ToString::to_string).collect();
        write!(f, "[{}]", parts.join(" -> "))
    }
}
