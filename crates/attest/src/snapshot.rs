//! DOM snapshot of the table under test.
//!
//! Captured once per scenario after the page has settled; checks are
//! evaluated against the snapshot, never against the live page.

use crate::driver::{ConsoleMessage, ElementHandle, SessionDriver};
use crate::locator::Selector;
use crate::result::AttestResult;
use crate::session::Session;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Selectors describing the table structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableSelectors {
    /// Header cells
    pub header_cell: String,
    /// Categorical badges anywhere in the table
    pub badge: String,
    /// Tagged data rows
    pub data_row: String,
    /// Cells within a data row
    pub cell: String,
}

impl Default for TableSelectors {
    fn default() -> Self {
        Self {
            header_cell: "table thead th".to_string(),
            badge: "table .mantine-Badge-root, table .badge".to_string(),
            data_row: "[data-testid=\"event-row\"]".to_string(),
            cell: "td".to_string(),
        }
    }
}

/// One cell of a data row
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CellSnapshot {
    /// Normalised cell text
    pub text: String,
    /// Texts of badges nested in the cell
    pub badges: Vec<String>,
}

/// Structural facts extracted from the rendered page
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DomSnapshot {
    /// URL the snapshot was taken at
    pub url: String,
    /// Header cell texts, in document order
    pub headers: Vec<String>,
    /// Badge texts, in document order
    pub badges: Vec<String>,
    /// Data rows, each a list of cells
    pub rows: Vec<Vec<CellSnapshot>>,
    /// Full document markup
    #[serde(skip)]
    pub markup: String,
    /// Console messages captured up to the snapshot
    pub console: Vec<ConsoleMessage>,
}

impl DomSnapshot {
    /// Capture the current page
    ///
    /// # Errors
    ///
    /// Driver faults and `Timeout`. Missing elements produce empty lists.
    pub async fn capture<D: SessionDriver>(
        session: &Session<D>,
        selectors: &TableSelectors,
    ) -> AttestResult<Self> {
        let headers = texts(&session.query_selector_all(&Selector::css(&selectors.header_cell)).await?);
        let badges = texts(&session.query_selector_all(&Selector::css(&selectors.badge)).await?);

        let badge_selector = Selector::css(&selectors.badge_within_cell());
        let cell_selector = Selector::css(&selectors.cell);
        let mut rows = Vec::new();
        for row in session.query_selector_all(&Selector::css(&selectors.data_row)).await? {
            let mut cells = Vec::new();
            for cell in session.query_within(&row, &cell_selector).await? {
                let nested = session.query_within(&cell, &badge_selector).await?;
                cells.push(CellSnapshot {
                    text: cell.text(),
                    badges: texts(&nested),
                });
            }
            rows.push(cells);
        }

        let snapshot = Self {
            url: session.current_url().await?,
            headers,
            badges,
            rows,
            markup: session.content().await?,
            console: session.console_messages().await?,
        };
        debug!(
            headers = snapshot.headers.len(),
            badges = snapshot.badges.len(),
            rows = snapshot.rows.len(),
            "DOM snapshot captured"
        );
        Ok(snapshot)
    }

    /// Cell at a 1-based column of the first data row
    #[must_use]
    pub fn first_row_cell(&self, column: usize) -> Option<&CellSnapshot> {
        self.rows.first()?.get(column.checked_sub(1)?)
    }
}

impl TableSelectors {
    /// Badge selector relative to a cell: the last compound of each list
    /// entry, so table-scoped badge selectors still match inside cells
    #[must_use]
    pub fn badge_within_cell(&self) -> String {
        self.badge
            .split(',')
            .filter_map(|s| s.split_whitespace().last())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn texts(elements: &[ElementHandle]) -> Vec<String> {
    elements.iter().map(ElementHandle::text).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::driver::{MockDriver, MockElement, MockPage};
    use crate::wait::Timeouts;

    fn badge(text: &str) -> MockElement {
        MockElement::new("span").class("mantine-Badge-root").text(text)
    }

    fn row(date: &str, kind: &str) -> MockElement {
        MockElement::new("tr").test_id("event-row").children([
            MockElement::new("td").text(date),
            MockElement::new("td").child(badge(kind)),
        ])
    }

    fn events_page(rows: Vec<MockElement>) -> MockPage {
        MockPage::new().element(
            MockElement::new("table").children([
                MockElement::new("thead").child(MockElement::new("tr").children([
                    MockElement::new("th").text("  Date "),
                    MockElement::new("th").text("Type"),
                ])),
                MockElement::new("tbody").children(rows),
            ]),
        )
    }

    async fn capture(page: MockPage) -> DomSnapshot {
        let mut driver = MockDriver::new().with_page("http://app/admin/events", page);
        driver.navigate("http://app/admin/events").await.unwrap();
        let session = Session::new(driver, "http://app", Timeouts::uniform(100));
        DomSnapshot::capture(&session, &TableSelectors::default()).await.unwrap()
    }

    mod selectors_tests {
        use super::*;

        #[test]
        fn test_badge_within_cell() {
            let selectors = TableSelectors::default();
            assert_eq!(selectors.badge_within_cell(), ".mantine-Badge-root, .badge");
        }
    }

    mod capture_tests {
        use super::*;

        #[tokio::test]
        async fn test_capture_table() {
            let snapshot = capture(events_page(vec![row("Sep 1", "Social"), row("Sep 2", "Class")])).await;
            assert_eq!(snapshot.headers, vec!["Date", "Type"]);
            assert_eq!(snapshot.badges, vec!["Social", "Class"]);
            assert_eq!(snapshot.rows.len(), 2);
            assert_eq!(snapshot.rows[0][1].badges, vec!["Social"]);
            assert_eq!(snapshot.url, "http://app/admin/events");
            assert!(snapshot.markup.contains("Type"));
        }

        #[tokio::test]
        async fn test_capture_empty_table() {
            let snapshot = capture(events_page(vec![])).await;
            assert_eq!(snapshot.headers.len(), 2);
            assert!(snapshot.rows.is_empty());
            assert!(snapshot.first_row_cell(2).is_none());
        }

        #[tokio::test]
        async fn test_first_row_cell_is_one_based() {
            let snapshot = capture(events_page(vec![row("Sep 1", "Social")])).await;
            assert_eq!(snapshot.first_row_cell(1).unwrap().text, "Sep 1");
            assert_eq!(snapshot.first_row_cell(2).unwrap().badges, vec!["Social"]);
            assert!(snapshot.first_row_cell(0).is_none());
            assert!(snapshot.first_row_cell(3).is_none());
        }
    }
}
