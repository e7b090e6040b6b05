// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Section lookup in the EnergyPlus tabular HTML report.
//!
//! The report is a flat sequence of blocks:
//!
//! ```text
//! <p>Report:<b> Annual Building Utility Performance Summary</b></p>
//! <p>For:<b> Entire Facility</b></p>
//! <b>Site and Source Energy</b><br><br>
//! <table> ... </table>
//! <b>Building Area</b><br><br>
//! <table> ... </table>
//! ```
//!
//! The document is parsed once with `scraper` and reduced to an owned
//! snapshot: every `<b>` heading and every `<table>` with its ordinal
//! position in document order. A section is the first table after its
//! heading. Headings are matched on trimmed text, ignoring ASCII case.

use scraper::{ElementRef, Html};

/// Label that precedes a report title.
const REPORT_LABEL: &str = "Report:";

/// Rows of `<td>` text from one table. Empty when the section is absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionTable {
    pub rows: Vec<Vec<String>>,
}

impl SectionTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Rows after the first `skip`.
    pub fn rows_from(&self, skip: usize) -> &[Vec<String>] {
        self.rows.get(skip..).unwrap_or(&[])
    }

    /// Cell text, or `""` when the row or cell does not exist.
    pub fn cell(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .map(String::as_str)
            .unwrap_or("")
    }
}

#[derive(Debug, Clone)]
struct Heading {
    ordinal: usize,
    text: String,
    /// Bold text inside a `Report:` paragraph.
    report_title: bool,
}

#[derive(Debug, Clone)]
struct TableSnapshot {
    ordinal: usize,
    table: SectionTable,
}

/// A parsed report ready for section lookups.
#[derive(Debug, Clone, Default)]
pub struct ReportDocument {
    headings: Vec<Heading>,
    tables: Vec<TableSnapshot>,
}

impl ReportDocument {
    pub fn parse(source: &str) -> Self {
        let html = Html::parse_document(source);
        let mut headings = Vec::new();
        let mut tables = Vec::new();

        let elements = html
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .enumerate();
        for (ordinal, el) in elements {
            match el.value().name() {
                "b" => headings.push(Heading {
                    ordinal,
                    text: element_text(el),
                    report_title: is_report_title(el),
                }),
                "table" => tables.push(TableSnapshot {
                    ordinal,
                    table: snapshot_table(el),
                }),
                _ => {}
            }
        }

        tracing::debug!(
            headings = headings.len(),
            tables = tables.len(),
            "Parsed report document"
        );
        Self { headings, tables }
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    /// First table following the heading `title` anywhere in the document.
    pub fn section_table(&self, title: &str) -> SectionTable {
        self.find_section(title, 0, usize::MAX)
            .cloned()
            .unwrap_or_default()
    }

    /// First table following the heading `title` inside the report named
    /// `report`. Falls back to [`section_table`](Self::section_table) only
    /// when the report title is missing; a report without the heading
    /// yields an empty table.
    pub fn section_table_in(&self, report: &str, title: &str) -> SectionTable {
        let Some((start, end)) = self.report_range(report) else {
            return self.section_table(title);
        };
        self.find_section(title, start, end)
            .cloned()
            .unwrap_or_default()
    }

    /// The first table in the document.
    pub fn first_table(&self) -> SectionTable {
        self.tables
            .first()
            .map(|t| t.table.clone())
            .unwrap_or_default()
    }

    /// Ordinal span from a report title to the next report title.
    fn report_range(&self, report: &str) -> Option<(usize, usize)> {
        let position = self
            .headings
            .iter()
            .position(|h| h.report_title && h.text.eq_ignore_ascii_case(report.trim()))?;
        let start = self.headings[position].ordinal;
        let end = self.headings[position + 1..]
            .iter()
            .find(|h| h.report_title)
            .map_or(usize::MAX, |h| h.ordinal);
        Some((start, end))
    }

    fn find_section(&self, title: &str, start: usize, end: usize) -> Option<&SectionTable> {
        let title = title.trim();
        let heading = self
            .headings
            .iter()
            .filter(|h| h.ordinal >= start && h.ordinal < end)
            .find(|h| h.text.eq_ignore_ascii_case(title))?;

        let index = self
            .tables
            .partition_point(|t| t.ordinal <= heading.ordinal);
        self.tables.get(index).map(|t| &t.table)
    }
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// `<p>Report:<b> Title</b></p>`: the bold element inside a paragraph,
/// directly preceded by the `Report:` label text.
fn is_report_title(el: ElementRef<'_>) -> bool {
    let in_paragraph = el
        .parent()
        .and_then(ElementRef::wrap)
        .is_some_and(|p| p.value().name() == "p");
    in_paragraph
        && el
            .prev_sibling()
            .and_then(|node| node.value().as_text().map(|t| t.trim() == REPORT_LABEL))
            .unwrap_or(false)
}

fn snapshot_table(table: ElementRef<'_>) -> SectionTable {
    let rows = table
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "tr")
        .map(|row| {
            row.descendants()
                .filter_map(ElementRef::wrap)
                .filter(|el| el.value().name() == "td")
                .map(cell_text)
                .collect()
        })
        .collect();
    SectionTable { rows }
}

/// Cell text with markup and non-breaking spaces removed.
fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text()
        .collect::<String>()
        .replace('\u{a0}', "")
        .trim()
        .to_string()
}
