//! Shared machinery for the table-first extraction strategies.

use std::sync::LazyLock;

use scraper::{ElementRef, Selector};

use crate::parser::dom;

static HEADER_CELLS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr th").unwrap());
static ROWS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").unwrap());
static CELLS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("th, td").unwrap());

/// First table after `heading` whose `<th>` texts satisfy `qualifies`.
/// Tables belong to the section only until another heading intervenes;
/// unqualified tables inside the section are skipped, not fatal.
pub fn find_table<'a>(
    heading: ElementRef<'a>,
    qualifies: impl Fn(&[String]) -> bool,
) -> Option<ElementRef<'a>> {
    for el in dom::following_elements(*heading) {
        if dom::is_heading(el) {
            return None;
        }
        if el.value().name() == "table" {
            let headers: Vec<String> = el
                .select(&HEADER_CELLS)
                .map(|th| dom::text_of(th).to_lowercase())
                .collect();
            if !headers.is_empty() && qualifies(&headers) {
                return Some(el);
            }
        }
    }
    None
}

/// Index of the column whose header text contains `key`.
pub fn column(headers: &[String], key: &str) -> Option<usize> {
    headers.iter().position(|h| h.contains(key))
}

/// Lowercased texts of the first row's cells (th or td).
pub fn header_row(table: ElementRef) -> Vec<String> {
    table
        .select(&ROWS)
        .next()
        .map(|tr| {
            tr.select(&CELLS)
                .map(|c| dom::text_of(c).to_lowercase())
                .collect()
        })
        .unwrap_or_default()
}

/// Every `<tr>` after the header row.
pub fn data_rows(table: ElementRef) -> Vec<ElementRef> {
    table.select(&ROWS).skip(1).collect()
}

/// Cells of a row (th or td, document order).
pub fn cells(tr: ElementRef) -> Vec<ElementRef> {
    tr.select(&CELLS).collect()
}

/// Normalized text of cell `idx`, empty when the column or cell is absent.
pub fn cell_text(cells: &[ElementRef], idx: Option<usize>) -> String {
    idx.and_then(|i| cells.get(i))
        .map(|c| dom::text_of(*c))
        .unwrap_or_default()
}

/// Icon URL from the first image in cell `idx`.
pub fn cell_icon(cells: &[ElementRef], idx: Option<usize>) -> String {
    idx.and_then(|i| cells.get(i))
        .and_then(|c| dom::first_img(*c))
        .map(dom::img_src)
        .unwrap_or_default()
}
