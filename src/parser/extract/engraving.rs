use std::sync::LazyLock;

use regex::Regex;
use scraper::Html;

use crate::db::EngravingRow;
use crate::parser::{dom, sections};

use super::{first_non_empty, tables};

const TITLES: &[&str] = &["Engraving Abilities", "Engraving"];

static MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bE\s*(?:30|60|80)\b|\[\s*(?:30|60|80)\s*\]").unwrap());

/// Engraving table first; prose split on unlock markers when no table
/// qualifies.
pub fn extract(doc: &Html) -> Vec<EngravingRow> {
    first_non_empty(vec![
        Box::new(|| from_table(doc)),
        Box::new(|| from_markers(doc)),
    ])
}

fn from_table(doc: &Html) -> Vec<EngravingRow> {
    let Some(heading) = sections::find_heading(doc, TITLES) else {
        return Vec::new();
    };
    let Some(table) = tables::find_table(heading, |headers| {
        (tables::column(headers, "unlock").is_some() || tables::column(headers, "level").is_some())
            && tables::column(headers, "description").is_some()
    }) else {
        return Vec::new();
    };

    let headers = tables::header_row(table);
    let name_idx = tables::column(&headers, "name");
    let desc_idx = tables::column(&headers, "description");
    let unlock_idx =
        tables::column(&headers, "unlock").or_else(|| tables::column(&headers, "level"));
    let icon_idx = tables::column(&headers, "icon");

    let mut out = Vec::new();
    for tr in tables::data_rows(table) {
        let cells = tables::cells(tr);
        if cells.is_empty() {
            continue;
        }
        let name = tables::cell_text(&cells, name_idx);
        let desc = tables::cell_text(&cells, desc_idx);
        let unlock = tables::cell_text(&cells, unlock_idx);
        let icon = tables::cell_icon(&cells, icon_idx);
        if name.is_empty() && desc.is_empty() && unlock.is_empty() {
            continue;
        }
        out.push(EngravingRow {
            hero: String::new(),
            name,
            unlock_level: unlock,
            description_en: desc,
            description_vn: String::new(),
            icon,
        });
    }
    out
}

/// Prose fallback: some pages describe engravings as running text punctuated
/// by E30/E60/E80 (or bracketed [30]/[60]/[80]) markers. Each marker opens
/// an entry; the text up to the next marker is its description.
fn from_markers(doc: &Html) -> Vec<EngravingRow> {
    let text = sections::section_text(doc, TITLES);
    let markers: Vec<_> = MARKER_RE.find_iter(&text).collect();

    let mut out = Vec::new();
    for (i, m) in markers.iter().enumerate() {
        let end = markers.get(i + 1).map(|n| n.start()).unwrap_or(text.len());
        let unlock = m
            .as_str()
            .trim_matches(|c| c == '[' || c == ']' || c == ' ')
            .to_uppercase()
            .replace(' ', "");
        out.push(EngravingRow {
            hero: String::new(),
            name: String::new(),
            unlock_level: unlock,
            description_en: dom::clean(&text[m.end()..end]),
            description_vn: String::new(),
            icon: String::new(),
        });
    }
    out
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_with_level_column() {
        let doc = Html::parse_document(
            r#"<h2>Engraving Abilities</h2>
               <table>
                 <tr><th>Skill Name</th><th>Level</th><th>Description</th></tr>
                 <tr><td>Empowered Strike</td><td>E30</td><td>Gains 10 haste.</td></tr>
                 <tr><td>Empowered Strike</td><td>E60</td><td>Gains 20 haste.</td></tr>
               </table>"#,
        );
        let rows = extract(&doc);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name, "Empowered Strike");
        assert_eq!(rows[0].unlock_level, "E30");
        assert_eq!(rows[1].description_en, "Gains 20 haste.");
    }

    #[test]
    fn marker_fallback_splits_prose() {
        let doc = Html::parse_document(
            "<h2>Engraving</h2>\
             <p>E30 All attributes up by 5%. E 60 Crit rating up by 10.</p>",
        );
        let rows = extract(&doc);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].unlock_level, "E30");
        assert_eq!(rows[0].description_en, "All attributes up by 5%.");
        assert_eq!(rows[1].unlock_level, "E60");
        assert_eq!(rows[1].description_en, "Crit rating up by 10.");
        assert!(rows.iter().all(|r| r.name.is_empty()));
    }

    #[test]
    fn bracketed_markers() {
        let doc = Html::parse_document(
            "<h2>Engraving</h2><p>[30] Bonus armor. [60] Bonus resist.</p>",
        );
        let rows = extract(&doc);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].unlock_level, "30");
        assert_eq!(rows[1].unlock_level, "60");
        assert_eq!(rows[1].description_en, "Bonus resist.");
    }

    #[test]
    fn no_section_no_rows() {
        let doc = Html::parse_document("<h2>Skills</h2><p>E30 not an engraving section? No.</p>");
        assert!(extract(&doc).is_empty());
    }
}
