use std::collections::HashSet;
use std::sync::LazyLock;

use scraper::{Html, Selector};

use crate::db::SkillRow;
use crate::parser::{dom, sections};

use super::{first_non_empty, tables};

static BOXES: LazyLock<Selector> = LazyLock::new(|| Selector::parse("div.skillbox").unwrap());
static BOX_HEADER: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".skillbox-header").unwrap());
static BOX_IMAGE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".skillbox-image").unwrap());
static BOX_DESC: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".skillbox-description, p, li").unwrap());
static SMALL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("small").unwrap());

/// Skills table first; self-contained skill boxes only when the table
/// strategy produced nothing.
pub fn extract(doc: &Html) -> Vec<SkillRow> {
    first_non_empty(vec![
        Box::new(|| from_table(doc)),
        Box::new(|| from_boxes(doc)),
    ])
}

fn from_table(doc: &Html) -> Vec<SkillRow> {
    let Some(heading) = sections::find_heading(doc, &["Skills"]) else {
        return Vec::new();
    };
    let Some(table) = tables::find_table(heading, |headers| {
        tables::column(headers, "name").is_some() && tables::column(headers, "description").is_some()
    }) else {
        return Vec::new();
    };

    let headers = tables::header_row(table);
    let name_idx = tables::column(&headers, "name");
    let desc_idx = tables::column(&headers, "description");
    let unlock_idx = tables::column(&headers, "unlock");
    let icon_idx = tables::column(&headers, "icon");
    let (Some(name_idx), Some(desc_idx)) = (name_idx, desc_idx) else {
        return Vec::new();
    };

    let mut out = Vec::new();
    for tr in tables::data_rows(table) {
        let cells = tables::cells(tr);
        if cells.len() <= name_idx.max(desc_idx) {
            continue;
        }
        let name = dom::text_of(cells[name_idx]);
        let desc = dom::text_of(cells[desc_idx]);
        let unlock = tables::cell_text(&cells, unlock_idx);
        let icon = tables::cell_icon(&cells, icon_idx);
        if name.is_empty() && desc.is_empty() && unlock.is_empty() {
            continue;
        }
        out.push(SkillRow {
            hero: String::new(),
            unlock_level: unlock,
            name,
            skill_type: String::new(),
            description_en: desc,
            description_vn: String::new(),
            icon,
        });
    }
    out
}

/// Fallback layout: one `div.skillbox` per skill with a header (name plus
/// optional small-text type), an icon image and loose description elements.
fn from_boxes(doc: &Html) -> Vec<SkillRow> {
    let mut out = Vec::new();
    for skill_box in doc.select(&BOXES) {
        let Some(header) = skill_box.select(&BOX_HEADER).next() else {
            continue;
        };
        let name = dom::text_of(header);
        let skill_type = header
            .select(&SMALL)
            .next()
            .map(dom::text_of)
            .unwrap_or_default();
        let icon = skill_box
            .select(&BOX_IMAGE)
            .next()
            .and_then(dom::first_img)
            .map(dom::img_src)
            .unwrap_or_default();

        let mut seen = HashSet::new();
        let desc = skill_box
            .select(&BOX_DESC)
            .map(dom::text_of)
            .filter(|t| !t.is_empty())
            .filter(|t| seen.insert(t.clone()))
            .collect::<Vec<_>>()
            .join("\n");

        if name.is_empty() && desc.is_empty() {
            continue;
        }
        out.push(SkillRow {
            hero: String::new(),
            unlock_level: String::new(),
            name,
            skill_type,
            description_en: desc,
            description_vn: String::new(),
            icon,
        });
    }
    out
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE_PAGE: &str = r#"
        <h2>Skills</h2>
        <table>
          <tr><th>Icon</th><th>Name</th><th>Unlock</th><th>Description</th></tr>
          <tr>
            <td><img data-src="https://img.example/sunder.png" src="data:image/gif;base64,x"></td>
            <td>Sunder</td>
            <td>Level 1</td>
            <td>Deals   150%  damage to one enemy.</td>
          </tr>
        </table>"#;

    #[test]
    fn single_table_row() {
        let doc = Html::parse_document(TABLE_PAGE);
        let skills = extract(&doc);
        assert_eq!(skills.len(), 1);
        let s = &skills[0];
        assert_eq!(s.name, "Sunder");
        assert_eq!(s.unlock_level, "Level 1");
        assert_eq!(s.description_en, "Deals 150% damage to one enemy.");
        assert_eq!(s.description_vn, "");
        assert_eq!(s.icon, "https://img.example/sunder.png");
    }

    #[test]
    fn box_fallback_only_when_table_yields_nothing() {
        // The table lacks a description column, so it never qualifies and
        // the skill boxes win.
        let doc = Html::parse_document(
            r#"<h2>Skills</h2>
               <table><tr><th>Name</th><th>Tier</th></tr>
                 <tr><td>Ignored</td><td>1</td></tr></table>
               <div class="skillbox">
                 <div class="skillbox-header">Shadow Step <small>Passive</small></div>
                 <div class="skillbox-image"><img src="https://img.example/step.png"></div>
                 <div class="skillbox-description">Blinks behind the target.</div>
               </div>"#,
        );
        let skills = extract(&doc);
        assert_eq!(skills.len(), 1);
        let s = &skills[0];
        assert_eq!(s.name, "Shadow Step Passive");
        assert_eq!(s.skill_type, "Passive");
        assert_eq!(s.description_en, "Blinks behind the target.");
        assert_eq!(s.icon, "https://img.example/step.png");
    }

    #[test]
    fn box_description_lines_dedup() {
        let doc = Html::parse_document(
            r#"<div class="skillbox">
                 <div class="skillbox-header">Echo</div>
                 <div class="skillbox-description"><p>Repeats.</p></div>
                 <p>Repeats.</p>
               </div>"#,
        );
        let skills = extract(&doc);
        assert_eq!(skills[0].description_en, "Repeats.");
    }

    #[test]
    fn nothing_found_is_empty() {
        let doc = Html::parse_document("<h2>Trivia</h2><p>text</p>");
        assert!(extract(&doc).is_empty());
    }
}
