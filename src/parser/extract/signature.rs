use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::db::SignatureRow;
use crate::parser::sections::StopRule;
use crate::parser::{dom, sections};

static ANCHOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^signature[\s_]*item$").unwrap());
static TEXT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bsignature\s+item\b").unwrap());
static SUB_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^(item|skill)\s*:").unwrap());
static ITEM: LazyLock<Selector> = LazyLock::new(|| Selector::parse("li").unwrap());
static H23: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h2, h3").unwrap());

/// One row carrying the whole signature-item section as text, or nothing.
pub fn extract(doc: &Html) -> Vec<SignatureRow> {
    let desc = description(doc);
    if desc.is_empty() {
        return Vec::new();
    }
    vec![SignatureRow {
        hero: String::new(),
        description_en: desc,
        description_vn: String::new(),
    }]
}

/// The section spans sub-headings ("Item:", "Skill:"), so the range only
/// closes at a heading of the start's level or above. Sub-headings with any
/// other title are navigation noise and dropped.
fn description(doc: &Html) -> String {
    let Some(root) = find_sig_heading(doc) else {
        return String::new();
    };

    let mut lines = Vec::new();
    for node in sections::section_nodes(root, StopRule::SameOrHigherLevel) {
        let Some(el) = ElementRef::wrap(node) else {
            continue;
        };
        match el.value().name() {
            "h3" | "h4" => {
                let title = dom::text_of(el);
                if SUB_RE.is_match(&title) {
                    lines.push(title);
                }
            }
            "p" | "blockquote" => {
                let txt = dom::text_of(el);
                if !txt.is_empty() {
                    lines.push(txt);
                }
            }
            "ul" => {
                for li in el.select(&ITEM) {
                    let txt = dom::text_of(li);
                    if !txt.is_empty() {
                        lines.push(txt);
                    }
                }
            }
            _ => {}
        }
    }

    let mut seen = HashSet::new();
    lines
        .into_iter()
        .filter(|l| seen.insert(l.clone()))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

fn find_sig_heading(doc: &Html) -> Option<ElementRef> {
    if let Some(el) = dom::elements(doc)
        .find(|e| e.value().id().is_some_and(|id| ANCHOR_RE.is_match(id)))
    {
        if let Some(h) = dom::enclosing_heading(el, 3) {
            return Some(h);
        }
    }
    doc.select(&H23).find(|h| TEXT_RE.is_match(&dom::text_of(*h)))
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_item_and_skill_subheadings_only() {
        let doc = Html::parse_document(
            r#"<h2><span id="Signature_Item">Signature Item</span></h2>
               <h3>Item: Oath Keeper</h3>
               <p>A blade sworn to the dawn.</p>
               <h3>Gallery</h3>
               <h3>Skill: Radiant Edge</h3>
               <ul><li>+15 attack</li><li>+30 attack</li></ul>
               <h2>Trivia</h2><p>outside</p>"#,
        );
        let rows = extract(&doc);
        assert_eq!(rows.len(), 1);
        assert_eq!(
            rows[0].description_en,
            "Item: Oath Keeper\nA blade sworn to the dawn.\nSkill: Radiant Edge\n+15 attack\n+30 attack"
        );
    }

    #[test]
    fn anchor_id_tolerates_spacing() {
        let doc = Html::parse_document(
            r#"<h3><span id="signature_item">The Item</span></h3><p>Desc line.</p>"#,
        );
        assert_eq!(extract(&doc)[0].description_en, "Desc line.");
    }

    #[test]
    fn heading_text_fallback() {
        let doc = Html::parse_document("<h2>Signature Item</h2><blockquote>Whisper.</blockquote>");
        assert_eq!(extract(&doc)[0].description_en, "Whisper.");
    }

    #[test]
    fn duplicate_lines_collapse() {
        let doc = Html::parse_document(
            "<h2>Signature Item</h2><p>Same line.</p><ul><li>Same line.</li></ul>",
        );
        assert_eq!(extract(&doc)[0].description_en, "Same line.");
    }

    #[test]
    fn absent_heading_is_empty() {
        let doc = Html::parse_document("<h2>Skills</h2><p>text</p>");
        assert!(extract(&doc).is_empty());
    }
}
