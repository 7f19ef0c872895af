use std::sync::LazyLock;

use scraper::ego_tree::NodeRef;
use scraper::{ElementRef, Html, Node, Selector};

use super::dom;

static HEADINGS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h2, h3, h4").unwrap());

/// Where a section's node range ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopRule {
    /// Any heading ends the range.
    AnyHeading,
    /// Only a heading at the start heading's level or above ends the range;
    /// deeper sub-headings belong to the section.
    SameOrHigherLevel,
}

/// First h2/h3/h4 whose text contains any of the candidate titles,
/// case-insensitive, in document order.
pub fn find_heading<'a>(doc: &'a Html, titles: &[&str]) -> Option<ElementRef<'a>> {
    doc.select(&HEADINGS).find(|h| {
        let text = dom::text_of(*h).to_lowercase();
        titles.iter().any(|t| text.contains(&t.to_lowercase()))
    })
}

/// Document-order nodes after `start`, bounded by the stop rule.
pub fn section_nodes<'a>(
    start: ElementRef<'a>,
    stop: StopRule,
) -> impl Iterator<Item = NodeRef<'a, Node>> + 'a {
    let base = dom::heading_level(start).unwrap_or(u8::MAX);
    dom::following(*start).take_while(move |node| {
        match ElementRef::wrap(*node).and_then(dom::heading_level) {
            Some(level) => match stop {
                StopRule::AnyHeading => false,
                StopRule::SameOrHigherLevel => level > base,
            },
            None => true,
        }
    })
}

/// Text of the section named by `titles`: paragraph, list-item and
/// blockquote content in range order, newline-joined. Empty when the
/// section is absent.
pub fn section_text(doc: &Html, titles: &[&str]) -> String {
    let Some(start) = find_heading(doc, titles) else {
        return String::new();
    };
    let mut out = Vec::new();
    for node in section_nodes(start, StopRule::AnyHeading) {
        if let Some(el) = ElementRef::wrap(node) {
            if matches!(el.value().name(), "p" | "li" | "blockquote") {
                let txt = dom::text_of(el);
                if !txt.is_empty() {
                    out.push(txt);
                }
            }
        }
    }
    out.join("\n")
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_matching_heading() {
        let doc = Html::parse_document("<h2>Background</h2><p>text</p>");
        assert!(find_heading(&doc, &["Skills", "Abilities"]).is_none());
    }

    #[test]
    fn exact_level_two_match() {
        let doc = Html::parse_document("<h2>Overview</h2><h2>Skills</h2><p>text</p>");
        let h = find_heading(&doc, &["Skills"]).unwrap();
        assert_eq!(dom::text_of(h), "Skills");
        assert_eq!(dom::heading_level(h), Some(2));
    }

    #[test]
    fn match_is_case_insensitive_substring() {
        let doc = Html::parse_document("<h3>Engraving Abilities</h3>");
        assert!(find_heading(&doc, &["engraving"]).is_some());
    }

    #[test]
    fn first_heading_wins() {
        let doc = Html::parse_document("<h3>Story</h3><h2>Background</h2>");
        let h = find_heading(&doc, &["Background", "Story"]).unwrap();
        assert_eq!(dom::text_of(h), "Story");
    }

    #[test]
    fn any_heading_stops_range() {
        let doc = Html::parse_document(
            "<h2>Trivia</h2><p>one</p><ul><li>two</li></ul><h3>Sub</h3><p>three</p>",
        );
        assert_eq!(section_text(&doc, &["Trivia"]), "one\ntwo");
    }

    #[test]
    fn same_or_higher_level_keeps_subheadings() {
        let doc = Html::parse_document(
            "<h2>Signature Item</h2><h3>Item: Sword</h3><p>body</p><h2>Next</h2><p>outside</p>",
        );
        let start = find_heading(&doc, &["Signature Item"]).unwrap();
        let names: Vec<_> = section_nodes(start, StopRule::SameOrHigherLevel)
            .filter_map(ElementRef::wrap)
            .map(|e| e.value().name().to_string())
            .collect();
        assert!(names.contains(&"h3".to_string()));
        assert!(names.contains(&"p".to_string()));
        assert!(!names.contains(&"h2".to_string()));
    }

    #[test]
    fn missing_section_is_empty_text() {
        let doc = Html::parse_document("<h2>Trivia</h2><p>one</p>");
        assert_eq!(section_text(&doc, &["Personality"]), "");
    }
}
