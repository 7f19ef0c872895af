use std::collections::HashSet;
use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use crate::parser::{dom, sections};

static ITEM: LazyLock<Selector> = LazyLock::new(|| Selector::parse("li").unwrap());

/// Voice lines first, then other quotes; exact duplicates collapse to their
/// first occurrence.
pub fn extract(doc: &Html) -> String {
    let mut lines = Vec::new();
    lines.extend(group(doc, "Voice_Lines", "voice lines"));
    lines.extend(group(doc, "Other_Quotes", "other quotes"));

    let mut seen = HashSet::new();
    lines
        .into_iter()
        .filter(|l| seen.insert(l.clone()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// One quote group: resolve the heading, take the first list after it (not
/// necessarily a direct sibling), collect item text.
fn group(doc: &Html, anchor: &str, keyword: &str) -> Vec<String> {
    let Some(heading) = heading_for(doc, anchor, keyword) else {
        return Vec::new();
    };
    let Some(list) = dom::following_elements(*heading).find(|el| el.value().name() == "ul") else {
        return Vec::new();
    };
    list.select(&ITEM)
        .map(dom::text_of)
        .filter(|t| !t.is_empty())
        .collect()
}

/// The anchor id wins; an anchor found outside any heading resolves to
/// nothing rather than falling back to the keyword search.
fn heading_for<'a>(doc: &'a Html, anchor: &str, keyword: &str) -> Option<ElementRef<'a>> {
    if let Some(el) = dom::elements(doc).find(|e| e.value().id() == Some(anchor)) {
        return dom::enclosing_heading(el, 4);
    }
    sections::find_heading(doc, &[keyword])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gathers_both_groups_in_order() {
        let doc = Html::parse_document(
            r#"<h2><span id="Voice_Lines">Voice Lines</span></h2>
               <ul><li>"For the light!"</li><li>"Stand fast."</li></ul>
               <h2><span id="Other_Quotes">Other Quotes</span></h2>
               <ul><li>"Old wounds ache."</li></ul>"#,
        );
        assert_eq!(
            extract(&doc),
            "\"For the light!\"\n\"Stand fast.\"\n\"Old wounds ache.\""
        );
    }

    #[test]
    fn duplicate_lines_appear_once_first_seen() {
        let doc = Html::parse_document(
            r#"<h2><span id="Voice_Lines">Voice Lines</span></h2>
               <ul><li>Shared line</li><li>Unique one</li></ul>
               <h2><span id="Other_Quotes">Other Quotes</span></h2>
               <ul><li>Shared line</li><li>Unique two</li></ul>"#,
        );
        assert_eq!(extract(&doc), "Shared line\nUnique one\nUnique two");
    }

    #[test]
    fn keyword_fallback_without_anchor() {
        let doc = Html::parse_document(
            "<h3>Voice Lines</h3><div><ul><li>Hello there</li></ul></div>",
        );
        assert_eq!(extract(&doc), "Hello there");
    }

    #[test]
    fn absent_sections_yield_empty() {
        let doc = Html::parse_document("<h2>Trivia</h2><ul><li>fact</li></ul>");
        assert_eq!(extract(&doc), "");
    }
}
