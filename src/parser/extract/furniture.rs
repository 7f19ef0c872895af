use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use crate::db::FurnitureRow;
use crate::parser::{dom, sections};

const TITLES: &[&str] = &["Furniture Set Bonuses", "Furniture"];

static ITEM: LazyLock<Selector> = LazyLock::new(|| Selector::parse("li").unwrap());

/// Template shape: the section heading, then an h3/h4 naming the set, then
/// a list of tier bonuses. At most one row.
pub fn extract(doc: &Html) -> Vec<FurnitureRow> {
    let Some(root) = sections::find_heading(doc, TITLES) else {
        return Vec::new();
    };

    let name_heading = dom::following_elements(*root)
        .take_while(|el| dom::heading_level(*el) != Some(2))
        .find(|el| matches!(dom::heading_level(*el), Some(3 | 4)));

    let name = name_heading.map(dom::text_of).unwrap_or_default();
    let icon = name_heading.map(furniture_icon).unwrap_or_default();

    let list_start = name_heading.unwrap_or(root);
    let desc = dom::following_elements(*list_start)
        .find(|el| el.value().name() == "ul")
        .map(|ul| {
            ul.select(&ITEM)
                .map(dom::text_of)
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join("\n")
        })
        .unwrap_or_default();

    if name.is_empty() && desc.is_empty() {
        return Vec::new();
    }
    vec![FurnitureRow {
        hero: String::new(),
        name: if name.is_empty() {
            "Furniture".to_string()
        } else {
            name
        },
        description_en: desc,
        description_vn: String::new(),
        icon,
    }]
}

/// Best-effort icon search tuned to the wiki's furniture template: a
/// right-aligned figure just before the name heading, an image inside the
/// heading, or a matching container just after it. Replaceable heuristic,
/// not a contract.
fn furniture_icon(heading: ElementRef) -> String {
    let qualifies = |el: ElementRef| {
        el.value().name() == "figure" || el.value().classes().any(|c| c.contains("tright"))
    };
    dom::preceding_elements(*heading)
        .find(|el| matches!(el.value().name(), "figure" | "div"))
        .filter(|el| qualifies(*el))
        .and_then(dom::first_img)
        .or_else(|| dom::first_img(heading))
        .or_else(|| {
            dom::following_elements(*heading)
                .find(|el| matches!(el.value().name(), "figure" | "div"))
                .filter(|el| qualifies(*el))
                .and_then(dom::first_img)
        })
        .map(dom::img_src)
        .unwrap_or_default()
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_icon_and_bonuses() {
        let doc = Html::parse_document(
            r#"<h2>Furniture Set Bonuses</h2>
               <figure class="tright"><img data-src="https://img.example/set.png"></figure>
               <h3>Dawnlight Parlor</h3>
               <ul><li>3/9: Crit +5</li><li>9/9: Haste +20</li></ul>"#,
        );
        let rows = extract(&doc);
        assert_eq!(rows.len(), 1);
        let r = &rows[0];
        assert_eq!(r.name, "Dawnlight Parlor");
        assert_eq!(r.icon, "https://img.example/set.png");
        assert_eq!(r.description_en, "3/9: Crit +5\n9/9: Haste +20");
    }

    #[test]
    fn inline_heading_icon() {
        let doc = Html::parse_document(
            r#"<h2>Furniture</h2>
               <h4>Moon Shrine <img src="https://img.example/shrine.png"></h4>
               <ul><li>Bonus</li></ul>"#,
        );
        let rows = extract(&doc);
        assert_eq!(rows[0].icon, "https://img.example/shrine.png");
        assert_eq!(rows[0].name, "Moon Shrine");
    }

    #[test]
    fn name_search_stops_at_next_section() {
        let doc = Html::parse_document(
            "<h2>Furniture</h2><ul><li>Tier bonus</li></ul>\
             <h2>Trivia</h2><h3>Not a set name</h3>",
        );
        let rows = extract(&doc);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "Furniture");
        assert_eq!(rows[0].description_en, "Tier bonus");
    }

    #[test]
    fn absent_section() {
        let doc = Html::parse_document("<h2>Skills</h2>");
        assert!(extract(&doc).is_empty());
    }
}
