use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use crate::db::HeroRow;
use crate::parser::infobox::{self, Infobox};
use crate::parser::{dom, sections};

use super::quotes;

static TITLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("#firstHeading").unwrap());
static CONTENT: LazyLock<Selector> = LazyLock::new(|| Selector::parse(".mw-parser-output").unwrap());

/// Assemble the profile record. Every field is present; absent data is the
/// empty string.
pub fn extract(url: &str, doc: &Html, infobox: &Infobox) -> HeroRow {
    let name = doc
        .select(&TITLE)
        .next()
        .map(dom::text_of)
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| "Unknown".to_string());
    let roles = infobox::resolve_roles(infobox);

    let intro = intro_text(doc);
    let personality = sections::section_text(doc, &["Personality"]);
    let overall = format!("{intro}\n\n{personality}").trim().to_string();

    HeroRow {
        icon: infobox::infobox_icon(doc),
        name,
        faction: field(infobox, "Faction"),
        hero_type: field(infobox, "Type"),
        class: field(infobox, "Class"),
        rarity: field(infobox, "Rarity"),
        role: field(infobox, "Role"),
        primary_role: roles.primary,
        secondary_role: roles.secondary,
        overall_en: overall,
        overall_vn: String::new(),
        personality_en: personality,
        personality_vn: String::new(),
        background_en: sections::section_text(doc, &["Background", "Story"]),
        background_vn: String::new(),
        quotes_en: quotes::extract(doc),
        quotes_vn: String::new(),
        trivia_en: sections::section_text(doc, &["Trivia"]),
        trivia_vn: String::new(),
        url: url.to_string(),
    }
}

fn field(infobox: &Infobox, label: &str) -> String {
    infobox.get(label).unwrap_or("").to_string()
}

/// Lead paragraphs: direct children of the content container up to the
/// first h2 or the table of contents. The infobox aside renders inside the
/// container and is skipped, as are infobox fragments nested in paragraphs.
fn intro_text(doc: &Html) -> String {
    let Some(content) = doc.select(&CONTENT).next() else {
        return String::new();
    };
    let mut out = Vec::new();
    for node in content.children() {
        let Some(el) = ElementRef::wrap(node) else {
            continue;
        };
        let tag = el.value().name();
        if tag == "aside" || (tag == "div" && dom::has_class(el, "portable-infobox")) {
            continue;
        }
        if tag == "p" {
            let txt = dom::text_without_infobox(el);
            if !txt.is_empty() {
                out.push(txt);
            }
        } else if tag == "h2" || (tag == "div" && el.value().id() == Some("toc")) {
            break;
        }
    }
    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::infobox::parse_infobox;

    #[test]
    fn intro_stops_at_first_section() {
        let doc = Html::parse_document(
            r#"<div class="mw-parser-output">
                 <aside class="portable-infobox"><p>sidebar</p></aside>
                 <p>Lead one.</p>
                 <p>Lead two.</p>
                 <h2>Skills</h2>
                 <p>Not intro.</p>
               </div>"#,
        );
        assert_eq!(intro_text(&doc), "Lead one.\nLead two.");
    }

    #[test]
    fn intro_stops_at_toc() {
        let doc = Html::parse_document(
            r#"<div class="mw-parser-output">
                 <p>Lead.</p>
                 <div id="toc">contents</div>
                 <p>After toc.</p>
               </div>"#,
        );
        assert_eq!(intro_text(&doc), "Lead.");
    }

    #[test]
    fn missing_title_defaults_to_unknown() {
        let doc = Html::parse_document("<p>bare page</p>");
        let map = parse_infobox(&doc);
        let hero = extract("https://wiki.example/wiki/X", &doc, &map);
        assert_eq!(hero.name, "Unknown");
        assert_eq!(hero.faction, "");
        assert_eq!(hero.url, "https://wiki.example/wiki/X");
    }
}
