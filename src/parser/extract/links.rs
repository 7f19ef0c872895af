use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::parser::dom;

/// Internal detail pages live under this path prefix.
const DETAIL_PREFIX: &str = "/wiki/";

/// Index/utility pages that are valid internal links but never hero pages.
const IGNORED_PATHS: &[&str] = &[
    "/wiki/Heroes",
    "/wiki/Rarity",
    "/wiki/Class",
    "/wiki/Type",
    "/wiki/Faction",
    "/wiki/Union",
];

static HEROES_ID_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^heroes$").unwrap());
static HEROES_TEXT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bheroes\b").unwrap());
static H23: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h2, h3").unwrap());

/// A discovered detail-page link. Uniqueness is by resolved absolute URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeroLink {
    pub url: String,
    pub name: String,
}

/// Hero detail links in the section under the "Heroes" heading of an
/// overview page, resolved against `base`. First occurrence kept, encounter
/// order preserved; empty when the heading is absent.
pub fn scan(doc: &Html, base: &Url) -> Vec<HeroLink> {
    let Some(root) = heroes_heading(doc) else {
        return Vec::new();
    };

    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Vec::new();
    for el in dom::following_elements(*root) {
        if matches!(dom::heading_level(el), Some(2 | 3)) {
            break;
        }
        if el.value().name() != "a" {
            continue;
        }
        let Some(href) = el.value().attr("href") else {
            continue;
        };
        let name = dom::text_of(el);
        if name.is_empty() || !href.starts_with(DETAIL_PREFIX) {
            continue;
        }
        let Ok(resolved) = base.join(href) else {
            continue;
        };
        let url = resolved.to_string();
        if seen.contains(&url) {
            continue;
        }
        // Namespaced paths (File:, Category:, …) are never hero pages.
        if href[DETAIL_PREFIX.len()..].contains(':') {
            continue;
        }
        if IGNORED_PATHS.iter().any(|p| href.starts_with(p)) {
            continue;
        }
        seen.insert(url.clone());
        out.push(HeroLink { url, name });
    }
    out
}

fn heroes_heading(doc: &Html) -> Option<ElementRef> {
    if let Some(el) = dom::elements(doc)
        .find(|e| e.value().id().is_some_and(|id| HEROES_ID_RE.is_match(id)))
    {
        if let Some(h) = dom::enclosing_heading(el, 3) {
            return Some(h);
        }
    }
    doc.select(&H23)
        .find(|h| HEROES_TEXT_RE.is_match(&dom::text_of(*h)))
}

// ── Tests ──
