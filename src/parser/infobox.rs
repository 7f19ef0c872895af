use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};

use super::dom;

static ROWS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".portable-infobox .pi-data").unwrap());
static LABEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse(".pi-data-label").unwrap());
static VALUE: LazyLock<Selector> = LazyLock::new(|| Selector::parse(".pi-data-value").unwrap());
static CONTAINER: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".portable-infobox").unwrap());

static PRIMARY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)primary\s*[:\-]\s*([^;|•\n]+)").unwrap());
static SECONDARY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)secondary\s*[:\-]\s*([^;|•\n]+)").unwrap());
static ROLE_SEP_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*[,/•|;]\s*").unwrap());

/// Label → value pairs from the infobox sidebar, in document order. A
/// repeated label overwrites the earlier value in place (last occurrence
/// wins) — wiki templates do emit duplicates, and downstream expects the
/// later one.
#[derive(Debug, Default, Clone)]
pub struct Infobox {
    entries: Vec<(String, String)>,
}

impl Infobox {
    pub fn insert(&mut self, label: String, value: String) {
        match self.entries.iter_mut().find(|(l, _)| *l == label) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((label, value)),
        }
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(l, v)| (l.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// JSON object form, for the raw-infobox column.
    pub fn to_json(&self) -> String {
        let map: serde_json::Map<String, serde_json::Value> = self
            .iter()
            .map(|(l, v)| (l.to_string(), serde_json::Value::from(v)))
            .collect();
        serde_json::Value::Object(map).to_string()
    }
}

/// Scan `.portable-infobox .pi-data` label/value cell pairs. Absence is an
/// empty map, never an error.
pub fn parse_infobox(doc: &Html) -> Infobox {
    let mut map = Infobox::default();
    for row in doc.select(&ROWS) {
        let label = row.select(&LABEL).next().map(dom::text_of);
        let value = row.select(&VALUE).next().map(dom::text_of);
        if let (Some(label), Some(value)) = (label, value) {
            map.insert(label, value);
        }
    }
    map
}

/// Portrait URL: first image inside the infobox container. Portraits are
/// eagerly loaded, so only `src` is consulted.
pub fn infobox_icon(doc: &Html) -> String {
    doc.select(&CONTAINER)
        .next()
        .and_then(dom::first_img)
        .and_then(|img| img.value().attr("src"))
        .unwrap_or("")
        .to_string()
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Roles {
    pub primary: String,
    pub secondary: String,
}

/// Primary/secondary classification. Ordered heuristics, first hit wins:
/// explicit role fields, then a "Primary:/Secondary:" pattern inside a
/// role/classification field, then a separated list.
pub fn resolve_roles(infobox: &Infobox) -> Roles {
    let mut out = Roles::default();

    for (label, value) in infobox.iter() {
        let l = label.to_lowercase();
        if l.contains("primary role") || l.trim() == "primary" {
            out.primary = value.to_string();
        } else if l.contains("secondary role") || l.trim() == "secondary" {
            out.secondary = value.to_string();
        }
    }
    // An explicit field is final even when its counterpart stayed empty.
    if !out.primary.is_empty() || !out.secondary.is_empty() {
        return out;
    }

    let role_text = infobox
        .iter()
        .find(|(l, _)| matches!(l.to_lowercase().as_str(), "role" | "roles"))
        .or_else(|| {
            infobox
                .iter()
                .find(|(l, _)| l.to_lowercase().contains("classification"))
        })
        .map(|(_, v)| v);
    let Some(text) = role_text else {
        return out;
    };

    // "Primary: X … Secondary: Y"; the primary capture must not swallow the
    // secondary clause.
    let secondary = SECONDARY_RE.captures(text);
    let primary_scope = match &secondary {
        Some(caps) => &text[..caps.get(0).unwrap().start()],
        None => text,
    };
    if let Some(caps) = PRIMARY_RE.captures(primary_scope) {
        out.primary = caps[1].trim().to_string();
    }
    if let Some(caps) = secondary {
        out.secondary = caps[1].trim().to_string();
    }
    if !out.primary.is_empty() || !out.secondary.is_empty() {
        return out;
    }

    // Plain role list: first token is primary, the rest fold into secondary.
    let parts: Vec<&str> = ROLE_SEP_RE.split(text).filter(|p| !p.is_empty()).collect();
    if let Some((first, rest)) = parts.split_first() {
        out.primary = first.to_string();
        if !rest.is_empty() {
            out.secondary = rest.join(", ");
        }
    }
    out
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn infobox_of(pairs: &[(&str, &str)]) -> Infobox {
        let mut map = Infobox::default();
        for (l, v) in pairs {
            map.insert(l.to_string(), v.to_string());
        }
        map
    }

    #[test]
    fn parses_label_value_rows() {
        let doc = Html::parse_document(
            r#"<aside class="portable-infobox">
                 <div class="pi-data"><h3 class="pi-data-label">Faction</h3>
                   <div class="pi-data-value">Light</div></div>
                 <div class="pi-data"><h3 class="pi-data-label">Rarity</h3>
                   <div class="pi-data-value">Legendary</div></div>
               </aside>"#,
        );
        let map = parse_infobox(&doc);
        assert_eq!(map.get("Faction"), Some("Light"));
        assert_eq!(map.get("Rarity"), Some("Legendary"));
    }

    #[test]
    fn duplicate_label_keeps_last_value() {
        let mut map = Infobox::default();
        map.insert("Faction".into(), "Light".into());
        map.insert("Faction".into(), "Dark".into());
        assert_eq!(map.get("Faction"), Some("Dark"));
        assert_eq!(map.iter().count(), 1);
    }

    #[test]
    fn no_infobox_is_empty_map() {
        let doc = Html::parse_document("<p>no sidebar here</p>");
        assert!(parse_infobox(&doc).is_empty());
        assert_eq!(infobox_icon(&doc), "");
    }

    #[test]
    fn explicit_role_fields() {
        let map = infobox_of(&[("Primary Role", "Support"), ("Secondary Role", "Ranger")]);
        let roles = resolve_roles(&map);
        assert_eq!(roles.primary, "Support");
        assert_eq!(roles.secondary, "Ranger");
    }

    #[test]
    fn explicit_primary_alone_is_final() {
        let map = infobox_of(&[("Primary Role", "Support"), ("Role", "Tank, DPS")]);
        let roles = resolve_roles(&map);
        assert_eq!(roles.primary, "Support");
        assert_eq!(roles.secondary, "");
    }

    #[test]
    fn labeled_pattern_in_role_field() {
        let map = infobox_of(&[("Role", "Primary: Tank Secondary: DPS")]);
        let roles = resolve_roles(&map);
        assert_eq!(roles.primary, "Tank");
        assert_eq!(roles.secondary, "DPS");
    }

    #[test]
    fn labeled_pattern_tolerates_dash() {
        let map = infobox_of(&[("Classification", "Primary - Mage")]);
        let roles = resolve_roles(&map);
        assert_eq!(roles.primary, "Mage");
        assert_eq!(roles.secondary, "");
    }

    #[test]
    fn role_list_splits_on_separators() {
        let map = infobox_of(&[("Role", "Tank, DPS, Support")]);
        let roles = resolve_roles(&map);
        assert_eq!(roles.primary, "Tank");
        assert_eq!(roles.secondary, "DPS, Support");
    }

    #[test]
    fn no_role_like_field() {
        let map = infobox_of(&[("Faction", "Light")]);
        assert_eq!(resolve_roles(&map), Roles::default());
    }
}
