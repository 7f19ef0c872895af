pub mod engraving;
pub mod furniture;
pub mod links;
pub mod profile;
pub mod quotes;
pub mod signature;
pub mod skills;
pub mod tables;

use scraper::Html;

use super::infobox::{self, Infobox};
use crate::db::{EngravingRow, FurnitureRow, HeroRow, SignatureRow, SkillRow};

pub struct ExtractedData {
    pub hero: HeroRow,
    pub infobox: Infobox,
    pub skills: Vec<SkillRow>,
    pub engravings: Vec<EngravingRow>,
    pub signatures: Vec<SignatureRow>,
    pub furniture: Vec<FurnitureRow>,
}

/// Run every extractor against one parsed page and stamp the hero name on
/// all sub-list rows. The record is always complete; absent data is "".
pub fn extract_all(url: &str, doc: &Html) -> ExtractedData {
    let infobox = infobox::parse_infobox(doc);
    let hero = profile::extract(url, doc, &infobox);

    let mut skills = skills::extract(doc);
    let mut engravings = engraving::extract(doc);
    let mut signatures = signature::extract(doc);
    let mut furniture = furniture::extract(doc);

    for row in &mut skills {
        row.hero = hero.name.clone();
    }
    for row in &mut engravings {
        row.hero = hero.name.clone();
    }
    for row in &mut signatures {
        row.hero = hero.name.clone();
    }
    for row in &mut furniture {
        row.hero = hero.name.clone();
    }

    ExtractedData {
        hero,
        infobox,
        skills,
        engravings,
        signatures,
        furniture,
    }
}

/// Try candidate extraction strategies in order; the first non-empty result
/// wins. Shared by every extractor with a fallback layout.
pub(crate) fn first_non_empty<T>(strategies: Vec<Box<dyn FnOnce() -> Vec<T> + '_>>) -> Vec<T> {
    for strategy in strategies {
        let out = strategy();
        if !out.is_empty() {
            return out;
        }
    }
    Vec::new()
}

// ── Tests ──
