use std::collections::HashSet;

use anyhow::{Context, Result};
use reqwest::Client;
use scraper::Html;
use tracing::{info, warn};
use url::Url;

use crate::fetch;
use crate::parser::extract::links::{self, HeroLink};

/// Fetch one overview page and scan its Heroes section for detail links.
pub async fn extract_hero_links(client: &Client, overview_url: &str) -> Result<Vec<HeroLink>> {
    let base = Url::parse(overview_url).context("invalid overview URL")?;
    let (_, html) = fetch::fetch_html(client, overview_url).await?;
    let doc = Html::parse_document(&html);
    Ok(links::scan(&doc, &base))
}

/// Scan several overview pages. Duplicates across pages keep their first
/// occurrence; a page that fails to fetch is logged and skipped.
pub async fn collect_hero_links(client: &Client, urls: &[String]) -> Result<Vec<HeroLink>> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Vec::new();

    for url in urls {
        match extract_hero_links(client, url).await {
            Ok(found) => {
                info!("{}: {} hero links", url, found.len());
                for link in found {
                    if seen.insert(link.url.clone()) {
                        out.push(link);
                    }
                }
            }
            Err(e) => warn!("Overview scan failed for {}: {}", url, e),
        }
    }

    Ok(out)
}
