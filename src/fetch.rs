use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Client;
use rusqlite::Connection;
use serde::Serialize;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::db::{EngravingRow, FetchRow, FurnitureRow, HeroRow, SignatureRow, SkillRow};
use crate::parser;

const CONCURRENCY: usize = 5;
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);
const USER_AGENT: &str = "Mozilla/5.0";

pub fn client() -> Result<Client> {
    Ok(Client::builder()
        .user_agent(USER_AGENT)
        .timeout(FETCH_TIMEOUT)
        .build()?)
}

/// Fetch stats returned after completion.
pub struct FetchStats {
    pub total: usize,
    pub ok: usize,
    pub errors: usize,
}

/// Fetch pages concurrently, saving each result to DB as it arrives. A
/// failed page becomes an error row and the batch keeps going; retry policy
/// belongs to whoever re-queues, not here.
pub async fn fetch_pages_streaming(
    conn: &Connection,
    pages: Vec<(i64, String, String)>,
) -> Result<FetchStats> {
    let client = client()?;
    let semaphore = Arc::new(Semaphore::new(CONCURRENCY));
    let total = pages.len();

    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")?
            .progress_chars("=> "),
    );

    // Channel: workers send results, main loop saves to DB
    let (tx, mut rx) = tokio::sync::mpsc::channel::<FetchRow>(CONCURRENCY * 2);

    for (page_id, url, name) in pages {
        let client = client.clone();
        let sem = Arc::clone(&semaphore);
        let tx = tx.clone();

        tokio::spawn(async move {
            let _permit = sem.acquire().await.unwrap();
            let row = fetch_one(&client, page_id, &url, &name).await;
            let _ = tx.send(row).await;
        });
    }

    // Drop our copy of tx so rx closes when all spawned tasks finish
    drop(tx);

    let mut ok = 0usize;
    let mut errors = 0usize;

    // Prepare statements once, reuse for each row
    let mut insert_stmt = conn.prepare(
        "INSERT INTO page_data (page_id, url, name, html, status, error, latency_ms)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )?;
    let mut update_stmt =
        conn.prepare("UPDATE pages SET visited = 1, visited_at = datetime('now') WHERE id = ?1")?;

    while let Some(row) = rx.recv().await {
        if row.error.is_some() {
            errors += 1;
        } else {
            ok += 1;
        }
        save_one(&mut insert_stmt, &mut update_stmt, &row)?;
        pb.inc(1);
    }

    pb.finish_and_clear();
    info!("Fetched {} pages ({} ok, {} errors)", total, ok, errors);

    Ok(FetchStats { total, ok, errors })
}

/// Save a single fetch result to DB using pre-prepared statements.
fn save_one(
    insert: &mut rusqlite::Statement,
    update: &mut rusqlite::Statement,
    row: &FetchRow,
) -> Result<()> {
    insert.execute(rusqlite::params![
        row.page_id,
        row.url,
        row.name,
        row.html,
        row.status,
        row.error,
        row.latency_ms,
    ])?;
    update.execute(rusqlite::params![row.page_id])?;
    Ok(())
}

async fn fetch_one(client: &Client, page_id: i64, url: &str, name: &str) -> FetchRow {
    let start = Instant::now();
    let result = fetch_html(client, url).await;
    let latency = start.elapsed().as_millis() as i64;

    match result {
        Ok((status, html)) => FetchRow {
            page_id,
            url: url.to_string(),
            name: name.to_string(),
            html: Some(html),
            status: Some(status),
            error: None,
            latency_ms: Some(latency),
        },
        Err(e) => {
            warn!("Fetch failed for {}: {}", url, e);
            FetchRow {
                page_id,
                url: url.to_string(),
                name: name.to_string(),
                html: None,
                status: None,
                error: Some(e.to_string()),
                latency_ms: Some(latency),
            }
        }
    }
}

pub async fn fetch_html(client: &Client, url: &str) -> Result<(i32, String)> {
    let resp = client.get(url).send().await?;
    let status = resp.status().as_u16() as i32;
    let body = resp.error_for_status()?.text().await?;
    Ok((status, body))
}

/// Records extracted from one page.
#[derive(Debug, Serialize)]
pub struct PageRecords {
    pub hero: Option<HeroRow>,
    pub skills: Vec<SkillRow>,
    pub engravings: Vec<EngravingRow>,
    pub signatures: Vec<SignatureRow>,
    pub furniture: Vec<FurnitureRow>,
}

impl PageRecords {
    fn empty() -> Self {
        PageRecords {
            hero: None,
            skills: Vec::new(),
            engravings: Vec::new(),
            signatures: Vec::new(),
            furniture: Vec::new(),
        }
    }
}

/// Fetch and extract a single detail page. Failure of any kind is logged
/// and yields the null-record sentinel instead of an error, so batch
/// callers just keep going.
pub async fn scrape_page(client: &Client, url: &str) -> PageRecords {
    let html = match fetch_html(client, url).await {
        Ok((_, html)) => html,
        Err(e) => {
            warn!("Fetch failed for {}: {}", url, e);
            return PageRecords::empty();
        }
    };
    match parser::try_process(url, &html) {
        Some(data) => PageRecords {
            hero: Some(data.hero),
            skills: data.skills,
            engravings: data.engravings,
            signatures: data.signatures,
            furniture: data.furniture,
        },
        None => PageRecords::empty(),
    }
}
