mod db;
mod discover;
mod fetch;
mod parser;

use std::time::Instant;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "hero_scraper", about = "Hero wiki scraper and record extractor")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan overview pages and populate the URL queue
    Init {
        /// Overview page URLs (faction/index pages with a Heroes section)
        #[arg(required = true)]
        urls: Vec<String>,
    },
    /// Fetch unvisited hero pages
    Scrape {
        /// Max pages to fetch (default: all unvisited)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Extract records from fetched pages
    Process {
        /// Max pages to process (default: all unprocessed)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Scrape + process in one pipeline
    Run {
        /// Max pages to scrape+process
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Fetch and extract a single page, printing the result
    Probe {
        url: String,
        /// Print the full records as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show scraping statistics
    Stats,
    /// Heroes overview table
    Overview {
        /// Filter by faction
        #[arg(short, long)]
        faction: Option<String>,
        /// Filter by rarity
        #[arg(short, long)]
        rarity: Option<String>,
        /// Max rows to display
        #[arg(short = 'n', long, default_value = "50")]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init { urls } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let client = fetch::client()?;
            let links = discover::collect_hero_links(&client, &urls).await?;
            let pairs: Vec<(String, String)> = links
                .into_iter()
                .map(|l| (l.url, l.name))
                .collect();
            let inserted = db::insert_pages(&conn, &pairs)?;
            println!(
                "Inserted {} new hero URLs ({} total found)",
                inserted,
                pairs.len()
            );
            Ok(())
        }
        Commands::Scrape { limit } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let pages = db::fetch_unvisited(&conn, limit)?;
            if pages.is_empty() {
                println!("No unvisited pages. Run 'init' first or all pages are fetched.");
                return Ok(());
            }
            println!("Fetching {} pages (streaming to DB)...", pages.len());
            let stats = fetch::fetch_pages_streaming(&conn, pages).await?;
            println!(
                "Done: {} fetched ({} ok, {} errors).",
                stats.total, stats.ok, stats.errors
            );
            Ok(())
        }
        Commands::Process { limit } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let pages = db::fetch_unprocessed(&conn, limit)?;
            if pages.is_empty() {
                println!("No unprocessed pages. Run 'scrape' first.");
                return Ok(());
            }
            println!("Processing {} pages...", pages.len());
            let counts = process_pages(&conn, &pages)?;
            counts.print();
            Ok(())
        }
        Commands::Run { limit } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let pages = db::fetch_unvisited(&conn, limit)?;
            if pages.is_empty() {
                println!("No unvisited pages. Run 'init' first.");
                return Ok(());
            }

            // Phase 1: fetch (streaming to DB)
            let t_fetch = Instant::now();
            println!("Pipeline: fetching {} pages (streaming to DB)...", pages.len());
            let stats = fetch::fetch_pages_streaming(&conn, pages).await?;
            println!(
                "Fetched {} pages ({} ok, {} errors) in {:.1}s",
                stats.total,
                stats.ok,
                stats.errors,
                t_fetch.elapsed().as_secs_f64()
            );

            // Phase 2: process
            let t_process = Instant::now();
            let unprocessed = db::fetch_unprocessed(&conn, None)?;
            if unprocessed.is_empty() {
                println!("Nothing to process (all fetched pages had errors).");
                return Ok(());
            }
            println!("Processing {} pages...", unprocessed.len());
            let counts = process_pages(&conn, &unprocessed)?;
            println!("Processed in {:.1}s", t_process.elapsed().as_secs_f64());
            counts.print();
            Ok(())
        }
        Commands::Probe { url, json } => {
            let client = fetch::client()?;
            let records = fetch::scrape_page(&client, &url).await;
            if json {
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else {
                match &records.hero {
                    Some(h) => {
                        println!("Name:       {}", h.name);
                        println!("Faction:    {}", h.faction);
                        println!("Class:      {}", h.class);
                        println!("Rarity:     {}", h.rarity);
                        println!("Roles:      {} / {}", h.primary_role, h.secondary_role);
                        println!("Skills:     {}", records.skills.len());
                        println!("Engravings: {}", records.engravings.len());
                        println!("Signature:  {}", records.signatures.len());
                        println!("Furniture:  {}", records.furniture.len());
                    }
                    None => println!("No record extracted from {}", url),
                }
            }
            Ok(())
        }
        Commands::Overview { faction, rarity, limit } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let rows = db::fetch_overview(&conn, faction.as_deref(), rarity.as_deref(), limit)?;
            if rows.is_empty() {
                println!("No heroes found.");
                return Ok(());
            }

            println!(
                "{:>3} | {:<20} | {:<14} | {:<10} | {:<10} | {:<20} | {:>6}",
                "#", "Hero", "Faction", "Class", "Rarity", "Role", "Skills"
            );
            println!("{}", "-".repeat(100));

            for (i, r) in rows.iter().enumerate() {
                let role = if r.secondary_role.is_empty() {
                    r.primary_role.clone()
                } else {
                    format!("{}/{}", r.primary_role, r.secondary_role)
                };
                println!(
                    "{:>3} | {:<20} | {:<14} | {:<10} | {:<10} | {:<20} | {:>6}",
                    i + 1,
                    truncate(&r.name, 20),
                    truncate(&r.faction, 14),
                    truncate(&r.class, 10),
                    truncate(&r.rarity, 10),
                    truncate(&role, 20),
                    r.skill_count
                );
            }

            println!("\n{} heroes", rows.len());
            Ok(())
        }
        Commands::Stats => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let s = db::get_stats(&conn)?;
            println!("Total:     {}", s.total);
            println!("Visited:   {}", s.visited);
            println!("Unvisited: {}", s.unvisited);
            println!("Fetched:   {}", s.fetched);
            println!("Errors:    {}", s.errors);
            println!("Processed: {}", s.processed);
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

struct ProcessCounts {
    heroes: usize,
    skills: usize,
    engravings: usize,
    signatures: usize,
    furniture: usize,
    failed: usize,
}

impl ProcessCounts {
    fn print(&self) {
        println!(
            "Saved {} heroes, {} skills, {} engravings, {} signature items, {} furniture sets.",
            self.heroes, self.skills, self.engravings, self.signatures, self.furniture,
        );
        if self.failed > 0 {
            println!("{} pages failed extraction and were skipped.", self.failed);
        }
    }
}

fn process_pages(
    conn: &rusqlite::Connection,
    pages: &[db::StoredPage],
) -> anyhow::Result<ProcessCounts> {
    use indicatif::{ProgressBar, ProgressStyle};
    use rayon::prelude::*;

    let pb = ProgressBar::new(pages.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")?
            .progress_chars("#>-"),
    );

    let mut counts = ProcessCounts {
        heroes: 0,
        skills: 0,
        engravings: 0,
        signatures: 0,
        furniture: 0,
        failed: 0,
    };

    for chunk in pages.chunks(500) {
        let results: Vec<_> = chunk
            .par_iter()
            .map(|p| (p, parser::try_process(&p.url, &p.html)))
            .collect();

        let mut heroes = Vec::new();
        let mut infoboxes = Vec::new();
        let mut skills = Vec::new();
        let mut engravings = Vec::new();
        let mut signatures = Vec::new();
        let mut furniture = Vec::new();

        for (page, data) in results {
            let Some(data) = data else {
                counts.failed += 1;
                continue;
            };
            infoboxes.push(db::InfoboxRow {
                page_data_id: page.page_data_id,
                url: page.url.clone(),
                name: data.hero.name.clone(),
                fields: data.infobox.to_json(),
            });
            counts.skills += data.skills.len();
            counts.engravings += data.engravings.len();
            counts.signatures += data.signatures.len();
            counts.furniture += data.furniture.len();
            heroes.push(data.hero);
            skills.extend(data.skills);
            engravings.extend(data.engravings);
            signatures.extend(data.signatures);
            furniture.extend(data.furniture);
        }

        counts.heroes += heroes.len();
        db::save_infoboxes(conn, &infoboxes)?;
        db::save_extracted(conn, &heroes, &skills, &engravings, &signatures, &furniture)?;
        pb.inc(chunk.len() as u64);
    }

    pb.finish_and_clear();
    Ok(counts)
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
