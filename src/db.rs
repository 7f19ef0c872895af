use anyhow::Result;
use rusqlite::Connection;
use serde::Serialize;

const DB_PATH: &str = "data/heroes.sqlite";

pub fn connect() -> Result<Connection> {
    let conn = Connection::open(DB_PATH)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS pages (
            id         INTEGER PRIMARY KEY,
            url        TEXT UNIQUE NOT NULL,
            name       TEXT NOT NULL,
            visited    BOOLEAN NOT NULL DEFAULT 0,
            visited_at TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_pages_visited ON pages(visited);

        CREATE TABLE IF NOT EXISTS page_data (
            id         INTEGER PRIMARY KEY,
            page_id    INTEGER NOT NULL REFERENCES pages(id),
            url        TEXT NOT NULL,
            name       TEXT NOT NULL,
            html       TEXT,
            status     INTEGER,
            error      TEXT,
            latency_ms INTEGER,
            fetched_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_page_data_url ON page_data(url);

        -- Raw infobox snapshot per processed page; kept for diagnosing
        -- template drift without refetching.
        CREATE TABLE IF NOT EXISTS hero_infobox (
            id           INTEGER PRIMARY KEY,
            page_data_id INTEGER NOT NULL REFERENCES page_data(id),
            url          TEXT NOT NULL,
            name         TEXT NOT NULL,
            fields       TEXT NOT NULL,
            processed_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE UNIQUE INDEX IF NOT EXISTS idx_infobox_url ON hero_infobox(url);

        -- Extracted records. Downstream export owns ID assignment and
        -- cross-run identity; these tables just mirror the record shape.
        CREATE TABLE IF NOT EXISTS heroes (
            url            TEXT PRIMARY KEY,
            icon           TEXT NOT NULL DEFAULT '',
            name           TEXT NOT NULL,
            faction        TEXT NOT NULL DEFAULT '',
            type           TEXT NOT NULL DEFAULT '',
            class          TEXT NOT NULL DEFAULT '',
            rarity         TEXT NOT NULL DEFAULT '',
            role           TEXT NOT NULL DEFAULT '',
            primary_role   TEXT NOT NULL DEFAULT '',
            secondary_role TEXT NOT NULL DEFAULT '',
            overall_en     TEXT NOT NULL DEFAULT '',
            overall_vn     TEXT NOT NULL DEFAULT '',
            personality_en TEXT NOT NULL DEFAULT '',
            personality_vn TEXT NOT NULL DEFAULT '',
            background_en  TEXT NOT NULL DEFAULT '',
            background_vn  TEXT NOT NULL DEFAULT '',
            quotes_en      TEXT NOT NULL DEFAULT '',
            quotes_vn      TEXT NOT NULL DEFAULT '',
            trivia_en      TEXT NOT NULL DEFAULT '',
            trivia_vn      TEXT NOT NULL DEFAULT '',
            created_at     TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS skills (
            id             INTEGER PRIMARY KEY,
            hero           TEXT NOT NULL,
            unlock_level   TEXT NOT NULL DEFAULT '',
            name           TEXT NOT NULL DEFAULT '',
            type           TEXT NOT NULL DEFAULT '',
            description_en TEXT NOT NULL DEFAULT '',
            description_vn TEXT NOT NULL DEFAULT '',
            icon           TEXT NOT NULL DEFAULT ''
        );
        CREATE INDEX IF NOT EXISTS idx_skills_hero ON skills(hero);

        CREATE TABLE IF NOT EXISTS engravings (
            id             INTEGER PRIMARY KEY,
            hero           TEXT NOT NULL,
            name           TEXT NOT NULL DEFAULT '',
            unlock_level   TEXT NOT NULL DEFAULT '',
            description_en TEXT NOT NULL DEFAULT '',
            description_vn TEXT NOT NULL DEFAULT '',
            icon           TEXT NOT NULL DEFAULT ''
        );
        CREATE INDEX IF NOT EXISTS idx_engravings_hero ON engravings(hero);

        CREATE TABLE IF NOT EXISTS signature_items (
            id             INTEGER PRIMARY KEY,
            hero           TEXT NOT NULL,
            description_en TEXT NOT NULL DEFAULT '',
            description_vn TEXT NOT NULL DEFAULT ''
        );
        CREATE INDEX IF NOT EXISTS idx_signature_hero ON signature_items(hero);

        CREATE TABLE IF NOT EXISTS furniture (
            id             INTEGER PRIMARY KEY,
            hero           TEXT NOT NULL,
            name           TEXT NOT NULL DEFAULT '',
            description_en TEXT NOT NULL DEFAULT '',
            description_vn TEXT NOT NULL DEFAULT '',
            icon           TEXT NOT NULL DEFAULT ''
        );
        CREATE INDEX IF NOT EXISTS idx_furniture_hero ON furniture(hero);
        ",
    )?;
    Ok(())
}

// ── Queue ──

pub fn insert_pages(conn: &Connection, pages: &[(String, String)]) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;
    let mut count = 0;
    {
        let mut stmt = tx.prepare("INSERT OR IGNORE INTO pages (url, name) VALUES (?1, ?2)")?;
        for (url, name) in pages {
            count += stmt.execute(rusqlite::params![url, name])?;
        }
    }
    tx.commit()?;
    Ok(count)
}

pub fn fetch_unvisited(
    conn: &Connection,
    limit: Option<usize>,
) -> Result<Vec<(i64, String, String)>> {
    let sql = match limit {
        Some(n) => format!(
            "SELECT id, url, name FROM pages WHERE visited = 0 ORDER BY id LIMIT {}",
            n
        ),
        None => "SELECT id, url, name FROM pages WHERE visited = 0 ORDER BY id".to_string(),
    };
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub struct FetchRow {
    pub page_id: i64,
    pub url: String,
    pub name: String,
    pub html: Option<String>,
    pub status: Option<i32>,
    pub error: Option<String>,
    pub latency_ms: Option<i64>,
}

// ── Processing ──

pub struct StoredPage {
    pub page_data_id: i64,
    pub url: String,
    pub name: String,
    pub html: String,
}

pub fn fetch_unprocessed(conn: &Connection, limit: Option<usize>) -> Result<Vec<StoredPage>> {
    let sql = format!(
        "SELECT pd.id, pd.url, pd.name, pd.html
         FROM page_data pd
         LEFT JOIN heroes h ON h.url = pd.url
         WHERE pd.html IS NOT NULL AND h.url IS NULL
         ORDER BY pd.id{}",
        match limit {
            Some(n) => format!(" LIMIT {}", n),
            None => String::new(),
        }
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], |row| {
            Ok(StoredPage {
                page_data_id: row.get(0)?,
                url: row.get(1)?,
                name: row.get(2)?,
                html: row.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub struct InfoboxRow {
    pub page_data_id: i64,
    pub url: String,
    pub name: String,
    pub fields: String,
}

pub fn save_infoboxes(conn: &Connection, rows: &[InfoboxRow]) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    {
        let mut stmt = tx.prepare(
            "INSERT OR REPLACE INTO hero_infobox (page_data_id, url, name, fields)
             VALUES (?1, ?2, ?3, ?4)",
        )?;
        for r in rows {
            stmt.execute(rusqlite::params![r.page_data_id, r.url, r.name, r.fields])?;
        }
    }
    tx.commit()?;
    Ok(())
}

// ── Extracted records ──

#[derive(Debug, Default, Clone, Serialize)]
pub struct HeroRow {
    pub icon: String,
    pub name: String,
    pub faction: String,
    #[serde(rename = "type")]
    pub hero_type: String,
    pub class: String,
    pub rarity: String,
    pub role: String,
    pub primary_role: String,
    pub secondary_role: String,
    pub overall_en: String,
    pub overall_vn: String,
    pub personality_en: String,
    pub personality_vn: String,
    pub background_en: String,
    pub background_vn: String,
    pub quotes_en: String,
    pub quotes_vn: String,
    pub trivia_en: String,
    pub trivia_vn: String,
    pub url: String,
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct SkillRow {
    pub hero: String,
    pub unlock_level: String,
    pub name: String,
    #[serde(rename = "type")]
    pub skill_type: String,
    pub description_en: String,
    pub description_vn: String,
    pub icon: String,
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct EngravingRow {
    pub hero: String,
    pub name: String,
    pub unlock_level: String,
    pub description_en: String,
    pub description_vn: String,
    pub icon: String,
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct SignatureRow {
    pub hero: String,
    pub description_en: String,
    pub description_vn: String,
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct FurnitureRow {
    pub hero: String,
    pub name: String,
    pub description_en: String,
    pub description_vn: String,
    pub icon: String,
}

pub fn save_extracted(
    conn: &Connection,
    heroes: &[HeroRow],
    skills: &[SkillRow],
    engravings: &[EngravingRow],
    signatures: &[SignatureRow],
    furniture: &[FurnitureRow],
) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    {
        let mut h_stmt = tx.prepare(
            "INSERT OR REPLACE INTO heroes
             (url, icon, name, faction, type, class, rarity, role,
              primary_role, secondary_role,
              overall_en, overall_vn, personality_en, personality_vn,
              background_en, background_vn, quotes_en, quotes_vn,
              trivia_en, trivia_vn)
             VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15,?16,?17,?18,?19,?20)",
        )?;
        for h in heroes {
            h_stmt.execute(rusqlite::params![
                h.url,
                h.icon,
                h.name,
                h.faction,
                h.hero_type,
                h.class,
                h.rarity,
                h.role,
                h.primary_role,
                h.secondary_role,
                h.overall_en,
                h.overall_vn,
                h.personality_en,
                h.personality_vn,
                h.background_en,
                h.background_vn,
                h.quotes_en,
                h.quotes_vn,
                h.trivia_en,
                h.trivia_vn,
            ])?;
        }

        let mut s_stmt = tx.prepare(
            "INSERT INTO skills
             (hero, unlock_level, name, type, description_en, description_vn, icon)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )?;
        for s in skills {
            s_stmt.execute(rusqlite::params![
                s.hero,
                s.unlock_level,
                s.name,
                s.skill_type,
                s.description_en,
                s.description_vn,
                s.icon,
            ])?;
        }

        let mut e_stmt = tx.prepare(
            "INSERT INTO engravings
             (hero, name, unlock_level, description_en, description_vn, icon)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?;
        for e in engravings {
            e_stmt.execute(rusqlite::params![
                e.hero,
                e.name,
                e.unlock_level,
                e.description_en,
                e.description_vn,
                e.icon,
            ])?;
        }

        let mut g_stmt = tx.prepare(
            "INSERT INTO signature_items (hero, description_en, description_vn)
             VALUES (?1, ?2, ?3)",
        )?;
        for g in signatures {
            g_stmt.execute(rusqlite::params![g.hero, g.description_en, g.description_vn])?;
        }

        let mut f_stmt = tx.prepare(
            "INSERT INTO furniture (hero, name, description_en, description_vn, icon)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;
        for f in furniture {
            f_stmt.execute(rusqlite::params![
                f.hero,
                f.name,
                f.description_en,
                f.description_vn,
                f.icon,
            ])?;
        }
    }
    tx.commit()?;
    Ok(())
}

// ── Overview ──

pub struct OverviewRow {
    pub name: String,
    pub faction: String,
    pub class: String,
    pub rarity: String,
    pub primary_role: String,
    pub secondary_role: String,
    pub skill_count: i32,
}

pub fn fetch_overview(
    conn: &Connection,
    faction: Option<&str>,
    rarity: Option<&str>,
    limit: usize,
) -> Result<Vec<OverviewRow>> {
    let mut conditions = Vec::new();
    let mut params: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

    if let Some(f) = faction {
        conditions.push(format!("faction = ?{}", params.len() + 1));
        params.push(Box::new(f.to_string()));
    }
    if let Some(r) = rarity {
        conditions.push(format!("rarity = ?{}", params.len() + 1));
        params.push(Box::new(r.to_string()));
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    };

    let sql = format!(
        "SELECT name, faction, class, rarity, primary_role, secondary_role,
                (SELECT COUNT(*) FROM skills s WHERE s.hero = heroes.name)
         FROM heroes{}
         ORDER BY faction, name
         LIMIT {}",
        where_clause, limit
    );

    let mut stmt = conn.prepare(&sql)?;
    let param_refs: Vec<&dyn rusqlite::types::ToSql> = params.iter().map(|p| p.as_ref()).collect();
    let rows = stmt
        .query_map(param_refs.as_slice(), |row| {
            Ok(OverviewRow {
                name: row.get(0)?,
                faction: row.get(1)?,
                class: row.get(2)?,
                rarity: row.get(3)?,
                primary_role: row.get(4)?,
                secondary_role: row.get(5)?,
                skill_count: row.get(6)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ── Stats ──

pub struct Stats {
    pub total: usize,
    pub visited: usize,
    pub unvisited: usize,
    pub fetched: usize,
    pub errors: usize,
    pub processed: usize,
}

pub fn get_stats(conn: &Connection) -> Result<Stats> {
    let total: usize = conn.query_row("SELECT COUNT(*) FROM pages", [], |r| r.get(0))?;
    let visited: usize =
        conn.query_row("SELECT COUNT(*) FROM pages WHERE visited = 1", [], |r| r.get(0))?;
    let fetched: usize = conn.query_row("SELECT COUNT(*) FROM page_data", [], |r| r.get(0))?;
    let errors: usize = conn.query_row(
        "SELECT COUNT(*) FROM page_data WHERE error IS NOT NULL",
        [],
        |r| r.get(0),
    )?;
    let processed: usize = conn.query_row("SELECT COUNT(*) FROM heroes", [], |r| r.get(0))?;
    Ok(Stats {
        total,
        visited,
        unvisited: total - visited,
        fetched,
        errors,
        processed,
    })
}
