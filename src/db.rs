use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ValueRef};
use rusqlite::Connection;

use crate::meeting::{Classification, Meeting};

const DB_PATH: &str = "data/ifa.sqlite";

pub fn connect() -> Result<Connection> {
    let path = std::env::var("IFA_DB_PATH").unwrap_or_else(|_| DB_PATH.to_string());
    if let Some(dir) = std::path::Path::new(&path).parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }
    }
    let conn = Connection::open(&path).with_context(|| format!("Failed to open {}", path))?;
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS meetings (
            id             INTEGER PRIMARY KEY,
            title          TEXT NOT NULL,
            description    TEXT NOT NULL DEFAULT '',
            classification TEXT NOT NULL,
            start_time     TEXT NOT NULL,
            end_time       TEXT,
            all_day        BOOLEAN NOT NULL DEFAULT 0,
            time_notes     TEXT NOT NULL DEFAULT '',
            location_name  TEXT NOT NULL,
            location_addr  TEXT NOT NULL,
            links          TEXT NOT NULL,
            source         TEXT NOT NULL,
            scraped_at     TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(source, start_time)
        );
        CREATE INDEX IF NOT EXISTS idx_meetings_start ON meetings(start_time);
        ",
    )?;
    Ok(())
}

/// Insert meetings, ignoring ones already stored for the same source and start.
pub fn save_meetings(conn: &Connection, meetings: &[Meeting]) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;
    let mut count = 0;
    {
        let mut stmt = tx.prepare(
            "INSERT OR IGNORE INTO meetings
             (title, description, classification, start_time, end_time, all_day, time_notes,
              location_name, location_addr, links, source)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        )?;
        for m in meetings {
            count += stmt.execute(rusqlite::params![
                m.title,
                m.description,
                m.classification.as_str(),
                m.start,
                m.end,
                m.all_day,
                m.time_notes,
                m.location.name,
                m.location.address,
                serde_json::to_string(&m.links)?,
                m.source,
            ])?;
        }
    }
    tx.commit()?;
    Ok(count)
}

impl FromSql for Classification {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

pub struct MeetingRow {
    pub title: String,
    pub classification: Classification,
    pub start: NaiveDateTime,
    pub location_name: String,
    pub source: String,
}

pub fn fetch_meetings(conn: &Connection, limit: usize) -> Result<Vec<MeetingRow>> {
    let mut stmt = conn.prepare(
        "SELECT title, classification, start_time, location_name, source
         FROM meetings
         ORDER BY start_time
         LIMIT ?1",
    )?;
    let rows = stmt
        .query_map([limit as i64], |row| {
            Ok(MeetingRow {
                title: row.get(0)?,
                classification: row.get(1)?,
                start: row.get(2)?,
                location_name: row.get(3)?,
                source: row.get(4)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ── Stats ──

pub struct Stats {
    pub total: usize,
    pub sources: usize,
    pub upcoming: usize,
    pub first: Option<String>,
    pub last: Option<String>,
}

pub fn get_stats(conn: &Connection) -> Result<Stats> {
    let total: usize = conn.query_row("SELECT COUNT(*) FROM meetings", [], |r| r.get(0))?;
    let sources: usize =
        conn.query_row("SELECT COUNT(DISTINCT source) FROM meetings", [], |r| r.get(0))?;
    let upcoming: usize = conn.query_row(
        "SELECT COUNT(*) FROM meetings WHERE start_time >= datetime('now', 'localtime')",
        [],
        |r| r.get(0),
    )?;
    let (first, last): (Option<String>, Option<String>) =
        conn.query_row("SELECT MIN(start_time), MAX(start_time) FROM meetings", [], |r| {
            Ok((r.get(0)?, r.get(1)?))
        })?;
    Ok(Stats {
        total,
        sources,
        upcoming,
        first,
        last,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AgencyConfig;
    use crate::parser::schedule::build_records;

    fn memory_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    #[test]
    fn duplicates_are_ignored() {
        let conn = memory_db();
        let meetings = build_records(
            &AgencyConfig::default(),
            "March 14, 2024 and April 11, 2024 at 9:30 AM",
            "https://x/schedule.pdf",
        );
        assert_eq!(save_meetings(&conn, &meetings).unwrap(), 2);
        assert_eq!(save_meetings(&conn, &meetings).unwrap(), 0);

        let rows = fetch_meetings(&conn, 10).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].start, meetings[0].start);
        assert_eq!(rows[0].classification, Classification::Board);
        assert_eq!(rows[1].title, "Board Meeting");
    }

    #[test]
    fn unknown_classification_is_a_read_error() {
        let conn = memory_db();
        conn.execute(
            "INSERT INTO meetings
             (title, classification, start_time, location_name, location_addr, links, source)
             VALUES ('Board Meeting', 'Gala', '2024-03-14 09:30:00', 'n', 'a', '[]', 's')",
            [],
        )
        .unwrap();
        assert!(fetch_meetings(&conn, 10).is_err());
    }

    #[test]
    fn stats_on_empty_db() {
        let conn = memory_db();
        let s = get_stats(&conn).unwrap();
        assert_eq!(s.total, 0);
        assert_eq!(s.sources, 0);
        assert!(s.first.is_none());
    }
}
