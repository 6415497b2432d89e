use std::path::Path;

use anyhow::Context;
use chrono::NaiveDateTime;
use rusqlite::Connection;
use tracing::{error, info};

use crate::db::is_duplicate_key;
use crate::import::common::{import_boolean, DUMP_EXT};
use crate::source::scan_into;

const DIARY_KEY_FORMAT: &str = "%Y/%m/%d/%H/%M";

/// Era classification of one diary value. The key format in the legacy
/// store changed at some point from using the event's name as the value to
/// using an integer event reference; both generations coexist in diary.dat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiaryValue {
    /// Current era: a bare non-negative integer event reference.
    EventRef(String),
    /// Legacy era: free-text event name standing in for a reference.
    LegacyName(String),
}

/// `^[0-9]+$` after trimming routes to the current era; everything else,
/// including the empty string, is legacy. Exclusive and exhaustive.
pub fn classify_value(value: &str) -> DiaryValue {
    let trimmed = value.trim();
    if !trimmed.is_empty() && trimmed.bytes().all(|b| b.is_ascii_digit()) {
        DiaryValue::EventRef(trimmed.to_string())
    } else {
        DiaryValue::LegacyName(trimmed.to_string())
    }
}

/// Parse a slash-separated diary key into its timestamp. Diary keys are
/// assumed well-formed; a parse failure fails the whole run.
pub fn parse_diary_key(key: &str) -> anyhow::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(key, DIARY_KEY_FORMAT)
        .with_context(|| format!("unparseable diary key {:?}", key))
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DiaryStats {
    pub current: usize,
    pub legacy: usize,
    pub duplicates: usize,
}

/// Import diary.dat, routing each record to `diary` or `old_diary` by era.
pub fn import_diary(conn: &Connection, dir: &Path) -> anyhow::Result<DiaryStats> {
    info!("creating tables: diary, old_diary");
    conn.execute(
        "CREATE TEMPORARY TABLE diary (
            datetime VARCHAR(30) NOT NULL PRIMARY KEY,
            datetime_actual DATETIME,
            event_id VARCHAR(128)
        )",
        [],
    )?;
    // Crufty old entries from diary.dat where the value is the name of the
    // event rather than a numeric reference.
    conn.execute(
        "CREATE TEMPORARY TABLE old_diary (
            datetime VARCHAR(30) NOT NULL PRIMARY KEY,
            datetime_actual DATETIME,
            event_id VARCHAR(256)
        )",
        [],
    )?;

    info!("importing table: diary");
    let mut insert_current =
        conn.prepare("INSERT INTO diary VALUES (?1, ?2, ?3)")?;
    let mut insert_legacy =
        conn.prepare("INSERT INTO old_diary VALUES (?1, ?2, ?3)")?;

    let mut stats = DiaryStats::default();
    scan_into(conn, dir, "diary", DUMP_EXT, |key, value| {
        let actual = parse_diary_key(key)?;
        let actual = actual.format("%Y-%m-%d %H:%M:%S").to_string();

        let (table, result) = match classify_value(value) {
            DiaryValue::EventRef(event_id) => {
                ("diary", insert_current.execute((key, &actual, event_id)))
            }
            DiaryValue::LegacyName(name) => {
                ("old_diary", insert_legacy.execute((key, &actual, name)))
            }
        };
        match result {
            Ok(_) => {
                if table == "diary" {
                    stats.current += 1;
                } else {
                    stats.legacy += 1;
                }
                Ok(())
            }
            Err(e) if is_duplicate_key(&e) => {
                error!("ignoring duplicate key in table \"{}\": {}", table, key);
                stats.duplicates += 1;
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    })?;

    info!(
        "diary import: {} current, {} legacy, {} duplicates",
        stats.current, stats.legacy, stats.duplicates
    );
    Ok(stats)
}

/// booked_by keeps its own value column name (`name`), so it doesn't fit
/// the generic string importer.
pub fn import_booked_by(conn: &Connection, dir: &Path) -> anyhow::Result<()> {
    info!("creating table: booked_by");
    conn.execute(
        "CREATE TEMPORARY TABLE booked_by (
            datetime VARCHAR(30) NOT NULL PRIMARY KEY,
            name VARCHAR(256)
        )",
        [],
    )?;
    info!("importing table: booked_by");
    let mut stmt = conn.prepare("INSERT INTO booked_by VALUES (?1, ?2)")?;
    scan_into(conn, dir, "booked_by", DUMP_EXT, |key, value| {
        stmt.execute((key, value))?;
        Ok(())
    })?;
    Ok(())
}

/// All diary-keyed staging tables: the two-era diary split, booked_by, and
/// the five boolean flag tables.
pub fn import_diary_tables(conn: &Connection, dir: &Path) -> anyhow::Result<DiaryStats> {
    let stats = import_diary(conn, dir)?;
    import_booked_by(conn, dir)?;
    import_boolean(conn, dir, "cancelled", "datetime")?;
    import_boolean(conn, dir, "confirmed", "datetime")?;
    import_boolean(conn, dir, "discounted", "datetime")?;
    import_boolean(conn, dir, "outside_hire", "datetime")?;
    import_boolean(conn, dir, "private_event", "datetime")?;
    Ok(stats)
}
