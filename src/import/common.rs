use std::path::Path;

use rusqlite::Connection;
use tracing::{error, info};

use crate::db::{is_duplicate_key, quote_ident};
use crate::source::scan_into;

pub const DUMP_EXT: &str = ".dat";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Persistence {
    /// Staging table, dropped when the connection closes.
    Temporary,
    /// Survives the run as migration output.
    Permanent,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ImportStats {
    pub inserted: usize,
    pub duplicates: usize,
}

/// Import `dir/<table>.dat` into a fresh two-column staging table holding a
/// key and one boolean. Only the exact literal `"true"` is truthy; anything
/// else, including absent or empty values, is false.
pub fn import_boolean(
    conn: &Connection,
    dir: &Path,
    table: &str,
    key_name: &str,
) -> anyhow::Result<()> {
    info!("creating table: {} [key: {}]", table, key_name);
    conn.execute(
        &format!(
            "CREATE TEMPORARY TABLE {t} ({k} VARCHAR(30) NOT NULL PRIMARY KEY, {t} BOOLEAN)",
            t = quote_ident(table),
            k = quote_ident(key_name),
        ),
        [],
    )?;

    info!("importing table: {}", table);
    let mut stmt = conn.prepare(&format!(
        "INSERT INTO {t} VALUES (?1, ?2)",
        t = quote_ident(table)
    ))?;
    scan_into(conn, dir, table, DUMP_EXT, |key, value| {
        let flag = i64::from(value == "true");
        stmt.execute((key, flag))?;
        Ok(())
    })?;
    Ok(())
}

/// Import `dir/<table>.dat` into a two-column string table, trimming both
/// sides of each pair. Colliding keys never overwrite the first write; they
/// are logged, counted and skipped.
pub fn import_strings(
    conn: &Connection,
    dir: &Path,
    table: &str,
    key_name: &str,
    persistence: Persistence,
    max_width: usize,
) -> anyhow::Result<ImportStats> {
    info!("creating table: {} [key: {}]", table, key_name);
    let temp = match persistence {
        Persistence::Temporary => "TEMPORARY ",
        Persistence::Permanent => "",
    };
    conn.execute(
        &format!(
            "CREATE {temp}TABLE {t} ({k} VARCHAR(128) PRIMARY KEY, {t} VARCHAR({w}))",
            t = quote_ident(table),
            k = quote_ident(key_name),
            w = max_width,
        ),
        [],
    )?;

    info!("importing table: {}", table);
    let mut stmt = conn.prepare(&format!(
        "INSERT INTO {t} VALUES (?1, ?2)",
        t = quote_ident(table)
    ))?;

    let mut stats = ImportStats::default();
    scan_into(conn, dir, table, DUMP_EXT, |key, value| {
        match stmt.execute((key.trim(), value.trim())) {
            Ok(_) => {
                stats.inserted += 1;
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

    if stats.duplicates > 0 {
        info!("dupecount in '{}': {}", table, stats.duplicates);
    }
    info!("inserted {} into '{}'", stats.inserted, table);
    Ok(stats)
}
