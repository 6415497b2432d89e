use std::path::Path;

use anyhow::Context;
use rusqlite::Connection;
use tracing::info;

// SQLite extended result codes for primary-key / unique collisions.
const SQLITE_CONSTRAINT_PRIMARYKEY: i32 = 1555;
const SQLITE_CONSTRAINT_UNIQUE: i32 = 2067;

pub fn open_db(path: &Path) -> anyhow::Result<Connection> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let conn = Connection::open(path)
        .with_context(|| format!("opening database {}", path.display()))?;
    conn.execute_batch("PRAGMA foreign_keys = ON")?;
    Ok(conn)
}

/// Drop-and-recreate reset: the pipeline is idempotent only at whole-run
/// granularity, so a run always starts from an empty database.
pub fn reset_db(path: &Path) -> anyhow::Result<Connection> {
    if path.exists() {
        info!("dropping database {}", path.display());
        std::fs::remove_file(path)
            .with_context(|| format!("removing database {}", path.display()))?;
    }
    info!("creating database {}", path.display());
    open_db(path)
}

/// True for the duplicate-key failures the importers absorb; every other
/// database error stays fatal.
pub fn is_duplicate_key(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(e, _) => {
            e.extended_code == SQLITE_CONSTRAINT_PRIMARYKEY
                || e.extended_code == SQLITE_CONSTRAINT_UNIQUE
        }
        _ => false,
    }
}

/// Column names of `table` in declaration order, via PRAGMA table_info.
/// Needed where the column set is only known at runtime (role merge tables).
pub fn table_columns(conn: &Connection, table: &str) -> anyhow::Result<Vec<String>> {
    let sql = format!("PRAGMA table_info({})", quote_ident(table));
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([])?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        out.push(row.get::<_, String>(1)?);
    }
    Ok(out)
}

/// Double-quote an identifier that originates outside the program (role
/// column names come from directory listings).
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
