use std::path::Path;

use rusqlite::Connection;
use tracing::{error, info};

use crate::db::is_duplicate_key;
use crate::import::common::{ImportStats, DUMP_EXT};
use crate::source::scan_into;

// Pipe-delimited positional layout of a member record:
// name|email|homepage|address|city|postcode|country|landline|mobile|
// last_updated|refuse_mailshot|status
const MEMBER_FIELD_COUNT: usize = 12;

const PROGRESS_INTERVAL: usize = 500;

/// Validated member key: non-empty and purely numeric after trimming.
pub fn validate_member_key(key: &str) -> Option<&str> {
    let trimmed = key.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(trimmed)
}

/// Split a member value into exactly 12 trimmed fields, padding short
/// records with empty strings rather than failing.
pub fn split_member_fields(value: &str) -> Vec<String> {
    let mut fields: Vec<String> = value
        .split('|')
        .take(MEMBER_FIELD_COUNT)
        .map(|f| f.trim().to_string())
        .collect();
    fields.resize(MEMBER_FIELD_COUNT, String::new());
    fields
}

pub fn import_member_table(conn: &Connection, dir: &Path) -> anyhow::Result<ImportStats> {
    info!("creating table: members");
    conn.execute(
        "CREATE TABLE members (
            member_id VARCHAR(128) NOT NULL PRIMARY KEY,
            name VARCHAR(256),
            email VARCHAR(256),
            homepage VARCHAR(256),
            address VARCHAR(256),
            city VARCHAR(256),
            postcode VARCHAR(256),
            country VARCHAR(256),
            landline VARCHAR(256),
            mobile VARCHAR(256),
            last_updated VARCHAR(256),
            refuse_mailshot VARCHAR(256),
            status VARCHAR(256)
        )",
        [],
    )?;

    info!("importing table: members");
    let mut stmt = conn.prepare(
        "INSERT INTO members VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
    )?;

    let mut stats = ImportStats::default();
    scan_into(conn, dir, "members", DUMP_EXT, |key, value| {
        let Some(member_id) = validate_member_key(key) else {
            error!("member has deeply suspect key: {:?}", key);
            return Ok(());
        };

        let f = split_member_fields(value);
        let result = stmt.execute((
            member_id, &f[0], &f[1], &f[2], &f[3], &f[4], &f[5], &f[6], &f[7], &f[8], &f[9],
            &f[10], &f[11],
        ));
        match result {
            Ok(_) => {
                stats.inserted += 1;
                if stats.inserted % PROGRESS_INTERVAL == 0 {
                    info!("members: {} imported", stats.inserted);
                }
                Ok(())
            }
            Err(e) if is_duplicate_key(&e) => {
                error!(
                    "ignoring duplicate key in table 'members': {}, fields {:?}",
                    member_id, f
                );
                stats.duplicates += 1;
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    })?;

    info!("inserted {} into 'members'", stats.inserted);
    Ok(stats)
}
