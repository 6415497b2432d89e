use std::path::Path;

use anyhow::Context;
use rusqlite::Connection;
use tracing::{error, info};

use crate::db::quote_ident;
use crate::source::scan_into;

/// Every non-hidden file in `dir` is one role's source table; the file name
/// becomes the merge table's column name. Sorted for a deterministic schema.
pub fn discover_role_tables(dir: &Path) -> anyhow::Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("reading role directory {}", dir.display()))?
    {
        let entry = entry?;
        if !entry.path().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with('.') {
            continue;
        }
        names.push(name);
    }
    names.sort();
    Ok(names)
}

/// "true" in any case becomes 1; everything else takes its leading integer,
/// defaulting to 0.
pub fn coerce_role_value(value: &str) -> i64 {
    let trimmed = value.trim();
    if trimmed.eq_ignore_ascii_case("true") {
        return 1;
    }
    leading_int(trimmed)
}

fn leading_int(s: &str) -> i64 {
    let (sign, rest) = match s.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, s.strip_prefix('+').unwrap_or(s)),
    };
    let digits: &str = {
        let end = rest
            .char_indices()
            .find(|(_, c)| !c.is_ascii_digit())
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        &rest[..end]
    };
    digits.parse::<i64>().map(|v| sign * v).unwrap_or(0)
}

fn import_role_table(
    conn: &Connection,
    dir: &Path,
    role: &str,
    merge_table: &str,
    merge_key: &str,
) -> anyhow::Result<()> {
    info!("reading role table: {}", role);
    let mut stmt = conn.prepare(&format!(
        "INSERT INTO {t} ({k}, {r}) VALUES (?1, ?2)
         ON CONFLICT({k}) DO UPDATE SET {r} = excluded.{r}",
        t = quote_ident(merge_table),
        k = quote_ident(merge_key),
        r = quote_ident(role),
    ))?;
    // Role source files carry no extension; the file name is the table name.
    scan_into(conn, dir, role, "", |key, value| {
        stmt.execute((key, coerce_role_value(value)))?;
        Ok(())
    })?;
    Ok(())
}

/// Build one wide merge table from a directory of role files.
///
/// Two passes: the directory listing fixes the column set up front, then
/// each file streams upserts into the finished schema. No DDL mid-copy.
///
/// A missing directory is logged and reported as `Ok(false)`; the merge
/// table is still created (key column only) so the rest of the run can
/// proceed against a complete schema.
pub fn import_role_tables(
    conn: &Connection,
    dir: &Path,
    merge_table: &str,
    merge_key: &str,
) -> anyhow::Result<bool> {
    let roles = match discover_role_tables(dir) {
        Ok(roles) => roles,
        Err(e) => {
            error!("role directory {} not found: {:#}", dir.display(), e);
            conn.execute(
                &format!(
                    "CREATE TABLE {t} ({k} VARCHAR(32) NOT NULL PRIMARY KEY)",
                    t = quote_ident(merge_table),
                    k = quote_ident(merge_key),
                ),
                [],
            )?;
            return Ok(false);
        }
    };

    info!(
        "creating table: {} [key: {}, {} role columns]",
        merge_table,
        merge_key,
        roles.len()
    );
    let mut columns = format!(
        "{} VARCHAR(32) NOT NULL PRIMARY KEY",
        quote_ident(merge_key)
    );
    for role in &roles {
        columns.push_str(&format!(", {} INTEGER", quote_ident(role)));
    }
    conn.execute(
        &format!("CREATE TABLE {} ({})", quote_ident(merge_table), columns),
        [],
    )?;

    for role in &roles {
        import_role_table(conn, dir, role, merge_table, merge_key)?;
    }
    Ok(true)
}
