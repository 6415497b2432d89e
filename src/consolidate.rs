use anyhow::Context;
use rusqlite::Connection;
use tracing::info;

use crate::db::{quote_ident, table_columns};

/// Diary entries without an event id are antique test entries, not
/// bookings; purge them before any merging happens.
pub fn purge_blank_event_ids(conn: &Connection) -> anyhow::Result<()> {
    for table in ["old_diary", "diary", "event_name"] {
        let deleted = conn.execute(
            &format!("DELETE FROM {} WHERE event_id = ''", quote_ident(table)),
            [],
        )?;
        info!("deleted {} {} entries without event_ids", deleted, table);
    }
    Ok(())
}

/// Create entries in event_name for any events that had their names as
/// their keys, and so never got an event_name record of their own. The
/// NOT-IN clause is needed because some events with names as keys *do*
/// have event_name entries; it also makes the step idempotent.
pub fn create_old_diary_event_names(conn: &Connection) -> anyhow::Result<usize> {
    let created = conn.execute(
        "INSERT INTO event_name (event_id, event_name)
         SELECT DISTINCT old_diary.event_id, old_diary.event_id
         FROM old_diary
         WHERE old_diary.event_id NOT IN (SELECT event_id FROM event_name)
           AND old_diary.event_id <> ''",
        [],
    )?;
    info!("{} event names created", created);
    Ok(created)
}

const DIARY_MERGE_COLUMNS: &str = "
    datetime DATETIME NOT NULL PRIMARY KEY,
    event_id VARCHAR(128),
    booked_by VARCHAR(256),
    confirmed BOOLEAN,
    cancelled BOOLEAN,
    discounted BOOLEAN,
    outside_hire BOOLEAN,
    private_event BOOLEAN";

fn diary_merge_select(source: &str) -> String {
    format!(
        "SELECT
            {s}.datetime_actual,
            {s}.event_id,
            booked_by.name,
            confirmed.confirmed,
            cancelled.cancelled,
            discounted.discounted,
            outside_hire.outside_hire,
            private_event.private_event
         FROM {s}
         LEFT JOIN booked_by ON {s}.datetime = booked_by.datetime
         LEFT JOIN confirmed ON {s}.datetime = confirmed.datetime
         LEFT JOIN cancelled ON {s}.datetime = cancelled.datetime
         LEFT JOIN discounted ON {s}.datetime = discounted.datetime
         LEFT JOIN outside_hire ON {s}.datetime = outside_hire.datetime
         LEFT JOIN private_event ON {s}.datetime = private_event.datetime",
        s = source
    )
}

/// Outer-join the current diary against the name and flag tables, keyed by
/// the parsed timestamp.
pub fn merge_tables_diary(conn: &Connection) -> anyhow::Result<()> {
    info!("merging diary");
    conn.execute(
        &format!("CREATE TABLE diary_merged ({})", DIARY_MERGE_COLUMNS),
        [],
    )?;
    conn.execute(
        &format!("INSERT INTO diary_merged {}", diary_merge_select("diary")),
        [],
    )?;
    Ok(())
}

/// Append the legacy era into the same merged table: a union across the two
/// diary generations, not a join.
pub fn merge_tables_old_diary(conn: &Connection) -> anyhow::Result<()> {
    info!("merging old diary");
    conn.execute(
        &format!(
            "INSERT INTO diary_merged {}",
            diary_merge_select("old_diary")
        ),
        [],
    )?;
    Ok(())
}

/// Outer-join the event attribute tables on event_id into one wide table.
pub fn merge_tables_events(conn: &Connection) -> anyhow::Result<()> {
    info!("merging events");
    conn.execute(
        "CREATE TABLE events_merged (
            event_id VARCHAR(128) NOT NULL PRIMARY KEY,
            event_name VARCHAR(512),
            copy VARCHAR(4096),
            copy_summary VARCHAR(4096),
            duration VARCHAR(256),
            image_credits VARCHAR(256),
            terms VARCHAR(4096)
        )",
        [],
    )?;
    conn.execute(
        "INSERT INTO events_merged
         SELECT
            event_name.event_id,
            event_name.event_name,
            copy.copy,
            copy_summary.copy_summary,
            duration.duration,
            image_credits.image_credits,
            terms.terms
         FROM event_name
         LEFT JOIN copy ON event_name.event_id = copy.event_id
         LEFT JOIN copy_summary ON event_name.event_id = copy_summary.event_id
         LEFT JOIN duration ON event_name.event_id = duration.event_id
         LEFT JOIN image_credits ON event_name.event_id = image_credits.event_id
         LEFT JOIN terms ON event_name.event_id = terms.event_id",
        [],
    )?;
    Ok(())
}

// SQLite has no ADD CONSTRAINT, so installing a foreign key means
// recreating the table with the FK clause and copying the rows across.
fn rebuild_with_fk(
    conn: &Connection,
    table: &str,
    column_defs: &str,
    fk_clause: &str,
    columns: &[String],
) -> anyhow::Result<()> {
    let scratch = format!("{}_fk", table);
    let quoted: Vec<String> = columns.iter().map(|c| quote_ident(c)).collect();
    let column_list = quoted.join(", ");
    conn.execute(
        &format!(
            "CREATE TABLE {} ({}, {})",
            quote_ident(&scratch),
            column_defs,
            fk_clause
        ),
        [],
    )?;
    conn.execute(
        &format!(
            "INSERT INTO {} SELECT {} FROM {}",
            quote_ident(&scratch),
            column_list,
            quote_ident(table)
        ),
        [],
    )
    .with_context(|| format!("installing foreign key on {}", table))?;
    conn.execute(&format!("DROP TABLE {}", quote_ident(table)), [])?;
    conn.execute(
        &format!(
            "ALTER TABLE {} RENAME TO {}",
            quote_ident(&scratch),
            quote_ident(table)
        ),
        [],
    )?;
    Ok(())
}

/// Drop the redundant staging diary, move the merge outputs to their final
/// names, and install the foreign keys. Constraints come last, once all
/// data is in place, so the multi-stage merge never trips over them.
pub fn finalize(conn: &Connection) -> anyhow::Result<()> {
    info!("dropping temporary diary table");
    conn.execute("DROP TABLE diary", [])?;

    info!("renaming diary_merged and events_merged");
    conn.execute("ALTER TABLE events_merged RENAME TO events", [])?;

    info!("adding foreign key constraints to tables");
    conn.execute(
        &format!(
            "CREATE TABLE diary ({},
             FOREIGN KEY(event_id) REFERENCES events(event_id))",
            DIARY_MERGE_COLUMNS
        ),
        [],
    )?;
    conn.execute("INSERT INTO diary SELECT * FROM diary_merged", [])
        .context("installing foreign key on diary")?;
    conn.execute("DROP TABLE diary_merged", [])?;

    rebuild_with_fk(
        conn,
        "notes",
        "member_id VARCHAR(128) PRIMARY KEY, notes VARCHAR(1024)",
        "FOREIGN KEY(member_id) REFERENCES members(member_id)",
        &["member_id".to_string(), "notes".to_string()],
    )?;

    // vol_roles_merged has a dynamic column set; recover it from the schema.
    let vol_columns = table_columns(conn, "vol_roles_merged")?;
    let mut defs = String::from("member_id VARCHAR(32) NOT NULL PRIMARY KEY");
    for role in vol_columns.iter().skip(1) {
        defs.push_str(&format!(", {} INTEGER", quote_ident(role)));
    }
    rebuild_with_fk(
        conn,
        "vol_roles_merged",
        &defs,
        "FOREIGN KEY(member_id) REFERENCES members(member_id)",
        &vol_columns,
    )?;

    Ok(())
}

/// The whole consolidation pass, in its required order.
pub fn run(conn: &Connection) -> anyhow::Result<()> {
    purge_blank_event_ids(conn)?;
    create_old_diary_event_names(conn)?;
    merge_tables_diary(conn)?;
    merge_tables_old_diary(conn)?;
    merge_tables_events(conn)?;
    finalize(conn)?;
    Ok(())
}
