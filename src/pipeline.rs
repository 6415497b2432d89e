use std::fmt;

use anyhow::Context;
use rusqlite::Connection;
use tracing::{info, warn};

use crate::config::Config;
use crate::consolidate;
use crate::db;
use crate::import::common::{import_strings, Persistence};
use crate::import::{diary, events, ideas, members, roles};

/// The driver walks Disconnected -> Resetting -> Importing -> Consolidating
/// -> Disconnected. Failures inside Importing or Consolidating abort the
/// run and leave the database partially populated on purpose; the recovery
/// procedure is to rerun, which starts by resetting again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Resetting,
    Importing,
    Consolidating,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Resetting => write!(f, "resetting"),
            Stage::Importing => write!(f, "importing"),
            Stage::Consolidating => write!(f, "consolidating"),
        }
    }
}

/// Resetting stage: drop and recreate the destination. A failure here means
/// nothing was imported at all.
pub fn connect(config: &Config) -> anyhow::Result<Connection> {
    info!("stage: {}", Stage::Resetting);
    db::reset_db(&config.database_path)
}

/// Importing and Consolidating stages against an already-open destination.
pub fn run(conn: &Connection, config: &Config) -> anyhow::Result<()> {
    let stage = Stage::Importing;
    info!("stage: {}", stage);

    diary::import_diary_tables(conn, &config.diary_path())
        .with_context(|| format!("{} diary tables", stage))?;
    events::import_event_tables(conn, &config.events_path())
        .with_context(|| format!("{} event tables", stage))?;

    if !roles::import_role_tables(conn, &config.event_roles_path(), "roles_merged", "event_id")
        .with_context(|| format!("{} event roles", stage))?
    {
        warn!("no event role tables imported");
    }
    if !roles::import_role_tables(conn, &config.vol_roles_path(), "vol_roles_merged", "member_id")
        .with_context(|| format!("{} volunteer roles", stage))?
    {
        warn!("no volunteer role tables imported");
    }

    members::import_member_table(conn, &config.member_path())
        .with_context(|| format!("{} members", stage))?;
    // Notes associated with members who're volunteers.
    import_strings(
        conn,
        &config.member_path(),
        "notes",
        "member_id",
        Persistence::Permanent,
        1024,
    )
    .with_context(|| format!("{} notes", stage))?;
    ideas::import_ideas(conn, &config.events_path(), 4096)
        .with_context(|| format!("{} ideas", stage))?;

    let stage = Stage::Consolidating;
    info!("stage: {}", stage);
    consolidate::run(conn).with_context(|| stage.to_string())?;

    Ok(())
}
