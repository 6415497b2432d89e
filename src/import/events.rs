use std::path::Path;

use rusqlite::Connection;

use crate::import::common::{import_strings, Persistence};

/// The six independently-keyed event attribute tables, all staged as
/// temporary string tables keyed by event_id.
pub fn import_event_tables(conn: &Connection, dir: &Path) -> anyhow::Result<()> {
    import_strings(conn, dir, "copy", "event_id", Persistence::Temporary, 4096)?;
    import_strings(conn, dir, "copy_summary", "event_id", Persistence::Temporary, 4096)?;
    import_strings(conn, dir, "event_name", "event_id", Persistence::Temporary, 512)?;
    import_strings(conn, dir, "image_credits", "event_id", Persistence::Temporary, 256)?;
    import_strings(conn, dir, "duration", "event_id", Persistence::Temporary, 256)?;
    import_strings(conn, dir, "terms", "event_id", Persistence::Temporary, 4096)?;
    Ok(())
}
