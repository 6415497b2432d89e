use std::path::Path;

use chrono::NaiveDate;
use rusqlite::Connection;
use tracing::{error, info};

use crate::db::is_duplicate_key;
use crate::import::common::{ImportStats, DUMP_EXT};
use crate::source::scan_into;

// Exact-match month table; lookups are case-sensitive on purpose, so a key
// that isn't "<MonthName>-<Year>" simply isn't an idea record.
const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Translate an `"<MonthName>-<Year>"` key into a first-of-month date.
/// Returns `None` for anything that doesn't match the expected shape.
pub fn parse_ideas_key(key: &str) -> Option<NaiveDate> {
    let (month_name, year) = key.split_once('-')?;
    let month = MONTH_NAMES.iter().position(|m| *m == month_name)? as u32 + 1;
    let year: i32 = year.trim().parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, 1)
}

pub fn import_ideas(
    conn: &Connection,
    dir: &Path,
    max_width: usize,
) -> anyhow::Result<ImportStats> {
    info!("creating table: ideas");
    conn.execute(
        &format!(
            "CREATE TABLE ideas (date DATETIME PRIMARY KEY, ideas VARCHAR({}))",
            max_width
        ),
        [],
    )?;

    info!("importing table: ideas");
    let mut stmt = conn.prepare("INSERT INTO ideas VALUES (?1, ?2)")?;

    let mut stats = ImportStats::default();
    scan_into(conn, dir, "ideas", DUMP_EXT, |key, value| {
        // Unrecognized month names mean "not an idea record", not an error.
        let Some(date) = parse_ideas_key(key) else {
            return Ok(());
        };
        let date = date.format("%Y-%m-%d").to_string();
        match stmt.execute((&date, value.trim())) {
            Ok(_) => {
                stats.inserted += 1;
                Ok(())
            }
            Err(e) if is_duplicate_key(&e) => {
                error!("ignoring duplicate key in table \"ideas\": {}", key);
                stats.duplicates += 1;
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    })?;

    if stats.duplicates > 0 {
        info!("dupecount in 'ideas': {}", stats.duplicates);
    }
    info!("inserted {} into 'ideas'", stats.inserted);
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognized_months_map_to_first_of_month() {
        assert_eq!(
            parse_ideas_key("March-2021"),
            NaiveDate::from_ymd_opt(2021, 3, 1)
        );
        assert_eq!(
            parse_ideas_key("December-1999"),
            NaiveDate::from_ymd_opt(1999, 12, 1)
        );
    }

    #[test]
    fn month_match_is_case_sensitive_and_exact() {
        assert_eq!(parse_ideas_key("Marsh-2021"), None);
        assert_eq!(parse_ideas_key("march-2021"), None);
        assert_eq!(parse_ideas_key("MARCH-2021"), None);
    }

    #[test]
    fn malformed_keys_are_not_idea_records() {
        assert_eq!(parse_ideas_key("March"), None);
        assert_eq!(parse_ideas_key("March-"), None);
        assert_eq!(parse_ideas_key("March-notayear"), None);
        assert_eq!(parse_ideas_key(""), None);
    }
}
