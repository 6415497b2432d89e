#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

pub fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

fn hex_line(bytes: &[u8]) -> String {
    let mut line = String::with_capacity(bytes.len() * 2 + 1);
    line.push(' ');
    for b in bytes {
        line.push_str(&format!("{:02x}", b));
    }
    line
}

/// Write a legacy dump file (db_dump bytevalue format) for one table.
/// Test pairs are ASCII, which is identical under Windows-1252.
pub fn write_dump(dir: &Path, file_name: &str, pairs: &[(&str, &str)]) {
    let mut body = String::from("VERSION=3\nformat=bytevalue\ntype=hash\nHEADER=END\n");
    for (key, value) in pairs {
        body.push_str(&hex_line(key.as_bytes()));
        body.push('\n');
        body.push_str(&hex_line(value.as_bytes()));
        body.push('\n');
    }
    body.push_str("DATA=END\n");

    let mut f = File::create(dir.join(file_name)).expect("create dump file");
    f.write_all(body.as_bytes()).expect("write dump file");
}

pub fn open_mem_db() -> rusqlite::Connection {
    let conn = rusqlite::Connection::open_in_memory().expect("open in-memory db");
    conn.execute_batch("PRAGMA foreign_keys = ON").expect("pragma");
    conn
}

pub fn count_rows(conn: &rusqlite::Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM \"{}\"", table), [], |r| {
        r.get(0)
    })
    .expect("count rows")
}
