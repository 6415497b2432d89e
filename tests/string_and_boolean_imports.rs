mod test_support;

use test_support::{open_mem_db, temp_dir, write_dump};
use toolkit_import::import::common::{import_boolean, import_strings, Persistence};

#[test]
fn first_write_wins_under_key_collision() {
    let dir = temp_dir("toolkit-strings-dupes");
    write_dump(
        &dir,
        "event_name.dat",
        &[
            ("1", "Film Night"),
            ("1", "Overwritten Name"),
            ("2", "Quiz Night"),
            ("1", "Another Overwrite"),
        ],
    );

    let conn = open_mem_db();
    let stats = import_strings(
        &conn,
        &dir,
        "event_name",
        "event_id",
        Persistence::Temporary,
        512,
    )
    .expect("import strings");
    assert_eq!(stats.inserted, 2);
    assert_eq!(stats.duplicates, 2);

    let name: String = conn
        .query_row(
            "SELECT event_name FROM event_name WHERE event_id = '1'",
            [],
            |r| r.get(0),
        )
        .expect("first value kept");
    assert_eq!(name, "Film Night");
}

#[test]
fn keys_and_values_are_trimmed() {
    let dir = temp_dir("toolkit-strings-trim");
    write_dump(&dir, "notes.dat", &[("  7  ", "  keeps odd hours  ")]);

    let conn = open_mem_db();
    import_strings(&conn, &dir, "notes", "member_id", Persistence::Permanent, 1024)
        .expect("import strings");

    let (key, value): (String, String) = conn
        .query_row("SELECT member_id, notes FROM notes", [], |r| {
            Ok((r.get(0)?, r.get(1)?))
        })
        .expect("notes row");
    assert_eq!(key, "7");
    assert_eq!(value, "keeps odd hours");
}

#[test]
fn permanent_tables_survive_where_temporary_ones_are_session_scoped() {
    let dir = temp_dir("toolkit-strings-persistence");
    write_dump(&dir, "notes.dat", &[("7", "x")]);
    write_dump(&dir, "copy.dat", &[("1", "y")]);

    let db_path = temp_dir("toolkit-strings-db").join("out.sqlite3");
    {
        let conn = toolkit_import::db::open_db(&db_path).expect("open");
        import_strings(&conn, &dir, "notes", "member_id", Persistence::Permanent, 1024)
            .expect("notes");
        import_strings(&conn, &dir, "copy", "event_id", Persistence::Temporary, 4096)
            .expect("copy");
    }
    let conn = toolkit_import::db::open_db(&db_path).expect("reopen");
    assert_eq!(test_support::count_rows(&conn, "notes"), 1);
    let copy_exists: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'copy'",
            [],
            |r| r.get(0),
        )
        .expect("sqlite_master");
    assert_eq!(copy_exists, 0);
}

#[test]
fn boolean_coercion_matches_only_the_exact_truthy_token() {
    let dir = temp_dir("toolkit-booleans");
    write_dump(
        &dir,
        "confirmed.dat",
        &[
            ("2020/6/15/14/30", "true"),
            ("2020/6/16/19/0", "True"),
            ("2020/6/17/20/0", "false"),
            ("2020/6/18/20/0", ""),
        ],
    );

    let conn = open_mem_db();
    import_boolean(&conn, &dir, "confirmed", "datetime").expect("import boolean");

    let truthy: i64 = conn
        .query_row("SELECT COUNT(*) FROM confirmed WHERE confirmed = 1", [], |r| {
            r.get(0)
        })
        .expect("count truthy");
    assert_eq!(truthy, 1);

    let flag: i64 = conn
        .query_row(
            "SELECT confirmed FROM confirmed WHERE datetime = '2020/6/15/14/30'",
            [],
            |r| r.get(0),
        )
        .expect("flag");
    assert_eq!(flag, 1);
}
