mod test_support;

use test_support::{open_mem_db, temp_dir, write_dump};
use toolkit_import::db::table_columns;
use toolkit_import::import::roles::import_role_tables;

#[test]
fn columns_come_from_the_directory_listing() {
    let dir = temp_dir("toolkit-roles-discover");
    write_dump(&dir, "director", &[("1", "true")]);
    write_dump(&dir, "projectionist", &[("1", "3")]);
    write_dump(&dir, ".hidden", &[("1", "1")]);

    let conn = open_mem_db();
    let imported =
        import_role_tables(&conn, &dir, "roles_merged", "event_id").expect("import roles");
    assert!(imported);

    let columns = table_columns(&conn, "roles_merged").expect("columns");
    assert_eq!(columns, vec!["event_id", "director", "projectionist"]);
}

#[test]
fn shared_keys_upsert_into_one_row() {
    let dir = temp_dir("toolkit-roles-upsert");
    write_dump(&dir, "director", &[("1", "true"), ("2", "1")]);
    write_dump(&dir, "projectionist", &[("1", "3")]);

    let conn = open_mem_db();
    import_role_tables(&conn, &dir, "roles_merged", "event_id").expect("import roles");

    let rows: i64 = conn
        .query_row("SELECT COUNT(*) FROM roles_merged", [], |r| r.get(0))
        .expect("count");
    assert_eq!(rows, 2);

    let (director, projectionist): (i64, i64) = conn
        .query_row(
            "SELECT director, projectionist FROM roles_merged WHERE event_id = '1'",
            [],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .expect("merged row");
    assert_eq!(director, 1);
    assert_eq!(projectionist, 3);

    let lone: Option<i64> = conn
        .query_row(
            "SELECT projectionist FROM roles_merged WHERE event_id = '2'",
            [],
            |r| r.get(0),
        )
        .expect("lone row");
    assert_eq!(lone, None);
}

#[test]
fn missing_directory_reports_failure_without_aborting() {
    let dir = temp_dir("toolkit-roles-missing").join("does-not-exist");

    let conn = open_mem_db();
    let imported =
        import_role_tables(&conn, &dir, "vol_roles_merged", "member_id").expect("no abort");
    assert!(!imported);

    // The merge table still exists so later stages see a complete schema.
    let columns = table_columns(&conn, "vol_roles_merged").expect("columns");
    assert_eq!(columns, vec!["member_id"]);
}
