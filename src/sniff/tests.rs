use super::*;
use std::fs;
use tempfile::TempDir;

#[test]
fn memory_target_is_row_store() {
    assert_eq!(Target::parse(":memory:"), Target::Memory);
    assert_eq!(classify(&Target::Memory), SniffResult::RowStore);
    assert_eq!(Target::default().to_string(), ":memory:");
}

#[test]
fn paths_parse_as_files() {
    let target = Target::from("data/app.db");
    assert_eq!(target, Target::Path(PathBuf::from("data/app.db")));
    assert_eq!(target.to_string(), "data/app.db");
}

#[test]
fn missing_file_is_not_found() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("nope.db");

    assert_eq!(classify(&Target::Path(path.clone())), SniffResult::NotFound);
    assert!(!path.exists(), "sniffing must not create the file");
}

#[test]
fn empty_file_is_unknown_and_untouched() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("empty.db");
    fs::write(&path, b"").expect("Failed to write file");

    assert_eq!(classify(&Target::Path(path.clone())), SniffResult::Unknown);
    assert_eq!(fs::metadata(&path).expect("file should exist").len(), 0);
}

#[test]
fn sqlite_header_is_recognized() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("rows.db");
    let conn = rusqlite::Connection::open(&path).expect("should create SQLite file");
    conn.execute_batch("CREATE TABLE t (x int);")
        .expect("should write schema");
    drop(conn);

    assert_eq!(classify(&Target::Path(path)), SniffResult::RowStore);
}

#[test]
fn header_alone_decides_row_store() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("header-only.db");
    let mut bytes = SQLITE_HEADER.to_vec();
    bytes.extend_from_slice(&[0; 84]);
    fs::write(&path, bytes).expect("Failed to write file");

    assert_eq!(classify(&Target::Path(path)), SniffResult::RowStore);
}

#[test]
fn duckdb_file_is_columnar() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("columns.duckdb");
    let conn = duckdb::Connection::open(&path).expect("should create DuckDB file");
    conn.execute_batch("CREATE TABLE t (x INTEGER); INSERT INTO t VALUES (1);")
        .expect("should write table");
    conn.close().map_err(|(_, e)| e).expect("should close DuckDB file");

    assert_eq!(classify(&Target::Path(path)), SniffResult::Columnar);
}

#[test]
fn other_content_is_unknown() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("notes.txt");
    fs::write(&path, "just some text, definitely not a database").expect("Failed to write file");

    assert_eq!(classify(&Target::Path(path)), SniffResult::Unknown);
}

#[test]
fn short_file_is_unknown() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("short.db");
    fs::write(&path, b"SQLite").expect("Failed to write file");

    assert_eq!(classify(&Target::Path(path)), SniffResult::Unknown);
}

#[test]
fn directory_is_an_error() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    assert_eq!(
        classify(&Target::Path(temp_dir.path().to_path_buf())),
        SniffResult::Error
    );
}
