use super::*;
use crate::config::Config;
use tempfile::TempDir;

fn memory_adapter() -> SqliteAdapter {
    let mut adapter = SqliteAdapter::open(&Target::Memory).expect("should open in-memory database");
    adapter
        .register_functions(functions::SQLITE_FUNCTIONS, &Arc::new(ModelRegistry::default()))
        .expect("should register functions");
    adapter
}

fn run(adapter: &mut SqliteAdapter, sql: &str) -> Result<String, ExecuteError> {
    let mut out = Vec::new();
    adapter.execute(sql, &mut out)?;
    Ok(String::from_utf8(out).expect("output should be UTF-8"))
}

#[test]
fn rows_render_as_tuples() {
    let mut adapter = memory_adapter();
    let output = run(&mut adapter, "SELECT 1").expect("query should succeed");
    assert_eq!(output, "(1,)\n");

    let output = run(&mut adapter, "SELECT 1, NULL, 2.5, 'a', x'00ff'").expect("query should succeed");
    assert_eq!(output, "(1, None, 2.5, 'a', b'\\x00\\xff')\n");
}

#[test]
fn execute_reports_row_count() {
    let mut adapter = memory_adapter();
    let mut out = Vec::new();
    let count = adapter
        .execute("SELECT 1 UNION ALL SELECT 2 UNION ALL SELECT 3", &mut out)
        .expect("query should succeed");
    assert_eq!(count, 3);
    assert_eq!(String::from_utf8_lossy(&out), "(1,)\n(2,)\n(3,)\n");
}

#[test]
fn statements_without_rows_print_nothing() {
    let mut adapter = memory_adapter();
    let output = run(&mut adapter, "CREATE TABLE t (x int);").expect("create should succeed");
    assert_eq!(output, "");
    let output = run(&mut adapter, "INSERT INTO t VALUES (42)").expect("insert should succeed");
    assert_eq!(output, "");
    let output = run(&mut adapter, "SELECT x FROM t").expect("select should succeed");
    assert_eq!(output, "(42,)\n");
}

#[test]
fn multiple_statements_are_rejected() {
    let mut adapter = memory_adapter();
    let error = run(&mut adapter, "SELECT 1; SELECT 2").expect_err("two statements should fail");
    assert_eq!(
        error.to_string(),
        "ProgrammingError: You can only execute one statement at a time."
    );
}

#[test]
fn bracketed_identifiers_do_not_split_statements() {
    let mut adapter = memory_adapter();
    let output = run(&mut adapter, "SELECT 1 AS [a;b]").expect("one statement should succeed");
    assert_eq!(output, "(1,)\n");
    let output = run(&mut adapter, "SELECT 2 AS [a;b];  -- done").expect("one statement should succeed");
    assert_eq!(output, "(2,)\n");
}

#[test]
fn quotes_inside_brackets_do_not_hide_a_second_statement() {
    let mut adapter = memory_adapter();
    let mut out = Vec::new();
    let error = adapter
        .execute("SELECT 1 AS [it's]; SELECT 2", &mut out)
        .expect_err("two statements should fail");
    assert_eq!(
        error.to_string(),
        "ProgrammingError: You can only execute one statement at a time."
    );
    assert!(out.is_empty());
}

#[test]
fn second_statement_is_rejected_before_the_first_runs() {
    let mut adapter = memory_adapter();
    let error = run(&mut adapter, "CREATE TABLE t (x int); INSERT INTO t VALUES (1)")
        .expect_err("two statements should fail");
    assert!(error.to_string().starts_with("ProgrammingError: "));
    let error = run(&mut adapter, "SELECT x FROM t").expect_err("table should not exist");
    assert_eq!(error.to_string(), "OperationalError (SQLITE_ERROR): no such table: t");
}

#[test]
fn empty_input_is_a_no_op() {
    let mut adapter = memory_adapter();
    assert_eq!(run(&mut adapter, "  ;  -- nothing").expect("no-op should succeed"), "");
}

#[test]
fn syntax_errors_carry_symbolic_code() {
    let mut adapter = memory_adapter();
    let error = run(&mut adapter, "SELEC 1").expect_err("syntax error expected");
    let message = error.to_string();
    assert!(message.starts_with("OperationalError (SQLITE_ERROR): "), "{message}");
    assert!(message.contains("syntax error"), "{message}");
}

#[test]
fn constraint_violations_are_classified() {
    let mut adapter = memory_adapter();
    adapter
        .execute_batch("CREATE TABLE u (id INTEGER PRIMARY KEY); INSERT INTO u VALUES (1);")
        .expect("setup should succeed");
    let error = run(&mut adapter, "INSERT INTO u VALUES (1)").expect_err("duplicate key expected");
    assert_eq!(
        error.to_string(),
        "IntegrityError (SQLITE_CONSTRAINT_PRIMARYKEY): UNIQUE constraint failed: u.id"
    );

    adapter
        .execute_batch("CREATE TABLE v (name TEXT UNIQUE NOT NULL); INSERT INTO v VALUES ('a');")
        .expect("setup should succeed");
    let error = run(&mut adapter, "INSERT INTO v VALUES ('a')").expect_err("duplicate value expected");
    assert!(error.to_string().starts_with("IntegrityError (SQLITE_CONSTRAINT_UNIQUE): "));
    let error = run(&mut adapter, "INSERT INTO v VALUES (NULL)").expect_err("null value expected");
    assert!(error.to_string().starts_with("IntegrityError (SQLITE_CONSTRAINT_NOTNULL): "));
}

#[test]
fn completeness_uses_sqlite() {
    let adapter = memory_adapter();
    assert!(!adapter.is_complete("SELECT 1"));
    assert!(adapter.is_complete("SELECT 1;"));
    assert!(!adapter.is_complete("SELECT 'a;"));
    assert!(adapter.is_complete(
        "CREATE TRIGGER t AFTER INSERT ON a BEGIN SELECT 1; END;"
    ));
}

#[test]
fn generate_with_default_and_explicit_model() {
    let mut adapter = memory_adapter();
    let output = run(&mut adapter, "SELECT generate('hello world', 'markov')").expect("generate should succeed");
    assert_eq!(output, "('hello world',)\n");
    let output = run(&mut adapter, "SELECT generate('hello world')").expect("generate should succeed");
    assert_eq!(output, "('hello world',)\n");
}

#[test]
fn embed_returns_json_of_declared_dimension() {
    let mut config = Config::default();
    config.hashing.dimension = 5;
    let mut adapter = SqliteAdapter::open(&Target::Memory).expect("should open database");
    adapter
        .register_functions(functions::SQLITE_FUNCTIONS, &Arc::new(ModelRegistry::builtin(&config)))
        .expect("should register functions");

    let output = run(&mut adapter, "SELECT json_array_length(embed('hello', 'hashing'))").expect("embed should succeed");
    assert_eq!(output, "(5,)\n");
    let output = run(&mut adapter, "SELECT json_array_length(embed('hello'))").expect("embed should succeed");
    assert_eq!(output, "(5,)\n");
}

#[test]
fn null_arguments_give_null() {
    let mut adapter = memory_adapter();
    let output = run(&mut adapter, "SELECT generate(NULL), embed('x', NULL)").expect("query should succeed");
    assert_eq!(output, "(None, None)\n");
}

#[test]
fn numeric_arguments_are_coerced_to_text() {
    let mut adapter = memory_adapter();
    let output = run(&mut adapter, "SELECT generate(42)").expect("generate should succeed");
    assert_eq!(output, "('42',)\n");
}

#[test]
fn unknown_model_surfaces_as_engine_error() {
    let mut adapter = memory_adapter();
    let error = run(&mut adapter, "SELECT generate('hi', 'nope')").expect_err("unknown model expected");
    assert_eq!(error.to_string(), "OperationalError (SQLITE_ERROR): Unknown model: nope");
}

#[test]
fn blob_arguments_are_rejected() {
    let mut adapter = memory_adapter();
    let error = run(&mut adapter, "SELECT embed(x'00')").expect_err("blob should be rejected");
    assert!(error.to_string().contains("does not accept blob arguments"));
}

#[test]
fn file_database_persists_after_close() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let target = Target::Path(temp_dir.path().join("rows.db"));

    let mut adapter = SqliteAdapter::open(&target).expect("should open file database");
    adapter
        .execute_batch("CREATE TABLE t (x text); INSERT INTO t VALUES ('kept');")
        .expect("setup should succeed");
    Box::new(adapter).close().expect("close should succeed");

    let mut adapter = SqliteAdapter::open(&target).expect("should reopen file database");
    assert_eq!(run(&mut adapter, "SELECT x FROM t").expect("select should succeed"), "('kept',)\n");
}

#[test]
fn result_code_names() {
    assert_eq!(result_code_name(ffi::SQLITE_BUSY), "SQLITE_BUSY");
    assert_eq!(result_code_name(ffi::SQLITE_CONSTRAINT | (8 << 8)), "SQLITE_CONSTRAINT_UNIQUE");
    assert_eq!(result_code_name(ffi::SQLITE_IOERR | (3 << 8)), "SQLITE_IOERR_WRITE");
    // Unlisted extended codes fall back to their primary code
    assert_eq!(result_code_name(ffi::SQLITE_CONSTRAINT | (99 << 8)), "SQLITE_CONSTRAINT");
    assert_eq!(result_code_name(999), "SQLITE_UNKNOWN");
}

#[test]
fn error_classes_follow_result_codes() {
    assert_eq!(error_class(ffi::SQLITE_ERROR), "OperationalError");
    assert_eq!(error_class(ffi::SQLITE_BUSY | (3 << 8)), "OperationalError");
    assert_eq!(error_class(ffi::SQLITE_CONSTRAINT | (6 << 8)), "IntegrityError");
    assert_eq!(error_class(ffi::SQLITE_MISMATCH), "IntegrityError");
    assert_eq!(error_class(ffi::SQLITE_TOOBIG), "DataError");
    assert_eq!(error_class(ffi::SQLITE_RANGE), "InterfaceError");
    assert_eq!(error_class(ffi::SQLITE_INTERNAL), "InternalError");
    assert_eq!(error_class(ffi::SQLITE_CORRUPT), "DatabaseError");
}
