use housekeeper::{differ, error::HousekeeperError, parser::parse};

#[test]
fn s1_add_column_round_trips() {
    let current = parse("CREATE TABLE d.t (id UInt64) ENGINE=MergeTree ORDER BY id;").unwrap();
    let target = parse("CREATE TABLE d.t (id UInt64, name String) ENGINE=MergeTree ORDER BY id;").unwrap();

    let diffs = differ::diff_schema(&current, &target).unwrap();
    assert_eq!(diffs.len(), 1);
    assert_eq!(diffs[0].forward_sql, vec!["ALTER TABLE d.t ADD COLUMN name String;".to_string()]);
    assert_eq!(diffs[0].reverse_sql, vec!["ALTER TABLE d.t DROP COLUMN name;".to_string()]);
}

#[test]
fn s2_identical_schemas_produce_no_diff() {
    let current = parse("CREATE DATABASE x ENGINE=Atomic;").unwrap();
    let target = parse("CREATE DATABASE x ENGINE=Atomic;").unwrap();

    let err = differ::diff_schema(&current, &target).unwrap_err();
    assert!(err.is_no_diff());
}

#[test]
fn s3_engine_change_is_unsupported() {
    let current = parse("CREATE TABLE d.t (id UInt64) ENGINE=MergeTree ORDER BY id;").unwrap();
    let target = parse("CREATE TABLE d.t (id UInt64) ENGINE=ReplacingMergeTree ORDER BY id;").unwrap();

    let err = differ::diff_schema(&current, &target).unwrap_err();
    assert!(err.is_unsupported());
}

#[test]
fn s6_database_creation_precedes_its_table_which_precedes_an_unrelated_drop() {
    let current = parse("CREATE DATABASE old ENGINE=Atomic;").unwrap();
    let target = parse("CREATE DATABASE d ENGINE=Atomic; CREATE TABLE d.t (id UInt64) ENGINE=MergeTree ORDER BY id;").unwrap();

    let diffs = differ::diff_schema(&current, &target).unwrap();
    let create_db = diffs.iter().position(|d| d.forward_sql[0].starts_with("CREATE DATABASE d")).unwrap();
    let create_table = diffs.iter().position(|d| d.forward_sql[0].starts_with("CREATE TABLE d.t")).unwrap();
    let drop_old = diffs.iter().position(|d| d.forward_sql[0].contains("DROP DATABASE") && d.forward_sql[0].contains("old")).unwrap();

    assert!(create_db < create_table);
    assert!(create_table < drop_old);
}

#[test]
fn invariant_3_diff_completeness_returns_no_diff_for_identical_schemas() {
    let sql = parse("CREATE DATABASE a ENGINE=Atomic; CREATE DATABASE b ENGINE=Atomic;").unwrap();
    match differ::diff_schema(&sql, &sql) {
        Err(HousekeeperError::NoDiff) => {}
        other => panic!("expected NoDiff, got {other:?}")
    }
}

#[test]
fn invariant_8_database_rename_is_detected() {
    let current = parse("CREATE DATABASE a ENGINE=Atomic;").unwrap();
    let target = parse("CREATE DATABASE b ENGINE=Atomic;").unwrap();

    let diffs = differ::diff_schema(&current, &target).unwrap();
    assert_eq!(diffs.len(), 1);
    assert!(diffs[0].forward_sql[0].contains("RENAME DATABASE a TO b"));
}
