use std::fs;

use housekeeper::migration::MigrationDir;

#[test]
fn s4_tampering_a_single_byte_invalidates_the_sum_file() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("20240101000000_a.sql"), "CREATE DATABASE a ENGINE=Atomic;\n").unwrap();
    fs::write(dir.path().join("20240102000000_b.sql"), "CREATE DATABASE b ENGINE=Atomic;\n").unwrap();

    let mut migrations = MigrationDir::load(dir.path()).unwrap();
    migrations.rehash();
    migrations.write_sum_file().unwrap();
    assert!(MigrationDir::load(dir.path()).unwrap().validate());

    let path = dir.path().join("20240101000000_a.sql");
    let mut bytes = fs::read(&path).unwrap();
    bytes[0] ^= 0xFF;
    fs::write(&path, bytes).unwrap();

    assert!(!MigrationDir::load(dir.path()).unwrap().validate());
}

#[test]
fn invariant_5_adding_an_untracked_file_invalidates() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("20240101000000_a.sql"), "CREATE DATABASE a ENGINE=Atomic;\n").unwrap();

    let mut migrations = MigrationDir::load(dir.path()).unwrap();
    migrations.rehash();
    migrations.write_sum_file().unwrap();

    fs::write(dir.path().join("20240102000000_b.sql"), "CREATE DATABASE b ENGINE=Atomic;\n").unwrap();
    assert!(!MigrationDir::load(dir.path()).unwrap().validate());
}

#[test]
fn snapshotting_consolidates_and_deletes_consumed_files() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("20240101000000_a.sql"), "CREATE DATABASE a ENGINE=Atomic;\n").unwrap();
    fs::write(dir.path().join("20240102000000_b.sql"), "CREATE DATABASE b ENGINE=Atomic;\n").unwrap();
    fs::write(dir.path().join("20240103000000_c.sql"), "CREATE DATABASE c ENGINE=Atomic;\n").unwrap();

    let mut migrations = MigrationDir::load(dir.path()).unwrap();
    migrations.create_snapshot("20240102000000").unwrap();

    assert!(!dir.path().join("20240101000000_a.sql").exists());
    assert!(!dir.path().join("20240102000000_b.sql").exists());
    assert!(dir.path().join("20240103000000_c.sql").exists());
    assert!(dir.path().join("20240102000000_snapshot.sql").exists());

    let reloaded = MigrationDir::load(dir.path()).unwrap();
    assert!(reloaded.validate());
    assert_eq!(reloaded.migrations.len(), 2);
}
