use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::io::Write;
use std::process::Command;

#[cfg(not(feature = "storage-rocksdb"))]
#[test]
fn test_rocksdb_fallback_warning() {
    let mut csv = tempfile::NamedTempFile::new().unwrap();
    writeln!(csv, "action, user, item, item_type, id").unwrap();
    writeln!(csv, "create, 1, 1, weapon,").unwrap();

    let mut cmd = Command::new(cargo_bin!("reservd"));
    cmd.arg("--db-path").arg("some_db").arg("batch").arg(csv.path());

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("Falling back to in-memory storage"))
        .stdout(predicate::str::contains("1,1,1,weapon,pending,"));
}

#[cfg(feature = "storage-rocksdb")]
#[test]
fn test_rocksdb_no_fallback_warning() {
    let mut csv = tempfile::NamedTempFile::new().unwrap();
    writeln!(csv, "action, user, item, item_type, id").unwrap();
    writeln!(csv, "create, 1, 1, weapon,").unwrap();

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("test_db");

    let mut cmd = Command::new(cargo_bin!("reservd"));
    cmd.arg("--db-path").arg(&db_path).arg("batch").arg(csv.path());

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("Falling back").not());
}
