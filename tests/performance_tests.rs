use assert_cmd::cargo_bin;
use std::process::Command;

mod common;

#[test]
fn test_large_batch_streaming() {
    let file = tempfile::NamedTempFile::new().unwrap();
    common::generate_csv(file.path(), 20_000).expect("Failed to generate CSV");

    let output = Command::new(cargo_bin!("reservd"))
        .arg("batch")
        .arg(file.path())
        .output()
        .expect("Failed to execute command");
    assert!(output.status.success(), "Binary failed to process large batch");

    // Header plus one row per distinct item
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.lines().count(), 20_001);
}

#[test]
fn test_contended_batch_keeps_one_hold_per_item() {
    let file = tempfile::NamedTempFile::new().unwrap();
    common::generate_contended_csv(file.path(), 256, 25).expect("Failed to generate CSV");

    let output = Command::new(cargo_bin!("reservd"))
        .arg("batch")
        .arg(file.path())
        .output()
        .expect("Failed to execute command");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.lines().count(), 26, "Exactly one hold per item");
}

#[cfg(feature = "storage-rocksdb")]
#[test]
fn test_large_batch_streaming_db() {
    let file = tempfile::NamedTempFile::new().unwrap();
    common::generate_csv(file.path(), 5_000).expect("Failed to generate CSV");
    let dir = tempfile::tempdir().unwrap();

    let status = Command::new(cargo_bin!("reservd"))
        .arg("--db-path")
        .arg(dir.path().join("test_db"))
        .arg("batch")
        .arg(file.path())
        .status()
        .expect("Failed to execute command");
    assert!(status.success(), "Binary failed to process large batch");
}
