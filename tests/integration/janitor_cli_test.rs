// Janitor binary invoked the way cron would run it

use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn janitor(cache_dir: &Path, extra: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_mediacache"))
        .arg("--cache-dir")
        .arg(cache_dir)
        .args(extra)
        .env("RUST_LOG", "error")
        .output()
        .expect("failed to run janitor binary")
}

fn populate(dir: &Path, count: usize) {
    for i in 0..count {
        std::fs::write(dir.join(format!("asset-{}.jpg", i)), vec![0u8; 512]).unwrap();
    }
}

#[test]
fn test_zero_budget_empties_the_cache() {
    let dir = TempDir::new().unwrap();
    populate(dir.path(), 3);

    let output = janitor(dir.path(), &["0"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(stdout.contains("Total size: 1.50 KB"), "{}", stdout);
    assert!(stdout.contains("Size allowed: 0.00 B"), "{}", stdout);
    assert!(stdout.contains("Files deleted: 3"), "{}", stdout);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_generous_budget_keeps_everything() {
    let dir = TempDir::new().unwrap();
    populate(dir.path(), 2);

    let output = janitor(dir.path(), &["1"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("Size allowed: 1.00 GB"), "{}", stdout);
    assert!(stdout.contains("Files deleted: 0"), "{}", stdout);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);
}

#[test]
fn test_json_dry_run_report() {
    let dir = TempDir::new().unwrap();
    populate(dir.path(), 4);

    let output = janitor(dir.path(), &["--json", "--dry-run", "0"]);
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["total_bytes"], 2048);
    assert_eq!(report["budget_bytes"], 0);
    assert_eq!(report["files_scanned"], 4);
    assert_eq!(report["files_deleted"], 4);
    assert_eq!(report["dry_run"], true);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 4);
}

#[test]
fn test_missing_budget_is_a_usage_error() {
    let dir = TempDir::new().unwrap();
    let output = janitor(dir.path(), &[]);
    assert!(!output.status.success());
}
