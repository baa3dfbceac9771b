// Janitor eviction against real directories

use mediacache::janitor::{Janitor, ScannedFile};
use mediacache::MediaError;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

/// Write `size` bytes to `dir/name` and backdate it by `age_secs`
fn write_aged(dir: &Path, name: &str, size: usize, age_secs: u64) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, vec![b'x'; size]).unwrap();
    let file = File::options().write(true).open(&path).unwrap();
    file.set_modified(SystemTime::now() - Duration::from_secs(age_secs))
        .unwrap();
    path
}

#[tokio::test]
async fn test_eviction_boundary() {
    let dir = TempDir::new().unwrap();
    let newest = write_aged(dir.path(), "a.jpg", 10, 100);
    let middle = write_aged(dir.path(), "b.jpg", 10, 200);
    let oldest = write_aged(dir.path(), "c.jpg", 10, 300);

    let report = Janitor::new(dir.path(), 15).run().await.unwrap();

    assert!(newest.exists());
    assert!(!middle.exists());
    assert!(!oldest.exists());
    assert_eq!(report.total_bytes, 30);
    assert_eq!(report.budget_bytes, 15);
    assert_eq!(report.files_scanned, 3);
    assert_eq!(report.files_deleted, 2);
    assert_eq!(report.bytes_deleted, 20);
    assert_eq!(report.failed_deletions, 0);
}

#[tokio::test]
async fn test_scan_orders_newest_first() {
    let dir = TempDir::new().unwrap();
    write_aged(dir.path(), "old", 1, 500);
    write_aged(dir.path(), "new", 1, 5);
    write_aged(dir.path(), "mid", 1, 50);

    let files = Janitor::new(dir.path(), 0).scan().await.unwrap();
    let names: Vec<_> = files
        .iter()
        .map(|f| f.path.file_name().unwrap().to_string_lossy().into_owned())
        .collect();

    assert_eq!(names, vec!["new", "mid", "old"]);
}

#[tokio::test]
async fn test_dot_files_count_and_directories_are_skipped() {
    let dir = TempDir::new().unwrap();
    write_aged(dir.path(), "keep.png", 10, 10);
    let hidden = write_aged(dir.path(), ".abc.tmp", 10, 20);
    std::fs::create_dir(dir.path().join("nested")).unwrap();
    write_aged(&dir.path().join("nested"), "inner.png", 1000, 1);

    let report = Janitor::new(dir.path(), 10).run().await.unwrap();

    assert_eq!(report.files_scanned, 2);
    assert_eq!(report.total_bytes, 20);
    assert_eq!(report.files_deleted, 1);
    assert!(!hidden.exists());
    assert!(dir.path().join("nested/inner.png").exists());
}

#[tokio::test]
async fn test_large_budget_keeps_everything() {
    let dir = TempDir::new().unwrap();
    write_aged(dir.path(), "a", 100, 1);
    write_aged(dir.path(), "b", 100, 2);

    let report = Janitor::new(dir.path(), 1024 * 1024 * 1024).run().await.unwrap();

    assert_eq!(report.files_deleted, 0);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);
}

#[tokio::test]
async fn test_zero_budget_deletes_everything() {
    let dir = TempDir::new().unwrap();
    write_aged(dir.path(), "a", 1, 1);
    write_aged(dir.path(), "b", 1, 2);

    let report = Janitor::new(dir.path(), 0).run().await.unwrap();

    assert_eq!(report.files_deleted, 2);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_dry_run_deletes_nothing() {
    let dir = TempDir::new().unwrap();
    write_aged(dir.path(), "a", 10, 1);
    write_aged(dir.path(), "b", 10, 2);

    let report = Janitor::new(dir.path(), 5)
        .with_dry_run(true)
        .run()
        .await
        .unwrap();

    assert!(report.dry_run);
    assert_eq!(report.files_deleted, 2);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);
}

fn listing(dir: &Path, names: &[&str]) -> Vec<ScannedFile> {
    names
        .iter()
        .map(|name| ScannedFile {
            path: dir.join(name),
            size_bytes: 10,
            modified: SystemTime::UNIX_EPOCH,
        })
        .collect()
}

#[tokio::test]
async fn test_failed_deletion_aborts_with_partial_report() {
    let dir = TempDir::new().unwrap();
    write_aged(dir.path(), "kept", 10, 1);
    write_aged(dir.path(), "evicted", 10, 2);
    write_aged(dir.path(), "untouched", 10, 4);
    // "vanished" is listed but gone by the time it is deleted
    let files = listing(dir.path(), &["kept", "evicted", "vanished", "untouched"]);

    let err = Janitor::new(dir.path(), 10).evict(&files).await.unwrap_err();

    match err {
        MediaError::EvictionIo { path, report, .. } => {
            assert_eq!(path, dir.path().join("vanished"));
            assert_eq!(report.files_deleted, 1);
            assert_eq!(report.files_scanned, 4);
        }
        other => panic!("expected EvictionIo, got {:?}", other),
    }
    assert!(dir.path().join("kept").exists());
    assert!(!dir.path().join("evicted").exists());
    assert!(dir.path().join("untouched").exists());
}

#[tokio::test]
async fn test_best_effort_continues_past_failures() {
    let dir = TempDir::new().unwrap();
    write_aged(dir.path(), "kept", 10, 1);
    write_aged(dir.path(), "evicted", 10, 2);
    write_aged(dir.path(), "also_evicted", 10, 4);
    let files = listing(dir.path(), &["kept", "evicted", "vanished", "also_evicted"]);

    let report = Janitor::new(dir.path(), 10)
        .with_continue_on_error(true)
        .evict(&files)
        .await
        .unwrap();

    assert_eq!(report.files_deleted, 2);
    assert_eq!(report.bytes_deleted, 20);
    assert_eq!(report.failed_deletions, 1);
    assert!(!dir.path().join("also_evicted").exists());
    assert!(report.summary().contains("Failed deletions: 1"));
}
