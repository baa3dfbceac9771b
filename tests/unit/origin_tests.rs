// Origin resolution against a directory-backed remote

use mediacache::origin::OriginResolver;
use mediacache::storage::FsStorage;
use mediacache::{AssetDescriptor, MediaError, StorageKind};
use std::sync::Arc;
use tempfile::TempDir;

fn remote_asset() -> AssetDescriptor {
    AssetDescriptor {
        id: 12,
        uuid: "9f1c".to_string(),
        storage: StorageKind::Remote,
        relative_path: "12/Track.MP3".to_string(),
        file_name: "Track.MP3".to_string(),
        extension: "MP3".to_string(),
        size_bytes: 6,
    }
}

#[tokio::test]
async fn test_mirror_uses_lowercase_extension() {
    let bucket = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    std::fs::create_dir_all(bucket.path().join("12")).unwrap();
    std::fs::write(bucket.path().join("12/Track.MP3"), b"ID3abc").unwrap();

    let resolver = OriginResolver::new(
        work.path().join("cache"),
        work.path(),
        Arc::new(FsStorage::new(bucket.path())),
    );
    let path = resolver.resolve(&remote_asset()).await.unwrap();

    assert_eq!(path, work.path().join("cache/9f1c.mp3"));
    assert_eq!(resolver.mirror_path(&remote_asset()), path);
    assert_eq!(std::fs::read(&path).unwrap(), b"ID3abc");
}

#[tokio::test]
async fn test_cache_dir_is_created_on_first_use() {
    let bucket = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    std::fs::create_dir_all(bucket.path().join("12")).unwrap();
    std::fs::write(bucket.path().join("12/Track.MP3"), b"ID3abc").unwrap();

    let cache_dir = work.path().join("deep/nested/cache");
    let resolver = OriginResolver::new(
        &cache_dir,
        work.path(),
        Arc::new(FsStorage::new(bucket.path())),
    );
    resolver.resolve(&remote_asset()).await.unwrap();

    assert!(cache_dir.is_dir());
}

#[tokio::test]
async fn test_missing_remote_object_is_retrieval_error() {
    let bucket = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();

    let resolver = OriginResolver::new(
        work.path().join("cache"),
        work.path(),
        Arc::new(FsStorage::new(bucket.path())),
    );
    let err = resolver.resolve(&remote_asset()).await.unwrap_err();

    assert!(matches!(err, MediaError::Retrieval { asset_id: 12, .. }));
    assert_eq!(err.to_http_status(), 502);
    assert!(!work.path().join("cache/9f1c.mp3").exists());
}
