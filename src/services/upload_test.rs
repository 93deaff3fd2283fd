use super::*;

// =============================================================================
// sanitize_file_name
// =============================================================================

#[test]
fn sanitize_keeps_safe_characters() {
    assert_eq!(sanitize_file_name("photo-1_final.png"), "photo-1_final.png");
}

#[test]
fn sanitize_replaces_path_separators() {
    assert_eq!(sanitize_file_name("../../etc/passwd"), "_.._etc_passwd");
}

#[test]
fn sanitize_replaces_spaces_and_unicode() {
    assert_eq!(sanitize_file_name("my photo ä.png"), "my_photo__.png");
}

#[test]
fn sanitize_empty_falls_back() {
    assert_eq!(sanitize_file_name(""), "upload");
    assert_eq!(sanitize_file_name("..."), "upload");
}

// =============================================================================
// UploadStore::save
// =============================================================================

#[tokio::test]
async fn save_writes_file_and_returns_url() {
    let dir = tempfile::tempdir().unwrap();
    let store = UploadStore::new(dir.path().to_path_buf());

    let url = store.save(PROFILES_FOLDER, "avatar.png", b"png-bytes").await.unwrap();
    assert!(url.starts_with("/uploads/profiles/"));
    assert!(url.ends_with("_avatar.png"));

    let on_disk = dir.path().join(url.trim_start_matches("/uploads/"));
    let contents = tokio::fs::read(&on_disk).await.unwrap();
    assert_eq!(contents, b"png-bytes");
}

#[tokio::test]
async fn save_rejects_unknown_folder() {
    let dir = tempfile::tempdir().unwrap();
    let store = UploadStore::new(dir.path().to_path_buf());
    let result = store.save("secrets", "avatar.png", b"data").await;
    assert!(matches!(result.unwrap_err(), UploadError::UnknownFolder(_)));
}

#[tokio::test]
async fn save_rejects_empty_file() {
    let dir = tempfile::tempdir().unwrap();
    let store = UploadStore::new(dir.path().to_path_buf());
    let result = store.save(COVERS_FOLDER, "avatar.png", b"").await;
    assert!(matches!(result.unwrap_err(), UploadError::EmptyFile));
}

#[tokio::test]
async fn save_twice_yields_distinct_urls_or_same_timestamp_name() {
    let dir = tempfile::tempdir().unwrap();
    let store = UploadStore::new(dir.path().to_path_buf());
    let a = store.save(COVERS_FOLDER, "cover.jpg", b"one").await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    let b = store.save(COVERS_FOLDER, "cover.jpg", b"two").await.unwrap();
    assert_ne!(a, b);
}
