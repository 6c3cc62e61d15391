use std::fs::File;
use std::path::{Path, PathBuf};

use flyarchive::{ArchiveError, ArchiveSender};
use futures::StreamExt;

/// A file of `len` bytes that occupies no disk blocks.
fn sparse_file(dir: &Path, name: &str, len: u64) -> PathBuf {
    let path = dir.join(name);
    File::create(&path).unwrap().set_len(len).unwrap();
    path
}

#[tokio::test]
async fn zip_rejects_file_of_four_gib() {
    let td = tempfile::tempdir().unwrap();
    let big = sparse_file(td.path(), "big", 1 << 32);

    let mut sender = ArchiveSender::zip();
    sender.add_file("big.bin", &big).unwrap();

    let err = sender.content_length().await.unwrap_err();
    assert!(
        matches!(err, ArchiveError::ZipLimitExceeded { what: "file size", value, .. } if value == 1 << 32),
        "{err:?}"
    );

    let mut body = sender.generator();
    let err = body.next().await.unwrap().unwrap_err();
    assert!(matches!(err, ArchiveError::ZipLimitExceeded { what: "file size", .. }), "{err:?}");
    assert!(body.next().await.is_none());
}

#[tokio::test]
async fn zip_accepts_file_just_under_four_gib_in_length() {
    let td = tempfile::tempdir().unwrap();
    let big = sparse_file(td.path(), "big", u32::MAX as u64 - 200);

    let mut sender = ArchiveSender::zip();
    sender.add_file("big.bin", &big).unwrap();

    // 30 + 46 + 2 * 7 bytes of headers and name, 22 for the end record
    let length = sender.content_length().await.unwrap();
    assert_eq!(length, Some(u32::MAX as u64 - 200 + 76 + 14 + 22));
}

#[test]
fn zip_archive_path_length_limit() {
    let td = tempfile::tempdir().unwrap();
    let src = td.path().join("src");

    let mut sender = ArchiveSender::zip();
    let err = sender.add_file("x".repeat(65_536), &src).unwrap_err();
    assert!(
        matches!(err, ArchiveError::ArchivePathTooLong { len: 65_536, max: 65_535, .. }),
        "{err:?}"
    );
    assert!(sender.is_empty());

    sender.add_file("x".repeat(65_535), &src).unwrap();
    assert_eq!(sender.len(), 1);
}

#[tokio::test]
async fn tar_rejects_size_beyond_octal_field() {
    let td = tempfile::tempdir().unwrap();
    let big = sparse_file(td.path(), "big", 1 << 33);

    let mut sender = ArchiveSender::tar();
    sender.add_file("big.bin", &big).unwrap();

    let err = sender.content_length().await.unwrap_err();
    assert!(
        matches!(err, ArchiveError::FieldOverflow { field: "size", value, .. } if value == 1 << 33),
        "{err:?}"
    );

    let mut body = sender.generator();
    let err = body.next().await.unwrap().unwrap_err();
    assert!(matches!(err, ArchiveError::FieldOverflow { field: "size", .. }), "{err:?}");
    assert!(body.next().await.is_none());
}

#[tokio::test]
async fn tar_length_covers_largest_encodable_size() {
    let td = tempfile::tempdir().unwrap();
    let size = (1u64 << 33) - 1;
    let big = sparse_file(td.path(), "big", size);

    let mut sender = ArchiveSender::tar();
    sender.add_file("big.bin", &big).unwrap();

    let length = sender.content_length().await.unwrap().unwrap();
    assert_eq!(length, 512 + size + 1);
}
