mod common;

use std::fs::OpenOptions;

use flyarchive::{ArchiveError, ArchiveFormat, ArchiveSender, TarReader, ZipParser, stream};
use futures::StreamExt;

use common::{payload, produce, small_chunks, write_file};

#[tokio::test]
async fn advertised_length_matches_stream_for_both_formats() {
    let td = tempfile::tempdir().unwrap();
    let sizes = [0usize, 5, 100, 511, 512, 513, 2048, 9999];

    for format in [ArchiveFormat::Tar, ArchiveFormat::Zip] {
        let mut sender = small_chunks(format);
        for (i, size) in sizes.iter().enumerate() {
            let src = write_file(td.path(), &format!("{format}-{i}"), &payload(*size, i as u8));
            sender.add_file(format!("data/{i}.bin"), src).unwrap();
        }
        let (length, out) = produce(sender).await;
        assert_eq!(length, Some(out.len() as u64), "{format}");
    }
}

#[tokio::test]
async fn re_registering_keeps_one_entry_with_newest_source() {
    let td = tempfile::tempdir().unwrap();
    let old = write_file(td.path(), "old", b"old contents");
    let new = write_file(td.path(), "new", b"new");
    let other = write_file(td.path(), "other", b"other");

    for format in [ArchiveFormat::Tar, ArchiveFormat::Zip] {
        let mut sender = ArchiveSender::new(format);
        sender.add_file("same.txt", &old).unwrap();
        sender.add_file("other.txt", &other).unwrap();
        sender.add_file("same.txt", &new).unwrap();
        assert_eq!(sender.len(), 2);

        let (_, out) = produce(sender).await;
        match format {
            ArchiveFormat::Tar => {
                let reader = TarReader::new(&out);
                let entries = reader.list_files().unwrap();
                assert_eq!(entries.len(), 2);
                assert_eq!(entries[0].header.path, "same.txt");
                assert_eq!(reader.read(&entries[0]), b"new");
                assert_eq!(entries[1].header.path, "other.txt");
            }
            ArchiveFormat::Zip => {
                let parser = ZipParser::new(&out);
                let entries = parser.list_files().unwrap();
                assert_eq!(entries.len(), 2);
                assert_eq!(entries[0].file_name, "same.txt");
                assert_eq!(parser.read(&entries[0]).unwrap(), b"new");
                assert_eq!(entries[1].file_name, "other.txt");
            }
        }
    }
}

#[tokio::test]
async fn missing_source_fails_length_and_aborts_stream() {
    let td = tempfile::tempdir().unwrap();
    let present = write_file(td.path(), "present", b"here");
    let missing = td.path().join("missing");

    for format in [ArchiveFormat::Tar, ArchiveFormat::Zip] {
        let mut sender = ArchiveSender::new(format);
        sender.add_file("present", &present).unwrap();
        sender.add_file("missing", &missing).unwrap();

        let err = sender.content_length().await.unwrap_err();
        assert!(matches!(err, ArchiveError::SourceUnavailable { .. }), "{format}");

        let mut body = sender.generator();
        let mut produced = 0;
        let mut failure = None;
        while let Some(item) = body.next().await {
            match item {
                Ok(chunk) => produced += chunk.len(),
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            }
        }

        match failure {
            Some(ArchiveError::SourceUnavailable { path, .. }) => assert_eq!(path, missing),
            other => panic!("{format}: expected SourceUnavailable, got {other:?}"),
        }
        assert!(produced > 0, "{format}: first entry was streamed");
        assert!(body.next().await.is_none(), "{format}: stream ends after an error");
    }
}

#[tokio::test]
async fn shrinking_source_is_reported() {
    let td = tempfile::tempdir().unwrap();
    let src = write_file(td.path(), "shrinks", &payload(1000, 4));

    let mut sender = ArchiveSender::tar();
    sender.add_file("shrinks", &src).unwrap();
    let mut body = sender.generator();

    let header = body.next().await.unwrap().unwrap();
    assert_eq!(header.len(), 512);

    OpenOptions::new()
        .write(true)
        .open(&src)
        .unwrap()
        .set_len(10)
        .unwrap();

    let chunk = body.next().await.unwrap().unwrap();
    assert_eq!(chunk.len(), 10);

    match body.next().await {
        Some(Err(ArchiveError::SourceTruncated { expected, read, .. })) => {
            assert_eq!(expected, 1000);
            assert_eq!(read, 10);
        }
        other => panic!("expected SourceTruncated, got {other:?}"),
    }
}

#[tokio::test]
async fn growing_source_is_cut_at_header_size() {
    let td = tempfile::tempdir().unwrap();
    let src = write_file(td.path(), "grows", b"12345");

    let mut sender = ArchiveSender::zip();
    sender.add_file("grows", &src).unwrap();
    let length = sender.content_length().await.unwrap();
    let mut body = sender.generator();

    let header = body.next().await.unwrap().unwrap();
    assert_eq!(&header[..4], b"PK\x03\x04");
    std::fs::write(&src, b"1234567890").unwrap();

    let mut out = header.to_vec();
    while let Some(chunk) = body.next().await {
        out.extend_from_slice(&chunk.unwrap());
    }
    assert_eq!(Some(out.len() as u64), length);
}

#[tokio::test]
async fn dropped_stream_releases_its_source() {
    let td = tempfile::tempdir().unwrap();
    let src = write_file(td.path(), "big", &payload(5000, 1));

    let mut sender = small_chunks(ArchiveFormat::Zip);
    sender.add_file("big", &src).unwrap();
    let mut body = sender.generator();
    body.next().await.unwrap().unwrap();
    body.next().await.unwrap().unwrap();
    assert!(body.bytes_produced() > 0);
    drop(body);

    // the path can be replaced and archived afresh with the new contents
    std::fs::remove_file(&src).unwrap();
    write_file(td.path(), "big", b"replacement");

    let mut sender = ArchiveSender::zip();
    sender.add_file("big", &src).unwrap();
    let (length, out) = produce(sender).await;
    assert_eq!(length, Some(out.len() as u64));

    let parser = ZipParser::new(&out);
    let entries = parser.list_files().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(parser.read(&entries[0]).unwrap(), b"replacement");
}

#[tokio::test]
async fn response_parts() {
    let td = tempfile::tempdir().unwrap();
    let src = write_file(td.path(), "a", b"hello");

    let mut sender = ArchiveSender::tar();
    sender.add_file("a.txt", &src).unwrap();
    let response = sender.into_response().await.unwrap();

    assert_eq!(response.mime_type, "application/x-tar");
    assert_eq!(response.content_length, Some(1024));
    assert_eq!(
        response.headers(),
        vec![
            ("Content-Type", "application/x-tar".to_string()),
            ("Content-Disposition", "attachment; filename=\"archive.tar\"".to_string()),
            ("Content-Length", "1024".to_string()),
        ]
    );

    let mut out = Vec::new();
    let written = stream::write_all(response.body, &mut out).await.unwrap();
    assert_eq!(written, 1024);
}
