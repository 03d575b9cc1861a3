//! ReadKnowsClient against the in-process API double

mod helpers;

use helpers::FakeServer;
use rk_common::config::TimeoutConfig;
use rk_common::events::FailureReason;
use rk_import::models::{ImportOptions, RecordId};
use rk_import::services::{BatchFile, ClientError, ReadKnowsClient};

fn client(server: &FakeServer) -> ReadKnowsClient {
    ReadKnowsClient::new(server.base_url(), None, TimeoutConfig::default()).unwrap()
}

fn batch(name: &str) -> Vec<BatchFile> {
    vec![BatchFile {
        path: format!("/inbox/{}", name),
        name: name.to_string(),
    }]
}

#[tokio::test]
async fn test_scan_list_parses_files_and_issues() {
    let server = FakeServer::start().await;
    let response = client(&server).scan_list("/inbox").await.unwrap();

    let names: Vec<_> = response.files.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["A.epub", "dup-B.pdf", "broken-C.txt"]);
    assert_eq!(response.files[0].path, "/inbox/A.epub");
    assert_eq!(response.files[0].size, 1024);
    assert!(response.files[0].modified.as_ref().unwrap().to_datetime().is_some());
    assert_eq!(response.errors.len(), 1);
    assert_eq!(response.errors[0].to_string(), "/inbox/locked: permission denied");

    let recorded = server.recorded();
    assert_eq!(recorded.scan_requests[0]["scanPath"], "/inbox");
}

#[tokio::test]
async fn test_scan_list_missing_directory() {
    let server = FakeServer::start().await;
    let err = client(&server).scan_list("/missing").await.unwrap_err();
    match err {
        ClientError::Api { status, message } => {
            assert_eq!(status, 404);
            assert_eq!(message.as_deref(), Some("Directory not found"));
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[tokio::test]
async fn test_import_batch_sends_flattened_options() {
    let server = FakeServer::start().await;
    let options = ImportOptions {
        category: Some("Sci-Fi".to_string()),
        is_public: true,
        ..Default::default()
    };

    let response = client(&server)
        .import_batch(&batch("A.epub"), &options)
        .await
        .unwrap();
    assert_eq!(response.imported, 1);
    assert_eq!(response.skipped, 0);

    let recorded = server.recorded();
    let body = &recorded.import_requests[0];
    assert_eq!(body["files"][0]["path"], "/inbox/A.epub");
    assert_eq!(body["files"][0]["name"], "A.epub");
    assert_eq!(body["isPublic"], true);
    assert_eq!(body["autoFetchMetadata"], true);
    assert_eq!(body["category"], "Sci-Fi");
    assert_eq!(body["deleteSourceAfterImport"], false);
}

#[tokio::test]
async fn test_import_batch_duplicate_and_failed_counters() {
    let server = FakeServer::start().await;
    let client = client(&server);

    let dup = client
        .import_batch(&batch("dup-B.pdf"), &ImportOptions::default())
        .await
        .unwrap();
    assert_eq!((dup.imported, dup.skipped, dup.failed), (0, 1, 0));

    let bad = client
        .import_batch(&batch("bad.txt"), &ImportOptions::default())
        .await
        .unwrap();
    assert_eq!(bad.failed, 1);
    assert_eq!(bad.errors[0].to_string(), "/inbox/bad.txt: corrupt archive");
}

#[tokio::test]
async fn test_import_batch_rejects_empty_input() {
    let server = FakeServer::start().await;
    let err = client(&server)
        .import_batch(&[], &ImportOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::InvalidInput(_)));
    assert!(server.recorded().import_requests.is_empty());
}

#[tokio::test]
async fn test_server_error_carries_api_message() {
    let server = FakeServer::start().await;
    let err = client(&server)
        .import_batch(&batch("broken-C.txt"), &ImportOptions::default())
        .await
        .unwrap_err();

    assert_eq!(err.failure_reason(), FailureReason::ServerError);
    assert_eq!(err.api_message(), Some("Database is locked"));
}

#[tokio::test]
async fn test_upload_sends_multipart_fields() {
    let server = FakeServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Dune.epub");
    std::fs::write(&path, b"PK\x03\x04 fake epub").unwrap();

    let response = client(&server)
        .upload_book(&path, &ImportOptions::default())
        .await
        .unwrap();
    assert_eq!(response.book.unwrap().title.as_deref(), Some("Dune"));

    let recorded = server.recorded();
    let fields = &recorded.uploads[0];
    assert_eq!(fields["file_name"], "Dune.epub");
    assert_eq!(fields["content_type"], "application/epub+zip");
    assert_eq!(fields["file_bytes"], "14");
    assert_eq!(fields["autoConvertTxt"], "true");
    assert_eq!(fields["isPublic"], "false");
    assert!(!fields.contains_key("category"));
}

#[tokio::test]
async fn test_upload_streams_whole_file() {
    let server = FakeServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Atlas.pdf");
    let content: Vec<u8> = (0..1_048_576u32).map(|i| (i % 251) as u8).collect();
    std::fs::write(&path, &content).unwrap();

    client(&server)
        .upload_book(&path, &ImportOptions::default())
        .await
        .unwrap();

    let recorded = server.recorded();
    let fields = &recorded.uploads[0];
    assert_eq!(fields["file_name"], "Atlas.pdf");
    assert_eq!(fields["content_type"], "application/pdf");
    assert_eq!(fields["file_bytes"], "1048576");
}

#[tokio::test]
async fn test_upload_too_large() {
    let server = FakeServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("huge.pdf");
    std::fs::write(&path, b"%PDF-1.7").unwrap();

    let err = client(&server)
        .upload_book(&path, &ImportOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.failure_reason(), FailureReason::PayloadTooLarge);
    assert_eq!(err.api_message(), None);
}

#[tokio::test]
async fn test_upload_missing_file_is_io_error() {
    let server = FakeServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    let err = client(&server)
        .upload_book(&dir.path().join("gone.epub"), &ImportOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Io(_)));
    assert!(server.recorded().uploads.is_empty());
}

#[tokio::test]
async fn test_bearer_token() {
    let server = FakeServer::start_with_token("s3cret").await;

    let anonymous = client(&server);
    let err = anonymous.scan_list("/inbox").await.unwrap_err();
    assert_eq!(err.failure_reason(), FailureReason::PermissionDenied);
    assert_eq!(err.api_message(), Some("Invalid or missing token"));

    let authed = ReadKnowsClient::new(
        server.base_url(),
        Some("s3cret".to_string()),
        TimeoutConfig::default(),
    )
    .unwrap();
    authed.scan_list("/inbox").await.unwrap();

    let recorded = server.recorded();
    assert_eq!(recorded.auth_headers[0], None);
    assert_eq!(recorded.auth_headers[1].as_deref(), Some("Bearer s3cret"));
}

#[tokio::test]
async fn test_history_list_and_clear() {
    let server = FakeServer::start().await;
    let client = client(&server);
    for name in ["one.epub", "dup-two.epub", "three.epub"] {
        client
            .import_batch(&batch(name), &ImportOptions::default())
            .await
            .unwrap();
    }

    let history = client.import_history(2).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].id, RecordId::Int(3));
    assert_eq!(history[0].file_name, "three.epub");
    assert_eq!(history[1].status, "skipped");

    client.clear_import_history().await.unwrap();
    assert!(client.import_history(10).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_batch_import_timeout() {
    let server = FakeServer::start().await;
    let timeouts = TimeoutConfig {
        batch_import_secs: 1,
        ..Default::default()
    };
    let client = ReadKnowsClient::new(server.base_url(), None, timeouts).unwrap();

    let err = client
        .import_batch(&batch("slow.epub"), &ImportOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Timeout));
    assert_eq!(err.failure_reason(), FailureReason::Timeout);
}

#[tokio::test]
async fn test_unreachable_server() {
    // Nothing listens on port 1
    let client = ReadKnowsClient::new("http://127.0.0.1:1", None, TimeoutConfig::default()).unwrap();
    let err = client.scan_list("/inbox").await.unwrap_err();
    assert_eq!(err.failure_reason(), FailureReason::NetworkUnreachable);
}

#[test]
fn test_base_url_trailing_slash_trimmed() {
    let client =
        ReadKnowsClient::new("http://nas.local:1281/", None, TimeoutConfig::default()).unwrap();
    assert_eq!(client.base_url(), "http://nas.local:1281");
}
