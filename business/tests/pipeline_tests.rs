//! End-to-end tests for the file manager: GraphQL catalog in, files on
//! disk out.

use std::io::{Cursor, Read as _};
use std::time::Duration;

use filebox_business::archive::ARCHIVE_NAME;
use filebox_business::http::HttpClient;
use filebox_business::{
    ClientConfig, DirectorySink, DroppedFile, FileManager, GraphqlCatalog, ManagerError,
    SaveOutcome,
};
use serde_json::json;
use wiremock::matchers::{body_partial_json, body_string_contains, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct PipelineCtx {
    server: MockServer,
    downloads: tempfile::TempDir,
    manager: FileManager<GraphqlCatalog, DirectorySink>,
}

async fn setup() -> PipelineCtx {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_string_contains("listFiles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "listFiles": [
                { "id": "1", "name": "hello.txt", "fileSize": 5, "createDate": "Thu, 15 Oct 2026 09:30:00 +0000" },
                { "id": "2", "name": "world.txt", "fileSize": 5, "createDate": "Thu, 15 Oct 2026 09:31:00 +0000" }
            ] }
        })))
        .mount(&server)
        .await;
    for (id, content, delay) in [("1", "SGVsbG8=", 200), ("2", "V29ybGQ=", 0)] {
        Mock::given(method("POST"))
            .and(body_string_contains("getFile"))
            .and(body_partial_json(json!({ "variables": { "id": id } })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "data": { "getFile": content } }))
                    .set_delay(Duration::from_millis(delay)),
            )
            .mount(&server)
            .await;
    }

    let downloads = tempfile::tempdir().unwrap();
    let http = HttpClient::new(Duration::from_secs(5)).unwrap();
    let catalog = GraphqlCatalog::new(http, format!("{}/", server.uri()));
    let manager = FileManager::new(catalog, DirectorySink::new(downloads.path()));
    manager.refresh().await.unwrap();

    PipelineCtx {
        server,
        downloads,
        manager,
    }
}

#[tokio::test]
async fn test_single_selection_downloads_plain_file() {
    let ctx = setup().await;
    ctx.manager.toggle("1").unwrap();

    let outcome = ctx.manager.download_selected().await.unwrap();

    assert_eq!(
        outcome,
        SaveOutcome::Single {
            name: "hello.txt".to_owned(),
            bytes: 5
        }
    );
    let saved = std::fs::read(ctx.downloads.path().join("hello.txt")).unwrap();
    assert_eq!(saved, b"Hello");
}

#[tokio::test]
async fn test_two_selections_download_one_archive() {
    let ctx = setup().await;
    ctx.manager.toggle("1").unwrap();
    ctx.manager.toggle("2").unwrap();

    ctx.manager.download_selected().await.unwrap();

    let files: Vec<_> = std::fs::read_dir(ctx.downloads.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name())
        .collect();
    assert_eq!(files, vec![ARCHIVE_NAME]);

    let bytes = std::fs::read(ctx.downloads.path().join(ARCHIVE_NAME)).unwrap();
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    assert_eq!(archive.len(), 2);
    // "1" answers last but is still the first entry
    let mut first = String::new();
    archive
        .by_index(0)
        .unwrap()
        .read_to_string(&mut first)
        .unwrap();
    assert_eq!(first, "Hello");
    assert_eq!(archive.by_index(1).unwrap().name(), "world.txt");
}

#[tokio::test]
async fn test_failed_fetch_writes_nothing() {
    let ctx = setup().await;
    Mock::given(method("POST"))
        .and(body_string_contains("listFiles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "listFiles": [
                { "id": "1", "name": "hello.txt", "fileSize": 5, "createDate": "Thu, 15 Oct 2026 09:30:00 +0000" },
                { "id": "3", "name": "gone.txt", "fileSize": 1, "createDate": "Thu, 15 Oct 2026 09:32:00 +0000" }
            ] }
        })))
        .with_priority(1)
        .mount(&ctx.server)
        .await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "variables": { "id": "3" } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": null,
            "errors": [{ "message": "No file found for id = 3." }]
        })))
        .mount(&ctx.server)
        .await;
    ctx.manager.refresh().await.unwrap();
    ctx.manager.toggle("1").unwrap();
    ctx.manager.toggle("3").unwrap();

    let err = ctx.manager.download_selected().await.unwrap_err();

    assert!(matches!(err, ManagerError::Download(_)));
    assert!(err.to_string().contains("gone.txt"));
    assert_eq!(std::fs::read_dir(ctx.downloads.path()).unwrap().count(), 0);
    assert!(ctx.manager.view().error().is_some());
}

#[tokio::test]
async fn test_upload_then_refresh() {
    let ctx = setup().await;
    Mock::given(method("POST"))
        .and(body_string_contains("putFile"))
        .and(body_partial_json(json!({
            "variables": { "name": "new.txt", "contents": "bmV3" }
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "data": { "putFile": "3" } })),
        )
        .expect(1)
        .mount(&ctx.server)
        .await;

    let report = ctx
        .manager
        .drop_upload(vec![DroppedFile::from_bytes("new.txt", b"new".to_vec())])
        .await
        .unwrap();

    assert!(report.all_succeeded());
    assert_eq!(report.created[0].id, "3");
    assert!(ctx.manager.view().is_ready());
}

#[tokio::test]
async fn test_remove_selected_through_graphql() {
    let ctx = setup().await;
    Mock::given(method("POST"))
        .and(body_string_contains("removeFile"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "data": { "removeFile": true } })),
        )
        .expect(2)
        .mount(&ctx.server)
        .await;
    ctx.manager.toggle("1").unwrap();
    ctx.manager.toggle("2").unwrap();

    assert_eq!(ctx.manager.remove_selected().await.unwrap(), 2);
    assert!(ctx.manager.selection().is_empty());
}

#[tokio::test]
async fn test_manager_from_config() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains("listFiles"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "data": { "listFiles": [] } })),
        )
        .mount(&server)
        .await;
    let downloads = tempfile::tempdir().unwrap();
    let config = ClientConfig::new(format!("{}/", server.uri()), downloads.path());

    let manager = FileManager::from_config(&config).unwrap();

    assert_eq!(manager.refresh().await.unwrap(), 0);
    assert_eq!(manager.sink().dir(), downloads.path());
}
