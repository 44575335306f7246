//! Web API End-to-End Scenario Tests
//!
//! These tests verify complete user flows across multiple API endpoints.

mod common;

use std::sync::Arc;

use axum::http::header::{AUTHORIZATION, CONTENT_DISPOSITION};
use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::Value;
use tempfile::TempDir;

use common::{bearer, create_test_app, login, register_user, upload, TEST_PASSWORD};
use drivebox::auth::{ensure_default_admin, BootstrapOutcome};
use drivebox::{Config, Database, FileStorage, WebServer};

/// Build the full application the binary serves.
async fn create_full_app(serve_public: bool) -> (TestServer, Arc<Database>, TempDir) {
    let storage_dir = TempDir::new().unwrap();

    let mut config = Config::default();
    config.server.host = "127.0.0.1".to_string();
    config.server.port = 0;
    config.web.jwt_secret = common::TEST_SECRET.to_string();
    config.files.storage_path = storage_dir.path().to_string_lossy().into_owned();
    config.files.serve_public = serve_public;

    let db = Arc::new(Database::open_in_memory().await.unwrap());
    let storage = FileStorage::new(storage_dir.path()).unwrap();

    ensure_default_admin(db.pool(), &storage, &config.admin)
        .await
        .unwrap();

    let server = WebServer::new(&config, db.clone(), storage).unwrap();
    let test_server = TestServer::new(server.router()).unwrap();

    (test_server, db, storage_dir)
}

#[tokio::test]
async fn test_alice_scenario() {
    let app = create_test_app().await;
    let server = &app.server;

    // Register
    let token = register_user(server, "Alice", "alice@example.com").await;

    // Upload a.txt
    let response = upload(server, &token, "a.txt", b"hello", "text/plain").await;
    response.assert_status(StatusCode::CREATED);
    let file_id = response.json::<Value>()["file"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    // List
    let list: Value = server
        .get("/api/files")
        .add_header(AUTHORIZATION, bearer(&token))
        .await
        .json();
    let files = list.as_array().unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0]["_id"], file_id.as_str());
    assert_eq!(files[0]["originalname"], "a.txt");
    assert_eq!(files[0]["size"], 5);

    // Retrieve
    let response = server
        .get(&format!("/api/files/{file_id}"))
        .add_header(AUTHORIZATION, bearer(&token))
        .await;
    response.assert_status_ok();
    assert_eq!(response.text(), "hello");
    assert_eq!(
        response.headers()[CONTENT_DISPOSITION],
        "inline; filename=\"a.txt\""
    );

    // Delete
    server
        .delete(&format!("/api/files/{file_id}"))
        .add_header(AUTHORIZATION, bearer(&token))
        .await
        .assert_status(StatusCode::NO_CONTENT);

    // Gone from retrieval and listing
    let response = server
        .get(&format!("/api/files/{file_id}"))
        .add_header(AUTHORIZATION, bearer(&token))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(response.json::<Value>()["message"], "File not found");

    let list: Value = server
        .get("/api/files")
        .add_header(AUTHORIZATION, bearer(&token))
        .await
        .json();
    assert_eq!(list.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_login_then_use_new_token() {
    let app = create_test_app().await;
    let server = &app.server;

    register_user(server, "Alice", "alice@example.com").await;

    let response = login(server, "alice@example.com", TEST_PASSWORD).await;
    response.assert_status_ok();
    let token = common::token_of(&response.json::<Value>());

    upload(server, &token, "notes.md", b"# notes", "text/markdown")
        .await
        .assert_status(StatusCode::CREATED);

    let list: Value = server
        .get("/api/files")
        .add_header(AUTHORIZATION, bearer(&token))
        .await
        .json();
    assert_eq!(list[0]["mimetype"], "text/markdown");
}

#[tokio::test]
async fn test_default_admin_can_log_in() {
    let (server, _db, _storage_dir) = create_full_app(true).await;

    let response = login(&server, "admin@example.com", "Admin@123").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["user"]["name"], "Admin User");
    assert_eq!(body["user"]["isAdmin"], true);
}

#[tokio::test]
async fn test_default_admin_bootstrap_runs_once() {
    let (_server, db, storage_dir) = create_full_app(true).await;
    let storage = FileStorage::new(storage_dir.path()).unwrap();

    let outcome = ensure_default_admin(db.pool(), &storage, &Config::default().admin)
        .await
        .unwrap();

    assert_eq!(outcome, BootstrapOutcome::AlreadyExists);
}

#[tokio::test]
async fn test_public_uploads_path() {
    let (server, db, _storage_dir) = create_full_app(true).await;
    let token = register_user(&server, "Alice", "alice@example.com").await;

    let response = upload(&server, &token, "a.txt", b"hello", "text/plain").await;
    response.assert_status(StatusCode::CREATED);
    let file_id = response.json::<Value>()["file"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    let record = drivebox::FileRepository::new(db.pool())
        .get_by_id(&file_id)
        .await
        .unwrap()
        .unwrap();

    // No token needed once the path is known.
    let response = server
        .get(&format!("/uploads/{}/{}", record.user_id, record.filename))
        .await;
    response.assert_status_ok();
    assert_eq!(response.text(), "hello");
}

#[tokio::test]
async fn test_public_uploads_path_disabled() {
    let (server, db, _storage_dir) = create_full_app(false).await;
    let token = register_user(&server, "Alice", "alice@example.com").await;

    let response = upload(&server, &token, "a.txt", b"hello", "text/plain").await;
    let file_id = response.json::<Value>()["file"]["id"]
        .as_str()
        .unwrap()
        .to_string();
    let record = drivebox::FileRepository::new(db.pool())
        .get_by_id(&file_id)
        .await
        .unwrap()
        .unwrap();

    server
        .get(&format!("/uploads/{}/{}", record.user_id, record.filename))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_openapi_document_served() {
    let (server, _db, _storage_dir) = create_full_app(true).await;

    let response = server.get("/api-docs/openapi.json").await;

    response.assert_status_ok();
    let doc: Value = response.json();
    assert_eq!(doc["info"]["title"], "drivebox API");
    assert!(doc["paths"]["/api/files/{id}"]["get"].is_object());
    assert!(doc["paths"]["/api/files/{id}"]["delete"].is_object());
}
