//! Test helpers for Web API tests.
//!
//! Provides a router-backed TestServer over an in-memory database and a
//! temporary upload root, plus helpers for accounts, tokens and uploads.

#![allow(dead_code)]

use std::sync::Arc;

use axum::http::header::AUTHORIZATION;
use axum_test::multipart::{MultipartForm, Part};
use axum_test::{TestResponse, TestServer};
use jsonwebtoken::EncodingKey;
use serde_json::{json, Value};
use tempfile::TempDir;

use drivebox::auth::token::issue_access_token;
use drivebox::auth::AccessClaims;
use drivebox::file::FileStorage;
use drivebox::web::handlers::AppState;
use drivebox::web::middleware::JwtState;
use drivebox::web::router::create_router;
use drivebox::Database;

/// Secret shared by the server and locally minted tokens.
pub const TEST_SECRET: &str = "test-secret-key-for-testing-only";

/// Default password satisfying the registration rules.
pub const TEST_PASSWORD: &str = "secret1";

/// A running test server and the resources behind it.
pub struct TestApp {
    pub server: TestServer,
    pub db: Arc<Database>,
    /// Upload root; removed when the app is dropped.
    pub storage_dir: TempDir,
}

/// Create a test app with the default upload limit.
pub async fn create_test_app() -> TestApp {
    build_test_app(None).await
}

/// Create a test app with a custom upload limit in bytes.
pub async fn create_test_app_with_limit(max_upload_size: u64) -> TestApp {
    build_test_app(Some(max_upload_size)).await
}

async fn build_test_app(max_upload_size: Option<u64>) -> TestApp {
    let db = Arc::new(
        Database::open_in_memory()
            .await
            .expect("Failed to create test database"),
    );
    let storage_dir = TempDir::new().expect("Failed to create upload root");
    let storage = FileStorage::new(storage_dir.path()).expect("Failed to create storage");

    let mut app_state =
        AppState::new(db.clone(), TEST_SECRET, 3600, storage).with_error_details(true);
    if let Some(limit) = max_upload_size {
        app_state = app_state.with_max_upload_size(limit);
    }

    let jwt_state = Arc::new(JwtState::new(TEST_SECRET));
    let router = create_router(Arc::new(app_state), jwt_state, &[]);
    let server = TestServer::new(router).expect("Failed to create test server");

    TestApp {
        server,
        db,
        storage_dir,
    }
}

/// Register an account and return the raw response.
pub async fn register(
    server: &TestServer,
    name: &str,
    email: &str,
    password: &str,
) -> TestResponse {
    server
        .post("/api/auth/register")
        .json(&json!({
            "name": name,
            "email": email,
            "password": password
        }))
        .await
}

/// Register an account and return its token.
pub async fn register_user(server: &TestServer, name: &str, email: &str) -> String {
    let response = register(server, name, email, TEST_PASSWORD).await;
    response.assert_status(axum::http::StatusCode::CREATED);
    token_of(&response.json::<Value>())
}

/// Log in and return the raw response.
pub async fn login(server: &TestServer, email: &str, password: &str) -> TestResponse {
    server
        .post("/api/auth/login")
        .json(&json!({
            "email": email,
            "password": password
        }))
        .await
}

/// Get the token from an auth response body.
pub fn token_of(body: &Value) -> String {
    body["token"].as_str().expect("token in response").to_string()
}

/// Build an `Authorization` header value.
pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

/// Mint a correctly signed token that expired an hour ago.
pub fn expired_token(user_id: &str, email: &str) -> String {
    let mut claims = AccessClaims::new(user_id, email, false, 60);
    claims.iat -= 7200;
    claims.exp = claims.iat + 60;
    issue_access_token(&claims, &EncodingKey::from_secret(TEST_SECRET.as_bytes()))
        .expect("Failed to sign token")
}

/// Build a multipart form with a single `file` part.
pub fn file_form(file_name: &str, content: &[u8], mime_type: &str) -> MultipartForm {
    MultipartForm::new().add_part(
        "file",
        Part::bytes(content.to_vec())
            .file_name(file_name)
            .mime_type(mime_type),
    )
}

/// Upload a file and return the raw response.
pub async fn upload(
    server: &TestServer,
    token: &str,
    file_name: &str,
    content: &[u8],
    mime_type: &str,
) -> TestResponse {
    server
        .post("/api/upload")
        .add_header(AUTHORIZATION, bearer(token))
        .multipart(file_form(file_name, content, mime_type))
        .await
}

/// Upload a file and return its ID.
pub async fn upload_file(
    server: &TestServer,
    token: &str,
    file_name: &str,
    content: &[u8],
) -> String {
    let response = upload(server, token, file_name, content, "text/plain").await;
    response.assert_status(axum::http::StatusCode::CREATED);
    response.json::<Value>()["file"]["id"]
        .as_str()
        .expect("file id in response")
        .to_string()
}
