//! Router configuration for Web API.

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use std::path::Path;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::handlers::{
    delete_file, get_file, health_check, list_files, login, register, upload_file, AppState,
};
use super::middleware::{create_cors_layer, jwt_auth, security_headers, JwtState};
use super::openapi::ApiDoc;

/// Room for multipart boundaries and part headers on top of the file itself.
const MULTIPART_OVERHEAD: u64 = 1024 * 1024;

/// Create the main API router.
pub fn create_router(
    app_state: Arc<AppState>,
    jwt_state: Arc<JwtState>,
    cors_origins: &[String],
) -> Router {
    let body_limit = usize::try_from(app_state.max_upload_size.saturating_add(MULTIPART_OVERHEAD))
        .unwrap_or(usize::MAX);

    let auth_routes = Router::new()
        .route("/register", post(register))
        .route("/login", post(login));

    let api_routes = Router::new()
        .nest("/auth", auth_routes)
        .route(
            "/upload",
            post(upload_file).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/files", get(list_files))
        .route("/files/:id", get(get_file).delete(delete_file))
        .route("/health", get(health_check));

    // Clone jwt_state for the middleware closure
    let jwt_state_for_middleware = jwt_state.clone();

    Router::new()
        .nest("/api", api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(cors_origins))
                .layer(middleware::from_fn(security_headers))
                .layer(middleware::from_fn(move |req, next| {
                    let state = jwt_state_for_middleware.clone();
                    jwt_auth(state, req, next)
                })),
        )
        .with_state(app_state)
}

/// Create the public, unauthenticated view of the upload root.
pub fn create_uploads_router(storage_path: impl AsRef<Path>) -> Router {
    Router::new()
        .nest_service("/uploads", ServeDir::new(storage_path))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn(security_headers)),
        )
}

/// Create the Swagger UI router serving the OpenAPI document.
pub fn create_swagger_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
