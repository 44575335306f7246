//! OpenAPI document for the Web API.

use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

use super::dto::{
    AuthResponse, FileSummary, HealthResponse, LoginRequest, RegisterRequest, UploadResponse,
    UploadedFile, UserInfo,
};
use super::error::{ErrorBody, ErrorCode};

/// Registers the bearer token scheme referenced by protected paths.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        let mut scheme = Http::new(HttpAuthScheme::Bearer);
        scheme.bearer_format = Some("JWT".to_string());
        components.add_security_scheme("bearer_auth", SecurityScheme::Http(scheme));
    }
}

#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "drivebox API",
        description = "Personal file storage: accounts, uploads and downloads."
    ),
    paths(
        crate::web::handlers::auth::register,
        crate::web::handlers::auth::login,
        crate::web::handlers::file::upload_file,
        crate::web::handlers::file::list_files,
        crate::web::handlers::file::get_file,
        crate::web::handlers::file::delete_file,
        crate::web::handlers::health::health_check,
    ),
    components(schemas(
        RegisterRequest,
        LoginRequest,
        UserInfo,
        AuthResponse,
        UploadedFile,
        UploadResponse,
        FileSummary,
        HealthResponse,
        ErrorBody,
        ErrorCode,
    )),
    tags(
        (name = "auth", description = "Registration and login"),
        (name = "files", description = "Upload, list, retrieve and delete files"),
        (name = "health", description = "Liveness probe")
    )
)]
pub struct ApiDoc;
