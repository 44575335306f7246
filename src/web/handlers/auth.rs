//! Authentication handlers and shared application state.

use axum::{extract::State, http::StatusCode, Json};
use jsonwebtoken::EncodingKey;
use std::fmt::Display;
use std::sync::Arc;

use crate::auth::token::issue_access_token;
use crate::auth::{
    hash_password, normalize_email, verify_password, AccessClaims, PasswordError,
};
use crate::config::Config;
use crate::db::{NewUser, User, UserRepository};
use crate::file::{FileStorage, DEFAULT_MAX_UPLOAD_SIZE};
use crate::web::dto::{
    AuthResponse, LoginRequest, RegisterRequest, UserInfo, ValidatedJson,
};
use crate::web::error::{ApiError, ErrorBody};
use crate::{Database, DriveError};

/// Database handle shared across handlers.
pub type SharedDatabase = Arc<Database>;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database pool.
    pub db: SharedDatabase,
    /// JWT encoding key.
    pub encoding_key: EncodingKey,
    /// Access token expiry in seconds.
    pub access_token_expiry: u64,
    /// Per-user file storage.
    pub file_storage: FileStorage,
    /// Maximum upload size in bytes.
    pub max_upload_size: u64,
    /// Return internal error messages to clients (development only).
    pub expose_error_details: bool,
}

impl AppState {
    /// Create a new application state.
    pub fn new(
        db: SharedDatabase,
        jwt_secret: &str,
        access_expiry: u64,
        file_storage: FileStorage,
    ) -> Self {
        Self {
            db,
            encoding_key: EncodingKey::from_secret(jwt_secret.as_bytes()),
            access_token_expiry: access_expiry,
            file_storage,
            max_upload_size: DEFAULT_MAX_UPLOAD_SIZE,
            expose_error_details: false,
        }
    }

    /// Create the application state described by a configuration.
    pub fn from_config(db: SharedDatabase, file_storage: FileStorage, config: &Config) -> Self {
        Self::new(
            db,
            &config.web.jwt_secret,
            config.web.jwt_access_token_expiry_secs,
            file_storage,
        )
        .with_max_upload_size(config.files.max_upload_bytes())
        .with_error_details(config.web.is_development())
    }

    /// Set the maximum upload size in bytes.
    pub fn with_max_upload_size(mut self, bytes: u64) -> Self {
        self.max_upload_size = bytes;
        self
    }

    /// Expose internal error messages in responses.
    pub fn with_error_details(mut self, expose: bool) -> Self {
        self.expose_error_details = expose;
        self
    }

    /// Generate an access token for a user.
    pub fn generate_access_token(&self, user: &User) -> Result<String, ApiError> {
        let claims = AccessClaims::new(
            user.id.as_str(),
            user.email.as_str(),
            user.is_admin,
            self.access_token_expiry,
        );

        issue_access_token(&claims, &self.encoding_key)
            .map_err(|e| self.server_error("Failed to generate token", e))
    }

    /// Log a server-side failure and build the 500 response for it.
    pub fn server_error(&self, message: &str, err: impl Display) -> ApiError {
        tracing::error!("{}: {}", message, err);
        ApiError::internal_with_detail(message, err, self.expose_error_details)
    }
}

fn invalid_credentials() -> ApiError {
    ApiError::unauthorized("Invalid credentials").with_errors(["Invalid email or password"])
}

/// POST /api/auth/register - Create an account.
#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Validation failed or email already registered", body = ErrorBody)
    )
)]
pub async fn register(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    const FAILURE: &str = "Server error during registration";

    let name = req.name.trim().to_string();
    let email = normalize_email(&req.email);
    let repo = UserRepository::new(state.db.pool());

    if repo
        .email_exists(&email)
        .await
        .map_err(|e| state.server_error(FAILURE, e))?
    {
        return Err(ApiError::already_registered());
    }

    let password = req.password;
    let hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| state.server_error(FAILURE, e))?
        .map_err(|e| state.server_error(FAILURE, e))?;

    // Two concurrent registrations can both pass the existence check; the
    // UNIQUE index decides the winner.
    let user = match repo.create(&NewUser::new(name, email, hash)).await {
        Ok(user) => user,
        Err(DriveError::Conflict(_)) => return Err(ApiError::already_registered()),
        Err(e) => return Err(state.server_error(FAILURE, e)),
    };

    if let Err(e) = state.file_storage.ensure_user_dir(&user.id).await {
        tracing::warn!(user_id = %user.id, error = %e, "Failed to create user directory");
    }

    let token = state.generate_access_token(&user)?;
    tracing::info!(user_id = %user.id, email = %user.email, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "Registration successful".to_string(),
            token,
            user: UserInfo::from(&user),
        }),
    ))
}

/// POST /api/auth/login - Exchange credentials for a token.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 400, description = "Validation failed", body = ErrorBody),
        (status = 401, description = "Invalid credentials", body = ErrorBody)
    )
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    const FAILURE: &str = "Server error during login";

    let email = normalize_email(&req.email);
    let user = UserRepository::new(state.db.pool())
        .get_by_email(&email)
        .await
        .map_err(|e| state.server_error(FAILURE, e))?
        .ok_or_else(|| {
            tracing::debug!(email = %email, "Login for unknown email");
            invalid_credentials()
        })?;

    let password = req.password;
    let hash = user.password.clone();
    let verified = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| state.server_error(FAILURE, e))?;

    match verified {
        Ok(()) => {}
        Err(PasswordError::VerificationFailed) => {
            tracing::debug!(user_id = %user.id, "Login with wrong password");
            return Err(invalid_credentials());
        }
        Err(e) => return Err(state.server_error(FAILURE, e)),
    }

    let token = state.generate_access_token(&user)?;
    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(AuthResponse {
        message: "Login successful".to_string(),
        token,
        user: UserInfo::from(&user),
    }))
}
