//! Default administrator creation at start-up.

use sqlx::SqlitePool;
use tracing::{info, warn};

use super::password::hash_password;
use super::validation::normalize_email;
use crate::config::AdminConfig;
use crate::db::{NewUser, UserRepository};
use crate::file::FileStorage;
use crate::{DriveError, Result};

/// What [`ensure_default_admin`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// The administrator account was created.
    Created,
    /// An account with the administrator email already exists.
    AlreadyExists,
    /// Bootstrapping is switched off in the configuration.
    Disabled,
}

/// Create the configured administrator unless an account with its email exists.
///
/// Losing a creation race to another process counts as "already exists".
/// Failure to create the administrator's directory is only logged.
pub async fn ensure_default_admin(
    pool: &SqlitePool,
    storage: &FileStorage,
    admin: &AdminConfig,
) -> Result<BootstrapOutcome> {
    if !admin.enabled {
        return Ok(BootstrapOutcome::Disabled);
    }

    let email = normalize_email(&admin.email);
    let repo = UserRepository::new(pool);
    if repo.email_exists(&email).await? {
        info!(email = %email, "Default admin already exists");
        return Ok(BootstrapOutcome::AlreadyExists);
    }

    let password = admin.password.clone();
    let hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| DriveError::Internal(format!("password hashing task failed: {e}")))??;

    let new_admin = NewUser::new(admin.name.trim(), email.as_str(), hash).with_admin(true);
    let user = match repo.create(&new_admin).await {
        Ok(user) => user,
        Err(DriveError::Conflict(_)) => return Ok(BootstrapOutcome::AlreadyExists),
        Err(e) => return Err(e),
    };

    if let Err(e) = storage.ensure_user_dir(&user.id).await {
        warn!(user_id = %user.id, error = %e, "Failed to create admin directory");
    }

    info!(user_id = %user.id, email = %user.email, "Default admin user created");
    Ok(BootstrapOutcome::Created)
}
