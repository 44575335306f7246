//! Configuration module for drivebox.

use serde::Deserialize;
use std::path::Path;

use crate::{DriveError, Result};

/// Environment variable overriding `web.jwt_secret`.
pub const ENV_JWT_SECRET: &str = "DRIVEBOX_JWT_SECRET";

/// Environment variable overriding `web.environment`.
pub const ENV_ENVIRONMENT: &str = "DRIVEBOX_ENV";

/// HTTP listener configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String {
    "data/drivebox.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// File storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct FilesConfig {
    /// Root directory holding one sub-directory per user.
    #[serde(default = "default_storage_path")]
    pub storage_path: String,
    /// Maximum upload size in megabytes.
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size_mb: u64,
    /// Expose the storage root read-only under `/uploads`.
    #[serde(default = "default_serve_public")]
    pub serve_public: bool,
}

fn default_storage_path() -> String {
    "uploads".to_string()
}

fn default_max_upload_size() -> u64 {
    100
}

fn default_serve_public() -> bool {
    true
}

impl FilesConfig {
    /// Upload cap in bytes.
    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_size_mb.saturating_mul(1024 * 1024)
    }
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            storage_path: default_storage_path(),
            max_upload_size_mb: default_max_upload_size(),
            serve_public: default_serve_public(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/drivebox.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Web API configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    /// CORS allowed origins. Empty means any origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,
    /// JWT secret key (required).
    #[serde(default)]
    pub jwt_secret: String,
    /// Access token lifetime in seconds.
    #[serde(default = "default_jwt_access_expiry")]
    pub jwt_access_token_expiry_secs: u64,
    /// Deployment environment. `development` exposes internal error details.
    #[serde(default = "default_environment")]
    pub environment: String,
}

fn default_jwt_access_expiry() -> u64 {
    86400 // 24 hours
}

fn default_environment() -> String {
    "production".to_string()
}

impl WebConfig {
    /// Whether internal error messages may be returned to clients.
    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
    }
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            cors_origins: vec![],
            jwt_secret: String::new(),
            jwt_access_token_expiry_secs: default_jwt_access_expiry(),
            environment: default_environment(),
        }
    }
}

/// Default administrator seeded at start-up.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
    /// Whether to create the administrator when it does not exist.
    #[serde(default = "default_admin_enabled")]
    pub enabled: bool,
    #[serde(default = "default_admin_name")]
    pub name: String,
    #[serde(default = "default_admin_email")]
    pub email: String,
    #[serde(default = "default_admin_password")]
    pub password: String,
}

fn default_admin_enabled() -> bool {
    true
}

fn default_admin_name() -> String {
    "Admin User".to_string()
}

fn default_admin_email() -> String {
    "admin@example.com".to_string()
}

fn default_admin_password() -> String {
    "Admin@123".to_string()
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: default_admin_enabled(),
            name: default_admin_name(),
            email: default_admin_email(),
            password: default_admin_password(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// HTTP listener configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// File storage configuration.
    #[serde(default)]
    pub files: FilesConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Web API configuration.
    #[serde(default)]
    pub web: WebConfig,
    /// Default administrator.
    #[serde(default)]
    pub admin: AdminConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(DriveError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| DriveError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `DRIVEBOX_JWT_SECRET`: Override the JWT secret key
    /// - `DRIVEBOX_ENV`: Override the deployment environment
    ///
    /// Empty values are ignored.
    pub fn apply_env_overrides(&mut self) {
        if let Some(secret) = non_empty_env(ENV_JWT_SECRET) {
            self.web.jwt_secret = secret;
        }
        if let Some(environment) = non_empty_env(ENV_ENVIRONMENT) {
            self.web.environment = environment;
        }
    }

    /// Validate the configuration.
    ///
    /// Returns an error if:
    /// - the JWT secret is not set
    /// - the token lifetime or the upload cap is zero
    pub fn validate(&self) -> Result<()> {
        if self.web.jwt_secret.is_empty() {
            return Err(DriveError::Config(format!(
                "jwt_secret is not set. Set it in config.toml or via {ENV_JWT_SECRET} environment variable."
            )));
        }
        if self.web.jwt_access_token_expiry_secs == 0 {
            return Err(DriveError::Config(
                "jwt_access_token_expiry_secs must be greater than zero".to_string(),
            ));
        }
        if self.files.max_upload_size_mb == 0 {
            return Err(DriveError::Config(
                "max_upload_size_mb must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.database.path, "data/drivebox.db");
        assert_eq!(config.files.storage_path, "uploads");
        assert_eq!(config.files.max_upload_size_mb, 100);
        assert!(config.files.serve_public);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.file, "logs/drivebox.log");
        assert!(config.web.cors_origins.is_empty());
        assert!(config.web.jwt_secret.is_empty());
        assert_eq!(config.web.jwt_access_token_expiry_secs, 86400);
        assert_eq!(config.web.environment, "production");
        assert!(config.admin.enabled);
        assert_eq!(config.admin.name, "Admin User");
        assert_eq!(config.admin.email, "admin@example.com");
        assert_eq!(config.admin.password, "Admin@123");
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[server]
host = "127.0.0.1"
port = 8080

[database]
path = "/var/lib/drivebox/db.sqlite"

[files]
storage_path = "/srv/uploads"
max_upload_size_mb = 25
serve_public = false

[logging]
level = "debug"
file = "/var/log/drivebox.log"

[web]
cors_origins = ["http://localhost:3000"]
jwt_secret = "super-secret"
jwt_access_token_expiry_secs = 3600
environment = "development"

[admin]
enabled = false
name = "Root"
email = "root@example.org"
password = "Root1234"
"#;

        let config = Config::parse(toml).unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.database.path, "/var/lib/drivebox/db.sqlite");
        assert_eq!(config.files.storage_path, "/srv/uploads");
        assert_eq!(config.files.max_upload_size_mb, 25);
        assert!(!config.files.serve_public);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.file, "/var/log/drivebox.log");
        assert_eq!(config.web.cors_origins, vec!["http://localhost:3000"]);
        assert_eq!(config.web.jwt_secret, "super-secret");
        assert_eq!(config.web.jwt_access_token_expiry_secs, 3600);
        assert!(config.web.is_development());
        assert!(!config.admin.enabled);
        assert_eq!(config.admin.name, "Root");
        assert_eq!(config.admin.email, "root@example.org");
        assert_eq!(config.admin.password, "Root1234");
    }

    #[test]
    fn test_parse_partial_config() {
        let toml = r#"
[server]
port = 9000

[files]
max_upload_size_mb = 1
"#;

        let config = Config::parse(toml).unwrap();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.files.max_upload_size_mb, 1);
        assert_eq!(config.files.storage_path, "uploads");
        assert_eq!(config.database.path, "data/drivebox.db");
    }

    #[test]
    fn test_parse_empty_config() {
        let config = Config::parse("").unwrap();

        assert_eq!(config.server.port, 5000);
        assert_eq!(config.web.jwt_access_token_expiry_secs, 86400);
        assert!(config.admin.enabled);
    }

    #[test]
    fn test_parse_invalid_config() {
        let result = Config::parse("[server]\nport = \"not a number\"");

        if let Err(DriveError::Config(msg)) = result {
            assert!(msg.contains("config parse error"));
        } else {
            panic!("Expected Config error");
        }
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = Config::load("nonexistent.toml");

        assert!(matches!(result, Err(DriveError::Io(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[web]\njwt_secret = \"from-file\"\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.web.jwt_secret, "from-file");
    }

    #[test]
    fn test_max_upload_bytes() {
        let mut files = FilesConfig::default();
        assert_eq!(files.max_upload_bytes(), 100 * 1024 * 1024);

        files.max_upload_size_mb = 1;
        assert_eq!(files.max_upload_bytes(), 1024 * 1024);
    }

    #[test]
    fn test_is_development() {
        let mut web = WebConfig::default();
        assert!(!web.is_development());

        web.environment = "Development".to_string();
        assert!(web.is_development());
    }

    // Both variables are exercised in one test so parallel tests never race on them.
    #[test]
    fn test_apply_env_overrides() {
        let original_secret = std::env::var(ENV_JWT_SECRET).ok();
        let original_env = std::env::var(ENV_ENVIRONMENT).ok();

        std::env::set_var(ENV_JWT_SECRET, "env-secret-key");
        std::env::set_var(ENV_ENVIRONMENT, "development");

        let mut config = Config::default();
        config.apply_env_overrides();
        assert_eq!(config.web.jwt_secret, "env-secret-key");
        assert_eq!(config.web.environment, "development");

        // Empty values do not override.
        std::env::set_var(ENV_JWT_SECRET, "");
        std::env::set_var(ENV_ENVIRONMENT, "");

        let mut config = Config::default();
        config.web.jwt_secret = "original-secret".to_string();
        config.apply_env_overrides();
        assert_eq!(config.web.jwt_secret, "original-secret");
        assert_eq!(config.web.environment, "production");

        match original_secret {
            Some(val) => std::env::set_var(ENV_JWT_SECRET, val),
            None => std::env::remove_var(ENV_JWT_SECRET),
        }
        match original_env {
            Some(val) => std::env::set_var(ENV_ENVIRONMENT, val),
            None => std::env::remove_var(ENV_ENVIRONMENT),
        }
    }

    #[test]
    fn test_validate_no_secret() {
        let config = Config::default();

        let result = config.validate();
        if let Err(DriveError::Config(msg)) = result {
            assert!(msg.contains("jwt_secret"));
        } else {
            panic!("Expected Config error");
        }
    }

    #[test]
    fn test_validate_with_secret() {
        let mut config = Config::default();
        config.web.jwt_secret = "secret".to_string();

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_upload_size() {
        let mut config = Config::default();
        config.web.jwt_secret = "secret".to_string();
        config.files.max_upload_size_mb = 0;

        assert!(matches!(config.validate(), Err(DriveError::Config(_))));
    }

    #[test]
    fn test_validate_zero_token_lifetime() {
        let mut config = Config::default();
        config.web.jwt_secret = "secret".to_string();
        config.web.jwt_access_token_expiry_secs = 0;

        assert!(matches!(config.validate(), Err(DriveError::Config(_))));
    }
}
