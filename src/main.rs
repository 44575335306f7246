use std::process::ExitCode;
use std::sync::Arc;

use tracing::{error, info};

use drivebox::auth::ensure_default_admin;
use drivebox::{Config, Database, FileStorage, WebServer};

const CONFIG_PATH: &str = "config.toml";

#[tokio::main]
async fn main() -> ExitCode {
    // Load configuration
    let config = match Config::load_with_env(CONFIG_PATH) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load {CONFIG_PATH}: {e}");
            eprintln!("Using default configuration.");
            let mut config = Config::default();
            config.apply_env_overrides();
            config
        }
    };

    // Initialize logging
    if let Err(e) = drivebox::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        // Fall back to console-only logging
        drivebox::logging::init_console_only(&config.logging.level);
    }

    info!("drivebox - personal file storage");

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return ExitCode::FAILURE;
    }

    let db = match Database::open(&config.database.path).await {
        Ok(db) => Arc::new(db),
        Err(e) => {
            error!("Failed to open database {}: {}", config.database.path, e);
            return ExitCode::FAILURE;
        }
    };

    let storage = match FileStorage::new(&config.files.storage_path) {
        Ok(storage) => storage,
        Err(e) => {
            error!(
                "Failed to initialize file storage at {}: {}",
                config.files.storage_path, e
            );
            return ExitCode::FAILURE;
        }
    };
    info!("File storage initialized at: {}", config.files.storage_path);

    if let Err(e) = ensure_default_admin(db.pool(), &storage, &config.admin).await {
        error!("Failed to create default admin: {}", e);
    }

    let server = match WebServer::new(&config, db, storage) {
        Ok(server) => server,
        Err(e) => {
            error!("Failed to configure web server: {}", e);
            return ExitCode::FAILURE;
        }
    };

    info!(
        "Server configured on {}:{}",
        config.server.host, config.server.port
    );

    if let Err(e) = server.run().await {
        error!("Web server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
