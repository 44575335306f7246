//! Web server for drivebox.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;

use crate::config::Config;
use crate::file::FileStorage;
use crate::{DriveError, Result};

use super::handlers::{AppState, SharedDatabase};
use super::middleware::JwtState;
use super::router::{create_router, create_swagger_router, create_uploads_router};

/// Web server for the API.
pub struct WebServer {
    /// Server address.
    addr: SocketAddr,
    /// Application state.
    app_state: Arc<AppState>,
    /// JWT state.
    jwt_state: Arc<JwtState>,
    /// Allowed CORS origins.
    cors_origins: Vec<String>,
    /// Whether `/uploads` is served.
    serve_public: bool,
}

impl WebServer {
    /// Create a new web server.
    pub fn new(config: &Config, db: SharedDatabase, file_storage: FileStorage) -> Result<Self> {
        let addr = format!("{}:{}", config.server.host, config.server.port)
            .parse::<SocketAddr>()
            .map_err(|e| {
                DriveError::Config(format!(
                    "invalid server address {}:{}: {e}",
                    config.server.host, config.server.port
                ))
            })?;

        let app_state = AppState::from_config(db, file_storage, config);
        let jwt_state = Arc::new(JwtState::new(&config.web.jwt_secret));

        Ok(Self {
            addr,
            app_state: Arc::new(app_state),
            jwt_state,
            cors_origins: config.web.cors_origins.clone(),
            serve_public: config.files.serve_public,
        })
    }

    /// Get the server address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Build the complete application router.
    pub fn router(&self) -> Router {
        let mut router = create_router(
            self.app_state.clone(),
            self.jwt_state.clone(),
            &self.cors_origins,
        )
        .merge(create_swagger_router());

        if self.serve_public {
            router = router.merge(create_uploads_router(
                self.app_state.file_storage.base_path(),
            ));
        }

        router
    }

    /// Run the web server until Ctrl-C.
    pub async fn run(self) -> std::io::Result<()> {
        let router = self.router();

        let listener = TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;

        tracing::info!("Web server listening on http://{}", local_addr);

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Web server stopped");
        Ok(())
    }

    /// Run the server and return the actual bound address.
    ///
    /// This is useful for testing when binding to port 0.
    pub async fn run_with_addr(self) -> std::io::Result<SocketAddr> {
        let router = self.router();

        let listener = TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;

        tracing::info!("Web server listening on http://{}", local_addr);

        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                tracing::error!("Web server error: {}", e);
            }
        });

        Ok(local_addr)
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;
    use tempfile::TempDir;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn create_test_config() -> Config {
        let mut config = Config::default();
        config.server.host = "127.0.0.1".to_string();
        config.server.port = 0;
        config.web.jwt_secret = "test-secret-key".to_string();
        config
    }

    async fn create_test_server(config: &Config) -> (TempDir, WebServer) {
        let temp_dir = TempDir::new().unwrap();
        let db = Arc::new(Database::open_in_memory().await.unwrap());
        let storage = FileStorage::new(temp_dir.path()).unwrap();
        let server = WebServer::new(config, db, storage).unwrap();
        (temp_dir, server)
    }

    #[tokio::test]
    async fn test_web_server_new() {
        let (_temp_dir, server) = create_test_server(&create_test_config()).await;
        assert_eq!(server.addr().ip().to_string(), "127.0.0.1");
    }

    #[tokio::test]
    async fn test_web_server_invalid_address() {
        let mut config = create_test_config();
        config.server.host = "not an address".to_string();

        let db = Arc::new(Database::open_in_memory().await.unwrap());
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path()).unwrap();

        assert!(matches!(
            WebServer::new(&config, db, storage),
            Err(DriveError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_web_server_run() {
        let (_temp_dir, server) = create_test_server(&create_test_config()).await;
        let addr = server.run_with_addr().await.unwrap();

        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /api/health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();

        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();

        assert!(response.starts_with("HTTP/1.1 200 OK"));
        assert!(response.ends_with(r#"{"status":"ok"}"#));
    }
}
