//! Web API module for drivebox.
//!
//! This module provides the REST API: account registration and login,
//! file upload, listing, retrieval and deletion, plus the public uploads
//! path and the OpenAPI document.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod router;
pub mod server;

pub use error::ApiError;
pub use handlers::AppState;
pub use router::create_router;
pub use server::WebServer;
