//! drivebox - personal file storage service
//!
//! Users register, log in with a bearer token and keep their own files:
//! upload, list, download (with range support) and delete.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod file;
pub mod logging;
pub mod web;

pub use auth::{hash_password, verify_password, PasswordError, ValidationError};
pub use config::Config;
pub use db::{Database, NewUser, User, UserRepository};
pub use error::{DriveError, Result};
pub use file::{FileRecord, FileRepository, FileStorage};
pub use web::WebServer;
