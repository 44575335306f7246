//! API handlers for the Web API.

pub mod auth;
pub mod file;
pub mod health;

pub use auth::*;
pub use file::*;
pub use health::*;
