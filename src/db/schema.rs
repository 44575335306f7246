//! Database schema and migrations for drivebox.
//!
//! Migrations are applied sequentially when the database is first opened or
//! upgraded.

/// Database migrations.
///
/// Each migration is a SQL script that will be executed in order.
/// The schema_version table tracks which migrations have been applied.
pub const MIGRATIONS: &[&str] = &[
    // v1: users
    r#"
CREATE TABLE users (
    id          TEXT PRIMARY KEY,        -- UUID v4
    name        TEXT NOT NULL,
    email       TEXT NOT NULL UNIQUE,    -- trimmed, lower-cased
    password    TEXT NOT NULL,           -- Argon2 hash
    is_admin    INTEGER NOT NULL DEFAULT 0,
    created_at  TEXT NOT NULL
);
"#,
    // v2: file records
    r#"
CREATE TABLE files (
    id             TEXT PRIMARY KEY,     -- UUID v4
    filename       TEXT NOT NULL,        -- stored name on disk
    original_name  TEXT NOT NULL,
    mime_type      TEXT NOT NULL,
    path           TEXT NOT NULL,
    size           INTEGER NOT NULL,
    user_id        TEXT NOT NULL REFERENCES users(id),
    created_at     TEXT NOT NULL
);

CREATE INDEX idx_files_user_created ON files(user_id, created_at);
"#,
];
