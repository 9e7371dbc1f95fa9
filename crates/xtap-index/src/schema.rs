use rusqlite::Connection;

use crate::{Error, Result};

// Schema version (increment when changing table definitions)
pub const SCHEMA_VERSION: i32 = 1;

// A database written by a different schema version is refused; captured rows
// are never dropped.
//
// Timestamps are fixed-width RFC 3339 UTC strings with microseconds; lexical
// order is chronological order, which every ORDER BY below relies on.

pub fn init_schema(conn: &Connection) -> Result<()> {
    let current_version: i32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;

    if current_version != 0 && current_version != SCHEMA_VERSION {
        return Err(Error::Query(format!(
            "database schema version {} is not supported (expected {})",
            current_version, SCHEMA_VERSION
        )));
    }

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS credentials (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            version INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS posts (
            post_id TEXT PRIMARY KEY,
            username TEXT NOT NULL,
            name TEXT NOT NULL,
            text TEXT NOT NULL,
            created_at TEXT,
            is_long_form BOOLEAN NOT NULL DEFAULT 0,
            first_seen_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS engagements (
            post_id TEXT NOT NULL,
            captured_at TEXT NOT NULL,
            likes INTEGER NOT NULL,
            retweets INTEGER NOT NULL,
            replies INTEGER NOT NULL,
            views INTEGER NOT NULL,
            following BOOLEAN NOT NULL DEFAULT 0,
            PRIMARY KEY (post_id, captured_at),
            FOREIGN KEY (post_id) REFERENCES posts(post_id)
        );

        CREATE TABLE IF NOT EXISTS requests (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            fingerprint TEXT NOT NULL UNIQUE,
            timestamp TEXT NOT NULL,
            method TEXT NOT NULL,
            url TEXT NOT NULL,
            status INTEGER,
            headers TEXT,
            request_body TEXT,
            body TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_posts_username ON posts(username);
        CREATE INDEX IF NOT EXISTS idx_engagements_captured ON engagements(captured_at DESC);
        CREATE INDEX IF NOT EXISTS idx_requests_ts ON requests(timestamp DESC);
        "#,
    )?;

    conn.execute(&format!("PRAGMA user_version = {}", SCHEMA_VERSION), [])?;

    Ok(())
}
