//! Embedded SQL migrations and runner.
//!
//! Migrations are stored as `&str` constants and executed in order. A
//! `schema_migrations` table tracks which versions have been applied.

use reelhook_common::{Error, Result};
use rusqlite::Connection;

/// V1: catalog records and their variants.
const V1_INITIAL: &str = r#"
CREATE TABLE contents (
    id             TEXT PRIMARY KEY,
    kind           TEXT NOT NULL,
    title          TEXT NOT NULL,
    title_key      TEXT NOT NULL,
    catalog_id     INTEGER,
    poster_url     TEXT,
    backdrop_url   TEXT,
    overview       TEXT NOT NULL DEFAULT '',
    release_date   TEXT,
    rating         REAL,
    genres         TEXT NOT NULL DEFAULT '[]',
    trailer_key    TEXT,
    languages      TEXT NOT NULL DEFAULT '[]',
    is_trending    INTEGER NOT NULL DEFAULT 0,
    is_coming_soon INTEGER NOT NULL DEFAULT 0,
    unresolved     INTEGER NOT NULL DEFAULT 0,
    version        INTEGER NOT NULL DEFAULT 1,
    created_at     TEXT NOT NULL,
    updated_at     TEXT NOT NULL
);

-- One resolved record per catalog id, one placeholder per title.
CREATE UNIQUE INDEX idx_contents_catalog ON contents(kind, catalog_id)
    WHERE catalog_id IS NOT NULL;
CREATE UNIQUE INDEX idx_contents_placeholder ON contents(kind, title_key)
    WHERE catalog_id IS NULL;
CREATE INDEX idx_contents_updated ON contents(updated_at);

-- Movie files (no season/episode) and single episodes.
CREATE TABLE media_variants (
    id          INTEGER PRIMARY KEY,
    content_id  TEXT NOT NULL REFERENCES contents(id) ON DELETE CASCADE,
    season      INTEGER,
    episode     INTEGER,
    quality     TEXT NOT NULL,
    media_ref   TEXT NOT NULL,
    size_bytes  INTEGER NOT NULL DEFAULT 0,
    media_kind  TEXT NOT NULL DEFAULT 'video',
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);
CREATE UNIQUE INDEX idx_media_variants_key ON media_variants(
    content_id, COALESCE(season, -1), COALESCE(episode, -1), quality
);

CREATE TABLE season_packs (
    id          INTEGER PRIMARY KEY,
    content_id  TEXT NOT NULL REFERENCES contents(id) ON DELETE CASCADE,
    season      INTEGER NOT NULL,
    quality     TEXT NOT NULL,
    media_ref   TEXT NOT NULL,
    size_bytes  INTEGER NOT NULL DEFAULT 0,
    media_kind  TEXT NOT NULL DEFAULT 'document',
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL,
    UNIQUE (content_id, season, quality)
);
"#;

/// Ordered list of (version, sql) pairs.
const MIGRATIONS: &[(i64, &str)] = &[(1, V1_INITIAL)];

/// Run all pending migrations on `conn`.
///
/// Creates the `schema_migrations` tracking table if it does not exist,
/// then applies each outstanding migration inside a transaction.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version    INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
    )
    .map_err(|e| Error::database(format!("Failed to create schema_migrations: {e}")))?;

    for &(version, sql) in MIGRATIONS {
        let already: bool = conn
            .query_row(
                "SELECT COUNT(*) > 0 FROM schema_migrations WHERE version = ?1",
                [version],
                |row| row.get(0),
            )
            .map_err(|e| Error::database(e.to_string()))?;

        if already {
            continue;
        }

        let tx = conn
            .unchecked_transaction()
            .map_err(|e| Error::database(e.to_string()))?;

        tx.execute_batch(sql)
            .map_err(|e| Error::database(format!("Migration V{version} failed: {e}")))?;

        tx.execute("INSERT INTO schema_migrations (version) VALUES (?1)", [version])
            .map_err(|e| Error::database(e.to_string()))?;

        tx.commit().map_err(|e| Error::database(e.to_string()))?;
    }

    Ok(())
}

/// Highest applied migration version, or 0 on a fresh database.
pub fn current_version(conn: &Connection) -> Result<i64> {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )
    .map_err(|e| Error::database(e.to_string()))
}
