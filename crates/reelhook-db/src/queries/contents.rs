//! Content record lookup, creation and admin edits.

use chrono::Utc;
use reelhook_common::{ContentId, ContentKind, Error, Result};
use rusqlite::{Connection, OptionalExtension};

use super::{db_err, is_constraint_violation, variants};
use crate::models::{ContentBody, ContentFlags, ContentMetadata, ContentRecord, ContentRow};

/// Column list used in SELECT statements.
const COLS: &str = "id, kind, title, catalog_id, poster_url, backdrop_url, overview,
    release_date, rating, genres, trailer_key, languages, is_trending,
    is_coming_soon, unresolved, version, created_at, updated_at";

/// Merge key used for case-insensitive placeholder matching.
pub fn title_key(title: &str) -> String {
    title.trim().to_lowercase()
}

/// Fields for a record that does not exist yet.
#[derive(Debug, Clone)]
pub struct NewContent {
    pub kind: ContentKind,
    pub title: String,
    pub metadata: ContentMetadata,
}

impl NewContent {
    /// Whether this will be a placeholder (no catalog id).
    pub fn is_placeholder(&self) -> bool {
        self.metadata.catalog_id.is_none()
    }
}

/// Filter for [`list_contents`].
#[derive(Debug, Clone, Default)]
pub struct ContentFilter {
    pub kind: Option<ContentKind>,
    pub unresolved_only: bool,
    pub title_contains: Option<String>,
    pub limit: Option<i64>,
}

fn load_body(conn: &Connection, id: ContentId, kind: ContentKind) -> Result<ContentBody> {
    Ok(match kind {
        ContentKind::Movie => ContentBody::Movie {
            files: variants::list_media_variants(conn, id)?,
        },
        ContentKind::Series => ContentBody::Series {
            episodes: variants::list_media_variants(conn, id)?,
            season_packs: variants::list_season_packs(conn, id)?,
        },
    })
}

fn assemble(conn: &Connection, row: ContentRow) -> Result<ContentRecord> {
    let body = load_body(conn, row.id, row.kind)?;
    Ok(row.into_record(body))
}

fn query_one(
    conn: &Connection,
    clause: &str,
    params: impl rusqlite::Params,
) -> Result<Option<ContentRecord>> {
    let q = format!("SELECT {COLS} FROM contents WHERE {clause}");
    let row = conn
        .query_row(&q, params, ContentRow::from_row)
        .optional()
        .map_err(db_err)?;
    row.map(|r| assemble(conn, r)).transpose()
}

/// Get a record by id.
pub fn get_content(conn: &Connection, id: ContentId) -> Result<Option<ContentRecord>> {
    query_one(conn, "id = ?1", [id.to_string()])
}

/// Find the resolved record carrying `catalog_id`.
pub fn find_by_catalog_id(
    conn: &Connection,
    kind: ContentKind,
    catalog_id: i64,
) -> Result<Option<ContentRecord>> {
    query_one(
        conn,
        "kind = ?1 AND catalog_id = ?2",
        rusqlite::params![kind.as_str(), catalog_id],
    )
}

/// Find the placeholder whose title matches `title`, ignoring case.
pub fn find_placeholder_by_title(
    conn: &Connection,
    kind: ContentKind,
    title: &str,
) -> Result<Option<ContentRecord>> {
    query_one(
        conn,
        "kind = ?1 AND title_key = ?2 AND catalog_id IS NULL",
        rusqlite::params![kind.as_str(), title_key(title)],
    )
}

/// Look up the record `new` would collide with.
pub fn find_existing(conn: &Connection, new: &NewContent) -> Result<Option<ContentRecord>> {
    match new.metadata.catalog_id {
        Some(catalog_id) => find_by_catalog_id(conn, new.kind, catalog_id),
        None => find_placeholder_by_title(conn, new.kind, &new.title),
    }
}

/// Create a record, or return the one that already owns its merge key.
///
/// The insert and the uniqueness check are one statement, so two callers
/// racing on the same key both end up with the same record. The boolean is
/// `true` only for the caller whose insert created it.
pub fn insert_or_get(conn: &Connection, new: &NewContent) -> Result<(ContentRecord, bool)> {
    let id = ContentId::new();
    let now = Utc::now().to_rfc3339();
    let genres = serde_json::to_string(&new.metadata.genres)?;

    let inserted = conn
        .execute(
            "INSERT INTO contents (id, kind, title, title_key, catalog_id, poster_url,
                backdrop_url, overview, release_date, rating, genres, trailer_key,
                unresolved, created_at, updated_at)
             VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15)
             ON CONFLICT DO NOTHING",
            rusqlite::params![
                id.to_string(),
                new.kind.as_str(),
                new.title,
                title_key(&new.title),
                new.metadata.catalog_id,
                new.metadata.poster_url,
                new.metadata.backdrop_url,
                new.metadata.overview,
                new.metadata.release_date,
                new.metadata.rating,
                genres,
                new.metadata.trailer_key,
                new.is_placeholder(),
                &now,
                &now,
            ],
        )
        .map_err(db_err)?;

    let record = if inserted == 1 {
        get_content(conn, id)?
    } else {
        find_existing(conn, new)?
    };

    record
        .map(|r| (r, inserted == 1))
        .ok_or_else(|| Error::internal(format!("content '{}' vanished after insert", new.title)))
}

/// List records, most recently updated first.
pub fn list_contents(conn: &Connection, filter: &ContentFilter) -> Result<Vec<ContentRecord>> {
    let mut clauses = vec!["1 = 1".to_string()];
    let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

    if let Some(kind) = filter.kind {
        params.push(Box::new(kind.as_str()));
        clauses.push(format!("kind = ?{}", params.len()));
    }
    if filter.unresolved_only {
        clauses.push("unresolved = 1".to_string());
    }
    if let Some(needle) = &filter.title_contains {
        params.push(Box::new(format!("%{}%", title_key(needle))));
        clauses.push(format!("title_key LIKE ?{}", params.len()));
    }
    params.push(Box::new(filter.limit.unwrap_or(-1)));
    let limit_idx = params.len();

    let q = format!(
        "SELECT {COLS} FROM contents WHERE {} ORDER BY updated_at DESC, title ASC LIMIT ?{limit_idx}",
        clauses.join(" AND ")
    );
    let mut stmt = conn.prepare(&q).map_err(db_err)?;
    let rows = stmt
        .query_map(
            rusqlite::params_from_iter(params.iter().map(|p| p.as_ref())),
            ContentRow::from_row,
        )
        .map_err(db_err)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(db_err)?;

    rows.into_iter().map(|r| assemble(conn, r)).collect()
}

/// Set the admin flags. Returns `false` if the record does not exist.
pub fn set_flags(conn: &Connection, id: ContentId, flags: ContentFlags) -> Result<bool> {
    let now = Utc::now().to_rfc3339();
    let n = conn
        .execute(
            "UPDATE contents SET is_trending = ?1, is_coming_soon = ?2,
                version = version + 1, updated_at = ?3
             WHERE id = ?4",
            rusqlite::params![flags.is_trending, flags.is_coming_soon, now, id.to_string()],
        )
        .map_err(db_err)?;
    Ok(n > 0)
}

/// Replace a record's title and catalog metadata, if it is still at
/// `expected_version`.
///
/// # Errors
///
/// - [`Error::NotFound`] if the record is gone.
/// - [`Error::Conflict`] if the version moved on, or another record of the
///   same kind already owns the catalog id (or, for a placeholder, the
///   title).
pub fn apply_metadata(
    conn: &Connection,
    id: ContentId,
    expected_version: i64,
    title: &str,
    metadata: &ContentMetadata,
) -> Result<ContentRecord> {
    let now = Utc::now().to_rfc3339();
    let genres = serde_json::to_string(&metadata.genres)?;

    let result = conn.execute(
        "UPDATE contents SET title = ?1, title_key = ?2, catalog_id = ?3, poster_url = ?4,
            backdrop_url = ?5, overview = ?6, release_date = ?7, rating = ?8, genres = ?9,
            trailer_key = ?10, unresolved = ?11, version = version + 1, updated_at = ?12
         WHERE id = ?13 AND version = ?14",
        rusqlite::params![
            title,
            title_key(title),
            metadata.catalog_id,
            metadata.poster_url,
            metadata.backdrop_url,
            metadata.overview,
            metadata.release_date,
            metadata.rating,
            genres,
            metadata.trailer_key,
            metadata.catalog_id.is_none(),
            now,
            id.to_string(),
            expected_version,
        ],
    );

    let n = match result {
        Ok(n) => n,
        Err(e) if is_constraint_violation(&e) => {
            return Err(Error::conflict(match metadata.catalog_id {
                Some(catalog_id) => format!("another record already owns catalog id {catalog_id}"),
                None => format!("another placeholder is already titled \"{title}\""),
            }))
        }
        Err(e) => return Err(db_err(e)),
    };

    let record = get_content(conn, id)?.ok_or_else(|| Error::not_found("content", id))?;
    if n == 0 {
        return Err(Error::conflict(format!(
            "content {id} is at version {}, expected {expected_version}",
            record.version
        )));
    }
    Ok(record)
}

/// Delete a record and its variants. Returns `false` if it did not exist.
pub fn delete_content(conn: &Connection, id: ContentId) -> Result<bool> {
    let n = conn
        .execute("DELETE FROM contents WHERE id = ?1", [id.to_string()])
        .map_err(db_err)?;
    Ok(n > 0)
}
