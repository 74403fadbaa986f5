//! Upsert-by-key for media variants and season packs.
//!
//! Each upsert runs in one `IMMEDIATE` transaction: the variant row is
//! replaced in place when its key already exists and appended otherwise, the
//! parent's language set is merged, and the parent's version and timestamp
//! move forward. Replaying the same upload therefore never adds a second
//! row for the same key.

use chrono::Utc;
use reelhook_common::{ContentId, Error, MediaKind, Result};
use rusqlite::{Connection, OptionalExtension, Transaction, TransactionBehavior};

use super::db_err;
use crate::models::{MediaVariant, SeasonPackVariant};

/// What an upsert did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// A new variant was appended.
    Inserted,
    /// An existing variant with the same key had its media replaced.
    Replaced,
}

impl UpsertOutcome {
    pub fn is_new(&self) -> bool {
        matches!(self, Self::Inserted)
    }
}

/// Incoming movie file or episode. `season`/`episode` are `None` for movies.
#[derive(Debug, Clone)]
pub struct VariantInput {
    pub season: Option<u32>,
    pub episode: Option<u32>,
    pub quality: String,
    pub media_ref: String,
    pub size_bytes: i64,
    pub media_kind: MediaKind,
}

/// Incoming season pack.
#[derive(Debug, Clone)]
pub struct SeasonPackInput {
    pub season: u32,
    pub quality: String,
    pub media_ref: String,
    pub size_bytes: i64,
    pub media_kind: MediaKind,
}

fn begin(conn: &Connection) -> Result<Transaction<'_>> {
    Transaction::new_unchecked(conn, TransactionBehavior::Immediate).map_err(db_err)
}

/// Merge `incoming` into the parent's language set and bump its version.
fn touch_parent(tx: &Transaction<'_>, content_id: ContentId, incoming: &[String], now: &str) -> Result<()> {
    let stored: Option<String> = tx
        .query_row(
            "SELECT languages FROM contents WHERE id = ?1",
            [content_id.to_string()],
            |row| row.get(0),
        )
        .optional()
        .map_err(db_err)?;
    let stored = stored.ok_or_else(|| Error::not_found("content", content_id))?;

    let mut languages: Vec<String> = serde_json::from_str(&stored)?;
    for lang in incoming {
        if !languages.contains(lang) {
            languages.push(lang.clone());
        }
    }

    tx.execute(
        "UPDATE contents SET languages = ?1, version = version + 1, updated_at = ?2 WHERE id = ?3",
        rusqlite::params![serde_json::to_string(&languages)?, now, content_id.to_string()],
    )
    .map_err(db_err)?;
    Ok(())
}

/// Attach a movie file or episode, replacing any variant with the same
/// `(season, episode, quality)` key.
pub fn upsert_media_variant(
    conn: &Connection,
    content_id: ContentId,
    variant: &VariantInput,
    languages: &[String],
) -> Result<UpsertOutcome> {
    let now = Utc::now().to_rfc3339();
    let tx = begin(conn)?;

    touch_parent(&tx, content_id, languages, &now)?;

    let replaced = tx
        .execute(
            "UPDATE media_variants SET media_ref = ?1, size_bytes = ?2, media_kind = ?3, updated_at = ?4
             WHERE content_id = ?5 AND season IS ?6 AND episode IS ?7 AND quality = ?8",
            rusqlite::params![
                variant.media_ref,
                variant.size_bytes,
                variant.media_kind.as_str(),
                now,
                content_id.to_string(),
                variant.season,
                variant.episode,
                variant.quality,
            ],
        )
        .map_err(db_err)?;

    let outcome = if replaced > 0 {
        UpsertOutcome::Replaced
    } else {
        tx.execute(
            "INSERT INTO media_variants (content_id, season, episode, quality, media_ref,
                size_bytes, media_kind, created_at, updated_at)
             VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9)",
            rusqlite::params![
                content_id.to_string(),
                variant.season,
                variant.episode,
                variant.quality,
                variant.media_ref,
                variant.size_bytes,
                variant.media_kind.as_str(),
                &now,
                &now,
            ],
        )
        .map_err(db_err)?;
        UpsertOutcome::Inserted
    };

    tx.commit().map_err(db_err)?;
    Ok(outcome)
}

/// Attach a season pack, replacing any pack with the same
/// `(season, quality)` key.
pub fn upsert_season_pack(
    conn: &Connection,
    content_id: ContentId,
    pack: &SeasonPackInput,
    languages: &[String],
) -> Result<UpsertOutcome> {
    let now = Utc::now().to_rfc3339();
    let tx = begin(conn)?;

    touch_parent(&tx, content_id, languages, &now)?;

    let replaced = tx
        .execute(
            "UPDATE season_packs SET media_ref = ?1, size_bytes = ?2, media_kind = ?3, updated_at = ?4
             WHERE content_id = ?5 AND season = ?6 AND quality = ?7",
            rusqlite::params![
                pack.media_ref,
                pack.size_bytes,
                pack.media_kind.as_str(),
                now,
                content_id.to_string(),
                pack.season,
                pack.quality,
            ],
        )
        .map_err(db_err)?;

    let outcome = if replaced > 0 {
        UpsertOutcome::Replaced
    } else {
        tx.execute(
            "INSERT INTO season_packs (content_id, season, quality, media_ref, size_bytes,
                media_kind, created_at, updated_at)
             VALUES (?1,?2,?3,?4,?5,?6,?7,?8)",
            rusqlite::params![
                content_id.to_string(),
                pack.season,
                pack.quality,
                pack.media_ref,
                pack.size_bytes,
                pack.media_kind.as_str(),
                &now,
                &now,
            ],
        )
        .map_err(db_err)?;
        UpsertOutcome::Inserted
    };

    tx.commit().map_err(db_err)?;
    Ok(outcome)
}

/// Variants of a record, ordered by season, episode and quality.
pub fn list_media_variants(conn: &Connection, content_id: ContentId) -> Result<Vec<MediaVariant>> {
    let mut stmt = conn
        .prepare(
            "SELECT season, episode, quality, media_ref, size_bytes, media_kind, updated_at
             FROM media_variants WHERE content_id = ?1
             ORDER BY season, episode, quality",
        )
        .map_err(db_err)?;
    let rows = stmt
        .query_map([content_id.to_string()], MediaVariant::from_row)
        .map_err(db_err)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(db_err)?;
    Ok(rows)
}

/// Season packs of a record, ordered by season and quality.
pub fn list_season_packs(conn: &Connection, content_id: ContentId) -> Result<Vec<SeasonPackVariant>> {
    let mut stmt = conn
        .prepare(
            "SELECT season, quality, media_ref, size_bytes, media_kind, updated_at
             FROM season_packs WHERE content_id = ?1
             ORDER BY season, quality",
        )
        .map_err(db_err)?;
    let rows = stmt
        .query_map([content_id.to_string()], SeasonPackVariant::from_row)
        .map_err(db_err)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(db_err)?;
    Ok(rows)
}
