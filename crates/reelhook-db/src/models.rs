//! Rust structs mapping to database tables.
//!
//! Rows are read through `from_row`; a [`ContentRecord`] is assembled from
//! its `contents` row plus the variant rows that belong to it.

use reelhook_common::{ContentId, ContentKind, MediaKind};
use serde::Serialize;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// helpers
// ---------------------------------------------------------------------------

fn conversion_error(
    idx: usize,
    e: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
}

/// Parse a UUID-based ID from a text column.
fn parse_id<T: From<Uuid>>(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<T> {
    let s: String = row.get(idx)?;
    let uuid = Uuid::parse_str(&s).map_err(|e| conversion_error(idx, e))?;
    Ok(T::from(uuid))
}

/// Parse a lowercase enum column through its `FromStr`.
fn parse_enum<T>(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<T>
where
    T: std::str::FromStr<Err = reelhook_common::Error>,
{
    let s: String = row.get(idx)?;
    s.parse().map_err(|e| conversion_error(idx, e))
}

/// Parse a JSON string array column.
fn parse_json_list(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<Vec<String>> {
    let s: String = row.get(idx)?;
    serde_json::from_str(&s).map_err(|e| conversion_error(idx, e))
}

fn opt_u32(v: Option<i64>) -> Option<u32> {
    v.and_then(|n| u32::try_from(n).ok())
}

// ---------------------------------------------------------------------------
// Content
// ---------------------------------------------------------------------------

/// Canonical metadata from the external catalog.
///
/// A placeholder record has `catalog_id == None` and otherwise empty fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ContentMetadata {
    pub catalog_id: Option<i64>,
    pub poster_url: Option<String>,
    pub backdrop_url: Option<String>,
    pub overview: String,
    pub release_date: Option<String>,
    pub rating: Option<f64>,
    pub genres: Vec<String>,
    pub trailer_key: Option<String>,
}

/// Admin-set flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ContentFlags {
    pub is_trending: bool,
    pub is_coming_soon: bool,
}

/// A movie file or a single episode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaVariant {
    pub season: Option<u32>,
    pub episode: Option<u32>,
    pub quality: String,
    pub media_ref: String,
    pub size_bytes: i64,
    pub media_kind: MediaKind,
    pub updated_at: String,
}

impl MediaVariant {
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            season: opt_u32(row.get(0)?),
            episode: opt_u32(row.get(1)?),
            quality: row.get(2)?,
            media_ref: row.get(3)?,
            size_bytes: row.get(4)?,
            media_kind: parse_enum(row, 5)?,
            updated_at: row.get(6)?,
        })
    }
}

/// A whole season in one upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeasonPackVariant {
    pub season: u32,
    pub quality: String,
    pub media_ref: String,
    pub size_bytes: i64,
    pub media_kind: MediaKind,
    pub updated_at: String,
}

impl SeasonPackVariant {
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        let season: i64 = row.get(0)?;
        Ok(Self {
            season: u32::try_from(season).map_err(|e| conversion_error(0, e))?,
            quality: row.get(1)?,
            media_ref: row.get(2)?,
            size_bytes: row.get(3)?,
            media_kind: parse_enum(row, 4)?,
            updated_at: row.get(5)?,
        })
    }
}

/// Kind-specific part of a record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ContentBody {
    Movie {
        files: Vec<MediaVariant>,
    },
    Series {
        episodes: Vec<MediaVariant>,
        season_packs: Vec<SeasonPackVariant>,
    },
}

impl ContentBody {
    /// An empty body of the given kind.
    pub fn empty(kind: ContentKind) -> Self {
        match kind {
            ContentKind::Movie => Self::Movie { files: Vec::new() },
            ContentKind::Series => Self::Series {
                episodes: Vec::new(),
                season_packs: Vec::new(),
            },
        }
    }

    pub fn kind(&self) -> ContentKind {
        match self {
            Self::Movie { .. } => ContentKind::Movie,
            Self::Series { .. } => ContentKind::Series,
        }
    }

    /// Total number of stored variants (files, episodes and packs).
    pub fn variant_count(&self) -> usize {
        match self {
            Self::Movie { files } => files.len(),
            Self::Series {
                episodes,
                season_packs,
            } => episodes.len() + season_packs.len(),
        }
    }
}

/// A durable catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentRecord {
    pub id: ContentId,
    pub title: String,
    pub metadata: ContentMetadata,
    pub languages: Vec<String>,
    pub flags: ContentFlags,
    pub unresolved: bool,
    pub version: i64,
    pub created_at: String,
    pub updated_at: String,
    #[serde(flatten)]
    pub body: ContentBody,
}

impl ContentRecord {
    pub fn kind(&self) -> ContentKind {
        self.body.kind()
    }
}

/// The `contents` row of a record, before its variants are attached.
#[derive(Debug, Clone)]
pub(crate) struct ContentRow {
    pub id: ContentId,
    pub kind: ContentKind,
    pub title: String,
    pub metadata: ContentMetadata,
    pub languages: Vec<String>,
    pub flags: ContentFlags,
    pub unresolved: bool,
    pub version: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl ContentRow {
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: parse_id(row, 0)?,
            kind: parse_enum(row, 1)?,
            title: row.get(2)?,
            metadata: ContentMetadata {
                catalog_id: row.get(3)?,
                poster_url: row.get(4)?,
                backdrop_url: row.get(5)?,
                overview: row.get(6)?,
                release_date: row.get(7)?,
                rating: row.get(8)?,
                genres: parse_json_list(row, 9)?,
                trailer_key: row.get(10)?,
            },
            languages: parse_json_list(row, 11)?,
            flags: ContentFlags {
                is_trending: row.get(12)?,
                is_coming_soon: row.get(13)?,
            },
            unresolved: row.get(14)?,
            version: row.get(15)?,
            created_at: row.get(16)?,
            updated_at: row.get(17)?,
        })
    }

    pub fn into_record(self, body: ContentBody) -> ContentRecord {
        ContentRecord {
            id: self.id,
            title: self.title,
            metadata: self.metadata,
            languages: self.languages,
            flags: self.flags,
            unresolved: self.unresolved,
            version: self.version,
            created_at: self.created_at,
            updated_at: self.updated_at,
            body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_kind_and_count() {
        let body = ContentBody::empty(ContentKind::Series);
        assert_eq!(body.kind(), ContentKind::Series);
        assert_eq!(body.variant_count(), 0);

        let body = ContentBody::Movie {
            files: vec![MediaVariant {
                season: None,
                episode: None,
                quality: "1080p".into(),
                media_ref: "file-1".into(),
                size_bytes: 1,
                media_kind: MediaKind::Video,
                updated_at: "now".into(),
            }],
        };
        assert_eq!(body.kind(), ContentKind::Movie);
        assert_eq!(body.variant_count(), 1);
    }

    #[test]
    fn test_record_serializes_with_kind_tag() {
        let record = ContentRecord {
            id: ContentId::new(),
            title: "Dark".into(),
            metadata: ContentMetadata::default(),
            languages: vec![],
            flags: ContentFlags::default(),
            unresolved: true,
            version: 1,
            created_at: "now".into(),
            updated_at: "now".into(),
            body: ContentBody::empty(ContentKind::Series),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["kind"], "series");
        assert!(json["episodes"].as_array().unwrap().is_empty());
    }
}
