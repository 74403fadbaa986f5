//! Resolve a parsed upload against the catalog and attach its media.
//!
//! The merge key is the catalog id when metadata resolved, otherwise the
//! case-insensitive title among placeholder records of the same kind. The
//! parent is created or fetched in one statement, then the media is
//! upserted by its variant key, so replays and concurrent deliveries of the
//! same upload converge on one record holding one variant.

use reelhook_common::{ContentId, Result};
use reelhook_db::queries::contents::{self, NewContent};
use reelhook_db::queries::variants::{self, SeasonPackInput, UpsertOutcome, VariantInput};
use reelhook_db::{get_conn, DbPool};
use reelhook_parser::{ContentType, ParsedFilename};
use serde::Serialize;
use tracing::{debug, info};

use super::event::MediaAttachment;
use crate::metadata::provider::{placeholder_metadata, CatalogMetadata};

/// What a merge did. Also the payload handed to notification sinks.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeOutcome {
    pub content_id: ContentId,
    pub title: String,
    pub poster_url: Option<String>,
    pub is_new_record: bool,
    pub is_new_variant: bool,
    pub variant_summary: String,
}

impl MergeOutcome {
    /// Whether anything visible changed.
    pub fn is_announceable(&self) -> bool {
        self.is_new_record || self.is_new_variant
    }
}

/// Store-backed dedup/merge engine.
#[derive(Clone)]
pub struct MergeEngine {
    pool: DbPool,
}

impl MergeEngine {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Merge one upload into the catalog.
    ///
    /// Without metadata the record is a placeholder: the parsed title,
    /// flagged unresolved, no poster or genres.
    pub fn merge(
        &self,
        parsed: &ParsedFilename,
        metadata: Option<&CatalogMetadata>,
        media: &MediaAttachment,
    ) -> Result<MergeOutcome> {
        let kind = parsed.content_type.content_kind();
        let new = match metadata {
            Some(meta) => NewContent {
                kind,
                title: if meta.title.trim().is_empty() {
                    parsed.title.clone()
                } else {
                    meta.title.clone()
                },
                metadata: meta.to_content_metadata(),
            },
            None => NewContent {
                kind,
                title: parsed.title.clone(),
                metadata: placeholder_metadata(),
            },
        };

        let conn = get_conn(&self.pool)?;
        let (record, is_new_record) = contents::insert_or_get(&conn, &new)?;

        let upsert = match parsed.content_type {
            ContentType::SeriesPack => variants::upsert_season_pack(
                &conn,
                record.id,
                &SeasonPackInput {
                    season: parsed.season.unwrap_or(1),
                    quality: parsed.quality.clone(),
                    media_ref: media.media_ref.clone(),
                    size_bytes: media.size_bytes,
                    media_kind: media.media_kind,
                },
                &parsed.languages,
            )?,
            ContentType::SeriesEpisode | ContentType::Movie => variants::upsert_media_variant(
                &conn,
                record.id,
                &VariantInput {
                    season: parsed.season,
                    episode: parsed.episode,
                    quality: parsed.quality.clone(),
                    media_ref: media.media_ref.clone(),
                    size_bytes: media.size_bytes,
                    media_kind: media.media_kind,
                },
                &parsed.languages,
            )?,
        };

        let outcome = MergeOutcome {
            content_id: record.id,
            title: record.title.clone(),
            poster_url: record.metadata.poster_url.clone(),
            is_new_record,
            is_new_variant: upsert.is_new(),
            variant_summary: parsed.variant_summary(),
        };

        if is_new_record {
            info!(
                content_id = %outcome.content_id,
                title = %outcome.title,
                kind = %kind,
                unresolved = record.unresolved,
                "Created content record"
            );
        }
        match upsert {
            UpsertOutcome::Inserted => info!(
                content_id = %outcome.content_id,
                variant = %outcome.variant_summary,
                "Attached new variant"
            ),
            UpsertOutcome::Replaced => debug!(
                content_id = %outcome.content_id,
                variant = %outcome.variant_summary,
                "Replaced existing variant"
            ),
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelhook_common::{ContentKind, MediaKind};
    use reelhook_db::{init_memory_pool, ContentBody};
    use reelhook_parser::parse;

    fn media(media_ref: &str) -> MediaAttachment {
        MediaAttachment {
            media_ref: media_ref.to_string(),
            size_bytes: 1_000,
            media_kind: MediaKind::Video,
        }
    }

    fn metadata(catalog_id: i64, title: &str) -> CatalogMetadata {
        CatalogMetadata {
            catalog_id,
            title: title.to_string(),
            poster_url: Some(format!("https://image.tmdb.org/t/p/w500/{catalog_id}.jpg")),
            backdrop_url: None,
            overview: "overview".into(),
            release_date: None,
            rating: Some(7.0),
            genres: vec!["Drama".into()],
            trailer_key: None,
        }
    }

    fn engine() -> MergeEngine {
        MergeEngine::new(init_memory_pool().unwrap())
    }

    fn load(engine: &MergeEngine, id: ContentId) -> reelhook_db::ContentRecord {
        let conn = get_conn(engine.pool()).unwrap();
        contents::get_content(&conn, id).unwrap().unwrap()
    }

    #[test]
    fn test_replay_replaces_variant() {
        let engine = engine();
        let parsed = parse("Pathaan.2023.1080p.WEB-DL.Hindi.mkv").unwrap();
        let meta = metadata(864692, "Pathaan");

        let first = engine.merge(&parsed, Some(&meta), &media("ref-1")).unwrap();
        assert!(first.is_new_record);
        assert!(first.is_new_variant);

        let second = engine.merge(&parsed, Some(&meta), &media("ref-2")).unwrap();
        assert_eq!(second.content_id, first.content_id);
        assert!(!second.is_new_record);
        assert!(!second.is_new_variant);
        assert!(!second.is_announceable());

        let record = load(&engine, first.content_id);
        match record.body {
            ContentBody::Movie { files } => {
                assert_eq!(files.len(), 1);
                assert_eq!(files[0].quality, "1080p");
                assert_eq!(files[0].media_ref, "ref-2");
            }
            other => panic!("expected movie body, got {other:?}"),
        }
    }

    #[test]
    fn test_new_quality_appends_variant() {
        let engine = engine();
        let meta = metadata(864692, "Pathaan");
        let hd = parse("Pathaan.2023.1080p.mkv").unwrap();
        let sd = parse("Pathaan.2023.480p.mkv").unwrap();

        let a = engine.merge(&hd, Some(&meta), &media("a")).unwrap();
        let b = engine.merge(&sd, Some(&meta), &media("b")).unwrap();
        assert_eq!(a.content_id, b.content_id);
        assert!(b.is_new_variant);
        assert_eq!(load(&engine, a.content_id).body.variant_count(), 2);
    }

    #[test]
    fn test_placeholder_record() {
        let engine = engine();
        let parsed = parse("Xyzabc123.720p.mkv").unwrap();

        let outcome = engine.merge(&parsed, None, &media("r")).unwrap();
        assert_eq!(outcome.title, "Xyzabc123");
        assert_eq!(outcome.poster_url, None);

        let record = load(&engine, outcome.content_id);
        assert!(record.unresolved);
        assert_eq!(record.metadata.catalog_id, None);
        assert!(record.metadata.genres.is_empty());
    }

    #[test]
    fn test_placeholder_title_match_is_case_insensitive() {
        let engine = engine();
        let a = engine
            .merge(&parse("Xyzabc.S01E01.mkv").unwrap(), None, &media("a"))
            .unwrap();
        let b = engine
            .merge(&parse("XYZABC.S01E02.mkv").unwrap(), None, &media("b"))
            .unwrap();
        assert_eq!(a.content_id, b.content_id);
        assert!(b.is_new_variant);
    }

    #[test]
    fn test_episodes_and_packs_share_series() {
        let engine = engine();
        let meta = metadata(71446, "Money Heist");

        let ep = engine
            .merge(&parse("Money.Heist.S03E01.720p.mkv").unwrap(), Some(&meta), &media("e"))
            .unwrap();
        let pack = engine
            .merge(
                &parse("Money.Heist.S03.Complete.Pack.720p.mkv").unwrap(),
                Some(&meta),
                &media("p"),
            )
            .unwrap();
        assert_eq!(ep.content_id, pack.content_id);
        assert_eq!(pack.variant_summary, "Season 3 pack 720p");

        let record = load(&engine, ep.content_id);
        assert_eq!(record.kind(), ContentKind::Series);
        match record.body {
            ContentBody::Series {
                episodes,
                season_packs,
            } => {
                assert_eq!(episodes.len(), 1);
                assert_eq!(season_packs.len(), 1);
                assert_eq!(season_packs[0].season, 3);
            }
            other => panic!("expected series body, got {other:?}"),
        }
    }

    #[test]
    fn test_same_catalog_id_different_kind_stays_separate() {
        let engine = engine();
        let meta = metadata(1399, "Shared Id");

        let movie = engine
            .merge(&parse("Shared.Id.2011.mkv").unwrap(), Some(&meta), &media("m"))
            .unwrap();
        let series = engine
            .merge(&parse("Shared.Id.S01E01.mkv").unwrap(), Some(&meta), &media("s"))
            .unwrap();
        assert_ne!(movie.content_id, series.content_id);
    }

    #[test]
    fn test_languages_accumulate() {
        let engine = engine();
        let meta = metadata(864692, "Pathaan");

        let a = engine
            .merge(&parse("Pathaan.2023.1080p.Hindi.mkv").unwrap(), Some(&meta), &media("a"))
            .unwrap();
        engine
            .merge(&parse("Pathaan.2023.720p.Tamil.mkv").unwrap(), Some(&meta), &media("b"))
            .unwrap();

        assert_eq!(load(&engine, a.content_id).languages, vec!["Hindi", "Tamil"]);
    }

    #[test]
    fn test_outcome_serializes_camel_case() {
        let engine = engine();
        let outcome = engine
            .merge(&parse("Dark.S01E01.mkv").unwrap(), None, &media("r"))
            .unwrap();
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["isNewRecord"], true);
        assert_eq!(json["variantSummary"], "S01E01 HD");
        assert!(json.get("contentId").is_some());
    }
}
