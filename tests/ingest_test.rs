//! End-to-end ingestion through the pipeline with a scripted catalog.

mod common;

use std::sync::Arc;

use assert_matches::assert_matches;
use common::{catalog_entry, StubCatalog, TestHarness};
use reelhook::ingest::{IngestEvent, IngestOutcome, IngestPipeline};
use reelhook::metadata::provider::PLACEHOLDER_OVERVIEW;
use reelhook::metadata::EnrichmentService;
use reelhook::notifications::NotificationManager;
use reelhook_common::{ContentKind, MediaKind};
use reelhook_db::{init_pool, ContentBody};
use reelhook_parser::FilenameParser;

fn movie_catalog() -> StubCatalog {
    StubCatalog::default()
        .with(ContentKind::Movie, catalog_entry(864692, "Pathaan"))
        .with(ContentKind::Series, catalog_entry(1396, "Breaking Bad"))
        .with(ContentKind::Series, catalog_entry(71446, "Money Heist"))
}

// ---------------------------------------------------------------------------
// Resolved uploads
// ---------------------------------------------------------------------------

#[tokio::test]
async fn movie_upload_creates_resolved_record() {
    let h = TestHarness::new(movie_catalog());
    let event = IngestEvent::new("Pathaan.2023.1080p.WEB-DL.Hindi.mkv", "file-1");

    let outcome = h.pipeline.ingest(&event).await;
    let merged = assert_matches!(outcome, IngestOutcome::Accepted(m) => m);
    assert!(merged.is_new_record);
    assert!(merged.is_new_variant);
    assert_eq!(merged.title, "Pathaan");
    assert_eq!(merged.variant_summary, "1080p");
    assert_eq!(
        merged.poster_url.as_deref(),
        Some("https://image.tmdb.org/t/p/w500/864692.jpg")
    );

    let record = h.record(merged.content_id);
    assert!(!record.unresolved);
    assert_eq!(record.metadata.catalog_id, Some(864692));
    assert_eq!(record.languages, vec!["Hindi"]);
    assert_eq!(record.kind(), ContentKind::Movie);
}

#[tokio::test]
async fn replaying_same_upload_keeps_one_variant() {
    let h = TestHarness::new(movie_catalog());
    let event = IngestEvent::new("Pathaan.2023.1080p.WEB-DL.Hindi.mkv", "file-1");

    let first = h.pipeline.ingest(&event).await;
    let second = h.pipeline.ingest(&event).await;

    let first = first.merge_outcome().unwrap().clone();
    let second = second.merge_outcome().unwrap().clone();
    assert_eq!(first.content_id, second.content_id);
    assert!(!second.is_new_record);
    assert!(!second.is_new_variant);

    assert_eq!(h.all_records().len(), 1);
    assert_eq!(h.record(first.content_id).body.variant_count(), 1);
}

#[tokio::test]
async fn redelivery_with_new_reference_replaces_media() {
    let h = TestHarness::new(movie_catalog());

    let first = h
        .pipeline
        .ingest(&IngestEvent::new("Pathaan.2023.1080p.WEB-DL.Hindi.mkv", "old-ref"))
        .await;
    h.pipeline
        .ingest(&IngestEvent::new("Pathaan.2023.1080p.WEB-DL.Hindi.mkv", "new-ref"))
        .await;

    let id = first.merge_outcome().unwrap().content_id;
    let files = assert_matches!(h.record(id).body, ContentBody::Movie { files } => files);
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].quality, "1080p");
    assert_eq!(files[0].media_ref, "new-ref");
}

#[tokio::test]
async fn episodes_and_pack_land_on_one_series() {
    let h = TestHarness::new(movie_catalog());

    let e5 = h
        .pipeline
        .ingest(&IngestEvent::new("Breaking.Bad.S01E05.720p.mkv", "e5"))
        .await;
    let e6 = h
        .pipeline
        .ingest(&IngestEvent::new("Breaking.Bad.S01E06.720p.mkv", "e6"))
        .await;

    let e5 = e5.merge_outcome().unwrap();
    let e6 = e6.merge_outcome().unwrap();
    assert_eq!(e5.content_id, e6.content_id);
    assert!(e6.is_new_variant);
    assert!(!e6.is_new_record);
    assert_eq!(e6.variant_summary, "S01E06 720p");

    let pack = h
        .pipeline
        .ingest(&IngestEvent::new("Money.Heist.S03.Complete.Pack.720p.mkv", "pack"))
        .await;
    let pack = pack.merge_outcome().unwrap();
    let (episodes, packs) = assert_matches!(
        h.record(pack.content_id).body,
        ContentBody::Series { episodes, season_packs } => (episodes, season_packs)
    );
    assert!(episodes.is_empty());
    assert_eq!(packs.len(), 1);
    assert_eq!(packs[0].season, 3);
    assert_eq!(packs[0].quality, "720p");
}

#[tokio::test]
async fn caption_supplies_title() {
    let h = TestHarness::new(movie_catalog());
    let event = IngestEvent {
        filename: "video_2024_01_05.mp4".into(),
        caption: Some("Pathaan (2023) 720p Hindi\n\nJoin our channel".into()),
        media_reference: "doc-1".into(),
        size_bytes: 1_500_000_000,
        media_kind: MediaKind::Document,
    };

    let merged = assert_matches!(h.pipeline.ingest(&event).await, IngestOutcome::Accepted(m) => m);
    assert_eq!(merged.title, "Pathaan");

    let files = assert_matches!(h.record(merged.content_id).body, ContentBody::Movie { files } => files);
    assert_eq!(files[0].quality, "720p");
    assert_eq!(files[0].media_kind, MediaKind::Document);
    assert_eq!(files[0].size_bytes, 1_500_000_000);
}

// ---------------------------------------------------------------------------
// Placeholders
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unknown_title_becomes_placeholder() {
    let h = TestHarness::new(movie_catalog());

    let outcome = h.pipeline.ingest(&IngestEvent::new("Xyzabc123.mkv", "x")).await;
    let merged = assert_matches!(outcome, IngestOutcome::Accepted(m) => m);
    assert!(merged.is_new_record);
    assert_eq!(merged.title, "Xyzabc123");
    assert_eq!(merged.poster_url, None);

    // Single word: no simplified retry.
    assert_eq!(h.catalog.searches(), vec!["Xyzabc123"]);

    let record = h.record(merged.content_id);
    assert!(record.unresolved);
    assert_eq!(record.title, "Xyzabc123");
    assert_eq!(record.metadata.catalog_id, None);
    assert_eq!(record.metadata.poster_url, None);
    assert!(record.metadata.genres.is_empty());
    assert_eq!(record.metadata.overview, PLACEHOLDER_OVERVIEW);
}

#[tokio::test]
async fn multi_word_miss_retries_simplified_title() {
    let h = TestHarness::new(movie_catalog());

    h.pipeline
        .ingest(&IngestEvent::new("Pathaan.Vegamovies.2023.1080p.mkv", "x"))
        .await;

    assert_eq!(h.catalog.searches(), vec!["Pathaan Vegamovies", "Pathaan"]);
    let records = h.all_records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].metadata.catalog_id, Some(864692));
}

#[tokio::test]
async fn placeholders_merge_by_title() {
    let h = TestHarness::new(StubCatalog::default());

    let a = h
        .pipeline
        .ingest(&IngestEvent::new("Xyzabc123.720p.mkv", "a"))
        .await;
    let b = h
        .pipeline
        .ingest(&IngestEvent::new("xyzabc123.1080p.mkv", "b"))
        .await;

    assert_eq!(
        a.merge_outcome().unwrap().content_id,
        b.merge_outcome().unwrap().content_id
    );
    assert_eq!(h.all_records().len(), 1);
}

#[tokio::test]
async fn resolve_applies_late_catalog_match() {
    let h = TestHarness::new(StubCatalog::default());

    let outcome = h
        .pipeline
        .ingest(&IngestEvent::new("Xyzabc123.720p.mkv", "a"))
        .await;
    let id = outcome.merge_outcome().unwrap().content_id;

    let err = h.pipeline.resolve(id, None).await.unwrap_err();
    assert!(err.to_string().contains("No catalog match"));

    h.catalog
        .insert(ContentKind::Movie, catalog_entry(4242, "Xyzabc123"));
    let resolved = h.pipeline.resolve(id, None).await.unwrap();
    assert!(!resolved.unresolved);
    assert_eq!(resolved.metadata.catalog_id, Some(4242));
    assert_eq!(resolved.body.variant_count(), 1);

    // Already resolved: returned unchanged.
    let again = h.pipeline.resolve(id, None).await.unwrap();
    assert_eq!(again.version, resolved.version);

    // Later uploads of the same title now merge by catalog id.
    let next = h
        .pipeline
        .ingest(&IngestEvent::new("Xyzabc123.1080p.mkv", "b"))
        .await;
    assert_eq!(next.merge_outcome().unwrap().content_id, id);
}

#[tokio::test]
async fn corrected_title_resolves_typo_placeholder() {
    let h = TestHarness::new(movie_catalog());

    let outcome = h
        .pipeline
        .ingest(&IngestEvent::new("Pathan.2023.720p.mkv", "typo"))
        .await;
    let id = outcome.merge_outcome().unwrap().content_id;
    assert!(h.record(id).unresolved);

    let resolved = h.pipeline.resolve(id, Some("Pathaan")).await.unwrap();
    assert!(!resolved.unresolved);
    assert_eq!(resolved.title, "Pathaan");
    assert_eq!(resolved.metadata.catalog_id, Some(864692));
    assert_eq!(h.catalog.searches().last().map(String::as_str), Some("Pathaan"));

    // The correct spelling now lands on the same record.
    let next = h
        .pipeline
        .ingest(&IngestEvent::new("Pathaan.2023.1080p.mkv", "hd"))
        .await;
    assert_eq!(next.merge_outcome().unwrap().content_id, id);
    assert_eq!(h.record(id).body.variant_count(), 2);
}

#[tokio::test]
async fn corrected_title_without_match_renames_placeholder() {
    let h = TestHarness::new(StubCatalog::default());

    let outcome = h
        .pipeline
        .ingest(&IngestEvent::new("Xyzabc.720p.mkv", "a"))
        .await;
    let id = outcome.merge_outcome().unwrap().content_id;

    let renamed = h.pipeline.resolve(id, Some("Xyzabc Returns")).await.unwrap();
    assert!(renamed.unresolved);
    assert_eq!(renamed.title, "Xyzabc Returns");
    assert_eq!(renamed.metadata.overview, PLACEHOLDER_OVERVIEW);

    let next = h
        .pipeline
        .ingest(&IngestEvent::new("Xyzabc.Returns.1080p.mkv", "b"))
        .await;
    assert_eq!(next.merge_outcome().unwrap().content_id, id);
}

#[tokio::test]
async fn corrected_title_on_resolved_record_keeps_metadata() {
    let h = TestHarness::new(movie_catalog());

    let outcome = h
        .pipeline
        .ingest(&IngestEvent::new("Pathaan.2023.1080p.mkv", "a"))
        .await;
    let id = outcome.merge_outcome().unwrap().content_id;
    let searches = h.catalog.searches().len();

    let renamed = h.pipeline.resolve(id, Some("Pathaan (Hindi)")).await.unwrap();
    assert_eq!(renamed.title, "Pathaan (Hindi)");
    assert_eq!(renamed.metadata.catalog_id, Some(864692));
    assert_eq!(h.catalog.searches().len(), searches);
}

#[tokio::test]
async fn announce_resends_stored_record() {
    let h = TestHarness::new(movie_catalog());

    let event = IngestEvent::new("Pathaan.2023.1080p.mkv", "a");
    let id = h.pipeline.ingest(&event).await.merge_outcome().unwrap().content_id;
    h.pipeline.ingest(&event).await;
    assert_eq!(h.sink.received().len(), 1);

    let notification = h.pipeline.announce(id).await.unwrap();
    assert_eq!(notification.title, "Pathaan");
    assert_eq!(notification.variant_summary, "1080p");
    assert!(!notification.is_new_record);

    let received = h.sink.received();
    assert_eq!(received.len(), 2);
    assert_eq!(received[1], notification);

    assert!(h
        .pipeline
        .announce(reelhook_common::ContentId::new())
        .await
        .is_err());
}

#[tokio::test]
async fn resolve_unknown_id_fails() {
    let h = TestHarness::new(StubCatalog::default());
    let err = h
        .pipeline
        .resolve(reelhook_common::ContentId::new(), None)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("not found"));
}

// ---------------------------------------------------------------------------
// Rejections and notifications
// ---------------------------------------------------------------------------

#[tokio::test]
async fn untitled_upload_is_rejected_before_storage() {
    let h = TestHarness::new(movie_catalog());

    let outcome = h.pipeline.ingest(&IngestEvent::new("1080p.x264.mkv", "r")).await;
    assert_matches!(outcome, IngestOutcome::Rejected { .. });
    assert!(h.all_records().is_empty());
    assert!(h.catalog.searches().is_empty());
    assert!(h.sink.received().is_empty());
}

#[tokio::test]
async fn only_new_content_is_announced() {
    let h = TestHarness::new(movie_catalog());

    let event = IngestEvent::new("Breaking.Bad.S01E05.720p.mkv", "e5");
    h.pipeline.ingest(&event).await;
    h.pipeline.ingest(&event).await;
    h.pipeline
        .ingest(&IngestEvent::new("Breaking.Bad.S01E05.1080p.mkv", "e5-hd"))
        .await;

    let received = h.sink.received();
    assert_eq!(received.len(), 2);
    assert!(received[0].is_new_record);
    assert!(!received[1].is_new_record);
    assert!(received[1].is_new_variant);
    assert_eq!(received[1].variant_summary, "S01E05 1080p");
}

// ---------------------------------------------------------------------------
// Concurrency
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_deliveries_converge() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("race.db");
    let pool = init_pool(db_path.to_str().unwrap()).unwrap();

    let pipeline = Arc::new(IngestPipeline::new(
        FilenameParser::default(),
        EnrichmentService::new(Arc::new(StubCatalog::default())),
        pool,
        NotificationManager::disabled(),
    ));

    let mut handles = Vec::new();
    for i in 0..8 {
        let pipeline = pipeline.clone();
        handles.push(tokio::spawn(async move {
            pipeline
                .ingest(&IngestEvent::new(
                    "Xyzabc123.S01E01.720p.mkv",
                    format!("ref-{i}"),
                ))
                .await
        }));
    }

    let mut outcomes = Vec::new();
    for handle in handles {
        outcomes.push(handle.await.unwrap());
    }

    let merged: Vec<_> = outcomes.iter().filter_map(|o| o.merge_outcome()).collect();
    assert_eq!(merged.len(), 8);
    assert_eq!(merged.iter().filter(|m| m.is_new_record).count(), 1);
    assert_eq!(merged.iter().filter(|m| m.is_new_variant).count(), 1);
    assert!(merged.iter().all(|m| m.content_id == merged[0].content_id));

    let conn = reelhook_db::get_conn(pipeline.pool()).unwrap();
    let record = reelhook_db::queries::contents::get_content(&conn, merged[0].content_id)
        .unwrap()
        .unwrap();
    assert_eq!(record.body.variant_count(), 1);
}
