//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which wires an in-memory DB, the default parser
//! and a scripted [`StubCatalog`] into a full [`IngestPipeline`].

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reelhook::ingest::IngestPipeline;
use reelhook::metadata::{CatalogMetadata, EnrichmentService, MetadataProvider, SearchCandidate};
use reelhook::notifications::{Notification, NotificationManager, NotificationSink};
use reelhook_common::{ContentId, ContentKind};
use reelhook_db::queries::contents;
use reelhook_db::{get_conn, init_memory_pool, ContentRecord, DbPool};
use reelhook_parser::FilenameParser;

/// Catalog answering from a fixed title table. Titles are matched
/// case-insensitively; anything else returns no candidates.
#[derive(Default)]
pub struct StubCatalog {
    entries: Mutex<HashMap<(ContentKind, String), CatalogMetadata>>,
    searches: Mutex<Vec<String>>,
}

impl StubCatalog {
    pub fn with(self, kind: ContentKind, metadata: CatalogMetadata) -> Self {
        self.insert(kind, metadata);
        self
    }

    /// Add an entry after construction (e.g. to simulate the catalog
    /// catching up with a new release).
    pub fn insert(&self, kind: ContentKind, metadata: CatalogMetadata) {
        self.entries
            .lock()
            .unwrap()
            .insert((kind, metadata.title.to_lowercase()), metadata);
    }

    pub fn searches(&self) -> Vec<String> {
        self.searches.lock().unwrap().clone()
    }
}

#[async_trait]
impl MetadataProvider for StubCatalog {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn is_available(&self) -> bool {
        true
    }

    async fn search(
        &self,
        title: &str,
        mode: ContentKind,
        _year: Option<&str>,
    ) -> anyhow::Result<Vec<SearchCandidate>> {
        self.searches.lock().unwrap().push(title.to_string());
        let entries = self.entries.lock().unwrap();
        Ok(entries
            .get(&(mode, title.to_lowercase()))
            .map(|m| SearchCandidate {
                id: m.catalog_id,
                title: m.title.clone(),
                poster_url: m.poster_url.clone(),
                backdrop_url: m.backdrop_url.clone(),
            })
            .into_iter()
            .collect())
    }

    async fn detail(&self, id: i64, mode: ContentKind) -> anyhow::Result<CatalogMetadata> {
        let entries = self.entries.lock().unwrap();
        entries
            .iter()
            .find(|((kind, _), m)| *kind == mode && m.catalog_id == id)
            .map(|(_, m)| m.clone())
            .ok_or_else(|| anyhow::anyhow!("unknown id {id}"))
    }
}

/// Sink that keeps every announcement in memory.
#[derive(Clone, Default)]
pub struct RecordingSink(pub Arc<Mutex<Vec<Notification>>>);

impl RecordingSink {
    pub fn received(&self) -> Vec<Notification> {
        self.0.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    fn name(&self) -> &str {
        "recording"
    }

    async fn send(&self, notification: &Notification) -> anyhow::Result<()> {
        self.0.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

pub fn catalog_entry(catalog_id: i64, title: &str) -> CatalogMetadata {
    CatalogMetadata {
        catalog_id,
        title: title.to_string(),
        poster_url: Some(format!("https://image.tmdb.org/t/p/w500/{catalog_id}.jpg")),
        backdrop_url: None,
        overview: format!("{title} overview"),
        release_date: Some("2023-01-25".into()),
        rating: Some(7.5),
        genres: vec!["Action".into()],
        trailer_key: Some("trailer".into()),
    }
}

/// Pipeline over an in-memory database.
pub struct TestHarness {
    pub pipeline: IngestPipeline,
    pub catalog: Arc<StubCatalog>,
    pub sink: RecordingSink,
    pub db: DbPool,
}

impl TestHarness {
    pub fn new(catalog: StubCatalog) -> Self {
        let db = init_memory_pool().expect("failed to create in-memory pool");
        let catalog = Arc::new(catalog);
        let sink = RecordingSink::default();
        let pipeline = IngestPipeline::new(
            FilenameParser::default(),
            EnrichmentService::new(catalog.clone()),
            db.clone(),
            NotificationManager::with_sinks(vec![Box::new(sink.clone())]),
        );

        Self {
            pipeline,
            catalog,
            sink,
            db,
        }
    }

    pub fn record(&self, id: ContentId) -> ContentRecord {
        let conn = get_conn(&self.db).unwrap();
        contents::get_content(&conn, id)
            .unwrap()
            .expect("record should exist")
    }

    pub fn all_records(&self) -> Vec<ContentRecord> {
        let conn = get_conn(&self.db).unwrap();
        contents::list_contents(&conn, &Default::default()).unwrap()
    }
}
