//! End-to-end ingestion: parse, enrich, merge, notify.

use std::sync::Arc;

use anyhow::{Context, Result};
use reelhook_common::{ContentId, Error};
use reelhook_db::queries::contents;
use reelhook_db::{get_conn, ContentMetadata, ContentRecord, DbPool};
use reelhook_parser::FilenameParser;
use serde::Serialize;
use tracing::{error, info, warn};

use super::event::IngestEvent;
use super::merge::{MergeEngine, MergeOutcome};
use crate::config::Config;
use crate::metadata::providers::TmdbProvider;
use crate::metadata::EnrichmentService;
use crate::notifications::{Notification, NotificationManager};

/// Attempts at applying resolved metadata before giving up on a record
/// that keeps changing underneath.
const RESOLVE_ATTEMPTS: usize = 3;

/// Result of one ingestion. Every event ends in exactly one of these; the
/// delivery source is acknowledged either way.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum IngestOutcome {
    /// Stored (created, appended or replaced).
    Accepted(MergeOutcome),
    /// No title could be extracted; nothing was stored.
    Rejected { reason: String },
    /// The store failed.
    Failed { error: String },
}

impl IngestOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }

    pub fn merge_outcome(&self) -> Option<&MergeOutcome> {
        match self {
            Self::Accepted(outcome) => Some(outcome),
            _ => None,
        }
    }
}

/// The ingestion pipeline.
pub struct IngestPipeline {
    parser: FilenameParser,
    enrichment: EnrichmentService,
    merge: MergeEngine,
    notifications: NotificationManager,
}

impl IngestPipeline {
    pub fn new(
        parser: FilenameParser,
        enrichment: EnrichmentService,
        pool: DbPool,
        notifications: NotificationManager,
    ) -> Self {
        Self {
            parser,
            enrichment,
            merge: MergeEngine::new(pool),
            notifications,
        }
    }

    /// Build the pipeline described by `config`, backed by TMDB.
    pub fn from_config(config: &Config, pool: DbPool) -> Result<Self> {
        let parser = FilenameParser::new(config.parser.keyword_table())
            .context("Failed to compile parser keyword table")?;

        let provider = TmdbProvider::from_config(&config.metadata);
        let enrichment = EnrichmentService::new(Arc::new(provider));
        if !enrichment.is_available() {
            warn!("No TMDB API key configured; every upload will be stored as a placeholder");
        }

        let notifications = NotificationManager::new(&config.notifications);

        Ok(Self::new(parser, enrichment, pool, notifications))
    }

    pub fn parser(&self) -> &FilenameParser {
        &self.parser
    }

    pub fn pool(&self) -> &DbPool {
        self.merge.pool()
    }

    /// Ingest one event. Never fails; problems are logged and reported in
    /// the returned outcome.
    pub async fn ingest(&self, event: &IngestEvent) -> IngestOutcome {
        let parsed = match event.parse_with(&self.parser) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(
                    filename = %event.filename,
                    media_ref = %event.media_reference,
                    "Rejected upload: {}",
                    e
                );
                return IngestOutcome::Rejected {
                    reason: e.to_string(),
                };
            }
        };

        info!(
            filename = %event.filename,
            title = %parsed.title,
            content_type = %parsed.content_type,
            quality = %parsed.quality,
            "Parsed upload"
        );

        let metadata = self
            .enrichment
            .enrich(&parsed.title, parsed.content_type, parsed.year.as_deref())
            .await;

        match self.merge.merge(&parsed, metadata.as_ref(), &event.attachment()) {
            Ok(outcome) => {
                self.notifications.notify(&outcome).await;
                IngestOutcome::Accepted(outcome)
            }
            Err(e) => {
                error!(
                    filename = %event.filename,
                    title = %parsed.title,
                    "Failed to store upload: {}",
                    e
                );
                IngestOutcome::Failed {
                    error: e.to_string(),
                }
            }
        }
    }

    /// Re-run the catalog lookup for a placeholder record and apply the
    /// result.
    ///
    /// `title` is an admin correction. When given, the lookup searches for
    /// it instead of the stored title, and a miss still renames the
    /// placeholder so later uploads under the corrected title merge into
    /// it. A resolved record only has its title replaced; its catalog
    /// metadata is kept.
    ///
    /// Without a correction, a miss is an error and nothing changes, and a
    /// record that is already resolved is returned unchanged.
    pub async fn resolve(&self, id: ContentId, title: Option<&str>) -> Result<ContentRecord> {
        let record = self.load(id)?;
        let corrected = title.map(str::trim).filter(|t| !t.is_empty());

        if !record.unresolved {
            let Some(corrected) = corrected else {
                info!(content_id = %id, "Record already resolved");
                return Ok(record);
            };
            let updated = self.update_record(record, corrected, None)?;
            info!(content_id = %id, title = %updated.title, "Renamed record");
            return Ok(updated);
        }

        let query = corrected.unwrap_or(&record.title).to_string();
        let Some(metadata) = self.enrichment.lookup(&query, record.kind(), None).await else {
            let Some(corrected) = corrected else {
                anyhow::bail!("No catalog match for \"{}\"", record.title);
            };
            let updated = self.update_record(record, corrected, None)?;
            warn!(
                content_id = %id,
                title = %updated.title,
                "No catalog match for corrected title, placeholder renamed"
            );
            return Ok(updated);
        };

        let title = if metadata.title.trim().is_empty() {
            query
        } else {
            metadata.title.clone()
        };
        let updated = self.update_record(record, &title, Some(&metadata.to_content_metadata()))?;
        info!(
            content_id = %id,
            catalog_id = metadata.catalog_id,
            title = %updated.title,
            "Resolved placeholder record"
        );
        Ok(updated)
    }

    /// Re-announce a stored record to every notification sink.
    pub async fn announce(&self, id: ContentId) -> Result<Notification> {
        let record = self.load(id)?;
        if !self.notifications.has_targets() {
            warn!(content_id = %id, "No notification targets configured");
        }

        let notification = Notification::from(&record);
        self.notifications.announce(&notification).await;
        info!(content_id = %id, title = %record.title, "Re-announced record");
        Ok(notification)
    }

    /// Set a record's title and, when given, its catalog metadata.
    ///
    /// The update is conditional on the record's version; when another
    /// writer moves it first the record is re-read and the update retried.
    /// With no metadata the record keeps whatever metadata it has at the
    /// time of the write.
    fn update_record(
        &self,
        mut record: ContentRecord,
        title: &str,
        metadata: Option<&ContentMetadata>,
    ) -> Result<ContentRecord> {
        let id = record.id;
        for attempt in 1..=RESOLVE_ATTEMPTS {
            let stored = metadata.unwrap_or(&record.metadata);
            let conn = get_conn(self.pool())?;
            match contents::apply_metadata(&conn, id, record.version, title, stored) {
                Ok(updated) => return Ok(updated),
                Err(Error::Conflict(msg)) => {
                    let current = self.load(id)?;
                    if current.version == record.version {
                        // Version unchanged: the merge key belongs to another record.
                        anyhow::bail!("{msg}");
                    }
                    if metadata.is_some() && !current.unresolved {
                        return Ok(current);
                    }
                    warn!(content_id = %id, attempt, "Record changed during update, retrying");
                    record = current;
                }
                Err(e) => {
                    return Err(anyhow::Error::new(e).context("Failed to update content record"))
                }
            }
        }

        anyhow::bail!("content {id} kept changing; gave up after {RESOLVE_ATTEMPTS} attempts")
    }

    fn load(&self, id: ContentId) -> Result<ContentRecord> {
        let conn = get_conn(self.pool())?;
        contents::get_content(&conn, id)?.ok_or_else(|| Error::not_found("content", id).into())
    }
}
