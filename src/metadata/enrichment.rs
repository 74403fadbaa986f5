//! Enrichment service for resolving parsed uploads to catalog metadata.
//!
//! The [`EnrichmentService`] runs the lookup workflow for one upload: search
//! the catalog, retry once with a simplified title when nothing matches,
//! then fetch the detail record of the first-ranked candidate.
//!
//! A miss is never an error here. Missing credentials, transport failures,
//! timeouts and empty result sets all come back as `None`, and the caller
//! stores a placeholder record instead.

use std::sync::Arc;

use reelhook_common::ContentKind;
use reelhook_parser::ContentType;
use tracing::{debug, info, warn};

use super::provider::{CatalogMetadata, MetadataProvider, SearchCandidate};

/// Service that resolves a parsed title against an external catalog.
///
/// # Example
///
/// ```rust,ignore
/// let service = EnrichmentService::new(Arc::new(TmdbProvider::new(key, "en-US".into())));
/// let metadata = service.enrich("Pathaan", ContentType::Movie, Some("2023")).await;
/// ```
#[derive(Clone)]
pub struct EnrichmentService {
    provider: Arc<dyn MetadataProvider>,
}

impl EnrichmentService {
    /// Create a new `EnrichmentService` backed by `provider`.
    pub fn new(provider: Arc<dyn MetadataProvider>) -> Self {
        Self { provider }
    }

    /// Name of the backing provider.
    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Whether lookups can reach the catalog at all.
    pub fn is_available(&self) -> bool {
        self.provider.is_available()
    }

    /// Resolve a parsed upload.
    ///
    /// Episodes and season packs are searched as series. The year hint is
    /// only forwarded for movies.
    pub async fn enrich(
        &self,
        title: &str,
        content_type: ContentType,
        year: Option<&str>,
    ) -> Option<CatalogMetadata> {
        self.lookup(title, content_type.content_kind(), year).await
    }

    /// Resolve a title in the given search mode.
    pub async fn lookup(
        &self,
        title: &str,
        mode: ContentKind,
        year: Option<&str>,
    ) -> Option<CatalogMetadata> {
        if !self.provider.is_available() {
            debug!(provider = self.provider.name(), "Provider unavailable, skipping lookup");
            return None;
        }

        let title = title.trim();
        if title.is_empty() {
            return None;
        }

        let year = match mode {
            ContentKind::Movie => year,
            ContentKind::Series => None,
        };

        let mut candidates = self.search(title, mode, year).await;

        if candidates.is_empty() {
            if let Some(simplified) = simplify_title(title) {
                debug!(title = %title, simplified = %simplified, "No results, retrying with simplified title");
                candidates = self.search(simplified, mode, year).await;
            }
        }

        let Some(top) = candidates.into_iter().next() else {
            info!(title = %title, mode = %mode, "No catalog match");
            return None;
        };

        match self.provider.detail(top.id, mode).await {
            Ok(mut metadata) => {
                if metadata.title.trim().is_empty() {
                    metadata.title = top.title;
                }
                if metadata.poster_url.is_none() {
                    metadata.poster_url = top.poster_url;
                }
                if metadata.backdrop_url.is_none() {
                    metadata.backdrop_url = top.backdrop_url;
                }
                info!(
                    title = %title,
                    catalog_id = metadata.catalog_id,
                    matched = %metadata.title,
                    "Resolved catalog metadata"
                );
                Some(metadata)
            }
            Err(e) => {
                warn!(
                    provider = self.provider.name(),
                    catalog_id = top.id,
                    "Detail lookup failed: {:#}",
                    e
                );
                None
            }
        }
    }

    /// Search, treating any failure as an empty result.
    async fn search(
        &self,
        title: &str,
        mode: ContentKind,
        year: Option<&str>,
    ) -> Vec<SearchCandidate> {
        match self.provider.search(title, mode, year).await {
            Ok(results) => results,
            Err(e) => {
                warn!(
                    provider = self.provider.name(),
                    title = %title,
                    "Catalog search failed: {:#}",
                    e
                );
                Vec::new()
            }
        }
    }
}

/// Drop the last word of a multi-word title.
fn simplify_title(title: &str) -> Option<&str> {
    let trimmed = title.trim_end();
    let cut = trimmed.rfind(char::is_whitespace)?;
    let simplified = trimmed[..cut].trim_end();
    (!simplified.is_empty()).then_some(simplified)
}
