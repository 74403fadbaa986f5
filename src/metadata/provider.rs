//! Trait definition and types for metadata providers.

use async_trait::async_trait;
use reelhook_common::ContentKind;
use reelhook_db::ContentMetadata;
use serde::{Deserialize, Serialize};

/// Placeholder overview stored on records with no catalog match.
pub const PLACEHOLDER_OVERVIEW: &str = "Details will be updated soon.";

/// A single ranked result returned from a catalog search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchCandidate {
    /// Provider-specific numeric id.
    pub id: i64,
    /// Display title.
    pub title: String,
    /// Full poster URL, if the candidate has one.
    pub poster_url: Option<String>,
    /// Full backdrop URL, if the candidate has one.
    pub backdrop_url: Option<String>,
}

/// Canonical metadata for one catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogMetadata {
    /// Provider-specific numeric id; the merge key for resolved records.
    pub catalog_id: i64,
    pub title: String,
    pub poster_url: Option<String>,
    pub backdrop_url: Option<String>,
    pub overview: String,
    /// ISO-8601 date (`YYYY-MM-DD`).
    pub release_date: Option<String>,
    /// Audience rating, 0.0 - 10.0.
    pub rating: Option<f64>,
    pub genres: Vec<String>,
    /// YouTube key of the first trailer.
    pub trailer_key: Option<String>,
}

impl CatalogMetadata {
    /// The metadata block stored on a content record.
    pub fn to_content_metadata(&self) -> ContentMetadata {
        ContentMetadata {
            catalog_id: Some(self.catalog_id),
            poster_url: self.poster_url.clone(),
            backdrop_url: self.backdrop_url.clone(),
            overview: self.overview.clone(),
            release_date: self.release_date.clone(),
            rating: self.rating,
            genres: self.genres.clone(),
            trailer_key: self.trailer_key.clone(),
        }
    }
}

/// Metadata block for a record nothing could be matched to.
pub fn placeholder_metadata() -> ContentMetadata {
    ContentMetadata {
        overview: PLACEHOLDER_OVERVIEW.to_string(),
        ..ContentMetadata::default()
    }
}

/// Async trait that all metadata providers must implement.
///
/// Providers are shared behind an `Arc` across ingestion tasks.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Short, lowercase identifier for this provider (e.g. `"tmdb"`).
    fn name(&self) -> &'static str;

    /// Returns `true` when the provider has credentials and can serve
    /// requests.
    fn is_available(&self) -> bool;

    /// Search the catalog. `year` narrows movie searches only.
    ///
    /// Results are in the provider's ranking order.
    async fn search(
        &self,
        title: &str,
        mode: ContentKind,
        year: Option<&str>,
    ) -> anyhow::Result<Vec<SearchCandidate>>;

    /// Fetch the full record for a search candidate.
    async fn detail(&self, id: i64, mode: ContentKind) -> anyhow::Result<CatalogMetadata>;
}
