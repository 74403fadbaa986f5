//! Catalog metadata lookup.
//!
//! # Module layout
//!
//! - [`provider`] -- Trait definition and shared data types.
//! - [`providers`] -- Concrete provider implementations (TMDB).
//! - [`enrichment`] -- Search, simplified retry and detail fetch for one
//!   parsed upload.

pub mod enrichment;
pub mod provider;
pub mod providers;

pub use enrichment::EnrichmentService;
pub use provider::{CatalogMetadata, MetadataProvider, SearchCandidate};
