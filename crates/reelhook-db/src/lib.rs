//! reelhook-db: catalog persistence.
//!
//! SQLite storage with connection pooling, embedded migrations, typed
//! models and query modules for content records and their media variants.
//! Uniqueness of catalog entries and of variant keys is enforced by the
//! schema, so concurrent ingestion cannot create duplicates.

pub mod migrations;
pub mod models;
pub mod pool;
pub mod queries;

pub use models::{
    ContentBody, ContentFlags, ContentMetadata, ContentRecord, MediaVariant, SeasonPackVariant,
};
pub use pool::{get_conn, init_memory_pool, init_pool, DbPool, PooledConnection};
