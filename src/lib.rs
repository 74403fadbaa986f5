//! Reelhook - channel upload ingestion
//!
//! This library crate exposes the ingestion pipeline for the CLI and for
//! integration testing.

pub mod config;
pub mod ingest;
pub mod metadata;
pub mod notifications;
