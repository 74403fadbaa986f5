//! Upload ingestion.
//!
//! - [`event`] -- the inbound upload and how its title source is chosen.
//! - [`merge`] -- dedup/merge of a parsed upload into the catalog.
//! - [`pipeline`] -- parse, enrich, merge and notify for one event.

pub mod event;
pub mod merge;
pub mod pipeline;

pub use event::{IngestEvent, MediaAttachment};
pub use merge::{MergeEngine, MergeOutcome};
pub use pipeline::{IngestOutcome, IngestPipeline};
