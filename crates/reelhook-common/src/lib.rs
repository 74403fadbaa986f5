//! Reelhook-Common: Shared types, identifiers, and error handling.
//!
//! This crate provides functionality used across reelhook:
//!
//! - **Typed IDs**: UUID wrapper for catalog content records
//! - **Core Types**: Enums for content kinds, media kinds, and catalog search modes
//! - **Error Handling**: Common error type and result alias
//!
//! # Examples
//!
//! ```
//! use reelhook_common::{ContentId, ContentKind, Error, Result};
//!
//! let id = ContentId::new();
//! let kind: ContentKind = "series".parse().unwrap();
//! assert_eq!(kind, ContentKind::Series);
//!
//! fn example(id: ContentId) -> Result<()> {
//!     Err(Error::not_found("content", id))
//! }
//! assert!(example(id).is_err());
//! ```

pub mod error;
pub mod ids;
pub mod types;

pub use error::{Error, Result};
pub use ids::*;
pub use types::*;
