//! Core type definitions shared by the parser, the store, and the pipeline.
//!
//! All enums serialize in lowercase, which is also how they are stored in the
//! database and accepted on the command line.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Kind of catalog entry.
///
/// Doubles as the search mode sent to the external catalog service: movies
/// are searched as movies, episodes and season packs as series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    /// A single film.
    Movie,
    /// A series holding episodes and season packs.
    Series,
}

impl ContentKind {
    /// Lowercase storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::Series => "series",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "movie" => Ok(Self::Movie),
            "series" | "tv" => Ok(Self::Series),
            other => Err(Error::validation(format!("unknown content kind: {other}"))),
        }
    }
}

/// How a media item was posted to the channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Posted as a playable video.
    #[default]
    Video,
    /// Posted as a generic document attachment.
    Document,
}

impl MediaKind {
    /// Lowercase storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Document => "document",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "video" => Ok(Self::Video),
            "document" => Ok(Self::Document),
            other => Err(Error::validation(format!("unknown media kind: {other}"))),
        }
    }
}
