//! Parse result types.

use reelhook_common::ContentKind;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// What a single upload was resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ContentType {
    /// A film.
    Movie,
    /// One episode of a series.
    SeriesEpisode,
    /// A whole season bundled into one upload.
    SeriesPack,
}

impl ContentType {
    /// Snake-case name, as used in logs and JSON output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::SeriesEpisode => "series_episode",
            Self::SeriesPack => "series_pack",
        }
    }

    /// The catalog kind this upload belongs to.
    ///
    /// Episodes and packs both attach to a series record.
    pub fn content_kind(&self) -> ContentKind {
        match self {
            Self::Movie => ContentKind::Movie,
            Self::SeriesEpisode | Self::SeriesPack => ContentKind::Series,
        }
    }

    /// Whether this is an episode or a season pack.
    pub fn is_series(&self) -> bool {
        !matches!(self, Self::Movie)
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured intent recovered from a filename or caption.
///
/// Produced once per ingestion event and discarded after the merge.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ParsedFilename {
    /// Resolved content type.
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub content_type: ContentType,
    /// Cleaned, title-cased title. Never empty.
    pub title: String,
    /// Release year hint, kept as text (`"2023"`).
    pub year: Option<String>,
    /// Season number for episodes and packs.
    pub season: Option<u32>,
    /// Episode number for single episodes.
    pub episode: Option<u32>,
    /// Quality label, `"HD"` when nothing more specific was found.
    pub quality: String,
    /// Canonical language labels in order of first appearance.
    pub languages: Vec<String>,
}

impl ParsedFilename {
    /// Short human-readable description of the variant this upload provides,
    /// e.g. `S01E05 720p` or `Season 3 pack 720p`.
    pub fn variant_summary(&self) -> String {
        match (self.content_type, self.season, self.episode) {
            (ContentType::SeriesEpisode, Some(s), Some(e)) => {
                format!("S{s:02}E{e:02} {}", self.quality)
            }
            (ContentType::SeriesPack, Some(s), _) => format!("Season {s} pack {}", self.quality),
            _ => self.quality.clone(),
        }
    }
}
