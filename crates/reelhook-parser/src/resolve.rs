//! Content-type resolution.
//!
//! An ordered table of named rules evaluated top-down; the first rule that
//! returns a [`Resolution`] wins. Season packs are checked before single
//! episodes: a season marker with no episode marker after it counts as a
//! pack, so a single episode posted without its episode number resolves as
//! a pack too.

use crate::tokens::Markers;
use crate::types::ContentType;

/// Outcome of a matching rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    /// Resolved type.
    pub content_type: ContentType,
    /// Season number, for series.
    pub season: Option<u32>,
    /// Episode number, for single episodes.
    pub episode: Option<u32>,
}

/// A named predicate + extractor.
#[derive(Debug, Clone, Copy)]
pub struct ResolutionRule {
    /// Rule name, used in trace logs and tests.
    pub name: &'static str,
    /// Returns `Some` when the rule applies.
    pub apply: fn(&Markers) -> Option<Resolution>,
}

/// The resolver, in priority order.
pub const RESOLUTION_RULES: &[ResolutionRule] = &[
    ResolutionRule {
        name: "series_pack",
        apply: series_pack,
    },
    ResolutionRule {
        name: "series_episode",
        apply: series_episode,
    },
    ResolutionRule {
        name: "bare_episode",
        apply: bare_episode,
    },
    ResolutionRule {
        name: "movie",
        apply: movie,
    },
];

fn series_pack(markers: &Markers) -> Option<Resolution> {
    let season = markers.season?;
    (markers.pack_keyword_after_season || !markers.episode_after_season).then_some(Resolution {
        content_type: ContentType::SeriesPack,
        season: Some(season.season),
        episode: None,
    })
}

fn series_episode(markers: &Markers) -> Option<Resolution> {
    let marker = markers.season_episode?;
    Some(Resolution {
        content_type: ContentType::SeriesEpisode,
        season: marker.season,
        episode: Some(marker.episode),
    })
}

fn bare_episode(markers: &Markers) -> Option<Resolution> {
    let marker = markers.episode?;
    Some(Resolution {
        content_type: ContentType::SeriesEpisode,
        season: Some(1),
        episode: Some(marker.episode),
    })
}

fn movie(_: &Markers) -> Option<Resolution> {
    Some(movie_resolution())
}

/// Run the rules against `markers`, returning the winning rule's name and
/// its resolution.
pub fn resolve(markers: &Markers) -> (&'static str, Resolution) {
    RESOLUTION_RULES
        .iter()
        .find_map(|rule| (rule.apply)(markers).map(|r| (rule.name, r)))
        .unwrap_or_else(|| ("movie", movie_resolution()))
}

fn movie_resolution() -> Resolution {
    Resolution {
        content_type: ContentType::Movie,
        season: None,
        episode: None,
    }
}
