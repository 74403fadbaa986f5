//! Token classification: where the structural markers sit in a normalized
//! string, and which quality and languages it carries.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::dictionary::Dictionary;

static SEASON: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:season ?|s)(\d{1,2})(?:\b|e)").unwrap());

static SEASON_EPISODE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:season ?|s)(\d{1,2}) ?(?:episode ?|ep ?|e)(\d{1,3})(?:\D|$)").unwrap()
});

static EPISODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:episode ?|ep ?|e)(\d{1,3})(?:\D|$)").unwrap());

static YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(19[5-9]\d|20\d{2})\b").unwrap());

static QUALITY_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:\d{3,4}p|4k)\b").unwrap());

/// A season marker (`S03`, `Season 3`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeasonMarker {
    /// Captured season number.
    pub season: u32,
    /// Byte offset of the marker.
    pub start: usize,
    /// Byte offset just past the season digits.
    pub end: usize,
}

/// An episode marker, with or without a season in front of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpisodeMarker {
    /// Season captured alongside the episode, if the marker was combined.
    pub season: Option<u32>,
    /// Captured episode number.
    pub episode: u32,
    /// Byte offset of the marker.
    pub start: usize,
}

/// A release year.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearMarker {
    /// The four digits, as text.
    pub year: String,
    /// Byte offset of the year.
    pub start: usize,
}

/// Positions of every structural marker found in one normalized string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Markers {
    /// First season marker.
    pub season: Option<SeasonMarker>,
    /// First combined season+episode marker.
    pub season_episode: Option<EpisodeMarker>,
    /// First bare episode marker.
    pub episode: Option<EpisodeMarker>,
    /// First year not at the very start of the string.
    pub year: Option<YearMarker>,
    /// Offset of the first resolution marker.
    pub quality_start: Option<usize>,
    /// Whether a pack keyword follows the season marker.
    pub pack_keyword_after_season: bool,
    /// Whether an episode marker follows the season marker.
    pub episode_after_season: bool,
    /// Earliest stop token; the title span ends here.
    pub stop: Option<usize>,
}

impl Markers {
    /// Scan a normalized string.
    ///
    /// A year at offset 0 is treated as part of the title, so `1917` and
    /// `2012` parse as titles rather than as empty-titled releases.
    pub fn scan(normalized: &str, dictionary: &Dictionary) -> Self {
        let season = SEASON.captures(normalized).and_then(|caps| {
            let whole = caps.get(0)?;
            let digits = caps.get(1)?;
            Some(SeasonMarker {
                season: digits.as_str().parse().ok()?,
                start: whole.start(),
                end: digits.end(),
            })
        });

        let season_episode = SEASON_EPISODE.captures(normalized).and_then(|caps| {
            Some(EpisodeMarker {
                season: Some(caps.get(1)?.as_str().parse().ok()?),
                episode: caps.get(2)?.as_str().parse().ok()?,
                start: caps.get(0)?.start(),
            })
        });

        let episode = EPISODE.captures(normalized).and_then(|caps| {
            Some(EpisodeMarker {
                season: None,
                episode: caps.get(1)?.as_str().parse().ok()?,
                start: caps.get(0)?.start(),
            })
        });

        let year = YEAR
            .find_iter(normalized)
            .find(|m| m.start() > 0)
            .map(|m| YearMarker {
                year: m.as_str().to_string(),
                start: m.start(),
            });

        let quality_start = QUALITY_MARKER.find(normalized).map(|m| m.start());

        let (pack_keyword_after_season, episode_after_season) = match season {
            Some(marker) => {
                let trailing = &normalized[marker.end..];
                (
                    dictionary.has_pack_keyword(trailing),
                    EPISODE.is_match(trailing),
                )
            }
            None => (false, false),
        };

        let stop = [
            season.map(|m| m.start),
            season_episode.map(|m| m.start),
            episode.map(|m| m.start),
            year.as_ref().map(|m| m.start),
            quality_start,
        ]
        .into_iter()
        .flatten()
        .min();

        Self {
            season,
            season_episode,
            episode,
            year,
            quality_start,
            pack_keyword_after_season,
            episode_after_season,
            stop,
        }
    }

    /// The candidate title span: everything before the first stop token.
    pub fn title_span<'a>(&self, normalized: &'a str) -> &'a str {
        match self.stop {
            Some(stop) => &normalized[..stop],
            None => normalized,
        }
    }

    /// Everything at or after the first stop token.
    pub fn trailing<'a>(&self, normalized: &'a str) -> &'a str {
        match self.stop {
            Some(stop) => &normalized[stop..],
            None => "",
        }
    }
}

/// Quality label for `text`: the first pattern in priority order that
/// matches, or `"HD"`.
pub fn detect_quality(text: &str, dictionary: &Dictionary) -> String {
    dictionary
        .qualities
        .iter()
        .find_map(|q| {
            let m = q.regex.find(text)?;
            Some(match &q.label {
                Some(label) => label.clone(),
                None => m.as_str().to_lowercase(),
            })
        })
        .unwrap_or_else(|| "HD".to_string())
}

/// Canonical languages mentioned in `text`, deduplicated in order of first
/// appearance. A multi-audio keyword overrides everything else.
pub fn detect_languages(text: &str, dictionary: &Dictionary) -> Vec<String> {
    if dictionary
        .multi_audio
        .as_ref()
        .is_some_and(|re| re.is_match(text))
    {
        return vec![dictionary.multi_audio_label.clone()];
    }

    let mut hits: Vec<(usize, usize, &[String])> = dictionary
        .languages
        .iter()
        .enumerate()
        .filter_map(|(rank, lang)| {
            lang.regex
                .find(text)
                .map(|m| (m.start(), rank, lang.labels.as_slice()))
        })
        .collect();
    hits.sort_by_key(|&(start, rank, _)| (start, rank));

    let mut languages: Vec<String> = Vec::new();
    for label in hits.into_iter().flat_map(|(_, _, labels)| labels) {
        if !languages.contains(label) {
            languages.push(label.clone());
        }
    }
    languages
}
