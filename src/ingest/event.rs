//! Inbound upload events.

use reelhook_common::MediaKind;
use reelhook_parser::{FilenameParser, ParseError, ParsedFilename};
use serde::{Deserialize, Serialize};

/// One media upload delivered from the channel.
///
/// Field names accept both snake_case and the camelCase used by the
/// delivery webhook (`mediaReference`, `sizeBytes`, `mediaKind`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestEvent {
    pub filename: String,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(alias = "mediaReference")]
    pub media_reference: String,
    #[serde(default, alias = "sizeBytes")]
    pub size_bytes: i64,
    #[serde(default, alias = "mediaKind")]
    pub media_kind: MediaKind,
}

/// The stored part of an upload: what gets attached as a variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaAttachment {
    pub media_ref: String,
    pub size_bytes: i64,
    pub media_kind: MediaKind,
}

impl IngestEvent {
    /// An event with only a filename and media reference.
    pub fn new(filename: impl Into<String>, media_reference: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            caption: None,
            media_reference: media_reference.into(),
            size_bytes: 0,
            media_kind: MediaKind::Video,
        }
    }

    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    /// First non-empty caption line, if any.
    pub fn caption_line(&self) -> Option<&str> {
        self.caption
            .as_deref()?
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
    }

    /// Text the title is read from: the caption when it has content,
    /// otherwise the filename.
    pub fn title_source(&self) -> &str {
        self.caption_line().unwrap_or(&self.filename)
    }

    pub fn attachment(&self) -> MediaAttachment {
        MediaAttachment {
            media_ref: self.media_reference.clone(),
            size_bytes: self.size_bytes,
            media_kind: self.media_kind,
        }
    }

    /// Parse this event.
    ///
    /// The caption wins for the title. The filename still fills in what the
    /// caption leaves out: its season/episode markers when the caption
    /// reads as a plain movie, its quality when the caption has none, its
    /// year, and any extra languages.
    ///
    /// # Errors
    ///
    /// Fails only when neither the caption nor the filename yields a title.
    pub fn parse_with(&self, parser: &FilenameParser) -> Result<ParsedFilename, ParseError> {
        let from_file = parser.parse(&self.filename);

        let Some(line) = self.caption_line() else {
            return from_file;
        };

        let mut parsed = match parser.parse_caption(line) {
            Ok(parsed) => parsed,
            Err(caption_err) => return from_file.map_err(|_| caption_err),
        };

        if let Ok(file) = from_file {
            if !parsed.content_type.is_series() && file.content_type.is_series() {
                parsed.content_type = file.content_type;
                parsed.season = file.season;
                parsed.episode = file.episode;
            }
            if parsed.quality == "HD" {
                parsed.quality = file.quality;
            }
            if parsed.year.is_none() {
                parsed.year = file.year;
            }
            for lang in file.languages {
                if !parsed.languages.contains(&lang) {
                    parsed.languages.push(lang);
                }
            }
        }

        Ok(parsed)
    }
}
