//! # reelhook-parser
//!
//! Recovers structured intent from the filenames and captions of channel
//! uploads: title, release year, season, episode, quality and languages,
//! and whether the upload is a movie, a single episode or a season pack.
//!
//! ```
//! use reelhook_parser::{parse, ContentType};
//!
//! let parsed = parse("Breaking.Bad.S01E05.720p.mkv").unwrap();
//! assert_eq!(parsed.content_type, ContentType::SeriesEpisode);
//! assert_eq!(parsed.title, "Breaking Bad");
//! assert_eq!((parsed.season, parsed.episode), (Some(1), Some(5)));
//! assert_eq!(parsed.quality, "720p");
//! ```
//!
//! The keyword dictionaries are data, not code. Extend them and build a
//! [`FilenameParser`] from the result:
//!
//! ```
//! use reelhook_parser::{FilenameParser, KeywordTable, LanguageAlias};
//!
//! let mut table = KeywordTable::builtin();
//! table.extend_languages([LanguageAlias::new("marathi", &["Marathi"])]);
//! table.extend_junk(["hdhub4u"]);
//!
//! let parser = FilenameParser::new(table).unwrap();
//! let parsed = parser.parse("Sairat.HDHub4u.2016.720p.Marathi.mkv").unwrap();
//! assert_eq!(parsed.title, "Sairat");
//! assert_eq!(parsed.languages, vec!["Marathi"]);
//! ```

pub mod dictionary;
mod error;
pub mod normalize;
pub mod resolve;
pub mod title;
pub mod tokens;
mod types;

pub use dictionary::{Dictionary, KeywordTable, LanguageAlias, QualityPattern};
pub use error::ParseError;
pub use normalize::normalize;
pub use resolve::{Resolution, ResolutionRule, RESOLUTION_RULES};
pub use title::clean_title;
pub use tokens::{detect_languages, detect_quality, Markers};
pub use types::{ContentType, ParsedFilename};

/// Parse with the builtin keyword table.
///
/// # Errors
///
/// Returns [`ParseError::EmptyTitle`] when no title survives cleanup.
pub fn parse(input: &str) -> Result<ParsedFilename, ParseError> {
    FilenameParser::default().parse(input)
}

/// A filename parser bound to one compiled keyword table.
#[derive(Debug, Clone, Default)]
pub struct FilenameParser {
    dictionary: Dictionary,
}

impl FilenameParser {
    /// Compile `table` into a parser.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::InvalidPattern`] if a quality pattern in the
    /// table does not compile.
    pub fn new(table: KeywordTable) -> Result<Self, ParseError> {
        Ok(Self {
            dictionary: Dictionary::compile(table)?,
        })
    }

    /// The compiled dictionary.
    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    /// Parse a filename or caption line.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::EmptyTitle`] when the title span is empty after
    /// junk stripping.
    pub fn parse(&self, input: &str) -> Result<ParsedFilename, ParseError> {
        self.parse_normalized(input, normalize(input))
    }

    /// Parse a caption line. Same as [`parse`](Self::parse) except that no
    /// file extension is stripped, so `Mr.Bean` keeps both words.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::EmptyTitle`] when the title span is empty after
    /// junk stripping.
    pub fn parse_caption(&self, line: &str) -> Result<ParsedFilename, ParseError> {
        self.parse_normalized(line, normalize::replace_separators(line.trim()))
    }

    fn parse_normalized(
        &self,
        input: &str,
        normalized: String,
    ) -> Result<ParsedFilename, ParseError> {
        let markers = Markers::scan(&normalized, &self.dictionary);
        let (_rule, resolution) = resolve::resolve(&markers);

        let title = clean_title(
            markers.title_span(&normalized),
            &self.dictionary,
            resolution.content_type,
        );
        if title.is_empty() {
            return Err(ParseError::EmptyTitle {
                input: input.to_string(),
            });
        }

        let year = markers.year.as_ref().map(|y| y.year.clone());

        Ok(ParsedFilename {
            content_type: resolution.content_type,
            title,
            year,
            season: resolution.season,
            episode: resolution.episode,
            quality: detect_quality(markers.trailing(&normalized), &self.dictionary),
            languages: detect_languages(&normalized, &self.dictionary),
        })
    }
}
