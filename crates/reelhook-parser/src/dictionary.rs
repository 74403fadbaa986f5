//! Keyword dictionary for language, quality, junk and pack detection.
//!
//! [`KeywordTable`] is plain data: it can be built in code, deserialized
//! (with the `serde` feature) or extended from configuration. A
//! [`Dictionary`] is the compiled form the parser actually matches with.

use regex::Regex;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::ParseError;
use crate::normalize::normalize_keyword;

/// A language keyword and the canonical labels it stands for.
///
/// Most aliases map to one label; `dual audio` maps to two.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LanguageAlias {
    /// Keyword as it appears in filenames (`hin`, `dual audio`).
    pub keyword: String,
    /// Canonical labels, in output order.
    pub labels: Vec<String>,
}

impl LanguageAlias {
    /// Build an alias from a keyword and its labels.
    pub fn new(keyword: impl Into<String>, labels: &[&str]) -> Self {
        Self {
            keyword: keyword.into(),
            labels: labels.iter().map(|l| (*l).to_string()).collect(),
        }
    }
}

/// One entry of the ordered quality list.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct QualityPattern {
    /// Label to report. When absent, the matched text itself is reported
    /// (lowercased), which is how the generic `\d{3,4}p` entry works.
    #[cfg_attr(feature = "serde", serde(default))]
    pub label: Option<String>,
    /// Case-insensitive regular expression.
    pub pattern: String,
}

impl QualityPattern {
    fn labelled(label: &str, pattern: &str) -> Self {
        Self {
            label: Some(label.to_string()),
            pattern: pattern.to_string(),
        }
    }
}

/// Injectable keyword tables.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct KeywordTable {
    /// Language aliases, checked in order.
    pub languages: Vec<LanguageAlias>,
    /// Keywords that mean "many audio tracks".
    pub multi_audio_keywords: Vec<String>,
    /// Label reported instead of individual languages on a multi-audio hit.
    pub multi_audio_label: String,
    /// Release noise stripped from titles.
    pub junk: Vec<String>,
    /// Keywords marking a season pack.
    pub pack_keywords: Vec<String>,
    /// Quality patterns, most specific first.
    pub qualities: Vec<QualityPattern>,
}

const BUILTIN_JUNK: &[&str] = &[
    "1080p", "720p", "480p", "2160p", "4k", "uhd", "web-dl", "webdl", "webrip", "brrip",
    "bluray", "dvdrip", "hdrip", "hdcam", "camrip", "hdts", "hdtv", "x264", "x265", "h264",
    "h265", "hevc", "avc", "10bit", "aac", "ac3", "dts", "5.1", "7.1", "final", "uncut",
    "extended", "remastered", "unrated", "proper", "repack", "nf", "amzn", "esub", "esubs",
    "www", "com", "net", "org", "psa", "mkv", "mp4", "dubbed",
];

const BUILTIN_PACK_KEYWORDS: &[&str] = &["complete", "pack", "all episodes", "zip", "batch"];

impl KeywordTable {
    /// The stock dictionaries.
    pub fn builtin() -> Self {
        let languages = vec![
            LanguageAlias::new("hindi", &["Hindi"]),
            LanguageAlias::new("hin", &["Hindi"]),
            LanguageAlias::new("english", &["English"]),
            LanguageAlias::new("eng", &["English"]),
            LanguageAlias::new("bengali", &["Bengali"]),
            LanguageAlias::new("bangla", &["Bangla"]),
            LanguageAlias::new("ben", &["Bengali"]),
            LanguageAlias::new("tamil", &["Tamil"]),
            LanguageAlias::new("tam", &["Tamil"]),
            LanguageAlias::new("telugu", &["Telugu"]),
            LanguageAlias::new("tel", &["Telugu"]),
            LanguageAlias::new("kannada", &["Kannada"]),
            LanguageAlias::new("kan", &["Kannada"]),
            LanguageAlias::new("malayalam", &["Malayalam"]),
            LanguageAlias::new("mal", &["Malayalam"]),
            LanguageAlias::new("korean", &["Korean"]),
            LanguageAlias::new("kor", &["Korean"]),
            LanguageAlias::new("chinese", &["Chinese"]),
            LanguageAlias::new("chi", &["Chinese"]),
            LanguageAlias::new("japanese", &["Japanese"]),
            LanguageAlias::new("jap", &["Japanese"]),
            LanguageAlias::new("dual audio", &["Hindi", "English"]),
            LanguageAlias::new("dual", &["Hindi", "English"]),
        ];

        let qualities = vec![
            QualityPattern::labelled("2160p", r"\b2160p\b"),
            QualityPattern::labelled("4K", r"\b(?:4k|uhd)\b"),
            QualityPattern::labelled("1440p", r"\b1440p\b"),
            QualityPattern::labelled("1080p", r"\b1080p\b"),
            QualityPattern::labelled("720p", r"\b720p\b"),
            QualityPattern::labelled("576p", r"\b576p\b"),
            QualityPattern::labelled("480p", r"\b480p\b"),
            QualityPattern::labelled("360p", r"\b360p\b"),
            QualityPattern {
                label: None,
                pattern: r"\b\d{3,4}p\b".to_string(),
            },
            QualityPattern::labelled("HD", r"\bhd\b"),
        ];

        Self {
            languages,
            multi_audio_keywords: vec!["multi audio".to_string(), "multi lang".to_string()],
            multi_audio_label: "Multi Audio".to_string(),
            junk: BUILTIN_JUNK.iter().map(|s| (*s).to_string()).collect(),
            pack_keywords: BUILTIN_PACK_KEYWORDS.iter().map(|s| (*s).to_string()).collect(),
            qualities,
        }
    }

    /// Add language aliases. An alias whose keyword is already present
    /// replaces the existing labels.
    pub fn extend_languages(&mut self, aliases: impl IntoIterator<Item = LanguageAlias>) {
        for alias in aliases {
            let key = normalize_keyword(&alias.keyword);
            match self
                .languages
                .iter_mut()
                .find(|existing| normalize_keyword(&existing.keyword) == key)
            {
                Some(existing) => existing.labels = alias.labels,
                None => self.languages.push(alias),
            }
        }
    }

    /// Add junk keywords, skipping ones already known.
    pub fn extend_junk<I, S>(&mut self, keywords: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        extend_unique(&mut self.junk, keywords);
    }

    /// Add pack keywords, skipping ones already known.
    pub fn extend_pack_keywords<I, S>(&mut self, keywords: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        extend_unique(&mut self.pack_keywords, keywords);
    }
}

impl Default for KeywordTable {
    fn default() -> Self {
        Self::builtin()
    }
}

fn extend_unique<I, S>(target: &mut Vec<String>, keywords: I)
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    for keyword in keywords {
        let keyword = keyword.into();
        let key = normalize_keyword(&keyword);
        if key.is_empty() || target.iter().any(|k| normalize_keyword(k) == key) {
            continue;
        }
        target.push(keyword);
    }
}

fn compile(pattern: &str) -> Result<Regex, ParseError> {
    Regex::new(pattern).map_err(|source| ParseError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

/// Word-bounded, case-insensitive alternation over `keywords`, longest
/// first so `web dl` wins over a shorter overlapping entry.
fn keyword_alternation(keywords: &[String]) -> Result<Option<Regex>, ParseError> {
    let mut normalized: Vec<String> = keywords
        .iter()
        .map(|k| normalize_keyword(k))
        .filter(|k| !k.is_empty())
        .collect();
    normalized.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    normalized.dedup();

    if normalized.is_empty() {
        return Ok(None);
    }

    let body = normalized
        .iter()
        .map(|k| regex::escape(k))
        .collect::<Vec<_>>()
        .join("|");
    compile(&format!(r"(?i)\b(?:{body})\b")).map(Some)
}

#[derive(Debug, Clone)]
pub(crate) struct CompiledLanguage {
    pub(crate) regex: Regex,
    pub(crate) labels: Vec<String>,
}

#[derive(Debug, Clone)]
pub(crate) struct CompiledQuality {
    pub(crate) regex: Regex,
    pub(crate) label: Option<String>,
}

/// A [`KeywordTable`] compiled into matchers.
#[derive(Debug, Clone)]
pub struct Dictionary {
    table: KeywordTable,
    pub(crate) languages: Vec<CompiledLanguage>,
    pub(crate) multi_audio: Option<Regex>,
    pub(crate) multi_audio_label: String,
    pub(crate) language_words: Option<Regex>,
    pub(crate) junk: Option<Regex>,
    pub(crate) pack: Option<Regex>,
    pub(crate) qualities: Vec<CompiledQuality>,
}

impl Dictionary {
    /// Compile a table.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::InvalidPattern`] if a quality pattern is not a
    /// valid regular expression.
    pub fn compile(table: KeywordTable) -> Result<Self, ParseError> {
        let languages = table
            .languages
            .iter()
            .filter_map(|alias| {
                let keyword = normalize_keyword(&alias.keyword);
                (!keyword.is_empty()).then(|| {
                    compile(&format!(r"(?i)\b{}\b", regex::escape(&keyword))).map(|regex| {
                        CompiledLanguage {
                            regex,
                            labels: alias.labels.clone(),
                        }
                    })
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let qualities = table
            .qualities
            .iter()
            .map(|q| {
                compile(&format!("(?i){}", q.pattern)).map(|regex| CompiledQuality {
                    regex,
                    label: q.label.clone(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let language_keywords: Vec<String> = table
            .languages
            .iter()
            .map(|alias| alias.keyword.clone())
            .chain(table.multi_audio_keywords.iter().cloned())
            .collect();

        Ok(Self {
            multi_audio: keyword_alternation(&table.multi_audio_keywords)?,
            language_words: keyword_alternation(&language_keywords)?,
            multi_audio_label: table.multi_audio_label.clone(),
            junk: keyword_alternation(&table.junk)?,
            pack: keyword_alternation(&table.pack_keywords)?,
            languages,
            qualities,
            table,
        })
    }

    /// The table this dictionary was compiled from.
    pub fn table(&self) -> &KeywordTable {
        &self.table
    }

    /// Whether any pack keyword occurs in `text`.
    pub fn has_pack_keyword(&self, text: &str) -> bool {
        self.pack.as_ref().is_some_and(|re| re.is_match(text))
    }

    /// Whether any language or multi-audio keyword occurs in `text`.
    pub fn has_language_keyword(&self, text: &str) -> bool {
        self.language_words.as_ref().is_some_and(|re| re.is_match(text))
    }

    /// Whether any junk keyword occurs in `text` as a standalone word.
    pub fn has_junk(&self, text: &str) -> bool {
        self.junk.as_ref().is_some_and(|re| re.is_match(text))
    }
}

impl Default for Dictionary {
    fn default() -> Self {
        Self::compile(KeywordTable::builtin()).expect("builtin keyword table must compile")
    }
}
