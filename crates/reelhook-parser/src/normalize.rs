//! Filename normalization.
//!
//! Turns `Money.Heist.S03.Complete.Pack.720p.mkv` into
//! `Money Heist S03 Complete Pack 720p`. Always succeeds.

use once_cell::sync::Lazy;
use regex::Regex;

/// Extension-shaped suffixes that are really release markers (`Show.S03`,
/// `Movie.1080p`) and must survive normalization.
static MARKER_LIKE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:\d{3,4}p|4k|[se]\d{1,3})$").unwrap());

fn is_separator(c: char) -> bool {
    matches!(c, '.' | '_' | '-' | '[' | ']' | '(' | ')' | '{' | '}')
}

fn is_extension(ext: &str) -> bool {
    (1..=5).contains(&ext.len())
        && ext.chars().all(|c| c.is_ascii_alphanumeric())
        && ext.chars().any(|c| c.is_ascii_alphabetic())
        && !MARKER_LIKE.is_match(ext)
}

/// Drop a trailing file extension, if there is one.
pub fn strip_extension(raw: &str) -> &str {
    match raw.rsplit_once('.') {
        Some((stem, ext)) if is_extension(ext) => stem,
        _ => raw,
    }
}

/// Replace separator characters with spaces and collapse whitespace.
pub fn replace_separators(text: &str) -> String {
    let spaced: String = text
        .chars()
        .map(|c| if is_separator(c) { ' ' } else { c })
        .collect();
    spaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalize a raw filename or caption line.
///
/// ```
/// use reelhook_parser::normalize;
///
/// assert_eq!(normalize("Breaking.Bad.S01E05.720p.mkv"), "Breaking Bad S01E05 720p");
/// assert_eq!(normalize(""), "");
/// ```
pub fn normalize(raw: &str) -> String {
    replace_separators(strip_extension(raw.trim()))
}

/// Normalized, lowercase form of a dictionary keyword, so `WEB-DL` and
/// `5.1` line up with normalized input.
pub(crate) fn normalize_keyword(keyword: &str) -> String {
    replace_separators(keyword).to_lowercase()
}
