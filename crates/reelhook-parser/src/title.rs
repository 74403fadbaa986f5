//! Title cleanup.

use regex::Regex;

use crate::dictionary::Dictionary;
use crate::types::ContentType;

/// Strip junk keywords from a title span, collapse whitespace and
/// title-case the result.
///
/// Season packs also lose their pack keywords (`Complete`, `Pack`). Movies
/// lose language keywords (`Hindi`, `Dual Audio`) unless that would leave
/// nothing, so `Dual.2022.mkv` keeps its title.
///
/// Returns an empty string when nothing is left.
pub fn clean_title(span: &str, dictionary: &Dictionary, content_type: ContentType) -> String {
    let mut title = strip(span, dictionary.junk.as_ref());
    match content_type {
        ContentType::SeriesPack => title = strip(&title, dictionary.pack.as_ref()),
        ContentType::Movie => {
            let without_languages = strip(&title, dictionary.language_words.as_ref());
            if !without_languages.trim().is_empty() {
                title = without_languages;
            }
        }
        ContentType::SeriesEpisode => {}
    }

    title
        .split_whitespace()
        .map(title_case_word)
        .collect::<Vec<_>>()
        .join(" ")
}

fn strip(text: &str, keywords: Option<&Regex>) -> String {
    match keywords {
        Some(re) => re.replace_all(text, " ").into_owned(),
        None => text.to_string(),
    }
}

/// Upper-case the first letter of a word and lower-case the rest.
fn title_case_word(word: &str) -> String {
    let mut out = String::with_capacity(word.len());
    let mut seen_letter = false;
    for c in word.chars() {
        if c.is_alphabetic() && !seen_letter {
            out.extend(c.to_uppercase());
            seen_letter = true;
        } else {
            out.extend(c.to_lowercase());
        }
    }
    out
}
