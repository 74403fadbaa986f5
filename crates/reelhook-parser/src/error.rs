//! Parser errors.

/// Why an input could not be parsed.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// Nothing usable was left once markers and junk were stripped.
    #[error("no title could be extracted from {input:?}")]
    EmptyTitle {
        /// The raw input.
        input: String,
    },

    /// A keyword table entry is not a valid regular expression.
    #[error("invalid pattern {pattern:?}: {source}")]
    InvalidPattern {
        /// The offending pattern.
        pattern: String,
        /// The regex compilation error.
        #[source]
        source: regex::Error,
    },
}
