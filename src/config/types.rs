use reelhook_parser::{KeywordTable, LanguageAlias};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub metadata: MetadataConfig,

    #[serde(default)]
    pub parser: ParserConfig,

    #[serde(default)]
    pub notifications: NotificationsConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// SQLite file holding the catalog (tilde-expanded)
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("reelhook.db")
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MetadataConfig {
    /// TMDB v3 API key. Falls back to the `TMDB_API_KEY` environment variable
    #[serde(default)]
    pub tmdb_api_key: String,

    /// Response language sent to TMDB
    #[serde(default = "default_language")]
    pub language: String,

    /// API root, overridable for testing against a mock server
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds (default: 10)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum requests per second sent to TMDB
    #[serde(default = "default_rate_limit")]
    pub requests_per_second: u32,
}

fn default_language() -> String {
    "en-US".to_string()
}

fn default_base_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_rate_limit() -> u32 {
    4
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            tmdb_api_key: String::new(),
            language: default_language(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            requests_per_second: default_rate_limit(),
        }
    }
}

/// Additions to the builtin keyword dictionaries.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ParserConfig {
    #[serde(default)]
    pub extra_junk_keywords: Vec<String>,

    #[serde(default)]
    pub extra_pack_keywords: Vec<String>,

    /// e.g. `[[parser.extra_languages]] keyword = "mar", labels = ["Marathi"]`
    #[serde(default)]
    pub extra_languages: Vec<LanguageAlias>,
}

impl ParserConfig {
    /// The builtin table extended with the configured keywords.
    pub fn keyword_table(&self) -> KeywordTable {
        let mut table = KeywordTable::builtin();
        table.extend_junk(self.extra_junk_keywords.iter().cloned());
        table.extend_pack_keywords(self.extra_pack_keywords.iter().cloned());
        table.extend_languages(self.extra_languages.iter().cloned());
        table
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NotificationsConfig {
    /// Log every announcement
    #[serde(default = "default_true")]
    pub log: bool,

    /// POST announcements as JSON to this URL
    #[serde(default)]
    pub webhook_url: Option<String>,
}

fn default_true() -> bool {
    true
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            log: true,
            webhook_url: None,
        }
    }
}
