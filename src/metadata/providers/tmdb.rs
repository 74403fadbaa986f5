//! TMDB (The Movie Database) metadata provider.
//!
//! Implements [`MetadataProvider`] by querying the TMDB v3 REST API.
//!
//! Features:
//! - Token-bucket rate limiting via [`governor`] (4 requests / second by default).
//! - 10-second request timeout; a timed-out request is an ordinary error.
//! - Detail lookups append `videos` so the first YouTube trailer comes back
//!   in the same response.
//! - Missing fields in a response default to empty values.

use std::num::NonZeroU32;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use governor::{Quota, RateLimiter};
use reelhook_common::ContentKind;
use serde::Deserialize;
use tracing::debug;

use crate::config::MetadataConfig;
use crate::metadata::provider::{CatalogMetadata, MetadataProvider, SearchCandidate};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const TMDB_BASE_URL: &str = "https://api.themoviedb.org/3";
const TMDB_POSTER_BASE: &str = "https://image.tmdb.org/t/p/w500";
const TMDB_BACKDROP_BASE: &str = "https://image.tmdb.org/t/p/original";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_RATE_LIMIT: u32 = 4;

// ---------------------------------------------------------------------------
// TMDB API response types (private)
// ---------------------------------------------------------------------------

// TMDB both omits arrays and sends them as `null`.

#[derive(Debug, Deserialize)]
struct TmdbSearchResponse {
    #[serde(default)]
    results: Option<Vec<TmdbSearchResult>>,
}

/// Movie results carry `title`, TV results carry `name`.
#[derive(Debug, Deserialize)]
struct TmdbSearchResult {
    #[serde(default)]
    id: Option<i64>,
    title: Option<String>,
    name: Option<String>,
    poster_path: Option<String>,
    backdrop_path: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TmdbDetail {
    id: Option<i64>,
    title: Option<String>,
    name: Option<String>,
    overview: Option<String>,
    poster_path: Option<String>,
    backdrop_path: Option<String>,
    release_date: Option<String>,
    first_air_date: Option<String>,
    vote_average: Option<f64>,
    genres: Option<Vec<TmdbGenre>>,
    videos: Option<TmdbVideos>,
}

#[derive(Debug, Deserialize)]
struct TmdbGenre {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct TmdbVideos {
    #[serde(default)]
    results: Option<Vec<TmdbVideo>>,
}

#[derive(Debug, Deserialize)]
struct TmdbVideo {
    key: Option<String>,
    site: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
}

// ---------------------------------------------------------------------------
// Provider implementation
// ---------------------------------------------------------------------------

/// TMDB metadata provider.
///
/// # Examples
///
/// ```no_run
/// use reelhook::metadata::providers::TmdbProvider;
///
/// let provider = TmdbProvider::new("your-api-key".into(), "en-US".into());
/// ```
pub struct TmdbProvider {
    client: reqwest::Client,
    api_key: String,
    language: String,
    base_url: String,
    rate_limiter: governor::RateLimiter<
        governor::state::NotKeyed,
        governor::state::InMemoryState,
        governor::clock::DefaultClock,
    >,
}

impl TmdbProvider {
    /// Create a provider against the public TMDB API with default timeout
    /// and rate limit.
    pub fn new(api_key: String, language: String) -> Self {
        Self::with_options(
            api_key,
            language,
            TMDB_BASE_URL.to_string(),
            DEFAULT_TIMEOUT,
            DEFAULT_RATE_LIMIT,
        )
    }

    /// Create a provider from the `[metadata]` config section.
    pub fn from_config(config: &MetadataConfig) -> Self {
        Self::with_options(
            config.tmdb_api_key.clone(),
            config.language.clone(),
            config.base_url.clone(),
            Duration::from_secs(config.timeout_secs),
            config.requests_per_second,
        )
    }

    /// Create a provider with every knob explicit.
    pub fn with_options(
        api_key: String,
        language: String,
        base_url: String,
        timeout: Duration,
        requests_per_second: u32,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to build HTTP client: {}", e);
                reqwest::Client::new()
            });

        let per_second = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);
        let rate_limiter = RateLimiter::direct(Quota::per_second(per_second));

        Self {
            client,
            api_key,
            language,
            base_url: base_url.trim_end_matches('/').to_string(),
            rate_limiter,
        }
    }

    /// Execute a rate-limited GET and decode the JSON body.
    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> anyhow::Result<T> {
        self.rate_limiter.until_ready().await;

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("TMDB request failed: {}", redact(url)))?
            .error_for_status()
            .with_context(|| format!("TMDB request returned error: {}", redact(url)))?;

        resp.json()
            .await
            .with_context(|| format!("failed to parse TMDB response: {}", redact(url)))
    }

    /// Build a full API URL with the API key and language query parameters.
    fn url(&self, path: &str, extra_params: &[(&str, &str)]) -> String {
        let mut url = format!(
            "{}{path}?api_key={}&language={}",
            self.base_url,
            urlencoded(&self.api_key),
            urlencoded(&self.language)
        );
        for (key, value) in extra_params {
            url.push('&');
            url.push_str(key);
            url.push('=');
            url.push_str(&urlencoded(value));
        }
        url
    }
}

/// Path segment for a search mode.
fn mode_path(mode: ContentKind) -> &'static str {
    match mode {
        ContentKind::Movie => "movie",
        ContentKind::Series => "tv",
    }
}

/// Minimal percent-encoding for query parameter values.
fn urlencoded(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char);
            }
            b' ' => out.push('+'),
            _ => {
                out.push('%');
                out.push(char::from(HEX[(b >> 4) as usize]));
                out.push(char::from(HEX[(b & 0x0f) as usize]));
            }
        }
    }
    out
}

const HEX: [u8; 16] = *b"0123456789ABCDEF";

/// Strip the API key from a URL before it reaches a log line or error.
fn redact(url: &str) -> String {
    match url.find("api_key=") {
        Some(start) => {
            let value_start = start + "api_key=".len();
            let value_end = url[value_start..]
                .find('&')
                .map_or(url.len(), |i| value_start + i);
            format!("{}***{}", &url[..value_start], &url[value_end..])
        }
        None => url.to_string(),
    }
}

/// Convert a TMDB image path fragment to a full URL.
fn image_url(base: &str, path: Option<String>) -> Option<String> {
    path.filter(|p| !p.is_empty()).map(|p| format!("{base}{p}"))
}

/// Treat empty strings as absent.
fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|s| !s.trim().is_empty())
}

fn first_trailer(videos: Option<TmdbVideos>) -> Option<String> {
    videos?.results?.into_iter().find_map(|v| {
        let is_trailer = v.kind.as_deref() == Some("Trailer") && v.site.as_deref() == Some("YouTube");
        if is_trailer {
            non_empty(v.key)
        } else {
            None
        }
    })
}

#[async_trait]
impl MetadataProvider for TmdbProvider {
    fn name(&self) -> &'static str {
        "tmdb"
    }

    fn is_available(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    async fn search(
        &self,
        title: &str,
        mode: ContentKind,
        year: Option<&str>,
    ) -> anyhow::Result<Vec<SearchCandidate>> {
        let mut params = vec![("query", title)];
        if let (ContentKind::Movie, Some(year)) = (mode, year) {
            params.push(("primary_release_year", year));
        }

        let url = self.url(&format!("/search/{}", mode_path(mode)), &params);
        debug!(url = %redact(&url), "TMDB search");

        let body: TmdbSearchResponse = self.get_json(&url).await?;

        Ok(body
            .results
            .unwrap_or_default()
            .into_iter()
            .filter_map(|r| {
                Some(SearchCandidate {
                    id: r.id?,
                    title: r.title.or(r.name).unwrap_or_default(),
                    poster_url: image_url(TMDB_POSTER_BASE, r.poster_path),
                    backdrop_url: image_url(TMDB_BACKDROP_BASE, r.backdrop_path),
                })
            })
            .collect())
    }

    async fn detail(&self, id: i64, mode: ContentKind) -> anyhow::Result<CatalogMetadata> {
        let url = self.url(
            &format!("/{}/{id}", mode_path(mode)),
            &[("append_to_response", "videos")],
        );
        debug!(url = %redact(&url), "TMDB detail");

        let detail: TmdbDetail = self.get_json(&url).await?;

        Ok(CatalogMetadata {
            catalog_id: detail.id.unwrap_or(id),
            title: non_empty(detail.title)
                .or_else(|| non_empty(detail.name))
                .unwrap_or_default(),
            poster_url: image_url(TMDB_POSTER_BASE, detail.poster_path),
            backdrop_url: image_url(TMDB_BACKDROP_BASE, detail.backdrop_path),
            overview: detail.overview.unwrap_or_default(),
            release_date: non_empty(detail.release_date).or_else(|| non_empty(detail.first_air_date)),
            rating: detail.vote_average,
            genres: detail
                .genres
                .unwrap_or_default()
                .into_iter()
                .filter_map(|g| non_empty(g.name))
                .collect(),
            trailer_key: first_trailer(detail.videos),
        })
    }
}
