mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Environment variable consulted when no TMDB key is configured.
pub const TMDB_API_KEY_ENV: &str = "TMDB_API_KEY";

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let mut config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    prepare(&mut config);
    for warning in validate_config(&config)? {
        tracing::warn!("{}", warning);
    }

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = [
        "./reelhook.toml",
        "~/.config/reelhook/config.toml",
        "/etc/reelhook/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    let mut config = Config::default();
    prepare(&mut config);
    Ok(config)
}

fn prepare(config: &mut Config) {
    apply_env_with(config, |key| std::env::var(key).ok());
    let expanded = shellexpand::tilde(&config.database.path.to_string_lossy()).into_owned();
    config.database.path = PathBuf::from(expanded);
}

/// Fill settings that may come from the environment. `lookup` stands in
/// for `std::env::var`.
pub fn apply_env_with(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    if config.metadata.tmdb_api_key.trim().is_empty() {
        if let Some(key) = lookup(TMDB_API_KEY_ENV).filter(|k| !k.trim().is_empty()) {
            config.metadata.tmdb_api_key = key;
        }
    }
}

/// Validate configuration.
///
/// Hard errors fail; soft problems come back as warnings.
pub fn validate_config(config: &Config) -> Result<Vec<String>> {
    let mut warnings = Vec::new();

    if config.metadata.timeout_secs == 0 {
        anyhow::bail!("metadata.timeout_secs cannot be 0");
    }
    if config.metadata.requests_per_second == 0 {
        anyhow::bail!("metadata.requests_per_second cannot be 0");
    }
    if !config.metadata.base_url.starts_with("http://")
        && !config.metadata.base_url.starts_with("https://")
    {
        anyhow::bail!(
            "metadata.base_url must be an http(s) URL: {}",
            config.metadata.base_url
        );
    }

    if let Some(url) = &config.notifications.webhook_url {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            anyhow::bail!("notifications.webhook_url must be an http(s) URL: {}", url);
        }
    }

    if config.metadata.tmdb_api_key.trim().is_empty() {
        warnings.push(format!(
            "No TMDB API key configured (set metadata.tmdb_api_key or {TMDB_API_KEY_ENV}); every upload will create a placeholder"
        ));
    }

    for alias in &config.parser.extra_languages {
        if alias.labels.is_empty() {
            warnings.push(format!(
                "Language keyword '{}' has no labels and will never be reported",
                alias.keyword
            ));
        }
    }

    if !config.notifications.log && config.notifications.webhook_url.is_none() {
        warnings.push("All notification targets are disabled".to_string());
    }

    Ok(warnings)
}
