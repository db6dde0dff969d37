use serde::Deserialize;
use std::env;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{info, warn};

use crate::error::ConfigError;

/// Default deployment of the filter/photo/similarity API
pub const DEFAULT_API_BASE: &str = "https://lrm570w021.execute-api.eu-west-1.amazonaws.com/dev";

/// The similarity service never returns more than this many neighbours
pub const MAX_SIMILAR_LIMIT: usize = 500;

/// Runtime settings for the viewer
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL; endpoints are `{api_base}/filters`, `/photos` and `/similar`
    pub api_base: String,
    /// Neighbours requested per "more like this"
    pub similar_limit: usize,
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            similar_limit: MAX_SIMILAR_LIMIT,
            request_timeout_secs: 30,
        }
    }
}

impl Config {
    /// Load defaults, then the config file, then environment overrides.
    ///
    /// A missing file is fine; an unreadable or invalid one is logged and skipped.
    pub fn load() -> Self {
        let mut config = match Self::get_config_path() {
            Some(path) => match Self::from_file(&path) {
                Ok(Some(config)) => {
                    info!("⚙️  Loaded config from {}", path.display());
                    config
                }
                Ok(None) => Config::default(),
                Err(e) => {
                    warn!("⚠️  {}, using defaults", e);
                    Config::default()
                }
            },
            None => Config::default(),
        };

        config.apply_env(|key| env::var(key).ok());
        config.similar_limit = config.similar_limit.clamp(1, MAX_SIMILAR_LIMIT);
        config.api_base = config.api_base.trim_end_matches('/').to_string();
        config
    }

    /// Get the path where the config file is looked up:
    /// - Linux: ~/.config/track-photo-viewer/config.json
    /// - macOS: ~/Library/Application Support/track-photo-viewer/config.json
    /// - Windows: %APPDATA%\track-photo-viewer\config.json
    fn get_config_path() -> Option<PathBuf> {
        let mut path = dirs::config_dir()?;
        path.push("track-photo-viewer");
        path.push("config.json");
        Some(path)
    }

    /// Read a config file. `Ok(None)` if it does not exist.
    pub fn from_file(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }

        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        serde_json::from_str(&text)
            .map(Some)
            .map_err(|source| ConfigError::Parse {
                path: path.display().to_string(),
                source,
            })
    }

    /// Apply `TRACK_VIEWER_*` overrides read through `lookup`
    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(base) = lookup("TRACK_VIEWER_API_BASE") {
            self.api_base = base;
        }
        if let Some(limit) = parse_var(&lookup, "TRACK_VIEWER_SIMILAR_LIMIT") {
            self.similar_limit = limit;
        }
        if let Some(secs) = parse_var(&lookup, "TRACK_VIEWER_TIMEOUT_SECS") {
            self.request_timeout_secs = secs;
        }
    }

    pub fn filters_url(&self) -> String {
        format!("{}/filters", self.api_base)
    }

    pub fn photos_url(&self) -> String {
        format!("{}/photos", self.api_base)
    }

    pub fn similar_url(&self) -> String {
        format!("{}/similar", self.api_base)
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T>
where
    T::Err: Display,
{
    let raw = lookup(key)?;
    raw.trim()
        .parse()
        .map_err(|e| warn!("⚠️  Invalid {key} value {raw:?}: {e}"))
        .ok()
}
