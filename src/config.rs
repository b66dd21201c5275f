//! Runtime configuration.
//!
//! Values come from built-in defaults, then an optional TOML file (the user
//! config dir or an explicit path), then `FOLIO_*` environment overrides.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub target_row_height: f64,
    pub gap: u32,
    pub max_row_height: f64,
    pub cache_entries: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            target_row_height: 300.0,
            gap: 16,
            max_row_height: 500.0,
            cache_entries: 8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Images wider than this get a downscaled display copy.
    pub max_width: u32,
    pub jpeg_quality: u8,
    /// Width synthesized for images that fail to load (3:2 aspect).
    pub fallback_width: u32,
    pub max_concurrent: usize,
    pub fetch_timeout_secs: u64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_width: 1920,
            jpeg_quality: 85,
            fallback_width: 1200,
            max_concurrent: 6,
            fetch_timeout_secs: 30,
        }
    }
}

impl ResolverConfig {
    pub fn fallback_dimensions(&self) -> (u32, u32) {
        let width = self.max_width.min(self.fallback_width).max(3);
        (width, width * 2 / 3)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GalleryConfig {
    /// Navigation requests inside this window after a move are ignored.
    pub transition_ms: u64,
    /// Taps this soon after opening are not treated as fullscreen requests.
    pub fullscreen_debounce_ms: u64,
    pub swipe_threshold_px: f64,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            transition_ms: 250,
            fullscreen_debounce_ms: 300,
            swipe_threshold_px: 50.0,
        }
    }
}

impl GalleryConfig {
    pub fn transition(&self) -> Duration {
        Duration::from_millis(self.transition_ms)
    }

    pub fn fullscreen_debounce(&self) -> Duration {
        Duration::from_millis(self.fullscreen_debounce_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CarouselConfig {
    pub interval_ms: u64,
}

impl Default for CarouselConfig {
    fn default() -> Self {
        Self { interval_ms: 4000 }
    }
}

impl CarouselConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FolioConfig {
    pub layout: LayoutConfig,
    pub resolver: ResolverConfig,
    pub gallery: GalleryConfig,
    pub carousel: CarouselConfig,
}

impl FolioConfig {
    /// Default config file location (`$XDG_CONFIG_HOME/folio/config.toml` on Linux).
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "folio").map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }

    /// Loads config from `path`, or from the default location if it exists,
    /// then applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path().filter(|p| p.is_file()) {
                Some(path) => Self::from_file(&path)?,
                None => {
                    debug!("No config file found, using defaults");
                    Self::default()
                }
            },
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(?path, "Loaded config file");
        Ok(config)
    }

    /// Applies `FOLIO_*` overrides; unparsable values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        override_value(&lookup, "FOLIO_TARGET_ROW_HEIGHT", &mut self.layout.target_row_height);
        override_value(&lookup, "FOLIO_GAP", &mut self.layout.gap);
        override_value(&lookup, "FOLIO_MAX_ROW_HEIGHT", &mut self.layout.max_row_height);
        override_value(&lookup, "FOLIO_MAX_WIDTH", &mut self.resolver.max_width);
        override_value(&lookup, "FOLIO_MAX_CONCURRENT", &mut self.resolver.max_concurrent);
        override_value(&lookup, "FOLIO_AUTOPLAY_MS", &mut self.carousel.interval_ms);
    }
}

fn override_value<F, T>(lookup: &F, key: &str, slot: &mut T)
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    let Some(raw) = lookup(key) else {
        return;
    };
    match raw.trim().parse::<T>() {
        Ok(value) => *slot = value,
        Err(_) => warn!(key, value = %raw, "Ignoring invalid config override"),
    }
}
