use crate::error::ConfigError;
use crate::incident::MidnightPolicy;
use crate::records::MinuteOfDay;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "netload.toml";

/// Dashboard configuration from `netload.toml`. Every key has a default, so a
/// missing or partial file is fine. Severity thresholds are not configurable.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data: DataConfig,
    pub map: MapConfig,
    pub clock: ClockConfig,
    pub log: LogConfig,
    pub places: Vec<PlaceConfig>,
}

/// Where the source tables live
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub towers: PathBuf,
    pub incidents: PathBuf,
    pub forecasts: PathBuf,
    /// Directory scanned for GeoJSON basemap files
    pub basemap_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            towers: PathBuf::from("data/towers.csv"),
            incidents: PathBuf::from("data/incidents.csv"),
            forecasts: PathBuf::from("data/forecast.csv"),
            basemap_dir: PathBuf::from("data"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub center_lat: f64,
    pub center_lon: f64,
    pub zoom: f64,
    /// Zoom used when flying to a looked-up place
    pub fly_to_zoom: f64,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            center_lat: 32.7767,
            center_lon: -96.797,
            zoom: 4000.0,
            fly_to_zoom: 16000.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    /// Seconds between live clock samples
    pub refresh_secs: u64,
    /// Initial manual time, `HH:MM`
    pub manual_start: String,
    pub manual_step_minutes: u16,
    /// Treat windows like "22:00"–"02:00" as spanning midnight
    pub midnight_wrap: bool,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            refresh_secs: 60,
            manual_start: "09:00".to_string(),
            manual_step_minutes: 5,
            midnight_wrap: false,
        }
    }
}

impl ClockConfig {
    pub fn refresh(&self) -> Duration {
        Duration::from_secs(self.refresh_secs.max(1))
    }

    pub fn manual_start(&self) -> Result<MinuteOfDay, ConfigError> {
        Ok(self.manual_start.parse()?)
    }

    pub fn policy(&self) -> MidnightPolicy {
        MidnightPolicy::from_wrap_flag(self.midnight_wrap)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub file: PathBuf,
    /// Default filter when `RUST_LOG` is unset
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from("netload-map.log"),
            filter: "info".to_string(),
        }
    }
}

/// A named place for location lookup
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlaceConfig {
    pub label: String,
    pub lat: f64,
    pub lon: f64,
}

impl Config {
    pub fn from_toml(text: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(text).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })?;
        config.clock.manual_start()?;
        Ok(config)
    }

    /// Load configuration. An explicit path must exist; without one,
    /// `netload.toml` in the working directory is used if present.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };

        match fs::read_to_string(&path) {
            Ok(text) => Self::from_toml(&text, &path),
            Err(e) if !required && e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Io { path, source }),
        }
    }
}
