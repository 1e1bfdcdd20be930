use std::path::PathBuf;
use thiserror::Error;

/// A time-of-day string that is not `HH:MM`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid time of day {0:?}, expected HH:MM")]
pub struct TimeParseError(pub String);

/// Why a tower row was dropped by the parser
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecordError {
    #[error("row {row}: empty tower identifier")]
    MissingId { row: usize },

    #[error("row {row}: {field} {value:?} is not a finite number")]
    BadCoordinate {
        row: usize,
        field: &'static str,
        value: String,
    },

    #[error("row {row}: unreadable record: {detail}")]
    Malformed { row: usize, detail: String },
}

#[derive(Debug, Error)]
pub enum DataError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode GeoJSON in {path}: {detail}")]
    GeoJson { path: PathBuf, detail: String },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error(transparent)]
    Time(#[from] TimeParseError),
}
