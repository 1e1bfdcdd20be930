pub mod basemap;
pub mod parse;
pub mod sample;

pub use parse::{parse_forecasts, parse_incidents, parse_towers};

use crate::config::DataConfig;
use crate::error::DataError;
use crate::records::{ForecastSample, Incident, Tower};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// The three source tables, parsed
#[derive(Debug, Clone, Default)]
pub struct Tables {
    pub towers: Vec<Tower>,
    pub incidents: Vec<Incident>,
    pub forecasts: Vec<ForecastSample>,
}

impl Tables {
    /// Parse raw table text
    pub fn parse(towers: &str, incidents: &str, forecasts: &str) -> Self {
        Self {
            towers: parse_towers(towers),
            incidents: parse_incidents(incidents),
            forecasts: parse_forecasts(forecasts),
        }
    }

    /// The embedded downtown Dallas sample
    pub fn sample() -> Self {
        Self::parse(
            sample::TOWERS_CSV,
            sample::INCIDENTS_CSV,
            sample::FORECAST_CSV,
        )
    }
}

/// Load all tables named in the config. A missing file falls back to the
/// embedded sample for that table; any other read failure is an error.
pub fn load_tables(config: &DataConfig) -> Result<Tables, DataError> {
    let towers = read_or_sample(&config.towers, sample::TOWERS_CSV)?;
    let incidents = read_or_sample(&config.incidents, sample::INCIDENTS_CSV)?;
    let forecasts = read_or_sample(&config.forecasts, sample::FORECAST_CSV)?;

    let tables = Tables::parse(&towers, &incidents, &forecasts);
    info!(
        "loaded {} towers, {} incidents, {} forecast samples",
        tables.towers.len(),
        tables.incidents.len(),
        tables.forecasts.len()
    );
    Ok(tables)
}

fn read_or_sample(path: &Path, fallback: &str) -> Result<String, DataError> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(text),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!("{} not found, using built-in sample", path.display());
            Ok(fallback.to_string())
        }
        Err(source) => Err(DataError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}
