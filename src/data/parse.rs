use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::warn;

use crate::error::RecordError;
use crate::records::{ForecastSample, Incident, TimeWindow, Tower};

const TIMESTAMP_FORMATS: [&str; 6] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Iterate data rows of a headed table, tagging each with its source line
fn rows(text: &str) -> impl Iterator<Item = (usize, Result<StringRecord, csv::Error>)> + '_ {
    let reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    reader.into_records().enumerate().map(|(idx, result)| {
        let line = result
            .as_ref()
            .ok()
            .and_then(|r| r.position())
            .map(|p| p.line() as usize)
            .unwrap_or(idx + 2);
        (line, result)
    })
}

fn field<'r>(record: &'r StringRecord, idx: usize) -> &'r str {
    record.get(idx).unwrap_or("")
}

/// Numeric field; anything unreadable (including an empty field) is NaN
fn number(text: &str) -> f64 {
    text.trim().parse::<f64>().unwrap_or(f64::NAN)
}

/// Parse a forecast timestamp. Accepts `YYYY-MM-DD HH:MM[:SS[.fff]]` (space
/// or `T`), a bare `YYYY-MM-DD` (midnight) and RFC 3339 with an offset, which
/// is normalized to UTC.
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_utc());
    }
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Build a tower from one row (`id, latitude, longitude, ...`)
pub fn tower_from_record(row: usize, record: &StringRecord) -> Result<Tower, RecordError> {
    let id = field(record, 0);
    if id.is_empty() {
        return Err(RecordError::MissingId { row });
    }

    let coordinate = |idx: usize, name: &'static str| {
        let raw = field(record, idx);
        let value = number(raw);
        if value.is_finite() {
            Ok(value)
        } else {
            Err(RecordError::BadCoordinate {
                row,
                field: name,
                value: raw.to_string(),
            })
        }
    };

    Ok(Tower {
        id: id.to_string(),
        lat: coordinate(1, "latitude")?,
        lon: coordinate(2, "longitude")?,
    })
}

/// Parse the tower table, dropping rows that cannot be placed on the map
pub fn parse_towers(text: &str) -> Vec<Tower> {
    let mut towers = Vec::new();
    for (row, result) in rows(text) {
        let parsed = result
            .map_err(|e| RecordError::Malformed {
                row,
                detail: e.to_string(),
            })
            .and_then(|record| tower_from_record(row, &record));

        match parsed {
            Ok(tower) => towers.push(tower),
            Err(e) => warn!("dropping tower: {e}"),
        }
    }
    towers
}

/// Build an incident from one row
/// (`start, end, location, latitude, longitude, category, radius_km`)
pub fn incident_from_record(record: &StringRecord) -> Incident {
    Incident {
        window: TimeWindow::parse(field(record, 0), field(record, 1)),
        location: field(record, 2).to_string(),
        lat: number(field(record, 3)),
        lon: number(field(record, 4)),
        category: field(record, 5).to_string(),
        radius_km: number(field(record, 6)),
    }
}

/// Parse the incident table. Rows are kept even when a number is unreadable;
/// it becomes NaN.
pub fn parse_incidents(text: &str) -> Vec<Incident> {
    let mut incidents = Vec::new();
    for (row, result) in rows(text) {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                warn!("skipping unreadable incident row {row}: {e}");
                continue;
            }
        };
        let incident = incident_from_record(&record);
        if !incident.has_valid_geometry() {
            warn!(
                "incident {:?} on row {row} has unusable geometry and will never match a tower",
                incident.location
            );
        }
        incidents.push(incident);
    }
    incidents
}

/// Build a forecast sample from one row
/// (`tower_id, timestamp, sessions, throughput_mbps, latency_ms`)
pub fn forecast_from_record(record: &StringRecord) -> ForecastSample {
    let timestamp_text = field(record, 1).to_string();
    ForecastSample {
        tower_id: field(record, 0).to_string(),
        timestamp: parse_timestamp(&timestamp_text),
        timestamp_text,
        sessions: number(field(record, 2)),
        throughput_mbps: number(field(record, 3)),
        latency_ms: number(field(record, 4)),
    }
}

pub fn parse_forecasts(text: &str) -> Vec<ForecastSample> {
    let mut samples = Vec::new();
    let mut unusable = 0usize;
    for (row, result) in rows(text) {
        match result {
            Ok(record) => {
                let sample = forecast_from_record(&record);
                if !sample.is_usable() || sample.timestamp.is_none() {
                    unusable += 1;
                }
                samples.push(sample);
            }
            Err(e) => warn!("skipping unreadable forecast row {row}: {e}"),
        }
    }
    if unusable > 0 {
        warn!("{unusable} forecast rows have malformed timestamps or load figures");
    }
    samples
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_towers_skip_header_and_trailing_columns() {
        let text = "tower_id,latitude,longitude,sessions,status\n\
                    KFA905,32.802639,-96.811944,,\n\
                    KKG410,32.792361,-96.785833,,\n";
        let towers = parse_towers(text);
        assert_eq!(towers.len(), 2);
        assert_eq!(towers[0].id, "KFA905");
        assert_eq!(towers[1].lon, -96.785833);
    }

    #[test]
    fn test_towers_drop_bad_rows() {
        let text = "tower_id,latitude,longitude\n\
                    ,32.8,-96.8\n\
                    A1,abc,-96.8\n\
                    A2,32.8,\n\
                    A3,inf,-96.8\n\
                    A4\n\
                    A5,32.8,-96.8\n";
        let towers = parse_towers(text);
        assert_eq!(towers.len(), 1);
        assert_eq!(towers[0].id, "A5");
    }

    #[test]
    fn test_tower_error_reasons() {
        let record = StringRecord::from(vec!["", "1", "2"]);
        assert_eq!(
            tower_from_record(2, &record),
            Err(RecordError::MissingId { row: 2 })
        );

        let record = StringRecord::from(vec!["T", "1", "east"]);
        assert!(matches!(
            tower_from_record(3, &record),
            Err(RecordError::BadCoordinate { field: "longitude", .. })
        ));
    }

    #[test]
    fn test_incidents_positional() {
        let text = "start_time,end_time,location,latitude,longitude,emergency_type,radius_km\n\
                    19:15,20:30,Reunion Blvd,32.776,-96.8065,Gas leak,1.0\n";
        let incidents = parse_incidents(text);
        assert_eq!(incidents.len(), 1);
        let gas = &incidents[0];
        assert_eq!(gas.window.start, 19 * 60 + 15);
        assert_eq!(gas.window.end, 20 * 60 + 30);
        assert_eq!(gas.location, "Reunion Blvd");
        assert_eq!(gas.category, "Gas leak");
        assert_eq!(gas.radius_km, 1.0);
    }

    #[test]
    fn test_incident_bad_numbers_are_nan() {
        let text = "start,end,location,lat,lon,type,radius\n\
                    08:00,09:00,Somewhere,north,-96.8,Fire,\n";
        let incidents = parse_incidents(text);
        assert_eq!(incidents.len(), 1);
        assert!(incidents[0].lat.is_nan());
        assert!(incidents[0].radius_km.is_nan());
        assert!(!incidents[0].has_valid_geometry());
    }

    #[test]
    fn test_forecasts_parse() {
        let text = "tower_id,timestamp,predicted_sessions,projected_throughput,predicted_latency\n\
                    KFA905,2024-01-01 00:02:00,71,2500.0,46.6\n\
                    KFA905,not a time,x,2500.0,46.6\n";
        let samples = parse_forecasts(text);
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].sessions, 71.0);
        assert_eq!(samples[0].throughput_mbps, 2500.0);
        assert!(samples[0].timestamp.is_some());
        assert!(samples[0].is_usable());
        assert!(samples[1].timestamp.is_none());
        assert!(!samples[1].is_usable());
    }

    #[test]
    fn test_timestamp_formats() {
        let a = parse_timestamp("2024-01-01 00:02:00").unwrap();
        let b = parse_timestamp("2024-01-01T00:02:00").unwrap();
        let c = parse_timestamp("2024-01-01T01:02:00+01:00").unwrap();
        assert_eq!(a, b);
        assert_eq!(a, c);
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_fractional_and_date_only_timestamps() {
        let whole = parse_timestamp("2024-01-01 00:02:00").unwrap();
        let frac = parse_timestamp("2024-01-01 00:02:00.500").unwrap();
        assert!(frac > whole);
        assert_eq!(parse_timestamp("2024-01-01T00:02:00.500"), Some(frac));

        let day = parse_timestamp("2024-01-02").unwrap();
        assert_eq!(day, parse_timestamp("2024-01-02 00:00:00").unwrap());
        assert!(day > parse_timestamp("2024-01-01 12:00:00").unwrap());
    }
}
