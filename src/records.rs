use chrono::{NaiveDateTime, Timelike};
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::TimeParseError;

pub const MINUTES_PER_DAY: u16 = 24 * 60;

/// A point in the day, in minutes since midnight (0..=1439)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MinuteOfDay(u16);

impl MinuteOfDay {
    pub const MIDNIGHT: MinuteOfDay = MinuteOfDay(0);
    pub const LAST: MinuteOfDay = MinuteOfDay(MINUTES_PER_DAY - 1);

    pub fn new(minutes: u16) -> Option<Self> {
        (minutes < MINUTES_PER_DAY).then_some(Self(minutes))
    }

    pub fn from_hm(hour: u16, minute: u16) -> Option<Self> {
        if hour < 24 && minute < 60 {
            Some(Self(hour * 60 + minute))
        } else {
            None
        }
    }

    /// Minute of day of any chrono time-like value (seconds are truncated)
    pub fn from_time<T: Timelike>(time: &T) -> Self {
        Self((time.hour() * 60 + time.minute()) as u16)
    }

    pub fn get(self) -> u16 {
        self.0
    }

    pub fn hour(self) -> u16 {
        self.0 / 60
    }

    pub fn minute(self) -> u16 {
        self.0 % 60
    }

    /// Move by a signed number of minutes, clamped to the day
    pub fn offset_clamped(self, delta: i32) -> Self {
        let moved = (self.0 as i32 + delta).clamp(0, MINUTES_PER_DAY as i32 - 1);
        Self(moved as u16)
    }
}

impl fmt::Display for MinuteOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl FromStr for MinuteOfDay {
    type Err = TimeParseError;

    /// Strict `HH:MM` parse, used for user-supplied times
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || TimeParseError(s.to_string());
        let (h, m) = s.trim().split_once(':').ok_or_else(err)?;
        let hour: u16 = h.parse().map_err(|_| err())?;
        let minute: u16 = m.parse().map_err(|_| err())?;
        Self::from_hm(hour, minute).ok_or_else(err)
    }
}

impl Serialize for MinuteOfDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Read an `HH:MM` field the forgiving way: each part contributes its leading
/// digits, anything unreadable counts as zero. The result is not clamped, so
/// "25:00" stays 1500.
pub fn lenient_minutes(text: &str) -> u32 {
    let mut parts = text.trim().splitn(2, ':');
    let hours = parts.next().map(leading_number).unwrap_or(0);
    let minutes = parts.next().map(leading_number).unwrap_or(0);
    hours.saturating_mul(60).saturating_add(minutes)
}

fn leading_number(part: &str) -> u32 {
    let part = part.trim_start();
    let end = part
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(part.len());
    part[..end].parse().unwrap_or(0)
}

fn write_clock(f: &mut fmt::Formatter<'_>, minutes: u32) -> fmt::Result {
    write!(f, "{:02}:{:02}", (minutes / 60) % 24, minutes % 60)
}

/// Daily start/end window of an incident, in minutes since midnight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeWindow {
    pub start: u32,
    pub end: u32,
}

impl TimeWindow {
    pub fn parse(start: &str, end: &str) -> Self {
        Self {
            start: lenient_minutes(start),
            end: lenient_minutes(end),
        }
    }

    /// True when the window runs past midnight ("22:00" to "02:00")
    pub fn wraps_midnight(&self) -> bool {
        self.end < self.start
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_clock(f, self.start)?;
        f.write_str("–")?;
        write_clock(f, self.end)
    }
}

/// A fixed network access point
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tower {
    pub id: String,
    pub lat: f64,
    pub lon: f64,
}

/// Timestamped load prediction for one tower
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastSample {
    pub tower_id: String,
    /// Timestamp exactly as it appeared in the source
    pub timestamp_text: String,
    /// Parsed instant, `None` when the text was not a recognizable timestamp
    #[serde(skip)]
    pub timestamp: Option<NaiveDateTime>,
    pub sessions: f64,
    pub throughput_mbps: f64,
    pub latency_ms: f64,
}

impl ForecastSample {
    /// Whether the fields the classifier reads are real numbers
    pub fn is_usable(&self) -> bool {
        self.sessions.is_finite() && self.throughput_mbps.is_finite()
    }
}

/// A time-windowed emergency with a containment radius
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Incident {
    pub window: TimeWindow,
    pub location: String,
    pub lat: f64,
    pub lon: f64,
    pub category: String,
    pub radius_km: f64,
}

impl Incident {
    /// Non-finite coordinates or a negative radius mean the incident can
    /// never contain anything and is not drawn.
    pub fn has_valid_geometry(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && self.radius_km.is_finite()
            && self.radius_km >= 0.0
    }
}
