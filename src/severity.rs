use crate::records::ForecastSample;
use serde::Serialize;
use std::fmt;

/// Sessions above this are congested
pub const CONGESTED_SESSIONS: f64 = 2000.0;
/// Sessions above this are high load
pub const HIGH_SESSIONS: f64 = 1500.0;
/// Projected throughput below this (Mbps) is degraded
pub const MIN_THROUGHPUT_MBPS: f64 = 1500.0;

/// Load state of a tower, ordered so that `Congested` is the maximum
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub enum SeverityTier {
    #[default]
    Normal,
    High,
    Congested,
}

impl SeverityTier {
    pub const ALL: [SeverityTier; 3] = [
        SeverityTier::Normal,
        SeverityTier::High,
        SeverityTier::Congested,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SeverityTier::Normal => "Normal",
            SeverityTier::High => "High",
            SeverityTier::Congested => "Congested",
        }
    }
}

impl fmt::Display for SeverityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classify a tower's latest forecast.
///
/// No sample, or a sample whose sessions/throughput are not finite, is
/// `Normal`. Otherwise the branches are checked in this order:
///
/// 1. sessions > 2000 or throughput < 1500 → `Congested`
/// 2. sessions > 1500 or throughput < 1500 → `High`
/// 3. otherwise → `Normal`
///
/// The throughput clause of branch 2 can never fire because branch 1 already
/// takes every throughput below 1500. It is kept so the three branches read
/// the same as the published thresholds.
pub fn classify(sample: Option<&ForecastSample>) -> SeverityTier {
    let Some(f) = sample.filter(|f| f.is_usable()) else {
        return SeverityTier::Normal;
    };
    let sessions = f.sessions;
    let throughput = f.throughput_mbps;

    if sessions > CONGESTED_SESSIONS || throughput < MIN_THROUGHPUT_MBPS {
        SeverityTier::Congested
    } else if sessions > HIGH_SESSIONS || throughput < MIN_THROUGHPUT_MBPS {
        SeverityTier::High
    } else {
        SeverityTier::Normal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(sessions: f64, throughput: f64) -> ForecastSample {
        ForecastSample {
            tower_id: "T".into(),
            timestamp_text: "2024-01-01 00:00:00".into(),
            timestamp: None,
            sessions,
            throughput_mbps: throughput,
            latency_ms: 50.0,
        }
    }

    #[test]
    fn test_absent_is_normal() {
        assert_eq!(classify(None), SeverityTier::Normal);
    }

    #[test]
    fn test_thresholds() {
        assert_eq!(classify(Some(&sample(2001.0, 2500.0))), SeverityTier::Congested);
        assert_eq!(classify(Some(&sample(2000.0, 2500.0))), SeverityTier::High);
        assert_eq!(classify(Some(&sample(1501.0, 2500.0))), SeverityTier::High);
        assert_eq!(classify(Some(&sample(1500.0, 2500.0))), SeverityTier::Normal);
        assert_eq!(classify(Some(&sample(88.0, 1500.0))), SeverityTier::Normal);
    }

    #[test]
    fn test_low_throughput_is_congested_not_high() {
        assert_eq!(classify(Some(&sample(10.0, 1499.9))), SeverityTier::Congested);
        assert_eq!(classify(Some(&sample(1600.0, 1000.0))), SeverityTier::Congested);
    }

    #[test]
    fn test_nan_fields_mean_no_forecast() {
        assert_eq!(classify(Some(&sample(f64::NAN, 100.0))), SeverityTier::Normal);
        assert_eq!(classify(Some(&sample(5000.0, f64::NAN))), SeverityTier::Normal);
    }

    #[test]
    fn test_tier_order() {
        assert!(SeverityTier::Congested > SeverityTier::High);
        assert!(SeverityTier::High > SeverityTier::Normal);
        assert_eq!(SeverityTier::ALL.iter().max(), Some(&SeverityTier::Congested));
    }
}
