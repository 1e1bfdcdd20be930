use crate::data::Tables;
use crate::emergency::apply_override;
use crate::forecast::latest_per_tower;
use crate::incident::{active_incidents, MidnightPolicy};
use crate::records::{ForecastSample, Incident, MinuteOfDay, TimeWindow, Tower};
use crate::severity::{classify, SeverityTier};
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

/// Immutable reference data, loaded once
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    towers: Vec<Tower>,
    incidents: Vec<Incident>,
    latest: HashMap<String, ForecastSample>,
}

/// Verdict for one tower at one query time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TowerStatus {
    /// Index into [`Dataset::towers`]
    pub tower: usize,
    /// Tier from the forecast alone
    pub base: SeverityTier,
    /// Tier after the emergency override
    pub tier: SeverityTier,
    /// Index into [`Dataset::incidents`] of the first active incident containing the tower
    pub incident: Option<usize>,
}

impl TowerStatus {
    /// Whether the emergency override changed the tier
    pub fn overridden(&self) -> bool {
        self.tier != self.base
    }
}

/// Result of evaluating every tower at one query time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub at: MinuteOfDay,
    pub policy: MidnightPolicy,
    pub towers: Vec<TowerStatus>,
    /// Indices into [`Dataset::incidents`] active at `at`
    pub active: Vec<usize>,
}

impl Evaluation {
    /// Number of towers per tier, indexed like [`SeverityTier::ALL`]
    pub fn counts(&self) -> [usize; 3] {
        let mut counts = [0; 3];
        for status in &self.towers {
            counts[status.tier as usize] += 1;
        }
        counts
    }

    pub fn overridden_count(&self) -> usize {
        self.towers.iter().filter(|s| s.overridden()).count()
    }
}

impl Dataset {
    pub fn new(tables: Tables) -> Self {
        let latest = latest_per_tower(&tables.forecasts);
        Self {
            towers: tables.towers,
            incidents: tables.incidents,
            latest,
        }
    }

    pub fn towers(&self) -> &[Tower] {
        &self.towers
    }

    pub fn incidents(&self) -> &[Incident] {
        &self.incidents
    }

    /// Latest forecast for a tower, if the forecast table mentions it
    pub fn latest_forecast(&self, tower_id: &str) -> Option<&ForecastSample> {
        self.latest.get(tower_id)
    }

    /// Classify every tower at `at`
    pub fn evaluate(&self, at: MinuteOfDay, policy: MidnightPolicy) -> Evaluation {
        let active = active_incidents(&self.incidents, at, policy);

        let towers = self
            .towers
            .iter()
            .enumerate()
            .map(|(idx, tower)| {
                let base = classify(self.latest_forecast(&tower.id));
                let verdict = apply_override(base, tower, &self.incidents, &active);
                TowerStatus {
                    tower: idx,
                    base,
                    tier: verdict.tier,
                    incident: verdict.incident,
                }
            })
            .collect();

        let evaluation = Evaluation {
            at,
            policy,
            towers,
            active,
        };
        debug!(
            "evaluated {} towers at {at}: {} active incidents, {} overridden",
            evaluation.towers.len(),
            evaluation.active.len(),
            evaluation.overridden_count()
        );
        evaluation
    }

    /// Serializable view of an evaluation for export
    pub fn snapshot<'a>(&'a self, evaluation: &Evaluation) -> Snapshot<'a> {
        Snapshot {
            at: evaluation.at,
            policy: evaluation.policy,
            towers: evaluation
                .towers
                .iter()
                .map(|status| {
                    let tower = &self.towers[status.tower];
                    TowerReport {
                        id: &tower.id,
                        lat: tower.lat,
                        lon: tower.lon,
                        tier: status.tier,
                        base: status.base,
                        overridden: status.overridden(),
                        incident: status.incident.map(|i| self.incidents[i].location.as_str()),
                        forecast: self.latest_forecast(&tower.id),
                    }
                })
                .collect(),
            active_incidents: evaluation
                .active
                .iter()
                .map(|&i| {
                    let incident = &self.incidents[i];
                    IncidentReport {
                        location: &incident.location,
                        category: &incident.category,
                        window: incident.window,
                        window_text: incident.window.to_string(),
                        radius_km: incident.radius_km,
                    }
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Snapshot<'a> {
    pub at: MinuteOfDay,
    pub policy: MidnightPolicy,
    pub towers: Vec<TowerReport<'a>>,
    pub active_incidents: Vec<IncidentReport<'a>>,
}

#[derive(Debug, Serialize)]
pub struct TowerReport<'a> {
    pub id: &'a str,
    pub lat: f64,
    pub lon: f64,
    pub tier: SeverityTier,
    pub base: SeverityTier,
    pub overridden: bool,
    pub incident: Option<&'a str>,
    pub forecast: Option<&'a ForecastSample>,
}

#[derive(Debug, Serialize)]
pub struct IncidentReport<'a> {
    pub location: &'a str,
    pub category: &'a str,
    pub window: TimeWindow,
    pub window_text: String,
    pub radius_km: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(text: &str) -> MinuteOfDay {
        text.parse().unwrap()
    }

    fn dataset() -> Dataset {
        Dataset::new(Tables::parse(
            "tower_id,latitude,longitude\n\
             NEAR,32.776,-96.8065\n\
             FAR,32.90,-96.60\n\
             BUSY,32.90,-96.70\n\
             NOFC,32.95,-96.60\n",
            "start_time,end_time,location,latitude,longitude,emergency_type,radius_km\n\
             19:15,20:30,Reunion Blvd,32.776,-96.8065,Gas leak,1.0\n",
            "tower_id,timestamp,predicted_sessions,projected_throughput,predicted_latency\n\
             NEAR,2024-01-01 00:00:00,50,2500.0,40\n\
             FAR,2024-01-01 00:00:00,50,2500.0,40\n\
             BUSY,2024-01-01 00:00:00,50,2500.0,40\n\
             BUSY,2024-01-01 00:01:00,1800,2500.0,40\n\
             GHOST,2024-01-01 00:00:00,5000,100.0,40\n",
        ))
    }

    #[test]
    fn test_override_only_inside_window() {
        let ds = dataset();

        let during = ds.evaluate(t("19:30"), MidnightPolicy::Literal);
        assert_eq!(during.active, vec![0]);
        assert_eq!(during.towers[0].tier, SeverityTier::Congested);
        assert_eq!(during.towers[0].base, SeverityTier::Normal);
        assert!(during.towers[0].overridden());
        assert_eq!(during.towers[0].incident, Some(0));
        assert_eq!(during.towers[1].tier, SeverityTier::Normal);

        let before = ds.evaluate(t("19:14"), MidnightPolicy::Literal);
        assert!(before.active.is_empty());
        assert_eq!(before.towers[0].tier, SeverityTier::Normal);
        assert!(!before.towers[0].overridden());
    }

    #[test]
    fn test_base_tier_from_latest_sample() {
        let ds = dataset();
        let eval = ds.evaluate(t("12:00"), MidnightPolicy::Literal);
        assert_eq!(eval.towers[2].tier, SeverityTier::High);
        assert_eq!(eval.towers[3].tier, SeverityTier::Normal);
        assert!(ds.latest_forecast("NOFC").is_none());
        assert_eq!(eval.counts(), [3, 1, 0]);
    }

    #[test]
    fn test_evaluation_is_repeatable() {
        let ds = dataset();
        let a = ds.evaluate(t("19:30"), MidnightPolicy::Literal);
        let b = ds.evaluate(t("19:30"), MidnightPolicy::Literal);
        assert_eq!(a, b);
    }

    #[test]
    fn test_snapshot_fields() {
        let ds = dataset();
        let eval = ds.evaluate(t("19:30"), MidnightPolicy::Literal);
        let snap = ds.snapshot(&eval);
        assert_eq!(snap.towers[0].id, "NEAR");
        assert!(snap.towers[0].overridden);
        assert_eq!(snap.towers[0].incident, Some("Reunion Blvd"));
        assert!(snap.towers[3].forecast.is_none());
        assert_eq!(snap.active_incidents[0].window_text, "19:15–20:30");

        let json = serde_json::to_value(&snap).unwrap();
        assert_eq!(json["at"], "19:30");
        assert_eq!(json["towers"][0]["tier"], "Congested");
        assert_eq!(json["policy"], "literal");
    }
}
