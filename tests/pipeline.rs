use netload_map::data::Tables;
use netload_map::evaluate::Dataset;
use netload_map::geo::EARTH_RADIUS_KM;
use netload_map::incident::MidnightPolicy;
use netload_map::records::{MinuteOfDay, Tower};
use netload_map::severity::SeverityTier;

fn at(text: &str) -> MinuteOfDay {
    text.parse().unwrap()
}

/// Tower `km` due north of a point; haversine along a meridian is exact
fn north_of(id: &str, lat: f64, lon: f64, km: f64) -> Tower {
    Tower {
        id: id.to_string(),
        lat: lat + (km / EARTH_RADIUS_KM).to_degrees(),
        lon,
    }
}

/// Sample incidents with two towers around the 1 km gas leak at Reunion Blvd
fn gas_leak_dataset() -> Dataset {
    let mut tables = Tables::sample();
    tables.forecasts.clear();
    tables.towers = vec![
        north_of("INSIDE", 32.776, -96.8065, 0.999),
        north_of("OUTSIDE", 32.776, -96.8065, 1.001),
    ];
    Dataset::new(tables)
}

#[test]
fn test_gas_leak_radius_boundary() {
    let dataset = gas_leak_dataset();
    let evaluation = dataset.evaluate(at("19:30"), MidnightPolicy::Literal);

    assert_eq!(evaluation.active, vec![2]);
    let inside = evaluation.towers[0];
    let outside = evaluation.towers[1];
    assert_eq!(inside.base, SeverityTier::Normal);
    assert_eq!(inside.tier, SeverityTier::Congested);
    assert!(inside.overridden());
    assert_eq!(inside.incident, Some(2));
    assert_eq!(outside.tier, SeverityTier::Normal);
    assert_eq!(outside.incident, None);
}

#[test]
fn test_window_bounds_are_inclusive() {
    let dataset = gas_leak_dataset();
    for (time, congested) in [("19:14", false), ("19:15", true), ("20:30", true), ("20:31", false)] {
        let evaluation = dataset.evaluate(at(time), MidnightPolicy::Literal);
        let tier = evaluation.towers[0].tier;
        assert_eq!(tier == SeverityTier::Congested, congested, "at {time}");
    }
}

#[test]
fn test_morning_accident_activity() {
    let dataset = Dataset::new(Tables::sample());
    assert_eq!(dataset.evaluate(at("09:00"), MidnightPolicy::Literal).active, vec![0]);
    assert!(dataset.evaluate(at("08:44"), MidnightPolicy::Literal).active.is_empty());
    assert!(dataset.evaluate(at("11:00"), MidnightPolicy::Literal).active.is_empty());
}

#[test]
fn test_sample_latest_forecast() {
    let dataset = Dataset::new(Tables::sample());
    let latest = dataset.latest_forecast("KFA905").unwrap();
    assert_eq!(latest.timestamp_text, "2024-01-01 00:02:00");
    assert!(dataset.latest_forecast("NOPE").is_none());
}

#[test]
fn test_quiet_hour_has_no_overrides() {
    let dataset = Dataset::new(Tables::sample());
    let evaluation = dataset.evaluate(at("03:00"), MidnightPolicy::Literal);
    assert!(evaluation.active.is_empty());
    assert_eq!(evaluation.overridden_count(), 0);
    assert_eq!(evaluation.counts().iter().sum::<usize>(), 35);
    for status in &evaluation.towers {
        assert_eq!(status.tier, status.base);
    }
}

#[test]
fn test_overrides_only_raise() {
    let dataset = Dataset::new(Tables::sample());
    for minute in (0..1440).step_by(15) {
        let evaluation = dataset.evaluate(MinuteOfDay::new(minute).unwrap(), MidnightPolicy::Literal);
        for status in &evaluation.towers {
            assert!(status.tier >= status.base);
            assert_eq!(status.overridden(), status.incident.is_some() && status.base != SeverityTier::Congested);
        }
    }
}

#[test]
fn test_snapshot_json_shape() {
    let dataset = gas_leak_dataset();
    let evaluation = dataset.evaluate(at("19:30"), MidnightPolicy::Literal);
    let json = serde_json::to_value(dataset.snapshot(&evaluation)).unwrap();

    assert_eq!(json["at"], "19:30");
    assert_eq!(json["towers"][0]["id"], "INSIDE");
    assert_eq!(json["towers"][0]["tier"], "Congested");
    assert_eq!(json["towers"][0]["incident"], "Reunion Blvd");
    assert_eq!(json["towers"][0]["forecast"], serde_json::Value::Null);
    assert_eq!(json["active_incidents"][0]["category"], "Gas leak");
}
