use crate::records::ForecastSample;
use std::collections::HashMap;

/// Reduce samples to the newest one per tower.
///
/// A later sample replaces the stored one only when its timestamp is strictly
/// greater, so ties keep the first seen. An unparseable timestamp orders below
/// every valid one. Towers with no samples are absent from the map.
pub fn latest_per_tower(samples: &[ForecastSample]) -> HashMap<String, ForecastSample> {
    let mut latest: HashMap<String, ForecastSample> = HashMap::new();

    for sample in samples {
        match latest.get_mut(&sample.tower_id) {
            Some(best) => {
                if sample.timestamp > best.timestamp {
                    *best = sample.clone();
                }
            }
            None => {
                latest.insert(sample.tower_id.clone(), sample.clone());
            }
        }
    }

    latest
}
