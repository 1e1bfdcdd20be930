use crate::config::PlaceConfig;
use crate::records::{Incident, Tower};

/// A resolved location
#[derive(Debug, Clone, PartialEq)]
pub struct Place {
    pub label: String,
    pub lat: f64,
    pub lon: f64,
}

/// Turns free-form search text into a place
pub trait Geocoder {
    fn lookup(&self, query: &str) -> Option<Place>;
}

/// Offline geocoder over coordinates, configured places, tower identifiers
/// and incident locations. Categories are searched in that order; the first
/// category with any match wins.
#[derive(Debug, Clone, Default)]
pub struct Gazetteer {
    categories: [Vec<Place>; 3],
}

impl Gazetteer {
    pub fn new(places: &[PlaceConfig], towers: &[Tower], incidents: &[Incident]) -> Self {
        let places: Vec<Place> = places
            .iter()
            .map(|p| Place {
                label: p.label.clone(),
                lat: p.lat,
                lon: p.lon,
            })
            .collect();

        let towers = towers
            .iter()
            .map(|t| Place {
                label: t.id.clone(),
                lat: t.lat,
                lon: t.lon,
            })
            .collect();

        let incidents = incidents
            .iter()
            .filter(|i| i.has_valid_geometry() && !i.location.is_empty())
            .map(|i| Place {
                label: i.location.clone(),
                lat: i.lat,
                lon: i.lon,
            })
            .collect();

        Self {
            categories: [places, towers, incidents],
        }
    }

    pub fn len(&self) -> usize {
        self.categories.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.iter().all(Vec::is_empty)
    }
}

/// Parse "lat, lon" (comma or whitespace separated) within valid ranges
pub fn parse_coordinates(text: &str) -> Option<(f64, f64)> {
    let mut parts = text
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|p| !p.is_empty());
    let lat: f64 = parts.next()?.parse().ok()?;
    let lon: f64 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    let valid = (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon);
    valid.then_some((lat, lon))
}

impl Geocoder for Gazetteer {
    fn lookup(&self, query: &str) -> Option<Place> {
        let query = query.trim();
        if query.is_empty() {
            return None;
        }

        if let Some((lat, lon)) = parse_coordinates(query) {
            return Some(Place {
                label: format!("{lat:.5}, {lon:.5}"),
                lat,
                lon,
            });
        }

        // Case-insensitive substring; an exact label beats an earlier
        // partial match in the same category
        let needle = query.to_lowercase();
        self.categories
            .iter()
            .find_map(|entries| {
                entries
                    .iter()
                    .find(|p| p.label.to_lowercase() == needle)
                    .or_else(|| {
                        entries
                            .iter()
                            .find(|p| p.label.to_lowercase().contains(&needle))
                    })
            })
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Tables;

    fn gazetteer() -> Gazetteer {
        let tables = Tables::sample();
        let places = vec![PlaceConfig {
            label: "Dallas City Hall".into(),
            lat: 32.7762,
            lon: -96.7969,
        }];
        Gazetteer::new(&places, &tables.towers, &tables.incidents)
    }

    #[test]
    fn test_coordinates() {
        assert_eq!(parse_coordinates("32.78, -96.80"), Some((32.78, -96.80)));
        assert_eq!(parse_coordinates("32.78 -96.80"), Some((32.78, -96.80)));
        assert_eq!(parse_coordinates("95, 0"), None);
        assert_eq!(parse_coordinates("1, 2, 3"), None);
        assert_eq!(parse_coordinates("Deep Ellum"), None);

        let place = gazetteer().lookup(" 32.78,-96.8 ").unwrap();
        assert_eq!(place.lat, 32.78);
        assert_eq!(place.label, "32.78000, -96.80000");
    }

    #[test]
    fn test_named_lookup_order() {
        let g = gazetteer();
        assert_eq!(g.lookup("dallas city hall").unwrap().label, "Dallas City Hall");
        assert_eq!(g.lookup("KFA905").unwrap().lat, 32.802639);
        assert_eq!(g.lookup("deep ellum").unwrap().label, "Deep Ellum District");
        assert_eq!(g.lookup("reunion").unwrap().label, "Reunion Blvd");
    }

    #[test]
    fn test_substring_takes_first_in_table_order() {
        let g = gazetteer();
        assert_eq!(g.lookup("wqiw84").unwrap().label, "WQIW841");
        assert_eq!(g.lookup("wqiw843").unwrap().label, "WQIW843");
    }

    #[test]
    fn test_places_searched_before_towers() {
        let tables = Tables::sample();
        let places = vec![PlaceConfig {
            label: "Lot behind KFA905".into(),
            lat: 32.80,
            lon: -96.81,
        }];
        let g = Gazetteer::new(&places, &tables.towers, &tables.incidents);
        assert_eq!(g.lookup("KFA905").unwrap().label, "Lot behind KFA905");
        assert_eq!(g.lookup("KKG410").unwrap().label, "KKG410");
    }

    #[test]
    fn test_misses() {
        let g = gazetteer();
        assert!(g.lookup("").is_none());
        assert!(g.lookup("   ").is_none());
        assert!(g.lookup("Houston").is_none());
        assert_eq!(g.len(), 1 + 35 + 3);
    }
}
