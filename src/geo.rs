/// Mean Earth radius in kilometers
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Kilometers per degree of latitude (used for drawing radii, not for containment)
pub const KM_PER_DEGREE_LAT: f64 = 111.32;

/// Haversine great-circle distance in kilometers between two (lat, lon) points
/// given in degrees
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();
    let lat1 = lat1.to_radians();
    let lat2 = lat2.to_radians();

    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    // Rounding can push `a` a hair past 1 near antipodes
    let c = 2.0 * a.clamp(0.0, 1.0).sqrt().asin();
    EARTH_RADIUS_KM * c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_points() {
        assert_eq!(haversine_km(32.7767, -96.797, 32.7767, -96.797), 0.0);
        assert_eq!(haversine_km(-90.0, 180.0, -90.0, 180.0), 0.0);
    }

    #[test]
    fn test_antipodes() {
        let d = haversine_km(0.0, 0.0, 0.0, 180.0);
        let half_circumference = std::f64::consts::PI * EARTH_RADIUS_KM;
        assert!((d - half_circumference).abs() < 1e-6);
        let d = haversine_km(90.0, 0.0, -90.0, 0.0);
        assert!((d - half_circumference).abs() < 1e-6);
        assert!(haversine_km(45.0, 10.0, -45.0, -170.0).is_finite());
    }

    #[test]
    fn test_one_degree_latitude() {
        let d = haversine_km(0.0, 0.0, 1.0, 0.0);
        assert!((d - 111.195).abs() < 0.01);
    }
}
