use crate::geo::haversine_km;
use crate::records::{Incident, Tower};
use crate::severity::SeverityTier;

impl Incident {
    /// Whether `tower` lies within this incident's radius (boundary included)
    pub fn contains(&self, tower: &Tower) -> bool {
        haversine_km(tower.lat, tower.lon, self.lat, self.lon) <= self.radius_km
    }
}

/// Final tier of a tower and the incident that forced it, if any
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    pub tier: SeverityTier,
    /// Index into the incident slice of the first active incident containing the tower
    pub incident: Option<usize>,
}

/// First incident among `active` (indices into `incidents`) whose radius contains the tower
pub fn containing_incident(tower: &Tower, incidents: &[Incident], active: &[usize]) -> Option<usize> {
    active
        .iter()
        .copied()
        .find(|&idx| incidents.get(idx).is_some_and(|incident| incident.contains(tower)))
}

/// Raise `base` to `Congested` when the tower sits inside any active incident,
/// otherwise keep `base`. Scanning stops at the first containing incident since
/// nothing ranks above `Congested`.
pub fn apply_override(
    base: SeverityTier,
    tower: &Tower,
    incidents: &[Incident],
    active: &[usize],
) -> Verdict {
    match containing_incident(tower, incidents, active) {
        Some(idx) => Verdict {
            tier: SeverityTier::Congested,
            incident: Some(idx),
        },
        None => Verdict {
            tier: base,
            incident: None,
        },
    }
}
