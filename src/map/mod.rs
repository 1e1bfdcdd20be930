mod geometry;
mod projection;
mod renderer;
mod spatial;

pub use projection::Viewport;
pub use renderer::{
    marker_radius, DisplaySettings, IncidentRing, LineString, MapLayers, MapRenderer, Overlay, TowerMarker,
};
pub use spatial::SpatialGrid;
