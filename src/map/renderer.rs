use crate::braille::BrailleCanvas;
use crate::map::geometry::{draw_cross, draw_disc, draw_line, draw_ring};
use crate::map::projection::Viewport;
use crate::severity::SeverityTier;
use rayon::prelude::*;

/// A geographic line (sequence of lon/lat coordinates)
pub type LineString = Vec<(f64, f64)>;

/// Zoom above which tower labels are drawn
pub const LABEL_ZOOM: f64 = 12_000.0;

/// Display settings for map layers
#[derive(Clone)]
pub struct DisplaySettings {
    pub show_basemap: bool,
    pub show_incidents: bool,
    pub show_labels: bool,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            show_basemap: true,
            show_incidents: true,
            show_labels: true,
        }
    }
}

/// A tower marker colored by its effective tier
#[derive(Clone, Debug)]
pub struct TowerMarker {
    pub lon: f64,
    pub lat: f64,
    pub tier: SeverityTier,
    pub label: String,
}

/// Radius outline of an active incident
#[derive(Clone, Debug)]
pub struct IncidentRing {
    pub lon: f64,
    pub lat: f64,
    pub radius_km: f64,
}

/// Per-frame data drawn over the basemap
#[derive(Clone, Debug, Default)]
pub struct Overlay {
    pub towers: Vec<TowerMarker>,
    pub incidents: Vec<IncidentRing>,
    pub pin: Option<(f64, f64)>,
}

/// Rendered layers, one canvas per color
pub struct MapLayers {
    pub basemap: BrailleCanvas,
    pub incidents: BrailleCanvas,
    /// Indexed by `SeverityTier as usize`
    pub tiers: [BrailleCanvas; 3],
    pub pin: BrailleCanvas,
    /// (column, row, text) in character cells
    pub labels: Vec<(u16, u16, String)>,
}

impl MapLayers {
    fn new(width: usize, height: usize) -> Self {
        let blank = BrailleCanvas::new(width, height);
        Self {
            basemap: blank.clone(),
            incidents: blank.clone(),
            tiers: [blank.clone(), blank.clone(), blank.clone()],
            pin: blank,
            labels: Vec::new(),
        }
    }
}

/// Marker radius in pixels; more severe towers draw larger
pub fn marker_radius(tier: SeverityTier) -> i32 {
    match tier {
        SeverityTier::Normal => 1,
        SeverityTier::High => 2,
        SeverityTier::Congested => 3,
    }
}

/// Map renderer holding the static basemap
pub struct MapRenderer {
    basemap: Vec<LineString>,
    pub settings: DisplaySettings,
}

impl Default for MapRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl MapRenderer {
    pub fn new() -> Self {
        Self {
            basemap: Vec::new(),
            settings: DisplaySettings::default(),
        }
    }

    pub fn add_basemap_line(&mut self, line: LineString) {
        self.basemap.push(line);
    }

    pub fn has_basemap(&self) -> bool {
        !self.basemap.is_empty()
    }

    /// Render basemap and overlay into a `width` x `height` cell area
    pub fn render(&self, width: usize, height: usize, viewport: &Viewport, overlay: &Overlay) -> MapLayers {
        let mut layers = MapLayers::new(width, height);

        if self.settings.show_basemap {
            let segments: Vec<(i32, i32, i32, i32)> = self
                .basemap
                .par_iter()
                .flat_map_iter(|line| visible_segments(line, viewport))
                .collect();
            for (x0, y0, x1, y1) in segments {
                draw_line(&mut layers.basemap, x0, y0, x1, y1);
            }
        }

        if self.settings.show_incidents {
            for ring in &overlay.incidents {
                let (px, py) = viewport.project(ring.lon, ring.lat);
                let r = viewport.km_to_pixels(ring.lat, ring.radius_km).round() as i32;
                // A ring wholly off screen in any direction draws nothing
                let reach = r.saturating_add(1);
                if px.saturating_add(reach) < 0
                    || py.saturating_add(reach) < 0
                    || px.saturating_sub(reach) > viewport.width as i32
                    || py.saturating_sub(reach) > viewport.height as i32
                {
                    continue;
                }
                draw_ring(&mut layers.incidents, px, py, r);
            }
        }

        let show_labels = self.settings.show_labels && viewport.zoom >= LABEL_ZOOM;
        for marker in &overlay.towers {
            let (px, py) = viewport.project(marker.lon, marker.lat);
            if !viewport.is_visible(px, py) {
                continue;
            }
            draw_disc(&mut layers.tiers[marker.tier as usize], px, py, marker_radius(marker.tier));

            if show_labels && px >= 0 && py >= 0 {
                let char_x = (px / 2) as u16;
                let char_y = (py / 4) as u16;
                if let Some(label_x) = char_x.checked_add(2) {
                    layers.labels.push((label_x, char_y, marker.label.clone()));
                }
            }
        }

        if let Some((lon, lat)) = overlay.pin {
            let (px, py) = viewport.project(lon, lat);
            draw_cross(&mut layers.pin, px, py, 3);
        }

        layers
    }

    pub fn toggle_basemap(&mut self) {
        self.settings.show_basemap = !self.settings.show_basemap;
    }

    pub fn toggle_incidents(&mut self) {
        self.settings.show_incidents = !self.settings.show_incidents;
    }

    pub fn toggle_labels(&mut self) {
        self.settings.show_labels = !self.settings.show_labels;
    }
}

/// Projected segments of a linestring that may touch the viewport
fn visible_segments(line: &LineString, viewport: &Viewport) -> Vec<(i32, i32, i32, i32)> {
    let mut segments = Vec::new();
    let mut prev: Option<(i32, i32)> = None;

    for &(lon, lat) in line {
        let (px, py) = viewport.project(lon, lat);

        if let Some((prev_x, prev_y)) = prev {
            let dist = (px - prev_x).unsigned_abs() as usize + (py - prev_y).unsigned_abs() as usize;
            if dist < viewport.width * 4 && viewport.line_might_be_visible((prev_x, prev_y), (px, py)) {
                segments.push((prev_x, prev_y, px, py));
            }
        }

        prev = Some((px, py));
    }
    segments
}
