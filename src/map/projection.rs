use crate::geo::KM_PER_DEGREE_LAT;
use glam::DVec2;
use std::f64::consts::PI;

pub const MIN_ZOOM: f64 = 0.5;
pub const MAX_ZOOM: f64 = 1_000_000.0;
const ZOOM_STEP: f64 = 1.5;
const MAX_LAT: f64 = 85.0;

/// Normalized Web Mercator coordinates: x and y both in [0, 1], y down
fn mercator(lon: f64, lat: f64) -> DVec2 {
    let lat_rad = lat.clamp(-MAX_LAT, MAX_LAT).to_radians();
    DVec2::new(
        (lon + 180.0) / 360.0,
        (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0,
    )
}

fn inverse_mercator(m: DVec2) -> (f64, f64) {
    let lon = m.x * 360.0 - 180.0;
    let lat = (PI * (1.0 - 2.0 * m.y)).sinh().atan().to_degrees();
    (lon, lat)
}

/// Visible map area in Braille pixels
#[derive(Clone, Debug)]
pub struct Viewport {
    pub center_lon: f64,
    pub center_lat: f64,
    /// Linear zoom: at 1.0 the whole world spans the canvas width
    pub zoom: f64,
    pub width: usize,
    pub height: usize,
}

impl Viewport {
    pub fn new(center_lon: f64, center_lat: f64, zoom: f64, width: usize, height: usize) -> Self {
        Self {
            center_lon,
            center_lat,
            zoom: zoom.clamp(MIN_ZOOM, MAX_ZOOM),
            width,
            height,
        }
    }

    fn scale(&self) -> f64 {
        self.zoom * self.width.max(1) as f64
    }

    fn half_size(&self) -> DVec2 {
        DVec2::new(self.width as f64 / 2.0, self.height as f64 / 2.0)
    }

    fn center(&self) -> DVec2 {
        mercator(self.center_lon, self.center_lat)
    }

    fn set_center(&mut self, m: DVec2) {
        let (lon, lat) = inverse_mercator(m);
        self.center_lon = if lon > 180.0 {
            lon - 360.0
        } else if lon < -180.0 {
            lon + 360.0
        } else {
            lon
        };
        self.center_lat = lat.clamp(-MAX_LAT, MAX_LAT);
    }

    /// Pan by a pixel delta
    pub fn pan(&mut self, dx: i32, dy: i32) {
        let shifted = self.center() + DVec2::new(dx as f64, dy as f64) / self.scale();
        self.set_center(shifted);
    }

    pub fn zoom_in(&mut self) {
        self.zoom = (self.zoom * ZOOM_STEP).min(MAX_ZOOM);
    }

    pub fn zoom_out(&mut self) {
        self.zoom = (self.zoom / ZOOM_STEP).max(MIN_ZOOM);
    }

    pub fn zoom_in_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, ZOOM_STEP);
    }

    pub fn zoom_out_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, 1.0 / ZOOM_STEP);
    }

    /// Zoom keeping the geographic point under (px, py) fixed on screen
    fn zoom_at(&mut self, px: i32, py: i32, factor: f64) {
        let (lon, lat) = self.unproject(px, py);
        self.zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        let (new_px, new_py) = self.project(lon, lat);
        self.pan(new_px - px, new_py - py);
    }

    /// Center on a location at the given zoom
    pub fn fly_to(&mut self, lat: f64, lon: f64, zoom: f64) {
        self.center_lat = lat.clamp(-MAX_LAT, MAX_LAT);
        self.center_lon = lon;
        self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
    }

    /// Geographic (lon, lat) under a pixel
    pub fn unproject(&self, px: i32, py: i32) -> (f64, f64) {
        let offset = DVec2::new(px as f64, py as f64) - self.half_size();
        inverse_mercator(offset / self.scale() + self.center())
    }

    /// Pixel position of a geographic (lon, lat)
    pub fn project(&self, lon: f64, lat: f64) -> (i32, i32) {
        let p = (mercator(lon, lat) - self.center()) * self.scale() + self.half_size();
        (p.x as i32, p.y as i32)
    }

    /// On-screen radius in pixels of `km` measured along the meridian at `lat`
    pub fn km_to_pixels(&self, lat: f64, km: f64) -> f64 {
        let dlat = km / KM_PER_DEGREE_LAT;
        let a = mercator(0.0, lat);
        let b = mercator(0.0, lat + dlat);
        (b.y - a.y).abs() * self.scale()
    }

    /// Degrees of longitude covered by one pixel
    pub fn degrees_per_pixel(&self) -> f64 {
        360.0 / self.scale()
    }

    /// Projected point is on screen (with a small margin)
    pub fn is_visible(&self, px: i32, py: i32) -> bool {
        px >= -10 && px < self.width as i32 + 10 && py >= -10 && py < self.height as i32 + 10
    }

    /// Rough bounding-box check for a segment
    pub fn line_might_be_visible(&self, p1: (i32, i32), p2: (i32, i32)) -> bool {
        let (min_x, max_x) = (p1.0.min(p2.0), p1.0.max(p2.0));
        let (min_y, max_y) = (p1.1.min(p2.1), p1.1.max(p2.1));
        max_x >= 0 && min_x < self.width as i32 && max_y >= 0 && min_y < self.height as i32
    }
}
