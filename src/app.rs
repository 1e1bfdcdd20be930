use crate::clock::QueryClock;
use crate::config::MapConfig;
use crate::evaluate::{Dataset, Evaluation, TowerStatus};
use crate::incident::MidnightPolicy;
use crate::locate::{Gazetteer, Geocoder, Place};
use crate::map::{IncidentRing, MapRenderer, Overlay, SpatialGrid, TowerMarker, Viewport};
use std::time::Instant;
use tracing::info;

/// Width of the side panel in terminal columns
pub const PANEL_WIDTH: u16 = 40;

/// Tower grid cell size in degrees (roughly 1 km)
const GRID_CELL_DEGREES: f64 = 0.01;

/// Hover reach around the cursor in Braille pixels
const HOVER_RADIUS_PX: i32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Map,
    Search,
}

/// Application state
pub struct App {
    pub viewport: Viewport,
    pub map_renderer: MapRenderer,
    pub should_quit: bool,
    /// Last mouse position for drag tracking
    pub last_mouse: Option<(u16, u16)>,
    /// Current mouse position
    pub mouse_pos: Option<(u16, u16)>,
    pub input_mode: InputMode,
    /// Lookup form text
    pub search: String,
    /// Result of the last lookup
    pub message: Option<String>,
    pub pin: Option<Place>,
    /// Index of the tower under the cursor
    pub hovered: Option<usize>,
    dataset: Dataset,
    evaluation: Evaluation,
    clock: QueryClock,
    policy: MidnightPolicy,
    gazetteer: Gazetteer,
    tower_grid: SpatialGrid<usize>,
    map_config: MapConfig,
}

/// Braille pixel size of the map area inside the border, next to the side panel
fn map_pixels(width: usize, height: usize) -> (usize, usize) {
    let inner_width = width.saturating_sub(PANEL_WIDTH as usize + 2);
    let inner_height = height.saturating_sub(3); // 2 for border + 1 for status bar
    (inner_width * 2, inner_height * 4)
}

/// Terminal cell to Braille pixel, accounting for the 1-cell border
fn cell_to_pixel(col: u16, row: u16) -> (i32, i32) {
    ((col.saturating_sub(1)) as i32 * 2, (row.saturating_sub(1)) as i32 * 4)
}

impl App {
    pub fn new(
        dataset: Dataset,
        clock: QueryClock,
        policy: MidnightPolicy,
        gazetteer: Gazetteer,
        map_config: MapConfig,
        width: usize,
        height: usize,
    ) -> Self {
        let (pixel_width, pixel_height) = map_pixels(width, height);

        let mut tower_grid = SpatialGrid::new(GRID_CELL_DEGREES);
        for (idx, tower) in dataset.towers().iter().enumerate() {
            tower_grid.insert(tower.lon, tower.lat, idx);
        }

        let evaluation = dataset.evaluate(clock.selected(), policy);

        Self {
            viewport: Viewport::new(
                map_config.center_lon,
                map_config.center_lat,
                map_config.zoom,
                pixel_width,
                pixel_height,
            ),
            map_renderer: MapRenderer::new(),
            should_quit: false,
            last_mouse: None,
            mouse_pos: None,
            input_mode: InputMode::Map,
            search: String::new(),
            message: None,
            pin: None,
            hovered: None,
            dataset,
            evaluation,
            clock,
            policy,
            gazetteer,
            tower_grid,
            map_config,
        }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn evaluation(&self) -> &Evaluation {
        &self.evaluation
    }

    pub fn clock(&self) -> &QueryClock {
        &self.clock
    }

    pub fn policy(&self) -> MidnightPolicy {
        self.policy
    }

    fn reevaluate(&mut self) {
        self.evaluation = self.dataset.evaluate(self.clock.selected(), self.policy);
    }

    /// Advance the live clock; re-evaluates when the selected minute moved
    pub fn tick(&mut self, now: Instant) {
        if self.clock.tick(now) {
            self.reevaluate();
        }
    }

    /// Switch between live and manual time
    pub fn toggle_clock(&mut self, now: Instant) {
        if self.clock.toggle(now) {
            self.reevaluate();
        }
        info!("query time {} ({})", self.clock.selected(), self.clock.mode().label());
    }

    /// Step the manual time; switches to manual mode
    pub fn step_time(&mut self, steps: i32) {
        if self.clock.step_manual(steps) {
            self.reevaluate();
        }
    }

    /// Update viewport size when terminal resizes
    pub fn resize(&mut self, width: usize, height: usize) {
        let (pixel_width, pixel_height) = map_pixels(width, height);
        self.viewport.width = pixel_width;
        self.viewport.height = pixel_height;
    }

    pub fn pan(&mut self, dx: i32, dy: i32) {
        self.viewport.pan(dx, dy);
    }

    pub fn zoom_in(&mut self) {
        self.viewport.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.viewport.zoom_out();
    }

    /// Zoom in towards a screen position (terminal column/row)
    pub fn zoom_in_at(&mut self, col: u16, row: u16) {
        let (px, py) = cell_to_pixel(col, row);
        self.viewport.zoom_in_at(px, py);
    }

    pub fn zoom_out_at(&mut self, col: u16, row: u16) {
        let (px, py) = cell_to_pixel(col, row);
        self.viewport.zoom_out_at(px, py);
    }

    /// Back to the configured view, dropping the search pin
    pub fn reset_view(&mut self) {
        self.viewport.fly_to(
            self.map_config.center_lat,
            self.map_config.center_lon,
            self.map_config.zoom,
        );
        self.pin = None;
        self.message = None;
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    pub fn zoom_level(&self) -> String {
        format!("{:.0}x", self.viewport.zoom)
    }

    pub fn center_coords(&self) -> String {
        format!(
            "{:.4}°{}, {:.4}°{}",
            self.viewport.center_lat.abs(),
            if self.viewport.center_lat >= 0.0 { "N" } else { "S" },
            self.viewport.center_lon.abs(),
            if self.viewport.center_lon >= 0.0 { "E" } else { "W" }
        )
    }

    pub fn handle_drag(&mut self, x: u16, y: u16) {
        if let Some((last_x, last_y)) = self.last_mouse {
            let dx = last_x as i32 - x as i32;
            let dy = last_y as i32 - y as i32;
            // One cell is 2x4 pixels
            self.pan(dx * 2, dy * 4);
        }
        self.last_mouse = Some((x, y));
    }

    pub fn end_drag(&mut self) {
        self.last_mouse = None;
    }

    /// Track the cursor and update the hovered tower
    pub fn set_mouse_pos(&mut self, col: u16, row: u16) {
        self.mouse_pos = Some((col, row));
        let (px, py) = cell_to_pixel(col, row);
        self.hovered = self.tower_at(px, py);
    }

    /// Nearest tower within hover reach of a pixel
    fn tower_at(&self, px: i32, py: i32) -> Option<usize> {
        if px < 0 || py < 0 || px >= self.viewport.width as i32 || py >= self.viewport.height as i32 {
            return None;
        }
        let (lon, lat) = self.viewport.unproject(px, py);
        let reach = self.viewport.degrees_per_pixel() * HOVER_RADIUS_PX as f64;

        self.tower_grid
            .query_radius(lon, lat, reach)
            .into_iter()
            .filter_map(|slot| self.tower_grid.get(slot).copied())
            .filter_map(|idx| {
                let tower = &self.dataset.towers()[idx];
                let (tx, ty) = self.viewport.project(tower.lon, tower.lat);
                let d2 = (tx - px).pow(2) + (ty - py).pow(2);
                (d2 <= HOVER_RADIUS_PX * HOVER_RADIUS_PX).then_some((d2, idx))
            })
            .min()
            .map(|(_, idx)| idx)
    }

    /// Status of the hovered tower
    pub fn hovered_status(&self) -> Option<&TowerStatus> {
        self.hovered.and_then(|idx| self.evaluation.towers.get(idx))
    }

    pub fn begin_search(&mut self) {
        self.input_mode = InputMode::Search;
        self.message = None;
    }

    pub fn cancel_search(&mut self) {
        self.input_mode = InputMode::Map;
    }

    pub fn search_push(&mut self, c: char) {
        self.search.push(c);
    }

    pub fn search_pop(&mut self) {
        self.search.pop();
    }

    /// Resolve the lookup text; a hit flies the map there and drops a pin
    pub fn submit_search(&mut self) {
        self.input_mode = InputMode::Map;
        let query = self.search.trim().to_string();
        if query.is_empty() {
            return;
        }

        match self.gazetteer.lookup(&query) {
            Some(place) => {
                info!("lookup '{query}' -> {} ({}, {})", place.label, place.lat, place.lon);
                self.viewport
                    .fly_to(place.lat, place.lon, self.map_config.fly_to_zoom);
                self.message = Some(format!("Found {}", place.label));
                self.pin = Some(place);
            }
            None => {
                info!("lookup '{query}' found nothing");
                self.message = Some(format!("No match for \"{query}\""));
            }
        }
    }

    /// Markers, rings and pin for the current evaluation
    pub fn overlay(&self) -> Overlay {
        let towers = self.dataset.towers();
        let incidents = self.dataset.incidents();

        Overlay {
            towers: self
                .evaluation
                .towers
                .iter()
                .map(|status| {
                    let tower = &towers[status.tower];
                    TowerMarker {
                        lon: tower.lon,
                        lat: tower.lat,
                        tier: status.tier,
                        label: tower.id.clone(),
                    }
                })
                .collect(),
            incidents: self
                .evaluation
                .active
                .iter()
                .map(|&i| &incidents[i])
                .filter(|incident| incident.has_valid_geometry())
                .map(|incident| IncidentRing {
                    lon: incident.lon,
                    lat: incident.lat,
                    radius_km: incident.radius_km,
                })
                .collect(),
            pin: self.pin.as_ref().map(|p| (p.lon, p.lat)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{ClockMode, FixedTime};
    use crate::data::Tables;
    use crate::records::MinuteOfDay;
    use crate::severity::SeverityTier;
    use std::time::Duration;

    fn app_at(hour: u16, minute: u16) -> App {
        let tables = Tables::sample();
        let gazetteer = Gazetteer::new(&[], &tables.towers, &tables.incidents);
        let dataset = Dataset::new(tables);
        let at = MinuteOfDay::from_hm(hour, minute).unwrap();
        let clock = QueryClock::new(Box::new(FixedTime(at)), at, 5, Duration::from_secs(60));
        App::new(
            dataset,
            clock,
            MidnightPolicy::Literal,
            gazetteer,
            MapConfig::default(),
            140,
            40,
        )
    }

    #[test]
    fn test_viewport_excludes_panel() {
        let app = app_at(9, 0);
        assert_eq!(app.viewport.width, (140 - 42) * 2);
        assert_eq!(app.viewport.height, 37 * 4);
    }

    #[test]
    fn test_step_time_reevaluates() {
        let mut app = app_at(9, 0);
        assert_eq!(app.evaluation().active, vec![0]);

        app.step_time(-4);
        assert_eq!(app.clock().mode(), ClockMode::Manual);
        assert_eq!(app.evaluation().at.to_string(), "08:40");
        assert!(app.evaluation().active.is_empty());
        assert_eq!(app.evaluation().overridden_count(), 0);
    }

    #[test]
    fn test_overlay_follows_evaluation() {
        let app = app_at(19, 30);
        let overlay = app.overlay();
        assert_eq!(overlay.towers.len(), 35);
        assert_eq!(overlay.incidents.len(), 1);
        assert_eq!(overlay.incidents[0].radius_km, 1.0);
        assert!(overlay.pin.is_none());

        let congested = overlay
            .towers
            .iter()
            .filter(|m| m.tier == SeverityTier::Congested)
            .count();
        assert_eq!(congested, app.evaluation().counts()[SeverityTier::Congested as usize]);
    }

    #[test]
    fn test_search_flies_and_pins() {
        let mut app = app_at(9, 0);
        app.begin_search();
        for c in "deep ellum".chars() {
            app.search_push(c);
        }
        app.submit_search();

        assert_eq!(app.input_mode, InputMode::Map);
        let pin = app.pin.clone().unwrap();
        assert_eq!(pin.label, "Deep Ellum District");
        assert_eq!(app.viewport.center_lat, pin.lat);
        assert_eq!(app.viewport.zoom, MapConfig::default().fly_to_zoom);
        assert_eq!(app.overlay().pin, Some((pin.lon, pin.lat)));

        app.reset_view();
        assert!(app.pin.is_none());
    }

    #[test]
    fn test_search_miss() {
        let mut app = app_at(9, 0);
        let before = app.viewport.center_lat;
        app.search = "Houston".into();
        app.submit_search();
        assert!(app.pin.is_none());
        assert_eq!(app.viewport.center_lat, before);
        assert_eq!(app.message.as_deref(), Some("No match for \"Houston\""));
    }

    #[test]
    fn test_hover_picks_tower() {
        let mut app = app_at(9, 0);
        let tower = app.dataset().towers()[0].clone();
        app.viewport.fly_to(tower.lat, tower.lon, 200_000.0);

        let (px, py) = app.viewport.project(tower.lon, tower.lat);
        let col = (px / 2 + 1) as u16;
        let row = (py / 4 + 1) as u16;
        app.set_mouse_pos(col, row);
        assert_eq!(app.hovered, Some(0));
        assert_eq!(app.hovered_status().map(|s| s.tower), Some(0));

        app.set_mouse_pos(1, 1);
        assert_eq!(app.hovered, None);
    }
}
