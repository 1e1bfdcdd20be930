use crate::app::{App, InputMode, PANEL_WIDTH};
use crate::braille::BrailleCanvas;
use crate::clock::ClockMode;
use crate::map::{DisplaySettings, MapLayers};
use crate::severity::SeverityTier;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
    Frame,
};

/// Marker color for a tier
pub fn tier_color(tier: SeverityTier) -> Color {
    match tier {
        SeverityTier::Normal => Color::Green,
        SeverityTier::High => Color::Yellow,
        SeverityTier::Congested => Color::Red,
    }
}

/// Render the UI
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // Map + panel
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(10), Constraint::Length(PANEL_WIDTH)])
        .split(rows[0]);

    render_map(frame, app, columns[0]);
    render_panel(frame, app, columns[1]);
    render_status_bar(frame, app, rows[1]);
}

fn render_map(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            " Network Load ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    // Braille gives 2x4 resolution per character
    let mut viewport = app.viewport.clone();
    viewport.width = inner.width as usize * 2;
    viewport.height = inner.height as usize * 4;

    let layers = app.map_renderer.render(
        inner.width as usize,
        inner.height as usize,
        &viewport,
        &app.overlay(),
    );

    let pin_label = app.pin.as_ref().and_then(|place| {
        let (px, py) = viewport.project(place.lon, place.lat);
        let cx = u16::try_from(px / 2).ok()?.saturating_add(2);
        let cy = u16::try_from(py / 4).ok()?;
        (cx < inner.width && cy < inner.height).then(|| (cx, cy, place.label.clone()))
    });

    frame.render_widget(MapWidget { layers, pin_label }, inner);
}

/// Braille layers with text labels overlaid
struct MapWidget {
    layers: MapLayers,
    pin_label: Option<(u16, u16, String)>,
}

impl MapWidget {
    /// Render a braille canvas layer with a specific color
    fn render_layer(canvas: &BrailleCanvas, color: Color, area: Rect, buf: &mut Buffer) {
        for (col, row, ch) in canvas.glyphs() {
            if col >= area.width as usize || row >= area.height as usize {
                continue;
            }
            buf[(area.x + col as u16, area.y + row as u16)]
                .set_char(ch)
                .set_fg(color);
        }
    }

    fn render_text(text: &str, x: u16, y: u16, style: Style, area: Rect, buf: &mut Buffer) {
        if x >= area.width || y >= area.height {
            return;
        }
        let max_len = (area.width - x) as usize;
        for (i, ch) in text.chars().take(max_len.min(24)).enumerate() {
            buf[(area.x + x + i as u16, area.y + y)]
                .set_char(ch)
                .set_style(style);
        }
    }
}

impl Widget for MapWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Back to front: basemap, incident rings, towers by rising severity, pin
        Self::render_layer(&self.layers.basemap, Color::DarkGray, area, buf);
        Self::render_layer(&self.layers.incidents, Color::Magenta, area, buf);
        for tier in SeverityTier::ALL {
            Self::render_layer(&self.layers.tiers[tier as usize], tier_color(tier), area, buf);
        }
        Self::render_layer(&self.layers.pin, Color::White, area, buf);

        let label_style = Style::default().fg(Color::Gray);
        for (x, y, text) in &self.layers.labels {
            Self::render_text(text, *x, *y, label_style, area, buf);
        }

        if let Some((x, y, text)) = &self.pin_label {
            let style = Style::default().fg(Color::White).add_modifier(Modifier::BOLD);
            Self::render_text(text, *x, *y, style, area, buf);
        }
    }
}

fn heading(text: &str) -> Line<'static> {
    Line::from(Span::styled(
        text.to_string(),
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    ))
}

fn dim(text: impl Into<String>) -> Span<'static> {
    Span::styled(text.into(), Style::default().fg(Color::DarkGray))
}

fn render_panel(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut lines = Vec::new();
    lookup_lines(app, &mut lines);
    lines.push(Line::default());
    time_lines(app, &mut lines);
    lines.push(Line::default());
    legend_lines(app, &mut lines);
    lines.push(Line::default());
    incident_lines(app, &mut lines);
    lines.push(Line::default());
    hover_lines(app, &mut lines);

    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}

fn lookup_lines(app: &App, lines: &mut Vec<Line<'static>>) {
    lines.push(heading("Lookup"));
    let editing = app.input_mode == InputMode::Search;
    let field_style = if editing {
        Style::default().fg(Color::White).add_modifier(Modifier::UNDERLINED)
    } else {
        Style::default().fg(Color::Gray)
    };
    let mut field = vec![Span::raw("> "), Span::styled(app.search.clone(), field_style)];
    if editing {
        field.push(Span::styled("_", Style::default().fg(Color::White)));
    } else if app.search.is_empty() {
        field.push(dim("press / to search"));
    }
    lines.push(Line::from(field));
    if let Some(message) = &app.message {
        lines.push(Line::from(dim(message.clone())));
    }
}

fn time_lines(app: &App, lines: &mut Vec<Line<'static>>) {
    let clock = app.clock();
    lines.push(heading("Time"));
    let mode_color = match clock.mode() {
        ClockMode::Live => Color::Green,
        ClockMode::Manual => Color::Yellow,
    };
    lines.push(Line::from(vec![
        Span::styled(
            format!("{:<7}", clock.mode().label()),
            Style::default().fg(mode_color),
        ),
        Span::styled(
            clock.selected().to_string(),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ),
    ]));
    if clock.mode() == ClockMode::Live {
        lines.push(Line::from(dim(format!("manual {} (t to switch)", clock.manual()))));
    }
}

fn legend_lines(app: &App, lines: &mut Vec<Line<'static>>) {
    let counts = app.evaluation().counts();
    lines.push(heading("Severity"));
    for tier in SeverityTier::ALL {
        lines.push(Line::from(vec![
            Span::styled("● ", Style::default().fg(tier_color(tier))),
            Span::raw(format!("{:<10}", tier.label())),
            Span::styled(
                counts[tier as usize].to_string(),
                Style::default().fg(Color::White),
            ),
        ]));
    }
    let overridden = app.evaluation().overridden_count();
    if overridden > 0 {
        lines.push(Line::from(dim(format!("{overridden} raised by emergencies"))));
    }
}

fn incident_lines(app: &App, lines: &mut Vec<Line<'static>>) {
    let active = &app.evaluation().active;
    lines.push(heading("Active incidents"));
    if active.is_empty() {
        lines.push(Line::from(dim("none")));
        return;
    }
    let incidents = app.dataset().incidents();
    for &i in active {
        let incident = &incidents[i];
        lines.push(Line::from(Span::styled(
            incident.location.clone(),
            Style::default().fg(Color::Magenta),
        )));
        lines.push(Line::from(dim(format!(
            "  {} · {} · {} km",
            incident.category, incident.window, incident.radius_km
        ))));
    }
}

fn hover_lines(app: &App, lines: &mut Vec<Line<'static>>) {
    let Some(status) = app.hovered_status() else {
        return;
    };
    let tower = &app.dataset().towers()[status.tower];
    lines.push(heading("Tower"));
    lines.push(Line::from(Span::styled(
        tower.id.clone(),
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
    )));
    lines.push(Line::from(dim(format!("{:.5}, {:.5}", tower.lat, tower.lon))));

    match app.dataset().latest_forecast(&tower.id) {
        Some(f) => {
            lines.push(Line::from(format!("Forecast  {}", f.timestamp_text)));
            lines.push(Line::from(format!("Sessions  {}", f.sessions)));
            lines.push(Line::from(format!("Throughput {} Mbps", f.throughput_mbps)));
            lines.push(Line::from(format!("Latency   {} ms", f.latency_ms)));
        }
        None => lines.push(Line::from(dim("No forecast"))),
    }

    let mut severity = vec![
        Span::raw("Severity  "),
        Span::styled(status.tier.label(), Style::default().fg(tier_color(status.tier))),
    ];
    if status.overridden() {
        severity.push(Span::styled(
            " (Emergency override)",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ));
    }
    lines.push(Line::from(severity));
    if let Some(i) = status.incident {
        lines.push(Line::from(dim(format!(
            "inside {}",
            app.dataset().incidents()[i].location
        ))));
    }
}

/// Layer toggle hints; the bracketed letter is the key that flips the layer
/// and the color shows whether it is on
fn layer_toggles(settings: &DisplaySettings) -> Vec<Span<'static>> {
    [
        (settings.show_basemap, "[b]asemap "),
        (settings.show_incidents, "[i]ncidents "),
        (settings.show_labels, "[L]abels "),
    ]
    .into_iter()
    .map(|(on, text)| {
        Span::styled(
            text,
            Style::default().fg(if on { Color::Green } else { Color::DarkGray }),
        )
    })
    .collect()
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![
        dim(" Zoom: "),
        Span::styled(app.zoom_level(), Style::default().fg(Color::Yellow)),
        dim(" "),
    ];
    spans.extend(layer_toggles(&app.map_renderer.settings));
    spans.extend([
        dim("| "),
        Span::styled(app.center_coords(), Style::default().fg(Color::Cyan)),
        dim(" | hjkl:pan +/-:zoom t:live/manual [/]:step /:lookup r:reset q:quit"),
    ]);

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
