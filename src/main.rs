use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use netload_map::app::{App, InputMode};
use netload_map::clock::{QueryClock, SystemClock, TimeSource};
use netload_map::config::Config;
use netload_map::data::{basemap, load_tables};
use netload_map::evaluate::Dataset;
use netload_map::locate::Gazetteer;
use netload_map::records::MinuteOfDay;
use netload_map::{telemetry, ui};
use ratatui::DefaultTerminal;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::info;

/// Cell tower load map with emergency incident overrides
#[derive(Parser, Debug)]
#[command(name = "netload-map", version, about)]
struct Args {
    /// Configuration file (defaults to ./netload.toml when present)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Start in manual mode at this time of day
    #[arg(long, value_name = "HH:MM")]
    at: Option<MinuteOfDay>,

    /// Evaluate once, print JSON to stdout and exit
    #[arg(long)]
    snapshot: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::load(args.config.as_deref())?;

    if args.snapshot {
        telemetry::init_stderr(&config.log);
    } else {
        telemetry::init_file(&config.log)
            .with_context(|| format!("opening log file {}", config.log.file.display()))?;
    }

    let tables = load_tables(&config.data)?;
    let gazetteer = Gazetteer::new(&config.places, &tables.towers, &tables.incidents);
    let dataset = Dataset::new(tables);
    let policy = config.clock.policy();

    if args.snapshot {
        let at = args.at.unwrap_or_else(|| SystemClock.minute_of_day());
        let evaluation = dataset.evaluate(at, policy);
        let mut out = io::stdout().lock();
        serde_json::to_writer_pretty(&mut out, &dataset.snapshot(&evaluation))?;
        writeln!(out)?;
        return Ok(());
    }

    let mut clock = QueryClock::new(
        Box::new(SystemClock),
        config.clock.manual_start()?,
        config.clock.manual_step_minutes,
        config.clock.refresh(),
    );
    if let Some(at) = args.at {
        clock.set_manual(at);
    }

    // Initialize terminal
    let mut terminal = ratatui::init();
    terminal.clear()?;
    execute!(io::stdout(), EnableMouseCapture)?;

    let size = terminal.size()?;
    let mut app = App::new(
        dataset,
        clock,
        policy,
        gazetteer,
        config.map.clone(),
        size.width as usize,
        size.height as usize,
    );
    if config.data.basemap_dir.is_dir() {
        let lines = basemap::load_basemap_dir(&mut app.map_renderer, &config.data.basemap_dir);
        info!("basemap ready: {lines} lines");
    }

    let result = run(&mut terminal, &mut app);

    // Disable mouse capture and restore terminal
    let _ = execute!(io::stdout(), DisableMouseCapture);
    ratatui::restore();

    result
}

/// Handle mouse events for panning, zooming and hover
fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    app.set_mouse_pos(mouse.column, mouse.row);

    match mouse.kind {
        MouseEventKind::ScrollUp => app.zoom_in_at(mouse.column, mouse.row),
        MouseEventKind::ScrollDown => app.zoom_out_at(mouse.column, mouse.row),
        // Horizontal scroll for panning (trackpad two-finger swipe)
        MouseEventKind::ScrollLeft => app.pan(-15, 0),
        MouseEventKind::ScrollRight => app.pan(15, 0),
        MouseEventKind::Down(MouseButton::Left) => {
            app.last_mouse = Some((mouse.column, mouse.row));
        }
        MouseEventKind::Drag(MouseButton::Left) => {
            app.handle_drag(mouse.column, mouse.row);
        }
        MouseEventKind::Up(MouseButton::Left) => {
            app.end_drag();
        }
        _ => {}
    }
}

/// Keys while the lookup field has focus
fn handle_search_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter => app.submit_search(),
        KeyCode::Esc => app.cancel_search(),
        KeyCode::Backspace => app.search_pop(),
        KeyCode::Char(c) => app.search_push(c),
        _ => {}
    }
}

fn handle_map_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.quit(),

        // Pan with hjkl or arrow keys
        KeyCode::Left | KeyCode::Char('h') => app.pan(-10, 0),
        KeyCode::Right | KeyCode::Char('l') => app.pan(10, 0),
        KeyCode::Up | KeyCode::Char('k') => app.pan(0, -6),
        KeyCode::Down | KeyCode::Char('j') => app.pan(0, 6),

        // Zoom
        KeyCode::Char('+') | KeyCode::Char('=') => app.zoom_in(),
        KeyCode::Char('-') | KeyCode::Char('_') => app.zoom_out(),

        // Query time
        KeyCode::Char('t') | KeyCode::Char('T') => app.toggle_clock(Instant::now()),
        KeyCode::Char('[') => app.step_time(-1),
        KeyCode::Char(']') => app.step_time(1),

        KeyCode::Char('/') => app.begin_search(),

        // Layer toggles
        KeyCode::Char('b') | KeyCode::Char('B') => app.map_renderer.toggle_basemap(),
        KeyCode::Char('i') | KeyCode::Char('I') => app.map_renderer.toggle_incidents(),
        KeyCode::Char('L') => app.map_renderer.toggle_labels(),

        KeyCode::Char('r') | KeyCode::Char('0') => app.reset_view(),

        _ => {}
    }
}

fn run(terminal: &mut DefaultTerminal, app: &mut App) -> Result<()> {
    loop {
        app.tick(Instant::now());

        terminal.draw(|frame| ui::render(frame, app))?;

        // Handle events with ~60fps target
        if event::poll(Duration::from_millis(16))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => match app.input_mode {
                    InputMode::Search => handle_search_key(app, key),
                    InputMode::Map => handle_map_key(app, key),
                },
                Event::Mouse(mouse) => handle_mouse(app, mouse),
                Event::Resize(width, height) => app.resize(width as usize, height as usize),
                _ => {}
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
