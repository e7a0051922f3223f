mod app;
mod braille;
mod config;
mod error;
mod field;
mod input;
mod palette;
mod perf;
mod preferences;
mod presets;
mod render;
mod settings;
mod svg;
mod ui;

use app::{App, Focus};
use clap::Parser;
use config::AppConfig;
use crossterm::{
    event::{
        self, DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture,
        Event, KeyCode, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use field::ParticleField;
use input::InputEvent;
use log::{error, info};
use palette::{parse_palette, PaletteName};
use preferences::Preferences;
use presets::PresetManager;
use ratatui::{backend::CrosstermBackend, layout::Rect, Terminal};
use render::{FieldRenderer, StatsRenderer};
use settings::{Bounds, PointerForce};
use std::fs::{self, File};
use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use svg::SvgRenderer;

#[derive(Parser, Debug)]
#[command(name = "particle-field")]
#[command(about = "Ambient particle field with links, pointer forces and bursts in the terminal")]
struct Args {
    // === Sources ===
    /// Built-in or user preset to start from (ambient, bubble, nav trail, constellation, calm)
    #[arg(long, default_value = "ambient")]
    preset: String,

    /// Load the full configuration from a JSON file instead of a preset
    #[arg(long)]
    config: Option<PathBuf>,

    /// Where E writes the configuration (and where headless runs export it)
    #[arg(long)]
    export: Option<PathBuf>,

    // === Population ===
    /// Number of base particles (0-5000)
    #[arg(short = 'n', long)]
    particles: Option<usize>,

    /// Smallest particle radius
    #[arg(long = "min-size")]
    min_size: Option<f32>,

    /// Largest particle radius
    #[arg(long = "max-size")]
    max_size: Option<f32>,

    /// Named palette (neon, portfolio, nav, matrix, mono)
    #[arg(long)]
    palette: Option<String>,

    /// Custom comma separated hex colours, e.g. "#00ffff,#ff00ff"
    #[arg(long)]
    colors: Option<String>,

    // === Motion ===
    /// Base speed (0-5); velocity is capped at twice this
    #[arg(short = 's', long)]
    speed: Option<f32>,

    /// Field ticks per rendered frame (1-10)
    #[arg(long)]
    ticks: Option<usize>,

    // === Pointer ===
    /// Pointer force (repel, attract, off)
    #[arg(long)]
    pointer: Option<String>,

    /// Pointer interaction radius
    #[arg(long)]
    radius: Option<f32>,

    /// Pointer interaction strength
    #[arg(long)]
    strength: Option<f32>,

    // === Links and bursts ===
    /// Link particles closer than this
    #[arg(long = "link-distance")]
    link_distance: Option<f32>,

    /// Do not draw proximity links
    #[arg(long = "no-links", default_value = "false")]
    no_links: bool,

    /// Particles per burst
    #[arg(long)]
    burst: Option<usize>,

    /// Life lost per tick by burst particles
    #[arg(long)]
    decay: Option<f32>,

    // === Runtime ===
    /// Seed for a reproducible population
    #[arg(long)]
    seed: Option<u64>,

    /// Start with effects off for this session without saving the preference
    #[arg(long = "reduced-motion", default_value = "false")]
    reduced_motion: bool,

    /// Log file (defaults to particle-field.log in the cache directory)
    #[arg(long = "log-file")]
    log_file: Option<PathBuf>,

    // === Headless ===
    /// Run this many ticks without a terminal UI and print frame statistics
    #[arg(long)]
    headless: Option<u64>,

    /// Headless field size in field units
    #[arg(long = "size", default_value = "800x600")]
    size: String,

    /// Write the final headless frame as SVG
    #[arg(long)]
    svg: Option<PathBuf>,
}

fn parse_pointer(s: &str) -> Result<Option<PointerForce>, String> {
    match s.to_lowercase().as_str() {
        "repel" | "escape" | "push" => Ok(Some(PointerForce::Repel)),
        "attract" | "chase" | "pull" => Ok(Some(PointerForce::Attract)),
        "off" | "none" => Ok(None),
        _ => Err(format!("unknown pointer force '{}'", s)),
    }
}

fn parse_size(s: &str) -> Result<Bounds, String> {
    let (w, h) = s
        .split_once(|c: char| c == 'x' || c == 'X')
        .ok_or_else(|| format!("size '{}' is not WIDTHxHEIGHT", s))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<f32>()
            .map_err(|_| format!("size '{}' is not WIDTHxHEIGHT", s))
    };
    Ok(Bounds::new(parse(w)?, parse(h)?))
}

/// Start from a config file or preset, then apply command line overrides
fn resolve_config(args: &Args, presets: &PresetManager) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => AppConfig::load_from_file(path)?,
        None => {
            let preset = presets
                .find(&args.preset)
                .ok_or_else(|| {
                    format!(
                        "unknown preset '{}' (available: {})",
                        args.preset,
                        presets.preset_names().join(", ")
                    )
                })?;
            AppConfig {
                field: preset.config.clone(),
                palette: preset.palette,
                ..Default::default()
            }
        }
    };
    let field = &mut config.field;

    if let Some(name) = &args.palette {
        let palette =
            PaletteName::from_name(name).ok_or_else(|| format!("unknown palette '{}'", name))?;
        config.palette = palette;
        field.colors = palette.colors();
    }
    if let Some(list) = &args.colors {
        config.palette = PaletteName::Custom;
        field.colors = parse_palette(list)?;
    }
    if let Some(v) = args.particles {
        field.particle_count = v;
    }
    if let Some(v) = args.min_size {
        field.min_size = v;
    }
    if let Some(v) = args.max_size {
        field.max_size = v;
    }
    if let Some(v) = args.speed {
        field.speed = v;
    }
    if let Some(v) = &args.pointer {
        match parse_pointer(v)? {
            Some(force) => {
                field.interactive = true;
                field.pointer_force = force;
            }
            None => field.interactive = false,
        }
    }
    if let Some(v) = args.radius {
        field.interaction_radius = v;
    }
    if let Some(v) = args.strength {
        field.interaction_strength = v;
    }
    if let Some(v) = args.link_distance {
        field.connection_distance = v;
    }
    if args.no_links {
        field.show_connections = false;
    }
    if let Some(v) = args.burst {
        field.burst_count = v;
    }
    if let Some(v) = args.decay {
        field.burst_decay = v;
    }
    if let Some(v) = args.ticks {
        config.ticks_per_frame = v.clamp(1, app::MAX_TICKS_PER_FRAME);
    }

    config.field.validate()?;
    Ok(config)
}

/// Route `log` output to a file so the alternate screen stays clean
fn init_logging(path: Option<PathBuf>) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let path = path.unwrap_or_else(|| {
        dirs::cache_dir()
            .map(|p| p.join("particle-field"))
            .unwrap_or_default()
            .join("particle-field.log")
    });
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let file = File::create(&path)?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(path)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let log_path = init_logging(args.log_file.clone())?;

    let presets = PresetManager::new();
    let app_config = resolve_config(&args, &presets)?;
    info!("logging to {}", log_path.display());

    if let Some(ticks) = args.headless {
        return run_headless(&args, app_config, ticks);
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture, EnableFocusChange)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Get initial terminal size and create app
    let size = terminal.size()?;
    let frame_rect = Rect::new(0, 0, size.width, size.height);
    let (canvas_width, canvas_height) = ui::get_canvas_size(frame_rect, false);

    let prefs_path = Preferences::default_path();
    let prefs = Preferences::load(prefs_path.as_deref());
    let effects_enabled = prefs.effects_enabled && !args.reduced_motion;

    let mut app = App::new(canvas_width, canvas_height, app_config, args.seed).with_effects(effects_enabled);
    app.presets = presets;
    // Reduced motion is a session override; never written back
    app.preferences_path = if args.reduced_motion { None } else { prefs_path };
    if let Some(path) = &args.export {
        app.export_path = path.clone();
    }

    // Run the app
    let res = run_app(&mut terminal, &mut app);
    app.shutdown();

    // Cleanup
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableFocusChange,
        DisableMouseCapture,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        error!("terminal loop failed: {}", err);
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}

/// Drive the field without a terminal and report what it produced
fn run_headless(args: &Args, app_config: AppConfig, ticks: u64) -> Result<(), Box<dyn std::error::Error>> {
    // Simulated 60 Hz clock
    const FRAME_MS: f64 = 1000.0 / 60.0;

    let bounds = parse_size(&args.size)?;
    let mut field = match args.seed {
        Some(seed) => ParticleField::initialize_with_seed(app_config.field.clone(), &bounds, seed)?,
        None => ParticleField::initialize(app_config.field.clone(), &bounds)?,
    };
    field.start();

    let burst = app_config.field.burst_count;
    field.add_burst(glam::Vec2::new(bounds.width / 2.0, bounds.height / 2.0), burst);
    for i in 0..ticks {
        field.tick(i as f64 * FRAME_MS, None);
    }

    let stats = StatsRenderer.render(&field.frame());
    println!(
        "ticks {}  particles {}  transient {}  links {}  mean opacity {:.3}  sweeps pending {}",
        field.ticks(),
        stats.particles,
        stats.transient,
        stats.connections,
        stats.mean_opacity,
        field.pending_sweeps()
    );

    if let Some(path) = &args.svg {
        SvgRenderer::new(Some(palette::Rgb::new(0x0a, 0x0a, 0x0a))).export(&field.frame(), path)?;
        println!("frame written to {}", path.display());
    }
    if let Some(path) = &args.export {
        app_config.save_to_file(path)?;
    }
    field.destroy();
    Ok(())
}

/// Map a mouse event on the canvas to a field input event
fn mouse_to_input(mouse: MouseEvent, canvas: Rect, app: &App) -> Option<InputEvent> {
    let inside = mouse.column >= canvas.x
        && mouse.column < canvas.x + canvas.width
        && mouse.row >= canvas.y
        && mouse.row < canvas.y + canvas.height;
    if !inside {
        return match mouse.kind {
            MouseEventKind::Moved | MouseEventKind::Drag(_) => Some(InputEvent::PointerLeave),
            _ => None,
        };
    }

    let bounds = app.field.as_ref()?.bounds();
    let pos = braille::cell_to_field(
        mouse.column - canvas.x,
        mouse.row - canvas.y,
        canvas.width,
        canvas.height,
        bounds,
    );
    let (x, y) = (pos.x, pos.y);
    match mouse.kind {
        MouseEventKind::Moved => Some(InputEvent::PointerMove { x, y }),
        MouseEventKind::Down(MouseButton::Left) => Some(InputEvent::PointerDown { x, y }),
        MouseEventKind::Drag(MouseButton::Left) => Some(InputEvent::PointerDrag { x, y }),
        _ => None,
    }
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    // Target ~60fps for smooth animation
    const FRAME_DURATION: Duration = Duration::from_millis(16);

    loop {
        // Render current state
        terminal.draw(|frame| ui::render(frame, app))?;

        // Drain every pending event before the next tick
        let mut timeout = FRAME_DURATION;
        while event::poll(timeout)? {
            timeout = Duration::ZERO;
            match event::read()? {
                Event::Key(key) => {
                    // Only process Press events
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }

                    // Handle Ctrl+C
                    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                        return Ok(());
                    }

                    // === Handle popup keys first (if popup is open) ===
                    if app.param_popup.is_some() {
                        match key.code {
                            KeyCode::Up => app.popup_nav_up(),
                            KeyCode::Down => app.popup_nav_down(),
                            KeyCode::Enter => app.confirm_param_popup(),
                            KeyCode::Esc => app.close_param_popup(),
                            _ => {}
                        }
                        continue;
                    }

                    // === Handle Shift+letter to open popup ===
                    if key.modifiers.contains(KeyModifiers::SHIFT) {
                        if let KeyCode::Char(c) = key.code {
                            if c == '?' {
                                app.open_all_params_popup();
                                continue;
                            }
                            if c.is_ascii_alphabetic() {
                                app.open_param_popup(c);
                                continue;
                            }
                        }
                    }

                    app.status_message = None;
                    match key.code {
                        // System controls
                        KeyCode::Char('q') => return Ok(()),
                        KeyCode::Char(' ') => app.toggle_pause(),
                        KeyCode::Char('r') => app.reset(),
                        KeyCode::Char('v') => app.toggle_fullscreen(),
                        KeyCode::Char('h') => app.toggle_help(),
                        KeyCode::Char('x') => app.toggle_effects(),
                        KeyCode::Char('b') => app.burst_center(),
                        KeyCode::Char('p') => app.next_preset(),
                        KeyCode::Char('w') => app.save_user_preset(),
                        KeyCode::Char('d') => app.delete_user_preset(),
                        KeyCode::Char('e') => app.export_config(),
                        KeyCode::Char('n') => app.cycle_palette(),
                        KeyCode::Char('f') => app.cycle_pointer_force(),
                        KeyCode::Char('i') => app.toggle_interactive(),
                        KeyCode::Char('c') => app.toggle_connections(),
                        KeyCode::Char('t') => app.toggle_trails(),
                        KeyCode::Char('g') => app.toggle_glow(),
                        KeyCode::Char('+') | KeyCode::Char('=') => {
                            app.adjust_ticks(1);
                            app.focus = Focus::Ticks;
                        }
                        KeyCode::Char('-') | KeyCode::Char('_') => {
                            app.adjust_ticks(-1);
                            app.focus = Focus::Ticks;
                        }

                        // Navigation
                        KeyCode::Tab => app.next_focus(),
                        KeyCode::BackTab => app.prev_focus(),
                        KeyCode::Up => {
                            if !app.show_help {
                                if app.focus.is_param() {
                                    app.adjust_focused_up();
                                } else {
                                    app.scroll_controls_up();
                                }
                            }
                        }
                        KeyCode::Down => {
                            if !app.show_help {
                                if app.focus.is_param() {
                                    app.adjust_focused_down();
                                } else {
                                    let term_size = terminal.size().unwrap_or_default();
                                    let visible = ui::get_controls_visible_lines(term_size.height);
                                    app.scroll_controls_down(ui::CONTROLS_CONTENT_LINES.saturating_sub(visible));
                                }
                            }
                        }
                        KeyCode::Esc => {
                            if app.show_help {
                                app.toggle_help();
                            } else if app.focus.is_param() {
                                app.focus = Focus::Controls;
                            }
                        }
                        KeyCode::Char('j') => {
                            if app.show_help {
                                app.scroll_help_down(ui::HELP_CONTENT_LINES);
                            }
                        }
                        KeyCode::Char('k') => {
                            if app.show_help {
                                app.scroll_help_up();
                            }
                        }
                        _ => {}
                    }
                }
                Event::Mouse(mouse) => {
                    let term_size = terminal.size()?;
                    let canvas = ui::get_canvas_rect(
                        Rect::new(0, 0, term_size.width, term_size.height),
                        app.fullscreen_mode,
                    );
                    if let Some(input) = mouse_to_input(mouse, canvas, app) {
                        app.push_input(input);
                    }
                }
                Event::FocusLost => app.focus_lost(),
                Event::FocusGained => app.focus_gained(),
                Event::Resize(width, height) => {
                    let (canvas_width, canvas_height) =
                        ui::get_canvas_size(Rect::new(0, 0, width, height), app.fullscreen_mode);
                    app.resize(canvas_width, canvas_height);
                }
                _ => {}
            }
        }

        // Fullscreen toggles change the canvas without a resize event
        let term_size = terminal.size()?;
        let canvas = ui::get_canvas_size(
            Rect::new(0, 0, term_size.width, term_size.height),
            app.fullscreen_mode,
        );
        if canvas != app.canvas_size() {
            app.resize(canvas.0, canvas.1);
        }

        // Run field tick
        app.tick(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["particle-field"];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    #[test]
    fn test_defaults_come_from_ambient_preset() {
        let presets = PresetManager::with_dir(None);
        let config = resolve_config(&args(&[]), &presets).unwrap();
        assert_eq!(&config.field, &presets.find("Ambient").unwrap().config);
        assert_eq!(config.palette, PaletteName::Neon);
    }

    #[test]
    fn test_cli_overrides_preset() {
        let presets = PresetManager::with_dir(None);
        let config = resolve_config(
            &args(&[
                "--preset", "calm", "-n", "77", "--pointer", "attract", "--colors", "#fff,#000",
                "--no-links", "--ticks", "99",
            ]),
            &presets,
        )
        .unwrap();
        assert_eq!(config.field.particle_count, 77);
        assert!(config.field.interactive);
        assert_eq!(config.field.pointer_force, PointerForce::Attract);
        assert_eq!(config.field.colors.len(), 2);
        assert_eq!(config.palette, PaletteName::Custom);
        assert!(!config.field.show_connections);
        assert_eq!(config.ticks_per_frame, app::MAX_TICKS_PER_FRAME);
    }

    #[test]
    fn test_invalid_cli_values_rejected() {
        let presets = PresetManager::with_dir(None);
        assert!(resolve_config(&args(&["--preset", "nope"]), &presets).is_err());
        assert!(resolve_config(&args(&["--palette", "plaid"]), &presets).is_err());
        assert!(resolve_config(&args(&["--min-size", "3", "--max-size", "1"]), &presets).is_err());
        assert!(resolve_config(&args(&["-n", "6000"]), &presets).is_err());
    }

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("800x600").unwrap(), Bounds::new(800.0, 600.0));
        assert!(parse_size("800").is_err());
        assert!(parse_size("ax2").is_err());
    }

    #[test]
    fn test_mouse_mapping() {
        let app = App::new(40, 20, AppConfig::default(), Some(1));
        let canvas = Rect::new(25, 1, 40, 20);
        let mouse = |kind, column, row| MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        };

        let down = mouse_to_input(mouse(MouseEventKind::Down(MouseButton::Left), 25, 1), canvas, &app);
        assert_eq!(down, Some(InputEvent::PointerDown { x: 1.0, y: 2.0 }));

        let outside = mouse_to_input(mouse(MouseEventKind::Moved, 3, 3), canvas, &app);
        assert_eq!(outside, Some(InputEvent::PointerLeave));

        let scroll = mouse_to_input(mouse(MouseEventKind::ScrollUp, 30, 5), canvas, &app);
        assert_eq!(scroll, None);
    }
}
