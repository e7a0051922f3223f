use crate::braille;
use crate::config::AppConfig;
use crate::error::FieldError;
use crate::field::ParticleField;
use crate::input::{InputEvent, InputQueue, PointerState};
use crate::palette::PaletteName;
use crate::perf::{self, FrameMonitor};
use crate::preferences::Preferences;
use crate::presets::{Preset, PresetManager};
use crate::settings::FieldConfig;
use glam::Vec2;
use log::{info, warn};
use std::path::PathBuf;
use std::time::Instant;

/// Most field ticks run per rendered frame
pub const MAX_TICKS_PER_FRAME: usize = 10;

/// Popup menu state for Shift+letter parameter selection
#[derive(Debug, Clone)]
pub struct ParamPopup {
    pub letter: char,
    pub options: Vec<(Focus, &'static str)>, // (Focus variant, display name)
    pub selected_idx: usize,
}

/// Focus state for parameter editing in the sidebar
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Focus {
    #[default]
    None,
    Burst,
    Decay,
    Interactive,
    LinkDistance,
    Links,
    MaxSize,
    MinSize,
    Palette,
    Particles,
    Pointer,
    Radius,
    Speed,
    Strength,
    Ticks,
    // Controls box (not a param)
    Controls,
}

/// Parameters in sidebar order (alphabetical)
const PARAMS: [(Focus, &str); 14] = [
    (Focus::Burst, "Burst Size"),
    (Focus::Decay, "Decay (Burst)"),
    (Focus::Interactive, "Interactive"),
    (Focus::LinkDistance, "Link Distance"),
    (Focus::Links, "Links"),
    (Focus::MaxSize, "Max Size"),
    (Focus::MinSize, "Min Size"),
    (Focus::Palette, "Palette"),
    (Focus::Particles, "Particles"),
    (Focus::Pointer, "Pointer Force"),
    (Focus::Radius, "Radius (Pointer)"),
    (Focus::Speed, "Speed"),
    (Focus::Strength, "Strength (Pointer)"),
    (Focus::Ticks, "Ticks per Frame"),
];

impl Focus {
    fn position(&self) -> Option<usize> {
        PARAMS.iter().position(|(f, _)| f == self)
    }

    /// Tab cycles through parameters in sidebar order
    pub fn next(&self) -> Focus {
        match self.position() {
            Some(i) => PARAMS[(i + 1) % PARAMS.len()].0,
            None => PARAMS[0].0,
        }
    }

    /// Shift+Tab cycles backwards
    pub fn prev(&self) -> Focus {
        match self.position() {
            Some(i) => PARAMS[(i + PARAMS.len() - 1) % PARAMS.len()].0,
            None => PARAMS[PARAMS.len() - 1].0,
        }
    }

    /// Line index in the parameters box
    pub fn line_index(&self) -> u16 {
        self.position().unwrap_or(0) as u16
    }

    /// Check if focus is on a parameter (not Controls or None)
    pub fn is_param(&self) -> bool {
        !matches!(self, Focus::None | Focus::Controls)
    }
}

/// Main application state
pub struct App {
    /// `None` when no field could be created; the UI keeps running
    pub field: Option<ParticleField>,
    pub field_error: Option<FieldError>,
    /// Edited configuration, pushed to the field on every change
    pub config: FieldConfig,
    pub palette: PaletteName,
    pub ticks_per_frame: usize,
    pub pointer: PointerState,
    pub input: InputQueue,
    pub monitor: FrameMonitor,
    pub presets: PresetManager,
    pub preset_index: Option<usize>,
    pub effects_enabled: bool,
    /// Where to persist the effects flag; `None` keeps it session-only
    pub preferences_path: Option<PathBuf>,
    pub export_path: PathBuf,
    pub show_trails: bool,
    pub show_glow: bool,
    pub focus: Focus,
    pub fullscreen_mode: bool,
    pub show_help: bool,
    pub help_scroll: u16,
    pub controls_scroll: u16,
    pub param_popup: Option<ParamPopup>,
    pub status_message: Option<String>,
    canvas: (u16, u16),
    seed: Option<u64>,
    started: Instant,
    /// Field was running when the terminal lost focus
    suspended: bool,
}

impl App {
    pub fn new(canvas_width: u16, canvas_height: u16, app_config: AppConfig, seed: Option<u64>) -> Self {
        let mut app = Self {
            field: None,
            field_error: None,
            config: app_config.field,
            palette: app_config.palette,
            ticks_per_frame: app_config.ticks_per_frame.clamp(1, MAX_TICKS_PER_FRAME),
            pointer: PointerState::new(),
            input: InputQueue::new(),
            monitor: FrameMonitor::default(),
            presets: PresetManager::with_dir(None),
            preset_index: None,
            effects_enabled: true,
            preferences_path: None,
            export_path: PathBuf::from("particle-field.json"),
            show_trails: true,
            show_glow: true,
            focus: Focus::Controls,
            fullscreen_mode: false,
            show_help: false,
            help_scroll: 0,
            controls_scroll: 0,
            param_popup: None,
            status_message: None,
            canvas: (canvas_width, canvas_height),
            seed,
            started: Instant::now(),
            suspended: false,
        };
        app.create_field();
        app
    }

    /// Start with effects on or off, without persisting anything
    pub fn with_effects(mut self, enabled: bool) -> Self {
        self.effects_enabled = enabled;
        if !enabled {
            if let Some(field) = self.field.as_mut() {
                field.pause();
            }
        }
        self
    }

    /// (Re)build the field from the current config and canvas
    fn create_field(&mut self) {
        if let Some(field) = self.field.as_mut() {
            field.destroy();
        }
        let bounds = braille::calculate_field_size(self.canvas.0, self.canvas.1);
        let created = match self.seed {
            Some(seed) => ParticleField::initialize_with_seed(self.config.clone(), &bounds, seed),
            None => ParticleField::initialize(self.config.clone(), &bounds),
        };
        match created {
            Ok(mut field) => {
                if self.effects_enabled {
                    field.start();
                }
                self.field = Some(field);
                self.field_error = None;
            }
            Err(err) => {
                warn!("particle field unavailable: {}", err);
                self.field = None;
                self.field_error = Some(err);
            }
        }
    }

    /// Current snapshot of the configuration for export
    pub fn app_config(&self) -> AppConfig {
        AppConfig {
            version: 1,
            field: self.config.clone(),
            palette: self.palette,
            ticks_per_frame: self.ticks_per_frame,
        }
    }

    /// Run one frame: apply queued input, then advance the field
    pub fn tick(&mut self, now: Instant) {
        for event in self.input.drain() {
            self.pointer.observe(&event);
            if !self.effects_enabled {
                continue;
            }
            match event {
                InputEvent::PointerDown { x, y } => self.burst_at(Vec2::new(x, y)),
                InputEvent::PointerDrag { x, y } => {
                    if let Some(field) = self.field.as_mut() {
                        field.add_spark(Vec2::new(x, y));
                    }
                }
                InputEvent::PointerMove { .. } | InputEvent::PointerLeave => {}
            }
        }

        let Some(field) = self.field.as_mut() else {
            return;
        };
        if !field.is_running() {
            return;
        }

        let elapsed_ms = now.saturating_duration_since(self.started).as_secs_f64() * 1000.0;
        for _ in 0..self.ticks_per_frame {
            field.tick(elapsed_ms, self.pointer.get());
        }

        if let Some(fps) = self.monitor.record_frame(now) {
            if perf::shed_load(&mut self.config, fps) {
                self.apply_config();
            }
        }
    }

    /// Queue a pointer event for the next tick
    pub fn push_input(&mut self, event: InputEvent) {
        self.input.push(event);
    }

    /// Release a burst at `origin` using the configured burst size
    pub fn burst_at(&mut self, origin: Vec2) {
        let count = self.config.burst_count;
        if let Some(field) = self.field.as_mut() {
            field.add_burst(origin, count);
        }
    }

    /// Release a burst in the middle of the field
    pub fn burst_center(&mut self) {
        if !self.effects_enabled {
            return;
        }
        if let Some(bounds) = self.field.as_ref().map(|f| f.bounds()) {
            self.burst_at(Vec2::new(bounds.width / 2.0, bounds.height / 2.0));
        }
    }

    /// Push the edited config to the field; a rejected config is rolled back
    fn apply_config(&mut self) {
        let Some(field) = self.field.as_mut() else {
            return;
        };
        if let Err(err) = field.update_config(self.config.clone()) {
            self.status_message = Some(err.to_string());
            self.config = field.config().clone();
        }
    }

    /// Handle adjusting the currently focused parameter
    pub fn adjust_focused_up(&mut self) {
        self.adjust_focused(1);
    }

    /// Handle adjusting the currently focused parameter
    pub fn adjust_focused_down(&mut self) {
        self.adjust_focused(-1);
    }

    fn adjust_focused(&mut self, dir: i32) {
        let step = dir as f32;
        match self.focus {
            Focus::None | Focus::Controls => return,
            Focus::Ticks => {
                self.adjust_ticks(dir);
                return;
            }
            Focus::Palette => {
                self.palette = if dir > 0 { self.palette.next() } else { self.palette.prev() };
                self.config.colors = self.palette.colors();
            }
            Focus::Burst => self.config.adjust_burst_count(dir),
            Focus::Decay => self.config.adjust_burst_decay(0.005 * step),
            Focus::Interactive => self.config.toggle_interactive(),
            Focus::LinkDistance => self.config.adjust_connection_distance(2.0 * step),
            Focus::Links => self.config.toggle_connections(),
            Focus::MaxSize => self.config.adjust_max_size(0.5 * step),
            Focus::MinSize => self.config.adjust_min_size(0.5 * step),
            Focus::Particles => self.config.adjust_particle_count(10 * dir),
            Focus::Pointer => self.config.cycle_pointer_force(),
            Focus::Radius => self.config.adjust_interaction_radius(5.0 * step),
            Focus::Speed => self.config.adjust_speed(0.1 * step),
            Focus::Strength => self.config.adjust_interaction_strength(0.005 * step),
        }
        self.preset_index = None;
        self.apply_config();
    }

    /// Change ticks per frame within bounds
    pub fn adjust_ticks(&mut self, delta: i32) {
        self.ticks_per_frame =
            (self.ticks_per_frame as i32 + delta).clamp(1, MAX_TICKS_PER_FRAME as i32) as usize;
    }

    /// Cycle to next focus
    pub fn next_focus(&mut self) {
        self.focus = self.focus.next();
    }

    /// Navigate to previous parameter (Shift+Tab)
    pub fn prev_focus(&mut self) {
        self.focus = self.focus.prev();
    }

    /// Toggle pause state
    pub fn toggle_pause(&mut self) {
        if !self.effects_enabled {
            return;
        }
        if let Some(field) = self.field.as_mut() {
            field.toggle_pause();
            self.monitor.reset();
        }
    }

    /// Repopulate the field from scratch
    pub fn reset(&mut self) {
        self.create_field();
    }

    pub fn cycle_palette(&mut self) {
        self.focus = Focus::Palette;
        self.adjust_focused(1);
    }

    pub fn toggle_connections(&mut self) {
        self.focus = Focus::Links;
        self.adjust_focused(1);
    }

    pub fn cycle_pointer_force(&mut self) {
        self.focus = Focus::Pointer;
        self.adjust_focused(1);
    }

    pub fn toggle_interactive(&mut self) {
        self.focus = Focus::Interactive;
        self.adjust_focused(1);
    }

    pub fn toggle_trails(&mut self) {
        self.show_trails = !self.show_trails;
    }

    pub fn toggle_glow(&mut self) {
        self.show_glow = !self.show_glow;
    }

    /// Turn the effects on or off and persist the choice
    pub fn toggle_effects(&mut self) {
        self.effects_enabled = !self.effects_enabled;
        if let Some(field) = self.field.as_mut() {
            if self.effects_enabled {
                field.start();
            } else {
                field.pause();
            }
        }
        self.monitor.reset();
        info!(
            "effects {}",
            if self.effects_enabled { "enabled" } else { "disabled" }
        );

        if let Some(path) = self.preferences_path.as_deref() {
            let prefs = Preferences {
                effects_enabled: self.effects_enabled,
            };
            if let Err(err) = prefs.save_to_file(path) {
                warn!("could not save preferences: {}", err);
                self.status_message = Some(format!("prefs not saved: {}", err));
            }
        }
    }

    /// Terminal lost focus: stop consuming ticks
    pub fn focus_lost(&mut self) {
        if let Some(field) = self.field.as_mut() {
            if field.is_running() {
                field.pause();
                self.suspended = true;
            }
        }
        self.monitor.reset();
    }

    /// Terminal regained focus: resume if we paused it
    pub fn focus_gained(&mut self) {
        if self.suspended {
            if let Some(field) = self.field.as_mut() {
                field.resume();
            }
            self.suspended = false;
        }
    }

    /// Apply the next preset in the list
    pub fn next_preset(&mut self) {
        let count = self.presets.all_presets().count();
        if count == 0 {
            return;
        }
        let index = self.preset_index.map_or(0, |i| (i + 1) % count);
        let preset = self.presets.all_presets().nth(index).cloned();
        if let Some(preset) = preset {
            self.apply_preset(&preset);
            self.preset_index = Some(index);
        }
    }

    /// Replace the config with a preset's
    pub fn apply_preset(&mut self, preset: &Preset) {
        self.palette = preset.palette;
        self.config = preset.config.clone();
        self.apply_config();
        self.status_message = Some(format!("preset: {}", preset.name));
    }

    /// Name of the active preset, if the config still matches one
    pub fn preset_name(&self) -> Option<&str> {
        self.preset_index
            .and_then(|i| self.presets.all_presets().nth(i))
            .map(|p| p.name.as_str())
    }

    /// Save the current config as a user preset
    pub fn save_user_preset(&mut self) {
        let name = format!("User {}", self.presets.user.len() + 1);
        let preset = Preset::new(name.clone(), "Saved from the sidebar", self.palette, self.config.clone());
        self.status_message = Some(match self.presets.save_preset(preset) {
            Ok(()) => format!("saved preset {}", name),
            Err(err) => {
                warn!("could not save preset: {}", err);
                format!("preset not saved: {}", err)
            }
        });
    }

    /// Delete the active preset if it is a user preset
    pub fn delete_user_preset(&mut self) {
        let builtin = self.presets.builtin.len();
        let Some(index) = self.preset_index.filter(|&i| i >= builtin) else {
            self.status_message = Some("no user preset selected".to_string());
            return;
        };
        let Some(name) = self.presets.user.get(index - builtin).map(|p| p.name.clone()) else {
            return;
        };
        self.status_message = Some(match self.presets.delete_preset(&name) {
            Ok(()) => {
                self.preset_index = None;
                format!("deleted preset {}", name)
            }
            Err(err) => {
                warn!("could not delete preset: {}", err);
                format!("preset not deleted: {}", err)
            }
        });
    }

    /// Write the current config to the export path
    pub fn export_config(&mut self) {
        self.status_message = Some(match self.app_config().save_to_file(&self.export_path) {
            Ok(()) => format!("exported {}", self.export_path.display()),
            Err(err) => {
                warn!("config export failed: {}", err);
                format!("export failed: {}", err)
            }
        });
    }

    /// Toggle fullscreen mode
    pub fn toggle_fullscreen(&mut self) {
        self.fullscreen_mode = !self.fullscreen_mode;
    }

    /// Toggle help overlay
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
        if self.show_help {
            self.help_scroll = 0; // Reset scroll when opening
        }
    }

    /// Scroll help content up
    pub fn scroll_help_up(&mut self) {
        self.help_scroll = self.help_scroll.saturating_sub(1);
    }

    /// Scroll help content down
    pub fn scroll_help_down(&mut self, max_scroll: u16) {
        self.help_scroll = (self.help_scroll + 1).min(max_scroll);
    }

    /// Scroll controls box up
    pub fn scroll_controls_up(&mut self) {
        self.controls_scroll = self.controls_scroll.saturating_sub(1);
    }

    /// Scroll controls box down
    pub fn scroll_controls_down(&mut self, max_scroll: u16) {
        self.controls_scroll = (self.controls_scroll + 1).min(max_scroll);
    }

    /// Canvas size in cells
    pub fn canvas_size(&self) -> (u16, u16) {
        self.canvas
    }

    /// Resize the field to match a new canvas size
    pub fn resize(&mut self, canvas_width: u16, canvas_height: u16) {
        self.canvas = (canvas_width, canvas_height);
        let bounds = braille::calculate_field_size(canvas_width, canvas_height);
        if let Some(field) = self.field.as_mut() {
            if let Err(err) = field.resize(bounds) {
                warn!("resize rejected: {}", err);
            }
        } else if matches!(self.field_error, Some(FieldError::SurfaceUnavailable)) {
            // A surface may be available now
            self.create_field();
        }
    }

    /// Tear the field down before exit
    pub fn shutdown(&mut self) {
        if let Some(field) = self.field.as_mut() {
            field.destroy();
        }
    }

    // === Popup methods ===

    /// Parameters whose display name starts with a given letter
    fn get_params_for_letter(letter: char) -> Vec<(Focus, &'static str)> {
        let letter = letter.to_ascii_lowercase();
        PARAMS
            .iter()
            .filter(|(_, name)| name.to_ascii_lowercase().starts_with(letter))
            .copied()
            .collect()
    }

    /// Open parameter popup for a given letter
    pub fn open_param_popup(&mut self, letter: char) {
        let options = Self::get_params_for_letter(letter);
        if !options.is_empty() {
            self.param_popup = Some(ParamPopup {
                letter: letter.to_ascii_uppercase(),
                options,
                selected_idx: 0,
            });
        }
    }

    /// Open popup with all parameters (Shift+?)
    pub fn open_all_params_popup(&mut self) {
        self.param_popup = Some(ParamPopup {
            letter: '?',
            options: PARAMS.to_vec(),
            selected_idx: 0,
        });
    }

    /// Close the parameter popup without selecting
    pub fn close_param_popup(&mut self) {
        self.param_popup = None;
    }

    /// Confirm selection and close popup
    pub fn confirm_param_popup(&mut self) {
        if let Some(popup) = &self.param_popup {
            if let Some((focus, _)) = popup.options.get(popup.selected_idx) {
                self.focus = *focus;
            }
        }
        self.param_popup = None;
    }

    /// Navigate up in popup
    pub fn popup_nav_up(&mut self) {
        if let Some(popup) = &mut self.param_popup {
            if popup.selected_idx > 0 {
                popup.selected_idx -= 1;
            } else {
                popup.selected_idx = popup.options.len().saturating_sub(1);
            }
        }
    }

    /// Navigate down in popup
    pub fn popup_nav_down(&mut self) {
        if let Some(popup) = &mut self.param_popup {
            if popup.selected_idx < popup.options.len().saturating_sub(1) {
                popup.selected_idx += 1;
            } else {
                popup.selected_idx = 0;
            }
        }
    }
}
