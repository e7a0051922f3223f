use crate::app::{App, Focus, ParamPopup};
use crate::braille::BrailleRenderer;
use crate::field::FieldState;
use crate::render::FieldRenderer;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
    Frame,
};

const SIDEBAR_WIDTH: u16 = 24;

/// Max scroll for help content (generous to account for text wrapping on small screens)
pub const HELP_CONTENT_LINES: u16 = 50;

/// Number of lines in controls content
pub const CONTROLS_CONTENT_LINES: u16 = 20;

// UI color scheme
const BORDER_COLOR: Color = Color::Cyan;
const HIGHLIGHT_COLOR: Color = Color::Yellow;
const TEXT_COLOR: Color = Color::White;
const DIM_TEXT_COLOR: Color = Color::Gray;

/// Creates a standard styled block with rounded borders
fn styled_block(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(BORDER_COLOR))
        .title(title)
}

/// Main render function
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    if app.fullscreen_mode {
        render_canvas(frame, area, app);
    } else {
        let layout = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(0)])
            .split(area);

        render_sidebar(frame, layout[0], app);
        render_canvas(frame, layout[1], app);
    }

    if let Some(popup) = &app.param_popup {
        render_param_popup(frame, area, popup);
    }

    if app.show_help {
        render_help_overlay(frame, area, app);
    }
}

/// Calculate the canvas size (excluding borders)
pub fn get_canvas_size(frame_area: Rect, fullscreen: bool) -> (u16, u16) {
    let rect = get_canvas_rect(frame_area, fullscreen);
    (rect.width, rect.height)
}

/// Inner canvas area in terminal cells; mouse events are mapped through it
pub fn get_canvas_rect(frame_area: Rect, fullscreen: bool) -> Rect {
    let left = if fullscreen { 0 } else { SIDEBAR_WIDTH };
    Rect {
        x: frame_area.x + left + 1,
        y: frame_area.y + 1,
        width: frame_area.width.saturating_sub(left + 2),
        height: frame_area.height.saturating_sub(2),
    }
}

/// Visible rows of the controls box for a terminal height
pub fn get_controls_visible_lines(terminal_height: u16) -> u16 {
    // status + params boxes, then the controls border
    terminal_height.saturating_sub(8 + 16 + 2)
}

fn render_sidebar(frame: &mut Frame, area: Rect, app: &App) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(8),  // Status
            Constraint::Length(16), // Parameters
            Constraint::Min(6),     // Controls
        ])
        .split(area);

    render_status_box(frame, sections[0], app);
    render_params_box(frame, sections[1], app);
    render_controls_box(frame, sections[2], app);
}

fn render_status_box(frame: &mut Frame, area: Rect, app: &App) {
    let block = styled_block(" Particle Field ");

    let (status_text, status_color) = match app.field.as_ref().map(|f| f.state()) {
        None => ("UNAVAILABLE", Color::Red),
        Some(_) if !app.effects_enabled => ("EFFECTS OFF", DIM_TEXT_COLOR),
        Some(state) => {
            let color = match state {
                FieldState::Running => BORDER_COLOR,
                FieldState::Paused | FieldState::Ready => HIGHLIGHT_COLOR,
                FieldState::Destroyed => Color::Red,
            };
            (state.name(), color)
        }
    };

    let text = |s: String| Line::from(Span::styled(s, Style::default().fg(TEXT_COLOR)));
    let mut content = vec![Line::from(Span::styled(status_text, Style::default().fg(status_color)))];

    if let Some(field) = app.field.as_ref() {
        content.push(text(format!(
            "particles {} +{}",
            field.base_count(),
            field.transient_count()
        )));
        let links = if app.config.show_connections {
            field.compute_connections().len().to_string()
        } else {
            "off".to_string()
        };
        content.push(text(format!("links {}", links)));
    } else if let Some(err) = &app.field_error {
        content.push(text(err.to_string()));
    }

    let fps = app
        .monitor
        .fps()
        .map_or_else(|| "--".to_string(), |fps| format!("{:.0}", fps));
    content.push(Line::from(Span::styled(
        format!("fps {}  preset {}", fps, app.preset_name().unwrap_or("-")),
        Style::default().fg(DIM_TEXT_COLOR),
    )));

    if let Some(msg) = &app.status_message {
        content.push(Line::from(Span::styled(msg.clone(), Style::default().fg(HIGHLIGHT_COLOR))));
    }

    let paragraph = Paragraph::new(content)
        .block(block)
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

fn on_off(flag: bool) -> String {
    let text = if flag { "on" } else { "off" };
    text.to_string()
}

fn render_params_box(frame: &mut Frame, area: Rect, app: &App) {
    let block = styled_block(" Parameters ");

    let make_line = |label: &str, value: String, focus: Focus| {
        let focused = app.focus == focus;
        let prefix = if focused { "> " } else { "  " };
        let style = if focused {
            Style::default().fg(HIGHLIGHT_COLOR)
        } else {
            Style::default().fg(TEXT_COLOR)
        };
        Line::from(Span::styled(format!("{}{}: {}", prefix, label, value), style))
    };

    let config = &app.config;

    // Same order as Focus::line_index
    let content = vec![
        make_line("Burst", config.burst_count.to_string(), Focus::Burst),
        make_line("Decay", format!("{:.3}", config.burst_decay), Focus::Decay),
        make_line("Interact", on_off(config.interactive), Focus::Interactive),
        make_line("Link Dist", format!("{:.0}", config.connection_distance), Focus::LinkDistance),
        make_line("Links", on_off(config.show_connections), Focus::Links),
        make_line("Max Size", format!("{:.1}", config.max_size), Focus::MaxSize),
        make_line("Min Size", format!("{:.1}", config.min_size), Focus::MinSize),
        make_line("Palette", app.palette.name().to_string(), Focus::Palette),
        make_line("Particles", config.particle_count.to_string(), Focus::Particles),
        make_line("Pointer", config.pointer_force.name().to_string(), Focus::Pointer),
        make_line("Radius", format!("{:.0}", config.interaction_radius), Focus::Radius),
        make_line("Speed", format!("{:.1}", config.speed), Focus::Speed),
        make_line("Strength", format!("{:.3}", config.interaction_strength), Focus::Strength),
        make_line("Ticks", app.ticks_per_frame.to_string(), Focus::Ticks),
    ];

    // Calculate scroll to keep focused item visible based on actual area
    let focus_line = app.focus.line_index();
    let visible_height = area.height.saturating_sub(2); // minus borders
    let content_height = content.len() as u16;

    let scroll = if visible_height == 0 || visible_height >= content_height {
        0
    } else if focus_line >= visible_height {
        focus_line.saturating_sub(visible_height - 1)
    } else {
        0
    };

    let paragraph = Paragraph::new(content)
        .block(block)
        .scroll((scroll, 0));
    frame.render_widget(paragraph, area);
}

fn render_controls_box(frame: &mut Frame, area: Rect, app: &App) {
    let key_style = Style::default().fg(HIGHLIGHT_COLOR);
    let desc_style = Style::default().fg(DIM_TEXT_COLOR);

    let make_control = |key: &str, desc: String| -> Line<'_> {
        Line::from(vec![
            Span::styled(format!("{:>5}", key), key_style),
            Span::styled(format!(" {}", desc), desc_style),
        ])
    };

    let content = vec![
        make_control("Click", "burst".to_string()),
        make_control("Drag", "spark trail".to_string()),
        make_control("Space", "pause/resume".to_string()),
        make_control("B", "burst at centre".to_string()),
        make_control("X", format!("effects: {}", on_off(app.effects_enabled))),
        make_control("P", "next preset".to_string()),
        make_control("N", format!("palette: {}", app.palette.name())),
        make_control("F", format!("force: {}", app.config.pointer_force.name())),
        make_control("I", "pointer on/off".to_string()),
        make_control("C", "links on/off".to_string()),
        make_control("T", format!("trails: {}", on_off(app.show_trails))),
        make_control("G", format!("glow: {}", on_off(app.show_glow))),
        make_control("R", "repopulate".to_string()),
        make_control("+/-", "ticks per frame".to_string()),
        make_control("W", "save preset".to_string()),
        make_control("D", "delete user preset".to_string()),
        make_control("E", "export config".to_string()),
        make_control("V", "fullscreen".to_string()),
        make_control("H", "help".to_string()),
        make_control("Q", "quit".to_string()),
    ];

    let content_height = content.len() as u16;
    let visible_height = area.height.saturating_sub(2); // minus borders
    let is_scrollable = content_height > visible_height;

    let title = if is_scrollable {
        " Controls (↑↓) "
    } else {
        " Controls "
    };

    let paragraph = Paragraph::new(content)
        .block(styled_block(title))
        .scroll((app.controls_scroll, 0));
    frame.render_widget(paragraph, area);
}

fn render_canvas(frame: &mut Frame, area: Rect, app: &App) {
    let block = styled_block("");

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let notice = match (&app.field, app.effects_enabled) {
        (None, _) => Some("effects unavailable"),
        (Some(_), false) => Some("effects off (X to enable)"),
        _ => None,
    };
    if let Some(text) = notice {
        let y = inner.y + inner.height / 2;
        let line_area = Rect { x: inner.x, y, width: inner.width, height: 1.min(inner.height) };
        let paragraph = Paragraph::new(Span::styled(text, Style::default().fg(DIM_TEXT_COLOR)))
            .alignment(Alignment::Center);
        frame.render_widget(paragraph, line_area);
        return;
    }
    let Some(field) = app.field.as_ref() else {
        return;
    };

    let mut renderer = BrailleRenderer::new(inner.width, inner.height);
    renderer.show_trails = app.show_trails;
    renderer.show_glow = app.show_glow;
    let cells = renderer.render(&field.frame());

    let buf = frame.buffer_mut();
    for cell in cells {
        let x = inner.x + cell.x;
        let y = inner.y + cell.y;

        if x < inner.x + inner.width && y < inner.y + inner.height {
            if let Some(target) = buf.cell_mut((x, y)) {
                target.set_char(cell.char).set_fg(cell.color);
            }
        }
    }
}

fn render_param_popup(frame: &mut Frame, area: Rect, popup: &ParamPopup) {
    let width = 28.min(area.width);
    let height = (popup.options.len() as u16 + 2).min(area.height);
    let popup_area = Rect {
        x: area.x + area.width.saturating_sub(width) / 2,
        y: area.y + area.height.saturating_sub(height) / 2,
        width,
        height,
    };

    frame.render_widget(Clear, popup_area);

    let content: Vec<Line> = popup
        .options
        .iter()
        .enumerate()
        .map(|(i, (_, name))| {
            if i == popup.selected_idx {
                Line::from(Span::styled(format!("> {}", name), Style::default().fg(HIGHLIGHT_COLOR)))
            } else {
                Line::from(Span::styled(format!("  {}", name), Style::default().fg(TEXT_COLOR)))
            }
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Double)
        .border_style(Style::default().fg(HIGHLIGHT_COLOR))
        .title(format!(" {} ", popup.letter));

    frame.render_widget(Paragraph::new(content).block(block), popup_area);
}

fn render_help_overlay(frame: &mut Frame, area: Rect, app: &App) {
    // Calculate the canvas area (exclude sidebar unless fullscreen)
    let canvas_x = if app.fullscreen_mode { 0 } else { SIDEBAR_WIDTH };
    let canvas_width = if app.fullscreen_mode {
        area.width
    } else {
        area.width.saturating_sub(SIDEBAR_WIDTH)
    };

    // Center the help dialog within the canvas
    let help_width = 56.min(canvas_width.saturating_sub(4));
    let help_height = area.height.saturating_sub(4).min(36);
    let x = canvas_x + (canvas_width.saturating_sub(help_width)) / 2;
    let y = (area.height.saturating_sub(help_height)) / 2;

    let help_area = Rect {
        x: area.x + x,
        y: area.y + y,
        width: help_width,
        height: help_height,
    };

    frame.render_widget(Clear, help_area);

    let heading = |s: &'static str| Line::from(Span::styled(s, Style::default().fg(HIGHLIGHT_COLOR)));
    let item = |s: &'static str| Line::from(Span::styled(s, Style::default().fg(TEXT_COLOR)));

    let content = vec![
        Line::from(""),
        Line::from(Span::styled("PARTICLE FIELD", Style::default().fg(BORDER_COLOR))),
        Line::from(""),
        Line::from("Particles drift, pulse and bounce off the edges. Pairs closer than the link distance are joined by a line that fades with distance."),
        Line::from(""),
        heading("POINTER:"),
        Line::from("Moving the mouse over the field pushes particles away (Repel) or pulls them in (Attract) within the pointer radius."),
        Line::from("Click releases a burst of short-lived particles. Dragging leaves a spark trail."),
        Line::from(""),
        heading("PARAMETERS:"),
        item("Burst / Decay"),
        Line::from("Particles per burst and life lost per tick. Slow frame rates shrink bursts automatically."),
        item("Link Dist / Links"),
        Line::from("Linking distance in Braille dots, and whether links are drawn."),
        item("Speed"),
        Line::from("Initial drift speed; velocity is capped at twice this."),
        item("Ticks"),
        Line::from("Field ticks per rendered frame."),
        Line::from(""),
        heading("PRESETS:"),
        Line::from("Ambient, Bubble, Nav Trail, Constellation, Calm, then any saved user presets."),
        Line::from(""),
        heading("BASIC CONTROLS:"),
        Line::from("Space=Pause, X=Effects, P=Preset, N=Palette, F=Force, Tab/Arrows=Adjust, Shift+letter=Jump, V=Fullscreen, Q=Quit"),
        Line::from(""),
    ];

    let content_height = content.len() as u16;
    let visible_height = help_height.saturating_sub(2); // minus borders
    let is_scrollable = content_height > visible_height;

    let title = if is_scrollable {
        " Help (J/K scroll, H to close) "
    } else {
        " Help (H to close) "
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Double)
        .border_style(Style::default().fg(HIGHLIGHT_COLOR))
        .title(title);

    let paragraph = Paragraph::new(content)
        .block(block)
        .wrap(Wrap { trim: true })
        .scroll((app.help_scroll, 0));

    frame.render_widget(paragraph, help_area);
}
