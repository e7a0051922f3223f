use crate::palette::{Rgb, LINK_COLOR};
use crate::render::{FieldFrame, FieldRenderer};
use crate::settings::Bounds;
use glam::Vec2;
use ratatui::style::Color;

/// Braille character rendering for high-resolution terminal graphics.
/// Each Braille character represents a 2x4 grid of dots (8 dots total).
///
/// Dot positions and their bit values:
/// ```text
/// (0,0)=0x01  (1,0)=0x08
/// (0,1)=0x02  (1,1)=0x10
/// (0,2)=0x04  (1,2)=0x20
/// (0,3)=0x40  (1,3)=0x80
/// ```
///
/// Unicode Braille patterns: U+2800 to U+28FF (256 patterns)
const BRAILLE_BASE: u32 = 0x2800;

/// Dot position to bit mapping for Braille characters
const BRAILLE_DOTS: [[u8; 4]; 2] = [
    [0x01, 0x02, 0x04, 0x40], // Left column (x=0): rows 0,1,2,3
    [0x08, 0x10, 0x20, 0x80], // Right column (x=1): rows 0,1,2,3
];

/// Dots dimmer than this are not drawn at all
const MIN_VISIBLE_ALPHA: f32 = 0.06;
/// Trail stroke strength relative to the particle colour
const TRAIL_ALPHA: f32 = 0.125;
/// Glow halo strength relative to the core
const HALO_ALPHA: f32 = 0.25;
/// Halo radius as a multiple of particle size
const HALO_SCALE: f32 = 3.0;
/// Base particles pulse on top of this floor so they never vanish
const CORE_FLOOR: f32 = 0.4;

/// A single rendered Braille cell with position and color
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BrailleCell {
    pub x: u16,
    pub y: u16,
    pub char: char,
    pub color: Color,
}

#[derive(Clone, Copy)]
struct Dot {
    color: Rgb,
    alpha: f32,
}

/// Dot raster at Braille resolution; the brightest write to a dot wins
struct DotBuffer {
    width: usize,
    height: usize,
    dots: Vec<Option<Dot>>,
}

impl DotBuffer {
    fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            dots: vec![None; width * height],
        }
    }

    fn plot(&mut self, x: i32, y: i32, color: Rgb, alpha: f32) {
        if alpha < MIN_VISIBLE_ALPHA || x < 0 || y < 0 {
            return;
        }
        let (x, y) = (x as usize, y as usize);
        if x >= self.width || y >= self.height {
            return;
        }
        let slot = &mut self.dots[y * self.width + x];
        match slot {
            Some(dot) if dot.alpha >= alpha => {}
            _ => *slot = Some(Dot { color, alpha }),
        }
    }

    /// Bresenham line between two dot positions
    fn line(&mut self, from: Vec2, to: Vec2, color: Rgb, alpha: f32) {
        if alpha < MIN_VISIBLE_ALPHA {
            return;
        }
        let (mut x0, mut y0) = (from.x.round() as i32, from.y.round() as i32);
        let (x1, y1) = (to.x.round() as i32, to.y.round() as i32);
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;

        loop {
            self.plot(x0, y0, color, alpha);
            if x0 == x1 && y0 == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x0 += sx;
            }
            if e2 <= dx {
                err += dx;
                y0 += sy;
            }
        }
    }

    /// Filled disc; always covers at least the centre dot
    fn disc(&mut self, center: Vec2, radius: f32, color: Rgb, alpha: f32) {
        let cx = center.x.round() as i32;
        let cy = center.y.round() as i32;
        let r = radius.max(0.5);
        let reach = r.ceil() as i32;
        let r_sq = r * r;
        for dy in -reach..=reach {
            for dx in -reach..=reach {
                if (dx * dx + dy * dy) as f32 <= r_sq {
                    self.plot(cx + dx, cy + dy, color, alpha);
                }
            }
        }
    }

    fn get(&self, x: usize, y: usize) -> Option<Dot> {
        if x < self.width && y < self.height {
            self.dots[y * self.width + x]
        } else {
            None
        }
    }
}

/// Terminal renderer: links, trails, glow and cores as Braille dots
#[derive(Debug, Clone)]
pub struct BrailleRenderer {
    pub canvas_width: u16,
    pub canvas_height: u16,
    pub show_trails: bool,
    pub show_glow: bool,
}

impl BrailleRenderer {
    pub fn new(canvas_width: u16, canvas_height: u16) -> Self {
        Self {
            canvas_width,
            canvas_height,
            show_trails: true,
            show_glow: true,
        }
    }
}

impl FieldRenderer for BrailleRenderer {
    type Output = Vec<BrailleCell>;

    fn render(&mut self, frame: &FieldFrame<'_>) -> Vec<BrailleCell> {
        let braille_width = self.canvas_width as usize * 2;
        let braille_height = self.canvas_height as usize * 4;
        if braille_width == 0 || braille_height == 0 || !frame.bounds.is_drawable() {
            return Vec::new();
        }

        // Field units to dots
        let scale = Vec2::new(
            braille_width as f32 / frame.bounds.width,
            braille_height as f32 / frame.bounds.height,
        );
        let size_scale = (scale.x + scale.y) / 2.0;
        let last_dot = Vec2::new(braille_width as f32 - 1.0, braille_height as f32 - 1.0);
        let to_dots = |p: Vec2| (p * scale).clamp(Vec2::ZERO, last_dot);
        let mut buffer = DotBuffer::new(braille_width, braille_height);

        for link in &frame.connections {
            buffer.line(to_dots(link.from), to_dots(link.to), LINK_COLOR, link.opacity);
        }

        for particle in frame.particles {
            let color = frame.color_of(particle);
            let core_alpha = if particle.is_base() {
                (CORE_FLOOR + particle.opacity).min(1.0)
            } else {
                particle.opacity
            };

            if self.show_trails && particle.trail.len() > 1 {
                let points: Vec<Vec2> = particle.trail.iter().map(|p| to_dots(*p)).collect();
                for pair in points.windows(2) {
                    buffer.line(pair[0], pair[1], color, TRAIL_ALPHA);
                }
            }

            let center = to_dots(particle.position);
            let radius = particle.size * size_scale;
            if self.show_glow {
                buffer.disc(center, radius * HALO_SCALE, color, core_alpha * HALO_ALPHA);
            }
            buffer.disc(center, radius, color, core_alpha);
        }

        let mut cells = Vec::new();
        for cy in 0..self.canvas_height {
            for cx in 0..self.canvas_width {
                let mut pattern: u8 = 0;
                let mut brightest: Option<Dot> = None;

                // Sample the 2x4 dots for this Braille character
                let base_bx = cx as usize * 2;
                let base_by = cy as usize * 4;

                for dx in 0..2 {
                    for dy in 0..4 {
                        if let Some(dot) = buffer.get(base_bx + dx, base_by + dy) {
                            pattern |= BRAILLE_DOTS[dx][dy];
                            if brightest.map_or(true, |b| dot.alpha > b.alpha) {
                                brightest = Some(dot);
                            }
                        }
                    }
                }

                // Only emit cells that have at least one dot
                if let Some(dot) = brightest.filter(|_| pattern != 0) {
                    let braille_char = char::from_u32(BRAILLE_BASE + pattern as u32).unwrap_or(' ');
                    let shade = dot.color.dimmed(dot.alpha);
                    cells.push(BrailleCell {
                        x: cx,
                        y: cy,
                        char: braille_char,
                        color: Color::Rgb(shade.r, shade.g, shade.b),
                    });
                }
            }
        }

        cells
    }
}

/// Field bounds matching a canvas: one field unit per Braille dot
pub fn calculate_field_size(canvas_width: u16, canvas_height: u16) -> Bounds {
    // Braille gives 2x4 resolution per character
    Bounds::new(
        (canvas_width as f32 * 2.0).max(1.0),
        (canvas_height as f32 * 4.0).max(1.0),
    )
}

/// Centre of a canvas cell in field coordinates
pub fn cell_to_field(
    cell_x: u16,
    cell_y: u16,
    canvas_width: u16,
    canvas_height: u16,
    bounds: Bounds,
) -> Vec2 {
    let dot_x = cell_x as f32 * 2.0 + 1.0;
    let dot_y = cell_y as f32 * 4.0 + 2.0;
    let dots_w = (canvas_width as f32 * 2.0).max(1.0);
    let dots_h = (canvas_height as f32 * 4.0).max(1.0);
    Vec2::new(
        (dot_x / dots_w * bounds.width).clamp(0.0, bounds.width),
        (dot_y / dots_h * bounds.height).clamp(0.0, bounds.height),
    )
}
