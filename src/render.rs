//! Read-only render data handed from the field to renderers.
//!
//! The field never draws. Each frame it exposes a [`FieldFrame`] snapshot and
//! a renderer turns that into terminal cells, SVG markup or plain statistics.

use crate::field::Particle;
use crate::palette::Rgb;
use crate::settings::Bounds;
use glam::Vec2;

/// A proximity link between two particles
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Connection {
    /// Index of the first particle in the snapshot
    pub a: usize,
    /// Index of the second particle in the snapshot
    pub b: usize,
    pub from: Vec2,
    pub to: Vec2,
    /// (1 - distance / link distance) * 0.3
    pub opacity: f32,
}

/// Snapshot of one frame; renderers must not (and cannot) mutate it
#[derive(Debug, Clone)]
pub struct FieldFrame<'a> {
    pub particles: &'a [Particle],
    pub palette: &'a [Rgb],
    pub connections: Vec<Connection>,
    pub bounds: Bounds,
}

impl FieldFrame<'_> {
    /// Palette colour of a particle
    pub fn color_of(&self, particle: &Particle) -> Rgb {
        if self.palette.is_empty() {
            return Rgb::new(0xff, 0xff, 0xff);
        }
        self.palette[particle.color % self.palette.len()]
    }
}

/// Something that paints a frame
pub trait FieldRenderer {
    type Output;

    fn render(&mut self, frame: &FieldFrame<'_>) -> Self::Output;
}

/// Summary numbers for one frame
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameStats {
    pub particles: usize,
    /// Particles with a finite life (bursts and sparks)
    pub transient: usize,
    pub connections: usize,
    pub mean_opacity: f32,
}

/// Headless renderer that only counts
#[derive(Debug, Default)]
pub struct StatsRenderer;

impl FieldRenderer for StatsRenderer {
    type Output = FrameStats;

    fn render(&mut self, frame: &FieldFrame<'_>) -> FrameStats {
        let particles = frame.particles.len();
        let transient = frame.particles.iter().filter(|p| p.life.is_some()).count();
        let mean_opacity = if particles == 0 {
            0.0
        } else {
            frame.particles.iter().map(|p| p.opacity).sum::<f32>() / particles as f32
        };
        FrameStats {
            particles,
            transient,
            connections: frame.connections.len(),
            mean_opacity,
        }
    }
}
