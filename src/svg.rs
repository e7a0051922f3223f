use crate::error::StoreError;
use crate::palette::{Rgb, LINK_COLOR};
use crate::render::{FieldFrame, FieldRenderer};
use std::fmt::Write;
use std::fs;
use std::path::Path;

/// Trail stroke opacity (hex `20`)
const TRAIL_OPACITY: f32 = 0.125;
/// Halo opacity halfway out (hex `40`)
const HALO_MID_OPACITY: f32 = 0.25;
const LINK_WIDTH: f32 = 0.5;

/// Renders a frame as a standalone SVG document
#[derive(Debug, Clone, Default)]
pub struct SvgRenderer {
    /// Fill painted behind the field; transparent when `None`
    pub background: Option<Rgb>,
}

impl SvgRenderer {
    pub fn new(background: Option<Rgb>) -> Self {
        Self { background }
    }

    /// Render and write the document to `path`
    pub fn export(&mut self, frame: &FieldFrame<'_>, path: &Path) -> Result<(), StoreError> {
        let svg = self.render(frame);
        fs::write(path, svg)?;
        Ok(())
    }
}

impl FieldRenderer for SvgRenderer {
    type Output = String;

    fn render(&mut self, frame: &FieldFrame<'_>) -> String {
        let (w, h) = (frame.bounds.width, frame.bounds.height);
        let mut out = String::new();
        let _ = writeln!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w:.0}" height="{h:.0}" viewBox="0 0 {w:.2} {h:.2}">"#
        );
        if let Some(bg) = self.background {
            let _ = writeln!(out, r#"  <rect width="100%" height="100%" fill="{bg}"/>"#);
        }

        // One gradient per particle: the centre stop carries its opacity
        out.push_str("  <defs>\n");
        for (i, particle) in frame.particles.iter().enumerate() {
            let color = frame.color_of(particle);
            let _ = writeln!(
                out,
                r#"    <radialGradient id="glow-{i}"><stop offset="0" stop-color="{color}" stop-opacity="{:.3}"/><stop offset="0.5" stop-color="{color}" stop-opacity="{HALO_MID_OPACITY}"/><stop offset="1" stop-color="{color}" stop-opacity="0"/></radialGradient>"#,
                particle.opacity
            );
        }
        out.push_str("  </defs>\n");

        for link in &frame.connections {
            let _ = writeln!(
                out,
                r#"  <line x1="{:.2}" y1="{:.2}" x2="{:.2}" y2="{:.2}" stroke="{LINK_COLOR}" stroke-opacity="{:.3}" stroke-width="{LINK_WIDTH}"/>"#,
                link.from.x, link.from.y, link.to.x, link.to.y, link.opacity
            );
        }

        for (i, particle) in frame.particles.iter().enumerate() {
            let color = frame.color_of(particle);
            if particle.trail.len() > 1 {
                let points: Vec<String> = particle
                    .trail
                    .iter()
                    .map(|p| format!("{:.2},{:.2}", p.x, p.y))
                    .collect();
                let _ = writeln!(
                    out,
                    r#"  <polyline points="{}" fill="none" stroke="{color}" stroke-opacity="{TRAIL_OPACITY}" stroke-width="1"/>"#,
                    points.join(" ")
                );
            }
            let (x, y) = (particle.position.x, particle.position.y);
            let _ = writeln!(
                out,
                r#"  <circle cx="{x:.2}" cy="{y:.2}" r="{:.2}" fill="url(#glow-{i})"/>"#,
                particle.size * 3.0
            );
            let _ = writeln!(
                out,
                r#"  <circle cx="{x:.2}" cy="{y:.2}" r="{:.2}" fill="{color}"/>"#,
                particle.size
            );
        }

        out.push_str("</svg>\n");
        out
    }
}
