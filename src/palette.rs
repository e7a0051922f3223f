use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A 24-bit colour, stored in configs as `#rrggbb`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Scale towards black by `alpha` (0.0 = black, 1.0 = unchanged)
    pub fn dimmed(self, alpha: f32) -> Rgb {
        let a = alpha.clamp(0.0, 1.0);
        Rgb {
            r: (self.r as f32 * a).round() as u8,
            g: (self.g as f32 * a).round() as u8,
            b: (self.b as f32 * a).round() as u8,
        }
    }
}

impl FromStr for Rgb {
    type Err = String;

    /// Accepts `#rgb` and `#rrggbb`, with or without the leading `#`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim().trim_start_matches('#');
        let channel = |part: &str| {
            u8::from_str_radix(part, 16).map_err(|_| format!("invalid colour '{}'", s))
        };
        match hex.len() {
            3 => {
                let expand = |i: usize| channel(&hex[i..i + 1]).map(|v| v * 17);
                Ok(Rgb::new(expand(0)?, expand(1)?, expand(2)?))
            }
            6 => Ok(Rgb::new(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
            )),
            _ => Err(format!("invalid colour '{}'", s)),
        }
    }
}

impl TryFrom<String> for Rgb {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Rgb> for String {
    fn from(value: Rgb) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Parse a comma separated list of hex colours
pub fn parse_palette(list: &str) -> Result<Vec<Rgb>, String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse)
        .collect()
}

/// Built-in palettes
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum PaletteName {
    /// Cyan, magenta, yellow, green
    #[default]
    Neon,
    /// Purple, pink, blue, green, amber, red
    Portfolio,
    /// Cyan, magenta, yellow
    Nav,
    /// Greens
    Matrix,
    /// Whites and greys
    Mono,
    /// Colours supplied on the command line or in a config file
    Custom,
}

impl PaletteName {
    pub fn name(&self) -> &'static str {
        match self {
            PaletteName::Neon => "Neon",
            PaletteName::Portfolio => "Portfolio",
            PaletteName::Nav => "Nav",
            PaletteName::Matrix => "Matrix",
            PaletteName::Mono => "Mono",
            PaletteName::Custom => "Custom",
        }
    }

    /// Custom is never reached by cycling
    pub fn next(&self) -> Self {
        match self {
            PaletteName::Neon => PaletteName::Portfolio,
            PaletteName::Portfolio => PaletteName::Nav,
            PaletteName::Nav => PaletteName::Matrix,
            PaletteName::Matrix => PaletteName::Mono,
            PaletteName::Mono | PaletteName::Custom => PaletteName::Neon,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            PaletteName::Neon | PaletteName::Custom => PaletteName::Mono,
            PaletteName::Portfolio => PaletteName::Neon,
            PaletteName::Nav => PaletteName::Portfolio,
            PaletteName::Matrix => PaletteName::Nav,
            PaletteName::Mono => PaletteName::Matrix,
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "neon" | "cyber" => Some(PaletteName::Neon),
            "portfolio" | "bubble" => Some(PaletteName::Portfolio),
            "nav" | "navigation" => Some(PaletteName::Nav),
            "matrix" | "green" => Some(PaletteName::Matrix),
            "mono" | "grey" | "gray" => Some(PaletteName::Mono),
            _ => None,
        }
    }

    /// Colours of this palette; empty for `Custom`
    pub fn colors(&self) -> Vec<Rgb> {
        match self {
            PaletteName::Neon => vec![
                Rgb::new(0x00, 0xff, 0xff),
                Rgb::new(0xff, 0x00, 0xff),
                Rgb::new(0xff, 0xff, 0x00),
                Rgb::new(0x00, 0xff, 0x41),
            ],
            PaletteName::Portfolio => vec![
                Rgb::new(0x96, 0x9c, 0xff),
                Rgb::new(0xec, 0x48, 0x99),
                Rgb::new(0x3b, 0x82, 0xf6),
                Rgb::new(0x10, 0xb9, 0x81),
                Rgb::new(0xf5, 0x9e, 0x0b),
                Rgb::new(0xef, 0x44, 0x44),
            ],
            PaletteName::Nav => vec![
                Rgb::new(0x00, 0xff, 0xff),
                Rgb::new(0xff, 0x00, 0xff),
                Rgb::new(0xff, 0xff, 0x00),
            ],
            PaletteName::Matrix => vec![
                Rgb::new(0x00, 0xff, 0x41),
                Rgb::new(0x00, 0x8f, 0x11),
                Rgb::new(0x9d, 0xff, 0xb0),
            ],
            PaletteName::Mono => vec![
                Rgb::new(0xff, 0xff, 0xff),
                Rgb::new(0xb0, 0xb0, 0xb0),
                Rgb::new(0x70, 0x70, 0x70),
            ],
            PaletteName::Custom => Vec::new(),
        }
    }
}

/// Colour used for proximity links
pub const LINK_COLOR: Rgb = Rgb::new(0x00, 0xff, 0xff);
