use crate::error::FieldError;
use crate::palette::{PaletteName, Rgb};
use serde::{Deserialize, Serialize};

/// Upper limit on base particles; link computation is quadratic
pub const MAX_PARTICLES: usize = 5000;

/// Upper limit on base speed
pub const MAX_SPEED: f32 = 5.0;

/// Direction of the pointer interaction force
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum PointerForce {
    /// Push particles away from the pointer
    #[default]
    Repel,
    /// Pull particles towards the pointer
    Attract,
}

impl PointerForce {
    pub fn name(&self) -> &'static str {
        match self {
            PointerForce::Repel => "Repel",
            PointerForce::Attract => "Attract",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            PointerForce::Repel => PointerForce::Attract,
            PointerForce::Attract => PointerForce::Repel,
        }
    }

    /// Sign applied to the unit vector pointing at the pointer
    pub fn sign(&self) -> f32 {
        match self {
            PointerForce::Repel => -1.0,
            PointerForce::Attract => 1.0,
        }
    }
}

/// Drawable area of the field, in field coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// A surface needs a finite, non-zero area
    pub fn is_drawable(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// All field parameters consolidated into one struct
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    // === Population ===
    /// Number of long-lived base particles
    pub particle_count: usize,
    /// Smallest particle radius
    pub min_size: f32,
    /// Largest particle radius
    pub max_size: f32,
    /// Ordered, non-empty set of particle colours
    pub colors: Vec<Rgb>,

    // === Motion ===
    /// Base speed; initial velocity range and half the velocity cap
    pub speed: f32,
    /// Lower bound of the per-particle opacity pulse speed
    pub min_pulse_speed: f32,
    /// Upper bound of the per-particle opacity pulse speed
    pub max_pulse_speed: f32,

    // === Pointer ===
    /// Whether the pointer pushes or pulls particles
    pub interactive: bool,
    /// Direction of the pointer force
    pub pointer_force: PointerForce,
    /// Distance within which the pointer acts
    pub interaction_radius: f32,
    /// Scale of the pointer force
    pub interaction_strength: f32,

    // === Links ===
    /// Pairs closer than this are linked
    pub connection_distance: f32,
    /// Whether links are emitted with each frame
    pub show_connections: bool,

    // === Bursts ===
    /// Particles released per burst
    pub burst_count: usize,
    /// Life lost per tick by burst and spark particles
    pub burst_decay: f32,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            particle_count: 50,
            min_size: 1.0,
            max_size: 4.0,
            colors: PaletteName::Neon.colors(),

            speed: 0.5,
            min_pulse_speed: 0.01,
            max_pulse_speed: 0.03,

            interactive: true,
            pointer_force: PointerForce::default(),
            interaction_radius: 100.0,
            interaction_strength: 0.01,

            connection_distance: 150.0,
            show_connections: true,

            burst_count: 8,
            burst_decay: 0.02,
        }
    }
}

impl FieldConfig {
    /// Check every field; nothing is clamped silently
    pub fn validate(&self) -> Result<(), FieldError> {
        let invalid = |msg: String| Err(FieldError::Configuration(msg));

        if self.particle_count > MAX_PARTICLES {
            return invalid(format!(
                "particle count {} exceeds {}",
                self.particle_count, MAX_PARTICLES
            ));
        }
        if self.colors.is_empty() {
            return invalid("colour palette is empty".to_string());
        }
        if !(self.min_size.is_finite() && self.max_size.is_finite()) {
            return invalid("particle sizes must be finite".to_string());
        }
        if self.min_size <= 0.0 {
            return invalid(format!("minimum size {} must be positive", self.min_size));
        }
        if self.min_size > self.max_size {
            return invalid(format!(
                "size range is inverted ({} > {})",
                self.min_size, self.max_size
            ));
        }
        let non_negative = [
            ("speed", self.speed),
            ("interaction radius", self.interaction_radius),
            ("interaction strength", self.interaction_strength),
            ("connection distance", self.connection_distance),
            ("burst decay", self.burst_decay),
            ("minimum pulse speed", self.min_pulse_speed),
            ("maximum pulse speed", self.max_pulse_speed),
        ];
        for (label, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return invalid(format!("{} must be a non-negative number, got {}", label, value));
            }
        }
        if self.speed > MAX_SPEED {
            return invalid(format!("speed {} exceeds {}", self.speed, MAX_SPEED));
        }
        if self.burst_decay <= 0.0 {
            return invalid(format!(
                "burst decay must be positive, got {}",
                self.burst_decay
            ));
        }
        if self.min_pulse_speed > self.max_pulse_speed {
            return invalid("pulse speed range is inverted".to_string());
        }
        Ok(())
    }

    /// Velocity components are clamped to this magnitude each tick
    pub fn max_velocity(&self) -> f32 {
        self.speed * 2.0
    }

    /// Adjust particle count within bounds
    pub fn adjust_particle_count(&mut self, delta: i32) {
        self.particle_count =
            (self.particle_count as i64 + delta as i64).clamp(0, MAX_PARTICLES as i64) as usize;
    }

    /// Adjust base speed within bounds
    pub fn adjust_speed(&mut self, delta: f32) {
        self.speed = (self.speed + delta).clamp(0.0, MAX_SPEED);
    }

    /// Adjust the upper size, dragging the lower one along when they cross
    pub fn adjust_max_size(&mut self, delta: f32) {
        self.max_size = (self.max_size + delta).clamp(0.5, 10.0);
        self.min_size = self.min_size.min(self.max_size);
    }

    /// Adjust the lower size, pushing the upper one along when they cross
    pub fn adjust_min_size(&mut self, delta: f32) {
        self.min_size = (self.min_size + delta).clamp(0.5, 10.0);
        self.max_size = self.max_size.max(self.min_size);
    }

    /// Adjust pointer radius within bounds
    pub fn adjust_interaction_radius(&mut self, delta: f32) {
        self.interaction_radius = (self.interaction_radius + delta).clamp(0.0, 400.0);
    }

    /// Adjust pointer strength within bounds
    pub fn adjust_interaction_strength(&mut self, delta: f32) {
        self.interaction_strength = (self.interaction_strength + delta).clamp(0.0, 0.5);
    }

    /// Adjust link distance within bounds
    pub fn adjust_connection_distance(&mut self, delta: f32) {
        self.connection_distance = (self.connection_distance + delta).clamp(0.0, 400.0);
    }

    /// Adjust burst size within bounds
    pub fn adjust_burst_count(&mut self, delta: i32) {
        self.burst_count = (self.burst_count as i32 + delta).clamp(1, 64) as usize;
    }

    /// Adjust burst decay within bounds
    pub fn adjust_burst_decay(&mut self, delta: f32) {
        self.burst_decay = (self.burst_decay + delta).clamp(0.005, 0.2);
    }

    pub fn toggle_interactive(&mut self) {
        self.interactive = !self.interactive;
    }

    pub fn toggle_connections(&mut self) {
        self.show_connections = !self.show_connections;
    }

    pub fn cycle_pointer_force(&mut self) {
        self.pointer_force = self.pointer_force.next();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_config_error(config: &FieldConfig) {
        match config.validate() {
            Err(FieldError::Configuration(_)) => {}
            other => panic!("expected configuration error, got {:?}", other),
        }
    }

    #[test]
    fn test_default_is_valid() {
        assert!(FieldConfig::default().validate().is_ok());
    }

    #[test]
    fn test_empty_palette_rejected() {
        let config = FieldConfig {
            colors: Vec::new(),
            ..Default::default()
        };
        assert_config_error(&config);
    }

    #[test]
    fn test_inverted_size_range_rejected() {
        let config = FieldConfig {
            min_size: 3.0,
            max_size: 1.0,
            ..Default::default()
        };
        assert_config_error(&config);
    }

    #[test]
    fn test_non_positive_size_rejected() {
        let config = FieldConfig {
            min_size: 0.0,
            ..Default::default()
        };
        assert_config_error(&config);
    }

    #[test]
    fn test_particle_count_limit() {
        let config = FieldConfig {
            particle_count: MAX_PARTICLES + 1,
            ..Default::default()
        };
        assert_config_error(&config);

        let config = FieldConfig {
            particle_count: 0,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_non_finite_values_rejected() {
        let config = FieldConfig {
            speed: f32::NAN,
            ..Default::default()
        };
        assert_config_error(&config);

        let config = FieldConfig {
            connection_distance: -1.0,
            ..Default::default()
        };
        assert_config_error(&config);
    }

    #[test]
    fn test_burst_decay_must_be_positive() {
        for decay in [0.0, -0.02] {
            let config = FieldConfig {
                burst_decay: decay,
                ..Default::default()
            };
            assert_config_error(&config);
        }
    }

    #[test]
    fn test_speed_limit() {
        let config = FieldConfig {
            speed: 1.0e38,
            ..Default::default()
        };
        assert_config_error(&config);

        let config = FieldConfig {
            speed: MAX_SPEED,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_speed_and_distance_allowed() {
        let config = FieldConfig {
            speed: 0.0,
            connection_distance: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
        assert_eq!(config.max_velocity(), 0.0);
    }

    #[test]
    fn test_adjusters_keep_config_valid() {
        let mut config = FieldConfig::default();
        config.adjust_min_size(20.0);
        assert!(config.min_size <= config.max_size);
        config.adjust_max_size(-20.0);
        assert!(config.min_size <= config.max_size);
        config.adjust_particle_count(-1000);
        assert_eq!(config.particle_count, 0);
        config.adjust_burst_count(-100);
        assert_eq!(config.burst_count, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_pointer_force_sign() {
        assert_eq!(PointerForce::Repel.sign(), -1.0);
        assert_eq!(PointerForce::Attract.sign(), 1.0);
        assert_eq!(PointerForce::Repel.next(), PointerForce::Attract);
    }

    #[test]
    fn test_bounds_drawable() {
        assert!(Bounds::new(10.0, 10.0).is_drawable());
        assert!(!Bounds::new(0.0, 10.0).is_drawable());
        assert!(!Bounds::new(f32::INFINITY, 10.0).is_drawable());
    }
}
