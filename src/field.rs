use crate::error::FieldError;
use crate::render::{Connection, FieldFrame};
use crate::settings::{Bounds, FieldConfig};
use glam::Vec2;
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use std::f32::consts::TAU;

/// Number of past positions kept per particle
pub const TRAIL_LENGTH: usize = 5;

/// Delay after a burst before the expired-particle sweep runs
pub const BURST_SWEEP_DELAY_MS: f64 = 2000.0;

/// Base particle opacity pulses around this value...
const PULSE_BASE: f32 = 0.3;
/// ...by this much either way
const PULSE_AMPLITUDE: f32 = 0.3;
/// Opacity of a link between two coincident particles
const LINK_OPACITY: f32 = 0.3;
/// Pulse speed given to burst and spark particles
const TRANSIENT_PULSE_SPEED: f32 = 0.05;
/// Life below this counts as spent; absorbs float drift from repeated decay
const LIFE_EPSILON: f32 = 1e-6;

/// Provides the drawable area for a field
pub trait Surface {
    /// Current bounds, or `None` when no drawing area can be acquired
    fn bounds(&self) -> Option<Bounds>;
}

impl Surface for Bounds {
    fn bounds(&self) -> Option<Bounds> {
        Some(*self)
    }
}

/// Finite lifetime of a burst or spark particle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Life {
    /// Remaining life in [0, 1]
    pub remaining: f32,
    /// Life lost per tick
    pub decay: f32,
}

/// A simulated point with kinematics and visual attributes
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub position: Vec2,
    pub velocity: Vec2,
    pub size: f32,
    /// Index into the configured palette
    pub color: usize,
    /// In [0, 0.6] for base particles, equal to life for the rest
    pub opacity: f32,
    pub pulse_phase: f32,
    pub pulse_speed: f32,
    /// `None` for base particles
    pub life: Option<Life>,
    /// Recent positions, oldest first
    pub trail: VecDeque<Vec2>,
}

impl Particle {
    /// Base particles live as long as the field
    pub fn is_base(&self) -> bool {
        self.life.is_none()
    }

    pub fn is_expired(&self) -> bool {
        self.life.is_some_and(|life| life.remaining <= 0.0)
    }
}

/// Lifecycle of a field.
/// Ready -> Running <-> Paused -> Destroyed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldState {
    Ready,
    Running,
    Paused,
    Destroyed,
}

impl FieldState {
    pub fn name(&self) -> &'static str {
        match self {
            FieldState::Ready => "READY",
            FieldState::Running => "RUNNING",
            FieldState::Paused => "PAUSED",
            FieldState::Destroyed => "DESTROYED",
        }
    }
}

/// Opacity of a base particle at a given pulse phase
fn pulse_opacity(phase: f32) -> f32 {
    (PULSE_BASE + PULSE_AMPLITUDE * phase.sin()).clamp(0.0, PULSE_BASE + PULSE_AMPLITUDE)
}

/// Mirror bounce on one axis: flip the velocity and pull the position back in
fn reflect(position: &mut f32, velocity: &mut f32, bound: f32) {
    if *position < 0.0 || *position > bound {
        *velocity = -*velocity;
        *position = position.clamp(0.0, bound);
    }
}

/// Particle field engine state
pub struct ParticleField {
    config: FieldConfig,
    bounds: Bounds,
    particles: Vec<Particle>,
    state: FieldState,
    /// Latest clock value seen through tick hints (ms)
    clock_ms: f64,
    /// Clock values at which expired-particle sweeps are due
    pending_sweeps: VecDeque<f64>,
    ticks: u64,
    rng: StdRng,
}

impl ParticleField {
    /// Validate the config, acquire the surface and populate the field
    pub fn initialize(config: FieldConfig, surface: &dyn Surface) -> Result<Self, FieldError> {
        Self::build(config, surface, StdRng::from_entropy())
    }

    /// Same as [`initialize`](Self::initialize) with a reproducible population
    pub fn initialize_with_seed(
        config: FieldConfig,
        surface: &dyn Surface,
        seed: u64,
    ) -> Result<Self, FieldError> {
        Self::build(config, surface, StdRng::seed_from_u64(seed))
    }

    fn build(config: FieldConfig, surface: &dyn Surface, rng: StdRng) -> Result<Self, FieldError> {
        config.validate()?;
        let bounds = surface
            .bounds()
            .filter(Bounds::is_drawable)
            .ok_or(FieldError::SurfaceUnavailable)?;

        let mut field = Self {
            config,
            bounds,
            particles: Vec::new(),
            state: FieldState::Ready,
            clock_ms: 0.0,
            pending_sweeps: VecDeque::new(),
            ticks: 0,
            rng,
        };
        field.particles = field.spawn_base_particles();
        info!(
            "particle field ready: {} particles in {}x{}",
            field.particles.len(),
            bounds.width,
            bounds.height
        );
        Ok(field)
    }

    fn spawn_base_particles(&mut self) -> Vec<Particle> {
        (0..self.config.particle_count)
            .map(|_| self.spawn_base_particle())
            .collect()
    }

    fn spawn_base_particle(&mut self) -> Particle {
        let speed = self.config.speed;
        let mut axis_velocity = || {
            if speed > 0.0 {
                self.rng.gen_range(-speed..=speed)
            } else {
                0.0
            }
        };
        let velocity = Vec2::new(axis_velocity(), axis_velocity());
        let position = Vec2::new(
            self.rng.gen_range(0.0..=self.bounds.width),
            self.rng.gen_range(0.0..=self.bounds.height),
        );
        let pulse_phase = self.rng.gen_range(0.0..TAU);

        Particle {
            position,
            velocity,
            size: self.rng.gen_range(self.config.min_size..=self.config.max_size),
            color: self.rng.gen_range(0..self.config.colors.len()),
            opacity: pulse_opacity(pulse_phase),
            pulse_phase,
            pulse_speed: self
                .rng
                .gen_range(self.config.min_pulse_speed..=self.config.max_pulse_speed),
            life: None,
            trail: VecDeque::with_capacity(TRAIL_LENGTH + 1),
        }
    }

    fn spawn_transient_particle(&mut self, origin: Vec2, velocity: Vec2) -> Particle {
        Particle {
            position: origin,
            velocity,
            size: self.rng.gen_range(1.0..4.0),
            color: self.rng.gen_range(0..self.config.colors.len()),
            opacity: 1.0,
            pulse_phase: 0.0,
            pulse_speed: TRANSIENT_PULSE_SPEED,
            life: Some(Life {
                remaining: 1.0,
                decay: self.config.burst_decay,
            }),
            trail: VecDeque::with_capacity(TRAIL_LENGTH + 1),
        }
    }

    fn clamp_into_bounds(&self, point: Vec2) -> Vec2 {
        Vec2::new(
            point.x.clamp(0.0, self.bounds.width),
            point.y.clamp(0.0, self.bounds.height),
        )
    }

    /// Advance the field by one frame.
    ///
    /// `elapsed_ms` is the driving clock's timestamp; it only feeds the burst
    /// sweep clock, motion is one unit step per tick. `pointer` is the latest
    /// pointer position, if any. Returns false when the field is not running.
    pub fn tick(&mut self, elapsed_ms: f64, pointer: Option<Vec2>) -> bool {
        if self.state != FieldState::Running {
            return false;
        }
        if elapsed_ms.is_finite() {
            self.clock_ms = self.clock_ms.max(elapsed_ms);
        }

        let bounds = self.bounds;
        let max_velocity = self.config.max_velocity();
        let velocity_limit = Vec2::splat(max_velocity);
        let pointer = pointer.filter(|_| self.config.interactive);
        let radius = self.config.interaction_radius;
        let strength = self.config.interaction_strength * self.config.pointer_force.sign();

        for particle in &mut self.particles {
            particle.position += particle.velocity;

            reflect(&mut particle.position.x, &mut particle.velocity.x, bounds.width);
            reflect(&mut particle.position.y, &mut particle.velocity.y, bounds.height);

            if particle.is_base() {
                particle.pulse_phase = (particle.pulse_phase + particle.pulse_speed) % TAU;
                particle.opacity = pulse_opacity(particle.pulse_phase);
            }

            if let Some(target) = pointer {
                let offset = target - particle.position;
                let distance = offset.length();
                // Zero distance has no direction, so no force
                if distance > 0.0 && distance < radius {
                    let force = (radius - distance) / radius;
                    particle.velocity += offset / distance * force * strength;
                }
            }

            particle.velocity = particle.velocity.clamp(-velocity_limit, velocity_limit);

            particle.trail.push_back(particle.position);
            if particle.trail.len() > TRAIL_LENGTH {
                particle.trail.pop_front();
            }

            if let Some(life) = particle.life.as_mut() {
                life.remaining -= life.decay;
                if life.remaining < LIFE_EPSILON {
                    life.remaining = 0.0;
                }
                particle.opacity = life.remaining.clamp(0.0, 1.0);
            }
        }

        self.particles.retain(|p| !p.is_expired());
        self.run_due_sweeps();
        self.ticks += 1;
        true
    }

    /// Links between every pair closer than the configured distance
    pub fn compute_connections(&self) -> Vec<Connection> {
        let link_distance = self.config.connection_distance;
        let mut connections = Vec::new();
        if link_distance <= 0.0 {
            return connections;
        }

        for (i, a) in self.particles.iter().enumerate() {
            for (j, b) in self.particles.iter().enumerate().skip(i + 1) {
                let distance = a.position.distance(b.position);
                if distance < link_distance {
                    connections.push(Connection {
                        a: i,
                        b: j,
                        from: a.position,
                        to: b.position,
                        opacity: (1.0 - distance / link_distance) * LINK_OPACITY,
                    });
                }
            }
        }
        connections
    }

    /// Snapshot for renderers
    pub fn frame(&self) -> FieldFrame<'_> {
        let connections = if self.config.show_connections {
            self.compute_connections()
        } else {
            Vec::new()
        };
        FieldFrame {
            particles: &self.particles,
            palette: &self.config.colors,
            connections,
            bounds: self.bounds,
        }
    }

    /// Release `count` finite-life particles radiating from `origin`.
    /// Returns the number of particles added.
    pub fn add_burst(&mut self, origin: Vec2, count: usize) -> usize {
        if self.state == FieldState::Destroyed {
            warn!("burst ignored: field destroyed");
            return 0;
        }
        if count == 0 {
            return 0;
        }

        let origin = self.clamp_into_bounds(origin);
        for i in 0..count {
            let angle = TAU * i as f32 / count as f32;
            let speed = self.rng.gen_range(1.0..3.0);
            let velocity = Vec2::from_angle(angle) * speed;
            let particle = self.spawn_transient_particle(origin, velocity);
            self.particles.push(particle);
        }

        self.pending_sweeps
            .push_back(self.clock_ms + BURST_SWEEP_DELAY_MS);
        debug!("burst of {} at ({:.1}, {:.1})", count, origin.x, origin.y);
        count
    }

    /// Drop a single finite-life particle drifting from `origin` (pointer trail)
    pub fn add_spark(&mut self, origin: Vec2) -> bool {
        if self.state == FieldState::Destroyed {
            return false;
        }
        let origin = self.clamp_into_bounds(origin);
        let velocity = Vec2::new(self.rng.gen_range(-1.0..1.0), self.rng.gen_range(-1.0..1.0));
        let particle = self.spawn_transient_particle(origin, velocity);
        self.particles.push(particle);
        true
    }

    /// Remove every spent particle now. Returns how many were removed.
    pub fn sweep_expired(&mut self) -> usize {
        let before = self.particles.len();
        self.particles.retain(|p| !p.is_expired());
        before - self.particles.len()
    }

    /// Run the burst sweeps whose deadline has passed on the engine clock.
    /// Per-tick decay normally removes spent particles first, so this is
    /// usually a no-op.
    fn run_due_sweeps(&mut self) {
        while self
            .pending_sweeps
            .front()
            .is_some_and(|&due| due <= self.clock_ms)
        {
            self.pending_sweeps.pop_front();
            let removed = self.sweep_expired();
            if removed > 0 {
                debug!("burst sweep removed {} spent particles", removed);
            }
        }
    }

    /// Replace the configuration.
    /// A new particle count repopulates the base particles; anything else is
    /// applied in place. On error the previous configuration stays.
    pub fn update_config(&mut self, config: FieldConfig) -> Result<(), FieldError> {
        if let Err(err) = config.validate() {
            warn!("configuration rejected: {}", err);
            return Err(err);
        }

        let repopulate = config.particle_count != self.config.particle_count;
        let palette_len = config.colors.len();
        self.config = config;

        for particle in &mut self.particles {
            if particle.color >= palette_len {
                particle.color %= palette_len;
            }
        }

        if repopulate && self.state != FieldState::Destroyed {
            self.particles.retain(|p| !p.is_base());
            let mut base = self.spawn_base_particles();
            base.append(&mut self.particles);
            self.particles = base;
            info!("field repopulated with {} particles", self.config.particle_count);
        }
        Ok(())
    }

    /// Apply new surface bounds, clamping existing particles into them
    pub fn resize(&mut self, bounds: Bounds) -> Result<(), FieldError> {
        if !bounds.is_drawable() {
            return Err(FieldError::SurfaceUnavailable);
        }
        self.bounds = bounds;
        for particle in &mut self.particles {
            particle.position = Vec2::new(
                particle.position.x.clamp(0.0, bounds.width),
                particle.position.y.clamp(0.0, bounds.height),
            );
            for point in particle.trail.iter_mut() {
                point.x = point.x.clamp(0.0, bounds.width);
                point.y = point.y.clamp(0.0, bounds.height);
            }
        }
        debug!("field resized to {}x{}", bounds.width, bounds.height);
        Ok(())
    }

    /// Begin consuming ticks
    pub fn start(&mut self) {
        match self.state {
            FieldState::Ready | FieldState::Paused => {
                self.state = FieldState::Running;
                info!("particle field running");
            }
            FieldState::Running => {}
            FieldState::Destroyed => warn!("start ignored: field destroyed"),
        }
    }

    /// Stop consuming ticks; particle state is frozen
    pub fn pause(&mut self) {
        if self.state == FieldState::Running {
            self.state = FieldState::Paused;
            debug!("particle field paused");
        }
    }

    /// Resume consuming ticks after a pause
    pub fn resume(&mut self) {
        if self.state == FieldState::Paused {
            self.state = FieldState::Running;
            debug!("particle field resumed");
        }
    }

    /// Toggle between running and paused
    pub fn toggle_pause(&mut self) {
        match self.state {
            FieldState::Running => self.pause(),
            FieldState::Paused => self.resume(),
            FieldState::Ready => self.start(),
            FieldState::Destroyed => {}
        }
    }

    /// Release particles and the surface; terminal
    pub fn destroy(&mut self) {
        if self.state == FieldState::Destroyed {
            return;
        }
        self.particles.clear();
        self.pending_sweeps.clear();
        self.bounds = Bounds::new(0.0, 0.0);
        self.state = FieldState::Destroyed;
        info!("particle field destroyed");
    }

    #[cfg(test)]
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn config(&self) -> &FieldConfig {
        &self.config
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn state(&self) -> FieldState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == FieldState::Running
    }

    /// Number of long-lived particles
    pub fn base_count(&self) -> usize {
        self.particles.iter().filter(|p| p.is_base()).count()
    }

    /// Number of burst and spark particles alive
    pub fn transient_count(&self) -> usize {
        self.particles.len() - self.base_count()
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn pending_sweeps(&self) -> usize {
        self.pending_sweeps.len()
    }

    #[cfg(test)]
    fn particles_mut(&mut self) -> &mut Vec<Particle> {
        &mut self.particles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::Rgb;
    use crate::settings::PointerForce;

    const BOUNDS: Bounds = Bounds {
        width: 320.0,
        height: 200.0,
    };

    fn running_field(config: FieldConfig) -> ParticleField {
        let mut field = ParticleField::initialize_with_seed(config, &BOUNDS, 42).unwrap();
        field.start();
        field
    }

    fn still_config(count: usize) -> FieldConfig {
        FieldConfig {
            particle_count: count,
            colors: vec![Rgb::new(0xff, 0xff, 0xff)],
            min_size: 1.0,
            max_size: 1.0,
            speed: 0.0,
            interactive: false,
            connection_distance: 0.0,
            show_connections: false,
            ..Default::default()
        }
    }

    struct NoSurface;

    impl Surface for NoSurface {
        fn bounds(&self) -> Option<Bounds> {
            None
        }
    }

    #[test]
    fn test_initialize_populates_within_bounds() {
        let field = ParticleField::initialize_with_seed(FieldConfig::default(), &BOUNDS, 1).unwrap();
        assert_eq!(field.state(), FieldState::Ready);
        assert_eq!(field.particles().len(), 50);
        for p in field.particles() {
            assert!(p.position.x >= 0.0 && p.position.x <= BOUNDS.width);
            assert!(p.position.y >= 0.0 && p.position.y <= BOUNDS.height);
            assert!(p.velocity.x.abs() <= 0.5 && p.velocity.y.abs() <= 0.5);
            assert!(p.size >= 1.0 && p.size <= 4.0);
            assert!(p.color < 4);
            assert!(p.trail.is_empty());
            assert!(p.is_base());
        }
    }

    #[test]
    fn test_initialize_rejects_bad_config() {
        let config = FieldConfig {
            colors: Vec::new(),
            ..Default::default()
        };
        let result = ParticleField::initialize_with_seed(config, &BOUNDS, 1);
        assert!(matches!(result, Err(FieldError::Configuration(_))));

        // burst particles must be able to expire
        let config = FieldConfig {
            burst_decay: 0.0,
            ..Default::default()
        };
        let result = ParticleField::initialize_with_seed(config, &BOUNDS, 1);
        assert!(matches!(result, Err(FieldError::Configuration(_))));
    }

    #[test]
    fn test_initialize_without_surface_fails() {
        let result = ParticleField::initialize_with_seed(FieldConfig::default(), &NoSurface, 1);
        assert!(matches!(result, Err(FieldError::SurfaceUnavailable)));

        let result =
            ParticleField::initialize_with_seed(FieldConfig::default(), &Bounds::new(0.0, 5.0), 1);
        assert!(matches!(result, Err(FieldError::SurfaceUnavailable)));
    }

    #[test]
    fn test_seeded_population_is_reproducible() {
        let a = ParticleField::initialize_with_seed(FieldConfig::default(), &BOUNDS, 9).unwrap();
        let b = ParticleField::initialize_with_seed(FieldConfig::default(), &BOUNDS, 9).unwrap();
        assert_eq!(a.particles(), b.particles());
    }

    #[test]
    fn test_zero_speed_field_stays_put() {
        let mut field = running_field(still_config(10));
        let before: Vec<Vec2> = field.particles().iter().map(|p| p.position).collect();

        assert!(field.tick(16.0, None));

        let after: Vec<Vec2> = field.particles().iter().map(|p| p.position).collect();
        assert_eq!(before, after);
        assert!(field.compute_connections().is_empty());
    }

    #[test]
    fn test_tick_is_noop_unless_running() {
        let mut field = ParticleField::initialize_with_seed(FieldConfig::default(), &BOUNDS, 3).unwrap();
        let before = field.particles().to_vec();
        assert!(!field.tick(16.0, None));
        assert_eq!(field.particles(), &before[..]);
        assert_eq!(field.ticks(), 0);
    }

    #[test]
    fn test_positions_stay_in_bounds_and_velocity_clamped() {
        let config = FieldConfig {
            particle_count: 40,
            speed: 3.0,
            interactive: true,
            pointer_force: PointerForce::Attract,
            interaction_strength: 0.5,
            interaction_radius: 150.0,
            ..Default::default()
        };
        let mut field = running_field(config);
        let limit = field.config().max_velocity() + 1e-4;

        for frame in 0..500 {
            let pointer = Vec2::new((frame % 320) as f32, (frame % 200) as f32);
            field.tick(frame as f64 * 16.0, Some(pointer));
            for p in field.particles() {
                assert!(p.position.x >= 0.0 && p.position.x <= BOUNDS.width);
                assert!(p.position.y >= 0.0 && p.position.y <= BOUNDS.height);
                assert!(p.velocity.x.abs() <= limit, "vx {}", p.velocity.x);
                assert!(p.velocity.y.abs() <= limit, "vy {}", p.velocity.y);
            }
        }
    }

    #[test]
    fn test_base_opacity_stays_in_pulse_range() {
        let mut field = running_field(FieldConfig::default());
        for frame in 0..400 {
            field.tick(frame as f64, None);
            for p in field.particles() {
                assert!(p.opacity >= 0.0 && p.opacity <= 0.6, "opacity {}", p.opacity);
            }
        }
    }

    #[test]
    fn test_edge_reflection_flips_velocity() {
        let mut field = running_field(FieldConfig {
            particle_count: 1,
            speed: 1.0,
            interactive: false,
            ..Default::default()
        });
        {
            let p = &mut field.particles_mut()[0];
            p.position = Vec2::new(BOUNDS.width - 0.5, 100.0);
            p.velocity = Vec2::new(1.0, 0.0);
        }
        field.tick(0.0, None);
        let p = &field.particles()[0];
        assert_eq!(p.position.x, BOUNDS.width);
        assert_eq!(p.velocity.x, -1.0);

        field.tick(16.0, None);
        assert_eq!(field.particles()[0].position.x, BOUNDS.width - 1.0);
    }

    #[test]
    fn test_pointer_repels_nearby_particle() {
        let mut field = running_field(FieldConfig {
            particle_count: 1,
            speed: 1.0,
            interactive: true,
            ..Default::default()
        });
        {
            let p = &mut field.particles_mut()[0];
            p.position = Vec2::new(100.0, 100.0);
            p.velocity = Vec2::ZERO;
        }
        field.tick(0.0, Some(Vec2::new(110.0, 100.0)));
        let p = &field.particles()[0];
        // force = (100 - 10) / 100 * 0.01 = 0.009, pointing away
        assert!((p.velocity.x + 0.009).abs() < 1e-6, "vx {}", p.velocity.x);
        assert_eq!(p.velocity.y, 0.0);
    }

    #[test]
    fn test_pointer_attract_pulls_particle() {
        let mut field = running_field(FieldConfig {
            particle_count: 1,
            speed: 1.0,
            interactive: true,
            pointer_force: PointerForce::Attract,
            ..Default::default()
        });
        {
            let p = &mut field.particles_mut()[0];
            p.position = Vec2::new(100.0, 100.0);
            p.velocity = Vec2::ZERO;
        }
        field.tick(0.0, Some(Vec2::new(100.0, 150.0)));
        assert!(field.particles()[0].velocity.y > 0.0);
    }

    #[test]
    fn test_pointer_outside_radius_or_disabled_has_no_effect() {
        let mut field = running_field(FieldConfig {
            particle_count: 1,
            speed: 1.0,
            interactive: false,
            ..Default::default()
        });
        {
            let p = &mut field.particles_mut()[0];
            p.position = Vec2::new(100.0, 100.0);
            p.velocity = Vec2::ZERO;
        }
        field.tick(0.0, Some(Vec2::new(101.0, 100.0)));
        assert_eq!(field.particles()[0].velocity, Vec2::ZERO);

        let mut config = field.config().clone();
        config.interactive = true;
        field.update_config(config).unwrap();
        field.tick(16.0, Some(Vec2::new(300.0, 100.0)));
        assert_eq!(field.particles()[0].velocity, Vec2::ZERO);
    }

    #[test]
    fn test_pointer_on_particle_applies_no_force() {
        let mut field = running_field(FieldConfig {
            interactive: true,
            ..still_config(1)
        });
        let at = field.particles()[0].position;
        field.tick(0.0, Some(at));
        let p = &field.particles()[0];
        assert!(!p.velocity.x.is_nan() && !p.velocity.y.is_nan());
        assert_eq!(p.velocity, Vec2::ZERO);
        assert_eq!(p.position, at);
    }

    #[test]
    fn test_trail_keeps_last_five_positions() {
        let mut field = running_field(FieldConfig {
            particle_count: 1,
            speed: 1.0,
            interactive: false,
            ..Default::default()
        });
        {
            let p = &mut field.particles_mut()[0];
            p.position = Vec2::new(10.0, 10.0);
            p.velocity = Vec2::new(1.0, 0.0);
        }
        for frame in 0..8 {
            field.tick(frame as f64, None);
        }
        let trail: Vec<f32> = field.particles()[0].trail.iter().map(|t| t.x).collect();
        assert_eq!(trail, vec![14.0, 15.0, 16.0, 17.0, 18.0]);
    }

    #[test]
    fn test_connection_threshold_is_strict() {
        let config = FieldConfig {
            connection_distance: 50.0,
            show_connections: true,
            ..still_config(2)
        };
        let mut field = running_field(config);
        let eps = 0.01;

        field.particles_mut()[0].position = Vec2::new(10.0, 10.0);
        field.particles_mut()[1].position = Vec2::new(10.0 + 50.0 - eps, 10.0);
        let links = field.compute_connections();
        assert_eq!(links.len(), 1);
        assert!(links[0].opacity > 0.0);
        assert_eq!((links[0].a, links[0].b), (0, 1));

        field.particles_mut()[1].position = Vec2::new(10.0 + 50.0 + eps, 10.0);
        assert!(field.compute_connections().is_empty());

        field.particles_mut()[1].position = Vec2::new(10.0 + 50.0, 10.0);
        assert!(field.compute_connections().is_empty());
    }

    #[test]
    fn test_connection_opacity_scales_with_distance() {
        let config = FieldConfig {
            connection_distance: 100.0,
            ..still_config(3)
        };
        let mut field = running_field(config);
        field.particles_mut()[0].position = Vec2::new(0.0, 0.0);
        field.particles_mut()[1].position = Vec2::new(0.0, 0.0);
        field.particles_mut()[2].position = Vec2::new(50.0, 0.0);

        let links = field.compute_connections();
        assert_eq!(links.len(), 3);
        assert!((links[0].opacity - 0.3).abs() < 1e-6);
        assert!((links[1].opacity - 0.15).abs() < 1e-6);
    }

    #[test]
    fn test_frame_omits_links_when_hidden() {
        let config = FieldConfig {
            connection_distance: 400.0,
            show_connections: false,
            ..still_config(5)
        };
        let field = running_field(config);
        assert!(!field.compute_connections().is_empty());
        assert!(field.frame().connections.is_empty());
    }

    #[test]
    fn test_burst_adds_exactly_count() {
        let mut field = running_field(still_config(10));
        assert_eq!(field.add_burst(Vec2::new(100.0, 100.0), 8), 8);
        assert_eq!(field.particles().len(), 18);
        assert_eq!(field.transient_count(), 8);
        assert_eq!(field.pending_sweeps(), 1);

        for p in field.particles().iter().filter(|p| !p.is_base()) {
            assert_eq!(p.position, Vec2::new(100.0, 100.0));
            assert_eq!(p.opacity, 1.0);
            let speed = p.velocity.length();
            assert!(speed > 1.0 - 1e-4 && speed < 3.0 + 1e-4, "speed {}", speed);
        }
    }

    #[test]
    fn test_burst_directions_spread_around_circle() {
        let mut field = running_field(still_config(0));
        field.add_burst(Vec2::new(100.0, 100.0), 4);
        let dirs: Vec<Vec2> = field.particles().iter().map(|p| p.velocity.normalize()).collect();
        assert!((dirs[0] - Vec2::new(1.0, 0.0)).length() < 1e-5);
        assert!((dirs[1] - Vec2::new(0.0, 1.0)).length() < 1e-5);
        assert!((dirs[2] - Vec2::new(-1.0, 0.0)).length() < 1e-5);
        assert!((dirs[3] - Vec2::new(0.0, -1.0)).length() < 1e-5);
    }

    #[test]
    fn test_burst_particles_expire_after_decay() {
        let mut field = running_field(FieldConfig {
            speed: 1.0,
            ..still_config(10)
        });
        field.add_burst(Vec2::new(160.0, 100.0), 8);

        for frame in 0..25 {
            field.tick(frame as f64 * 16.0, None);
        }
        assert_eq!(field.transient_count(), 8);
        for p in field.particles().iter().filter(|p| !p.is_base()) {
            assert!(p.opacity > 0.0 && p.opacity <= 1.0);
            assert_eq!(Some(p.opacity), p.life.map(|l| l.remaining));
        }

        for frame in 25..60 {
            field.tick(frame as f64 * 16.0, None);
        }
        assert_eq!(field.particles().len(), 10);
        assert_eq!(field.base_count(), 10);
    }

    #[test]
    fn test_burst_sweep_runs_on_clock() {
        let mut field = running_field(still_config(2));
        field.add_burst(Vec2::new(50.0, 50.0), 3);
        field.tick(1000.0, None);
        assert_eq!(field.pending_sweeps(), 1);
        field.tick(2000.0, None);
        assert_eq!(field.pending_sweeps(), 0);
        // sweep is a no-op while bursts are still alive
        assert_eq!(field.transient_count(), 3);
    }

    #[test]
    fn test_sweep_expired_removes_only_spent() {
        let mut field = running_field(still_config(3));
        field.add_burst(Vec2::new(50.0, 50.0), 2);
        for p in field.particles_mut().iter_mut().filter(|p| !p.is_base()).take(1) {
            if let Some(life) = p.life.as_mut() {
                life.remaining = 0.0;
            }
        }
        assert_eq!(field.sweep_expired(), 1);
        assert_eq!(field.particles().len(), 4);
    }

    #[test]
    fn test_spark_is_transient() {
        let mut field = running_field(still_config(0));
        assert!(field.add_spark(Vec2::new(-50.0, 500.0)));
        let p = &field.particles()[0];
        assert_eq!(p.position, Vec2::new(0.0, BOUNDS.height));
        assert!(p.life.is_some());
        assert!(p.velocity.x.abs() <= 1.0 && p.velocity.y.abs() <= 1.0);
    }

    #[test]
    fn test_pause_is_idempotent_and_freezes_state() {
        let mut field = running_field(FieldConfig::default());
        field.add_burst(Vec2::new(10.0, 10.0), 5);
        field.tick(0.0, None);

        field.pause();
        let snapshot = field.particles().to_vec();
        field.pause();
        assert_eq!(field.state(), FieldState::Paused);
        assert_eq!(field.particles(), &snapshot[..]);

        assert!(!field.tick(16.0, None));
        assert_eq!(field.particles(), &snapshot[..]);

        field.resume();
        assert_eq!(field.state(), FieldState::Running);
        assert_eq!(field.particles(), &snapshot[..]);
        field.resume();
        assert_eq!(field.state(), FieldState::Running);
        assert!(field.tick(32.0, None));
    }

    #[test]
    fn test_state_names() {
        let label = {
            let state = FieldState::Paused;
            state.name()
        };
        assert_eq!(label, "PAUSED");
        assert_eq!(FieldState::Running.name(), "RUNNING");
    }

    #[test]
    fn test_destroy_is_terminal() {
        let mut field = running_field(FieldConfig::default());
        field.destroy();
        assert_eq!(field.state(), FieldState::Destroyed);
        assert!(field.particles().is_empty());

        field.start();
        field.resume();
        assert_eq!(field.state(), FieldState::Destroyed);
        assert!(!field.tick(0.0, None));
        assert_eq!(field.add_burst(Vec2::ZERO, 8), 0);
        assert!(!field.add_spark(Vec2::ZERO));
    }

    #[test]
    fn test_update_config_repopulates_on_new_count() {
        let mut field = running_field(FieldConfig::default());
        field.add_burst(Vec2::new(10.0, 10.0), 3);
        let config = FieldConfig {
            particle_count: 20,
            ..Default::default()
        };
        field.update_config(config).unwrap();
        assert_eq!(field.base_count(), 20);
        assert_eq!(field.transient_count(), 3);
    }

    #[test]
    fn test_update_config_in_place_keeps_positions() {
        let mut field = running_field(FieldConfig::default());
        let before: Vec<Vec2> = field.particles().iter().map(|p| p.position).collect();
        let config = FieldConfig {
            colors: vec![Rgb::new(1, 2, 3)],
            connection_distance: 10.0,
            ..Default::default()
        };
        field.update_config(config).unwrap();
        let after: Vec<Vec2> = field.particles().iter().map(|p| p.position).collect();
        assert_eq!(before, after);
        assert!(field.particles().iter().all(|p| p.color == 0));
    }

    #[test]
    fn test_update_config_rejects_and_keeps_previous() {
        let mut field = running_field(FieldConfig::default());
        let bad = FieldConfig {
            min_size: 5.0,
            max_size: 2.0,
            ..Default::default()
        };
        assert!(field.update_config(bad).is_err());
        assert_eq!(field.config(), &FieldConfig::default());
        assert_eq!(field.particles().len(), 50);
    }

    #[test]
    fn test_resize_clamps_particles() {
        let mut field = running_field(FieldConfig::default());
        for _ in 0..6 {
            field.tick(0.0, None);
        }
        field.resize(Bounds::new(40.0, 30.0)).unwrap();
        assert_eq!(field.particles().len(), 50);
        for p in field.particles() {
            assert!(p.position.x <= 40.0 && p.position.y <= 30.0);
            assert!(p.trail.iter().all(|t| t.x <= 40.0 && t.y <= 30.0));
        }
        assert_eq!(
            field.resize(Bounds::new(0.0, 0.0)),
            Err(FieldError::SurfaceUnavailable)
        );
        assert_eq!(field.bounds(), Bounds::new(40.0, 30.0));
    }
}
