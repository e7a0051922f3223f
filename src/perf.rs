use crate::settings::FieldConfig;
use log::info;
use std::time::{Duration, Instant};

/// Length of one measurement window
pub const MONITOR_WINDOW: Duration = Duration::from_secs(5);
/// Below this rate the field sheds work
pub const MIN_FPS: f32 = 30.0;
/// Bursts never shrink below this many particles
pub const MIN_BURST_COUNT: usize = 2;

/// Counts frames over fixed windows and reports the measured rate.
/// Timestamps are passed in so the loop's clock stays the only clock.
#[derive(Debug)]
pub struct FrameMonitor {
    window: Duration,
    window_start: Option<Instant>,
    frames: u32,
    fps: Option<f32>,
}

impl Default for FrameMonitor {
    fn default() -> Self {
        Self::new(MONITOR_WINDOW)
    }
}

impl FrameMonitor {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            window_start: None,
            frames: 0,
            fps: None,
        }
    }

    /// Count a frame. Returns the rate when a window has just closed.
    pub fn record_frame(&mut self, now: Instant) -> Option<f32> {
        let Some(start) = self.window_start else {
            self.window_start = Some(now);
            return None;
        };
        self.frames += 1;

        let elapsed = now.saturating_duration_since(start);
        if elapsed < self.window {
            return None;
        }
        let fps = self.frames as f32 / elapsed.as_secs_f32();
        self.fps = Some(fps);
        self.frames = 0;
        self.window_start = Some(now);
        Some(fps)
    }

    /// Drop the current window, e.g. while paused
    pub fn reset(&mut self) {
        self.window_start = None;
        self.frames = 0;
    }

    /// Rate measured over the last complete window
    pub fn fps(&self) -> Option<f32> {
        self.fps
    }
}

/// Shrink bursts by one when the measured rate is too low.
/// Returns true when the config changed.
pub fn shed_load(config: &mut FieldConfig, fps: f32) -> bool {
    if fps >= MIN_FPS || config.burst_count <= MIN_BURST_COUNT {
        return false;
    }
    config.burst_count -= 1;
    info!(
        "frame rate {:.1} below {}; burst size reduced to {}",
        fps, MIN_FPS, config.burst_count
    );
    true
}
