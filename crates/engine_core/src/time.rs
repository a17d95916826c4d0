//! Frame timing: a frame clock with a fixed-step accumulator.

use std::time::Duration;

/// Manages frame timing and the fixed physics timestep.
#[derive(Debug)]
pub struct Time {
    /// Duration of the last frame.
    delta: Duration,
    /// Total simulated time.
    elapsed: Duration,
    /// Frame count since start.
    frame_count: u64,
    /// Fixed timestep for physics (default 50 Hz).
    fixed_timestep: Duration,
    /// Accumulated time for fixed updates.
    accumulator: Duration,
}

impl Default for Time {
    fn default() -> Self {
        Self::new()
    }
}

impl Time {
    /// Create a new time manager.
    pub fn new() -> Self {
        Self {
            delta: Duration::ZERO,
            elapsed: Duration::ZERO,
            frame_count: 0,
            fixed_timestep: Duration::from_secs_f64(1.0 / 50.0),
            accumulator: Duration::ZERO,
        }
    }

    /// Advance the clock by one frame of `delta`.
    pub fn advance(&mut self, delta: Duration) {
        self.delta = delta;
        self.elapsed += delta;
        self.frame_count += 1;
        self.accumulator += delta;
    }

    /// Get the delta time in seconds.
    pub fn delta_seconds(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    /// Get total elapsed time in seconds.
    pub fn elapsed_seconds(&self) -> f32 {
        self.elapsed.as_secs_f32()
    }

    /// Get the current frame count.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Check if a fixed update should run and consume the time.
    pub fn should_fixed_update(&mut self) -> bool {
        if self.accumulator >= self.fixed_timestep {
            self.accumulator -= self.fixed_timestep;
            true
        } else {
            false
        }
    }

    /// Set the fixed timestep rate in Hz.
    pub fn set_fixed_rate(&mut self, hz: f64) {
        self.fixed_timestep = Duration::from_secs_f64(1.0 / hz);
    }
}
