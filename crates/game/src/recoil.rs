//! Procedural recoil and camera shake.
//!
//! Each shot kicks a 2-axis recoil target (x = vertical, y = horizontal, in
//! degrees). Every frame the visible offset chases the target at
//! `snappiness` while the target itself bleeds back to zero at
//! `return_speed`. A short shake envelope jitters the camera's local
//! position alongside.

use engine_core::{lerp_toward_vec2, lerp_toward_vec3, Vec2, Vec3};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{non_negative, ConfigError};

/// Recoil tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecoilConfig {
    /// Upper bound of the vertical kick per shot, degrees.
    pub vertical: f32,
    /// Horizontal kick range, +/- degrees.
    pub horizontal: f32,
    /// Lower bound of the vertical kick as a fraction of `vertical`.
    pub vertical_multiplier: f32,
    /// How fast the visible offset chases the target.
    pub snappiness: f32,
    /// How fast the target returns to rest (also the shake blend rate).
    pub return_speed: f32,
    /// Peak camera jitter, metres.
    pub shake_magnitude: f32,
    /// Shake length after each shot, seconds.
    pub max_shake_duration: f32,
}

impl Default for RecoilConfig {
    fn default() -> Self {
        Self {
            vertical: 2.0,
            horizontal: 1.0,
            vertical_multiplier: 0.9,
            snappiness: 6.0,
            return_speed: 2.0,
            shake_magnitude: 0.02,
            max_shake_duration: 0.15,
        }
    }
}

impl RecoilConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        non_negative("recoil.vertical", self.vertical)?;
        non_negative("recoil.horizontal", self.horizontal)?;
        non_negative("recoil.vertical_multiplier", self.vertical_multiplier)?;
        non_negative("recoil.snappiness", self.snappiness)?;
        non_negative("recoil.return_speed", self.return_speed)?;
        non_negative("recoil.shake_magnitude", self.shake_magnitude)?;
        non_negative("recoil.max_shake_duration", self.max_shake_duration)?;
        Ok(())
    }
}

/// What the camera rig should apply this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecoilPose {
    /// Pitch offset, degrees. Positive tilts the view up.
    pub pitch: f32,
    /// Yaw to add to the accumulated yaw this frame, degrees. Positive turns right.
    pub yaw_delta: f32,
    /// Camera local position including shake.
    pub camera_position: Vec3,
}

/// Uniform sample in `[lo, hi]` that tolerates `lo > hi`.
fn sample(rng: &mut impl Rng, lo: f32, hi: f32) -> f32 {
    lo + (hi - lo) * rng.gen::<f32>()
}

#[derive(Debug, Clone)]
pub struct RecoilIntegrator {
    config: RecoilConfig,
    target: Vec2,
    current: Vec2,
    shake_timer: f32,
    rest_position: Vec3,
    camera_position: Vec3,
}

impl RecoilIntegrator {
    /// `rest_position` is the camera's local position with no shake applied.
    pub fn new(config: RecoilConfig, rest_position: Vec3) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            target: Vec2::ZERO,
            current: Vec2::ZERO,
            shake_timer: 0.0,
            rest_position,
            camera_position: rest_position,
        })
    }

    pub fn config(&self) -> &RecoilConfig {
        &self.config
    }

    pub fn target(&self) -> Vec2 {
        self.target
    }

    pub fn current(&self) -> Vec2 {
        self.current
    }

    pub fn shake_timer(&self) -> f32 {
        self.shake_timer
    }

    pub fn camera_position(&self) -> Vec3 {
        self.camera_position
    }

    /// Move the shake rest point (the camera height follows crouching).
    pub fn set_rest_position(&mut self, rest: Vec3) {
        self.rest_position = rest;
    }

    /// Add one shot's kick and restart the shake envelope.
    pub fn kick(&mut self, rng: &mut impl Rng) {
        let c = &self.config;
        let vertical = sample(rng, c.vertical * c.vertical_multiplier, c.vertical);
        let horizontal = sample(rng, -c.horizontal, c.horizontal);
        self.target += Vec2::new(vertical, horizontal);
        self.shake_timer = c.max_shake_duration;
    }

    /// Advance one frame.
    pub fn update(&mut self, dt: f32, rng: &mut impl Rng) -> RecoilPose {
        let c = &self.config;
        self.current = lerp_toward_vec2(self.current, self.target, dt, c.snappiness);
        let pose_pitch = self.current.x;
        let pose_yaw = self.current.y;
        self.target = lerp_toward_vec2(self.target, Vec2::ZERO, dt, c.return_speed);

        if self.shake_timer > 0.0 {
            self.shake_timer = (self.shake_timer - dt).max(0.0);
        }
        self.apply_shake(dt, rng);

        RecoilPose {
            pitch: pose_pitch,
            yaw_delta: pose_yaw,
            camera_position: self.camera_position,
        }
    }

    fn apply_shake(&mut self, dt: f32, rng: &mut impl Rng) {
        let c = &self.config;
        let goal = if self.shake_timer > 0.0 && c.max_shake_duration > 0.0 {
            let amount = c.shake_magnitude * (self.shake_timer / c.max_shake_duration);
            let jitter = Vec3::new(
                sample(rng, -amount, amount),
                sample(rng, -amount, amount),
                0.0,
            );
            self.rest_position + jitter
        } else {
            self.rest_position
        };
        self.camera_position = lerp_toward_vec3(self.camera_position, goal, dt, c.return_speed);
    }

    /// Both the target and the visible offset are within `epsilon` of rest.
    pub fn is_settled(&self, epsilon: f32) -> bool {
        self.target.length() <= epsilon && self.current.length() <= epsilon
    }

    /// Drop all accumulated recoil (weapon put away).
    pub fn reset(&mut self) {
        self.target = Vec2::ZERO;
        self.current = Vec2::ZERO;
        self.shake_timer = 0.0;
        self.camera_position = self.rest_position;
    }
}
