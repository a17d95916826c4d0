//! First-person mouse look.

use engine_core::{Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::{positive, ConfigError};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LookConfig {
    /// Degrees per unit of mouse motion per second.
    pub sensitivity: f32,
    /// Pitch limit either side of level, degrees.
    pub max_pitch: f32,
}

impl Default for LookConfig {
    fn default() -> Self {
        Self {
            sensitivity: 100.0,
            max_pitch: 80.0,
        }
    }
}

impl LookConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("look.sensitivity", self.sensitivity)?;
        positive("look.max_pitch", self.max_pitch)?;
        Ok(())
    }
}

/// Camera pitch and body yaw, in degrees. Positive pitch looks up; yaw follows the right hand about +Y.
#[derive(Debug, Clone)]
pub struct PlayerLook {
    config: LookConfig,
    pitch: f32,
    yaw: f32,
}

impl PlayerLook {
    pub fn new(config: LookConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            pitch: 0.0,
            yaw: 0.0,
        })
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    /// Apply one frame of mouse motion (screen space, +y down).
    pub fn update(&mut self, dt: f32, delta: Vec2) {
        let scale = self.config.sensitivity * dt;
        self.turn(delta.x * scale);
        let max = self.config.max_pitch;
        self.pitch = (self.pitch - delta.y * scale).clamp(-max, max);
    }

    /// Turn the body right by `degrees`.
    pub fn turn(&mut self, degrees: f32) {
        self.yaw -= degrees;
    }

    /// Body orientation (yaw only).
    pub fn body_rotation(&self) -> Quat {
        Quat::from_rotation_y(self.yaw.to_radians())
    }

    /// Camera orientation with an extra pitch offset (recoil) on top.
    pub fn view_rotation(&self, extra_pitch: f32) -> Quat {
        self.body_rotation() * Quat::from_rotation_x((self.pitch + extra_pitch).to_radians())
    }

    /// Movement forward axis on the ground plane.
    pub fn flat_forward(&self) -> Vec3 {
        self.body_rotation() * Vec3::NEG_Z
    }

    /// Movement right axis on the ground plane.
    pub fn flat_right(&self) -> Vec3 {
        self.body_rotation() * Vec3::X
    }
}
