//! Weapon sway: the held weapon lags behind look motion and drifts with movement.

use engine_core::{lerp_toward_vec3, Quat, Transform, Vec3};
use input::InputSnapshot;
use serde::{Deserialize, Serialize};

use crate::error::{non_negative, ConfigError};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SwayConfig {
    /// Blend rate toward the sway pose.
    pub smooth: f32,
    /// Degrees of rotational sway per unit of mouse motion.
    pub multiplier: f32,
    pub max_horizontal_offset: f32,
    pub max_depth_offset: f32,
    pub aiming_max_horizontal_offset: f32,
    pub aiming_max_depth_offset: f32,
}

impl Default for SwayConfig {
    fn default() -> Self {
        Self {
            smooth: 10.0,
            multiplier: 1.0,
            max_horizontal_offset: 0.1,
            max_depth_offset: 0.1,
            aiming_max_horizontal_offset: 0.05,
            aiming_max_depth_offset: 0.05,
        }
    }
}

impl SwayConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        non_negative("sway.smooth", self.smooth)?;
        non_negative("sway.max_horizontal_offset", self.max_horizontal_offset)?;
        non_negative("sway.max_depth_offset", self.max_depth_offset)?;
        non_negative("sway.aiming_max_horizontal_offset", self.aiming_max_horizontal_offset)?;
        non_negative("sway.aiming_max_depth_offset", self.aiming_max_depth_offset)?;
        if !self.multiplier.is_finite() {
            return Err(ConfigError::NotFinite {
                field: "sway.multiplier",
            });
        }
        Ok(())
    }
}

/// Local pose offset of the carried weapon relative to its carry frame.
#[derive(Debug, Clone)]
pub struct WeaponSway {
    config: SwayConfig,
    rest: Transform,
    pose: Transform,
}

impl WeaponSway {
    pub fn new(config: SwayConfig, rest: Transform) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            rest,
            pose: rest,
        })
    }

    /// Current local pose.
    pub fn pose(&self) -> Transform {
        self.pose
    }

    /// Snap back to rest (weapon left the hand).
    pub fn reset(&mut self) {
        self.pose = self.rest;
    }

    /// One frame of sway from look and movement input.
    pub fn update(&mut self, dt: f32, input: &InputSnapshot) {
        let t = (self.config.smooth * dt).clamp(0.0, 1.0);

        // Screen-space mouse motion: +x right, +y down. The weapon trails behind it.
        let look = input.look_delta * self.config.multiplier;
        let trail = Quat::from_rotation_x((-look.y).to_radians())
            * Quat::from_rotation_y((-look.x).to_radians());
        self.pose.rotation = self.pose.rotation.slerp(self.rest.rotation * trail, t);

        let (max_x, max_z) = if input.aim_held {
            (
                self.config.aiming_max_horizontal_offset,
                self.config.aiming_max_depth_offset,
            )
        } else {
            (
                self.config.max_horizontal_offset,
                self.config.max_depth_offset,
            )
        };
        let offset = Vec3::new(
            (input.horizontal * max_x).clamp(-max_x, max_x),
            0.0,
            (-input.vertical * max_z).clamp(-max_z, max_z),
        );
        self.pose.position =
            lerp_toward_vec3(self.pose.position, self.rest.position + offset, dt, self.config.smooth);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_core::Vec2;

    const DT: f32 = 1.0 / 60.0;

    fn sway() -> WeaponSway {
        WeaponSway::new(SwayConfig::default(), Transform::from_position(Vec3::new(0.3, -0.2, -0.5)))
            .unwrap()
    }

    fn settle(s: &mut WeaponSway, input: InputSnapshot) {
        for _ in 0..600 {
            s.update(DT, &input);
        }
    }

    #[test]
    fn strafing_offsets_within_limits() {
        let mut s = sway();
        let input = InputSnapshot {
            horizontal: 1.0,
            vertical: 1.0,
            ..Default::default()
        };
        settle(&mut s, input);
        let offset = s.pose().position - Vec3::new(0.3, -0.2, -0.5);
        assert!((offset.x - 0.1).abs() < 1e-4);
        assert!((offset.z + 0.1).abs() < 1e-4);
    }

    #[test]
    fn aiming_tightens_limits() {
        let mut s = sway();
        let input = InputSnapshot {
            horizontal: -1.0,
            aim_held: true,
            ..Default::default()
        };
        settle(&mut s, input);
        let offset = s.pose().position - Vec3::new(0.3, -0.2, -0.5);
        assert!((offset.x + 0.05).abs() < 1e-4);
    }

    #[test]
    fn look_motion_rotates_then_recovers() {
        let mut s = sway();
        let input = InputSnapshot {
            look_delta: Vec2::new(5.0, 0.0),
            ..Default::default()
        };
        s.update(DT, &input);
        assert!(s.pose().rotation.angle_between(Quat::IDENTITY) > 0.0);

        settle(&mut s, InputSnapshot::default());
        assert!(s.pose().rotation.angle_between(Quat::IDENTITY) < 1e-3);
        assert!((s.pose().position - Vec3::new(0.3, -0.2, -0.5)).length() < 1e-4);
    }

    #[test]
    fn reset_snaps_to_rest() {
        let mut s = sway();
        s.update(
            DT,
            &InputSnapshot {
                horizontal: 1.0,
                look_delta: Vec2::new(10.0, 10.0),
                ..Default::default()
            },
        );
        s.reset();
        assert_eq!(s.pose().position, Vec3::new(0.3, -0.2, -0.5));
    }
}
