//! Frame-rate independent smoothing helpers.
//!
//! All cosmetic blends (field of view, crouch height, recoil, camera shake)
//! step `current` toward `target` by a factor of `dt * rate`, clamped to
//! `[0, 1]` so a long frame snaps to the target instead of overshooting.

use glam::{Vec2, Vec3};

#[inline]
fn factor(dt: f32, rate: f32) -> f32 {
    (dt * rate).clamp(0.0, 1.0)
}

/// Blend a scalar toward `target`.
pub fn lerp_toward(current: f32, target: f32, dt: f32, rate: f32) -> f32 {
    current + (target - current) * factor(dt, rate)
}

/// Blend a 2D vector toward `target`.
pub fn lerp_toward_vec2(current: Vec2, target: Vec2, dt: f32, rate: f32) -> Vec2 {
    current.lerp(target, factor(dt, rate))
}

/// Blend a 3D vector toward `target`.
pub fn lerp_toward_vec3(current: Vec3, target: Vec3, dt: f32, rate: f32) -> Vec3 {
    current.lerp(target, factor(dt, rate))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_dt_keeps_current() {
        assert_eq!(lerp_toward(3.0, 10.0, 0.0, 5.0), 3.0);
    }

    #[test]
    fn huge_dt_snaps_to_target() {
        assert_eq!(lerp_toward(3.0, 10.0, 10.0, 5.0), 10.0);
        assert_eq!(
            lerp_toward_vec2(Vec2::ONE, Vec2::ZERO, 1.0, 100.0),
            Vec2::ZERO
        );
    }

    #[test]
    fn partial_step() {
        let v = lerp_toward_vec3(Vec3::ZERO, Vec3::splat(2.0), 0.1, 2.5);
        assert!((v - Vec3::splat(0.5)).length() < 1e-6);
    }

    #[test]
    fn repeated_steps_converge() {
        let mut fov = 60.0;
        for _ in 0..600 {
            fov = lerp_toward(fov, 70.0, 1.0 / 60.0, 8.0);
        }
        assert!((fov - 70.0).abs() < 1e-3);
    }
}
