//! Player locomotion: ground sensing, movement state, jump, crouch and the force model.
//!
//! Split across the two tick rates. [`Locomotion::probe_ground`] and
//! [`Locomotion::frame_update`] run once per rendered frame and own the state
//! machine plus the cosmetic blends (field of view, crouch height).
//! [`Locomotion::fixed_update`] runs on the physics step and turns the last
//! sampled input into forces on the player body.

use engine_core::{lerp_toward, DelayedActions, Vec3};
use input::InputSnapshot;
use physics::{PhysicsBody, RayCaster, RayFilter, RigidBodyHandle};
use serde::{Deserialize, Serialize};

use crate::error::{non_negative, positive, ConfigError};
use crate::feedback::{AnimatorId, FeedbackSink};

/// Linear drag while airborne.
pub const AIR_DRAG: f32 = 1.0;
/// Move force per unit of target speed.
const MOVE_FORCE_SCALE: f32 = 10.0;
/// Ground probe reaches this far past the bottom of the capsule.
const GROUND_PROBE_MARGIN: f32 = 0.3;

pub const ANIM_SPEED: &str = "Speed";
pub const ANIM_IS_WALKING: &str = "IsWalking";
pub const ANIM_IS_CROUCHING: &str = "IsCrouching";

/// Movement tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    pub walk_speed: f32,
    pub crouch_speed: f32,
    /// Linear drag applied when standing still on the ground.
    pub ground_drag: f32,
    pub jump_force: f32,
    /// Seconds before another jump is allowed.
    pub jump_cooldown: f32,
    /// Scales the move force while airborne.
    pub air_multiplier: f32,
    pub crouch_height: f32,
    pub standing_height: f32,
    pub crouch_transition_speed: f32,
    pub default_fov: f32,
    /// Added to the default field of view while crouched.
    pub crouch_fov_change: f32,
    pub fov_transition_speed: f32,
    /// Capsule height used for the ground probe.
    pub player_height: f32,
    /// Crouch flips on each press instead of following the key.
    pub crouch_toggle: bool,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            walk_speed: 7.0,
            crouch_speed: 3.5,
            ground_drag: 5.0,
            jump_force: 6.0,
            jump_cooldown: 0.25,
            air_multiplier: 0.4,
            crouch_height: 0.5,
            standing_height: 1.0,
            crouch_transition_speed: 10.0,
            default_fov: 75.0,
            crouch_fov_change: -5.0,
            fov_transition_speed: 8.0,
            player_height: 2.0,
            crouch_toggle: false,
        }
    }
}

impl MovementConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        non_negative("movement.walk_speed", self.walk_speed)?;
        non_negative("movement.crouch_speed", self.crouch_speed)?;
        non_negative("movement.ground_drag", self.ground_drag)?;
        non_negative("movement.jump_force", self.jump_force)?;
        non_negative("movement.jump_cooldown", self.jump_cooldown)?;
        non_negative("movement.air_multiplier", self.air_multiplier)?;
        non_negative("movement.crouch_transition_speed", self.crouch_transition_speed)?;
        non_negative("movement.fov_transition_speed", self.fov_transition_speed)?;
        positive("movement.crouch_height", self.crouch_height)?;
        positive("movement.standing_height", self.standing_height)?;
        positive("movement.player_height", self.player_height)?;
        positive("movement.default_fov", self.default_fov)?;
        if !self.crouch_fov_change.is_finite() {
            return Err(ConfigError::NotFinite {
                field: "movement.crouch_fov_change",
            });
        }
        Ok(())
    }

    /// Length of the downward ground probe.
    pub fn ground_probe_length(&self) -> f32 {
        self.player_height * 0.5 + GROUND_PROBE_MARGIN
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MovementState {
    #[default]
    Idle,
    Walking,
    Crouching,
    Air,
}

/// Movement state from the current frame's conditions. Airborne always wins.
pub fn movement_state(grounded: bool, crouching: bool, horizontal: f32, vertical: f32) -> MovementState {
    if !grounded {
        MovementState::Air
    } else if crouching {
        MovementState::Crouching
    } else if horizontal == 0.0 && vertical == 0.0 {
        MovementState::Idle
    } else {
        MovementState::Walking
    }
}

/// Observable player state, rewritten every frame.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerRig {
    pub grounded: bool,
    pub state: MovementState,
    /// Speed cap and force scale; kept from the last grounded state while airborne.
    pub move_speed: f32,
    pub crouching: bool,
    pub ready_to_jump: bool,
    pub fov: f32,
    pub target_fov: f32,
    pub height: f32,
    pub camera_height: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LocomotionTimer {
    JumpCooldown,
}

/// The locomotion state machine for one player.
#[derive(Debug, Clone)]
pub struct Locomotion {
    config: MovementConfig,
    rig: PlayerRig,
    horizontal: f32,
    vertical: f32,
    timers: DelayedActions<LocomotionTimer>,
    animator: Option<AnimatorId>,
}

impl Locomotion {
    pub fn new(config: MovementConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let rig = PlayerRig {
            grounded: false,
            state: MovementState::Idle,
            move_speed: 0.0,
            crouching: false,
            ready_to_jump: true,
            fov: config.default_fov,
            target_fov: config.default_fov,
            height: config.standing_height,
            camera_height: config.standing_height / 2.0,
        };
        Ok(Self {
            config,
            rig,
            horizontal: 0.0,
            vertical: 0.0,
            timers: DelayedActions::new(),
            animator: None,
        })
    }

    pub fn config(&self) -> &MovementConfig {
        &self.config
    }

    pub fn rig(&self) -> &PlayerRig {
        &self.rig
    }

    pub fn state(&self) -> MovementState {
        self.rig.state
    }

    /// Capsule height for the current rig height, full size when standing.
    pub fn collider_height(&self) -> f32 {
        self.config.player_height * self.rig.height / self.config.standing_height
    }

    /// Route animation parameters to a weapon's animator, or stop forwarding.
    pub fn bind_animator(&mut self, animator: Option<AnimatorId>) {
        self.animator = animator;
    }

    pub fn animator(&self) -> Option<AnimatorId> {
        self.animator
    }

    /// Cast the downward ground probe from `origin` (the body centre).
    pub fn probe_ground(
        &mut self,
        rays: &dyn RayCaster,
        origin: Vec3,
        own_body: Option<RigidBodyHandle>,
    ) -> bool {
        let filter = RayFilter {
            exclude_body: own_body,
            environment_only: true,
        };
        self.rig.grounded = rays
            .cast_ray(origin, Vec3::NEG_Y, self.config.ground_probe_length(), filter)
            .is_some();
        self.rig.grounded
    }

    /// Per-frame step. Call after [`Locomotion::probe_ground`].
    pub fn frame_update(
        &mut self,
        dt: f32,
        input: &InputSnapshot,
        body: &mut dyn PhysicsBody,
        feedback: &mut dyn FeedbackSink,
    ) {
        for due in self.timers.tick(dt) {
            match due {
                LocomotionTimer::JumpCooldown => self.rig.ready_to_jump = true,
            }
        }

        self.horizontal = input.horizontal.clamp(-1.0, 1.0);
        self.vertical = input.vertical.clamp(-1.0, 1.0);

        if input.jump_held && self.rig.ready_to_jump && self.rig.grounded {
            self.rig.ready_to_jump = false;
            self.jump(body);
            self.timers
                .arm(LocomotionTimer::JumpCooldown, self.config.jump_cooldown);
        }

        self.handle_crouch_input(input, feedback);
        self.apply_state();

        self.rig.fov = lerp_toward(
            self.rig.fov,
            self.rig.target_fov,
            dt,
            self.config.fov_transition_speed,
        );
        let target_height = if self.rig.crouching {
            self.config.crouch_height
        } else {
            self.config.standing_height
        };
        self.rig.height = lerp_toward(
            self.rig.height,
            target_height,
            dt,
            self.config.crouch_transition_speed,
        );
        self.rig.camera_height = self.rig.height / 2.0;

        self.forward_animation(feedback);
    }

    fn jump(&mut self, body: &mut dyn PhysicsBody) {
        let v = body.linear_velocity();
        body.set_linear_velocity(Vec3::new(v.x, 0.0, v.z));
        body.apply_impulse(Vec3::Y * self.config.jump_force);
    }

    fn handle_crouch_input(&mut self, input: &InputSnapshot, feedback: &mut dyn FeedbackSink) {
        if self.config.crouch_toggle {
            if input.crouch_pressed {
                self.rig.crouching = !self.rig.crouching;
            }
            return;
        }

        let edge = if input.crouch_pressed {
            Some(true)
        } else if input.crouch_released {
            Some(false)
        } else {
            None
        };
        if let Some(crouching) = edge {
            self.rig.crouching = crouching;
            if let Some(animator) = self.animator {
                feedback.set_animation_bool(animator, ANIM_IS_CROUCHING, crouching);
            }
        }
    }

    fn apply_state(&mut self) {
        let rig = &mut self.rig;
        rig.state = movement_state(rig.grounded, rig.crouching, self.horizontal, self.vertical);
        let default_fov = self.config.default_fov;
        match rig.state {
            MovementState::Air => rig.target_fov = default_fov,
            MovementState::Crouching => {
                rig.move_speed = self.config.crouch_speed;
                rig.target_fov = default_fov + self.config.crouch_fov_change;
            }
            MovementState::Idle => {
                rig.move_speed = 0.0;
                rig.target_fov = default_fov;
            }
            MovementState::Walking => {
                rig.move_speed = self.config.walk_speed;
                rig.target_fov = default_fov;
            }
        }
    }

    fn has_move_input(&self) -> bool {
        self.horizontal != 0.0 || self.vertical != 0.0
    }

    fn forward_animation(&self, feedback: &mut dyn FeedbackSink) {
        let Some(animator) = self.animator else {
            return;
        };
        let state = self.rig.state;
        feedback.set_animation_bool(animator, ANIM_IS_WALKING, state == MovementState::Walking);
        let speed = match state {
            MovementState::Walking => 1.0,
            MovementState::Crouching if self.has_move_input() => 0.95,
            MovementState::Idle | MovementState::Crouching | MovementState::Air => 0.0,
        };
        feedback.set_animation_float(animator, ANIM_SPEED, speed);
    }

    /// Physics step: move force along the flat `forward`/`right` axes, then the speed cap.
    pub fn fixed_update(&mut self, body: &mut dyn PhysicsBody, forward: Vec3, right: Vec3) {
        let direction = (forward * self.vertical + right * self.horizontal).normalize_or_zero();
        let force = direction * self.rig.move_speed * MOVE_FORCE_SCALE;

        if self.rig.grounded {
            if self.has_move_input() {
                body.set_drag(0.0);
                body.apply_force(force);
            } else {
                let v = body.linear_velocity();
                body.set_linear_velocity(Vec3::new(0.0, v.y, 0.0));
                body.set_drag(self.config.ground_drag);
            }
        } else {
            body.apply_force(force * self.config.air_multiplier);
            body.set_drag(AIR_DRAG);
        }

        self.speed_control(body);
    }

    /// Cap horizontal speed at `move_speed`. Vertical velocity is left alone.
    pub fn speed_control(&self, body: &mut dyn PhysicsBody) {
        let v = body.linear_velocity();
        let flat = Vec3::new(v.x, 0.0, v.z);
        if flat.length() > self.rig.move_speed {
            let limited = flat.normalize_or_zero() * self.rig.move_speed;
            body.set_linear_velocity(Vec3::new(limited.x, v.y, limited.z));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::FeedbackLog;
    use crate::test_support::{MockBody, MockRays};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    const DT: f32 = 1.0 / 60.0;

    fn walking() -> InputSnapshot {
        InputSnapshot {
            vertical: 1.0,
            ..Default::default()
        }
    }

    fn grounded_loco() -> (Locomotion, MockRays) {
        let mut loco = Locomotion::new(MovementConfig::default()).unwrap();
        let rays = MockRays::with_ground(1.0);
        loco.probe_ground(&rays, Vec3::new(0.0, 1.0, 0.0), None);
        (loco, rays)
    }

    #[test]
    fn air_overrides_everything() {
        for crouching in [false, true] {
            for (h, v) in [(0.0, 0.0), (1.0, 0.0), (0.0, -1.0), (1.0, 1.0)] {
                assert_eq!(movement_state(false, crouching, h, v), MovementState::Air);
            }
        }
        assert_eq!(movement_state(true, true, 1.0, 0.0), MovementState::Crouching);
        assert_eq!(movement_state(true, false, 0.0, 0.0), MovementState::Idle);
        assert_eq!(movement_state(true, false, 0.0, 1.0), MovementState::Walking);
    }

    #[test]
    fn ground_probe_reach_and_filter() {
        let mut loco = Locomotion::new(MovementConfig::default()).unwrap();
        let own = RigidBodyHandle::from_raw_parts(3, 0);

        let rays = MockRays::with_ground(1.2);
        assert!(loco.probe_ground(&rays, Vec3::ZERO, Some(own)));
        let (reach, filter) = rays.filters()[0];
        assert!((reach - 1.3).abs() < 1e-6);
        assert_eq!(filter.exclude_body, Some(own));
        assert!(filter.environment_only);

        let far = MockRays::with_ground(1.4);
        assert!(!loco.probe_ground(&far, Vec3::ZERO, Some(own)));
    }

    #[test]
    fn jump_needs_ground_and_cooldown() {
        let (mut loco, rays) = grounded_loco();
        let mut body = MockBody::default();
        body.velocity = Vec3::new(1.0, -3.0, 0.0);
        let mut log = FeedbackLog::new();
        let jump = InputSnapshot {
            jump_held: true,
            ..Default::default()
        };

        loco.frame_update(DT, &jump, &mut body, &mut log);
        assert_eq!(body.impulses, vec![Vec3::Y * 6.0]);
        assert_eq!(body.velocity, Vec3::new(1.0, 6.0, 0.0));
        assert!(!loco.rig().ready_to_jump);

        // Still held and grounded, but cooling down.
        loco.frame_update(DT, &jump, &mut body, &mut log);
        assert_eq!(body.impulses.len(), 1);

        for _ in 0..20 {
            loco.probe_ground(&rays, Vec3::ZERO, None);
            loco.frame_update(DT, &InputSnapshot::default(), &mut body, &mut log);
        }
        assert!(loco.rig().ready_to_jump);

        let mut airborne = Locomotion::new(MovementConfig::default()).unwrap();
        airborne.frame_update(DT, &jump, &mut body, &mut log);
        assert_eq!(body.impulses.len(), 1);
    }

    #[test]
    fn hold_crouch_follows_key_and_tells_animator() {
        let (mut loco, _) = grounded_loco();
        loco.bind_animator(Some(AnimatorId(2)));
        let mut body = MockBody::default();
        let mut log = FeedbackLog::new();

        let press = InputSnapshot {
            crouch_pressed: true,
            crouch_held: true,
            ..Default::default()
        };
        loco.frame_update(DT, &press, &mut body, &mut log);
        assert_eq!(loco.state(), MovementState::Crouching);
        assert_eq!(loco.rig().move_speed, 3.5);
        assert_eq!(log.last_bool(AnimatorId(2), ANIM_IS_CROUCHING), Some(true));

        let release = InputSnapshot {
            crouch_released: true,
            ..Default::default()
        };
        loco.frame_update(DT, &release, &mut body, &mut log);
        assert_eq!(loco.state(), MovementState::Idle);
        assert_eq!(log.last_bool(AnimatorId(2), ANIM_IS_CROUCHING), Some(false));
    }

    #[test]
    fn toggle_crouch_flips_on_press() {
        let mut loco = Locomotion::new(MovementConfig {
            crouch_toggle: true,
            ..Default::default()
        })
        .unwrap();
        loco.probe_ground(&MockRays::with_ground(1.0), Vec3::ZERO, None);
        let mut body = MockBody::default();
        let mut log = FeedbackLog::new();
        let press = InputSnapshot {
            crouch_pressed: true,
            ..Default::default()
        };
        loco.frame_update(DT, &press, &mut body, &mut log);
        assert!(loco.rig().crouching);
        loco.frame_update(DT, &InputSnapshot::default(), &mut body, &mut log);
        assert!(loco.rig().crouching);
        loco.frame_update(DT, &press, &mut body, &mut log);
        assert!(!loco.rig().crouching);
    }

    #[test]
    fn crouching_mid_air_stays_air() {
        let mut loco = Locomotion::new(MovementConfig::default()).unwrap();
        let mut body = MockBody::default();
        let mut log = FeedbackLog::new();
        let press = InputSnapshot {
            crouch_pressed: true,
            crouch_held: true,
            vertical: 1.0,
            ..Default::default()
        };
        loco.frame_update(DT, &press, &mut body, &mut log);
        assert!(loco.rig().crouching);
        assert_eq!(loco.state(), MovementState::Air);
        assert_eq!(loco.rig().target_fov, 75.0);
    }

    #[test]
    fn fov_and_height_blend_toward_crouch_targets() {
        let (mut loco, _) = grounded_loco();
        let mut body = MockBody::default();
        let mut log = FeedbackLog::new();
        let hold = InputSnapshot {
            crouch_pressed: true,
            crouch_held: true,
            ..Default::default()
        };
        loco.frame_update(DT, &hold, &mut body, &mut log);
        let first = loco.rig().clone();
        assert!(first.fov < 75.0 && first.fov > 70.0);
        assert!(first.height < 1.0 && first.height > 0.5);
        assert_eq!(first.camera_height, first.height / 2.0);

        for _ in 0..300 {
            loco.frame_update(DT, &InputSnapshot::default(), &mut body, &mut log);
        }
        assert!((loco.rig().fov - 70.0).abs() < 1e-3);
        assert!((loco.rig().height - 0.5).abs() < 1e-3);
    }

    #[test]
    fn long_frame_snaps_instead_of_overshooting() {
        let (mut loco, _) = grounded_loco();
        let mut body = MockBody::default();
        let mut log = FeedbackLog::new();
        let hold = InputSnapshot {
            crouch_pressed: true,
            ..Default::default()
        };
        assert_eq!(loco.collider_height(), 2.0);
        loco.frame_update(1.0, &hold, &mut body, &mut log);
        assert_eq!(loco.rig().height, 0.5);
        assert_eq!(loco.rig().fov, 70.0);
        assert_eq!(loco.collider_height(), 1.0);
    }

    #[test]
    fn idle_on_ground_stops_dead() {
        let (mut loco, _) = grounded_loco();
        let mut body = MockBody::default();
        body.velocity = Vec3::new(4.0, -1.0, 2.0);
        let mut log = FeedbackLog::new();
        loco.frame_update(DT, &InputSnapshot::default(), &mut body, &mut log);
        loco.fixed_update(&mut body, Vec3::NEG_Z, Vec3::X);
        assert_eq!(body.velocity, Vec3::new(0.0, -1.0, 0.0));
        assert_eq!(body.drag, 5.0);
        assert!(body.forces.is_empty());
    }

    #[test]
    fn walking_pushes_along_facing_and_is_capped() {
        let (mut loco, _) = grounded_loco();
        let mut body = MockBody::default();
        let mut log = FeedbackLog::new();
        loco.frame_update(DT, &walking(), &mut body, &mut log);
        assert_eq!(loco.state(), MovementState::Walking);

        for _ in 0..100 {
            loco.fixed_update(&mut body, Vec3::NEG_Z, Vec3::X);
        }
        assert_eq!(body.drag, 0.0);
        assert_eq!(body.forces[0], Vec3::new(0.0, 0.0, -70.0));
        let flat = Vec3::new(body.velocity.x, 0.0, body.velocity.z);
        assert!((flat.length() - 7.0).abs() < 1e-4);
    }

    #[test]
    fn airborne_uses_air_multiplier_and_drag() {
        let (mut loco, _) = grounded_loco();
        let mut body = MockBody::default();
        let mut log = FeedbackLog::new();
        loco.frame_update(DT, &walking(), &mut body, &mut log);
        loco.probe_ground(&MockRays::default(), Vec3::ZERO, None);
        loco.frame_update(DT, &walking(), &mut body, &mut log);
        assert_eq!(loco.state(), MovementState::Air);
        // Air keeps the last grounded speed.
        assert_eq!(loco.rig().move_speed, 7.0);

        loco.fixed_update(&mut body, Vec3::NEG_Z, Vec3::X);
        assert_eq!(body.drag, AIR_DRAG);
        assert!((body.forces[0] - Vec3::new(0.0, 0.0, -28.0)).length() < 1e-4);
    }

    #[test]
    fn speed_control_never_exceeds_cap_or_touches_vertical() {
        let (mut loco, _) = grounded_loco();
        let mut log = FeedbackLog::new();
        let mut rng = StdRng::seed_from_u64(11);
        let mut body = MockBody::default();
        loco.frame_update(DT, &walking(), &mut body, &mut log);

        for _ in 0..500 {
            let kick = Vec3::new(
                rng.gen_range(-50.0..50.0),
                rng.gen_range(-50.0..50.0),
                rng.gen_range(-50.0..50.0),
            );
            body.apply_impulse(kick);
            let vy = body.velocity.y;
            loco.speed_control(&mut body);
            let flat = Vec3::new(body.velocity.x, 0.0, body.velocity.z);
            assert!(flat.length() <= loco.rig().move_speed + 1e-4);
            assert_eq!(body.velocity.y, vy);
        }
    }

    #[test]
    fn animation_speed_per_state() {
        let (mut loco, _) = grounded_loco();
        let mut body = MockBody::default();
        let mut log = FeedbackLog::new();
        let anim = AnimatorId(5);

        loco.frame_update(DT, &walking(), &mut body, &mut log);
        assert!(log.events.is_empty(), "nothing forwarded without an animator");

        loco.bind_animator(Some(anim));
        loco.frame_update(DT, &walking(), &mut body, &mut log);
        assert_eq!(log.last_float(anim, ANIM_SPEED), Some(1.0));
        assert_eq!(log.last_bool(anim, ANIM_IS_WALKING), Some(true));

        let crouch_walk = InputSnapshot {
            crouch_pressed: true,
            vertical: 1.0,
            ..Default::default()
        };
        loco.frame_update(DT, &crouch_walk, &mut body, &mut log);
        assert_eq!(log.last_float(anim, ANIM_SPEED), Some(0.95));
        assert_eq!(log.last_bool(anim, ANIM_IS_WALKING), Some(false));

        loco.frame_update(DT, &InputSnapshot::default(), &mut body, &mut log);
        assert_eq!(log.last_float(anim, ANIM_SPEED), Some(0.0));
    }
}
