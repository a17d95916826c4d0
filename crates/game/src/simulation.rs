//! Per-tick orchestration of the player-action core.
//!
//! Frame order: mouse look, ground probe and locomotion, pickup/drop, fire
//! control for the carried weapon, recoil, sway, then timeouts and target
//! sweeps. Fixed steps follow: movement forces, physics step, thrown-weapon
//! contacts.

use std::time::Duration;

use engine_core::{Time, Transform, Vec3};
use input::InputSnapshot;
use physics::{BodyHandles, PhysicsBody, PhysicsWorld};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::GameConfig;
use crate::damage::{Target, TargetRegistry};
use crate::error::SetupError;
use crate::feedback::{AnimatorId, FeedbackSink};
use crate::locomotion::Locomotion;
use crate::look::PlayerLook;
use crate::possession::{EquipSlot, Possession, PossessionState, ThrowFrame, WeaponId};
use crate::recoil::RecoilIntegrator;
use crate::sway::WeaponSway;
use crate::weapons::{AnimationEvent, FireContext, FireControl, WeaponConfig};

/// Longest frame a single tick simulates; longer stalls are dropped.
const MAX_FRAME_DT: f32 = 0.25;

/// One weapon and everything it drives.
pub struct WeaponEntity {
    pub possession: Possession,
    pub fire: FireControl,
    pub recoil: RecoilIntegrator,
    pub sway: WeaponSway,
    pub body: BodyHandles,
}

impl WeaponEntity {
    pub fn id(&self) -> WeaponId {
        self.possession.id()
    }
}

/// Assembles a [`Simulation`]. The physics world, player body, camera and
/// weapon carry frame are required.
#[derive(Default)]
pub struct SimulationBuilder {
    config: GameConfig,
    physics: Option<PhysicsWorld>,
    player_body: Option<BodyHandles>,
    camera: Option<Vec3>,
    carry_frame: Option<Transform>,
    throw_point: Option<Transform>,
    weapons: Vec<(BodyHandles, Option<WeaponConfig>)>,
    targets: Vec<(BodyHandles, f32)>,
}

impl SimulationBuilder {
    pub fn new(config: GameConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn physics(mut self, physics: PhysicsWorld) -> Self {
        self.physics = Some(physics);
        self
    }

    pub fn player_body(mut self, body: BodyHandles) -> Self {
        self.player_body = Some(body);
        self
    }

    /// Camera position relative to the body centre. Its height follows crouching.
    pub fn camera(mut self, local_position: Vec3) -> Self {
        self.camera = Some(local_position);
        self
    }

    /// Where a carried weapon sits, relative to the camera.
    pub fn carry_frame(mut self, local: Transform) -> Self {
        self.carry_frame = Some(local);
        self
    }

    /// Where a throw is released, relative to the camera. Defaults to the carry frame.
    pub fn throw_point(mut self, local: Transform) -> Self {
        self.throw_point = Some(local);
        self
    }

    /// Add a weapon. `None` uses the config's default weapon stats.
    pub fn weapon(mut self, body: BodyHandles, stats: Option<WeaponConfig>) -> Self {
        self.weapons.push((body, stats));
        self
    }

    pub fn target(mut self, body: BodyHandles, health: f32) -> Self {
        self.targets.push((body, health));
        self
    }

    pub fn build(self) -> Result<Simulation, SetupError> {
        let result = self.try_build();
        if let Err(e) = &result {
            log::error!("Simulation setup failed: {}", e);
        }
        result
    }

    fn try_build(self) -> Result<Simulation, SetupError> {
        let config = self.config;
        config.validate()?;

        let mut physics = self
            .physics
            .ok_or(SetupError::MissingCollaborator("physics world"))?;
        let player = self
            .player_body
            .ok_or(SetupError::MissingCollaborator("player body"))?;
        if !physics.contains_body(player.rigid_body) {
            return Err(SetupError::MissingCollaborator("player body"));
        }
        let camera = self
            .camera
            .ok_or(SetupError::MissingCollaborator("camera"))?;
        let carry_frame = self
            .carry_frame
            .ok_or(SetupError::MissingCollaborator("weapon carry frame"))?;
        let throw_point = self.throw_point.unwrap_or(carry_frame);

        let locomotion = Locomotion::new(config.movement.clone())?;
        let look = PlayerLook::new(config.look.clone())?;
        let camera_rest = Vec3::new(camera.x, locomotion.rig().camera_height, camera.z);

        let mut weapons = Vec::with_capacity(self.weapons.len());
        for (index, (body, stats)) in self.weapons.into_iter().enumerate() {
            if !physics.contains_body(body.rigid_body) {
                return Err(SetupError::MissingCollaborator("weapon body"));
            }
            let id = index as u32;
            let stats = stats.unwrap_or_else(|| config.weapon.clone());
            weapons.push(WeaponEntity {
                possession: Possession::new(WeaponId(id), config.pickup.clone(), AnimatorId(id))?,
                fire: FireControl::new(stats)?,
                recoil: RecoilIntegrator::new(config.recoil.clone(), camera_rest)?,
                sway: WeaponSway::new(config.sway.clone(), Transform::IDENTITY)?,
                body,
            });
        }

        let mut targets = TargetRegistry::new();
        for (body, health) in self.targets {
            targets.spawn(body.collider, Some(body.rigid_body), Target::new(health));
        }

        let mut time = Time::new();
        time.set_fixed_rate(f64::from(config.fixed_rate_hz));
        physics.set_timestep(1.0 / config.fixed_rate_hz);
        physics.update_query_pipeline();

        let rng = StdRng::seed_from_u64(config.seed);
        let mut sim = Simulation {
            config,
            physics,
            time,
            rng,
            player,
            camera,
            camera_shake: camera_rest,
            carry_frame,
            throw_point,
            locomotion,
            look,
            recoil_pitch: 0.0,
            slot: EquipSlot::new(),
            weapons,
            targets,
        };
        sim.start_weapons();
        log::info!(
            "Simulation ready: {} weapon(s), {} target(s)",
            sim.weapons.len(),
            sim.targets.len()
        );
        Ok(sim)
    }
}

/// The running player-action core.
pub struct Simulation {
    config: GameConfig,
    physics: PhysicsWorld,
    time: Time,
    rng: StdRng,
    player: BodyHandles,
    camera: Vec3,
    /// Camera local position including shake.
    camera_shake: Vec3,
    carry_frame: Transform,
    throw_point: Transform,
    locomotion: Locomotion,
    look: PlayerLook,
    recoil_pitch: f32,
    slot: EquipSlot,
    weapons: Vec<WeaponEntity>,
    targets: TargetRegistry,
}

impl Simulation {
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn physics(&self) -> &PhysicsWorld {
        &self.physics
    }

    pub fn time(&self) -> &Time {
        &self.time
    }

    pub fn locomotion(&self) -> &Locomotion {
        &self.locomotion
    }

    pub fn look(&self) -> &PlayerLook {
        &self.look
    }

    pub fn slot(&self) -> &EquipSlot {
        &self.slot
    }

    pub fn targets(&self) -> &TargetRegistry {
        &self.targets
    }

    pub fn weapons(&self) -> &[WeaponEntity] {
        &self.weapons
    }

    pub fn weapon(&self, id: WeaponId) -> Option<&WeaponEntity> {
        self.weapons.iter().find(|w| w.id() == id)
    }

    /// The weapon in hand, if any.
    pub fn carried(&self) -> Option<&WeaponEntity> {
        let id = self.slot.holder()?;
        self.weapon(id)
    }

    pub fn player_position(&self) -> Vec3 {
        self.player_pose().position
    }

    fn player_pose(&self) -> Transform {
        self.physics
            .get_body_transform(self.player.rigid_body)
            .unwrap_or(Transform::IDENTITY)
    }

    /// World pose of the camera.
    pub fn camera_transform(&self) -> Transform {
        let body = self.player_pose().position;
        let yaw = self.look.body_rotation();
        Transform::from_position_rotation(
            body + yaw * self.camera_shake,
            self.look.view_rotation(self.recoil_pitch),
        )
    }

    fn carry_transform(&self, sway: &WeaponSway) -> Transform {
        self.camera_transform()
            .mul_transform(&self.carry_frame)
            .mul_transform(&sway.pose())
    }

    fn start_weapons(&mut self) {
        let camera = self.camera_transform();
        let carry = camera.mul_transform(&self.carry_frame);
        for weapon in &mut self.weapons {
            if let Some(mut body) = self.physics.body(weapon.body.rigid_body) {
                weapon
                    .possession
                    .start(&mut self.slot, &mut body, carry, &mut self.locomotion);
            }
        }
    }

    /// Route an animation clip event from a weapon's animator.
    pub fn animation_event(
        &mut self,
        weapon: WeaponId,
        event: AnimationEvent,
        feedback: &mut dyn FeedbackSink,
    ) {
        if let Some(w) = self.weapons.iter_mut().find(|w| w.id() == weapon) {
            let animator = w.possession.animator();
            w.fire.animation_event(event, feedback, animator);
        }
    }

    /// Advance one rendered frame of `dt` seconds, then any fixed steps it covers.
    pub fn tick(&mut self, dt: f32, input: &InputSnapshot, feedback: &mut dyn FeedbackSink) {
        let dt = if dt.is_nan() { 0.0 } else { dt.clamp(0.0, MAX_FRAME_DT) };
        self.time.advance(Duration::from_secs_f32(dt));

        self.look.update(dt, input.look_delta);
        self.update_locomotion(dt, input, feedback);
        self.update_possession_input(input, feedback);
        self.update_carried_weapon(dt, input, feedback);
        self.update_world(dt, feedback);

        while self.time.should_fixed_update() {
            self.fixed_step(feedback);
        }
    }

    fn update_locomotion(&mut self, dt: f32, input: &InputSnapshot, feedback: &mut dyn FeedbackSink) {
        let origin = self.player_position();
        self.locomotion
            .probe_ground(&self.physics, origin, Some(self.player.rigid_body));
        if let Some(mut body) = self.physics.body(self.player.rigid_body) {
            self.locomotion.frame_update(dt, input, &mut body, feedback);
            body.set_capsule_height(self.locomotion.collider_height());
        }
    }

    fn update_possession_input(&mut self, input: &InputSnapshot, feedback: &mut dyn FeedbackSink) {
        if input.pickup_pressed {
            let player = self.player_position();
            let carry = self.camera_transform().mul_transform(&self.carry_frame);
            for weapon in &mut self.weapons {
                if let Some(mut body) = self.physics.body(weapon.body.rigid_body) {
                    weapon.possession.pickup(
                        &mut self.slot,
                        &mut body,
                        carry,
                        player,
                        &mut self.locomotion,
                    );
                }
            }
        }

        if input.drop_pressed {
            let camera = self.camera_transform();
            let frame = ThrowFrame {
                release: camera.mul_transform(&self.throw_point),
                aim: camera,
            };
            let Some(id) = self.slot.holder() else {
                return;
            };
            let Some(weapon) = self.weapons.iter_mut().find(|w| w.id() == id) else {
                return;
            };
            if let Some(mut body) = self.physics.body(weapon.body.rigid_body) {
                let thrown = weapon.possession.drop(
                    &mut self.slot,
                    &mut body,
                    &mut weapon.fire,
                    &mut self.locomotion,
                    frame,
                    &mut self.rng,
                    feedback,
                );
                if thrown {
                    weapon.recoil.reset();
                    weapon.sway.reset();
                    self.recoil_pitch = 0.0;
                }
            }
        }
    }

    fn update_carried_weapon(&mut self, dt: f32, input: &InputSnapshot, feedback: &mut dyn FeedbackSink) {
        let rest = Vec3::new(
            self.camera.x,
            self.locomotion.rig().camera_height,
            self.camera.z,
        );
        let Some(id) = self.slot.holder() else {
            self.camera_shake = rest;
            return;
        };
        let camera = self.camera_transform();
        let muzzle = camera.mul_transform(&self.carry_frame);
        let Some(weapon) = self.weapons.iter_mut().find(|w| w.id() == id) else {
            return;
        };
        if !weapon.possession.fire_enabled() {
            return;
        }

        let mut ctx = FireContext {
            rays: &self.physics,
            targets: &mut self.targets,
            feedback,
            recoil: &mut weapon.recoil,
            rng: &mut self.rng,
            aim: camera,
            muzzle,
            shooter: Some(self.player.rigid_body),
            animator: Some(weapon.possession.animator()),
        };
        weapon.fire.update(dt, input, &mut ctx);

        weapon.recoil.set_rest_position(rest);
        let pose = weapon.recoil.update(dt, &mut self.rng);
        self.look.turn(pose.yaw_delta);
        self.recoil_pitch = pose.pitch;
        self.camera_shake = pose.camera_position;

        weapon.sway.update(dt, input);
        let sway = weapon.sway.clone();
        let handle = weapon.body.rigid_body;
        let carry = self.carry_transform(&sway);
        if let Some(weapon) = self.weapons.iter().find(|w| w.id() == id) {
            if let Some(mut body) = self.physics.body(handle) {
                weapon.possession.update_carried(&mut body, carry);
            }
        }
    }

    fn update_world(&mut self, dt: f32, feedback: &mut dyn FeedbackSink) {
        for weapon in &mut self.weapons {
            if weapon.possession.update(dt) {
                self.physics.remove_body(weapon.body.rigid_body);
            }
        }
        for body in self.targets.update(feedback) {
            self.physics.remove_body(body);
        }
    }

    fn fixed_step(&mut self, feedback: &mut dyn FeedbackSink) {
        let forward = self.look.flat_forward();
        let right = self.look.flat_right();
        if let Some(mut body) = self.physics.body(self.player.rigid_body) {
            self.locomotion.fixed_update(&mut body, forward, right);
        }

        self.physics.step();

        for weapon in &mut self.weapons {
            if weapon.possession.state() != PossessionState::Thrown {
                continue;
            }
            let contacts = self.physics.contacts_with(weapon.body.collider);
            if weapon
                .possession
                .on_contacts(&contacts, &mut self.targets, feedback)
            {
                self.physics.remove_body(weapon.body.rigid_body);
            }
        }
    }
}
