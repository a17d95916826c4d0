//! Weapon possession: pickup, carry, throw and impact.
//!
//! A weapon is always in exactly one [`PossessionState`]. Only one weapon may
//! be carried at a time; the [`EquipSlot`] is the single token that decides
//! which one.

use engine_core::{Lifetime, Transform, Vec3};
use physics::{ContactPoint, PhysicsBody};
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::damage::{look_rotation, DamageableWorld};
use crate::error::{non_negative, positive, ConfigError};
use crate::feedback::{AnimatorId, EffectKind, FeedbackSink};
use crate::locomotion::Locomotion;
use crate::weapons::FireControl;

/// Spin imparted on a throw, per unit of the random scalar.
pub const THROW_TORQUE_SCALE: f32 = 2.5;
const IMPACT_EFFECT_LIFETIME: f32 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WeaponId(pub u32);

/// The one-weapon-at-a-time equip token.
#[derive(Debug, Default)]
pub struct EquipSlot {
    holder: Option<WeaponId>,
}

impl EquipSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the slot for `weapon`. Fails if anyone already holds it.
    pub fn claim(&mut self, weapon: WeaponId) -> bool {
        if self.holder.is_some() {
            return false;
        }
        self.holder = Some(weapon);
        true
    }

    /// Give the slot back. Only the holder can release it.
    pub fn release(&mut self, weapon: WeaponId) -> bool {
        if self.holder != Some(weapon) {
            return false;
        }
        self.holder = None;
        true
    }

    pub fn holder(&self) -> Option<WeaponId> {
        self.holder
    }

    pub fn is_occupied(&self) -> bool {
        self.holder.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PossessionState {
    /// Lying in the world, highlighted and pickupable.
    WorldIdle,
    /// In the player's hands.
    Carried,
    /// In flight after a throw; the next solid contact ends it.
    Thrown,
    /// Gone. The owner removes the body.
    Destroyed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PickupConfig {
    pub pickup_range: f32,
    pub drop_forward_force: f32,
    pub drop_upward_force: f32,
    /// Damage a thrown weapon deals on impact.
    pub throw_damage: f32,
    /// Seconds a thrown weapon may fly before it is removed anyway.
    pub thrown_lifetime: f32,
    /// Spawn in the player's hands.
    pub start_equipped: bool,
}

impl Default for PickupConfig {
    fn default() -> Self {
        Self {
            pickup_range: 2.5,
            drop_forward_force: 10.0,
            drop_upward_force: 3.0,
            throw_damage: 25.0,
            thrown_lifetime: 10.0,
            start_equipped: false,
        }
    }
}

impl PickupConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        non_negative("pickup.pickup_range", self.pickup_range)?;
        non_negative("pickup.drop_forward_force", self.drop_forward_force)?;
        non_negative("pickup.drop_upward_force", self.drop_upward_force)?;
        non_negative("pickup.throw_damage", self.throw_damage)?;
        positive("pickup.thrown_lifetime", self.thrown_lifetime)?;
        Ok(())
    }
}

/// Where a throw leaves from and which way it goes.
#[derive(Debug, Clone, Copy)]
pub struct ThrowFrame {
    /// The weapon is released from here.
    pub release: Transform,
    /// The camera; impulses follow its forward and up axes.
    pub aim: Transform,
}

/// Possession state machine for one weapon.
#[derive(Debug, Clone)]
pub struct Possession {
    id: WeaponId,
    config: PickupConfig,
    state: PossessionState,
    animator: AnimatorId,
    lifetime: Option<Lifetime>,
}

impl Possession {
    pub fn new(id: WeaponId, config: PickupConfig, animator: AnimatorId) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            id,
            config,
            state: PossessionState::WorldIdle,
            animator,
            lifetime: None,
        })
    }

    pub fn id(&self) -> WeaponId {
        self.id
    }

    pub fn config(&self) -> &PickupConfig {
        &self.config
    }

    pub fn state(&self) -> PossessionState {
        self.state
    }

    pub fn animator(&self) -> AnimatorId {
        self.animator
    }

    pub fn is_equipped(&self) -> bool {
        self.state == PossessionState::Carried
    }

    /// Pickup outline shown.
    pub fn is_highlighted(&self) -> bool {
        matches!(self.state, PossessionState::WorldIdle | PossessionState::Thrown)
    }

    /// Fire control and animation gating run only in hand.
    pub fn fire_enabled(&self) -> bool {
        self.is_equipped()
    }

    /// Tagged as a thrown weapon: the next solid contact is an impact.
    pub fn is_thrown(&self) -> bool {
        self.state == PossessionState::Thrown
    }

    pub fn is_destroyed(&self) -> bool {
        self.state == PossessionState::Destroyed
    }

    /// Put the body in its spawn configuration. Starts in hand when
    /// configured to and the slot is free, otherwise in the world.
    pub fn start(
        &mut self,
        slot: &mut EquipSlot,
        body: &mut dyn PhysicsBody,
        carry_frame: Transform,
        locomotion: &mut Locomotion,
    ) -> bool {
        if self.config.start_equipped && slot.claim(self.id) {
            self.take_in_hand(body, carry_frame, locomotion);
            true
        } else {
            self.state = PossessionState::WorldIdle;
            body.set_kinematic(false);
            body.set_trigger(false);
            false
        }
    }

    pub fn in_range(&self, player_position: Vec3, weapon_position: Vec3) -> bool {
        player_position.distance(weapon_position) <= self.config.pickup_range
    }

    /// Pick the weapon up. Refused unless it is on the ground (or still in
    /// flight), within reach, and the slot is free.
    pub fn pickup(
        &mut self,
        slot: &mut EquipSlot,
        body: &mut dyn PhysicsBody,
        carry_frame: Transform,
        player_position: Vec3,
        locomotion: &mut Locomotion,
    ) -> bool {
        if !matches!(self.state, PossessionState::WorldIdle | PossessionState::Thrown) {
            return false;
        }
        if !self.in_range(player_position, body.position()) {
            return false;
        }
        if !slot.claim(self.id) {
            log::debug!("Weapon {:?} pickup refused: slot held by {:?}", self.id, slot.holder());
            return false;
        }
        self.take_in_hand(body, carry_frame, locomotion);
        log::info!("Picked up weapon {:?}", self.id);
        true
    }

    fn take_in_hand(
        &mut self,
        body: &mut dyn PhysicsBody,
        carry_frame: Transform,
        locomotion: &mut Locomotion,
    ) {
        self.state = PossessionState::Carried;
        self.lifetime = None;
        body.set_linear_velocity(Vec3::ZERO);
        body.set_kinematic(true);
        body.set_trigger(true);
        body.set_pose(carry_frame);
        locomotion.bind_animator(Some(self.animator));
    }

    /// Throw the carried weapon. Only valid while carried.
    pub fn drop(
        &mut self,
        slot: &mut EquipSlot,
        body: &mut dyn PhysicsBody,
        fire: &mut FireControl,
        locomotion: &mut Locomotion,
        frame: ThrowFrame,
        rng: &mut StdRng,
        feedback: &mut dyn FeedbackSink,
    ) -> bool {
        if self.state != PossessionState::Carried {
            return false;
        }
        slot.release(self.id);
        fire.holster(feedback, Some(self.animator));
        if locomotion.animator() == Some(self.animator) {
            locomotion.bind_animator(None);
        }

        self.state = PossessionState::Thrown;
        self.lifetime = Some(Lifetime::new(self.config.thrown_lifetime));

        body.set_kinematic(false);
        body.set_trigger(false);
        body.set_linear_velocity(Vec3::ZERO);
        body.set_pose(frame.release);
        body.apply_impulse(frame.aim.forward() * self.config.drop_forward_force);
        body.apply_impulse(frame.aim.up() * self.config.drop_upward_force);
        let spin: f32 = rng.gen_range(-1.0..=1.0);
        body.apply_torque_impulse(Vec3::splat(spin) * THROW_TORQUE_SCALE);

        log::info!("Threw weapon {:?}", self.id);
        true
    }

    /// Keep a carried weapon's kinematic body on the carry frame.
    pub fn update_carried(&self, body: &mut dyn PhysicsBody, carry_frame: Transform) {
        if self.state == PossessionState::Carried {
            body.set_pose(carry_frame);
        }
    }

    /// Resolve this step's contacts. A thrown weapon hurts what it touches,
    /// then breaks. Returns true if the weapon was destroyed.
    pub fn on_contacts(
        &mut self,
        contacts: &[ContactPoint],
        targets: &mut dyn DamageableWorld,
        feedback: &mut dyn FeedbackSink,
    ) -> bool {
        if self.state != PossessionState::Thrown || contacts.is_empty() {
            return false;
        }
        for contact in contacts {
            let pose = Transform::from_position_rotation(contact.point, look_rotation(contact.normal));
            feedback.spawn_effect(EffectKind::ThrownImpact, pose, IMPACT_EFFECT_LIFETIME);
            if let Some(target) = targets.damageable(contact.other) {
                target.apply_damage(
                    self.config.throw_damage,
                    contact.point,
                    look_rotation(contact.normal),
                );
            }
        }
        self.state = PossessionState::Destroyed;
        log::info!("Thrown weapon {:?} broke on impact", self.id);
        true
    }

    /// Count down the flight timeout. Returns true if the weapon expired this tick.
    pub fn update(&mut self, dt: f32) -> bool {
        if self.state != PossessionState::Thrown {
            return false;
        }
        let expired = self.lifetime.as_mut().is_some_and(|l| l.update(dt));
        if expired {
            self.state = PossessionState::Destroyed;
            self.lifetime = None;
            log::info!("Thrown weapon {:?} timed out", self.id);
        }
        expired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::damage::{Damageable, Target, TargetRegistry};
    use crate::feedback::FeedbackLog;
    use engine_core::Quat;
    use crate::locomotion::MovementConfig;
    use crate::test_support::MockBody;
    use crate::weapons::{WeaponConfig, ANIM_IS_RELOADING, ANIM_IS_SHOOTING};
    use physics::ColliderHandle;
    use rand::SeedableRng;

    fn weapon(id: u32) -> Possession {
        Possession::new(WeaponId(id), PickupConfig::default(), AnimatorId(id)).unwrap()
    }

    fn loco() -> Locomotion {
        Locomotion::new(MovementConfig::default()).unwrap()
    }

    fn carry() -> Transform {
        Transform::from_position(Vec3::new(0.3, 1.5, -0.4))
    }

    fn throw_frame() -> ThrowFrame {
        ThrowFrame {
            release: Transform::from_position(Vec3::new(0.0, 1.6, -0.8)),
            aim: Transform::IDENTITY,
        }
    }

    #[test]
    fn slot_is_first_come_first_served() {
        let mut slot = EquipSlot::new();
        assert!(slot.claim(WeaponId(1)));
        assert!(!slot.claim(WeaponId(2)));
        assert!(!slot.release(WeaponId(2)));
        assert_eq!(slot.holder(), Some(WeaponId(1)));
        assert!(slot.release(WeaponId(1)));
        assert!(!slot.is_occupied());
    }

    #[test]
    fn pickup_takes_weapon_in_hand() {
        let mut slot = EquipSlot::new();
        let mut loco = loco();
        let mut w = weapon(1);
        let mut body = MockBody::at(Vec3::new(1.0, 0.0, 0.0));
        body.velocity = Vec3::new(0.0, -2.0, 0.0);

        assert!(w.pickup(&mut slot, &mut body, carry(), Vec3::ZERO, &mut loco));
        assert!(w.is_equipped());
        assert!(w.fire_enabled());
        assert!(!w.is_highlighted());
        assert!(!w.is_thrown());
        assert!(body.kinematic && body.trigger);
        assert_eq!(body.velocity, Vec3::ZERO);
        assert_eq!(body.pose.position, carry().position);
        assert_eq!(slot.holder(), Some(WeaponId(1)));
        assert_eq!(loco.animator(), Some(AnimatorId(1)));
    }

    #[test]
    fn pickup_refused_out_of_range() {
        let mut slot = EquipSlot::new();
        let mut w = weapon(1);
        let mut body = MockBody::at(Vec3::new(5.0, 0.0, 0.0));
        assert!(!w.pickup(&mut slot, &mut body, carry(), Vec3::ZERO, &mut loco()));
        assert_eq!(w.state(), PossessionState::WorldIdle);
        assert!(!slot.is_occupied());
    }

    #[test]
    fn pickup_refused_while_slot_is_held() {
        let mut slot = EquipSlot::new();
        let mut loco = loco();
        let mut a = weapon(1);
        let mut b = weapon(2);
        let mut body_a = MockBody::default();
        let mut body_b = MockBody::default();

        // Both in range on the same tick: the first one evaluated wins.
        assert!(a.pickup(&mut slot, &mut body_a, carry(), Vec3::ZERO, &mut loco));
        assert!(!b.pickup(&mut slot, &mut body_b, carry(), Vec3::ZERO, &mut loco));
        assert!(!b.is_equipped());
        assert!(!body_b.kinematic);
        assert_eq!(loco.animator(), Some(AnimatorId(1)));
    }

    #[test]
    fn drop_throws_with_impulses_and_spin() {
        let mut slot = EquipSlot::new();
        let mut loco = loco();
        let mut w = weapon(1);
        let mut body = MockBody::default();
        let mut fire = FireControl::new(WeaponConfig::default()).unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        let mut log = FeedbackLog::new();
        w.pickup(&mut slot, &mut body, carry(), Vec3::ZERO, &mut loco);
        body.velocity = Vec3::new(3.0, 3.0, 3.0);

        assert!(w.drop(&mut slot, &mut body, &mut fire, &mut loco, throw_frame(), &mut rng, &mut log));
        assert_eq!(log.last_bool(AnimatorId(1), ANIM_IS_RELOADING), Some(false));
        assert_eq!(log.last_bool(AnimatorId(1), ANIM_IS_SHOOTING), Some(false));
        assert_eq!(w.state(), PossessionState::Thrown);
        assert!(w.is_thrown() && w.is_highlighted() && !w.fire_enabled());
        assert!(!body.kinematic && !body.trigger);
        assert!(!slot.is_occupied());
        assert_eq!(loco.animator(), None);
        assert_eq!(body.pose.position, throw_frame().release.position);

        // Residual velocity is cleared before the throw impulses.
        assert_eq!(body.impulses, vec![Vec3::NEG_Z * 10.0, Vec3::Y * 3.0]);
        assert_eq!(body.velocity, Vec3::new(0.0, 3.0, -10.0));
        let torque = body.torques[0];
        assert_eq!(torque.x, torque.y);
        assert_eq!(torque.y, torque.z);
        assert!(torque.x.abs() <= THROW_TORQUE_SCALE);
    }

    #[test]
    fn drop_only_while_carried() {
        let mut slot = EquipSlot::new();
        let mut w = weapon(1);
        let mut body = MockBody::default();
        let mut fire = FireControl::new(WeaponConfig::default()).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let mut log = FeedbackLog::new();
        assert!(!w.drop(&mut slot, &mut body, &mut fire, &mut loco(), throw_frame(), &mut rng, &mut log));
        assert!(log.events.is_empty());
        assert!(body.impulses.is_empty());
    }

    #[test]
    fn drop_then_pickup_restores_carry() {
        let mut slot = EquipSlot::new();
        let mut loco = loco();
        let mut w = weapon(1);
        let mut body = MockBody::default();
        let mut fire = FireControl::new(WeaponConfig::default()).unwrap();
        let mut rng = StdRng::seed_from_u64(2);

        w.pickup(&mut slot, &mut body, carry(), Vec3::ZERO, &mut loco);
        w.drop(&mut slot, &mut body, &mut fire, &mut loco, throw_frame(), &mut rng, &mut FeedbackLog::new());
        assert!(w.pickup(&mut slot, &mut body, carry(), Vec3::ZERO, &mut loco));
        assert!(w.is_equipped());
        assert!(body.kinematic && body.trigger);
        assert!(!w.is_thrown());
        assert_eq!(slot.holder(), Some(WeaponId(1)));
    }

    #[test]
    fn impact_damages_and_destroys() {
        let mut slot = EquipSlot::new();
        let mut loco = loco();
        let mut w = weapon(1);
        let mut body = MockBody::default();
        let mut fire = FireControl::new(WeaponConfig::default()).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let mut targets = TargetRegistry::new();
        let mut log = FeedbackLog::new();
        let dummy = ColliderHandle::from_raw_parts(8, 0);
        targets.spawn(dummy, None, Target::default());

        let contacts = [
            ContactPoint {
                other: dummy,
                point: Vec3::new(0.0, 1.0, -3.0),
                normal: Vec3::Z,
            },
            ContactPoint {
                other: dummy,
                point: Vec3::new(0.1, 1.0, -3.0),
                normal: Vec3::Z,
            },
        ];

        // Not thrown yet: contacts are ignored.
        assert!(!w.on_contacts(&contacts, &mut targets, &mut log));

        w.pickup(&mut slot, &mut body, carry(), Vec3::ZERO, &mut loco);
        assert!(!w.on_contacts(&contacts, &mut targets, &mut log));
        w.drop(&mut slot, &mut body, &mut fire, &mut loco, throw_frame(), &mut rng, &mut FeedbackLog::new());

        assert!(w.on_contacts(&contacts, &mut targets, &mut log));
        assert!(w.is_destroyed());
        assert_eq!(targets.health(dummy), Some(0.0));
        assert_eq!(log.count_effects(EffectKind::ThrownImpact), 2);
        assert!(!w.on_contacts(&contacts, &mut targets, &mut log));
    }

    #[derive(Default)]
    struct HitRecorder {
        collider: Option<ColliderHandle>,
        hits: Vec<(f32, Vec3, Quat)>,
    }

    impl Damageable for HitRecorder {
        fn apply_damage(&mut self, amount: f32, point: Vec3, rotation: Quat) {
            self.hits.push((amount, point, rotation));
        }
    }

    impl DamageableWorld for HitRecorder {
        fn damageable(&mut self, collider: ColliderHandle) -> Option<&mut dyn Damageable> {
            if self.collider == Some(collider) {
                Some(self)
            } else {
                None
            }
        }
    }

    #[test]
    fn impact_damage_faces_the_contact_normal() {
        let mut slot = EquipSlot::new();
        let mut loco = loco();
        let mut w = weapon(1);
        let mut body = MockBody::default();
        let mut fire = FireControl::new(WeaponConfig::default()).unwrap();
        let mut rng = StdRng::seed_from_u64(4);
        let wall = ColliderHandle::from_raw_parts(2, 0);
        let mut recorder = HitRecorder {
            collider: Some(wall),
            ..Default::default()
        };
        let normal = Vec3::new(1.0, 0.0, 1.0).normalize();
        let contacts = [ContactPoint {
            other: wall,
            point: Vec3::new(2.0, 1.0, -2.0),
            normal,
        }];

        w.pickup(&mut slot, &mut body, carry(), Vec3::ZERO, &mut loco);
        w.drop(&mut slot, &mut body, &mut fire, &mut loco, throw_frame(), &mut rng, &mut FeedbackLog::new());
        assert!(w.on_contacts(&contacts, &mut recorder, &mut FeedbackLog::new()));

        let (amount, point, rotation) = recorder.hits[0];
        assert_eq!(amount, PickupConfig::default().throw_damage);
        assert_eq!(point, contacts[0].point);
        assert!((rotation * Vec3::NEG_Z - normal).length() < 1e-4);
    }

    #[test]
    fn thrown_weapon_times_out() {
        let mut slot = EquipSlot::new();
        let mut loco = loco();
        let mut w = weapon(1);
        let mut body = MockBody::default();
        let mut fire = FireControl::new(WeaponConfig::default()).unwrap();
        let mut rng = StdRng::seed_from_u64(4);
        w.pickup(&mut slot, &mut body, carry(), Vec3::ZERO, &mut loco);
        w.drop(&mut slot, &mut body, &mut fire, &mut loco, throw_frame(), &mut rng, &mut FeedbackLog::new());

        assert!(!w.update(9.0));
        assert!(w.update(1.5));
        assert!(w.is_destroyed());
    }

    #[test]
    fn start_equipped_claims_slot() {
        let mut slot = EquipSlot::new();
        let mut loco = loco();
        let config = PickupConfig {
            start_equipped: true,
            ..Default::default()
        };
        let mut a = Possession::new(WeaponId(1), config.clone(), AnimatorId(1)).unwrap();
        let mut b = Possession::new(WeaponId(2), config, AnimatorId(2)).unwrap();
        let mut body_a = MockBody::default();
        let mut body_b = MockBody::default();
        assert!(a.start(&mut slot, &mut body_a, carry(), &mut loco));
        assert!(!b.start(&mut slot, &mut body_b, carry(), &mut loco));
        assert!(a.is_equipped());
        assert_eq!(b.state(), PossessionState::WorldIdle);
        assert!(body_a.kinematic && !body_b.kinematic);
    }
}
