//! Damageable capability and the shootable targets that carry it.

use engine_core::{Entity, Health, Quat, Transform, Vec3, World};
use physics::{ColliderHandle, RigidBodyHandle};
use std::collections::HashMap;

use crate::feedback::{EffectKind, FeedbackSink};

/// Something that can take damage at a point.
pub trait Damageable {
    /// `rotation` orients the hit at `point`: hitscan passes the rotation taking
    /// world up onto the surface normal, thrown impacts face along the contact normal.
    fn apply_damage(&mut self, amount: f32, point: Vec3, rotation: Quat);
}

/// Capability lookup: which struck colliders can be damaged.
pub trait DamageableWorld {
    fn damageable(&mut self, collider: ColliderHandle) -> Option<&mut dyn Damageable>;
}

/// Rotation taking world up onto `normal`.
pub fn rotation_from_up(normal: Vec3) -> Quat {
    let n = normal.normalize_or_zero();
    if n == Vec3::ZERO {
        Quat::IDENTITY
    } else {
        Quat::from_rotation_arc(Vec3::Y, n)
    }
}

/// Rotation whose forward (-Z) faces `direction`.
pub fn look_rotation(direction: Vec3) -> Quat {
    let d = direction.normalize_or_zero();
    if d == Vec3::ZERO {
        Quat::IDENTITY
    } else {
        Quat::from_rotation_arc(Vec3::NEG_Z, d)
    }
}

/// A shootable target with health. Bleeds where it is hit.
#[derive(Debug, Clone)]
pub struct Target {
    pub health: Health,
    pub blood_effect_duration: f32,
    pending_blood: Vec<Transform>,
}

impl Target {
    pub const DEFAULT_HEALTH: f32 = 50.0;

    pub fn new(health: f32) -> Self {
        Self {
            health: Health::new(health),
            blood_effect_duration: 2.0,
            pending_blood: Vec::new(),
        }
    }
}

impl Default for Target {
    fn default() -> Self {
        Self::new(Self::DEFAULT_HEALTH)
    }
}

impl Damageable for Target {
    fn apply_damage(&mut self, amount: f32, point: Vec3, rotation: Quat) {
        self.health.take_damage(amount);
        let normal = rotation * Vec3::Y;
        self.pending_blood
            .push(Transform::from_position_rotation(point, look_rotation(normal)));
    }
}

/// Physics body a target entity owns.
#[derive(Debug, Clone, Copy)]
struct TargetBody(Option<RigidBodyHandle>);

/// All targets in the scene, stored in an ECS world and indexed by collider.
#[derive(Default)]
pub struct TargetRegistry {
    world: World,
    by_collider: HashMap<ColliderHandle, Entity>,
}

impl TargetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a target behind `collider`.
    pub fn spawn(
        &mut self,
        collider: ColliderHandle,
        body: Option<RigidBodyHandle>,
        target: Target,
    ) -> Entity {
        let entity = self.world.spawn((target, TargetBody(body)));
        self.by_collider.insert(collider, entity);
        entity
    }

    pub fn len(&self) -> usize {
        self.by_collider.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_collider.is_empty()
    }

    /// Remaining health of the target behind `collider`.
    pub fn health(&self, collider: ColliderHandle) -> Option<f32> {
        let entity = *self.by_collider.get(&collider)?;
        self.world
            .get::<&Target>(entity)
            .ok()
            .map(|t| t.health.current)
    }

    /// Emit blood for this frame's hits and remove dead targets.
    /// Returns the physics bodies of removed targets so the caller can drop them.
    pub fn update(&mut self, feedback: &mut dyn FeedbackSink) -> Vec<RigidBodyHandle> {
        let mut dead = Vec::new();
        for (entity, (target, body)) in self.world.query_mut::<(&mut Target, &TargetBody)>() {
            let duration = target.blood_effect_duration;
            for pose in target.pending_blood.drain(..) {
                feedback.spawn_effect(EffectKind::Blood, pose, duration);
            }
            if target.health.is_dead() {
                dead.push((entity, body.0));
            }
        }

        let mut removed_bodies = Vec::new();
        for (entity, body) in dead {
            self.by_collider.retain(|_, e| *e != entity);
            self.world.despawn(entity).ok();
            log::info!("Target {:?} has been destroyed", entity);
            removed_bodies.extend(body);
        }
        removed_bodies
    }
}

impl DamageableWorld for TargetRegistry {
    fn damageable(&mut self, collider: ColliderHandle) -> Option<&mut dyn Damageable> {
        let entity = *self.by_collider.get(&collider)?;
        self.world
            .query_one_mut::<&mut Target>(entity)
            .ok()
            .map(|t| t as &mut dyn Damageable)
    }
}
