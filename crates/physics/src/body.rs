//! The rigid-body interface the simulation drives, and its Rapier implementation.

use engine_core::{Quat, Transform, Vec3};
use rapier3d::na::{Quaternion, Translation3, UnitQuaternion};
use rapier3d::prelude::*;

use crate::PhysicsWorld;

/// A physics body the player-action core reads velocity from and writes forces to.
pub trait PhysicsBody {
    fn pose(&self) -> Transform;
    fn linear_velocity(&self) -> Vec3;
    fn set_linear_velocity(&mut self, velocity: Vec3);
    /// Continuous force, integrated over one fixed step.
    fn apply_force(&mut self, force: Vec3);
    fn apply_impulse(&mut self, impulse: Vec3);
    fn apply_torque_impulse(&mut self, torque: Vec3);
    fn set_drag(&mut self, drag: f32);
    fn set_kinematic(&mut self, kinematic: bool);
    fn is_kinematic(&self) -> bool;
    /// Switch every collider on the body between trigger-only and solid.
    fn set_trigger(&mut self, trigger: bool);
    fn is_trigger(&self) -> bool;
    /// Teleport the body (kinematic bodies also get it as their next target).
    fn set_pose(&mut self, pose: Transform);
    /// Resize capsule colliders to `height` end to end, keeping their radius.
    fn set_capsule_height(&mut self, height: f32);

    fn position(&self) -> Vec3 {
        self.pose().position
    }
}

/// Mutable view of one Rapier body inside a [`PhysicsWorld`].
pub struct RapierBody<'w> {
    world: &'w mut PhysicsWorld,
    handle: RigidBodyHandle,
}

impl PhysicsWorld {
    /// Borrow a body through the [`PhysicsBody`] interface.
    pub fn body(&mut self, handle: RigidBodyHandle) -> Option<RapierBody<'_>> {
        if self.rigid_body_set.contains(handle) {
            Some(RapierBody {
                world: self,
                handle,
            })
        } else {
            None
        }
    }
}

fn to_vector(v: Vec3) -> Vector<Real> {
    vector![v.x, v.y, v.z]
}

fn to_isometry(pose: &Transform) -> Isometry<Real> {
    let r = pose.rotation;
    Isometry::from_parts(
        Translation3::new(pose.position.x, pose.position.y, pose.position.z),
        UnitQuaternion::from_quaternion(Quaternion::new(r.w, r.x, r.y, r.z)),
    )
}

impl RapierBody<'_> {
    fn rb(&self) -> &RigidBody {
        &self.world.rigid_body_set[self.handle]
    }

    fn rb_mut(&mut self) -> &mut RigidBody {
        &mut self.world.rigid_body_set[self.handle]
    }

    pub fn handle(&self) -> RigidBodyHandle {
        self.handle
    }
}

impl PhysicsBody for RapierBody<'_> {
    fn pose(&self) -> Transform {
        let rb = self.rb();
        let p = rb.translation();
        let r = rb.rotation();
        Transform::from_position_rotation(
            Vec3::new(p.x, p.y, p.z),
            Quat::from_xyzw(r.i, r.j, r.k, r.w),
        )
    }

    fn linear_velocity(&self) -> Vec3 {
        let v = self.rb().linvel();
        Vec3::new(v.x, v.y, v.z)
    }

    fn set_linear_velocity(&mut self, velocity: Vec3) {
        self.rb_mut().set_linvel(to_vector(velocity), true);
    }

    fn apply_force(&mut self, force: Vec3) {
        let dt = self.world.integration_parameters.dt;
        self.rb_mut().apply_impulse(to_vector(force * dt), true);
    }

    fn apply_impulse(&mut self, impulse: Vec3) {
        self.rb_mut().apply_impulse(to_vector(impulse), true);
    }

    fn apply_torque_impulse(&mut self, torque: Vec3) {
        self.rb_mut().apply_torque_impulse(to_vector(torque), true);
    }

    fn set_drag(&mut self, drag: f32) {
        self.rb_mut().set_linear_damping(drag);
    }

    fn set_kinematic(&mut self, kinematic: bool) {
        let body_type = if kinematic {
            RigidBodyType::KinematicPositionBased
        } else {
            RigidBodyType::Dynamic
        };
        let rb = self.rb_mut();
        rb.set_body_type(body_type, true);
        if kinematic {
            rb.set_linvel(Vector::zeros(), true);
            rb.set_angvel(Vector::zeros(), true);
        }
    }

    fn is_kinematic(&self) -> bool {
        self.rb().is_kinematic()
    }

    fn set_trigger(&mut self, trigger: bool) {
        let colliders: Vec<ColliderHandle> = self.rb().colliders().to_vec();
        for handle in colliders {
            if let Some(collider) = self.world.collider_set.get_mut(handle) {
                collider.set_sensor(trigger);
            }
        }
    }

    fn is_trigger(&self) -> bool {
        let rb = self.rb();
        !rb.colliders().is_empty()
            && rb
                .colliders()
                .iter()
                .all(|h| self.world.collider_set.get(*h).is_some_and(|c| c.is_sensor()))
    }

    fn set_pose(&mut self, pose: Transform) {
        let iso = to_isometry(&pose);
        let rb = self.rb_mut();
        rb.set_position(iso, true);
        if rb.is_kinematic() {
            rb.set_next_kinematic_position(iso);
        }
    }

    fn set_capsule_height(&mut self, height: f32) {
        let colliders: Vec<ColliderHandle> = self.rb().colliders().to_vec();
        for handle in colliders {
            let Some(collider) = self.world.collider_set.get_mut(handle) else {
                continue;
            };
            let Some(capsule) = collider.shape().as_capsule() else {
                continue;
            };
            let radius = capsule.radius;
            let half_height = (height * 0.5 - radius).max(0.01);
            if (capsule.half_height() - half_height).abs() > 1e-4 {
                collider.set_shape(SharedShape::capsule_y(half_height, radius));
            }
        }
    }
}
