//! Physics world management with Rapier3D.

use crate::collision::{BodyHandles, CollisionGroup};
use engine_core::{Transform, Vec3};
use rapier3d::prelude::*;

/// Player capsule mass, kg. Movement forces and jump impulses are tuned against it.
pub const PLAYER_MASS: f32 = 1.0;
/// Weapon mass, kg. Throw impulses are tuned against it.
pub const WEAPON_MASS: f32 = 1.0;

/// Main physics world containing all simulation state.
pub struct PhysicsWorld {
    pub rigid_body_set: RigidBodySet,
    pub collider_set: ColliderSet,
    pub gravity: Vector<Real>,
    pub integration_parameters: IntegrationParameters,
    pub physics_pipeline: PhysicsPipeline,
    pub island_manager: IslandManager,
    pub broad_phase: DefaultBroadPhase,
    pub narrow_phase: NarrowPhase,
    pub impulse_joint_set: ImpulseJointSet,
    pub multibody_joint_set: MultibodyJointSet,
    pub ccd_solver: CCDSolver,
    pub query_pipeline: QueryPipeline,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsWorld {
    /// Create a new physics world with default gravity.
    pub fn new() -> Self {
        Self {
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            gravity: vector![0.0, -9.81, 0.0],
            integration_parameters: IntegrationParameters::default(),
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
        }
    }

    /// Set the simulation step length in seconds (matches the fixed tick).
    pub fn set_timestep(&mut self, dt: f32) {
        self.integration_parameters.dt = dt;
    }

    /// Length of one simulation step in seconds.
    pub fn timestep(&self) -> f32 {
        self.integration_parameters.dt
    }

    /// Step the physics simulation.
    pub fn step(&mut self) {
        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &(),
        );
    }

    /// Update query pipeline for raycasting after bodies were added or moved outside a step.
    pub fn update_query_pipeline(&mut self) {
        self.query_pipeline.update(&self.collider_set);
    }

    /// Add a ground plane collider (flat Y=0 half-space).
    pub fn add_ground_plane(&mut self) -> ColliderHandle {
        let collider = ColliderBuilder::halfspace(Vector::y_axis())
            .collision_groups(CollisionGroup::environment())
            .build();
        self.collider_set.insert(collider)
    }

    /// Add a static box of environment geometry (walls, crates). No parent body.
    pub fn add_static_cuboid(&mut self, translation: Vec3, half_extents: Vec3) -> ColliderHandle {
        let collider = ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            .translation(vector![translation.x, translation.y, translation.z])
            .collision_groups(CollisionGroup::environment())
            .build();
        self.collider_set.insert(collider)
    }

    /// Add the player: an upright, rotation-locked dynamic capsule of total height `height`.
    pub fn add_player_body(&mut self, position: Vec3, height: f32, radius: f32) -> BodyHandles {
        let rigid_body = RigidBodyBuilder::dynamic()
            .translation(vector![position.x, position.y, position.z])
            .lock_rotations()
            .build();
        let body = self.rigid_body_set.insert(rigid_body);
        let half_height = (height * 0.5 - radius).max(0.01);
        let collider = ColliderBuilder::capsule_y(half_height, radius)
            .collision_groups(CollisionGroup::player())
            .friction(0.0)
            .mass(PLAYER_MASS)
            .build();
        let collider = self
            .collider_set
            .insert_with_parent(collider, body, &mut self.rigid_body_set);
        BodyHandles::new(body, collider)
    }

    /// Add a pickupable weapon lying in the world (dynamic body, solid box collider).
    pub fn add_weapon_body(&mut self, position: Vec3, half_extents: Vec3) -> BodyHandles {
        let rigid_body = RigidBodyBuilder::dynamic()
            .translation(vector![position.x, position.y, position.z])
            .ccd_enabled(true)
            .build();
        let body = self.rigid_body_set.insert(rigid_body);
        let collider = ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            .collision_groups(CollisionGroup::weapon())
            .mass(WEAPON_MASS)
            .build();
        let collider = self
            .collider_set
            .insert_with_parent(collider, body, &mut self.rigid_body_set);
        BodyHandles::new(body, collider)
    }

    /// Add a fixed, shootable target box.
    pub fn add_target_body(&mut self, position: Vec3, half_extents: Vec3) -> BodyHandles {
        let rigid_body = RigidBodyBuilder::fixed()
            .translation(vector![position.x, position.y, position.z])
            .build();
        let body = self.rigid_body_set.insert(rigid_body);
        let collider = ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            .collision_groups(CollisionGroup::target())
            .build();
        let collider = self
            .collider_set
            .insert_with_parent(collider, body, &mut self.rigid_body_set);
        BodyHandles::new(body, collider)
    }

    /// Get the transform of a rigid body.
    pub fn get_body_transform(&self, handle: RigidBodyHandle) -> Option<Transform> {
        self.rigid_body_set.get(handle).map(|body| {
            let pos = body.translation();
            let rot = body.rotation();
            Transform {
                position: Vec3::new(pos.x, pos.y, pos.z),
                rotation: glam::Quat::from_xyzw(rot.i, rot.j, rot.k, rot.w),
                scale: Vec3::ONE,
            }
        })
    }

    pub fn contains_body(&self, handle: RigidBodyHandle) -> bool {
        self.rigid_body_set.contains(handle)
    }

    /// Remove a rigid body and its colliders.
    pub fn remove_body(&mut self, handle: RigidBodyHandle) {
        log::debug!("Removing rigid body {:?}", handle);
        self.rigid_body_set.remove(
            handle,
            &mut self.island_manager,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            true,
        );
    }
}
