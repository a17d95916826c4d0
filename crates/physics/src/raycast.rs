//! Raycasting for ground probes and weapon hit detection.

use crate::{CollisionGroup, PhysicsWorld};
use engine_core::Vec3;
use rapier3d::prelude::*;

/// Result of a raycast query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycastHit {
    /// The collider that was hit.
    pub collider: ColliderHandle,
    /// Distance along the ray to the hit point.
    pub distance: f32,
    /// World position of the hit.
    pub point: Vec3,
    /// Surface normal at the hit point.
    pub normal: Vec3,
}

/// Which colliders a ray may report.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RayFilter {
    /// Ignore every collider attached to this body (the caster's own body).
    pub exclude_body: Option<RigidBodyHandle>,
    /// Only report environment geometry.
    pub environment_only: bool,
}

impl RayFilter {
    pub fn excluding(body: RigidBodyHandle) -> Self {
        Self {
            exclude_body: Some(body),
            environment_only: false,
        }
    }

    pub fn environment_only(mut self) -> Self {
        self.environment_only = true;
        self
    }
}

/// Nearest-hit ray query service.
pub trait RayCaster {
    /// Cast a ray from `origin` along `direction` and return the nearest hit within `max_distance`.
    ///
    /// `direction` need not be unit length; it only picks the ray's heading.
    fn cast_ray(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        filter: RayFilter,
    ) -> Option<RaycastHit>;
}

impl PhysicsWorld {
    /// Cast a ray and return the first hit. Trigger colliders are never reported.
    pub fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        filter: RayFilter,
    ) -> Option<RaycastHit> {
        let direction = direction.normalize_or_zero();
        if direction == Vec3::ZERO {
            return None;
        }
        let ray = Ray::new(
            point![origin.x, origin.y, origin.z],
            vector![direction.x, direction.y, direction.z],
        );

        let mut query = QueryFilter::default().exclude_sensors();
        if let Some(body) = filter.exclude_body {
            query = query.exclude_rigid_body(body);
        }
        if filter.environment_only {
            query = query.groups(CollisionGroup::environment_query());
        }

        self.query_pipeline
            .cast_ray_and_get_normal(
                &self.rigid_body_set,
                &self.collider_set,
                &ray,
                max_distance,
                true,
                query,
            )
            .map(|(collider, intersection)| {
                let point = ray.point_at(intersection.time_of_impact);
                RaycastHit {
                    collider,
                    distance: intersection.time_of_impact,
                    point: Vec3::new(point.x, point.y, point.z),
                    normal: Vec3::new(
                        intersection.normal.x,
                        intersection.normal.y,
                        intersection.normal.z,
                    ),
                }
            })
    }
}

impl RayCaster for PhysicsWorld {
    fn cast_ray(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        filter: RayFilter,
    ) -> Option<RaycastHit> {
        self.raycast(origin, direction, max_distance, filter)
    }
}
