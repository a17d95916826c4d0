//! Mock collaborators for unit tests.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

use engine_core::{Transform, Vec3};
use physics::{ColliderHandle, PhysicsBody, RayCaster, RayFilter, RaycastHit};

/// Unit-mass body that integrates forces over a fixed step.
#[derive(Debug, Clone)]
pub struct MockBody {
    pub pose: Transform,
    pub velocity: Vec3,
    pub step: f32,
    pub drag: f32,
    pub kinematic: bool,
    pub trigger: bool,
    pub forces: Vec<Vec3>,
    pub impulses: Vec<Vec3>,
    pub torques: Vec<Vec3>,
    pub capsule_height: Option<f32>,
}

impl MockBody {
    pub fn at(position: Vec3) -> Self {
        Self {
            pose: Transform::from_position(position),
            velocity: Vec3::ZERO,
            step: 1.0 / 50.0,
            drag: 0.0,
            kinematic: false,
            trigger: false,
            forces: Vec::new(),
            impulses: Vec::new(),
            torques: Vec::new(),
            capsule_height: None,
        }
    }
}

impl Default for MockBody {
    fn default() -> Self {
        Self::at(Vec3::ZERO)
    }
}

impl PhysicsBody for MockBody {
    fn pose(&self) -> Transform {
        self.pose
    }

    fn linear_velocity(&self) -> Vec3 {
        self.velocity
    }

    fn set_linear_velocity(&mut self, velocity: Vec3) {
        self.velocity = velocity;
    }

    fn apply_force(&mut self, force: Vec3) {
        self.forces.push(force);
        self.velocity += force * self.step;
    }

    fn apply_impulse(&mut self, impulse: Vec3) {
        self.impulses.push(impulse);
        self.velocity += impulse;
    }

    fn apply_torque_impulse(&mut self, torque: Vec3) {
        self.torques.push(torque);
    }

    fn set_drag(&mut self, drag: f32) {
        self.drag = drag;
    }

    fn set_kinematic(&mut self, kinematic: bool) {
        self.kinematic = kinematic;
    }

    fn is_kinematic(&self) -> bool {
        self.kinematic
    }

    fn set_trigger(&mut self, trigger: bool) {
        self.trigger = trigger;
    }

    fn is_trigger(&self) -> bool {
        self.trigger
    }

    fn set_pose(&mut self, pose: Transform) {
        self.pose = pose;
    }

    fn set_capsule_height(&mut self, height: f32) {
        self.capsule_height = Some(height);
    }
}

/// Ray service that replays queued hits, then falls back to a fixed answer.
#[derive(Debug, Default)]
pub struct MockRays {
    queued: RefCell<VecDeque<RaycastHit>>,
    fallback: Option<RaycastHit>,
    casts: Cell<u32>,
    directions: RefCell<Vec<Vec3>>,
    filters: RefCell<Vec<(f32, RayFilter)>>,
}

impl MockRays {
    /// Every ray that reaches `distance` reports ground there.
    pub fn with_ground(distance: f32) -> Self {
        Self {
            fallback: Some(RaycastHit {
                collider: ColliderHandle::from_raw_parts(0, 0),
                distance,
                point: Vec3::new(0.0, -distance, 0.0),
                normal: Vec3::Y,
            }),
            ..Default::default()
        }
    }

    pub fn push(&self, hit: RaycastHit) {
        self.queued.borrow_mut().push_back(hit);
    }

    pub fn casts(&self) -> u32 {
        self.casts.get()
    }

    pub fn directions(&self) -> Vec<Vec3> {
        self.directions.borrow().clone()
    }

    /// `(max_distance, filter)` of every cast, in order.
    pub fn filters(&self) -> Vec<(f32, RayFilter)> {
        self.filters.borrow().clone()
    }
}

impl RayCaster for MockRays {
    fn cast_ray(
        &self,
        _origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        filter: RayFilter,
    ) -> Option<RaycastHit> {
        self.casts.set(self.casts.get() + 1);
        self.directions.borrow_mut().push(direction);
        self.filters.borrow_mut().push((max_distance, filter));
        if let Some(hit) = self.queued.borrow_mut().pop_front() {
            return Some(hit);
        }
        self.fallback.filter(|hit| hit.distance <= max_distance)
    }
}

pub fn hit_at(collider: ColliderHandle, point: Vec3, normal: Vec3) -> RaycastHit {
    RaycastHit {
        collider,
        distance: point.length(),
        point,
        normal,
    }
}
